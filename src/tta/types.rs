use serde::Serialize;

/// 模型输出顺序
pub const CLASS_NAMES: [&str; 2] = ["cat", "dog"];

/// 最终返回给调用方的标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Cat,
    Dog,
    Unknown,
}

impl Label {
    pub fn from_class_index(index: usize) -> Self {
        match index {
            0 => Label::Cat,
            _ => Label::Dog,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Cat => CLASS_NAMES[0],
            Label::Dog => CLASS_NAMES[1],
            Label::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Success,
    Unknown,
}

/// 判为 unknown 的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownReason {
    Instability,
    LowConfidence,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub label: Label,
    pub confidence: f32,
    pub status: VerdictStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnknownReason>,
}

impl Verdict {
    pub fn success(label: Label, confidence: f32) -> Self {
        Self {
            label,
            confidence,
            status: VerdictStatus::Success,
            reason: None,
        }
    }

    pub fn unknown(confidence: f32, reason: UnknownReason) -> Self {
        Self {
            label: Label::Unknown,
            confidence,
            status: VerdictStatus::Unknown,
            reason: Some(reason),
        }
    }

    pub fn is_confident(&self) -> bool {
        self.status == VerdictStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_omits_reason() {
        let verdict = Verdict::success(Label::Dog, 0.995);
        assert_eq!(
            serde_json::to_value(&verdict).unwrap(),
            json!({"label": "dog", "confidence": 0.995f32, "status": "success"})
        );
    }

    #[test]
    fn unknown_carries_reason_tag() {
        let verdict = Verdict::unknown(0.5, UnknownReason::LowConfidence);
        assert_eq!(
            serde_json::to_value(&verdict).unwrap(),
            json!({
                "label": "unknown",
                "confidence": 0.5,
                "status": "unknown",
                "reason": "low_confidence"
            })
        );
    }

    #[test]
    fn only_success_is_confident() {
        assert!(Verdict::success(Label::Cat, 0.99).is_confident());
        assert!(!Verdict::unknown(0.99, UnknownReason::Instability).is_confident());
    }

    #[test]
    fn class_indices_map_to_names() {
        assert_eq!(Label::from_class_index(0).as_str(), "cat");
        assert_eq!(Label::from_class_index(1).as_str(), "dog");
    }
}
