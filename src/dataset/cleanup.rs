use crate::image::ImageLoader;
use crate::utils::error::ClassifyError;
use crate::Result;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// 参与扫描的扩展名（不区分大小写）
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, Clone, Default)]
pub struct CleanupOptions {
    /// 只报告，不删除
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub total_files: usize,
    pub corrupted_files: usize,
    pub removed: Vec<PathBuf>,
}

/// 递归扫描数据集目录，删除无法完整解码的图像
pub fn clean_dataset(data_dir: &Path, options: &CleanupOptions) -> Result<CleanupReport> {
    if !data_dir.is_dir() {
        return Err(ClassifyError::InvalidInput(format!(
            "Dataset directory does not exist: {}",
            data_dir.display()
        )));
    }

    tracing::info!("Scanning directory: {}", data_dir.display());

    let mut report = CleanupReport::default();
    scan_dir(data_dir, options, &mut report)?;

    tracing::info!(
        "Scan finished: total={}, corrupted={}, dry_run={}",
        report.total_files,
        report.corrupted_files,
        options.dry_run
    );

    Ok(report)
}

fn scan_dir(dir: &Path, options: &CleanupOptions, report: &mut CleanupReport) -> Result<()> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.and_then(|e| Ok((e.path(), e.file_type()?))))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    for (path, file_type) in entries {
        if file_type.is_dir() {
            scan_dir(&path, options, report)?;
            continue;
        }

        // 不跟随指向目录的符号链接，避免重复扫描和环路
        if file_type.is_symlink() && path.is_dir() {
            tracing::debug!("Skipping symlinked directory: {}", path.display());
            continue;
        }

        if !is_image_file(&path) {
            continue;
        }

        report.total_files += 1;

        if let Err(e) = ImageLoader::from_path(&path) {
            tracing::warn!("Corrupted file detected: {} ({})", path.display(), e);
            report.corrupted_files += 1;

            if !options.dry_run {
                fs::remove_file(&path)?;
                tracing::info!("Removed {}", path.display());
            }
            report.removed.push(path);
        }
    }

    Ok(())
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
