use std::path::Path;
use std::time::SystemTime;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

pub const DEFAULT_MIME_TYPE: &str = "application/vnd.ms-package.3dmanufacturing-3dmodel+xml";

const LAST_MODIFIED_FORMAT: &[FormatItem<'static>] = format_description!(
    "[month padding:none]/[day padding:none]/[year], [hour repr:12 padding:none]:[minute]:[second] [period case:upper]"
);

/// Snapshot of the chosen file, taken once when it is loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct FileMetadata {
    pub name: String,
    pub size: String,
    pub mime_type: String,
    pub last_modified: String,
}

impl FileMetadata {
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let modified = meta.modified().unwrap_or_else(|_| SystemTime::now());

        Ok(Self {
            name,
            size: format_file_size(meta.len()),
            mime_type: mime_type_for(path).to_string(),
            last_modified: format_last_modified(modified.into()),
        })
    }
}

pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1_048_576 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / 1_048_576.0)
    }
}

fn mime_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("zip") => "application/zip",
        _ => DEFAULT_MIME_TYPE,
    }
}

pub fn format_last_modified(timestamp: OffsetDateTime) -> String {
    let mut datetime = timestamp;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime
        .format(LAST_MODIFIED_FORMAT)
        .unwrap_or_else(|_| datetime.to_string())
}
