use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use zip::ZipArchive;
use zip::result::ZipError;

use super::ExtractError;

/// Location of the slicer settings inside a 3MF container.
pub const PROJECT_SETTINGS_ENTRY: &str = "Metadata/project_settings.config";

/// Read the project settings entry from a 3MF file on disk.
pub fn read_project_settings(path: &Path) -> Result<String, ExtractError> {
    let file = File::open(path).map_err(ExtractError::Io)?;
    read_entry(file, PROJECT_SETTINGS_ENTRY)
}

/// Same as [`read_project_settings`] for an archive already held in memory.
pub fn read_project_settings_from_bytes(bytes: &[u8]) -> Result<String, ExtractError> {
    read_entry(Cursor::new(bytes), PROJECT_SETTINGS_ENTRY)
}

fn read_entry<R: Read + Seek>(reader: R, name: &str) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(reader).map_err(ExtractError::InvalidArchive)?;
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Err(ExtractError::MissingEntry(name.to_string())),
        Err(err) => return Err(ExtractError::InvalidArchive(err)),
    };

    let mut raw = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut raw).map_err(ExtractError::ReadEntry)?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}
