use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FilenameFormatError;
use crate::model::language::SteamLanguage;

pub const LOC_SEPARATOR: &str = "_loc_";

/// `1234567_loc_schinese.vdf` + french -> `<dir>/1234567_loc_french.vdf`
pub fn output_path(
    source: &Path,
    target: &SteamLanguage,
    output_dir: &Path,
) -> Result<PathBuf, FilenameFormatError> {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let base_id = match stem.split_once(LOC_SEPARATOR) {
        Some((base, _)) => base,
        None => return Err(FilenameFormatError(stem.to_string())),
    };

    Ok(output_dir.join(format!("{base_id}{LOC_SEPARATOR}{}.vdf", target.id)))
}

/// Writes through a sibling temp file so a crash never leaves a half file
/// under the final name.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = tmp_path(path);

    fs::write(&tmp, bytes)?;

    if path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&tmp, path)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(n) => n.to_string(),
        None => "output".to_string(),
    };
    p.set_file_name(format!("{file_name}.tmp"));
    p
}
