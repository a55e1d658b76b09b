//! Artifact I/O. Nothing here knows about transforms.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Write `content` to `dest` via a sibling temp file and a rename, so a
/// reader never sees a half-written artifact.
pub fn write_atomic(dest: &Path, content: &str) -> Result<()> {
    let parent = dest
        .parent()
        .with_context(|| format!("no parent directory for {}", dest.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    let temp = temp_path(dest);
    if let Err(e) = fs::write(&temp, content) {
        let _ = fs::remove_file(&temp);
        return Err(e).with_context(|| format!("failed to write {}", temp.display()));
    }
    if let Err(e) = fs::rename(&temp, dest) {
        let _ = fs::remove_file(&temp);
        return Err(e).with_context(|| format!("failed to replace {}", dest.display()));
    }
    Ok(())
}

/// Delete an artifact. Already gone is fine.
pub fn remove_artifact(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
    }
}

/// `dir/.name.kiln-tmp`: same directory so the rename never crosses devices.
fn temp_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{name}.kiln-tmp"))
}
