//! Atomic replacement of an executable on disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::extract::set_mode;
use crate::InstallResult;

/// Mode given to the new binary when the old one's cannot be read.
const FALLBACK_MODE: u32 = 0o755;

/// What happened to the target executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// The target now holds the new binary.
    Replaced,
    /// The platform does not allow replacing a running executable. The new
    /// binary was written next to it and must be swapped in by hand.
    Staged { path: PathBuf },
}

/// Replaces the executable at `target` with `bytes`.
///
/// The new contents go to a temporary file in the target's directory, which
/// receives the target's permission bits and is then renamed over it. The
/// temporary file is removed on every failure path and `target` is only
/// touched by the final rename. On Windows the binary is staged instead.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be written or renamed.
pub fn replace_executable(target: &Path, bytes: &[u8]) -> InstallResult<ReplaceOutcome> {
    replace_for_platform(target, bytes, cfg!(windows))
}

fn replace_for_platform(target: &Path, bytes: &[u8], windows: bool) -> InstallResult<ReplaceOutcome> {
    if windows {
        let staged = staged_path(target);
        std::fs::write(&staged, bytes)?;
        tracing::warn!(
            target = %target.display(),
            staged = %staged.display(),
            "running executable cannot be replaced in place"
        );
        return Ok(ReplaceOutcome::Staged { path: staged });
    }

    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mode = existing_mode(target).unwrap_or(FALLBACK_MODE);

    let mut tmp = tempfile::Builder::new()
        .prefix(".trellis-update-")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    set_mode(tmp.path(), mode)?;
    tmp.persist(target).map_err(|e| e.error)?;

    tracing::debug!(target = %target.display(), "replaced executable");
    Ok(ReplaceOutcome::Replaced)
}

/// `<dir>/<stem>.new.exe`
fn staged_path(target: &Path) -> PathBuf {
    let stem = target
        .file_name()
        .and_then(|n| n.to_str())
        .map_or("trellis", |n| n.strip_suffix(".exe").unwrap_or(n));
    target.with_file_name(format!("{stem}.new.exe"))
}

#[cfg(unix)]
fn existing_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .ok()
        .map(|m| m.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn existing_mode(_path: &Path) -> Option<u32> {
    None
}
