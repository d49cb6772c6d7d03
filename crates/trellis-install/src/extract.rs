//! Archive extraction that refuses to write outside its destination.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use crate::{InstallError, InstallResult};

/// Cap on a single decompressed entry.
const MAX_ENTRY_SIZE: u64 = 512 * 1024 * 1024;

/// Check if bytes start with the gzip magic number (0x1f 0x8b).
#[must_use]
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

/// Extracts a `.tar.gz` archive into `dest`, returning the number of files
/// written.
///
/// The first path component of every entry is dropped. Directories are
/// created, regular files are written with their recorded mode, and other
/// entry types are skipped.
///
/// # Errors
///
/// Returns [`InstallError::PathTraversal`] as soon as an entry would land
/// outside `dest`, and [`InstallError::InvalidArchive`] for unreadable input.
pub fn extract_tar_gz(bytes: &[u8], dest: &Path) -> InstallResult<usize> {
    let mut archive = Archive::new(GzDecoder::new(bytes));
    let entries = archive.entries().map_err(invalid_archive)?;
    let mut written = 0;

    for entry in entries {
        let mut entry = entry.map_err(invalid_archive)?;
        let raw_path = entry.path().map_err(invalid_archive)?;
        let name = raw_path.to_string_lossy().replace('\\', "/");

        let relative = strip_top_dir(&name);
        if relative.is_empty() || relative == "." {
            continue;
        }
        let target = safe_join(dest, relative)?;

        match entry.header().entry_type() {
            EntryType::Directory => {
                std::fs::create_dir_all(&target)?;
            }
            EntryType::Regular | EntryType::Continuous => {
                if entry.size() > MAX_ENTRY_SIZE {
                    return Err(InstallError::InvalidArchive {
                        reason: format!(
                            "entry {name} is too large ({} bytes, max {MAX_ENTRY_SIZE})",
                            entry.size()
                        ),
                    });
                }
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }

                let mode = entry.header().mode().unwrap_or(0o644);
                let mut file = File::create(&target)?;
                io::copy(&mut entry.by_ref().take(MAX_ENTRY_SIZE), &mut file)?;
                set_mode(&target, mode)?;
                written += 1;
            }
            other => {
                tracing::debug!(entry = %name, kind = ?other, "skipping archive entry");
            }
        }
    }

    Ok(written)
}

/// Searches `dir` recursively for an executable called `name` or
/// `name.exe`, ignoring case.
#[must_use]
pub fn find_binary(dir: &Path, name: &str) -> Option<PathBuf> {
    let windows_name = format!("{name}.exe");
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let Ok(read_dir) = std::fs::read_dir(&current) else {
            continue;
        };
        let mut children: Vec<PathBuf> = read_dir.filter_map(|e| e.ok().map(|e| e.path())).collect();
        children.sort();

        for child in children {
            if child.is_dir() {
                pending.push(child);
                continue;
            }
            let matches = child.file_name().and_then(|n| n.to_str()).is_some_and(|n| {
                n.eq_ignore_ascii_case(name) || n.eq_ignore_ascii_case(&windows_name)
            });
            if matches {
                return Some(child);
            }
        }
    }

    None
}

/// Drops everything up to and including the first `/`.
fn strip_top_dir(name: &str) -> &str {
    match name.split_once('/') {
        Some((_, rest)) => rest,
        None => name,
    }
}

/// Joins `relative` onto `base`, rejecting results outside `base`.
///
/// The check is lexical: `..` may only cancel components added by the same
/// path.
fn safe_join(base: &Path, relative: &str) -> InstallResult<PathBuf> {
    let traversal = || InstallError::PathTraversal {
        entry: relative.to_string(),
    };

    let mut joined = base.to_path_buf();
    let mut depth = 0usize;

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => {
                joined.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(traversal());
                }
                joined.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return Err(traversal()),
        }
    }

    Ok(joined)
}

/// Applies the permission bits of `mode`. Setuid, setgid and sticky bits
/// are dropped.
#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o777))
}

#[cfg(not(unix))]
pub(crate) fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

fn invalid_archive(e: io::Error) -> InstallError {
    InstallError::InvalidArchive {
        reason: e.to_string(),
    }
}
