//! Linking
//!
//! Entry points are symlinked from the virtualenv into `<keg>/bin`, and
//! `<keg>/bin` is symlinked into `<prefix>/bin`.

use crate::core::error::{FormulaError, Result};
use crate::core::output;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[cfg(unix)]
fn symlink(src: &Path, dest: &Path) -> Result<()> {
    std::os::unix::fs::symlink(src, dest)?;
    Ok(())
}

#[cfg(not(unix))]
fn symlink(src: &Path, dest: &Path) -> Result<()> {
    std::os::windows::fs::symlink_file(src, dest)?;
    Ok(())
}

/// Replace `dest` with a symlink to `src`, but only when `dest` is absent
/// or is itself a symlink for which `may_replace` returns true.
fn replace_link(src: &Path, dest: &Path, may_replace: impl Fn(&Path) -> bool) -> Result<()> {
    if let Ok(meta) = std::fs::symlink_metadata(dest) {
        let owned = meta.file_type().is_symlink()
            && std::fs::read_link(dest).is_ok_and(|target| may_replace(&target));
        if !owned {
            return Err(FormulaError::Conflict(dest.to_path_buf()));
        }
        std::fs::remove_file(dest)?;
    }
    symlink(src, dest)
}

/// Link the named executables from `venv_bin` into `keg_bin`.
pub fn link_entry_points(venv_bin: &Path, keg_bin: &Path, names: &[OsString]) -> Result<()> {
    if names.is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(keg_bin)?;
    for name in names {
        let src = venv_bin.join(name);
        let dest = keg_bin.join(name);
        replace_link(&src, &dest, |target| target.starts_with(venv_bin))?;
        output::detail(&format!("entry point {}", name.to_string_lossy()));
    }
    Ok(())
}

/// Link every entry of `<keg>/bin` into `prefix_bin`.
///
/// Existing links into any keg under `formula_root` (another version of
/// the same formula) are replaced; anything else is a conflict.
pub fn link_keg(keg: &Path, formula_root: &Path, prefix_bin: &Path) -> Result<Vec<PathBuf>> {
    let keg_bin = keg.join("bin");
    let mut linked = Vec::new();
    if !keg_bin.exists() {
        return Ok(linked);
    }
    std::fs::create_dir_all(prefix_bin)?;

    let mut names: Vec<_> = std::fs::read_dir(&keg_bin)?
        .map(|e| e.map(|e| e.file_name()))
        .collect::<std::io::Result<_>>()?;
    names.sort();

    for name in names {
        let dest = prefix_bin.join(&name);
        if let Err(e) = replace_link(&keg_bin.join(&name), &dest, |t| t.starts_with(formula_root)) {
            // Roll back what this call already linked
            unlink(&linked, keg);
            return Err(e);
        }
        linked.push(dest);
    }
    Ok(linked)
}

/// Remove links that still point into `keg`. Returns how many were removed.
pub fn unlink(links: &[PathBuf], keg: &Path) -> usize {
    links
        .iter()
        .filter(|link| {
            std::fs::read_link(link).is_ok_and(|target| target.starts_with(keg))
                && std::fs::remove_file(link).is_ok()
        })
        .count()
}
