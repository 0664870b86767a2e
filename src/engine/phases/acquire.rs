//! Acquire phase
//!
//! Check that required tools exist, then fetch and verify every archive,
//! primary source first, one after another.

use crate::core::error::{FormulaError, Result};
use crate::core::output;
use crate::engine::context::Staged;
use crate::formula::{Dependency, Formula};
use crate::helpers::download::{self, FetchOptions};
use std::path::{Path, PathBuf};

/// Locate the executable behind a dependency.
pub fn find_dependency(dep: &Dependency) -> Result<PathBuf> {
    let exe = dep.executable();
    which::which(&exe).map_err(|_| {
        FormulaError::unavailable(
            format!("dependency '{}'", dep),
            format!("`{}` not found on PATH", exe),
        )
    })
}

/// Fail on the first declared dependency that cannot be found.
pub fn check_dependencies(formula: &Formula) -> Result<()> {
    for dep in formula.all_dependencies() {
        let path = find_dependency(dep)?;
        output::debug(&format!("{} -> {}", dep, path.display()));
    }
    Ok(())
}

/// Fetch and verify the primary archive and every resource.
pub fn acquire(
    formula: &Formula,
    cache_dir: &Path,
    opts: &FetchOptions,
) -> Result<(Staged, Vec<Staged>)> {
    let total = formula.resources.len() + 1;

    output::action_numbered(1, total, &formula.name);
    let source = formula.source();
    let archive = download::fetch(&source, cache_dir, opts)?;
    let source = Staged {
        resource: source,
        archive,
    };

    let mut resources = Vec::with_capacity(formula.resources.len());
    for (i, resource) in formula.resources.iter().enumerate() {
        output::action_numbered(i + 2, total, &resource.name);
        let archive = download::fetch(resource, cache_dir, opts)?;
        resources.push(Staged {
            resource: resource.clone(),
            archive,
        });
    }

    Ok((source, resources))
}
