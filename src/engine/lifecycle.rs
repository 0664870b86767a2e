//! Lifecycle orchestration for formula execution
//!
//! The install flow:
//! 1. lock the keg, skip if a receipt for this version exists
//! 2. check declared dependencies
//! 3. fetch and verify every archive (nothing is written to the keg yet)
//! 4. install() - the formula's own action, usually a virtualenv install
//! 5. link the keg's executables into `<prefix>/bin`
//! 6. write the receipt
//!
//! A failure after the keg directory was created removes the keg again.

use crate::core::config::Config;
use crate::core::error::FormulaError;
use crate::core::lock;
use crate::core::output;
use crate::core::receipt::{self, Receipt};
use crate::engine::context::{self, ExecutionContext, Staged};
use crate::engine::loader::{self, LoadedFormula};
use crate::engine::phases::{acquire, link};
use crate::formula;
use crate::helpers::download::FetchOptions;
use anyhow::{Context, Result};
use rhai::{AST, Dynamic, Engine, Scope};
use std::path::{Path, PathBuf};

/// What an install call ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum InstallOutcome {
    Installed(Receipt),
    AlreadyInstalled(Receipt),
}

impl InstallOutcome {
    pub fn receipt(&self) -> &Receipt {
        match self {
            Self::Installed(r) | Self::AlreadyInstalled(r) => r,
        }
    }
}

/// Keg directory for a formula version
pub fn keg_path(config: &Config, name: &str, version: &str) -> PathBuf {
    config.cellar().join(name).join(version)
}

/// Removes a partially installed keg unless committed. When a previous
/// install was moved aside it is put back and relinked.
struct KegCleanup {
    keg: PathBuf,
    backup: Option<PathBuf>,
    formula_root: PathBuf,
    prefix_bin: PathBuf,
    armed: bool,
}

impl KegCleanup {
    /// Keep the new keg and drop the previous one
    fn commit(mut self) {
        self.armed = false;
        if let Some(backup) = &self.backup
            && let Err(e) = std::fs::remove_dir_all(backup)
        {
            output::warning(&format!("failed to remove {}: {}", backup.display(), e));
        }
    }
}

impl Drop for KegCleanup {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if self.keg.exists() {
            output::warning(&format!("removing partial install at {}", self.keg.display()));
            let _ = std::fs::remove_dir_all(&self.keg);
        }
        if let Some(backup) = &self.backup {
            match std::fs::rename(backup, &self.keg) {
                Ok(()) => {
                    output::info(&format!("restored previous install at {}", self.keg.display()));
                    if let Err(e) = link::link_keg(&self.keg, &self.formula_root, &self.prefix_bin) {
                        output::warning(&format!("failed to relink previous install: {}", e));
                    }
                }
                Err(e) => output::warning(&format!(
                    "failed to restore {}: {}",
                    backup.display(),
                    e
                )),
            }
        }
    }
}

/// Where the current keg of `version` is kept while it is being replaced
fn backup_path(keg: &Path, version: &str) -> PathBuf {
    keg.with_file_name(format!(".{}.previous", version))
}

/// Install a formula file
pub fn install(engine: &Engine, config: &Config, formula_path: &Path, force: bool) -> Result<InstallOutcome> {
    let loaded = loader::load_file(engine, formula_path)?;
    let formula = &loaded.formula;
    if !loaded.has_action("install") {
        return Err(FormulaError::Invalid(format!("{} does not define install()", formula.name)).into());
    }

    let cellar = config.cellar();
    let keg = keg_path(config, &formula.name, &formula.version);
    let _lock = lock::acquire_keg_lock(&cellar, &formula.name)?;

    let previous = Receipt::read(&keg)?;
    if let Some(existing) = &previous
        && !force
    {
        output::skip(&format!(
            "{} {} already installed, skipping",
            formula.name, formula.version
        ));
        return Ok(InstallOutcome::AlreadyInstalled(existing.clone()));
    }

    output::action(&format!("Installing {} {}", formula.name, formula.version));

    output::sub_action("dependencies");
    acquire::check_dependencies(formula)?;

    output::sub_action("fetch");
    let opts = FetchOptions {
        timeout: config.http_timeout,
        force: false,
    };
    let (source, resources) = acquire::acquire(formula, &config.cache_dir, &opts)?;

    let formula_root = cellar.join(&formula.name);
    let prefix_bin = config.prefix.join("bin");

    // A working install is moved aside, not deleted, until the new one is
    // complete. A keg without a receipt is leftover junk.
    let backup = match &previous {
        Some(old) => {
            link::unlink(&old.linked, &keg);
            let backup = backup_path(&keg, &formula.version);
            if backup.exists() {
                std::fs::remove_dir_all(&backup)
                    .with_context(|| format!("Failed to remove {}", backup.display()))?;
            }
            std::fs::rename(&keg, &backup)
                .with_context(|| format!("Failed to move aside {}", keg.display()))?;
            Some(backup)
        }
        None => {
            if keg.exists() {
                std::fs::remove_dir_all(&keg)
                    .with_context(|| format!("Failed to remove old keg: {}", keg.display()))?;
            }
            None
        }
    };
    let cleanup = KegCleanup {
        keg: keg.clone(),
        backup,
        formula_root: formula_root.clone(),
        prefix_bin: prefix_bin.clone(),
        armed: true,
    };
    std::fs::create_dir_all(&keg)
        .with_context(|| format!("Failed to create keg: {}", keg.display()))?;

    output::sub_action("install");
    let snapshot = run_install_action(engine, &loaded, config, &keg, source, resources)?;

    output::sub_action("link");
    let linked = link::link_keg(&keg, &formula_root, &prefix_bin)?;
    for path in &linked {
        output::detail(&format!("linked {}", path.display()));
    }

    let python = snapshot
        .virtualenv
        .map(|v| v.base_python.to_string_lossy().to_string());
    let receipt = Receipt::new(formula, python, linked);
    receipt.write(&keg)?;
    cleanup.commit();

    let (files, bytes) = keg_usage(&keg);
    output::success(&format!(
        "{}: {} files, {}",
        keg.display(),
        files,
        output::human_size(bytes)
    ));
    Ok(InstallOutcome::Installed(receipt))
}

fn run_install_action(
    engine: &Engine,
    loaded: &LoadedFormula,
    config: &Config,
    keg: &Path,
    source: Staged,
    resources: Vec<Staged>,
) -> Result<ExecutionContext> {
    let mut ctx = ExecutionContext::new(config.prefix.clone(), keg.to_path_buf());
    ctx.source = Some(source);
    ctx.resources = resources;
    ctx.python = loaded.formula.python().map(|dep| dep.executable());

    let guard = context::enter(ctx);
    call_action(engine, &loaded.ast, "install")?;
    guard
        .snapshot()
        .ok_or_else(|| anyhow::anyhow!("execution context lost during install()"))
}

/// Download and verify every archive of a formula without installing.
///
/// With `force`, cached archives are ignored so every URL is fetched and
/// checked against its declared digest again.
pub fn fetch(engine: &Engine, config: &Config, formula_path: &Path, force: bool) -> Result<Vec<Staged>> {
    let loaded = loader::load_file(engine, formula_path)?;
    let formula = &loaded.formula;
    output::action(&format!("Fetching {} {}", formula.name, formula.version));

    let opts = FetchOptions {
        timeout: config.http_timeout,
        force,
    };
    let (source, mut resources) = acquire::acquire(formula, &config.cache_dir, &opts)?;
    resources.insert(0, source);
    output::success(&format!("{} archives verified", resources.len()));
    Ok(resources)
}

/// Run the formula's test() against its installed keg.
pub fn test(engine: &Engine, config: &Config, formula_path: &Path) -> Result<()> {
    let loaded = loader::load_file(engine, formula_path)?;
    let formula = &loaded.formula;
    let keg = keg_path(config, &formula.name, &formula.version);
    if Receipt::read(&keg)?.is_none() {
        anyhow::bail!("{} {} is not installed", formula.name, formula.version);
    }
    if !loaded.has_action("test") {
        anyhow::bail!("{} defines no test", formula.name);
    }

    output::action(&format!("Testing {}", formula.name));
    let _guard = context::enter(ExecutionContext::new(config.prefix.clone(), keg));
    let mut scope = Scope::new();
    let result = engine
        .call_fn::<Dynamic>(&mut scope, &loaded.ast, "test", ())
        .map_err(|e| anyhow::anyhow!("{} test failed: {}", formula.name, e))?;

    if result.as_bool() == Ok(false) {
        anyhow::bail!("{} test failed: test() returned false", formula.name);
    }
    output::success(&format!("{} test passed", formula.name));
    Ok(())
}

/// Remove every installed version of a formula.
pub fn remove(config: &Config, name: &str) -> Result<Vec<Receipt>> {
    if !formula::is_path_component(name) {
        anyhow::bail!("invalid formula name '{}'", name);
    }
    let cellar = config.cellar();
    let root = cellar.join(name);
    let _lock = lock::acquire_keg_lock(&cellar, name)?;

    let receipts: Vec<Receipt> = receipt::installed(&cellar)?
        .into_iter()
        .filter(|r| r.name == name)
        .collect();
    if receipts.is_empty() {
        anyhow::bail!("{} is not installed", name);
    }

    output::action(&format!("Removing {}", name));
    for r in &receipts {
        let keg = keg_path(config, &r.name, &r.version);
        let removed = link::unlink(&r.linked, &keg);
        output::detail(&format!("unlinked {} executable(s) of {}", removed, r.version));
    }
    std::fs::remove_dir_all(&root)
        .with_context(|| format!("Failed to remove {}", root.display()))?;
    output::success(&format!("{} removed", name));
    Ok(receipts)
}

/// Number of regular files and their total size under a keg
pub fn keg_usage(keg: &Path) -> (usize, u64) {
    walkdir::WalkDir::new(keg)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .fold((0, 0), |(files, bytes), e| {
            (files + 1, bytes + e.metadata().map(|m| m.len()).unwrap_or(0))
        })
}

/// Call an action function in the formula
fn call_action(engine: &Engine, ast: &AST, action: &str) -> Result<()> {
    let mut scope = Scope::new();
    engine
        .call_fn::<Dynamic>(&mut scope, ast, action, ())
        .map_err(|e| anyhow::anyhow!("Action '{}' failed: {}", action, e))?;
    Ok(())
}
