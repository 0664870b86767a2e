//! Rhai-based formula engine
//!
//! Provides the execution environment for formula scripts.

pub mod context;
pub mod lifecycle;
pub mod loader;
pub mod phases;
pub mod util;

use crate::core::config::Config;
use crate::core::receipt::{self, Receipt};
use anyhow::Result;
use rhai::Engine;
use std::path::Path;

pub use lifecycle::InstallOutcome;
pub use loader::LoadedFormula;

/// Formula execution engine
pub struct FormulaEngine {
    engine: Engine,
    config: Config,
}

impl FormulaEngine {
    /// Create a new formula engine
    pub fn new(config: Config) -> Self {
        let mut engine = Engine::new();

        // Virtualenv helpers
        engine.register_fn("virtualenv_create", phases::virtualenv_create);
        engine.register_fn("virtualenv_create", phases::virtualenv_create_in_libexec);
        engine.register_fn(
            "virtualenv_install_with_resources",
            phases::virtualenv_install_with_resources,
        );
        engine.register_fn("pip_install", phases::pip_install_resource);

        // Keg paths
        engine.register_fn("prefix", util::prefix);
        engine.register_fn("keg", util::keg);
        engine.register_fn("libexec", util::libexec);
        engine.register_fn("bin", util::bin);

        // Environment and commands, mostly for test()
        engine.register_fn("env", util::get_env);
        engine.register_fn("exists", util::exists);
        engine.register_fn("run_status", util::run_status);
        engine.register_fn("run_output", util::run_output);

        Self { engine, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load and validate a formula file
    pub fn load(&self, formula_path: &Path) -> Result<LoadedFormula> {
        Ok(loader::load_file(&self.engine, formula_path)?)
    }

    /// Load a formula without rejecting invariant violations, so that
    /// `audit` can report them
    pub fn inspect(&self, formula_path: &Path) -> Result<LoadedFormula> {
        Ok(loader::inspect_file(&self.engine, formula_path)?)
    }

    /// Install a formula (no-op when this version is already installed,
    /// unless `force` is set)
    pub fn install(&self, formula_path: &Path, force: bool) -> Result<InstallOutcome> {
        lifecycle::install(&self.engine, &self.config, formula_path, force)
    }

    /// Fetch and verify every archive of a formula
    pub fn fetch(&self, formula_path: &Path, force: bool) -> Result<Vec<context::Staged>> {
        lifecycle::fetch(&self.engine, &self.config, formula_path, force)
    }

    /// Run the formula's test() against the installed keg
    pub fn test(&self, formula_path: &Path) -> Result<()> {
        lifecycle::test(&self.engine, &self.config, formula_path)
    }

    /// Remove every installed version of `name`
    pub fn remove(&self, name: &str) -> Result<Vec<Receipt>> {
        lifecycle::remove(&self.config, name)
    }

    /// Receipts of everything installed
    pub fn installed(&self) -> Result<Vec<Receipt>> {
        receipt::installed(&self.config.cellar())
    }
}
