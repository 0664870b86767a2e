//! Rhai-based formula installer for virtualenv-packaged applications
//!
//! A formula declares a source archive, its sha256, and a flat list of
//! pinned resources. The engine fetches and verifies every archive, then
//! runs the formula's `install()` function, which normally creates a
//! virtualenv and installs everything into it with pip.
//!
//! # Example Formula
//!
//! ```rhai
//! let name = "posting";
//! let desc = "HTTP client that lives in your terminal";
//! let homepage = "https://posting.sh";
//! let url = "https://files.pythonhosted.org/packages/.../posting-1.11.0.tar.gz";
//! let sha256 = "7db8a6a470724901b22cbbc8e5c727583fbe92f95271e5049c291f1e44000bcf";
//! let license = "Apache-2.0";
//! let depends_on = ["python@3.11"];
//!
//! let resources = [
//!     #{ name: "anyio", url: "https://.../anyio-4.4.0.tar.gz", sha256: "5aad..." },
//! ];
//!
//! fn install() {
//!     virtualenv_create(libexec(), "python3.11");
//!     virtualenv_install_with_resources();
//! }
//!
//! fn test() {
//!     run_status("posting --help") == 0
//! }
//! ```
//!
//! # Layout
//!
//! - `<prefix>/Cellar/<name>/<version>` - the keg
//! - `<keg>/libexec` - the virtualenv
//! - `<keg>/bin` - links to the entry points the package installed
//! - `<prefix>/bin` - links to `<keg>/bin`
//!
//! # Engine-Provided Functions
//!
//! - `virtualenv_create(dir, python)` / `virtualenv_create(python)`
//! - `virtualenv_install_with_resources()` - every resource, then the package
//! - `pip_install(resource)` - a single resource
//! - `prefix()`, `keg()`, `libexec()`, `bin()` - keg paths
//! - `run_status(cmd)`, `run_output(cmd)`, `env(name)`, `exists(path)`

pub mod core;
mod engine;
pub mod formula;
pub mod helpers;

pub use crate::core::config::Config;
pub use crate::core::error::FormulaError;
pub use crate::core::output;
pub use crate::core::receipt::Receipt;
pub use engine::context::Staged;
pub use engine::{FormulaEngine, InstallOutcome, LoadedFormula};
pub use formula::{Checksum, Dependency, Formula, Resource};
