//! Execution context management for formula scripts
//!
//! Helpers called from Rhai have no arguments for "where am I installing"
//! or "which archives were fetched"; they read this thread-local context.

use crate::formula::Resource;
use rhai::EvalAltResult;
use std::cell::RefCell;
use std::path::PathBuf;

/// A verified archive ready to hand to the installer
#[derive(Debug, Clone)]
pub struct Staged {
    pub resource: Resource,
    pub archive: PathBuf,
}

/// An isolated environment created by `virtualenv_create`
#[derive(Debug, Clone)]
pub struct Virtualenv {
    pub root: PathBuf,
    /// Base interpreter the environment was created from
    pub base_python: PathBuf,
}

impl Virtualenv {
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// The environment's own interpreter
    pub fn python(&self) -> PathBuf {
        self.bin_dir().join("python")
    }
}

/// Execution context for formula scripts
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub prefix: PathBuf,
    /// `<prefix>/Cellar/<name>/<version>`
    pub keg: PathBuf,
    pub source: Option<Staged>,
    pub resources: Vec<Staged>,
    pub virtualenv: Option<Virtualenv>,
    /// Executable of the declared python runtime (`python3.11` for `python@3.11`)
    pub python: Option<String>,
    /// Resource names already installed into the virtualenv
    pub installed: Vec<String>,
}

impl ExecutionContext {
    pub fn new(prefix: PathBuf, keg: PathBuf) -> Self {
        Self {
            prefix,
            keg,
            source: None,
            resources: Vec::new(),
            virtualenv: None,
            python: None,
            installed: Vec::new(),
        }
    }

    pub fn libexec(&self) -> PathBuf {
        self.keg.join("libexec")
    }

    pub fn bin(&self) -> PathBuf {
        self.keg.join("bin")
    }
}

thread_local! {
    /// Current execution context for helper functions
    static CONTEXT: RefCell<Option<ExecutionContext>> = const { RefCell::new(None) };
}

/// Install `ctx` as the current context until the returned guard is dropped
pub fn enter(ctx: ExecutionContext) -> ContextGuard {
    CONTEXT.with(|c| *c.borrow_mut() = Some(ctx));
    ContextGuard { _private: () }
}

/// Clears the context on drop, including on early return or panic
#[derive(Debug)]
pub struct ContextGuard {
    _private: (),
}

impl ContextGuard {
    /// Snapshot of the context as it stands now
    pub fn snapshot(&self) -> Option<ExecutionContext> {
        CONTEXT.with(|c| c.borrow().clone())
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CONTEXT.with(|c| *c.borrow_mut() = None);
    }
}

/// Execute a closure with immutable access to the context
pub fn with_context<F, R>(f: F) -> Result<R, Box<EvalAltResult>>
where
    F: FnOnce(&ExecutionContext) -> Result<R, Box<EvalAltResult>>,
{
    CONTEXT.with(|c| {
        let ctx = c.borrow();
        let ctx = ctx.as_ref().ok_or("No execution context")?;
        f(ctx)
    })
}

/// Execute a closure with mutable access to the context
pub fn with_context_mut<F, R>(f: F) -> Result<R, Box<EvalAltResult>>
where
    F: FnOnce(&mut ExecutionContext) -> Result<R, Box<EvalAltResult>>,
{
    CONTEXT.with(|c| {
        let mut ctx = c.borrow_mut();
        let ctx = ctx.as_mut().ok_or("No execution context")?;
        f(ctx)
    })
}
