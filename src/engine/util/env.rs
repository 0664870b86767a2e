//! Environment and path helpers

use crate::engine::context::with_context;
use rhai::EvalAltResult;
use std::path::Path;

/// Get an environment variable, returning empty string if not set
pub fn get_env(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

/// Whether a path exists
pub fn exists(path: &str) -> bool {
    Path::new(path).exists()
}

/// `prefix()` - installation root
pub fn prefix() -> Result<String, Box<EvalAltResult>> {
    with_context(|ctx| Ok(ctx.prefix.to_string_lossy().to_string()))
}

/// `keg()` - `<prefix>/Cellar/<name>/<version>`
pub fn keg() -> Result<String, Box<EvalAltResult>> {
    with_context(|ctx| Ok(ctx.keg.to_string_lossy().to_string()))
}

/// `libexec()` - private directory holding the virtualenv
pub fn libexec() -> Result<String, Box<EvalAltResult>> {
    with_context(|ctx| Ok(ctx.libexec().to_string_lossy().to_string()))
}

/// `bin()` - the keg's linked executables
pub fn bin() -> Result<String, Box<EvalAltResult>> {
    with_context(|ctx| Ok(ctx.bin().to_string_lossy().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::{ExecutionContext, enter};

    #[test]
    fn test_paths_follow_keg() {
        let _guard = enter(ExecutionContext::new("/p".into(), "/p/Cellar/posting/1.11.0".into()));
        assert_eq!(prefix().unwrap(), "/p");
        assert_eq!(keg().unwrap(), "/p/Cellar/posting/1.11.0");
        assert_eq!(libexec().unwrap(), "/p/Cellar/posting/1.11.0/libexec");
        assert_eq!(bin().unwrap(), "/p/Cellar/posting/1.11.0/bin");
    }

    #[test]
    fn test_get_env_missing_is_empty() {
        assert_eq!(get_env("VENV_FORMULA_SURELY_UNSET_VAR"), "");
    }
}
