//! Formula loading
//!
//! A formula file is evaluated once for its top-level `let` bindings, which
//! are then read back out of the scope and validated.

use crate::core::error::{FormulaError, Result};
use crate::formula::{self, Checksum, Dependency, Formula, Resource};
use rhai::{AST, Dynamic, Engine, Scope};
use serde::de::DeserializeOwned;
use std::path::Path;

/// A compiled and validated formula
#[derive(Debug, Clone)]
pub struct LoadedFormula {
    pub formula: Formula,
    pub ast: AST,
}

impl LoadedFormula {
    /// Whether the script defines an action function
    pub fn has_action(&self, name: &str) -> bool {
        self.ast.iter_functions().any(|f| f.name == name)
    }
}

/// Load a formula file. The file stem is used when `name` is not bound.
pub fn load_file(engine: &Engine, path: &Path) -> Result<LoadedFormula> {
    read_file(engine, path, load_str)
}

/// Load a formula file without checking its invariants, for auditing.
pub fn inspect_file(engine: &Engine, path: &Path) -> Result<LoadedFormula> {
    read_file(engine, path, inspect_str)
}

fn read_file(
    engine: &Engine,
    path: &Path,
    load: fn(&Engine, &str, &str) -> Result<LoadedFormula>,
) -> Result<LoadedFormula> {
    let script = std::fs::read_to_string(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    load(engine, &script, &stem)
        .map_err(|e| FormulaError::Invalid(format!("{}: {}", path.display(), invalid_detail(e))))
}

fn invalid_detail(e: FormulaError) -> String {
    match e {
        FormulaError::Invalid(msg) => msg,
        other => other.to_string(),
    }
}

/// Load a formula from source text.
pub fn load_str(engine: &Engine, script: &str, fallback_name: &str) -> Result<LoadedFormula> {
    let loaded = inspect_str(engine, script, fallback_name)?;
    loaded.formula.validate()?;
    Ok(loaded)
}

/// Evaluate a formula and read its bindings, skipping `Formula::validate`.
pub fn inspect_str(engine: &Engine, script: &str, fallback_name: &str) -> Result<LoadedFormula> {
    let ast = engine
        .compile(script)
        .map_err(|e| FormulaError::Invalid(format!("failed to compile: {}", e)))?;

    let mut scope = Scope::new();
    engine
        .run_ast_with_scope(&mut scope, &ast)
        .map_err(|e| FormulaError::Invalid(format!("failed to evaluate: {}", e)))?;

    let formula = read_formula(&scope, fallback_name)?;
    Ok(LoadedFormula { formula, ast })
}

fn read_formula(scope: &Scope, fallback_name: &str) -> Result<Formula> {
    let name = get_string(scope, "name")?.unwrap_or_else(|| fallback_name.to_string());
    let url = get_string(scope, "url")?
        .ok_or_else(|| FormulaError::Invalid("missing `url`".into()))?;
    let sha256 = get_string(scope, "sha256")?
        .ok_or_else(|| FormulaError::Invalid("missing `sha256`".into()))?;
    let sha256 = Checksum::try_from(sha256)?;

    let version = match get_string(scope, "version")? {
        Some(v) => v,
        None => formula::infer_version(&url).ok_or_else(|| {
            FormulaError::Invalid(format!("no `version` and none can be inferred from {}", url))
        })?,
    };

    Ok(Formula {
        name,
        version,
        desc: get_string(scope, "desc")?.unwrap_or_default(),
        homepage: get_string(scope, "homepage")?.unwrap_or_default(),
        license: get_string(scope, "license")?.unwrap_or_default(),
        url,
        sha256,
        depends_on: get_list::<Dependency>(scope, "depends_on")?,
        build_depends_on: get_list::<Dependency>(scope, "build_depends_on")?,
        resources: get_list::<Resource>(scope, "resources")?,
    })
}

fn get_string(scope: &Scope, var: &str) -> Result<Option<String>> {
    match scope.get_value::<Dynamic>(var) {
        None => Ok(None),
        Some(value) => {
            let type_name = value.type_name();
            value.into_string().map(Some).map_err(|_| {
                FormulaError::Invalid(format!("`{}` must be a string, got {}", var, type_name))
            })
        }
    }
}

fn get_list<T: DeserializeOwned>(scope: &Scope, var: &str) -> Result<Vec<T>> {
    match scope.get_value::<Dynamic>(var) {
        None => Ok(Vec::new()),
        Some(value) => rhai::serde::from_dynamic(&value)
            .map_err(|e| FormulaError::Invalid(format!("`{}`: {}", var, e))),
    }
}
