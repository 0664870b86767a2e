//! Checks on the formulas shipped in `Formula/`

use std::path::PathBuf;
use tempfile::TempDir;
use venv_formula::formula::audit;
use venv_formula::{Config, Dependency, FormulaEngine, Receipt};

fn shipped(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("Formula")
        .join(format!("{}.rhai", name))
}

fn engine() -> FormulaEngine {
    let dir = std::env::temp_dir().join("venv-formula-data-tests");
    FormulaEngine::new(Config {
        prefix: dir.join("prefix"),
        cache_dir: dir.join("cache"),
        ..Config::default()
    })
}

#[test]
fn test_posting_metadata() {
    let loaded = engine().load(&shipped("posting")).unwrap();
    let f = &loaded.formula;

    assert_eq!(f.name, "posting");
    assert_eq!(f.version, "1.11.0");
    assert_eq!(f.license, "Apache-2.0");
    assert_eq!(f.homepage, "https://posting.sh");
    assert_eq!(
        f.sha256.as_str(),
        "7db8a6a470724901b22cbbc8e5c727583fbe92f95271e5049c291f1e44000bcf"
    );
    assert_eq!(f.depends_on, vec![Dependency("python@3.11".into())]);
    assert_eq!(f.depends_on[0].executable(), "python3.11");
    assert_eq!(
        f.build_depends_on
            .iter()
            .map(|d| d.executable())
            .collect::<Vec<_>>(),
        vec!["cmake", "rustc"]
    );
    assert!(loaded.has_action("install"));
    assert!(loaded.has_action("test"));
}

#[test]
fn test_posting_resources() {
    let loaded = engine().load(&shipped("posting")).unwrap();
    let f = &loaded.formula;

    assert_eq!(f.resources.len(), 30);
    assert_eq!(f.resources.first().unwrap().name, "annotated-types");
    assert_eq!(f.resources.last().unwrap().name, "xdg-base-dirs");

    let yaml = f.resource("pyyaml").unwrap();
    assert_eq!(yaml.name, "PyYAML");
    assert_eq!(yaml.filename(), "PyYAML-6.0.1.tar.gz");

    let languages = f.resource("tree-sitter-languages").unwrap();
    assert!(languages.url.starts_with("https://github.com/"));
    assert_eq!(languages.filename(), "v1.10.2.tar.gz");
}

#[test]
fn test_posting_audit_flags_desc() {
    let loaded = engine().load(&shipped("posting")).unwrap();
    let problems = audit::audit(&loaded.formula);

    assert_eq!(problems.len(), 2);
    assert!(problems.iter().all(|p| p.subject == "desc"));
    assert!(problems.iter().any(|p| p.message.contains("article")));
    assert!(problems.iter().any(|p| p.message.contains("period")));
}

#[test]
fn test_posting_test_block_always_fails() {
    let dir = TempDir::new().unwrap();
    let engine = FormulaEngine::new(Config {
        prefix: dir.path().join("prefix"),
        cache_dir: dir.path().join("cache"),
        ..Config::default()
    });
    let path = shipped("posting");

    // Mark the keg installed without building it; test() never looks inside
    let loaded = engine.load(&path).unwrap();
    let keg = dir.path().join("prefix/Cellar/posting/1.11.0");
    std::fs::create_dir_all(&keg).unwrap();
    Receipt::new(&loaded.formula, None, vec![]).write(&keg).unwrap();

    let err = engine.test(&path).unwrap_err();
    assert!(err.to_string().contains("posting test failed: test() returned false"));
}
