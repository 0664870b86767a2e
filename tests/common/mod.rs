//! Shared fixtures for the formula integration tests.
//!
//! Tests install against a fake `python` shell script so no real
//! interpreter or network access is needed. The fake understands
//! `-m venv DIR` and `-m pip install ... ARCHIVE`: every pip call is
//! appended to `<venv>/pip.log`, and installing the main package's archive
//! drops an entry point named after it into `<venv>/bin`.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use venv_formula::{Config, FormulaEngine, helpers};

const FAKE_PYTHON: &str = r#"#!/bin/sh
if [ "$1" = "-m" ] && [ "$2" = "venv" ]; then
    mkdir -p "$3/bin" || exit 1
    cp "$0" "$3/bin/python" && chmod +x "$3/bin/python"
    exit $?
fi
if [ "$1" = "-m" ] && [ "$2" = "pip" ]; then
    for last; do :; done
    bindir=$(dirname "$0")
    archive=$(basename "$last")
    echo "$archive" >> "$bindir/../pip.log"
    case "$archive" in
        *--broken-*)
            echo "error: could not build wheels for broken" >&2
            exit 1
            ;;
        *--@ENTRY@-*)
            printf '#!/bin/sh\necho "@ENTRY@ ok"\n' > "$bindir/@ENTRY@"
            chmod +x "$bindir/@ENTRY@"
            ;;
    esac
    exit 0
fi
echo "unsupported: $*" >&2
exit 2
"#;

/// A scratch prefix, cache and formula directory
pub struct TestEnv {
    pub dir: TempDir,
    pub engine: FormulaEngine,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = Config {
            prefix: dir.path().join("prefix"),
            cache_dir: dir.path().join("cache"),
            formula_dir: dir.path().join("Formula"),
            ..Config::default()
        };
        std::fs::create_dir_all(&config.formula_dir).unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        Self {
            dir,
            engine: FormulaEngine::new(config),
        }
    }

    pub fn prefix(&self) -> PathBuf {
        self.engine.config().prefix.clone()
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.engine.config().cache_dir.clone()
    }

    pub fn keg(&self, name: &str, version: &str) -> PathBuf {
        self.prefix().join("Cellar").join(name).join(version)
    }

    /// Write a fake interpreter whose pip creates the `entry` executable
    #[cfg(unix)]
    pub fn fake_python(&self, entry: &str) -> PathBuf {
        let path = self.dir.path().join("python3-fake");
        write_fake_python(&path, entry);
        path
    }

    /// Create a local archive and return its `file://` URL and sha256
    pub fn archive(&self, filename: &str, content: &str) -> (String, String) {
        let path = self.archive_path(filename);
        std::fs::write(&path, content).unwrap();
        let sha256 = helpers::hash::sha256_file(&path).unwrap();
        (format!("file://{}", path.display()), sha256)
    }

    pub fn archive_path(&self, filename: &str) -> PathBuf {
        self.dir.path().join("src").join(filename)
    }

    /// Write `<formula_dir>/<name>.rhai`
    pub fn write_formula(&self, name: &str, content: &str) -> PathBuf {
        let path = self.engine.config().formula_dir.join(format!("{}.rhai", name));
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Archives pip was invoked with inside a keg's virtualenv, in order
    pub fn pip_log(&self, name: &str, version: &str) -> Vec<String> {
        let log = self.keg(name, version).join("libexec/pip.log");
        std::fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }
}

/// Write the fake interpreter script to `path`
#[cfg(unix)]
pub fn write_fake_python(path: &Path, entry: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(path, FAKE_PYTHON.replace("@ENTRY@", entry)).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Write a `demo` formula with two resources, installed with `python`
pub fn demo_formula(env: &TestEnv, python: &Path, test_body: &str) -> PathBuf {
    let (url, sha) = env.archive("demo-1.0.tar.gz", "demo source");
    let (a_url, a_sha) = env.archive("alpha-0.1.tar.gz", "alpha source");
    let (b_url, b_sha) = env.archive("beta-2.3.tar.gz", "beta source");
    env.write_formula(
        "demo",
        &format!(
            r#"
let desc = "Demo application";
let homepage = "https://example.com/demo";
let license = "MIT";
let url = "{url}";
let sha256 = "{sha}";

let resources = [
    #{{ name: "alpha", url: "{a_url}", sha256: "{a_sha}" }},
    #{{ name: "beta", url: "{b_url}", sha256: "{b_sha}" }},
];

fn install() {{
    virtualenv_create(libexec(), "{python}");
    virtualenv_install_with_resources();
}}

fn test() {{
    {test_body}
}}
"#,
            python = python.display()
        ),
    )
}
