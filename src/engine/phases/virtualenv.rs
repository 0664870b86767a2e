//! Virtualenv phase helpers
//!
//! Create an isolated environment and install the staged archives into it
//! with the environment's own pip. Dependency ordering is pip's business;
//! every archive is installed with `--no-deps`.

use crate::core::error::{FormulaError, Result};
use crate::core::output;
use crate::engine::context::{Staged, Virtualenv, with_context, with_context_mut};
use rhai::EvalAltResult;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::link;

/// Arguments passed to pip for every archive
const PIP_INSTALL_ARGS: &[&str] = &[
    "-m",
    "pip",
    "install",
    "-v",
    "--no-deps",
    "--no-binary=:all:",
    "--ignore-installed",
    "--no-compile",
];

/// Lines of installer stderr shown when it fails
const STDERR_TAIL_LINES: usize = 20;

/// Resolve a python interpreter: a bare name is searched on PATH,
/// anything with a separator is used as a path.
pub fn resolve_python(python: &str) -> Result<PathBuf> {
    if python.contains(std::path::MAIN_SEPARATOR) || python.contains('/') {
        let path = PathBuf::from(python);
        if path.is_file() {
            return Ok(path);
        }
        return Err(FormulaError::unavailable(python, "interpreter does not exist"));
    }
    which::which(python).map_err(|_| FormulaError::unavailable(python, "not found on PATH"))
}

/// Create a virtualenv at `dir` using `python -m venv`.
pub fn create(dir: &Path, python: &str) -> Result<Virtualenv> {
    let base_python = resolve_python(python)?;
    if let Some(parent) = dir.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut cmd = Command::new(&base_python);
    cmd.arg("-m").arg("venv").arg(dir);
    run_quiet(cmd, &format!("{} -m venv {}", python, dir.display()))?;

    let venv = Virtualenv {
        root: dir.to_path_buf(),
        base_python,
    };
    if !venv.python().exists() {
        return Err(FormulaError::unavailable(
            "virtualenv",
            format!("{} was not created", venv.python().display()),
        ));
    }
    Ok(venv)
}

/// Full pip argument list for one archive
pub fn pip_install_args(archive: &Path) -> Vec<OsString> {
    PIP_INSTALL_ARGS
        .iter()
        .map(OsString::from)
        .chain(std::iter::once(archive.as_os_str().to_os_string()))
        .collect()
}

/// Install one staged archive into `venv`.
pub fn pip_install(venv: &Virtualenv, staged: &Staged) -> Result<()> {
    let mut cmd = Command::new(venv.python());
    cmd.args(pip_install_args(&staged.archive));
    run_quiet(cmd, &format!("pip install {}", staged.resource.name))?;
    output::detail(&format!("installed {}", staged.resource.name));
    Ok(())
}

/// Executables currently present in a directory
pub fn executables(dir: &Path) -> Result<BTreeSet<OsString>> {
    let mut found = BTreeSet::new();
    if !dir.exists() {
        return Ok(found);
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.path().is_file() {
            found.insert(entry.file_name());
        }
    }
    Ok(found)
}

/// Run a command with a spinner, capturing output. On failure the tail of
/// stderr is shown and the exit code reported.
fn run_quiet(mut cmd: Command, display: &str) -> Result<()> {
    let pb = output::spinner(display);
    let out = cmd.output();
    pb.finish_and_clear();
    let out = out.map_err(|e| FormulaError::unavailable(display, e))?;

    if output::is_verbose() {
        for line in String::from_utf8_lossy(&out.stdout).lines() {
            output::debug(line);
        }
    }

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        let lines: Vec<_> = stderr.lines().collect();
        for line in &lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..] {
            output::detail(line);
        }
        return Err(FormulaError::CommandFailed {
            cmd: display.to_string(),
            code: out.status.code(),
        });
    }
    Ok(())
}

fn script_err(e: FormulaError) -> Box<EvalAltResult> {
    e.to_string().into()
}

// ============================================================================
// Script-facing helpers
// ============================================================================

/// The interpreter to build with: a bare `python`/`python3` means the
/// formula's declared runtime when it has one.
fn requested_python(python: &str, declared: Option<&str>) -> String {
    match (python, declared) {
        ("python" | "python3", Some(declared)) => declared.to_string(),
        _ => python.to_string(),
    }
}

/// `virtualenv_create(dir, python)`
pub fn virtualenv_create(dir: &str, python: &str) -> Result<(), Box<EvalAltResult>> {
    let declared = with_context(|ctx| Ok(ctx.python.clone()))?;
    let python = requested_python(python, declared.as_deref());
    output::detail(&format!("creating virtualenv with {}", python));
    let venv = create(Path::new(dir), &python).map_err(script_err)?;
    with_context_mut(|ctx| {
        ctx.virtualenv = Some(venv);
        Ok(())
    })
}

/// `virtualenv_create(python)`, placing the environment in the keg's libexec
pub fn virtualenv_create_in_libexec(python: &str) -> Result<(), Box<EvalAltResult>> {
    let libexec = with_context(|ctx| Ok(ctx.libexec()))?;
    virtualenv_create(&libexec.to_string_lossy(), python)
}

fn current_virtualenv() -> Result<Virtualenv, Box<EvalAltResult>> {
    with_context(|ctx| {
        ctx.virtualenv
            .clone()
            .ok_or_else(|| "no virtualenv - call virtualenv_create() first".into())
    })
}

/// `pip_install(name)` - install a single staged resource
pub fn pip_install_resource(name: &str) -> Result<(), Box<EvalAltResult>> {
    let venv = current_virtualenv()?;
    let staged = with_context(|ctx| {
        ctx.resources
            .iter()
            .find(|s| s.resource.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| format!("unknown resource: {}", name).into())
    })?;

    pip_install(&venv, &staged).map_err(script_err)?;
    with_context_mut(|ctx| {
        ctx.installed.push(staged.resource.name);
        Ok(())
    })
}

/// `virtualenv_install_with_resources()`
///
/// Installs every resource not yet installed, then the primary package,
/// and links the entry points the primary package added into `<keg>/bin`.
pub fn virtualenv_install_with_resources() -> Result<(), Box<EvalAltResult>> {
    let venv = current_virtualenv()?;
    let (pending, source, keg_bin) = with_context(|ctx| {
        let pending: Vec<Staged> = ctx
            .resources
            .iter()
            .filter(|s| !ctx.installed.contains(&s.resource.name))
            .cloned()
            .collect();
        let source = ctx
            .source
            .clone()
            .ok_or("no source archive staged")?;
        Ok((pending, source, ctx.bin()))
    })?;

    for staged in &pending {
        pip_install(&venv, staged).map_err(script_err)?;
        with_context_mut(|ctx| {
            ctx.installed.push(staged.resource.name.clone());
            Ok(())
        })?;
    }

    let before = executables(&venv.bin_dir()).map_err(script_err)?;
    pip_install(&venv, &source).map_err(script_err)?;
    let after = executables(&venv.bin_dir()).map_err(script_err)?;

    let entry_points: Vec<OsString> = after.difference(&before).cloned().collect();
    if entry_points.is_empty() {
        output::warning(&format!("{} installed no executables", source.resource.name));
    }
    link::link_entry_points(&venv.bin_dir(), &keg_bin, &entry_points).map_err(script_err)?;
    Ok(())
}
