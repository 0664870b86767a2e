//! Shell commands for formula scripts
//!
//! Commands run through `sh -c` with the keg's `bin/` first on PATH, so a
//! `test()` block can call the installed executable by name.

use crate::engine::context::with_context;
use rhai::EvalAltResult;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

/// Builder for shell command execution.
///
/// # Example
/// ```ignore
/// ShellCmd::new("posting --help")
///     .env("NO_COLOR", "1")
///     .path_prepend("/prefix/Cellar/posting/1.11.0/bin")
///     .status();
/// ```
#[derive(Clone, Debug)]
pub struct ShellCmd {
    cmd: String,
    env: BTreeMap<String, OsString>,
    path_prepend: Vec<PathBuf>,
}

impl ShellCmd {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            env: BTreeMap::new(),
            path_prepend: Vec::new(),
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Put `dir` in front of PATH
    pub fn path_prepend(mut self, dir: impl Into<PathBuf>) -> Self {
        self.path_prepend.push(dir.into());
        self
    }

    /// Apply the current execution context, if any
    fn with_formula_env(self) -> Self {
        let ctx = with_context(|ctx| Ok((ctx.prefix.clone(), ctx.keg.clone(), ctx.bin(), ctx.libexec())));
        match ctx {
            Ok((prefix, keg, bin, libexec)) => self
                .env("PREFIX", prefix)
                .env("KEG", keg)
                .env("LIBEXEC", libexec)
                .path_prepend(bin),
            Err(_) => self,
        }
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", &self.cmd]);

        for (k, v) in &self.env {
            cmd.env(k, v);
        }

        if !self.path_prepend.is_empty() {
            let existing = std::env::var_os("PATH").unwrap_or_default();
            let paths = self
                .path_prepend
                .iter()
                .cloned()
                .chain(std::env::split_paths(&existing));
            if let Ok(joined) = std::env::join_paths(paths) {
                cmd.env("PATH", joined);
            }
        }

        cmd
    }

    /// Run the command and return the exit status code.
    ///
    /// Returns -1 if the command couldn't be started.
    pub fn status(&self) -> i64 {
        self.build_command()
            .status()
            .map(|s| s.code().unwrap_or(-1) as i64)
            .unwrap_or(-1)
    }

    /// Run the command and capture stdout.
    ///
    /// Returns error if command fails (non-zero exit).
    pub fn output(&self) -> Result<String, Box<EvalAltResult>> {
        let output = self
            .build_command()
            .output()
            .map_err(|e| format!("command failed to start: {}", e))?;

        if !output.status.success() {
            return Err(format!(
                "command failed with exit code: {:?}\n  command: {}",
                output.status.code(),
                self.truncated_cmd()
            )
            .into());
        }

        String::from_utf8(output.stdout).map_err(|e| format!("invalid utf8 output: {}", e).into())
    }

    fn truncated_cmd(&self) -> String {
        if self.cmd.chars().count() > 60 {
            let head: String = self.cmd.chars().take(57).collect();
            format!("{}...", head)
        } else {
            self.cmd.clone()
        }
    }
}

/// `run_status(cmd)` - exit code of a shell command
pub fn run_status(cmd: &str) -> i64 {
    ShellCmd::new(cmd).with_formula_env().status()
}

/// `run_output(cmd)` - stdout of a shell command, error on non-zero exit
pub fn run_output(cmd: &str) -> Result<String, Box<EvalAltResult>> {
    ShellCmd::new(cmd).with_formula_env().output()
}
