//! Command runner for the wrapped tools
//!
//! Every external tool is started directly (no intermediate shell), runs to
//! completion and hands back its trimmed stdout/stderr and exit code. Output
//! that the wrappers keep as an artifact is redirected straight into a file.

use crate::error::{Result, WrapperError};
use log::debug;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// A fully built tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub stdout_path: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout_path: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        let arg = path.to_string_lossy().into_owned();
        self.arg(arg)
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_string()));
        self
    }

    /// Append a pass-through option string, split with shell word rules
    pub fn extra_options(self, options: &str) -> Result<Self> {
        let words = shell_words::split(options).map_err(|source| WrapperError::ExtraOptions {
            options: options.to_string(),
            source,
        })?;
        Ok(self.args(words))
    }

    /// Send the tool's stdout to `path` instead of capturing it
    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_path = Some(path.into());
        self
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = shell_words::join(std::iter::once(&self.program).chain(self.args.iter()));
        write!(f, "{}", line)?;
        if let Some(path) = &self.stdout_path {
            write!(f, " > {}", shell_words::quote(&path.to_string_lossy()))?;
        }
        Ok(())
    }
}

/// Captured result of one tool run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "no exit code (terminated by signal)".to_string(),
        }
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            code: output.status.code(),
        }
    }
}

/// Runs a tool invocation to completion
pub trait CommandRunner {
    fn run(&self, command: &ToolCommand) -> Result<CommandOutput>;
}

/// Runner backed by `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> Result<CommandOutput> {
        let mut process = Command::new(&command.program);
        process.args(&command.args).stdin(Stdio::null());

        if let Some(path) = &command.stdout_path {
            let file = File::create(path).map_err(|e| WrapperError::io(path, e))?;
            process.stdout(Stdio::from(file));
        }

        let output = process.output().map_err(|source| {
            // a tool that never started leaves no stdout artifact
            if let Some(path) = &command.stdout_path {
                let _ = std::fs::remove_file(path);
            }
            WrapperError::Spawn {
                program: command.program.clone(),
                source,
            }
        })?;

        Ok(output.into())
    }
}

/// Run `command` and turn a non-zero exit into [`WrapperError::ToolFailed`]
pub fn run_checked(runner: &dyn CommandRunner, command: &ToolCommand) -> Result<CommandOutput> {
    debug!("Running: {}", command);
    let output = runner.run(command)?;

    if !output.success() {
        return Err(WrapperError::ToolFailed {
            command: command.to_string(),
            status: output.status_text(),
            stdout: output.stdout,
            stderr: output.stderr,
        });
    }

    Ok(output)
}

/// Ask `program --version` and return the bare version number
pub fn tool_version(runner: &dyn CommandRunner, program: &str, tool_name: &str) -> Result<String> {
    let command = ToolCommand::new(program).arg("--version");
    let output = run_checked(runner, &command).map_err(|e| WrapperError::VersionUnavailable {
        tool: tool_name.to_string(),
        reason: e.to_string(),
    })?;

    parse_version(&output.stdout, tool_name).ok_or_else(|| WrapperError::VersionUnavailable {
        tool: tool_name.to_string(),
        reason: format!("no line starting with '{}' in: {}", tool_name, output.stdout),
    })
}

/// Last token of the first line that starts with `tool_name`, leading `v`
/// removed. Tools that print a bare number (cutadapt) are accepted too.
pub fn parse_version(text: &str, tool_name: &str) -> Option<String> {
    let prefix = tool_name.to_lowercase();
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

    let named = text
        .lines()
        .map(str::trim)
        .find(|line| line.to_lowercase().starts_with(&prefix))
        .and_then(|line| line.split_whitespace().last());
    let bare = || {
        lines
            .next()
            .filter(|line| !line.contains(char::is_whitespace))
            .filter(|line| line.trim_start_matches('v').starts_with(|c: char| c.is_ascii_digit()))
    };

    named
        .or_else(bare)
        .map(|token| token.trim_start_matches('v').to_string())
        .filter(|version| !version.is_empty())
}
