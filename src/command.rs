//! Shell command specification and single invocation.
//!
//! A `ShellCommand` is the immutable description of what to run: a root
//! interpreter (`bash -c` by default) with the user's target command appended
//! as the final argument. `run()` performs exactly one invocation and always
//! yields an [`Outcome`] — a failing command is data, never an `Err`.

use std::fmt;
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;

use crate::error::{FlakrError, Result};
use crate::outcome::Outcome;

/// Immutable specification of the command to invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: String,
    args: Vec<String>,
}

impl ShellCommand {
    /// Build a command from the root interpreter parts and the target
    /// command line, which becomes the interpreter's final argument.
    ///
    /// `root` must be non-empty (program first, then its own arguments) and
    /// `target` must be a non-empty command line.
    pub fn new(root: &[String], target: &str) -> Result<Self> {
        let mut problems = Vec::new();
        if root.is_empty() || root[0].is_empty() {
            problems.push("missing root command".to_string());
        }
        if target.trim().is_empty() {
            problems.push("missing target command".to_string());
        }
        if !problems.is_empty() {
            if target.trim().is_empty() {
                return Err(FlakrError::MissingCommand);
            }
            return Err(FlakrError::construction(problems));
        }

        let mut args: Vec<String> = root[1..].to_vec();
        args.push(target.to_string());
        Ok(Self { program: root[0].clone(), args })
    }

    /// The interpreter program.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The interpreter arguments, target command line last.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run the command once, capturing both streams, and return the outcome.
    ///
    /// Spawn failures (e.g. the interpreter does not exist) are reported as
    /// an outcome with `code = -1` and `error` set, not as an `Err`.
    pub async fn run(&self) -> Outcome {
        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(output) => {
                // Terminated-by-signal leaves no exit code; -1 is a value
                // bash does not normally return
                let code = output.status.code().unwrap_or(-1);
                let error = if code == 0 { None } else { Some(format!("exit status {code}")) };
                Outcome {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    code,
                    error,
                    duration: start.elapsed(),
                }
            }
            Err(err) => Outcome {
                stdout: String::new(),
                stderr: String::new(),
                code: -1,
                error: Some(format!("unable to run {}: {err}", self.program)),
                duration: start.elapsed(),
            },
        }
    }
}

impl fmt::Display for ShellCommand {
    /// Renders the full command, double-quoting arguments that are empty or
    /// contain whitespace.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.chars().any(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}
