use anyhow::{Context, Result, anyhow};
use std::process::{Command, Output};
use tracing::{debug, trace};

/// A builder for executing external programs with unified error handling
pub struct Cmd<'a> {
    program: &'a str,
    args: Vec<&'a str>,
}

impl<'a> Cmd<'a> {
    pub fn new(program: &'a str) -> Self {
        Self {
            program,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: &'a str) -> Self {
        self.args.push(arg);
        self
    }

    pub fn args(mut self, args: &[&'a str]) -> Self {
        self.args.extend_from_slice(args);
        self
    }

    /// Run the program, failing if it cannot be found or exits non-zero.
    pub fn run(self) -> Result<Output> {
        let Cmd { program, args } = self;

        let resolved = which::which(program)
            .map_err(|_| anyhow!("'{}' was not found in PATH", program))?;
        trace!(program, path = %resolved.display(), args = ?args, "cmd:run start");

        let output = Command::new(&resolved)
            .args(&args)
            .output()
            .with_context(|| format!("Failed to execute: {} {}", program, args.join(" ")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(
                program,
                status = ?output.status.code(),
                stderr = %stderr.trim(),
                "cmd:run failure"
            );
            return Err(anyhow!(
                "Command failed: {} {}\n{}",
                program,
                args.join(" "),
                stderr.trim()
            ));
        }
        trace!(program, "cmd:run success");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_reported() {
        let err = Cmd::new("wengine-definitely-not-a-real-binary")
            .arg("--help")
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("not found in PATH"));
    }
}
