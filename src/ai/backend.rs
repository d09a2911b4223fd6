//! Language-model runtime invocation
//!
//! The runtime is an external command that reads a prompt on stdin and
//! prints its answer on stdout.

use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("failed to start {program}: {source}")]
    Start {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to send prompt: {0}")]
    Prompt(#[source] io::Error),

    #[error("failed to read answer: {0}")]
    Output(#[source] io::Error),

    #[error("{program} exited with {status}")]
    Exit { program: String, status: ExitStatus },
}

/// Turns a prompt into raw model output
pub trait Translator: Send + Sync {
    fn translate(&self, prompt: &str) -> Result<String, AiError>;
}

/// Runs `<program> run <model>` with the prompt piped to stdin
#[derive(Clone, Debug)]
pub struct CommandRuntime {
    program: String,
    args: Vec<String>,
}

impl CommandRuntime {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// `ollama run <model>`
    pub fn ollama(program: &str, model: &str) -> Self {
        Self::new(program, &["run", model])
    }
}

impl Translator for CommandRuntime {
    fn translate(&self, prompt: &str) -> Result<String, AiError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| AiError::Start {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(prompt.as_bytes()) {
                // Reap the runtime before reporting
                let _ = child.kill();
                let _ = child.wait();
                return Err(AiError::Prompt(e));
            }
        }

        let output = child.wait_with_output().map_err(AiError::Output)?;
        if !output.status.success() {
            return Err(AiError::Exit {
                program: self.program.clone(),
                status: output.status,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_start_error() {
        let runtime = CommandRuntime::new("cerebro-no-such-runtime", &[]);
        let err = runtime.translate("hi").unwrap_err();
        assert!(matches!(err, AiError::Start { .. }));
        assert!(err.to_string().contains("cerebro-no-such-runtime"));
    }

    #[test]
    #[cfg(unix)]
    fn test_prompt_is_piped_to_stdin() {
        let runtime = CommandRuntime::new("cat", &[]);
        assert_eq!(runtime.translate("ls -la\n").unwrap(), "ls -la\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_nonzero_exit_is_error() {
        let runtime = CommandRuntime::new("sh", &["-c", "cat >/dev/null; exit 3"]);
        assert!(matches!(runtime.translate("x"), Err(AiError::Exit { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_runtime_that_ignores_stdin_fails_prompt() {
        // Exits without reading, so a prompt larger than the pipe buffer breaks the pipe
        let runtime = CommandRuntime::new("sh", &["-c", "exit 0"]);
        let prompt = "x".repeat(1 << 20);
        assert!(matches!(runtime.translate(&prompt), Err(AiError::Prompt(_))));
    }
}
