//! Blocking execution of the `convert` executable.
//!
//! [`ConvertRunner`] holds the resolved executable path — passed in
//! explicitly by the composing application, or looked up on `PATH` via
//! [`discover`](ConvertRunner::discover). It never probes the platform at
//! load time and keeps no per-run state, so one runner can serve any number
//! of sequential or concurrent invocations.

use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("I/O error while driving convert: {0}")]
    Pipe(#[from] io::Error),
    /// Non-zero exit; the message carries the tool's stderr verbatim.
    #[error("convert exited with {status}. {stderr}")]
    Exit { status: ExitStatus, stderr: String },
    #[error("convert did not exit within {limit:?}")]
    Timeout { limit: Duration },
    #[error("no convert executable found on PATH: {0}")]
    Discover(#[source] which::Error),
}

/// Captured stdout/stderr of one finished invocation.
#[derive(Debug)]
pub(crate) struct RawOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Handle on a runnable `convert` executable.
#[derive(Debug, Clone)]
pub struct ConvertRunner {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl ConvertRunner {
    /// Use the executable at `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Resolve `convert` from `PATH`.
    pub fn discover() -> Result<Self, RunError> {
        let program = which::which("convert").map_err(RunError::Discover)?;
        Ok(Self::new(program))
    }

    /// Kill the tool and fail the run if it outlives `limit`. External
    /// tools can hang indefinitely on malformed input; without a limit the
    /// calling thread blocks until the process exits.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run the tool once, feeding `stdin` when given and capturing both
    /// output streams to completion.
    pub(crate) fn run(
        &self,
        args: &[OsString],
        stdin: Option<Vec<u8>>,
    ) -> Result<RawOutput, RunError> {
        debug!(program = %self.program.display(), ?args, "running convert");

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // All three pipes are pumped from their own threads, so a child
        // blocked on a full pipe can never deadlock against this one.
        let writer = stdin.and_then(|payload| {
            child
                .stdin
                .take()
                .map(|mut pipe| thread::spawn(move || pipe.write_all(&payload)))
        });
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        // Join the pumps on every path, timeout included, so no pipe handle
        // outlives the call. A killed child closes its pipes and the reader
        // threads drain out.
        let status = self.wait(&mut child);
        let stdout = join_reader(stdout);
        let stderr = join_reader(stderr);
        if let Some(writer) = writer {
            // A child may exit without draining stdin; the resulting broken
            // pipe is not an error when the exit status is clean.
            let _ = writer.join();
        }

        let status = status?;
        let stdout = stdout?;
        let stderr = stderr?;

        if !status.success() {
            return Err(RunError::Exit {
                status,
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            });
        }

        Ok(RawOutput { stdout, stderr })
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, RunError> {
        let Some(limit) = self.timeout else {
            return Ok(child.wait()?);
        };

        let deadline = Instant::now() + limit;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                child.kill()?;
                child.wait()?;
                return Err(RunError::Timeout { limit });
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> Option<thread::JoinHandle<io::Result<Vec<u8>>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            pipe.read_to_end(&mut buffer)?;
            Ok(buffer)
        })
    })
}

fn join_reader(
    handle: Option<thread::JoinHandle<io::Result<Vec<u8>>>>,
) -> Result<Vec<u8>, RunError> {
    let Some(handle) = handle else {
        return Ok(Vec::new());
    };
    let buffer = handle
        .join()
        .map_err(|_| io::Error::other("pipe reader thread panicked"))??;
    Ok(buffer)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<OsString> {
        vec!["-c".into(), script.into()]
    }

    #[test]
    fn captures_stdout_on_success() {
        let runner = ConvertRunner::new("sh");
        let output = runner.run(&sh("printf hello"), None).unwrap();
        assert_eq!(output.stdout, b"hello");
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn nonzero_exit_carries_stderr_in_message() {
        let runner = ConvertRunner::new("sh");
        let err = runner
            .run(&sh("echo boom >&2; exit 3"), None)
            .unwrap_err();
        match err {
            RunError::Exit { status, stderr } => {
                assert_eq!(status.code(), Some(3));
                assert!(stderr.contains("boom"));
                // the Display impl must surface the tool's diagnostic
                let message = RunError::Exit { status, stderr }.to_string();
                assert!(message.contains("boom"));
            }
            other => panic!("expected Exit, got {other:?}"),
        }
    }

    #[test]
    fn stdin_payload_reaches_the_child() {
        let runner = ConvertRunner::new("cat");
        let payload = vec![0u8, 159, 146, 150];
        let output = runner.run(&[], Some(payload.clone())).unwrap();
        assert_eq!(output.stdout, payload);
    }

    #[test]
    fn large_stdin_and_stdout_do_not_deadlock() {
        // well past the default 64 KiB pipe buffer in both directions
        let runner = ConvertRunner::new("cat");
        let payload = vec![42u8; 1 << 20];
        let output = runner.run(&[], Some(payload.clone())).unwrap();
        assert_eq!(output.stdout.len(), payload.len());
    }

    #[test]
    fn timeout_kills_a_hanging_child() {
        let runner = ConvertRunner::new("sh").with_timeout(Duration::from_millis(50));
        let started = Instant::now();
        let err = runner.run(&sh("sleep 10"), None).unwrap_err();
        assert!(matches!(err, RunError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn fast_child_beats_the_timeout() {
        let runner = ConvertRunner::new("sh").with_timeout(Duration::from_secs(10));
        let output = runner.run(&sh("printf quick"), None).unwrap();
        assert_eq!(output.stdout, b"quick");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let runner = ConvertRunner::new("/nonexistent/convert");
        let err = runner.run(&[], None).unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }));
    }
}
