use std::io::{BufRead, BufReader};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::EnvPolicy;

/// How long a pull waits for output before checking whether the child exited
const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Grace period for output still in flight once the child has exited
const DRAIN_GRACE: Duration = Duration::from_millis(250);

#[derive(Error, Debug)]
#[error("failed to start {program}: {source}")]
pub struct SpawnFailure {
    pub program: String,
    #[source]
    pub source: std::io::Error,
}

impl SpawnFailure {
    fn new(program: &str, source: std::io::Error) -> Self {
        Self {
            program: program.to_string(),
            source,
        }
    }
}

/// Spawns helpers with a sanitised environment and merged output.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    env: EnvPolicy,
}

impl ProcessRunner {
    pub fn new(env: EnvPolicy) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &EnvPolicy {
        &self.env
    }

    /// Start `program` with `args`.
    ///
    /// stdout and stderr share one pipe, so lines come back in the order the
    /// child wrote them regardless of which stream they went to.
    pub fn spawn(&self, program: &str, args: &[String]) -> Result<RunHandle, SpawnFailure> {
        let (reader, writer) = std::io::pipe().map_err(|e| SpawnFailure::new(program, e))?;
        let writer_err = writer
            .try_clone()
            .map_err(|e| SpawnFailure::new(program, e))?;

        debug!("Spawning {} {:?}", program, args);

        // The Command owns our copies of the write end; it must be gone
        // before reading or EOF never arrives.
        let mut child = {
            let mut cmd = Command::new(program);
            cmd.args(args)
                .stdin(Stdio::null())
                .stdout(writer)
                .stderr(writer_err);
            self.env.apply(&mut cmd);
            cmd.spawn().map_err(|e| SpawnFailure::new(program, e))?
        };

        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name(format!("{program}-output"))
            .spawn(move || {
                let mut reader = BufReader::new(reader);
                let mut buf = Vec::new();
                loop {
                    buf.clear();
                    match reader.read_until(b'\n', &mut buf) {
                        Ok(0) => break,
                        Ok(_) => {
                            let line = String::from_utf8_lossy(&buf)
                                .trim_end_matches(['\r', '\n'])
                                .to_string();
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                        Err(e) => {
                            debug!("Output pipe read failed: {}", e);
                            break;
                        }
                    }
                }
            });

        let reader_thread = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SpawnFailure::new(program, e));
            }
        };

        Ok(RunHandle {
            program: program.to_string(),
            child,
            lines: rx,
            reader_thread: Some(reader_thread),
            status: None,
            exhausted: false,
        })
    }
}

/// A running helper.
///
/// Iterating yields its output lines (terminators stripped) until the process
/// has exited and nothing buffered remains. The sequence is not restartable.
pub struct RunHandle {
    program: String,
    child: Child,
    lines: Receiver<String>,
    reader_thread: Option<JoinHandle<()>>,
    status: Option<ExitStatus>,
    exhausted: bool,
}

impl RunHandle {
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Terminal status, waiting for the process if it is still running.
    pub fn exit_code(&mut self) -> std::io::Result<i32> {
        let status = match self.status {
            Some(status) => status,
            None => {
                let status = self.child.wait()?;
                self.status = Some(status);
                status
            }
        };
        Ok(exit_code_of(status))
    }

    fn check_exited(&mut self) {
        if self.status.is_some() {
            return;
        }
        match self.child.try_wait() {
            Ok(status) => self.status = status,
            Err(e) => warn!("Failed to poll {}: {}", self.program, e),
        }
    }

    fn finish(&mut self, reader_done: bool) {
        self.exhausted = true;
        if reader_done {
            if let Some(handle) = self.reader_thread.take() {
                let _ = handle.join();
            }
        } else {
            // Hang up so the reader stops at the descendant's next write
            // instead of buffering for nobody.
            let (_, closed) = mpsc::channel();
            self.lines = closed;
        }
    }
}

impl Iterator for RunHandle {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.exhausted {
            return None;
        }

        loop {
            match self.lines.recv_timeout(POLL_INTERVAL) {
                Ok(line) => return Some(line),
                Err(RecvTimeoutError::Disconnected) => {
                    self.finish(true);
                    return None;
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.check_exited();
                    if self.status.is_none() {
                        continue;
                    }
                    // Exited, but a descendant may still hold the pipe open.
                    return match self.lines.recv_timeout(DRAIN_GRACE) {
                        Ok(line) => Some(line),
                        Err(RecvTimeoutError::Disconnected) => {
                            self.finish(true);
                            None
                        }
                        Err(RecvTimeoutError::Timeout) => {
                            warn!(
                                "{} exited but a descendant still holds its output; further output is discarded",
                                self.program
                            );
                            self.finish(false);
                            None
                        }
                    };
                }
            }
        }
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        if self.status.is_none() {
            let _ = self.child.wait();
        }
    }
}

/// Map an exit status to a single code; signal deaths become `128 + signal`.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
