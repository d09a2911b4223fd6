//! Pseudo-terminal session
//!
//! Spawns the user's shell inside a new pseudo-terminal. A reader thread
//! forwards output over a channel so the main loop can poll it without ever
//! blocking.

use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Written into the output stream once the shell is gone.
pub const CLOSED_NOTICE: &str = "[shell closed]";

/// Terminal type advertised to the shell; matches the sequences we parse.
const TERM: &str = "ansi";

#[derive(Error, Debug)]
pub enum PtyError {
    #[error("Failed to open pseudo terminal: {0}")]
    Open(String),

    #[error("Failed to spawn {shell}: {reason}")]
    Spawn { shell: String, reason: String },

    #[error("Failed to get PTY reader: {0}")]
    Reader(String),

    #[error("Failed to get PTY writer: {0}")]
    Writer(String),

    #[error("Failed to write to PTY: {0}")]
    Write(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, PtyError>;

/// Destination for bytes typed into the shell
pub trait ShellInput {
    fn send(&mut self, data: &[u8]);
}

impl ShellInput for Vec<u8> {
    fn send(&mut self, data: &[u8]) {
        self.extend_from_slice(data);
    }
}

/// Shell process attached to the slave side of a pseudo-terminal
pub struct PtySession {
    /// Holds the master side open; dropped once the shell's output ends
    #[allow(dead_code)]
    master: Option<Box<dyn MasterPty + Send>>,
    writer: Option<Box<dyn Write + Send>>,
    child: Box<dyn Child + Send + Sync>,
    output_rx: Receiver<Vec<u8>>,
    reader_thread: Option<JoinHandle<()>>,
    closed: bool,
}

impl PtySession {
    /// Spawn `shell` in a new pseudo-terminal of the given size
    pub fn spawn(shell: &str, cols: u16, rows: u16) -> Result<Self> {
        let pair = native_pty_system()
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::Open(format!("{:#}", e)))?;

        let mut cmd = CommandBuilder::new(shell);
        cmd.env("TERM", TERM);
        if let Ok(dir) = std::env::current_dir() {
            cmd.cwd(dir);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| PtyError::Spawn {
                shell: shell.to_string(),
                reason: format!("{:#}", e),
            })?;
        // Only the child holds the slave now, so its exit ends our reads
        drop(pair.slave);

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::Writer(format!("{:#}", e)))?;
        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::Reader(format!("{:#}", e)))?;

        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        let reader_thread = thread::spawn(move || {
            let mut buffer = [0u8; 4096];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buffer[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    // EIO once the slave side is gone
                    Err(_) => break,
                }
            }
        });

        info!("Spawned {} (pid {:?}) in {}x{} pty", shell, child.process_id(), cols, rows);

        Ok(Self {
            master: Some(pair.master),
            writer: Some(writer),
            child,
            output_rx: rx,
            reader_thread: Some(reader_thread),
            closed: false,
        })
    }

    pub fn child_pid(&self) -> Option<u32> {
        self.child.process_id()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Drain whatever output is available without blocking.
    ///
    /// On end-of-stream the session closes and the returned bytes end with
    /// the closed notice; afterwards this always returns `None`.
    pub fn read_nonblocking(&mut self) -> Option<Vec<u8>> {
        if self.closed {
            return None;
        }

        let mut data = Vec::new();
        let mut ended = false;
        loop {
            match self.output_rx.try_recv() {
                Ok(chunk) => data.extend_from_slice(&chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    ended = true;
                    break;
                }
            }
        }

        if ended {
            self.close();
            data.extend_from_slice(CLOSED_NOTICE.as_bytes());
            data.push(b'\n');
        }

        if data.is_empty() {
            None
        } else {
            Some(data)
        }
    }

    /// Write raw bytes to the shell. Does nothing once closed.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        writer.write_all(data).map_err(PtyError::Write)?;
        writer.flush().map_err(PtyError::Write)
    }

    fn close(&mut self) {
        self.closed = true;
        self.writer = None;
        self.master = None;

        if let Some(handle) = self.reader_thread.take() {
            let _ = handle.join();
        }

        match self.child.try_wait() {
            Ok(Some(status)) => info!("Shell exited: {:?}", status),
            Ok(None) => info!("Shell closed its terminal"),
            Err(e) => debug!("Failed to query shell status: {}", e),
        }
    }
}

impl ShellInput for PtySession {
    fn send(&mut self, data: &[u8]) {
        if let Err(e) = self.write(data) {
            warn!("{}", e);
        }
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.writer = None;

        if let Err(e) = self.child.kill() {
            debug!("Kill shell: {}", e);
        }
        if let Err(e) = self.child.wait() {
            debug!("Wait for shell: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_vec_collects_shell_input() {
        let mut sink: Vec<u8> = Vec::new();
        sink.send(b"ls");
        sink.send(b"\n");
        assert_eq!(sink, b"ls\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_shell_round_trip_and_close() {
        let mut pty = match PtySession::spawn("/bin/sh", 80, 24) {
            Ok(pty) => pty,
            Err(e) => {
                eprintln!("skipping: {}", e);
                return;
            }
        };

        pty.write(b"echo cerebro-ok\nexit\n").unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut output = Vec::new();
        while !pty.is_closed() && Instant::now() < deadline {
            match pty.read_nonblocking() {
                Some(data) => output.extend_from_slice(&data),
                None => thread::sleep(Duration::from_millis(10)),
            }
        }

        let text = String::from_utf8_lossy(&output);
        assert!(pty.is_closed());
        assert!(pty.master.is_none());
        assert!(text.contains("cerebro-ok"));
        assert!(text.ends_with("[shell closed]\n"));

        assert!(pty.write(b"echo ignored\n").is_ok());
        assert!(pty.read_nonblocking().is_none());
    }
}
