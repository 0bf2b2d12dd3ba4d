use std::{
    io::{Read, Write},
    path::Path,
    sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError},
    thread,
    time::Duration,
};

use anyhow::{Context, bail};
use portable_pty::{Child, CommandBuilder, MasterPty, PtySize, native_pty_system};

use crate::logging::{log_input_data, log_output_data};

/// Upper bound for a single `read`.
pub const MAX_READ: usize = 65536;

/// A shell running on a pseudo-terminal. Output is pumped by a background
/// thread and collected with [`PtySession::read`].
pub struct PtySession {
    master: Option<Box<dyn MasterPty + Send>>,
    writer: Option<Box<dyn Write + Send>>,
    child: Option<Box<dyn Child + Send + Sync>>,
    output_rx: Option<Receiver<Vec<u8>>>,
    // Received but not yet returned by `read`
    pending: Vec<u8>,
    pid: Option<u32>,
    size: (u16, u16),
    running: bool,
    exit_code: Option<u32>,
}

impl PtySession {
    pub fn start(shell: &str, cols: u16, rows: u16, cwd: Option<&Path>) -> anyhow::Result<Self> {
        let pty_system = native_pty_system();
        let pty_pair = pty_system
            .openpty(pty_size(cols, rows))
            .context("opening PTY")?;

        let mut cmd = CommandBuilder::new(shell);
        cmd.env("TERM", "xterm-256color");
        cmd.env("COLORTERM", "truecolor");
        if let Some(dir) = cwd {
            cmd.cwd(dir);
        }

        let child = pty_pair
            .slave
            .spawn_command(cmd)
            .with_context(|| format!("spawning {shell}"))?;
        let pid = child.process_id();
        // The child holds its own copy; ours would keep the reader from seeing EOF
        drop(pty_pair.slave);

        let mut reader = pty_pair
            .master
            .try_clone_reader()
            .context("cloning PTY reader")?;
        let writer = pty_pair.master.take_writer().context("taking PTY writer")?;

        let (output_tx, output_rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buffer = [0u8; 4096];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) => break, // EOF
                    Ok(n) => {
                        if output_tx.send(buffer[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("PTY reader stopped: {e}");
                        break;
                    }
                }
            }
        });

        info!("Started {shell} (pid {pid:?}) at {cols}x{rows}");

        Ok(Self {
            master: Some(pty_pair.master),
            writer: Some(writer),
            child: Some(child),
            output_rx: Some(output_rx),
            pending: Vec::new(),
            pid,
            size: (cols, rows),
            running: true,
            exit_code: None,
        })
    }

    pub fn write(&mut self, data: &[u8]) -> anyhow::Result<usize> {
        if !self.running {
            bail!("session is not running");
        }
        let Some(writer) = self.writer.as_mut() else {
            bail!("session is closed");
        };
        let written = writer.write_all(data);
        if let Err(e) = written.and_then(|()| writer.flush()) {
            error!("Error writing to PTY: {e}");
            return Err(e).context("writing to PTY");
        }
        log_input_data(data);
        Ok(data.len())
    }

    /// Collect up to `max_bytes` of output (clamped to [`MAX_READ`]).
    ///
    /// Waits at most `timeout` for the first output (`None` waits until some
    /// arrives or the shell closes the PTY), then takes whatever else is
    /// already available without waiting. Output beyond `max_bytes` stays
    /// queued for the next call.
    pub fn read(&mut self, max_bytes: usize, timeout: Option<Duration>) -> Vec<u8> {
        let max_bytes = max_bytes.min(MAX_READ);

        self.drain_available();
        if self.pending.is_empty()
            && let Some(rx) = self.output_rx.as_ref()
        {
            let first = match timeout {
                Some(timeout) => match rx.recv_timeout(timeout) {
                    Ok(chunk) => Some(chunk),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => {
                        self.output_rx = None;
                        None
                    }
                },
                None => match rx.recv() {
                    Ok(chunk) => Some(chunk),
                    Err(_) => {
                        self.output_rx = None;
                        None
                    }
                },
            };
            if let Some(chunk) = first {
                self.pending.extend_from_slice(&chunk);
                self.drain_available();
            }
        }

        let n = max_bytes.min(self.pending.len());
        let data: Vec<u8> = self.pending.drain(..n).collect();
        if !data.is_empty() {
            log_output_data(&data);
        }
        data
    }

    fn drain_available(&mut self) {
        let Some(rx) = self.output_rx.as_ref() else {
            return;
        };
        loop {
            match rx.try_recv() {
                Ok(chunk) => self.pending.extend_from_slice(&chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.output_rx = None;
                    break;
                }
            }
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) -> anyhow::Result<()> {
        let Some(master) = self.master.as_ref() else {
            bail!("session is closed");
        };
        if let Err(e) = master.resize(pty_size(cols, rows)) {
            error!("Failed to resize PTY: {e}");
            return Err(e);
        }
        self.size = (cols, rows);
        Ok(())
    }

    /// Poll the child and record its exit code if it has finished.
    pub fn check_running(&mut self) -> bool {
        if !self.running {
            return false;
        }
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!("Shell exited with {}", status.exit_code());
                self.running = false;
                self.exit_code = Some(status.exit_code());
                false
            }
            Err(e) => {
                warn!("Cannot query shell status: {e}");
                true
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn exit_code(&self) -> Option<u32> {
        self.exit_code
    }

    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn current_dir(&self) -> Option<String> {
        self.pid.and_then(crate::utils::current_dir_of_process)
    }

    /// Kill the shell if it is still running and release the PTY. Safe to call
    /// more than once.
    pub fn close(&mut self) {
        if let Some(mut child) = self.child.take() {
            if self.running {
                if let Err(e) = child.kill() {
                    debug!("Kill failed, shell probably gone: {e}");
                }
                match child.wait() {
                    Ok(status) => self.exit_code = Some(status.exit_code()),
                    Err(e) => warn!("Failed to reap shell: {e}"),
                }
            }
            self.running = false;
        }
        self.writer = None;
        self.master = None;
        self.output_rx = None;
        self.pending.clear();
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        self.close();
    }
}

fn pty_size(cols: u16, rows: u16) -> PtySize {
    PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}
