//! Child process stdout as a byte transport
//!
//! Pipes have no read timeout of their own, so every read first waits for
//! the descriptor to become readable with `poll(2)`.

use crate::error::{QemuError, Result};
use benchlink_core::Transport;
use std::io::Read;
use std::os::unix::io::{AsRawFd, RawFd};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};

/// How long a child gets to exit after SIGTERM before it is killed
const TERMINATE_GRACE: Duration = Duration::from_millis(200);

/// Result of polling for data
#[derive(Debug)]
enum PollResult {
    DataAvailable,
    Timeout,
    PipeClosed,
    Error(std::io::Error),
}

/// Wait for data to be available on a file descriptor with timeout
fn wait_for_data(fd: RawFd, timeout: Duration) -> PollResult {
    let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };

    let result = loop {
        let ret = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
        if ret < 0 && std::io::Error::last_os_error().kind() == std::io::ErrorKind::Interrupted {
            continue;
        }
        break ret;
    };

    if result < 0 {
        PollResult::Error(std::io::Error::last_os_error())
    } else if result == 0 {
        PollResult::Timeout
    } else if pollfd.revents & libc::POLLIN != 0 {
        // Data may still be buffered even if the writer already hung up
        PollResult::DataAvailable
    } else if pollfd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
        PollResult::PipeClosed
    } else {
        PollResult::Timeout
    }
}

/// Send SIGTERM to a process. Returns `Err` if the signal could not be delivered.
fn send_sigterm(pid: u32) -> std::io::Result<()> {
    let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if ret == -1 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Transport reading a child process's stdout
///
/// The child's stdin is kept open (and unused) for its whole lifetime and
/// stderr is discarded.
pub struct ProcessTransport {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stdin: Option<ChildStdin>,
    timeout: Duration,
}

impl ProcessTransport {
    /// Spawn `command` and capture its stdout
    ///
    /// Each read waits at most `timeout` for the child to produce output.
    pub fn spawn(mut command: Command, timeout: Duration) -> Result<Self> {
        let program = command.get_program().to_string_lossy().into_owned();
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let mut child = command
            .spawn()
            .map_err(|source| QemuError::SpawnFailed { program, source })?;
        log::debug!("Spawned process {}", child.id());

        let stdin = child.stdin.take();
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(QemuError::NoStdout);
        };

        Ok(Self {
            child: Some(child),
            stdout: Some(stdout),
            stdin,
            timeout,
        })
    }

    /// Process id of the child, if it has not been reaped
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Check if the child is still running
    pub fn is_alive(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(Ok(Some(_))) | Some(Err(_)) | None => false,
        }
    }

    /// Per-read timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn exit_status(&mut self) -> String {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(Some(status))) => status.to_string(),
            _ => "still running".to_string(),
        }
    }

    fn read_pipe(&mut self, buf: &mut [u8]) -> Result<usize> {
        let timeout = self.timeout;
        let stdout = self.stdout.as_mut().ok_or(QemuError::Closed)?;

        match wait_for_data(stdout.as_raw_fd(), timeout) {
            PollResult::DataAvailable | PollResult::PipeClosed => {}
            PollResult::Timeout => return Err(QemuError::Timeout(timeout)),
            PollResult::Error(e) => return Err(QemuError::Io(e)),
        }

        match stdout.read(buf)? {
            0 => Err(QemuError::Disconnected(self.exit_status())),
            n => Ok(n),
        }
    }

    /// Stop the child: SIGTERM, a short grace period, then SIGKILL
    fn terminate(&mut self) {
        self.stdout = None;
        self.stdin = None;

        let Some(mut child) = self.child.take() else {
            return;
        };

        if matches!(child.try_wait(), Ok(None)) {
            log::debug!("Terminating process {}", child.id());
            // Ignore error - the child may exit on its own in the meantime
            let _ = send_sigterm(child.id());

            let deadline = Instant::now() + TERMINATE_GRACE;
            while Instant::now() < deadline && matches!(child.try_wait(), Ok(None)) {
                std::thread::sleep(Duration::from_millis(10));
            }

            if matches!(child.try_wait(), Ok(None)) {
                log::debug!("Process {} ignored SIGTERM, killing", child.id());
                let _ = child.kill();
            }
        }
        let _ = child.wait();
    }
}

impl Transport for ProcessTransport {
    fn read(&mut self, buf: &mut [u8]) -> benchlink_core::Result<usize> {
        Ok(self.read_pipe(buf)?)
    }

    fn close(&mut self) -> benchlink_core::Result<()> {
        self.terminate();
        Ok(())
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        self.terminate();
    }
}
