//! Spawn a command on a forked pty so it can be driven like a terminal. Covers just what the
//! system transport needs: spawn, non-blocking status, and exit.

use nix::fcntl::{
    open,
    OFlag,
};
use nix::libc::{
    STDERR_FILENO,
    STDIN_FILENO,
    STDOUT_FILENO,
};
use nix::pty::{
    grantpt,
    posix_openpt,
    ptsname_r,
    unlockpt,
    PtyMaster,
};
use nix::sys::stat::Mode;
use nix::sys::termios;
use nix::sys::wait::{
    waitpid,
    WaitPidFlag,
    WaitStatus,
};
use nix::sys::{
    signal,
    wait,
};
use nix::unistd::{
    dup2,
    fork,
    setsid,
    ForkResult,
    Pid,
};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::Duration;

/// Errors raised spawning or reaping the pty child process.
#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    /// Wrapper around nix errors.
    #[error(transparent)]
    Nix(#[from] nix::Error),

    /// Wrapper around std io errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A child process running on a forked pty. The child is signaled to exit when the `Pty` is
/// dropped.
pub struct Pty {
    /// The pty master side -- the transport reads/writes the child through this.
    pub master: PtyMaster,
    child_pid: Pid,
}

impl Pty {
    /// Fork and exec `command` with its stdio wired to a fresh pty slave. The master side is
    /// opened non-blocking so transport reads can poll it.
    pub fn spawn(mut command: Command) -> Result<Self, PtyError> {
        let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY | OFlag::O_NONBLOCK)?;

        grantpt(&master)?;
        unlockpt(&master)?;

        let slave_name = ptsname_r(&master)?;

        // SAFETY: only async-signal-safe calls happen on the child side of the fork.
        match unsafe { fork()? } {
            ForkResult::Child => {
                // new session, child as session leader, so the pty becomes its controlling tty
                setsid()?;

                let slave_fd = open(Path::new(&slave_name), OFlag::O_RDWR, Mode::empty())?;

                dup2(slave_fd, STDIN_FILENO)?;
                dup2(slave_fd, STDOUT_FILENO)?;
                dup2(slave_fd, STDERR_FILENO)?;

                // local echo off, otherwise every write comes straight back at us twice
                let mut flags = termios::tcgetattr(STDIN_FILENO)?;
                flags.local_flags &= !termios::LocalFlags::ECHO;
                termios::tcsetattr(STDIN_FILENO, termios::SetArg::TCSANOW, &flags)?;

                command.exec();

                Err(PtyError::Nix(nix::Error::last()))
            }
            ForkResult::Parent { child: child_pid } => Ok(Self { master, child_pid }),
        }
    }

    /// Get status of the child process, non-blocking. Returns `None` once the child has already
    /// been reaped.
    #[must_use]
    pub fn status(&self) -> Option<WaitStatus> {
        waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG)).ok()
    }

    /// Signal the child to exit and block until it is dead.
    pub fn exit(&mut self) -> Result<WaitStatus, PtyError> {
        loop {
            match signal::kill(self.child_pid, signal::SIGTERM) {
                Ok(()) => {}
                // already gone
                Err(nix::errno::Errno::ESRCH) => {
                    return Ok(WaitStatus::Exited(Pid::from_raw(0), 0));
                }
                Err(err) => return Err(PtyError::from(err)),
            }

            match self.status() {
                Some(status) if status != wait::WaitStatus::StillAlive => return Ok(status),
                Some(_) | None => thread::sleep(Duration::from_millis(100)),
            }
        }
    }
}

impl Drop for Pty {
    fn drop(&mut self) {
        if self.status() == Some(WaitStatus::StillAlive) {
            let _ = self.exit();
        }
    }
}
