use crate::errors::ScrawlError;
use crate::transport::base::{
    InChannelAuthData,
    InChannelAuthType,
    Transport,
    TransportArgs,
    TransportSshArgs,
};
use crate::util::pty::Pty;
use core::time::Duration;
use log::debug;
use nix::poll::{
    poll,
    PollFd,
    PollFlags,
};
use nix::sys::wait::WaitStatus;
use nix::unistd::dup;
use std::fs::File;
use std::io::{
    BufReader,
    BufWriter,
    Read,
    Write,
};
use std::os::fd::RawFd;
use std::os::unix::io::{
    AsRawFd,
    FromRawFd,
};
use std::process::Command;

/// The default binary to use for the `System` transport -- "ssh".
pub const DEFAULT_SSH_OPEN_BIN: &str = "ssh";

/// How long (milliseconds) each poll of the pty fd waits before the read is declared empty.
const POLL_WAIT_MILLISECONDS: i32 = 5;

/// A struct holding arguments specific to the `System` transport implementation.
pub struct SystemArgs {
    /// The actual name of the binary to use to open the `System` transport -- typically this is
    /// "ssh", but you could do things like "docker" or "kubectl" (for exec operations) instead.
    pub open_bin: String,
    /// Arguments to pass to the `open_bin` -- if unset/empty "normal" ssh options will be set
    /// based on the arguments provided to the transport.
    pub open_args: Vec<String>,
    /// Extra arguments to pass -- so you can pass any ssh flags in addition to the "normal" ssh
    /// options set based on the arguments provided to the transport.
    pub extra_args: Vec<String>,
}

impl Default for SystemArgs {
    fn default() -> Self {
        Self {
            open_bin: String::from(DEFAULT_SSH_OPEN_BIN),
            open_args: vec![],
            extra_args: vec![],
        }
    }
}

/// The "system" (/bin/ssh wrapper) transport object. Spawns the ssh binary on a pty and shuttles
/// bytes through it; all key/agent/config handling stays with the real ssh client.
pub struct System {
    args: TransportArgs,
    ssh_args: TransportSshArgs,
    system_args: SystemArgs,
    process: Option<Pty>,
    file: Option<File>,
    file_handle: RawFd,
    reader: Option<BufReader<File>>,
    writer: Option<BufWriter<File>>,
}

impl System {
    /// Returns a new `System` instance.
    #[must_use]
    pub const fn new(
        args: TransportArgs,
        ssh_args: TransportSshArgs,
        system_args: SystemArgs,
    ) -> Self {
        Self {
            args,
            ssh_args,
            system_args,
            process: None,
            file: None,
            file_handle: -1,
            reader: None,
            writer: None,
        }
    }

    fn build_open_args(&mut self) {
        self.system_args.open_args = vec![
            self.args.host.clone(),
            String::from("-p"),
            format!("{}", self.args.port),
            String::from("-o"),
            format!("ConnectTimeout={}", self.args.timeout_socket.as_secs()),
            String::from("-o"),
            format!("ServerAliveInterval={}", self.args.timeout_socket.as_secs()),
        ];

        if !self.args.user.is_empty() {
            self.system_args
                .open_args
                .extend([String::from("-l"), self.args.user.clone()]);
        }

        if self.ssh_args.strict_key {
            self.system_args.open_args.extend([
                String::from("-o"),
                String::from("StrictHostKeyChecking=yes"),
            ]);

            if !self.ssh_args.known_hosts_file_path.is_empty() {
                self.system_args.open_args.extend([
                    String::from("-o"),
                    format!("UserKnownHostsFile={}", self.ssh_args.known_hosts_file_path),
                ]);
            }
        } else {
            self.system_args.open_args.extend([
                String::from("-o"),
                String::from("StrictHostKeyChecking=no"),
                String::from("-o"),
                String::from("UserKnownHostsFile=/dev/null"),
            ]);
        }

        if !self.ssh_args.config_file_path.is_empty() {
            self.system_args
                .open_args
                .extend([String::from("-F"), self.ssh_args.config_file_path.clone()]);
        }

        if !self.ssh_args.private_key_path.is_empty() {
            self.system_args
                .open_args
                .extend([String::from("-i"), self.ssh_args.private_key_path.clone()]);
        }

        if !self.system_args.extra_args.is_empty() {
            self.system_args
                .open_args
                .extend(self.system_args.extra_args.clone());
        }
    }

    fn setup_reader_writer(&mut self) -> Result<(), ScrawlError> {
        let mut open_cmd = Command::new(self.system_args.open_bin.clone());
        open_cmd.args(self.system_args.open_args.clone());

        let process = Pty::spawn(open_cmd).map_err(|err| ScrawlError::TransportOpen {
            details: format!("encountered error spawning pty process, error: {err}"),
        })?;

        let fd = dup(process.master.as_raw_fd()).map_err(|err| ScrawlError::TransportOpen {
            details: format!("encountered error duplicating pty file handle, error: {err}"),
        })?;

        self.process = Some(process);

        // SAFETY: the duplicated file descriptor is valid and owned by us from here on.
        let file = unsafe { File::from_raw_fd(fd) };

        let writer_clone = file.try_clone().map_err(|err| ScrawlError::TransportOpen {
            details: format!("failed cloning pty file handle for writer object, error: {err}"),
        })?;

        self.writer = Some(BufWriter::new(writer_clone));

        let reader_clone = file.try_clone().map_err(|err| ScrawlError::TransportOpen {
            details: format!("failed cloning pty file handle for reader object, error: {err}"),
        })?;

        self.reader = Some(BufReader::new(reader_clone));

        self.file_handle = file.as_raw_fd();
        self.file = Some(file);

        Ok(())
    }
}

impl Transport for System {
    fn open(&mut self) -> Result<(), ScrawlError> {
        if self.system_args.open_args.is_empty() {
            self.build_open_args();
        }

        debug!(
            "opening system transport with bin '{}' and args '{:?}'",
            self.system_args.open_bin, self.system_args.open_args
        );

        self.setup_reader_writer()
    }

    fn close(&mut self) -> Result<(), ScrawlError> {
        let Some(process) = self.process.as_mut() else {
            return Err(ScrawlError::operation(
                "trying to close transport with no process created",
            ));
        };

        process.exit().map_err(|err| {
            ScrawlError::operation(format!("failed closing pty process, error: {err}"))
        })?;

        Ok(())
    }

    fn alive(&mut self) -> bool {
        self.process.as_mut().map_or(false, |process| {
            process.status().map_or(false, |status| {
                matches!(status, WaitStatus::Continued(_) | WaitStatus::StillAlive)
            })
        })
    }

    fn read(&mut self) -> Result<Vec<u8>, ScrawlError> {
        self.read_n(self.args.read_size)
    }

    fn read_n(
        &mut self,
        n: u16,
    ) -> Result<Vec<u8>, ScrawlError> {
        let fd = PollFd::new(self.file_handle, PollFlags::POLLIN);

        match poll(&mut [fd], POLL_WAIT_MILLISECONDS) {
            Ok(ready) => {
                if ready != 1 {
                    return Ok(vec![]);
                }
            }
            Err(err) => {
                return Err(ScrawlError::ConnectionLost {
                    details: format!("error while polling pty fd, error: {err}"),
                })
            }
        }

        let mut b = vec![0_u8; n as usize];

        let Some(reader) = self.reader.as_mut() else {
            return Err(ScrawlError::operation(
                "attempting to read from transport with no process!",
            ));
        };

        match reader.read(b.as_mut_slice()) {
            Ok(0) => Err(ScrawlError::ConnectionLost {
                details: String::from("pty closed while reading, process died"),
            }),
            Ok(read_n) => Ok(b[0..read_n].to_owned()),
            Err(err) => Err(ScrawlError::ConnectionLost {
                details: format!("error when reading after polling fd, error: {err}"),
            }),
        }
    }

    fn write(
        &mut self,
        b: &[u8],
    ) -> Result<(), ScrawlError> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(ScrawlError::operation(
                "attempting to write to transport with no process!",
            ));
        };

        writer.write_all(b).map_err(|err| ScrawlError::ConnectionLost {
            details: format!("failed writing to transport, error: {err}"),
        })?;

        writer.flush().map_err(|err| ScrawlError::ConnectionLost {
            details: format!("failed flushing transport, error: {err}"),
        })
    }

    fn set_timeout(
        &mut self,
        timeout: Duration,
    ) {
        // applied at open time via ConnectTimeout/ServerAliveInterval ssh options
        self.args.timeout_socket = timeout;
    }

    fn get_host(&self) -> String {
        self.args.host.clone()
    }

    fn get_port(&self) -> u16 {
        self.args.port
    }

    fn in_channel_auth_data(&self) -> InChannelAuthData {
        InChannelAuthData {
            auth_type: InChannelAuthType::Ssh,
            user: self.args.user.clone(),
            password: self.args.password.clone(),
            private_key_passphrase: self.ssh_args.private_key_passphrase.clone(),
        }
    }
}
