use crate::errors::ScrawlError;
use core::time::Duration;

/// The default port for scrawl operations -- the standard ssh port "22".
pub const DEFAULT_PORT: u16 = 22;

/// The default telnet port, used when the telnet transport is selected and no port was given.
pub const DEFAULT_TELNET_PORT: u16 = 23;

/// The default time (in seconds) to use for the timeout socket parameter.
pub const DEFAULT_TIMEOUT_SOCKET_SECONDS: u64 = 30;

/// The default transport read size -- 8,192 bytes.
pub const DEFAULT_READ_SIZE: u16 = 8_192;

/// The default terminal height for transports (if applicable).
pub const DEFAULT_TERM_HEIGHT: u16 = 255;

/// The default terminal width for transports (if applicable).
pub const DEFAULT_TERM_WIDTH: u16 = 80;

/// The default ssh "strict key" setting (true, try to verify ssh key authenticity).
pub const DEFAULT_SSH_STRICT_KEY: bool = true;

/// Transport is the trait all scrawl transports must implement in order to be consumed/used by a
/// channel and ultimately drivers. A transport is nothing more than a bidirectional byte pipe to
/// a device pty -- everything clever happens above it.
pub trait Transport {
    /// Open the underlying transport.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if the connection cannot be established.
    fn open(&mut self) -> Result<(), ScrawlError>;

    /// Close the underlying transport.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if any issues occur.
    fn close(&mut self) -> Result<(), ScrawlError>;

    /// Indicates if the transport is "alive".
    fn alive(&mut self) -> bool;

    /// Read the default read amount of bytes from the underlying transport. Implementations must
    /// be non-blocking -- return an empty vec when nothing is waiting.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if any issues occur.
    fn read(&mut self) -> Result<Vec<u8>, ScrawlError>;

    /// Read up to `n` bytes from the underlying transport. Note that `read_n` implementations
    /// *must be non blocking* -- if the read for a given transport is normally blocking, wrap it
    /// in a poll or whatever you gotta do to make sure this is not blocking!
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if any issues occur.
    fn read_n(
        &mut self,
        n: u16,
    ) -> Result<Vec<u8>, ScrawlError>;

    /// Write to the underlying transport.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if any issues occur.
    fn write(
        &mut self,
        b: &[u8],
    ) -> Result<(), ScrawlError>;

    /// Update the transport-level timeout (socket/connect patience). May be called before or
    /// after open; transports apply it where their implementation allows.
    fn set_timeout(
        &mut self,
        timeout: Duration,
    );

    /// Returns the host of the transport.
    fn get_host(&self) -> String;

    /// Returns the port of the transport.
    fn get_port(&self) -> u16;

    /// Returns info used for in channel authentication -- typically only called by the Channel.
    fn in_channel_auth_data(&self) -> InChannelAuthData;
}

/// An enum defining the valid transport implementations. `TransportKind` doubles as the transport
/// registry -- names map to kinds via `from_name`, and driver builders construct the concrete
/// transport from the kind plus the session's args.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    /// System is the "standard"/default transport implementation -- a /bin/ssh wrapper on a pty.
    System,
    /// Telnet is a plain tcp transport; authentication happens fully in-channel.
    Telnet,
}

impl TransportKind {
    /// Resolve a transport kind from its registered name.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidConfiguration` error for names not in the registry.
    pub fn from_name(name: &str) -> Result<Self, ScrawlError> {
        match name {
            "system" => Ok(Self::System),
            "telnet" => Ok(Self::Telnet),
            _ => Err(ScrawlError::InvalidConfiguration {
                details: format!("unknown transport name '{name}'"),
            }),
        }
    }
}

/// A struct holding generic arguments that apply to all transport flavors.
pub struct TransportArgs {
    /// The actual host to connect to.
    pub host: String,
    /// The port to connect to the host on.
    pub port: u16,
    /// The username for authenticating to the host (if applicable).
    pub user: String,
    /// The password for password or keyboard interactive authentication (if applicable).
    pub password: String,
    /// The timeout duration for initial socket connection -- see specific transports for exact
    /// implementation.
    pub timeout_socket: Duration,
    /// The read size for each read of the transport (can leave this to the default!).
    pub read_size: u16,
    /// The terminal height to set on the transport object (not applicable to all transports).
    pub term_height: u16,
    /// The terminal width to set on the transport object (not applicable to all transports).
    pub term_width: u16,
}

impl TransportArgs {
    /// Return a new instance of `TransportArgs` -- would be just a default impl but we require
    /// the host be set, so we just have this method.
    #[must_use]
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_owned(),
            port: DEFAULT_PORT,
            user: String::new(),
            password: String::new(),
            timeout_socket: Duration::from_secs(DEFAULT_TIMEOUT_SOCKET_SECONDS),
            read_size: DEFAULT_READ_SIZE,
            term_height: DEFAULT_TERM_HEIGHT,
            term_width: DEFAULT_TERM_WIDTH,
        }
    }
}

/// A struct holding ssh specific arguments for transports.
pub struct TransportSshArgs {
    /// Indicate if ssh strict key checking should be enabled or not.
    pub strict_key: bool,
    /// A path to a private key to use for authentication.
    pub private_key_path: String,
    /// An (optional) passphrase for use with a private key.
    pub private_key_passphrase: String,
    /// The path to an ssh config file to use.
    pub config_file_path: String,
    /// The path to an ssh known hosts file to use.
    pub known_hosts_file_path: String,
}

impl Default for TransportSshArgs {
    fn default() -> Self {
        Self {
            strict_key: DEFAULT_SSH_STRICT_KEY,
            private_key_path: String::new(),
            private_key_passphrase: String::new(),
            config_file_path: String::new(),
            known_hosts_file_path: String::new(),
        }
    }
}

/// An enum indicating the type of *in channel* authentication to use for a transport.
pub enum InChannelAuthType {
    /// Telnet in channel auth -- as in we expect to see a username prompt (and no ssh key
    /// passphrase prompts).
    Telnet,
    /// Ssh in channel auth.
    Ssh,
}

/// A struct holding data necessary for a `Channel` object to handle in channel authentication for
/// a given transport.
pub struct InChannelAuthData {
    /// Indicates the flavor of in channel authentication.
    pub auth_type: InChannelAuthType,
    /// The user to use for authentication.
    pub user: String,
    /// The password to use for authentication.
    pub password: String,
    /// The ssh private key passphrase to use for authentication.
    pub private_key_passphrase: String,
}

#[cfg(test)]
mod tests {
    use super::TransportKind;
    use crate::errors::ScrawlError;

    #[test]
    fn registry_resolves_known_names() {
        assert_eq!(
            TransportKind::from_name("system").unwrap(),
            TransportKind::System
        );
        assert_eq!(
            TransportKind::from_name("telnet").unwrap(),
            TransportKind::Telnet
        );
    }

    #[test]
    fn registry_rejects_unknown_names() {
        let err = TransportKind::from_name("carrier-pigeon").unwrap_err();

        assert!(matches!(err, ScrawlError::InvalidConfiguration { .. }));
    }
}
