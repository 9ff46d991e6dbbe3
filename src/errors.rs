use thiserror::Error;

/// `ScrawlError` covers every failure scrawl operations can raise. Note that "command failures"
/// (device output matching `failed_when_contains`) are *not* errors -- those are reported on the
/// returned `Response` object -- errors here are things the library could not recover from.
#[derive(Debug, Error)]
pub enum ScrawlError {
    /// The transport layer could not establish its connection.
    #[error("transport open failed: {details}")]
    TransportOpen {
        /// Details about the open failure.
        details: String,
    },

    /// In-band or transport-level authentication was rejected.
    #[error("authentication failed: {details}")]
    AuthenticationFailed {
        /// Details about the authentication failure.
        details: String,
    },

    /// A channel operation exceeded its `timeout_ops` deadline.
    #[error("channel operation '{operation}' exceeded the operation timeout")]
    ChannelTimeout {
        /// The channel operation that timed out.
        operation: String,
    },

    /// The current device prompt matched no known privilege level pattern.
    #[error("could not determine privilege level from prompt '{prompt}'")]
    UnknownPrivilegeLevel {
        /// The prompt that could not be resolved.
        prompt: String,
    },

    /// The escalate/de-escalate loop exceeded its iteration bound.
    #[error("failed to acquire target privilege level '{target}'")]
    CouldNotAcquirePrivilegeLevel {
        /// The privilege level that could not be acquired.
        target: String,
    },

    /// The caller supplied an impossible configuration (unknown transport name, duplicate
    /// privilege level, un-compilable pattern, etc.).
    #[error("invalid configuration: {details}")]
    InvalidConfiguration {
        /// Details about what was wrong with the configuration.
        details: String,
    },

    /// The transport died mid-operation.
    #[error("connection lost: {details}")]
    ConnectionLost {
        /// Details about the lost connection.
        details: String,
    },

    /// Internal plumbing failure (poisoned locks, disconnected internal channels). Seeing one of
    /// these is a bug.
    #[error("operation failure: {details}")]
    Operation {
        /// Details about the failure.
        details: String,
    },
}

impl ScrawlError {
    pub(crate) fn operation(details: impl Into<String>) -> Self {
        Self::Operation {
            details: details.into(),
        }
    }
}
