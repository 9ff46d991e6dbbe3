#![deny(clippy::all)]
#![deny(clippy::complexity)]
#![deny(clippy::correctness)]
#![deny(clippy::perf)]
#![deny(clippy::style)]
#![deny(clippy::suspicious)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! scrawl drives interactive shell sessions on network devices (routers, switches, firewalls)
//! over ssh or telnet the way a human operator would -- sending commands, watching for prompts,
//! and moving between privilege levels -- and hands back structured results.

/// Channel is the object that consumes from and writes to scrawl transports -- it owns the
/// byte-level read/write discipline. The channel should generally only be interacted with by
/// drivers.
pub mod channel;

/// Scrawl "drivers" are the primary object users work with.
pub mod driver {
    /// Generic driver is a driver that has no concept of "network" device things -- generic
    /// drivers can be used like a dumb expect type interface for linux or similar devices.
    pub mod generic {
        /// The generic driver builder package.
        pub mod builder;

        /// The actual driver package itself.
        pub mod driver;
    }

    /// The generic driver builder re-exported for convenience.
    pub use crate::driver::generic::builder::Builder as GenericDriverBuilder;

    /// The generic driver re-exported for convenience.
    pub use crate::driver::generic::driver::Driver as GenericDriver;

    /// The generic driver operation options re-exported for convenience.
    pub use crate::driver::generic::driver::OperationOptions as GenericDriverOperationOptions;

    /// Network driver is a driver that wraps `GenericDriver` and adds "network" things, most
    /// importantly an understanding of privilege levels.
    pub mod network {
        /// The network driver builder package.
        pub mod builder;

        /// The actual driver package itself.
        pub mod driver;

        /// Privilege level definitions and graph validation.
        pub mod privilege;
    }

    /// The network driver builder re-exported for convenience.
    pub use crate::driver::network::builder::Builder as NetworkDriverBuilder;

    /// The network driver re-exported for convenience.
    pub use crate::driver::network::driver::Driver as NetworkDriver;

    /// The privilege level type re-exported for convenience.
    pub use crate::driver::network::privilege::PrivilegeLevel;
}

/// Scrawl errors.
pub mod errors;

/// Module responsible for dealing with "platform" things -- taking an embedded yaml platform
/// definition and producing a configured scrawl `NetworkDriver` builder.
pub mod platform;

/// Module containing the scrawl "response" objects -- objects that are returned from successful
/// driver operations.
pub mod response;

/// Transport module holds the base transport trait/registry and the transport implementations.
pub mod transport {
    /// Base transport module providing the trait all transports must implement, plus the
    /// name-keyed transport registry.
    pub mod base;

    /// The "system" (/bin/ssh wrapper) transport implementation.
    pub mod system;

    /// The telnet (plain tcp) transport implementation.
    pub mod telnet;
}

/// Scrawl utilities.
pub mod util {
    /// Simple bytes helper functions.
    pub(crate) mod bytes;

    /// Spawn a process on a pty, vaguely expect-style.
    pub(crate) mod pty;

    /// A simple locking queue of byte chunks used between the channel read loop and consumers.
    pub(crate) mod queue;
}
