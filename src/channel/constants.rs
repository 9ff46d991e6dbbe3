use std::time::Duration;

/// The default depth to search backward when looking for a device "prompt".
pub const DEFAULT_PROMPT_SEARCH_DEPTH: u16 = 1024;

/// The default return character, typically this is fine, sometimes users may need to set this
/// on a given driver instance (typically to \r\n if the default is not working).
pub const DEFAULT_RETURN_CHAR: &str = "\n";

/// The default delay between reads from the underlying transport object.
pub const DEFAULT_READ_DELAY: Duration = Duration::from_micros(250);

/// A newline character as a byte.
pub const NEW_LINE_BYTE: u8 = 0x0a;

/// A carriage return character as a byte.
pub const CARRIAGE_RETURN_BYTE: u8 = 0x0d;

/// How many username prompts may be seen during in-channel auth before we call it a failure.
pub const USERNAME_SEEN_MAX: u8 = 2;

/// How many password prompts may be seen during in-channel auth before we call it a failure.
pub const PASSWORD_SEEN_MAX: u8 = 2;

/// How many (ssh key) passphrase prompts may be seen during in-channel auth before we call it a
/// failure.
pub const PASSPHRASE_SEEN_MAX: u8 = 2;

/// Default "strip prompt" value (yes, strip the prompt by default).
pub const DEFAULT_STRIP_PROMPT: bool = true;

/// Default `timeout_ops` value.
pub const DEFAULT_TIMEOUT_OPS: Duration = Duration::from_secs(30);
