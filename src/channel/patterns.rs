use once_cell::sync::OnceCell;
use regex::bytes::Regex;

/// # Panics
///
/// Returns (once), the compiled default prompt pattern. This should realistically never panic.
#[allow(clippy::expect_used)]
pub fn default_comms_prompt_pattern() -> Regex {
    static RE: OnceCell<Regex> = OnceCell::new();

    RE.get_or_init(|| {
        Regex::new(r"(?im)^[a-z\d.\-@()/:]{1,48}[#>$]\s*$")
            .expect("failed compiling pattern, this is a bug")
    })
    .clone()
}

/// # Panics
///
/// Returns (once), the compiled default username (logon) pattern. This should realistically
/// never panic.
#[allow(clippy::expect_used)]
pub fn default_auth_username_pattern() -> Regex {
    static RE: OnceCell<Regex> = OnceCell::new();

    RE.get_or_init(|| {
        Regex::new(r"(?im)^(.*username:)|(.*login:)\s?$")
            .expect("failed compiling pattern, this is a bug")
    })
    .clone()
}

/// # Panics
///
/// Returns (once), the compiled default password (logon) pattern. This should realistically
/// never panic.
#[allow(clippy::expect_used)]
pub fn default_auth_password_pattern() -> Regex {
    static RE: OnceCell<Regex> = OnceCell::new();

    RE.get_or_init(|| {
        Regex::new(r"(?im)(.*@.*)?password:\s?$").expect("failed compiling pattern, this is a bug")
    })
    .clone()
}

/// # Panics
///
/// Returns (once), the compiled default passphrase (for private keys) pattern. This should
/// realistically never panic.
#[allow(clippy::expect_used)]
pub fn default_auth_passphrase_pattern() -> Regex {
    static RE: OnceCell<Regex> = OnceCell::new();

    RE.get_or_init(|| {
        Regex::new(r"(?i)enter passphrase for key")
            .expect("failed compiling pattern, this is a bug")
    })
    .clone()
}

/// # Panics
///
/// Returns (once), the compiled default authentication *failure* pattern -- output matching this
/// during in-channel auth means the device/server rejected our credentials. This should
/// realistically never panic.
#[allow(clippy::expect_used)]
pub fn default_auth_failure_pattern() -> Regex {
    static RE: OnceCell<Regex> = OnceCell::new();

    RE.get_or_init(|| {
        Regex::new(r"(?i)(permission denied)|(authentication fail)|(host key verification failed)")
            .expect("failed compiling pattern, this is a bug")
    })
    .clone()
}
