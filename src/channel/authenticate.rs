use super::constants::{
    PASSPHRASE_SEEN_MAX,
    PASSWORD_SEEN_MAX,
    USERNAME_SEEN_MAX,
};
use super::Channel;
use crate::errors::ScrawlError;
use log::error;

impl Channel {
    fn auth_failure(details: &str) -> ScrawlError {
        error!("{}", details);

        ScrawlError::AuthenticationFailed {
            details: details.to_owned(),
        }
    }

    /// Completes in-channel telnet authentication -- answers username and password prompts until
    /// the device prompt shows up. Bounded by per-prompt attempt counts and the channel
    /// operation deadline.
    pub(crate) fn authenticate_telnet(
        &mut self,
        user: &[u8],
        password: &[u8],
    ) -> Result<Vec<u8>, ScrawlError> {
        let deadline = self.operation_deadline(None)?;

        let watch_patterns = [
            self.args.prompt_pattern.clone(),
            self.args.username_pattern.clone(),
            self.args.password_pattern.clone(),
            self.args.auth_failure_pattern.clone(),
        ];

        let mut user_seen_count = 0_u8;
        let mut password_seen_count = 0_u8;

        let mut rb: Vec<u8> = vec![];

        loop {
            let nb = self.read_until_any_prompt_deadline(
                &watch_patterns,
                deadline,
                "authenticate_telnet",
            )?;

            if nb.is_empty() {
                continue;
            }

            rb.extend(nb);

            if self.args.auth_failure_pattern.is_match(&rb) {
                return Err(Self::auth_failure(
                    "telnet authentication failure output seen",
                ));
            }

            if self.args.prompt_pattern.is_match(&rb) {
                return Ok(rb);
            }

            if self.args.username_pattern.is_match(&rb) {
                user_seen_count += 1;

                if user_seen_count > USERNAME_SEEN_MAX {
                    return Err(Self::auth_failure(
                        "username prompt seen multiple times, assuming authentication failed",
                    ));
                }

                self.write_and_return_redacted(user)?;

                rb = vec![];

                continue;
            }

            if self.args.password_pattern.is_match(&rb) {
                password_seen_count += 1;

                if password_seen_count > PASSWORD_SEEN_MAX {
                    return Err(Self::auth_failure(
                        "password prompt seen multiple times, assuming authentication failed",
                    ));
                }

                self.write_and_return_redacted(password)?;

                rb = vec![];
            }
        }
    }

    /// Completes in-channel ssh authentication -- answers password and private key passphrase
    /// prompts until the device prompt shows up. Bounded by per-prompt attempt counts and the
    /// channel operation deadline.
    pub(crate) fn authenticate_ssh(
        &mut self,
        password: &[u8],
        passphrase: &[u8],
    ) -> Result<Vec<u8>, ScrawlError> {
        let deadline = self.operation_deadline(None)?;

        let watch_patterns = [
            self.args.prompt_pattern.clone(),
            self.args.password_pattern.clone(),
            self.args.passphrase_pattern.clone(),
            self.args.auth_failure_pattern.clone(),
        ];

        let mut password_seen_count = 0_u8;
        let mut passphrase_seen_count = 0_u8;

        let mut rb: Vec<u8> = vec![];

        loop {
            let nb =
                self.read_until_any_prompt_deadline(&watch_patterns, deadline, "authenticate_ssh")?;

            if nb.is_empty() {
                continue;
            }

            rb.extend(nb);

            if self.args.auth_failure_pattern.is_match(&rb) {
                return Err(Self::auth_failure("ssh authentication failure output seen"));
            }

            if self.args.prompt_pattern.is_match(&rb) {
                return Ok(rb);
            }

            if self.args.password_pattern.is_match(&rb) {
                password_seen_count += 1;

                if password_seen_count > PASSWORD_SEEN_MAX {
                    return Err(Self::auth_failure(
                        "password prompt seen multiple times, assuming authentication failed",
                    ));
                }

                self.write_and_return_redacted(password)?;

                rb = vec![];

                continue;
            }

            if self.args.passphrase_pattern.is_match(&rb) {
                passphrase_seen_count += 1;

                if passphrase_seen_count > PASSPHRASE_SEEN_MAX {
                    return Err(Self::auth_failure(
                        "private key passphrase prompt seen multiple times, assuming \
                        authentication failed",
                    ));
                }

                self.write_and_return_redacted(passphrase)?;

                rb = vec![];
            }
        }
    }
}
