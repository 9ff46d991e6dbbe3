use super::Channel;
use crate::errors::ScrawlError;
use log::debug;
use std::io::Write;

impl Channel {
    fn write_raw(
        &mut self,
        b: &[u8],
        redacted: bool,
    ) -> Result<(), ScrawlError> {
        if redacted {
            debug!("channel write: <redacted>");
        } else {
            debug!(
                "channel write: {}",
                core::str::from_utf8(b).unwrap_or("failed decoding bytes, cannot log")
            );

            // redacted payloads (credentials) never land in the session log
            if let Some(log_file) = &self.session_log {
                if let Ok(mut unlocked_log) = log_file.lock() {
                    let _write_result = unlocked_log.write_all(b);
                }
            }
        }

        match self.transport.lock() {
            Ok(mut unlocked_transport) => {
                unlocked_transport.write(b)?;

                Ok(())
            }
            Err(err) => Err(ScrawlError::operation(format!(
                "failed acquiring lock on transport, error: {err}"
            ))),
        }
    }

    /// Write `b` bytes to the device -- typically you should use `write_and_return` instead.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if the transport write fails.
    pub fn write(
        &mut self,
        b: &[u8],
    ) -> Result<(), ScrawlError> {
        self.write_raw(b, false)
    }

    /// Write `b` bytes to the device while suppressing any logging or session-log capture of the
    /// payload -- used for passwords and other credentials.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if the transport write fails.
    pub fn write_redacted(
        &mut self,
        b: &[u8],
    ) -> Result<(), ScrawlError> {
        self.write_raw(b, true)
    }

    /// Writes a return -- the return character by default is "\n", but can be configured.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if the transport write fails.
    pub fn write_return(&mut self) -> Result<(), ScrawlError> {
        let return_char = self.args.return_char.clone();

        self.write_raw(return_char.as_bytes(), false)
    }

    /// Write `b` bytes to the device and send a return.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if the transport write fails.
    pub fn write_and_return(
        &mut self,
        b: &[u8],
    ) -> Result<(), ScrawlError> {
        self.write(b)?;
        self.write_return()
    }

    /// As `write_and_return` but with the payload redacted from logs -- the trailing return is
    /// still logged normally.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if the transport write fails.
    pub fn write_and_return_redacted(
        &mut self,
        b: &[u8],
    ) -> Result<(), ScrawlError> {
        self.write_redacted(b)?;
        self.write_return()
    }

    /// Return the current "prompt" from the device -- sends a return character and reads until
    /// the prompt pattern matches, returning the matched (trailing) prompt line.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if the write/read fails or the operation times out.
    pub fn get_prompt(&mut self) -> Result<Vec<u8>, ScrawlError> {
        self.write_return()?;

        let nb = self.read_until_prompt()?;

        // the buffer may hold several prompt-looking lines (echo included); the trailing match is
        // the device's actual resting prompt
        self.args
            .prompt_pattern
            .find_iter(nb.as_slice())
            .last()
            .map_or_else(
                || {
                    Err(ScrawlError::operation(
                        "read until prompt, but couldn't match prompt, this is a bug",
                    ))
                },
                |found| Ok(found.as_bytes().to_vec()),
            )
    }
}
