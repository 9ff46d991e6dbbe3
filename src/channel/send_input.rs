use super::constants::{
    CARRIAGE_RETURN_BYTE,
    NEW_LINE_BYTE,
};
use super::Channel;
use super::OperationOptions;
use crate::errors::ScrawlError;
use crate::util::bytes::{
    trim_cutset,
    trim_cutset_right,
};
use chrono::Utc;
use std::thread;

impl Channel {
    /// Normalizes line endings to `\n` and optionally strips the trailing prompt out of the
    /// captured output.
    fn process_output(
        &self,
        b: &[u8],
        strip_prompt: bool,
    ) -> Vec<u8> {
        let mut joined_lines: Vec<u8> = Vec::with_capacity(b.len());

        for line in b.split(|byte| byte == &NEW_LINE_BYTE) {
            joined_lines.extend_from_slice(trim_cutset_right(line, &[CARRIAGE_RETURN_BYTE]));
            joined_lines.push(NEW_LINE_BYTE);
        }

        if strip_prompt {
            joined_lines = self
                .args
                .prompt_pattern
                .replace(joined_lines.as_slice(), &b""[..])
                .to_vec();
        }

        // trim any remaining newlines left/right and also the return character
        let mut cutset = vec![NEW_LINE_BYTE, CARRIAGE_RETURN_BYTE];
        cutset.extend(self.args.return_char.as_bytes());

        trim_cutset(joined_lines.as_slice(), cutset.as_slice()).to_vec()
    }

    /// Send an input to the device -- the canonical channel transaction:
    ///
    /// 1. write the input
    /// 2. read until the echoed input comes back (unless `eager`)
    /// 3. write the return character
    /// 4. read until the prompt (or an interim prompt pattern) matches (unless `eager`)
    ///
    /// Returns a tuple of (raw, processed) output -- raw is everything captured including the
    /// echo; processed has line endings normalized and the trailing prompt stripped when
    /// `options.strip_prompt` is set.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if a write/read fails or the operation deadline passes.
    pub fn send_input_bytes(
        &mut self,
        b: &[u8],
        options: &OperationOptions,
    ) -> Result<(Vec<u8>, Vec<u8>), ScrawlError> {
        let deadline = self.operation_deadline(options.timeout)?;

        self.write(b)?;

        // eager means write-only, no read synchronization at all -- no echo consumption, no
        // trailing prompt read
        if options.eager {
            self.write_return()?;

            return Ok((b.to_vec(), b.to_vec()));
        }

        let mut raw: Vec<u8> = vec![];

        let mut rb: Vec<u8> = vec![];

        loop {
            if Utc::now() >= deadline {
                return Err(self.operation_timed_out("send_input"));
            }

            let (found, result) = self.read_and_check_for_fuzzy(rb.as_slice(), b);

            rb = result?;

            if found {
                break;
            }
        }

        raw.extend(rb.as_slice());

        self.write_return()?;

        // interim prompts extend, never replace, the normal prompt as a completion signal
        let mut completion_patterns = options.interim_prompt_patterns.clone();
        completion_patterns.push(self.args.prompt_pattern.clone());

        let mut rb: Vec<u8> = vec![];

        loop {
            if Utc::now() >= deadline {
                return Err(self.operation_timed_out("send_input"));
            }

            let (found, result) = if options.interim_prompt_patterns.is_empty() {
                self.read_and_check_for_prompt(rb.as_slice())
            } else {
                self.read_and_check_for_any_prompt(rb.as_slice(), completion_patterns.as_slice())
            };

            rb = result?;

            if found {
                raw.extend(rb.as_slice());

                return Ok((raw, self.process_output(rb.as_slice(), options.strip_prompt)));
            }

            // an eighth of the read delay keeps this loop responsive without pinning a core
            thread::sleep(self.args.read_delay / 8);
        }
    }

    /// Send an input to the device, this is a convenience function to write a string, it wraps
    /// `send_input_bytes`.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if a write/read fails or the operation deadline passes.
    pub fn send_input(
        &mut self,
        input: &str,
        options: &OperationOptions,
    ) -> Result<(Vec<u8>, Vec<u8>), ScrawlError> {
        self.send_input_bytes(input.as_bytes(), options)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{
        Args,
        Channel,
    };
    use crate::errors::ScrawlError;
    use crate::transport::base::{
        InChannelAuthData,
        InChannelAuthType,
        Transport,
    };
    use core::time::Duration;

    struct NullTransport;

    impl Transport for NullTransport {
        fn open(&mut self) -> Result<(), ScrawlError> {
            Ok(())
        }

        fn close(&mut self) -> Result<(), ScrawlError> {
            Ok(())
        }

        fn alive(&mut self) -> bool {
            true
        }

        fn read(&mut self) -> Result<Vec<u8>, ScrawlError> {
            Ok(vec![])
        }

        fn read_n(
            &mut self,
            _n: u16,
        ) -> Result<Vec<u8>, ScrawlError> {
            Ok(vec![])
        }

        fn write(
            &mut self,
            _b: &[u8],
        ) -> Result<(), ScrawlError> {
            Ok(())
        }

        fn set_timeout(
            &mut self,
            _timeout: Duration,
        ) {
        }

        fn get_host(&self) -> String {
            String::from("localhost")
        }

        fn get_port(&self) -> u16 {
            22
        }

        fn in_channel_auth_data(&self) -> InChannelAuthData {
            InChannelAuthData {
                auth_type: InChannelAuthType::Ssh,
                user: String::new(),
                password: String::new(),
                private_key_passphrase: String::new(),
            }
        }
    }

    fn test_channel() -> Channel {
        Channel::new(Args::default(), NullTransport)
    }

    #[test]
    fn process_output_normalizes_line_endings() {
        let channel = test_channel();

        let output = channel.process_output(b"hostname 3560CX\r\n3560CX#", false);

        assert_eq!(output, b"hostname 3560CX\n3560CX#".to_vec());
    }

    #[test]
    fn process_output_strips_the_trailing_prompt() {
        let channel = test_channel();

        let output = channel.process_output(b"hostname 3560CX\r\n3560CX#", true);

        assert_eq!(output, b"hostname 3560CX".to_vec());
    }
}
