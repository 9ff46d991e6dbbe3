use super::constants::NEW_LINE_BYTE;
use super::Channel;
use crate::errors::ScrawlError;
use crate::util::bytes;
use chrono::{
    DateTime,
    Utc,
};
use regex::bytes::Regex;
use std::thread;

impl Channel {
    /// Trims a fresh chunk down to the prompt search window -- only the tail of the output can
    /// hold the prompt, and regexing entire "show tech" outputs over and over is ruinous.
    fn process_read_buf(
        &self,
        rb: &[u8],
    ) -> Vec<u8> {
        if rb.len() <= self.args.prompt_search_depth.into() {
            return rb.to_vec();
        }

        let mut prb = &rb[(rb.len() - self.args.prompt_search_depth as usize)..];

        let partition_index = prb.iter().position(|&r| r == NEW_LINE_BYTE).unwrap_or(0);

        if partition_index > 0 {
            prb = &prb[partition_index..];
        }

        prb.to_vec()
    }

    /// Reads from the read queue to see if the prompt can be found. This function appends input
    /// to the given read buffer (`old_rb`) -- it returns a tuple of (bool, result) with the bool
    /// indicating whether or not the prompt has been found.
    pub(super) fn read_and_check_for_prompt(
        &mut self,
        old_rb: &[u8],
    ) -> (bool, Result<Vec<u8>, ScrawlError>) {
        let mut rb = old_rb.to_vec();

        let nb = match self.read() {
            Ok(nb) => nb,
            Err(err) => return (false, Err(err)),
        };

        if nb.is_empty() {
            return (false, Ok(rb));
        }

        let pnb = self.process_read_buf(nb.as_ref());

        rb.extend(pnb.as_slice());

        if self.args.prompt_pattern.is_match(rb.as_ref()) {
            return (true, Ok(rb));
        }

        (false, Ok(rb))
    }

    /// Reads from the read queue to see if *any* of the given prompts can be found, appending to
    /// `old_rb` as `read_and_check_for_prompt` does.
    pub(crate) fn read_and_check_for_any_prompt(
        &mut self,
        old_rb: &[u8],
        prompts: &[Regex],
    ) -> (bool, Result<Vec<u8>, ScrawlError>) {
        let mut rb = old_rb.to_vec();

        let nb = match self.read() {
            Ok(nb) => nb,
            Err(err) => return (false, Err(err)),
        };

        if nb.is_empty() {
            return (false, Ok(rb));
        }

        let pnb = self.process_read_buf(nb.as_ref());

        rb.extend(pnb.as_slice());

        for prompt in prompts {
            if prompt.is_match(rb.as_ref()) {
                return (true, Ok(rb));
            }
        }

        (false, Ok(rb))
    }

    /// Reads from the read queue checking "fuzzily" for `explicit` -- see `read_until_fuzzy`.
    pub(crate) fn read_and_check_for_fuzzy(
        &mut self,
        old_rb: &[u8],
        explicit: &[u8],
    ) -> (bool, Result<Vec<u8>, ScrawlError>) {
        let mut rb = old_rb.to_vec();

        let nb = match self.read() {
            Ok(nb) => nb,
            Err(err) => return (false, Err(err)),
        };

        if nb.is_empty() {
            return (false, Ok(rb));
        }

        rb.extend(nb.as_slice());

        if bytes::roughly_contains(rb.as_slice(), explicit) {
            return (true, Ok(rb));
        }

        (false, Ok(rb))
    }

    /// Reads from the read queue checking exactly for `explicit`.
    pub(crate) fn read_and_check_for_explicit(
        &mut self,
        old_rb: &[u8],
        explicit: &[u8],
    ) -> (bool, Result<Vec<u8>, ScrawlError>) {
        let mut rb = old_rb.to_vec();

        let nb = match self.read() {
            Ok(nb) => nb,
            Err(err) => return (false, Err(err)),
        };

        if nb.is_empty() {
            return (false, Ok(rb));
        }

        rb.extend(nb.as_slice());

        if bytes::is_sub(rb.as_slice(), explicit) {
            return (true, Ok(rb));
        }

        (false, Ok(rb))
    }

    /// Read until the `self.args.prompt_pattern` prompt is seen, bounded by `timeout_ops`.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if the read fails or the deadline passes.
    pub fn read_until_prompt(&mut self) -> Result<Vec<u8>, ScrawlError> {
        let deadline = self.operation_deadline(None)?;

        let mut rb: Vec<u8> = vec![];

        loop {
            if Utc::now() >= deadline {
                return Err(self.operation_timed_out("read_until_prompt"));
            }

            let (prompt_found, result) = self.read_and_check_for_prompt(rb.as_slice());

            rb = result?;

            if prompt_found {
                return Ok(rb);
            }

            thread::sleep(self.args.read_delay);
        }
    }

    /// Read until any prompt in the given slice of regexes is seen, bounded by `timeout_ops`.
    /// The returned buffer holds everything read; callers that care which pattern fired can test
    /// the patterns against it.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if the read fails or the deadline passes.
    pub fn read_until_any_prompt(
        &mut self,
        prompts: &[Regex],
    ) -> Result<Vec<u8>, ScrawlError> {
        let deadline = self.operation_deadline(None)?;

        self.read_until_any_prompt_deadline(prompts, deadline, "read_until_any_prompt")
    }

    pub(crate) fn read_until_any_prompt_deadline(
        &mut self,
        prompts: &[Regex],
        deadline: DateTime<Utc>,
        operation: &str,
    ) -> Result<Vec<u8>, ScrawlError> {
        let mut rb: Vec<u8> = vec![];

        loop {
            if Utc::now() >= deadline {
                return Err(self.operation_timed_out(operation));
            }

            let (prompt_found, result) = self.read_and_check_for_any_prompt(rb.as_slice(), prompts);

            rb = result?;

            if prompt_found {
                return Ok(rb);
            }

            thread::sleep(self.args.read_delay);
        }
    }

    /// Read until `explicit` is seen in the device output "fuzzily" -- as long as all bytes of
    /// `explicit` are seen *in order* that counts as seen. Used to consume command echo, which
    /// terminals may wrap or pad. Bounded by `timeout_ops`.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if the read fails or the deadline passes.
    pub fn read_until_fuzzy(
        &mut self,
        explicit: &[u8],
    ) -> Result<Vec<u8>, ScrawlError> {
        let deadline = self.operation_deadline(None)?;

        let mut rb: Vec<u8> = vec![];

        loop {
            if Utc::now() >= deadline {
                return Err(self.operation_timed_out("read_until_fuzzy"));
            }

            let (explicit_found, result) = self.read_and_check_for_fuzzy(rb.as_slice(), explicit);

            rb = result?;

            if explicit_found {
                return Ok(rb);
            }

            thread::sleep(self.args.read_delay);
        }
    }

    /// Read until an exact `explicit` byte sequence is seen in the device output, bounded by
    /// `timeout_ops`.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if the read fails or the deadline passes.
    pub fn read_until_explicit(
        &mut self,
        explicit: &[u8],
    ) -> Result<Vec<u8>, ScrawlError> {
        let deadline = self.operation_deadline(None)?;

        let mut rb: Vec<u8> = vec![];

        loop {
            if Utc::now() >= deadline {
                return Err(self.operation_timed_out("read_until_explicit"));
            }

            let (explicit_found, result) = self.read_and_check_for_explicit(rb.as_slice(), explicit);

            rb = result?;

            if explicit_found {
                return Ok(rb);
            }

            thread::sleep(self.args.read_delay);
        }
    }
}
