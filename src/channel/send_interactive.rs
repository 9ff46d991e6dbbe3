use super::Channel;
use super::OperationOptions;
use crate::errors::ScrawlError;
use chrono::Utc;
use core::fmt;
use core::ops;
use core::str::FromStr;
use log::debug;
use regex::bytes::Regex;
use std::thread;

/// A single step of an interactive channel operation -- an input to send and the response
/// (pattern) the device is expected to answer with.
pub struct Event {
    /// The input to send to the channel.
    pub input: String,
    /// The expected channel response -- a regex pattern as a string. An empty response means
    /// "expect the normal prompt".
    pub response: String,
    /// If the input will be "hidden" (like when entering a password) -- hidden inputs are
    /// written redacted and their echo is not consumed.
    pub hidden: bool,
}

impl Event {
    /// Return a new instance of `Event` -- defaults to hidden being *false*.
    #[must_use]
    pub fn new(
        input: &str,
        response: &str,
    ) -> Self {
        Self {
            input: input.to_owned(),
            response: response.to_owned(),
            hidden: false,
        }
    }

    /// Return a new *hidden* `Event` -- for password entry and friends.
    #[must_use]
    pub fn new_hidden(
        input: &str,
        response: &str,
    ) -> Self {
        Self {
            input: input.to_owned(),
            response: response.to_owned(),
            hidden: true,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        if self.hidden {
            write!(f, "input: <hidden>, expecting: {}", self.response)
        } else {
            write!(f, "input: {}, expecting: {}", self.input, self.response)
        }
    }
}

/// `Events` is a custom type for a vec of `Event` so we can hang trait impls (`Display`) off it.
pub struct Events(pub Vec<Event>);

impl fmt::Display for Events {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        self.0.iter().try_for_each(|event| writeln!(f, "{event}"))
    }
}

impl ops::Deref for Events {
    type Target = Vec<Event>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Channel {
    /// Send "interactive" input to the device. This is typically used to handle any well
    /// understood "interactive" prompts on a device -- things like "clear logging" which asks the
    /// user to confirm, or privilege escalation with a password prompt.
    ///
    /// Each event is written (redacted if hidden), its echo consumed (unless hidden or empty),
    /// a return sent, and the event's expected response pattern awaited. An event with an empty
    /// response -- and the finale of the whole exchange -- falls back to the channel's normal
    /// prompt pattern. `options.complete_patterns` can short-circuit the exchange early.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if a write/read fails, an event response pattern cannot be
    /// compiled, or the operation deadline passes.
    pub fn send_interactive(
        &mut self,
        events: &Events,
        options: &OperationOptions,
    ) -> Result<Vec<u8>, ScrawlError> {
        debug!("channel send_interactive requested, processing events:\n{events}");

        let deadline = self.operation_deadline(options.timeout)?;

        let mut b: Vec<u8> = vec![];

        for event in &events.0 {
            let mut prompts = options.complete_patterns.clone();

            if event.response.is_empty() {
                prompts.push(self.args.prompt_pattern.clone());
            } else {
                let response_pattern = Regex::from_str(event.response.as_str()).map_err(|err| {
                    ScrawlError::InvalidConfiguration {
                        details: format!(
                            "interactive event response '{}' could not be compiled, error: {err}",
                            event.response
                        ),
                    }
                })?;

                prompts.push(response_pattern);
            }

            if event.hidden {
                self.write_redacted(event.input.as_bytes())?;
            } else {
                self.write(event.input.as_bytes())?;
            }

            if !event.input.is_empty() && !event.hidden {
                // consume the echo before sending the return
                let mut rb: Vec<u8> = vec![];

                loop {
                    if Utc::now() >= deadline {
                        return Err(self.operation_timed_out("send_interactive"));
                    }

                    let (found, result) =
                        self.read_and_check_for_fuzzy(rb.as_slice(), event.input.as_bytes());

                    rb = result?;

                    if found {
                        break;
                    }

                    thread::sleep(self.args.read_delay);
                }

                b.extend(rb.as_slice());
            }

            self.write_return()?;

            let mut rb: Vec<u8> = vec![];

            loop {
                if Utc::now() >= deadline {
                    return Err(self.operation_timed_out("send_interactive"));
                }

                let (found, result) =
                    self.read_and_check_for_any_prompt(rb.as_slice(), prompts.as_slice());

                rb = result?;

                if found {
                    break;
                }

                thread::sleep(self.args.read_delay);
            }

            b.extend(rb.as_slice());

            // a complete pattern firing ends the whole exchange, remaining events or not
            if options
                .complete_patterns
                .iter()
                .any(|pattern| pattern.is_match(b.as_ref()))
            {
                return Ok(b);
            }
        }

        Ok(b)
    }
}
