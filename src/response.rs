use chrono::offset::Utc;
use chrono::{
    Duration,
    NaiveDateTime,
};

/// Mask recorded in place of hidden interactive inputs so credentials never land in a `Response`.
pub const HIDDEN_INPUT_MASK: &str = "******";

/// Response is an object returned from "successful" (as in no *errors*) scrawl driver operations.
#[derive(Debug)]
pub struct Response {
    /// The host(name) of the device being interacted with.
    pub host: String,
    /// The port of the device being interacted with.
    pub port: u16,
    /// The actual input sent to the device.
    pub channel_input: String,
    /// For interactive operations, the first intermediate prompt that was expected.
    pub expectation: Option<String>,
    /// For interactive operations, the input sent in reply to the expectation -- masked if the
    /// input was hidden.
    pub reply: Option<String>,
    /// For interactive operations, the pattern that signaled the interaction was complete.
    pub finale: Option<String>,
    /// "Raw" (bytes) output of the operation represented by this `Response`.
    pub raw_result: Vec<u8>,
    /// String output of the operation represented by this `Response` -- decoded as utf-8 with
    /// invalid sequences replaced.
    pub result: String,
    /// Starting time of the operation represented by this `Response`.
    pub start_time: NaiveDateTime,
    /// Ending time of the operation represented by this `Response`.
    pub finish_time: NaiveDateTime,
    /// Total time the operation represented by this `Response` took.
    pub elapsed_time: Duration,
    /// A list of strings that, if seen in an output, indicate that the originating input/command
    /// "failed".
    pub failed_when_contains: Vec<String>,
    /// Indicates if the operation was a success or failure. Failure in this case means we saw
    /// some `failed_when_contains` output in the response, *not* that there was an unrecoverable
    /// error. The latter case would result in an error being returned, not a `Response` object.
    pub failed: bool,
}

impl Response {
    /// Initializes a new `Response` object. The response starts out "failed" and stays that way
    /// until `record` runs and finds no failure indicators in the output.
    #[must_use]
    pub fn new(
        channel_input: &str,
        host: &str,
        port: u16,
        failed_when_contains: Vec<String>,
    ) -> Self {
        Self {
            host: host.to_owned(),
            port,
            channel_input: channel_input.to_owned(),
            expectation: None,
            reply: None,
            finale: None,
            raw_result: vec![],
            result: String::new(),
            start_time: Utc::now().naive_utc(),
            finish_time: Utc::now().naive_utc(),
            elapsed_time: Duration::zero(),
            failed_when_contains,
            failed: true,
        }
    }

    /// Initializes a new `Response` for an interactive operation, additionally recording what
    /// was expected, what was sent in reply, and the finale pattern.
    #[must_use]
    pub fn new_interactive(
        channel_input: &str,
        host: &str,
        port: u16,
        expectation: Option<String>,
        reply: Option<String>,
        finale: Option<String>,
        failed_when_contains: Vec<String>,
    ) -> Self {
        let mut response = Self::new(channel_input, host, port, failed_when_contains);

        response.expectation = expectation;
        response.reply = reply;
        response.finale = finale;

        response
    }

    /// Record the result of an operation -- sets the finish/elapsed times, decodes the processed
    /// output, and scans it for `failed_when_contains` substrings. `raw_result` keeps everything
    /// the channel captured (echo included); `result` is the processed output. A `Response` must
    /// not be mutated after recording.
    pub fn record(
        &mut self,
        raw_result: Vec<u8>,
        result: Vec<u8>,
    ) {
        self.finish_time = Utc::now().naive_utc();
        self.elapsed_time = self.finish_time - self.start_time;

        self.result = String::from_utf8_lossy(&result).into_owned();
        self.raw_result = raw_result;

        self.failed = self
            .failed_when_contains
            .iter()
            .any(|failure_output| self.result.contains(failure_output));
    }
}

/// `MultiResponse` is returned from scrawl driver "multi" operations -- plural operations like
/// `send_commands` or `send_configs` -- it holds the individual `Response` objects for all steps
/// of the parent operation.
pub struct MultiResponse {
    /// The host(name) of the device being interacted with.
    pub host: String,
    /// Starting time of the operation represented by this `MultiResponse`.
    pub start_time: NaiveDateTime,
    /// Ending time of the operation represented by this `MultiResponse`.
    pub finish_time: NaiveDateTime,
    /// Total time the operation represented by this `MultiResponse` took.
    pub elapsed_time: Duration,
    /// Vec of the individual responses that make up the "multi" response.
    pub responses: Vec<Response>,
    /// Indicates if *any* of the individual operations failed.
    pub failed: bool,
}

impl MultiResponse {
    /// Initializes a new `MultiResponse` object.
    #[must_use]
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_owned(),
            start_time: Utc::now().naive_utc(),
            finish_time: Utc::now().naive_utc(),
            elapsed_time: Duration::zero(),
            responses: vec![],
            failed: false,
        }
    }

    /// Appends a response to the `MultiResponse` object.
    pub fn record_response(
        &mut self,
        response: Response,
    ) {
        self.finish_time = Utc::now().naive_utc();
        self.elapsed_time = self.finish_time - self.start_time;

        if response.failed {
            self.failed = true;
        }

        self.responses.push(response);
    }
}

#[cfg(test)]
mod tests {
    use super::Response;

    #[test]
    fn record_sets_timing_and_output() {
        let mut response = Response::new("show version", "localhost", 22, vec![]);

        response.record(b"show version\nsome output\nr1#".to_vec(), b"some output".to_vec());

        assert!(!response.failed);
        assert_eq!(response.result, "some output");
        assert_eq!(response.raw_result, b"show version\nsome output\nr1#".to_vec());
        assert!(response.elapsed_time >= chrono::Duration::zero());
        assert_eq!(
            response.elapsed_time,
            response.finish_time - response.start_time
        );
    }

    #[test]
    fn record_flags_failure_outputs() {
        let mut response = Response::new(
            "tacocat",
            "localhost",
            22,
            vec![String::from("% Invalid input detected")],
        );

        let output = b"% Invalid input detected at '^' marker.".to_vec();

        response.record(output.clone(), output);

        assert!(response.failed);
    }

    #[test]
    fn record_replaces_invalid_utf8() {
        let mut response = Response::new("show run", "localhost", 22, vec![]);

        response.record(vec![0x68, 0x69, 0xff, 0xfe], vec![0x68, 0x69, 0xff, 0xfe]);

        assert!(response.result.starts_with("hi"));
        assert!(!response.failed);
    }
}
