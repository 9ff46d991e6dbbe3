//! A scripted transport standing in for a real device: each step of a script pairs the bytes
//! the library is expected to write with the bytes the "device" answers with.

// not every test binary exercises every helper
#![allow(dead_code)]

use scrawl::errors::ScrawlError;
use scrawl::transport::base::{
    InChannelAuthData,
    InChannelAuthType,
    Transport,
};
use std::collections::VecDeque;
use std::sync::{
    Arc,
    Mutex,
};
use std::time::Duration;

fn contains(
    haystack: &[u8],
    needle: &[u8],
) -> bool {
    !needle.is_empty()
        && needle.len() <= haystack.len()
        && haystack.windows(needle.len()).any(|window| window == needle)
}

/// One step of the device script -- once the accumulated writes contain `expect`, `emit` becomes
/// readable. Steps with an empty `expect` emit immediately.
pub struct Step {
    expect: Vec<u8>,
    emit: Vec<u8>,
}

impl Step {
    pub fn new(
        expect: &str,
        emit: &str,
    ) -> Self {
        Self {
            expect: expect.as_bytes().to_vec(),
            emit: emit.as_bytes().to_vec(),
        }
    }
}

/// Shared script state -- tests keep a handle to push late steps (for timeout recovery
/// scenarios) and to inspect what the library wrote.
pub struct Script {
    steps: VecDeque<Step>,
    written: Vec<u8>,
    pending: Vec<u8>,
    /// Every write the library performed, in order.
    pub writes: Vec<Vec<u8>>,
    /// Set once the transport has been closed.
    pub closed: bool,
}

impl Script {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            written: vec![],
            pending: vec![],
            writes: vec![],
            closed: false,
        }
    }

    pub fn push_step(
        &mut self,
        step: Step,
    ) {
        self.steps.push_back(step);
    }

    fn promote_ready(&mut self) {
        while let Some(step) = self.steps.front() {
            if !step.expect.is_empty() {
                break;
            }

            let step = self.steps.pop_front().unwrap();

            self.pending.extend(step.emit);
        }
    }

    fn note_write(&mut self,
        b: &[u8],
    ) {
        self.writes.push(b.to_vec());
        self.written.extend_from_slice(b);

        while let Some(step) = self.steps.front() {
            if step.expect.is_empty() || !contains(&self.written, &step.expect) {
                break;
            }

            let step = self.steps.pop_front().unwrap();

            self.pending.extend(step.emit);
            self.written.clear();
        }
    }

    fn take_pending(
        &mut self,
        n: usize,
    ) -> Vec<u8> {
        self.promote_ready();

        if self.pending.is_empty() {
            return vec![];
        }

        let n = n.min(self.pending.len());

        self.pending.drain(..n).collect()
    }

    /// All non-return writes the library performed -- handy for "no commands were sent"
    /// assertions.
    pub fn command_writes(&self) -> Vec<Vec<u8>> {
        self.writes
            .iter()
            .filter(|write| !write.is_empty() && write.as_slice() != b"\n")
            .cloned()
            .collect()
    }
}

/// The scripted `Transport` implementation handed to channels under test.
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    telnet_flavor: bool,
    user: String,
    password: String,
}

impl ScriptedTransport {
    /// Builds an ssh-flavored scripted transport, returning it plus the shared script handle.
    pub fn new(steps: Vec<Step>) -> (Self, Arc<Mutex<Script>>) {
        Self::with_auth(steps, false, "", "")
    }

    /// As `new` but with control over the in-channel auth flavor and credentials.
    pub fn with_auth(
        steps: Vec<Step>,
        telnet_flavor: bool,
        user: &str,
        password: &str,
    ) -> (Self, Arc<Mutex<Script>>) {
        let script = Arc::new(Mutex::new(Script::new(steps)));

        (
            Self {
                script: Arc::clone(&script),
                telnet_flavor,
                user: user.to_owned(),
                password: password.to_owned(),
            },
            script,
        )
    }
}

impl Transport for ScriptedTransport {
    fn open(&mut self) -> Result<(), ScrawlError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), ScrawlError> {
        self.script.lock().unwrap().closed = true;

        Ok(())
    }

    fn alive(&mut self) -> bool {
        !self.script.lock().unwrap().closed
    }

    fn read(&mut self) -> Result<Vec<u8>, ScrawlError> {
        self.read_n(8_192)
    }

    fn read_n(
        &mut self,
        n: u16,
    ) -> Result<Vec<u8>, ScrawlError> {
        Ok(self.script.lock().unwrap().take_pending(n as usize))
    }

    fn write(
        &mut self,
        b: &[u8],
    ) -> Result<(), ScrawlError> {
        self.script.lock().unwrap().note_write(b);

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
            auth_type: if self.telnet_flavor {
                InChannelAuthType::Telnet
            } else {
                InChannelAuthType::Ssh
            },
            user: self.user.clone(),
            password: self.password.clone(),
            private_key_passphrase: String::new(),
        }
    }
}
