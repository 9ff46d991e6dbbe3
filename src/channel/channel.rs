use crate::errors::ScrawlError;
use crate::transport::base::{
    InChannelAuthType,
    Transport,
};

use crate::util::queue::Queue;

use super::Args;
use chrono::{
    DateTime,
    Duration as ChronoDuration,
    Utc,
};
use core::time::Duration;
use log::{
    debug,
    error,
    info,
};
use std::fs::{
    File,
    OpenOptions,
};
use std::sync::mpsc::{
    channel,
    Receiver,
    Sender,
    TryRecvError,
};
use std::sync::{
    Arc,
    Mutex,
};
use std::thread;

/// The scrawl `Channel` object -- the channel "wraps" the transport object and turns the raw byte
/// pipe into ordered transactional reads/writes.
pub struct Channel {
    /// The arguments that the channel was created with.
    pub args: Args,
    pub(super) transport: Arc<Mutex<dyn Transport + Send>>,
    pub(super) session_log: Option<Arc<Mutex<File>>>,
    queue: Arc<Mutex<Queue>>,
    read_error_receiver: Option<Receiver<ScrawlError>>,
    read_done_sender: Option<Sender<bool>>,
}

impl Channel {
    /// Returns a new instance of `Channel` wrapping the given transport.
    #[must_use]
    pub fn new(
        args: Args,
        t: impl Transport + Send + 'static,
    ) -> Self {
        Self {
            args,
            transport: Arc::new(Mutex::new(t)),
            session_log: None,
            queue: Arc::new(Mutex::new(Queue::new())),
            read_error_receiver: None,
            read_done_sender: None,
        }
    }

    /// Open the channel and underlying transport. This method kicks off the internal read loop
    /// which constantly reads from the underlying transport, then completes any in-channel
    /// authentication the transport requires.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if the transport cannot open or authentication fails --
    /// authentication failure here tears the transport back down.
    pub fn open(&mut self) -> Result<(), ScrawlError> {
        if let Some(path) = self.args.session_log_path.clone() {
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|err| ScrawlError::InvalidConfiguration {
                    details: format!(
                        "failed opening session log file '{}', error: {err}",
                        path.display()
                    ),
                })?;

            self.session_log = Some(Arc::new(Mutex::new(log_file)));
        }

        let transport_auth_data = {
            let mut unlocked_transport =
                self.transport
                    .lock()
                    .map_err(|_poisoned| ScrawlError::operation(
                        "failed acquiring transport lock during open, this should not happen",
                    ))?;

            let auth_data = unlocked_transport.in_channel_auth_data();

            unlocked_transport.open()?;

            auth_data
        };

        let read_loop_transport = Arc::clone(&self.transport);
        let read_loop_queue = Arc::clone(&self.queue);
        let read_loop_session_log = self.session_log.clone();
        let read_delay = self.args.read_delay;
        let ansi_strip = self.args.ansi_strip;

        let (read_error_sender, read_error_receiver) = channel::<ScrawlError>();
        self.read_error_receiver = Some(read_error_receiver);

        let (read_done_sender, read_done_receiver) = channel::<bool>();
        self.read_done_sender = Some(read_done_sender);

        debug!("starting channel read loop");

        thread::spawn(move || {
            Self::read_loop(
                &read_loop_transport,
                &read_loop_queue,
                read_loop_session_log.as_ref(),
                read_delay,
                ansi_strip,
                &read_error_sender,
                &read_done_receiver,
            );
        });

        if self.args.auth_bypass {
            debug!("auth bypass is enabled, skipping in channel auth");

            return Ok(());
        }

        let auth_result = match transport_auth_data.auth_type {
            InChannelAuthType::Telnet => {
                debug!("transport requests in channel telnet auth, starting...");

                self.authenticate_telnet(
                    transport_auth_data.user.as_bytes(),
                    transport_auth_data.password.as_bytes(),
                )
            }
            InChannelAuthType::Ssh => {
                debug!("transport requests in channel ssh auth, starting...");

                self.authenticate_ssh(
                    transport_auth_data.password.as_bytes(),
                    transport_auth_data.private_key_passphrase.as_bytes(),
                )
            }
        };

        let auth_buf = match auth_result {
            Ok(auth_buf) => auth_buf,
            Err(err) => {
                // auth failures during open are terminal -- tear the transport back down
                error!("in channel authentication failed, closing transport");

                let _close_result = self.close();

                return Err(err);
            }
        };

        if auth_buf.is_empty() {
            return Ok(());
        }

        // put the auth output (banner + prompt) back so the first channel operation sees it
        self.queue
            .lock()
            .map_err(|_poisoned| ScrawlError::operation("failed acquiring queue lock"))?
            .requeue(auth_buf);

        Ok(())
    }

    /// Close the channel and underlying transport.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if the transport cannot be closed cleanly.
    pub fn close(&mut self) -> Result<(), ScrawlError> {
        info!("channel closing...");

        if let Some(sender) = self.read_done_sender.take() {
            // the loop may already be gone, nothing to do about it here
            let _send_result = sender.send(true);
        }

        match self.transport.lock() {
            Ok(mut unlocked_transport) => {
                unlocked_transport.close()?;

                Ok(())
            }
            Err(err) => Err(ScrawlError::operation(format!(
                "failed acquiring lock on transport, error: {err}"
            ))),
        }
    }

    /// Reads from the queue being filled by the internal (in a thread) read loop. Returns an
    /// empty vec when nothing new has arrived.
    ///
    /// # Errors
    ///
    /// Returns a `ScrawlError` if the read loop hit an unrecoverable transport error.
    pub fn read(&mut self) -> Result<Vec<u8>, ScrawlError> {
        let receiver = self
            .read_error_receiver
            .as_ref()
            .ok_or_else(|| ScrawlError::operation("attempting to read a channel that is not open"))?;

        match receiver.try_recv() {
            Ok(err) => {
                // the read loop died on this error, propagate it
                return Err(err);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                let msg = "read error channel disconnected, this should not happen!";

                error!("{}", msg);

                return Err(ScrawlError::operation(msg));
            }
        }

        let mut q = self
            .queue
            .lock()
            .map_err(|_poisoned| ScrawlError::operation("failed acquiring queue lock"))?;

        if q.depth() == 0 {
            return Ok(vec![]);
        }

        Ok(q.dequeue())
    }

    /// Computes the absolute deadline for a channel operation -- `timeout_override` (if given)
    /// beats the channel's `timeout_ops`.
    pub(super) fn operation_deadline(
        &self,
        timeout_override: Option<Duration>,
    ) -> Result<DateTime<Utc>, ScrawlError> {
        let timeout = timeout_override.unwrap_or(self.args.timeout_ops);

        match ChronoDuration::from_std(timeout) {
            Ok(chrono_timeout) => Ok(Utc::now() + chrono_timeout),
            Err(err) => Err(ScrawlError::operation(format!(
                "failed casting std Duration to chrono Duration, this shouldn't happen, error: {err}"
            ))),
        }
    }

    /// Builds the timeout error for `operation`, tearing the session down first when the channel
    /// is configured to terminate on timeouts.
    pub(super) fn operation_timed_out(
        &mut self,
        operation: &str,
    ) -> ScrawlError {
        error!("channel operation '{}' timed out", operation);

        if self.args.terminate_on_timeout {
            info!("terminate on timeout is set, closing channel");

            let _close_result = self.close();
        }

        ScrawlError::ChannelTimeout {
            operation: operation.to_owned(),
        }
    }
}
