use super::ansi::AnsiFilter;
use super::Channel;
use crate::errors::ScrawlError;
use crate::transport::base::Transport;
use crate::util::queue::Queue;
use core::str;
use core::time::Duration;
use log::debug;
use std::fs::File;
use std::io::Write;
use std::sync::mpsc::{
    Receiver,
    Sender,
    TryRecvError,
};
use std::sync::{
    Arc,
    Mutex,
};
use std::thread;

impl Channel {
    #[allow(clippy::too_many_lines)]
    pub(crate) fn read_loop(
        transport: &Arc<Mutex<dyn Transport + Send>>,
        queue: &Arc<Mutex<Queue>>,
        session_log: Option<&Arc<Mutex<File>>>,
        read_delay: Duration,
        ansi_strip: bool,
        read_error_sender: &Sender<ScrawlError>,
        read_done_receiver: &Receiver<bool>,
    ) {
        let mut ansi_filter = AnsiFilter::new();

        loop {
            match read_done_receiver.try_recv() {
                Ok(_done) => {
                    debug!("channel read loop received done signal");

                    return;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    return;
                }
            }

            let read_result = if let Ok(mut unlocked_transport) = transport.lock() {
                unlocked_transport.read()
            } else {
                let _send_result = read_error_sender.send(ScrawlError::operation(
                    "failed acquiring transport lock in channel read loop",
                ));

                return;
            };

            let mut b = match read_result {
                Ok(b) => b,
                Err(err) => {
                    // the transport is done for; report the error and stop reading
                    let _send_result = read_error_sender.send(err);

                    return;
                }
            };

            if !b.is_empty() {
                if let Some(log_file) = session_log {
                    if let Ok(mut unlocked_log) = log_file.lock() {
                        let _write_result = unlocked_log.write_all(&b);
                    }
                }

                if ansi_strip {
                    b = ansi_filter.feed(&b);
                }

                if !b.is_empty() {
                    debug!(
                        "channel read\n{}",
                        str::from_utf8(&b).unwrap_or("failed decoding bytes, cannot log")
                    );

                    if let Ok(mut unlocked_queue) = queue.lock() {
                        unlocked_queue.enqueue(b);
                    } else {
                        let _send_result = read_error_sender.send(ScrawlError::operation(
                            "failed acquiring queue lock in channel read loop",
                        ));

                        return;
                    }
                }
            }

            thread::sleep(read_delay);
        }
    }
}
