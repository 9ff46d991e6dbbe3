use crate::errors::ScrawlError;
use crate::transport::base::{
    InChannelAuthData,
    InChannelAuthType,
    Transport,
    TransportArgs,
};
use core::time::Duration;
use log::debug;
use std::io::{
    ErrorKind,
    Read,
    Write,
};
use std::net::{
    Shutdown,
    TcpStream,
    ToSocketAddrs,
};

// telnet protocol bytes we care about -- just enough to refuse option negotiation
const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

#[derive(Clone, Copy)]
enum NegotiationState {
    Ground,
    Iac,
    Command(u8),
    Subnegotiation,
    SubnegotiationIac,
}

/// The telnet transport object -- a plain tcp stream to the device. Telnet option negotiation is
/// refused wholesale (we want a dumb byte pipe), and authentication happens entirely in-channel.
pub struct Telnet {
    args: TransportArgs,
    stream: Option<TcpStream>,
    negotiation_state: NegotiationState,
}

impl Telnet {
    /// Returns a new `Telnet` instance.
    #[must_use]
    pub const fn new(args: TransportArgs) -> Self {
        Self {
            args,
            stream: None,
            negotiation_state: NegotiationState::Ground,
        }
    }

    /// Walks a fresh chunk through the negotiation state machine -- strips telnet command
    /// sequences from the data and collects our refusals to send back.
    fn process_negotiation(
        &mut self,
        b: &[u8],
    ) -> (Vec<u8>, Vec<u8>) {
        let mut data = Vec::with_capacity(b.len());
        let mut replies: Vec<u8> = vec![];

        for &byte in b {
            match self.negotiation_state {
                NegotiationState::Ground => {
                    if byte == IAC {
                        self.negotiation_state = NegotiationState::Iac;
                    } else {
                        data.push(byte);
                    }
                }
                NegotiationState::Iac => match byte {
                    // escaped literal 255
                    IAC => {
                        data.push(IAC);
                        self.negotiation_state = NegotiationState::Ground;
                    }
                    SB => self.negotiation_state = NegotiationState::Subnegotiation,
                    DO | DONT | WILL | WONT => {
                        self.negotiation_state = NegotiationState::Command(byte);
                    }
                    _ => self.negotiation_state = NegotiationState::Ground,
                },
                NegotiationState::Command(command) => {
                    match command {
                        DO => replies.extend([IAC, WONT, byte]),
                        WILL => replies.extend([IAC, DONT, byte]),
                        // DONT/WONT need no answer, we never offered anything
                        _ => {}
                    }

                    self.negotiation_state = NegotiationState::Ground;
                }
                NegotiationState::Subnegotiation => {
                    if byte == IAC {
                        self.negotiation_state = NegotiationState::SubnegotiationIac;
                    }
                }
                NegotiationState::SubnegotiationIac => {
                    self.negotiation_state = if byte == SE {
                        NegotiationState::Ground
                    } else {
                        NegotiationState::Subnegotiation
                    };
                }
            }
        }

        (data, replies)
    }
}

impl Transport for Telnet {
    fn open(&mut self) -> Result<(), ScrawlError> {
        let address = format!("{}:{}", self.args.host, self.args.port);

        debug!("opening telnet transport to '{}'", address);

        let resolved = address
            .to_socket_addrs()
            .map_err(|err| ScrawlError::TransportOpen {
                details: format!("failed resolving '{address}', error: {err}"),
            })?
            .next()
            .ok_or_else(|| ScrawlError::TransportOpen {
                details: format!("no addresses resolved for '{address}'"),
            })?;

        let stream = TcpStream::connect_timeout(&resolved, self.args.timeout_socket).map_err(
            |err| ScrawlError::TransportOpen {
                details: format!("failed connecting to '{address}', error: {err}"),
            },
        )?;

        stream
            .set_nonblocking(true)
            .map_err(|err| ScrawlError::TransportOpen {
                details: format!("failed setting stream non-blocking, error: {err}"),
            })?;

        self.stream = Some(stream);

        Ok(())
    }

    fn close(&mut self) -> Result<(), ScrawlError> {
        if let Some(stream) = self.stream.take() {
            // the far side may already be gone, that is fine
            let _shutdown_result = stream.shutdown(Shutdown::Both);
        }

        Ok(())
    }

    fn alive(&mut self) -> bool {
        self.stream.is_some()
    }

    fn read(&mut self) -> Result<Vec<u8>, ScrawlError> {
        self.read_n(self.args.read_size)
    }

    fn read_n(
        &mut self,
        n: u16,
    ) -> Result<Vec<u8>, ScrawlError> {
        let mut b = vec![0_u8; n as usize];

        let read_n = {
            let Some(stream) = self.stream.as_mut() else {
                return Err(ScrawlError::operation(
                    "attempting to read from transport with no connection!",
                ));
            };

            match stream.read(b.as_mut_slice()) {
                Ok(0) => {
                    return Err(ScrawlError::ConnectionLost {
                        details: String::from("telnet stream closed by remote end"),
                    })
                }
                Ok(read_n) => read_n,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(vec![]),
                Err(err) => {
                    return Err(ScrawlError::ConnectionLost {
                        details: format!("error reading telnet stream, error: {err}"),
                    })
                }
            }
        };

        let (data, replies) = self.process_negotiation(&b[..read_n]);

        if !replies.is_empty() {
            self.write(replies.as_slice())?;
        }

        Ok(data)
    }

    fn write(
        &mut self,
        b: &[u8],
    ) -> Result<(), ScrawlError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(ScrawlError::operation(
                "attempting to write to transport with no connection!",
            ));
        };

        stream
            .write_all(b)
            .map_err(|err| ScrawlError::ConnectionLost {
                details: format!("failed writing to telnet stream, error: {err}"),
            })?;

        stream.flush().map_err(|err| ScrawlError::ConnectionLost {
            details: format!("failed flushing telnet stream, error: {err}"),
        })
    }

    fn set_timeout(
        &mut self,
        timeout: Duration,
    ) {
        self.args.timeout_socket = timeout;
    }

    fn get_host(&self) -> String {
        self.args.host.clone()
    }

    fn get_port(&self) -> u16 {
        self.args.port
    }

    fn in_channel_auth_data(&self) -> InChannelAuthData {
        InChannelAuthData {
            auth_type: InChannelAuthType::Telnet,
            user: self.args.user.clone(),
            password: self.args.password.clone(),
            private_key_passphrase: String::new(),
        }
    }
}
