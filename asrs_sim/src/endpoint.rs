//! Line-oriented TCP access to the register space.
//!
//! Requests are single lines of ASCII text, replies start with `OK` or `ERR`:
//!
//! | Request | Reply |
//! |---------|-------|
//! | `GET <node>` | `OK <value>` |
//! | `SET <node> <value>` | `OK` (client-writable registers only) |
//! | `DUMP <NN>` | `OK <json snapshot>` |
//! | `LIST` | `OK <count>` then one node id per line |
//!
//! Status and position registers belong to the line; `SET` on them is
//! answered with `ERR`. Requests longer than [`MAX_REQUEST_LEN`] bytes close
//! the connection.
//!
//! The accept loop and every connection poll the stop signal once per
//! sub-step, so the endpoint winds down with the lines.

use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::JoinHandle;

use asrs_common::error::SimError;
use asrs_common::register::{LineId, RegisterError, parse_node_id};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::SimulationClock;
use crate::registers::RegisterSpace;

/// Longest accepted request line, newline included.
pub const MAX_REQUEST_LEN: usize = 256;

/// Reasons a request line is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    /// Blank line.
    #[error("empty request")]
    Empty,

    /// First word is not a known verb.
    #[error("unknown verb '{0}'")]
    UnknownVerb(String),

    /// A required argument is missing.
    #[error("missing {0}")]
    MissingArgument(&'static str),

    /// More words than the verb takes.
    #[error("unexpected argument '{0}'")]
    TrailingArgument(String),

    /// Register is written only by the line itself.
    #[error("{0} is read-only")]
    ReadOnly(String),

    /// Request line exceeds [`MAX_REQUEST_LEN`].
    #[error("request too long")]
    TooLong,

    /// Value or line number is not an integer.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// Register access failed.
    #[error(transparent)]
    Register(#[from] RegisterError),
}

/// Execute one request against `space` and render the reply (no trailing newline).
pub fn execute(space: &RegisterSpace, request: &str) -> String {
    match handle(space, request) {
        Ok(reply) => reply,
        Err(e) => format!("ERR {e}"),
    }
}

fn handle(space: &RegisterSpace, request: &str) -> Result<String, RequestError> {
    let mut words = request.split_whitespace();
    let verb = words.next().ok_or(RequestError::Empty)?;

    let reply = match verb.to_ascii_uppercase().as_str() {
        "GET" => {
            let node = words.next().ok_or(RequestError::MissingArgument("node id"))?;
            format!("OK {}", space.get_node(node)?)
        }
        "SET" => {
            let node = words.next().ok_or(RequestError::MissingArgument("node id"))?;
            let raw = words.next().ok_or(RequestError::MissingArgument("value"))?;
            let value = raw
                .parse::<i64>()
                .map_err(|_| RequestError::InvalidNumber(raw.to_string()))?;
            let (line, register) = parse_node_id(node)?;
            if register.is_simulator_owned() {
                return Err(RequestError::ReadOnly(node.to_string()));
            }
            space.set(line, register, value)?;
            "OK".to_string()
        }
        "DUMP" => {
            let raw = words.next().ok_or(RequestError::MissingArgument("line number"))?;
            let line = raw
                .parse::<u8>()
                .ok()
                .and_then(LineId::new)
                .ok_or_else(|| RequestError::InvalidNumber(raw.to_string()))?;
            let snapshot = space.line(line)?.snapshot();
            format!("OK {}", snapshot.to_json())
        }
        "LIST" => {
            let nodes = space.node_ids();
            let mut reply = format!("OK {}", nodes.len());
            for node in nodes {
                reply.push('\n');
                reply.push_str(&node);
            }
            reply
        }
        _ => return Err(RequestError::UnknownVerb(verb.to_string())),
    };

    match words.next() {
        Some(extra) => Err(RequestError::TrailingArgument(extra.to_string())),
        None => Ok(reply),
    }
}

/// Bound register endpoint, not yet serving.
pub struct Endpoint {
    listener: TcpListener,
    registers: Arc<RegisterSpace>,
    clock: SimulationClock,
}

impl Endpoint {
    /// Bind `addr` in non-blocking mode.
    pub fn bind(
        addr: SocketAddr,
        registers: Arc<RegisterSpace>,
        clock: SimulationClock,
    ) -> Result<Self, SimError> {
        let listener = TcpListener::bind(addr).map_err(SimError::Endpoint)?;
        listener.set_nonblocking(true).map_err(SimError::Endpoint)?;
        Ok(Self {
            listener,
            registers,
            clock,
        })
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, SimError> {
        self.listener.local_addr().map_err(SimError::Endpoint)
    }

    /// Accept connections until stopped, then join every connection thread.
    pub fn serve(self) {
        let addr = self.listener.local_addr().ok();
        info!("Register endpoint listening on {:?}", addr);

        let mut connections: Vec<JoinHandle<()>> = Vec::new();
        while !self.clock.stop_signal().is_stopped() {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    debug!("Endpoint client connected: {}", peer);
                    let registers = Arc::clone(&self.registers);
                    let clock = self.clock.clone();
                    let spawned = std::thread::Builder::new()
                        .name("asrs-endpoint-conn".to_string())
                        .spawn(move || {
                            if let Err(e) = serve_connection(stream, &registers, &clock) {
                                warn!("Endpoint client {} failed: {}", peer, e);
                            }
                        });
                    match spawned {
                        Ok(handle) => connections.push(handle),
                        Err(e) => warn!("Failed to spawn connection thread: {}", e),
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(self.clock.sub_step());
                }
                Err(e) => {
                    warn!("Endpoint accept failed: {}", e);
                    std::thread::sleep(self.clock.sub_step());
                }
            }
            connections.retain(|handle| !handle.is_finished());
        }

        for handle in connections {
            if handle.join().is_err() {
                warn!("Endpoint connection thread panicked");
            }
        }
        info!("Register endpoint closed");
    }
}

fn serve_connection(
    stream: TcpStream,
    registers: &RegisterSpace,
    clock: &SimulationClock,
) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(clock.sub_step().max(std::time::Duration::from_millis(1))))?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::with_capacity(MAX_REQUEST_LEN);

    while !clock.stop_signal().is_stopped() {
        // buf never reaches the cap here: a full buffer ends the connection.
        let limit = (MAX_REQUEST_LEN - buf.len()) as u64;
        match reader.by_ref().take(limit).read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() != Some(&b'\n') {
                    if buf.len() >= MAX_REQUEST_LEN {
                        warn!("Endpoint request over {} bytes, closing", MAX_REQUEST_LEN);
                        writeln!(writer, "ERR {}", RequestError::TooLong)?;
                        break;
                    }
                    // EOF without a terminator; answer what we have.
                    let request = String::from_utf8_lossy(&buf).into_owned();
                    writeln!(writer, "{}", execute(registers, &request))?;
                    break;
                }
                let request = String::from_utf8_lossy(&buf).into_owned();
                buf.clear();
                writeln!(writer, "{}", execute(registers, request.trim_end()))?;
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
