//! TCP listener for line-delimited distance readings.
//!
//! The listener accepts exactly one connection for its whole lifetime. When
//! that connection closes the task ends; restarting it is left to whoever
//! supervises the process.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cell::SharedDistance;

/// Longest telemetry line accepted, excluding the newline. Longer lines are
/// discarded without being buffered.
pub const MAX_LINE_BYTES: usize = 256;

/// Errors that stop the listener task.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Could not bind the telemetry port.
    #[error("failed to bind distance listener on {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    /// Accepting the producer connection failed.
    #[error("failed to accept distance producer: {0}")]
    Accept(io::Error),

    /// The connection failed while reading.
    #[error("distance stream read failed: {0}")]
    Read(io::Error),
}

/// A telemetry line that could not be turned into a reading.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadingParseError {
    /// Not a decimal number.
    #[error("not a number: {0:?}")]
    Invalid(String),

    /// Parsed, but NaN or infinite.
    #[error("non-finite reading: {0}")]
    NotFinite(f64),

    /// Line bytes were not UTF-8.
    #[error("line is not valid UTF-8")]
    Encoding,
}

/// How the listener task ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    /// The shutdown token fired.
    Cancelled,

    /// The producer closed its connection.
    ConnectionClosed {
        /// Lines accepted as readings.
        readings: u64,
        /// Lines discarded as malformed.
        rejected: u64,
    },
}

/// Parse one trimmed telemetry line into centimeters.
pub fn parse_reading(line: &str) -> Result<f64, ReadingParseError> {
    let value: f64 = line
        .trim()
        .parse()
        .map_err(|_| ReadingParseError::Invalid(line.trim().to_string()))?;

    if !value.is_finite() {
        return Err(ReadingParseError::NotFinite(value));
    }

    Ok(value)
}

/// Bound, not-yet-running distance listener.
pub struct DistanceListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl DistanceListener {
    /// Bind the telemetry endpoint.
    pub async fn bind(addr: SocketAddr) -> Result<Self, ListenerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::Bind { addr, source })?;

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address actually bound (useful when binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept one producer and feed its readings into `distance`.
    ///
    /// Returns when the producer disconnects, when `shutdown` is cancelled,
    /// or when the socket fails. Malformed lines are logged and skipped.
    pub async fn run(
        self,
        distance: SharedDistance,
        shutdown: CancellationToken,
    ) -> Result<ListenerExit, ListenerError> {
        info!(addr = %self.local_addr, "Listening for distance telemetry");

        let (stream, peer) = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("Distance listener cancelled before a producer connected");
                return Ok(ListenerExit::Cancelled);
            }
            accepted = self.listener.accept() => accepted.map_err(ListenerError::Accept)?,
        };

        // Single-producer model: stop listening once a sender is attached.
        drop(self.listener);
        info!(%peer, "Distance producer connected");

        let mut reader = BufReader::new(stream);
        let mut readings = 0u64;
        let mut rejected = 0u64;

        loop {
            let segment = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(readings, rejected, "Distance listener stopped by shutdown");
                    return Ok(ListenerExit::Cancelled);
                }
                segment = read_segment(&mut reader) => segment.map_err(ListenerError::Read)?,
            };

            let bytes = match segment {
                None => {
                    info!(%peer, readings, rejected, "Distance producer disconnected");
                    return Ok(ListenerExit::ConnectionClosed { readings, rejected });
                }
                Some(Segment::Overlong) => {
                    rejected += 1;
                    warn!(max = MAX_LINE_BYTES, "Discarding overlong distance line");
                    continue;
                }
                Some(Segment::Line(bytes)) => bytes,
            };

            match apply_line(&distance, &bytes) {
                Ok(Some(cm)) => {
                    readings += 1;
                    debug!(distance_cm = cm, "Distance reading");
                }
                Ok(None) => {}
                Err(e) => {
                    rejected += 1;
                    warn!(error = %e, "Discarding malformed distance line");
                }
            }
        }
    }
}

/// One newline-terminated piece of the telemetry stream.
#[derive(Debug, PartialEq, Eq)]
enum Segment {
    /// Line content without the newline.
    Line(Vec<u8>),
    /// A line longer than [`MAX_LINE_BYTES`]; its bytes were skipped.
    Overlong,
}

/// Read up to the next newline (or end of stream), keeping at most
/// [`MAX_LINE_BYTES`] of it. Returns `None` at end of stream.
async fn read_segment<R>(reader: &mut R) -> io::Result<Option<Segment>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let mut overlong = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(match (overlong, line.is_empty()) {
                (true, _) => Some(Segment::Overlong),
                (false, true) => None,
                (false, false) => Some(Segment::Line(line)),
            });
        }

        let newline = available.iter().position(|&b| b == b'\n');
        let content_len = newline.unwrap_or(available.len());

        if !overlong {
            if line.len() + content_len > MAX_LINE_BYTES {
                overlong = true;
                line = Vec::new();
            } else {
                line.extend_from_slice(&available[..content_len]);
            }
        }

        match newline {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(Some(if overlong {
                    Segment::Overlong
                } else {
                    Segment::Line(line)
                }));
            }
            None => reader.consume(content_len),
        }
    }
}

/// Parse a raw line and store it. Blank lines yield `Ok(None)`.
fn apply_line(distance: &SharedDistance, bytes: &[u8]) -> Result<Option<f64>, ReadingParseError> {
    let line = std::str::from_utf8(bytes).map_err(|_| ReadingParseError::Encoding)?;
    if line.trim().is_empty() {
        return Ok(None);
    }

    let cm = parse_reading(line)?;
    distance.set(cm);
    Ok(Some(cm))
}
