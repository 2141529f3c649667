//! MJPEG-over-HTTP frame source.
//!
//! ESP32-CAM style cameras serve `multipart/x-mixed-replace` on `/stream`.
//! Instead of parsing multipart headers, frames are cut out of the byte
//! stream on the JPEG start (`FF D8`) and end (`FF D9`) markers, which works
//! across the boundary formats different firmwares emit.

use std::time::Duration;

use tracing::{debug, info};

use super::{Frame, FrameError, FrameSource};

/// Frames larger than this are treated as stream corruption.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Initial buffer capacity hint; chunk sizes are set by the transport.
const READ_CHUNK: usize = 16 * 1024;
const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Cut the first complete JPEG out of `buffer`.
///
/// Bytes before the start marker are discarded. Returns `None` when no
/// complete frame is buffered yet; `buffer` then keeps only what may still
/// belong to the next frame.
pub fn extract_jpeg(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let Some(start) = find(buffer, &SOI, 0) else {
        // Keep a trailing 0xFF; it may be the first half of a start marker.
        let keep = usize::from(buffer.last() == Some(&0xFF));
        let drop_to = buffer.len() - keep;
        buffer.drain(..drop_to);
        return None;
    };

    if start > 0 {
        buffer.drain(..start);
    }

    let end = find(buffer, &EOI, SOI.len())?;
    let frame: Vec<u8> = buffer.drain(..end + EOI.len()).collect();
    Some(frame)
}

fn find(haystack: &[u8], needle: &[u8; 2], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(2)
        .position(|w| w == needle)
        .map(|pos| pos + from)
}

/// Pulls JPEG frames from an MJPEG HTTP stream.
///
/// The connection is opened lazily and dropped on any read error, so the
/// next call reconnects. The response body never ends, so instead of a
/// whole-request deadline every chunk read is bounded by `timeout`; a
/// camera that stalls mid-stream surfaces as [`FrameError::Read`].
pub struct MjpegStream {
    url: String,
    timeout: Duration,
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    response: Option<reqwest::Response>,
    buffer: Vec<u8>,
    max_frame_bytes: usize,
}

impl MjpegStream {
    /// Stream from `url`; `timeout` bounds each (re)connect and each read.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FrameError> {
        let url = url.into();
        let connect_err = |reason: String| FrameError::Connect {
            url: url.clone(),
            reason,
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| connect_err(e.to_string()))?;

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| connect_err(e.to_string()))?;

        Ok(Self {
            url,
            timeout,
            runtime,
            client,
            response: None,
            buffer: Vec::with_capacity(READ_CHUNK * 4),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn connect(&mut self) -> Result<(), FrameError> {
        let connect_err = |reason: String| FrameError::Connect {
            url: self.url.clone(),
            reason,
        };

        let timeout = self.timeout;
        let request = self.client.get(&self.url).send();
        let response = self
            .runtime
            .block_on(async { tokio::time::timeout(timeout, request).await })
            .map_err(|_| connect_err(format!("no response within {:?}", timeout)))?
            .map_err(|e| connect_err(e.to_string()))?;

        if !response.status().is_success() {
            return Err(connect_err(format!("HTTP {}", response.status())));
        }

        info!(url = %self.url, "Connected to camera stream");
        self.buffer.clear();
        self.response = Some(response);
        Ok(())
    }

    /// Read the next body chunk, dropping the connection on failure.
    fn read_chunk(&mut self) -> Result<(), FrameError> {
        let Some(response) = self.response.as_mut() else {
            return Err(FrameError::Read("stream not connected".to_string()));
        };

        let timeout = self.timeout;
        let read = self
            .runtime
            .block_on(async { tokio::time::timeout(timeout, response.chunk()).await });

        match read {
            Ok(Ok(Some(chunk))) => {
                self.buffer.extend_from_slice(&chunk);
                Ok(())
            }
            Ok(Ok(None)) => {
                debug!(url = %self.url, "Camera stream ended");
                self.response = None;
                Err(FrameError::Read("stream ended".to_string()))
            }
            Ok(Err(e)) => {
                self.response = None;
                Err(FrameError::Read(e.to_string()))
            }
            Err(_) => {
                debug!(url = %self.url, ?timeout, "Camera stream stalled");
                self.response = None;
                Err(FrameError::Read(format!("no data within {:?}", timeout)))
            }
        }
    }
}

impl FrameSource for MjpegStream {
    fn next_frame(&mut self) -> Result<Frame, FrameError> {
        if self.response.is_none() {
            self.connect()?;
        }

        loop {
            if let Some(jpeg) = extract_jpeg(&mut self.buffer) {
                return Ok(Frame::new(jpeg));
            }

            if self.buffer.len() > self.max_frame_bytes {
                self.buffer.clear();
                return Err(FrameError::Oversized {
                    max: self.max_frame_bytes,
                });
            }

            self.read_chunk()?;
        }
    }

    fn release(&mut self) {
        if self.response.take().is_some() {
            info!(url = %self.url, "Camera stream released");
        }
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Instant;

    /// Serve one MJPEG response that sends `body` and then goes silent.
    fn stalling_camera(body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request);
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\n\
                      Content-Type: multipart/x-mixed-replace; boundary=frame\r\n\r\n",
                )
                .unwrap();
            socket.write_all(&body).unwrap();
            socket.flush().unwrap();
            std::thread::sleep(Duration::from_secs(5));
        });

        format!("http://{}/stream", addr)
    }

    fn jpeg(payload: &[u8]) -> Vec<u8> {
        let mut v = SOI.to_vec();
        v.extend_from_slice(payload);
        v.extend_from_slice(&EOI);
        v
    }

    #[test]
    fn test_extracts_frame_between_boundaries() {
        let mut buffer = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        buffer.extend(jpeg(&[1, 2, 3]));
        buffer.extend_from_slice(b"\r\n--frame\r\n");

        let frame = extract_jpeg(&mut buffer).unwrap();
        assert_eq!(frame, jpeg(&[1, 2, 3]));
        assert_eq!(buffer, b"\r\n--frame\r\n".to_vec());
    }

    #[test]
    fn test_incomplete_frame_waits() {
        let mut buffer = b"junk".to_vec();
        buffer.extend_from_slice(&SOI);
        buffer.extend_from_slice(&[9, 9, 9]);

        assert!(extract_jpeg(&mut buffer).is_none());
        // Junk before the start marker is gone, partial frame kept.
        assert_eq!(buffer, vec![0xFF, 0xD8, 9, 9, 9]);

        buffer.extend_from_slice(&EOI);
        assert_eq!(extract_jpeg(&mut buffer).unwrap(), jpeg(&[9, 9, 9]));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_split_start_marker_is_kept() {
        let mut buffer = vec![1, 2, 0xFF];
        assert!(extract_jpeg(&mut buffer).is_none());
        assert_eq!(buffer, vec![0xFF]);

        buffer.extend_from_slice(&[0xD8, 7, 0xFF, 0xD9]);
        assert_eq!(extract_jpeg(&mut buffer).unwrap(), jpeg(&[7]));
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut buffer = jpeg(&[1]);
        buffer.extend(jpeg(&[2]));

        assert_eq!(extract_jpeg(&mut buffer).unwrap(), jpeg(&[1]));
        assert_eq!(extract_jpeg(&mut buffer).unwrap(), jpeg(&[2]));
        assert!(extract_jpeg(&mut buffer).is_none());
    }

    #[test]
    fn test_connect_failure_is_transient_error() {
        let mut stream = MjpegStream::new("http://127.0.0.1:9/stream", Duration::from_millis(300))
            .unwrap();
        let result = stream.next_frame();
        assert!(matches!(result, Err(FrameError::Connect { .. })));
        stream.release();
    }

    #[test]
    fn test_stalled_stream_times_out() {
        let url = stalling_camera(b"--frame\r\n".to_vec());
        let mut stream = MjpegStream::new(url, Duration::from_millis(500)).unwrap();

        let started = Instant::now();
        let result = stream.next_frame();

        assert!(matches!(result, Err(FrameError::Read(_))));
        assert!(started.elapsed() < Duration::from_secs(3));
        // Dropped, so the next call reconnects.
        assert!(stream.response.is_none());
    }

    #[test]
    fn test_frame_delivered_before_stall() {
        let mut body = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        body.extend(jpeg(&[4, 5, 6]));
        body.extend_from_slice(b"\r\n--frame\r\n");
        let url = stalling_camera(body);
        let mut stream = MjpegStream::new(url, Duration::from_millis(500)).unwrap();

        let frame = stream.next_frame().unwrap();
        assert_eq!(frame.data.as_ref(), jpeg(&[4, 5, 6]).as_slice());

        let started = Instant::now();
        assert!(matches!(stream.next_frame(), Err(FrameError::Read(_))));
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
