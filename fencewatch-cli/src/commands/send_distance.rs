//! Send-distance command - a stand-in for the ranging sensor.
//!
//! Reads one reading per line from stdin and forwards valid ones to the
//! listener of a running `fencewatch run`.

use std::path::Path;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::warn;

use fencewatch::distance::parse_reading;

use super::common::load_config;
use crate::error::CliError;

/// Run the send-distance command.
pub fn run(config_path: &Path, addr: Option<String>) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let addr = addr.unwrap_or_else(|| format!("127.0.0.1:{}", config.telemetry.port));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let (sent, skipped) = runtime.block_on(async {
        let mut stream = TcpStream::connect(&addr).await?;
        println!("Connected to {}; enter one reading (cm) per line, Ctrl+D to end", addr);
        forward_readings(BufReader::new(tokio::io::stdin()), &mut stream).await
    })?;

    println!("Sent {} readings ({} skipped)", sent, skipped);
    Ok(())
}

/// Forward valid readings from `input` to `output`, one per line.
///
/// Returns `(sent, skipped)`.
async fn forward_readings<R, W>(input: R, output: &mut W) -> std::io::Result<(u64, u64)>
where
    R: tokio::io::AsyncBufRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let (mut sent, mut skipped) = (0u64, 0u64);

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match parse_reading(&line) {
            Ok(cm) => {
                output.write_all(format!("{}\n", cm).as_bytes()).await?;
                output.flush().await?;
                sent += 1;
            }
            Err(e) => {
                warn!(line = %line, error = %e, "Skipping invalid reading");
                skipped += 1;
            }
        }
    }

    Ok((sent, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_forwards_only_valid_readings() {
        let input: &[u8] = b"42.5\nabc\n\n  17 \nNaN\n";
        let mut output = Vec::new();

        let (sent, skipped) = forward_readings(input, &mut output).await.unwrap();

        assert_eq!((sent, skipped), (2, 2));
        assert_eq!(String::from_utf8(output).unwrap(), "42.5\n17\n");
    }
}
