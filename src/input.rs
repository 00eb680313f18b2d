//! Line source: one trimmed, non-empty line per unit of work.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

/// Buffered lines in flight between the reader and the dispatcher.
const LINE_BUFFER: usize = 10;

/// Open `path` and stream its lines through a bounded channel.
///
/// Blank and whitespace-only lines are skipped (and logged). A read
/// error mid-file is forwarded through the channel so the dispatcher can
/// abort the run.
pub async fn read_lines(path: &Path) -> Result<mpsc::Receiver<io::Result<String>>> {
    let file = File::open(path)
        .await
        .with_context(|| format!("failed to open input file {}", path.display()))?;

    let (line_tx, line_rx) = mpsc::channel(LINE_BUFFER);

    tokio::spawn(async move {
        let mut lines = BufReader::new(file).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        info!("skipping blank line");
                        continue;
                    }
                    if line_tx.send(Ok(trimmed.to_string())).await.is_err() {
                        // Receiver gone: the run was aborted.
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let _ = line_tx.send(Err(e)).await;
                    break;
                }
            }
        }
    });

    Ok(line_rx)
}
