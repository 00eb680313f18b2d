//! Bounded dispatch of input lines across the worker pool.
//!
//! At most `workers` cards are being enriched at any instant. Each line
//! becomes one short-lived task gated by a semaphore permit that is held
//! for the task's whole life; completed cards flow to a single emitter
//! task that owns the output stream.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::io::AsyncWrite;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::info;

use crate::card::Flashcard;
use crate::output::RowWriter;

use super::enricher::Enricher;

/// Capacity of the completed-record channel. Matches the line source
/// buffer; deep buffers would only hide backpressure.
const CHANNEL_CAPACITY: usize = 10;

/// Final figures reported after the run joins.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub processed: u64,
    pub elapsed: Duration,
}

impl PipelineReport {
    pub fn per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            self.processed as f64
        }
    }
}

/// Drive the whole pipeline to completion.
///
/// Returns only after every in-flight card has been enriched and emitted;
/// the first fatal error aborts the run. Emission follows completion
/// order, not input order.
pub async fn run<W>(
    enricher: Arc<Enricher>,
    workers: usize,
    mut lines: mpsc::Receiver<io::Result<String>>,
    mut writer: RowWriter<W>,
) -> Result<PipelineReport>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let started = Instant::now();
    let timestamp = Utc::now().timestamp().to_string();
    info!(%timestamp, workers, "starting pipeline");

    let index = AtomicU64::new(0);
    let limiter = Arc::new(Semaphore::new(workers.max(1)));
    let (record_tx, mut record_rx) = mpsc::channel::<Flashcard>(CHANNEL_CAPACITY);

    let emitter = tokio::spawn(async move {
        writer.start().await?;
        let mut emitted = 0u64;
        while let Some(card) = record_rx.recv().await {
            writer.emit(&card).await?;
            emitted += 1;
        }
        Ok::<u64, io::Error>(emitted)
    });

    let mut tasks: JoinSet<Result<()>> = JoinSet::new();

    while let Some(next) = lines.recv().await {
        let line = next.context("failed reading input")?;

        // Blocks here once `workers` cards are in flight. The permit
        // travels into the task and is released when the card is done.
        let permit = limiter
            .clone()
            .acquire_owned()
            .await
            .context("worker limiter closed")?;

        let card = Flashcard::new(&timestamp, index.fetch_add(1, Ordering::SeqCst), line);
        let enricher = Arc::clone(&enricher);
        let record_tx = record_tx.clone();

        tasks.spawn(async move {
            let _permit = permit;
            let card = enricher.enrich(card).await?;
            record_tx
                .send(card)
                .await
                .context("record channel closed before emission")?;
            Ok(())
        });

        // Reap finished tasks as we go so a fatal error aborts the run
        // without draining the rest of the file.
        while let Some(finished) = tasks.try_join_next() {
            finished.context("enrichment task panicked")??;
        }
    }

    // Rendezvous: all workers, then the emitter.
    while let Some(finished) = tasks.join_next().await {
        finished.context("enrichment task panicked")??;
    }
    drop(record_tx);

    let processed = emitter
        .await
        .context("emitter task panicked")?
        .context("failed writing output")?;

    let report = PipelineReport {
        processed,
        elapsed: started.elapsed(),
    };
    info!(
        processed = report.processed,
        elapsed_secs = report.elapsed.as_secs_f64(),
        cards_per_second = report.per_second(),
        "pipeline complete"
    );

    Ok(report)
}
