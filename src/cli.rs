//! Command-line interface for cardmill.
//!
//! One positional argument: the input file, one card per line. Flags
//! override whatever the config file and environment resolved to.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use crate::config::{Config, Separator};
use crate::input;
use crate::output::RowWriter;
use crate::pipeline::{self, Enricher};
use crate::providers::ProviderSet;

/// cardmill - concurrent flashcard enrichment pipeline
#[derive(Parser, Debug)]
#[command(name = "cardmill")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input file, one text line per flashcard
    pub input: Option<PathBuf>,

    /// Maximum number of cards enriched concurrently
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Playback rate for the reduced-speed audio variant
    #[arg(long)]
    pub tempo: Option<f64>,

    /// Field separator for emitted rows
    #[arg(long, value_enum)]
    pub separator: Option<Separator>,

    /// Skip the deck-import header block
    #[arg(long)]
    pub no_header: bool,

    /// Directory for synthesized audio artifacts
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let Some(input_file) = self.input else {
            eprintln!("Usage: cardmill <input-file>");
            std::process::exit(1);
        };

        let mut config = Config::load()?;
        if let Some(workers) = self.workers {
            config.workers = workers.max(1);
        }
        if let Some(tempo) = self.tempo {
            config.tempo = tempo;
        }
        if let Some(separator) = self.separator {
            config.separator = separator;
        }
        if self.no_header {
            config.deck_header = false;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }

        let providers = ProviderSet::from_config(&config)?;
        let enricher = Arc::new(Enricher::new(
            providers,
            config.output_dir.clone(),
            Duration::from_secs(config.throttle_retry_secs),
        ));

        let lines = input::read_lines(&input_file).await?;
        let writer = RowWriter::new(tokio::io::stdout(), config.separator, config.deck_header);

        pipeline::run(enricher, config.workers, lines, writer).await?;
        Ok(())
    }
}
