//! Output aggregation: completed cards become delimited import rows.

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::card::Flashcard;
use crate::config::Separator;

/// Column index of the tags field in the import header directive.
const TAGS_COLUMN: usize = 6;

/// Serializes completed cards onto one output stream.
///
/// Each card is rendered and written as a single line write, so rows
/// from concurrently finishing cards never interleave.
pub struct RowWriter<W> {
    out: W,
    separator: Separator,
    deck_header: bool,
}

impl<W: AsyncWrite + Unpin> RowWriter<W> {
    pub fn new(out: W, separator: Separator, deck_header: bool) -> Self {
        Self {
            out,
            separator,
            deck_header,
        }
    }

    /// Write the deck-import header block, if enabled.
    pub async fn start(&mut self) -> io::Result<()> {
        if !self.deck_header {
            return Ok(());
        }

        let header = format!(
            "#separator:{}\n#html:true\n#tags column:{}\n",
            self.separator.directive_name(),
            TAGS_COLUMN
        );
        self.out.write_all(header.as_bytes()).await?;
        self.out.flush().await
    }

    /// Log and emit one completed card.
    pub async fn emit(&mut self, card: &Flashcard) -> io::Result<()> {
        card.log();

        let mut row = card.to_row(self.separator);
        row.push('\n');
        self.out.write_all(row.as_bytes()).await?;
        self.out.flush().await
    }

    /// Hand back the underlying stream.
    pub fn into_inner(self) -> W {
        self.out
    }
}
