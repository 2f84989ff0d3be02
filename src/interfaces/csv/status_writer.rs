use crate::application::resolver::DisplayState;
use crate::domain::transaction::TransactionType;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Resolved status of one payment.
#[derive(Debug, Serialize, PartialEq)]
pub struct StatusRow {
    pub project: u64,
    pub payment: u64,
    pub r#type: TransactionType,
    pub display_state: DisplayState,
    #[serde(rename = "continue")]
    pub continue_polling: bool,
}

/// Writes payment status rows as CSV.
pub struct StatusWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> StatusWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_rows(&mut self, rows: impl IntoIterator<Item = StatusRow>) -> Result<()> {
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
