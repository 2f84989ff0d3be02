use crate::domain::payment::PaymentId;
use crate::domain::transaction::{ProviderTransaction, TransactionType};
use crate::error::{BridgeError, Result};
use chrono::{DateTime, Utc};
use csv::ByteRecord;
use serde::Deserialize;
use std::io::Read;

const DATA_COLUMN: &[u8] = b"data";

/// The typed columns of a provider transaction export.
///
/// The payload column is not part of it: it is copied from the raw record
/// so that the provider body is kept byte-for-byte.
#[derive(Debug, Deserialize)]
struct TransactionRecord {
    project: u64,
    payment: u64,
    timestamp: DateTime<Utc>,
    r#type: TransactionType,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    reference: Option<String>,
}

impl From<TransactionRecord> for ProviderTransaction {
    fn from(record: TransactionRecord) -> Self {
        let mut tx = ProviderTransaction::new(
            PaymentId::new(record.project, record.payment),
            record.r#type,
            record.timestamp,
        );
        tx.provider_state = record.state.filter(|s| !s.is_empty());
        tx.provider_ref = record.reference.filter(|s| !s.is_empty());
        tx
    }
}

/// Reads provider transactions from a CSV source.
///
/// Expected header: `project, payment, timestamp, type, state, reference, data`.
/// Whitespace is trimmed around every field except `data`, and trailing
/// optional columns may be omitted.
pub struct TransactionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> TransactionReader<R> {
    /// Creates a new `TransactionReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes transactions.
    pub fn transactions(mut self) -> impl Iterator<Item = Result<ProviderTransaction>> {
        let (headers, header_error) = match self.reader.byte_headers() {
            Ok(headers) => (headers.clone(), None),
            Err(e) => (ByteRecord::new(), Some(BridgeError::from(e))),
        };
        let data_column = headers.iter().position(|name| name == DATA_COLUMN);

        header_error.map(Err).into_iter().chain(
            self.reader
                .into_byte_records()
                .map(move |row| parse_row(&headers, data_column, &row?)),
        )
    }
}

fn parse_row(
    headers: &ByteRecord,
    data_column: Option<usize>,
    raw: &ByteRecord,
) -> Result<ProviderTransaction> {
    let typed: ByteRecord = raw
        .iter()
        .enumerate()
        .map(|(i, field)| {
            if Some(i) == data_column {
                &[][..]
            } else {
                field.trim_ascii()
            }
        })
        .collect();
    let record: TransactionRecord = typed.deserialize(Some(headers))?;

    let mut tx = ProviderTransaction::from(record);
    if let Some(data) = data_column.and_then(|i| raw.get(i)) {
        tx.data = data.to_vec();
    }
    Ok(tx)
}
