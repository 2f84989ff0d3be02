pub mod status_writer;
pub mod transaction_reader;
