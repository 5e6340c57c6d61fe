pub mod calls;
pub mod client;
pub mod error;
pub mod reader;
pub mod rest;

pub use calls::{EntryFunctionPayload, SecretBytes, TableCall};
pub use client::{LedgerReader, LedgerWriter, TxReceipt};
pub use error::LedgerError;
pub use reader::read_snapshot;
pub use rest::RestLedgerClient;
