//! Types for batches delivered by an Amazon MSK (or self-managed Kafka)
//! event source to a function handler.
//!
//! An [`MskEvent`] borrows the raw JSON document the runtime handed over.
//! Partitions and records are resolved lazily, in delivery order, so a
//! malformed record only fails once processing reaches it.

mod error;
mod event;

#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use event::{MskEvent, MskHeader, MskRecord, Partition, RecordMetadata, TimestampType};
