use std::{borrow::Cow, collections::BTreeMap};

use base64::{
    alphabet,
    engine::{GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Standard alphabet with canonical padding, accepting non-zero trailing
/// bits in the final symbol.
const VALUE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

fn is_base64_symbol(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')
}

/// Drops bytes outside the base64 alphabet, such as MIME line breaks.
fn strip_non_alphabet(value: &str) -> Cow<'_, str> {
    if value.chars().all(is_base64_symbol) {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(value.chars().filter(|&c| is_base64_symbol(c)).collect())
    }
}

/// One invocation's batch, borrowed from the raw event document.
#[derive(Clone, Copy, Debug)]
pub struct MskEvent<'a> {
    pub event_source: Option<&'a str>,
    pub event_source_arn: Option<&'a str>,
    pub bootstrap_servers: Option<&'a str>,
    records: &'a Map<String, Value>,
}

impl<'a> MskEvent<'a> {
    /// Resolves the `records` mapping of an event document. Only the
    /// mapping itself is checked; partitions and records are not touched.
    pub fn from_value(event: &'a Value) -> Result<Self> {
        let records = event
            .get("records")
            .and_then(Value::as_object)
            .ok_or(Error::MissingRecords)?;
        let text = |key: &str| event.get(key).and_then(Value::as_str);

        Ok(Self {
            event_source: text("eventSource"),
            event_source_arn: text("eventSourceArn"),
            bootstrap_servers: text("bootstrapServers"),
            records,
        })
    }

    pub fn partition_count(&self) -> usize {
        self.records.len()
    }

    /// Partitions in the order their keys appear in the delivered document.
    pub fn partitions(&self) -> impl Iterator<Item = Result<Partition<'a>>> + 'a {
        let records = self.records;
        records.iter().map(|(key, entries)| {
            entries
                .as_array()
                .map(|entries| Partition {
                    key: key.as_str(),
                    entries: entries.as_slice(),
                })
                .ok_or_else(|| Error::MalformedPartition {
                    partition: key.clone(),
                })
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Partition<'a> {
    pub key: &'a str,
    entries: &'a [Value],
}

impl<'a> Partition<'a> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[doc(hidden)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records in delivery order. Each entry is resolved when the iterator
    /// reaches it.
    pub fn records(&self) -> impl Iterator<Item = Result<MskRecord<'a>>> + 'a {
        let Partition { key, entries } = *self;
        entries
            .iter()
            .enumerate()
            .map(move |(index, entry)| MskRecord::from_entry(key, index, entry))
    }
}

/// A single record of a partition. Only `value` is required.
#[derive(Clone, Copy, Debug)]
pub struct MskRecord<'a> {
    pub partition: &'a str,
    pub index: usize,
    pub value: &'a str,
    entry: &'a Value,
}

impl<'a> MskRecord<'a> {
    fn from_entry(partition: &'a str, index: usize, entry: &'a Value) -> Result<Self> {
        let value = entry
            .get("value")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MissingValue {
                partition: partition.to_owned(),
                index,
            })?;

        Ok(Self {
            partition,
            index,
            value,
            entry,
        })
    }

    /// Decodes `value` from standard padded base64 and reads the bytes as
    /// UTF-8 text. Characters outside the alphabet are skipped.
    pub fn decode(&self) -> Result<String> {
        let symbols = strip_non_alphabet(self.value);
        let bytes = VALUE_ENGINE.decode(symbols.as_bytes()).map_err(|source| Error::Decode {
            partition: self.partition.to_owned(),
            index: self.index,
            source,
        })?;

        String::from_utf8(bytes).map_err(|source| Error::Utf8 {
            partition: self.partition.to_owned(),
            index: self.index,
            source,
        })
    }

    /// Broker-side fields of the record. These never fail processing: an
    /// entry whose metadata does not parse yields empty metadata.
    pub fn metadata(&self) -> RecordMetadata {
        RecordMetadata::deserialize(self.entry).unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimestampType {
    CreateTime,
    LogAppendTime,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub topic: Option<String>,
    pub partition: Option<i32>,
    pub offset: Option<i64>,
    pub timestamp: Option<i64>,
    pub timestamp_type: Option<TimestampType>,
    pub key: Option<String>,
    #[serde(default)]
    headers: Vec<BTreeMap<String, Vec<u8>>>,
}

impl RecordMetadata {
    /// Headers flattened from the event's list of single-entry maps.
    pub fn headers(&self) -> Vec<MskHeader> {
        self.headers
            .iter()
            .flat_map(|header| header.iter())
            .map(|(name, value)| MskHeader {
                name: name.clone(),
                value: value.clone(),
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MskHeader {
    pub name: String,
    pub value: Vec<u8>,
}
