use std::io::Write;

use msk_sdk::MskEvent;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Event(#[from] msk_sdk::Error),

    #[error("failed to write handler output: {0}")]
    Output(#[from] std::io::Error),
}

#[derive(Clone, Debug)]
pub struct HandlerOptions {
    /// Write the whole event as the first output line.
    pub dump_event: bool,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self { dump_event: true }
    }
}

/// Counts of what one pass over a batch processed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub partitions: usize,
    pub records: usize,
}

/// Runs one linear pass over an event batch, writing one line per record.
///
/// The first failure aborts the pass. Lines written before it stay written
/// and nothing is retried.
pub fn handle_event<W: Write>(
    event: &Value,
    options: &HandlerOptions,
    out: &mut W,
) -> Result<BatchSummary, HandlerError> {
    if options.dump_event {
        writeln!(out, "{event}")?;
    }

    let event = MskEvent::from_value(event)?;
    tracing::trace!(
        event_source = event.event_source,
        partitions = event.partition_count(),
        "[MSK] Handling batch"
    );

    let mut summary = BatchSummary::default();
    for partition in event.partitions() {
        let partition = partition?;
        tracing::trace!(partition = partition.key, records = partition.len(), "[MSK] Partition");
        summary.partitions += 1;

        for record in partition.records() {
            let record = record?;
            let text = record.decode()?;
            if tracing::enabled!(tracing::Level::TRACE) {
                let metadata = record.metadata();
                tracing::trace!(
                    topic = metadata.topic.as_deref(),
                    offset = metadata.offset,
                    headers = metadata.headers().len(),
                    "[MSK] Record {} decoded",
                    record.index
                );
            }
            writeln!(out, "{text}")?;
            summary.records += 1;
        }
    }

    out.flush()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn run(event: &Value) -> (Result<BatchSummary, HandlerError>, String) {
        let mut out = Vec::new();
        let result = handle_event(event, &HandlerOptions::default(), &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn decodes_single_record() {
        let event = json!({ "records": { "p0": [{ "value": "aGVsbG8=" }] } });
        let (result, out) = run(&event);
        assert_eq!(
            result.unwrap(),
            BatchSummary {
                partitions: 1,
                records: 1
            }
        );
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines, [r#"{"records":{"p0":[{"value":"aGVsbG8="}]}}"#, "hello"]);
    }

    #[test]
    fn empty_records_only_dumps_event() {
        let event = json!({ "records": {} });
        let (result, out) = run(&event);
        assert_eq!(result.unwrap(), BatchSummary::default());
        assert_eq!(out, "{\"records\":{}}\n");
    }

    #[test]
    fn dump_can_be_disabled() {
        let event = json!({ "records": { "p0": [{ "value": "aGk=" }] } });
        let mut out = Vec::new();
        let options = HandlerOptions { dump_event: false };
        handle_event(&event, &options, &mut out).unwrap();
        assert_eq!(out, b"hi\n");
    }

    #[test]
    fn missing_records_fails_after_dump() {
        let event = json!({ "eventSource": "aws:kafka" });
        let (result, out) = run(&event);
        assert!(matches!(
            result,
            Err(HandlerError::Event(msk_sdk::Error::MissingRecords))
        ));
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn sink_failure_is_reported() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let event = json!({ "records": {} });
        let result = handle_event(&event, &HandlerOptions::default(), &mut Closed);
        assert!(matches!(result, Err(HandlerError::Output(_))));
    }
}
