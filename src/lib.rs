use std::{
    fs::File,
    io::{self, BufReader, Read, Write},
    path::Path,
    sync::Arc,
};

use anyhow::{Context as _, Result};
use lambda_runtime::{service_fn, Context, LambdaEvent};
use serde_json::Value;
use tracing::instrument;

pub mod cli;
pub mod handler;

pub use handler::{handle_event, BatchSummary, HandlerError, HandlerOptions};

/// Path that selects stdin as the source of a local event.
pub const STDIN_PATH: &str = "-";

pub struct MskTrigger {
    options: HandlerOptions,
}

#[derive(Clone, Debug)]
pub struct MskTriggerConfig {
    pub dump_event: bool,
}

impl Default for MskTriggerConfig {
    fn default() -> Self {
        Self { dump_event: true }
    }
}

impl MskTrigger {
    pub fn new(config: MskTriggerConfig) -> Self {
        Self {
            options: HandlerOptions {
                dump_event: config.dump_event,
            },
        }
    }

    /// Serves invocations from the Lambda runtime API until the runtime
    /// stops the process or Ctrl-C is received.
    pub async fn run(self) -> Result<()> {
        let trigger = Arc::new(self);
        let handler = service_fn(move |event: LambdaEvent<Value>| {
            let trigger = trigger.clone();
            async move { trigger.process_event(event) }
        });

        tokio::select! {
            res = lambda_runtime::run(handler) => {
                res.map_err(|e| anyhow::anyhow!("[MSK] Lambda runtime exited with error: {e}"))
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::trace!("Exiting");
                Ok(())
            }
        }
    }

    /// Runs the handler once against an event read from `source`, or from
    /// stdin when `source` is [`STDIN_PATH`].
    pub fn invoke_local<W: Write>(&self, source: &Path, out: &mut W) -> Result<BatchSummary> {
        let event = if source == Path::new(STDIN_PATH) {
            read_event(io::stdin().lock())?
        } else {
            let file = File::open(source)
                .with_context(|| format!("failed to open event file {}", source.display()))?;
            read_event(BufReader::new(file))
                .with_context(|| format!("failed to read event file {}", source.display()))?
        };

        let summary = self.dispatch(&event, &Context::default(), out)?;
        Ok(summary)
    }

    fn process_event(&self, event: LambdaEvent<Value>) -> Result<(), lambda_runtime::Error> {
        let (payload, context) = event.into_parts();
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.dispatch(&payload, &context, &mut out)?;
        Ok(())
    }

    #[instrument(name = "trigger_msk.handle_event", skip_all, fields(request_id = %context.request_id))]
    fn dispatch<W: Write>(
        &self,
        payload: &Value,
        context: &Context,
        out: &mut W,
    ) -> Result<BatchSummary, HandlerError> {
        match handle_event(payload, &self.options, out) {
            Ok(summary) => {
                tracing::trace!(
                    partitions = summary.partitions,
                    records = summary.records,
                    "[MSK] Records processed successfully"
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::error!("[MSK] Records processing error: {e}");
                Err(e)
            }
        }
    }
}

/// Parses one event document.
pub fn read_event<R: Read>(reader: R) -> Result<Value> {
    serde_json::from_reader(reader).context("event is not a valid JSON document")
}

#[cfg(test)]
mod tests {
    use tempfile::NamedTempFile;

    use super::*;

    fn event_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_event_document() {
        let event = read_event(r#"{"records": {"p0": []}}"#.as_bytes()).unwrap();
        assert!(event["records"]["p0"].is_array());
    }

    #[test]
    fn rejects_non_json_event() {
        assert!(read_event("records: {}".as_bytes()).is_err());
    }

    #[test]
    fn dispatch_honours_config() {
        let trigger = MskTrigger::new(MskTriggerConfig { dump_event: false });
        let event = read_event(r#"{"records": {"p0": [{"value": "aGk="}]}}"#.as_bytes()).unwrap();
        let mut out = Vec::new();
        let summary = trigger
            .dispatch(&event, &Context::default(), &mut out)
            .unwrap();
        assert_eq!(summary.records, 1);
        assert_eq!(out, b"hi\n");
    }

    #[test]
    fn missing_event_file_is_an_error() {
        let trigger = MskTrigger::new(MskTriggerConfig::default());
        let err = trigger
            .invoke_local(Path::new("/nonexistent/event.json"), &mut Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains("failed to open event file"));
    }

    #[test]
    fn local_invocation_reads_file_and_writes_lines() {
        let file = event_file(
            r#"{"records": {"orders-0": [{"value": "aGVsbG8="}, {"value": "d29ybGQ="}], "orders-1": []}}"#,
        );
        let trigger = MskTrigger::new(MskTriggerConfig::default());
        let mut out = Vec::new();

        let summary = trigger.invoke_local(file.path(), &mut out).unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                partitions: 2,
                records: 2
            }
        );
        let out = String::from_utf8(out).unwrap();
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(r#"{"records":{"orders-0":"#));
        assert_eq!(&lines[1..], ["hello", "world"]);
    }

    #[test]
    fn non_json_event_file_is_an_error() {
        let file = event_file("records: {}");
        let trigger = MskTrigger::new(MskTriggerConfig::default());
        let mut out = Vec::new();

        let err = trigger.invoke_local(file.path(), &mut out).unwrap_err();

        assert!(format!("{err:#}").contains("failed to read event file"));
        assert!(out.is_empty());
    }
}
