use std::path::PathBuf;

use clap::{ArgEnum, Parser};

use crate::MskTriggerConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ArgEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Logs each record of an MSK event batch, decoded from base64.
#[derive(Debug, Parser)]
#[clap(name = "trigger-msk", version)]
pub struct CliArgs {
    /// Invoke the handler once against a JSON event file ("-" reads stdin)
    /// instead of serving the Lambda runtime API.
    #[clap(long, env = "TRIGGER_MSK_EVENT_FILE", parse(from_os_str))]
    pub event_file: Option<PathBuf>,

    /// Format of operational logs written to stderr.
    #[clap(long, env = "TRIGGER_MSK_LOG_FORMAT", arg_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Do not write the whole event before the decoded records.
    #[clap(long, env = "TRIGGER_MSK_NO_EVENT_DUMP")]
    pub no_event_dump: bool,
}

impl CliArgs {
    pub fn trigger_config(&self) -> MskTriggerConfig {
        MskTriggerConfig {
            dump_event: !self.no_event_dump,
        }
    }
}
