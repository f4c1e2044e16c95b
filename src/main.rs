use std::io;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use trigger_msk::{
    cli::{CliArgs, LogFormat},
    MskTrigger,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_format);

    let trigger = MskTrigger::new(args.trigger_config());
    match &args.event_file {
        Some(path) => {
            let summary = trigger.invoke_local(path, &mut io::stdout().lock())?;
            tracing::info!(
                partitions = summary.partitions,
                records = summary.records,
                "[MSK] Local invocation complete"
            );
            Ok(())
        }
        None => trigger.run().await,
    }
}

// Handler output owns stdout, so operational logs go to stderr.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
