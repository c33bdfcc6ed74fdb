//! Poll subcommand implementation.
//!
//! Handles `s7probe poll`: repeated reads until the count is reached, a
//! read fails, or the user interrupts.

use crate::cli::args::parse_duration;
use crate::cli::{AreaArgs, CommandContext, ConnectionArgs, OutputFormat};
use crate::error::CliResult;
use crate::output::SampleWriter;
use crate::poll::{run_poll, CancelFlag, PollOutcome, PollPlan};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tracing::info;

/// Repeated read with interval.
#[derive(Parser, Debug)]
pub struct PollCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub area: AreaArgs,

    /// Time between reads (e.g. 500ms, 2s, 1m) [default: 1s]
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// Number of reads, 0 for unlimited
    #[arg(long, default_value_t = 0)]
    pub count: u64,

    /// Output format for each sample
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Plain)]
    pub output: OutputFormat,
}

impl PollCommand {
    /// Execute the poll command until it completes or `cancel` is raised.
    pub async fn execute<W: Write>(
        &self,
        ctx: &CommandContext<'_>,
        cancel: &CancelFlag,
        out: W,
    ) -> CliResult<()> {
        let area = self.area.descriptor()?;
        let format = self.area.format(&ctx.settings)?;
        let interval = self
            .interval
            .unwrap_or_else(|| ctx.settings.poll_interval());
        let plan = PollPlan::new(interval, self.count)?;
        let options = self.connection.options(&ctx.settings);

        let mut session = ctx.connector.connect(&options).await?;
        let mut writer = SampleWriter::new(out, self.output, true);
        let result = run_poll(&mut *session, &area, format, &plan, cancel, |sample| {
            writer.write(sample)
        })
        .await;
        session.close().await;
        let outcome = result?;
        writer.finish()?;

        match outcome {
            PollOutcome::Completed(n) => info!(samples = n, "poll finished"),
            PollOutcome::Cancelled(n) => info!(samples = n, "poll interrupted"),
        }
        Ok(())
    }
}

/// Raise `cancel` on the first Ctrl-C.
pub(crate) async fn cancel_on_interrupt(cancel: CancelFlag) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("interrupt received, stopping poll");
        cancel.cancel();
    }
}
