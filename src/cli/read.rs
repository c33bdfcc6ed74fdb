//! Read subcommand implementation.
//!
//! Handles `s7probe read`: one read, decoded and printed once.

use crate::cli::{AreaArgs, CommandContext, ConnectionArgs, OutputFormat};
use crate::codec;
use crate::engine;
use crate::error::CliResult;
use crate::output::SampleWriter;
use crate::types::Sample;
use clap::Parser;
use std::io::Write;

/// One-shot read from an area.
#[derive(Parser, Debug)]
pub struct ReadCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub area: AreaArgs,

    /// Output format for the result
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Plain)]
    pub output: OutputFormat,
}

impl ReadCommand {
    /// Execute the read command.
    pub async fn execute<W: Write>(&self, ctx: &CommandContext<'_>, out: W) -> CliResult<()> {
        let area = self.area.descriptor()?;
        let format = self.area.format(&ctx.settings)?;
        let options = self.connection.options(&ctx.settings);

        let mut session = ctx.connector.connect(&options).await?;
        let result = engine::read_area(&mut *session, &area).await;
        session.close().await;
        let bytes = result?;

        let value = codec::decode(&bytes, format)?;
        let mut writer = SampleWriter::new(out, self.output, false);
        writer.write(&Sample::new(1, &area, format, value))?;
        writer.finish()?;
        Ok(())
    }
}
