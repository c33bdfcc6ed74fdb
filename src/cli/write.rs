//! Write subcommand implementation.
//!
//! Handles `s7probe write`: the values are encoded before connecting, so
//! bad input never opens a session.

use crate::cli::{AreaArgs, CommandContext, ConnectionArgs};
use crate::codec;
use crate::engine;
use crate::error::{CliError, CliResult};
use clap::Parser;
use std::io::Write;

/// Write data to an area.
#[derive(Parser, Debug)]
pub struct WriteCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub area: AreaArgs,

    /// Data to write. Hex takes byte pairs (e.g. "01ff" or "01 FF");
    /// numeric formats take comma separated values
    #[arg(long, value_name = "DATA")]
    pub values: String,
}

impl WriteCommand {
    /// Execute the write command.
    pub async fn execute<W: Write>(&self, ctx: &CommandContext<'_>, mut out: W) -> CliResult<()> {
        if self.values.is_empty() {
            return Err(CliError::InvalidArgument("values is required".to_string()));
        }

        let area = self.area.descriptor()?;
        let format = self.area.format(&ctx.settings)?;
        let payload = codec::encode(&self.values, format)?;
        let options = self.connection.options(&ctx.settings);

        let mut session = ctx.connector.connect(&options).await?;
        let result = engine::write_area(&mut *session, &area, &payload).await;
        session.close().await;
        result?;

        if !ctx.quiet {
            writeln!(out, "Wrote {} bytes to {}", payload.len(), area)?;
        }
        Ok(())
    }
}
