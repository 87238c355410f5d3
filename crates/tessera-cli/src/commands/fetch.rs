// crates/tessera-cli/src/commands/fetch.rs
//
// `tessera fetch`: retrieve stored content by content id.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use crate::context::AppContext;

#[derive(Debug, Args)]
pub struct FetchCmd {
    /// Content id returned by an upload.
    pub cid: String,
    /// Write the bytes to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Run the fetch command.
pub async fn run(ctx: &AppContext, cmd: &FetchCmd) -> Result<(), Box<dyn std::error::Error>> {
    let data = ctx.uploader.fetch(&cmd.cid).await?;
    match &cmd.output {
        Some(path) => {
            tokio::fs::write(path, &data).await?;
            eprintln!("Wrote {} bytes to {}", data.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
