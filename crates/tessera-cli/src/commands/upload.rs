// crates/tessera-cli/src/commands/upload.rs
//
// `tessera upload`: store files without registering a dataset.

use std::path::PathBuf;

use clap::Args;

use tessera_core::{DatasetProgress, OperationKind, UploadOptions};

use crate::context::AppContext;
use crate::output::{format_json, print_batch, OutputFormat};

#[derive(Debug, Args)]
pub struct UploadCmd {
    /// Files to upload.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Encrypt content before storing it (backend permitting).
    #[arg(long)]
    pub encrypt: bool,
    /// Tag attached to every uploaded file. Repeatable.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

/// Run the upload command.
pub async fn run(ctx: &AppContext, cmd: &UploadCmd) -> Result<(), Box<dyn std::error::Error>> {
    let upload = UploadOptions {
        encrypt: cmd.encrypt,
        access_conditions: None,
        tags: cmd.tags.clone(),
    };
    let mut options = ctx.config.batch_options();
    options.operation = OperationKind::Upload;

    let quiet = ctx.format == OutputFormat::Json;
    let result = ctx
        .engine()
        .upload_batch(&cmd.files, &upload, &options, |p: &DatasetProgress| {
            if !quiet {
                eprint!("\r{}/{} files ({:.1}%)   ", p.processed(), p.total, p.percentage);
            }
        })
        .await?;
    if !quiet {
        eprintln!();
    }

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&result)),
        OutputFormat::Table => print_batch(&result),
    }

    if result.has_failures() {
        return Err(format!("{} of {} uploads failed", result.failed, result.total).into());
    }
    Ok(())
}
