// crates/tessera-cli/src/commands/dataset.rs
//
// `tessera dataset {create, get, list, update, add, remove, delete,
// versions, diff, rollback}`: dataset lifecycle and version history.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::json;

use tessera_core::{Dataset, DatasetConfig, DatasetMetadata, SemVer};
use tessera_dataset::{
    CreateOptions, DatasetFilter, DatasetUpdate, MetadataPatch, MutationOptions, MutationResult,
};

use crate::context::{AppContext, ProgressReporter};
use crate::output::{
    format_json, format_table, human_bytes, print_batch, DatasetRow, FileRow, OutputFormat,
    VersionRow,
};

/// Dataset management subcommands.
#[derive(Debug, Subcommand)]
pub enum DatasetCmd {
    /// Upload files and register them as a new dataset at 1.0.0.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Tag attached to the dataset and its files. Repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        license: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Repeatable.
        #[arg(long = "keyword")]
        keywords: Vec<String>,
        #[arg(long)]
        encrypt: bool,
        /// Abort without registering anything if any upload fails.
        #[arg(long)]
        strict: bool,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show a dataset, optionally as of an earlier version.
    Get {
        /// Dataset id or name.
        dataset: String,
        #[arg(long)]
        version: Option<SemVer>,
    },
    /// List datasets in creation order.
    List {
        /// Case-insensitive name match; `*` and `?` are wildcards.
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        encrypted: Option<bool>,
        /// RFC 3339 timestamp.
        #[arg(long)]
        created_after: Option<DateTime<Utc>>,
        /// RFC 3339 timestamp.
        #[arg(long)]
        created_before: Option<DateTime<Utc>>,
        #[arg(long)]
        min_files: Option<usize>,
        #[arg(long)]
        max_files: Option<usize>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Change several aspects of a dataset as a single new version.
    Update {
        dataset: String,
        #[arg(long)]
        description: Option<String>,
        /// Replaces the tag list. Repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        license: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Replaces the keyword set. Repeatable.
        #[arg(long = "keyword")]
        keywords: Vec<String>,
        /// File to upload and add. Repeatable.
        #[arg(long = "add")]
        add: Vec<PathBuf>,
        /// Content id to remove. Repeatable.
        #[arg(long = "remove")]
        remove: Vec<String>,
        #[arg(long = "by")]
        created_by: Option<String>,
    },
    /// Upload files and append them to a dataset.
    Add {
        dataset: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Do not record a version for this change.
        #[arg(long)]
        no_version: bool,
        #[arg(long = "by")]
        created_by: Option<String>,
    },
    /// Remove files from a dataset by content id.
    Remove {
        dataset: String,
        #[arg(required = true)]
        cids: Vec<String>,
        #[arg(long)]
        no_version: bool,
        #[arg(long = "by")]
        created_by: Option<String>,
    },
    /// Delete a dataset and its whole history.
    Delete { dataset: String },
    /// Show the version history of a dataset.
    Versions { dataset: String },
    /// Compare two versions of a dataset.
    Diff {
        dataset: String,
        from: SemVer,
        to: SemVer,
    },
    /// Restore the content of an earlier version as a new version.
    Rollback { dataset: String, version: SemVer },
}

/// Run the dataset subcommand.
pub async fn run(ctx: &AppContext, cmd: &DatasetCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        DatasetCmd::Create {
            name,
            description,
            tags,
            author,
            license,
            category,
            keywords,
            encrypt,
            strict,
            files,
        } => {
            let config = DatasetConfig {
                name: name.clone(),
                description: description.clone(),
                encrypt: *encrypt,
                access_conditions: None,
                tags: tags.clone(),
                metadata: DatasetMetadata {
                    author: author.clone(),
                    license: license.clone(),
                    category: category.clone(),
                    keywords: keywords.iter().cloned().collect(),
                    ..DatasetMetadata::default()
                },
            };
            let options = CreateOptions {
                strict: *strict,
                created_by: None,
            };

            let reporter = ctx.report_progress();
            let result = ctx.manager.create_dataset(config, files, &options).await;
            stop(reporter).await;
            let created = result?;
            ctx.save().await?;

            match ctx.format {
                OutputFormat::Json => println!(
                    "{}",
                    format_json(&json!({ "dataset": created.dataset, "upload": created.upload }))
                ),
                OutputFormat::Table => {
                    print_batch(&created.upload);
                    println!();
                    println!(
                        "Created dataset '{}' ({}) at {}",
                        created.dataset.name, created.dataset.id, created.dataset.version
                    );
                }
            }
        }
        DatasetCmd::Get { dataset, version } => {
            let id = ctx.resolve(dataset).await?;
            let dataset = ctx.manager.get_dataset(id, version.as_ref()).await?;
            match ctx.format {
                OutputFormat::Json => println!("{}", format_json(&dataset)),
                OutputFormat::Table => print_dataset(&dataset),
            }
        }
        DatasetCmd::List {
            name,
            tag,
            author,
            category,
            encrypted,
            created_after,
            created_before,
            min_files,
            max_files,
            offset,
            limit,
        } => {
            let filter = DatasetFilter {
                encrypted: *encrypted,
                name_pattern: name.clone(),
                tag: tag.clone(),
                author: author.clone(),
                category: category.clone(),
                created_after: *created_after,
                created_before: *created_before,
                min_files: *min_files,
                max_files: *max_files,
                offset: *offset,
                limit: *limit,
            };
            let page = ctx.manager.list_datasets(&filter).await;
            match ctx.format {
                OutputFormat::Json => println!("{}", format_json(&page)),
                OutputFormat::Table => {
                    let rows: Vec<DatasetRow> = page.items.iter().map(DatasetRow::from).collect();
                    println!("{}", format_table(&rows));
                    println!("{} of {} datasets", page.items.len(), page.total);
                }
            }
        }
        DatasetCmd::Update {
            dataset,
            description,
            tags,
            author,
            license,
            category,
            keywords,
            add,
            remove,
            created_by,
        } => {
            let id = ctx.resolve(dataset).await?;
            let patch = MetadataPatch {
                author: author.clone(),
                license: license.clone(),
                category: category.clone(),
                keywords: (!keywords.is_empty())
                    .then(|| keywords.iter().cloned().collect::<BTreeSet<_>>()),
                ..MetadataPatch::default()
            };
            let update = DatasetUpdate {
                description: description.clone(),
                metadata: (patch != MetadataPatch::default()).then_some(patch),
                tags: (!tags.is_empty()).then(|| tags.clone()),
                add_files: add.clone(),
                remove_files: remove.clone(),
                created_by: created_by.clone(),
            };

            let reporter = ctx.report_progress();
            let result = ctx.manager.update_dataset(id, update).await;
            stop(reporter).await;
            let result = result?;
            ctx.save().await?;
            print_mutation(ctx.format, &result);
        }
        DatasetCmd::Add {
            dataset,
            files,
            no_version,
            created_by,
        } => {
            let id = ctx.resolve(dataset).await?;
            let options = mutation_options(*no_version, created_by);
            let reporter = ctx.report_progress();
            let result = ctx.manager.add_files(id, files, &options).await;
            stop(reporter).await;
            let result = result?;
            ctx.save().await?;
            print_mutation(ctx.format, &result);
        }
        DatasetCmd::Remove {
            dataset,
            cids,
            no_version,
            created_by,
        } => {
            let id = ctx.resolve(dataset).await?;
            let options = mutation_options(*no_version, created_by);
            let result = ctx.manager.remove_files(id, cids, &options).await?;
            ctx.save().await?;
            print_mutation(ctx.format, &result);
        }
        DatasetCmd::Delete { dataset } => {
            let id = ctx.resolve(dataset).await?;
            let deleted = ctx.manager.delete_dataset(id).await;
            if deleted {
                ctx.save().await?;
            }
            match ctx.format {
                OutputFormat::Json => {
                    println!("{}", format_json(&json!({ "id": id, "deleted": deleted })))
                }
                OutputFormat::Table if deleted => println!("Deleted dataset {}", id),
                OutputFormat::Table => println!("Dataset {} not found", id),
            }
        }
        DatasetCmd::Versions { dataset } => {
            let id = ctx.resolve(dataset).await?;
            let versions = ctx.manager.list_versions(id).await?;
            match ctx.format {
                OutputFormat::Json => println!("{}", format_json(&versions)),
                OutputFormat::Table => {
                    let rows: Vec<VersionRow> = versions.iter().map(VersionRow::from).collect();
                    println!("{}", format_table(&rows));
                }
            }
        }
        DatasetCmd::Diff { dataset, from, to } => {
            let id = ctx.resolve(dataset).await?;
            let cmp = ctx.manager.compare_versions(id, from, to).await?;
            match ctx.format {
                OutputFormat::Json => println!("{}", format_json(&cmp)),
                OutputFormat::Table => {
                    println!("{} -> {}", cmp.from_version, cmp.to_version);
                    if cmp.is_identical() {
                        println!("No differences");
                        return Ok(());
                    }
                    for file in &cmp.files_added {
                        println!("  + {}  {}", file.cid, file.original_path);
                    }
                    for file in &cmp.files_removed {
                        println!("  - {}  {}", file.cid, file.original_path);
                    }
                    for change in &cmp.files_modified {
                        println!("  ~ {}", change.cid);
                    }
                    for (field, change) in &cmp.metadata_changes {
                        println!("  metadata.{}: {} -> {}", field, change.from, change.to);
                    }
                }
            }
        }
        DatasetCmd::Rollback { dataset, version } => {
            let id = ctx.resolve(dataset).await?;
            let record = ctx.manager.rollback_to_version(id, version).await?;
            ctx.save().await?;
            match ctx.format {
                OutputFormat::Json => println!("{}", format_json(&record)),
                OutputFormat::Table => println!("{} -> {}", record.summary, record.version),
            }
        }
    }

    Ok(())
}

fn mutation_options(no_version: bool, created_by: &Option<String>) -> MutationOptions {
    MutationOptions {
        create_version: !no_version,
        created_by: created_by.clone(),
    }
}

async fn stop(reporter: Option<ProgressReporter>) {
    if let Some(reporter) = reporter {
        reporter.finish().await;
    }
}

fn print_dataset(dataset: &Dataset) {
    println!("{}", format_table(&[DatasetRow::from(dataset)]));
    if let Some(description) = &dataset.description {
        println!("{}", description);
    }
    if !dataset.tags.is_empty() {
        println!("Tags: {}", dataset.tags.join(", "));
    }
    let meta = &dataset.metadata;
    for (label, value) in [
        ("Author", &meta.author),
        ("License", &meta.license),
        ("Category", &meta.category),
    ] {
        if let Some(value) = value {
            println!("{}: {}", label, value);
        }
    }
    println!();
    let rows: Vec<FileRow> = dataset.files.iter().map(FileRow::from).collect();
    println!("{}", format_table(&rows));
    println!(
        "{} files, {}",
        dataset.files.len(),
        human_bytes(dataset.total_size())
    );
}

fn print_mutation(format: OutputFormat, result: &MutationResult) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            format_json(&json!({
                "dataset": result.dataset,
                "version": result.version,
                "upload": result.upload,
            }))
        ),
        OutputFormat::Table => {
            if let Some(upload) = &result.upload {
                print_batch(upload);
                println!();
            }
            match &result.version {
                Some(record) => println!(
                    "Dataset '{}' is now {}: {}",
                    result.dataset.name, record.version, record.summary
                ),
                None => println!(
                    "Dataset '{}' updated without a new version (still {})",
                    result.dataset.name, result.dataset.version
                ),
            }
        }
    }
}
