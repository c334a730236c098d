//! 🚀 claimsnap-cli: ring the doorbell by hand.
//!
//! 🎬 *[narrator voice]* "Sometimes the bucket doesn't call you. Sometimes you call the bucket."
//! Feed it a notification JSON (`--event`) or point it straight at an object
//! (`--bucket` + `--key`), and it runs one batch exactly like the event-driven path would. 🦆

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use comfy_table::{Table, presets::UTF8_FULL};
use tracing::error;
use tracing_subscriber::EnvFilter;

use claimsnap::common::BatchResult;
use claimsnap::notification::{ObjectLocation, StorageNotification};

#[derive(Debug, Parser)]
#[command(name = "claimsnap", about = "📸 Classify claim photos from one batch of events")]
struct Args {
    /// 🔧 TOML config file. Env vars (REPO_HOST, REPO_PASSWORD, CLAIMSNAP_*) are always read.
    #[arg(short, long, env = "CLAIMSNAP_CONFIG")]
    config: Option<PathBuf>,

    /// 🔔 A storage notification JSON file; the first record names the batch object.
    #[arg(long, conflicts_with_all = ["bucket", "key"])]
    event: Option<PathBuf>,

    /// 🪣 Bucket holding the batch object.
    #[arg(long, requires = "key")]
    bucket: Option<String>,

    /// 🗝️ Object key, already decoded.
    #[arg(long, requires = "bucket")]
    key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let the_args = Args::parse();

    let the_config_file = match &the_args.config {
        Some(path) => {
            let the_file_exists = path.try_exists().context(format!(
                "💀 Couldn't check whether the configuration file exists. Relative paths are relative \
                 to the current directory; an absolute path removes all doubt. Was checking here: '{}'",
                path.display()
            ))?;
            if !the_file_exists {
                bail!("💀 Configuration file '{}' does not exist.", path.display());
            }
            Some(path.as_path())
        }
        None => None,
    };

    let the_app_config = claimsnap::app_config::load_config(the_config_file)
        .context("💀 In claimsnap-cli, main, we couldn't load the configuration. Check the file and the REPO_HOST / CLAIMSNAP_* env vars.")?;

    let the_result = match (&the_args.event, &the_args.bucket, &the_args.key) {
        (Some(event_file), _, _) => match read_notification(event_file).await {
            Ok(notification) => {
                claimsnap::handle_notification(&the_app_config, &notification).await
            }
            Err(err) => Err(err),
        },
        (None, Some(bucket), Some(key)) => {
            claimsnap::run(&the_app_config, ObjectLocation::new(bucket, key)).await
        }
        _ => Err(anyhow::anyhow!(
            "💀 Nothing to process. Pass --event <notification.json>, or --bucket and --key."
        )),
    };

    match the_result {
        Ok(batch_result) => {
            println!("{batch_result}");
            println!("{}", summary_table(&batch_result));
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            std::process::exit(1);
        }
    }
}

async fn read_notification(path: &Path) -> Result<StorageNotification> {
    let the_json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("💀 Couldn't read notification file '{}'", path.display()))?;
    StorageNotification::from_json(&the_json)
}

fn summary_table(result: &BatchResult) -> Table {
    let mut the_table = Table::new();
    the_table
        .load_preset(UTF8_FULL)
        .set_header(vec!["📦 events", "✅ succeeded", "💀 failed"])
        .add_row(vec![
            result.total().to_string(),
            result.succeeded().to_string(),
            result.failed().to_string(),
        ]);
    the_table
}

/// 🧅 Log the error chain, and if it smells like a network problem, say so.
fn report_failure(err: &anyhow::Error) {
    error!("💀 error: {}", err);
    let mut the_vibes_are_giving_connection_issues = false;
    for cause in err.chain().skip(1) {
        error!("⚠️  cause: {}", cause);
        let cause_str = cause.to_string();
        if cause_str.contains("dispatch failure")
            || cause_str.contains("error sending request")
            || cause_str.contains("Connection refused")
            || cause_str.contains("connection refused")
            || cause_str.contains("dns error")
        {
            the_vibes_are_giving_connection_issues = true;
        }
    }

    if the_vibes_are_giving_connection_issues {
        error!(
            "🔧 hint: looks like object storage isn't reachable from here. Check the region \
             (CLAIMSNAP_STORAGE__S3__REGION), your AWS credentials, and that the bucket lives \
             where you think it does. For offline replays, use [storage.File] instead. ☕"
        );
    }
}
