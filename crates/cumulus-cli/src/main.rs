mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use cumulus_core::filter::IgnoreSpec;
use cumulus_core::orchestrator::{UploadOrchestrator, UploadSource};
use cumulus_core::store::DirectoryStore;
use cumulus_core::UploadConfig;
use eyre::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};

use cli::{Cli, Commands, PutArgs, UploadArgs};

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    match Cli::parse().command {
        Commands::Upload(args) => run_upload(args),
        Commands::Put(args) => run_put(args),
    }
}

fn upload_config(segment_size: Option<u64>) -> UploadConfig {
    let mut config = UploadConfig::default();
    if let Some(ceiling) = segment_size {
        config.segment_ceiling = ceiling;
    }
    config
}

fn run_upload(args: UploadArgs) -> Result<()> {
    let store = Arc::new(DirectoryStore::new(&args.store));
    let orchestrator = UploadOrchestrator::with_config(store, upload_config(args.segment_size));

    let started = orchestrator.start_folder_upload(
        &args.source,
        args.container.as_deref(),
        IgnoreSpec::from(Some(args.ignore).filter(|p| !p.is_empty())),
    )?;

    let bar = if args.progress {
        let pb = ProgressBar::new(started.total_bytes);
        pb.set_style(
            ProgressStyle::with_template("{bar:40} {bytes}/{total_bytes} {msg}")
                .unwrap()
                .progress_chars("=> "),
        );
        pb.set_message(format!("{} → {}", args.source.display(), args.store.display()));
        Some(pb)
    } else {
        None
    };

    loop {
        let uploaded = orchestrator.get_uploaded(&started.key)?;
        if let Some(pb) = &bar {
            pb.set_position(uploaded);
        }
        if orchestrator.upload_finished(&started.key)? {
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    if let Some(pb) = bar {
        pb.finish_and_clear();
    }

    if let Some(cause) = orchestrator.upload_failure(&started.key)? {
        bail!("upload aborted: {cause}");
    }

    let uploaded = orchestrator.get_uploaded(&started.key)?;
    println!(
        "Uploaded {uploaded} of {} bytes from {}",
        started.total_bytes,
        args.source.display()
    );
    Ok(())
}

fn run_put(args: PutArgs) -> Result<()> {
    let store = Arc::new(DirectoryStore::new(&args.store));
    let orchestrator = UploadOrchestrator::with_config(store, upload_config(args.segment_size));

    let remote = orchestrator.upload_file(
        args.container.as_deref(),
        UploadSource::LocalPath(args.file.clone()),
        args.name.as_deref(),
        args.content_type.as_deref(),
    )?;

    if remote.split {
        println!(
            "Uploaded {} ({} bytes) as {} segments plus manifest",
            remote.name, remote.bytes, remote.segments
        );
    } else {
        println!("Uploaded {} ({} bytes)", remote.name, remote.bytes);
    }
    Ok(())
}
