//! Content validation tool.
//!
//! Loads a content directory the way the engine does at startup and
//! cross-checks every reference. Parse and schema errors are fatal before
//! any room could go active; dangling references are listed so authors can
//! fix them before they degrade to runtime no-ops.

use anyhow::{Context, bail};
use clap::Parser;
use roomlore::content::loader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "validate-rooms", about = "Validate a roomlore content directory")]
struct Args {
    /// Content directory (catalogs plus rooms/)
    #[arg(short, long, default_value = "content")]
    content: PathBuf,

    /// Treat dangling references as errors
    #[arg(long)]
    strict: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let store = loader::load_dir(&args.content)
        .with_context(|| format!("loading content from {}", args.content.display()))?;

    println!("Loaded {} room rule document(s).", store.room_count());

    let issues = loader::verify_references(&store);
    if issues.is_empty() {
        println!("All references resolve.");
        return Ok(());
    }

    for issue in &issues {
        println!("warning: {issue}");
    }
    if args.strict {
        bail!("{} dangling reference(s)", issues.len());
    }
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, prelude::*};

    color_eyre::install().unwrap();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
        .with(tracing_error::ErrorLayer::default())
        .init();
}
