//! casseq-dump
//!
//! Opens a store and prints its count, sizes and (optionally) its rows.

use std::io::{self, Write};
use std::process;

use casseq::{Config, Store};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// Inspect a casseq store
#[derive(Parser, Debug)]
#[command(name = "casseq-dump")]
#[command(about = "Print the contents of a casseq sequence store")]
#[command(version)]
struct Args {
    /// Data directory containing the store
    data_dir: String,

    /// Store name (subdirectory of the data directory)
    name: String,

    /// Print every row as hex
    #[arg(short, long)]
    rows: bool,
}

fn main() {
    // Initialize tracing/logging (stderr, so the table stays clean on stdout)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,casseq=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("casseq-dump v{}", casseq::VERSION);

    // No stride: an existing store supplies it through its manifest
    let store = match Store::open(&args.data_dir, &args.name, Config::default()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            process::exit(1);
        }
    };

    let mut failed = false;

    if let Err(e) = report(&store, args.rows) {
        tracing::error!("Failed to read store: {}", e);
        failed = true;
    }

    if let Err(e) = store.close() {
        tracing::error!("Failed to close store: {}", e);
        failed = true;
    }

    if failed {
        process::exit(1);
    }
}

fn report(store: &Store, with_rows: bool) -> casseq::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "store:   {}", store.dir().display())?;
    writeln!(out, "stride:  {}", store.stride())?;
    writeln!(out, "entries: {}", store.count())?;
    writeln!(out, "size:    {} bytes", store.size()?)?;

    let repair = store.rows().repair_report();
    if repair.was_truncated() {
        writeln!(out, "repair:  discarded {} trailing bytes", repair.bytes_discarded)?;
    }

    if with_rows {
        writeln!(out)?;
        store.dump_rows(&mut out)?;
    }

    Ok(())
}
