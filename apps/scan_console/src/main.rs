use std::{
    io::{self, BufRead},
    path::PathBuf,
};

use anyhow::Result;
use clap::Parser;
use crossbeam_channel::bounded;
use tracing_subscriber::EnvFilter;

mod bridge;
mod config;

use bridge::{dispatch_console_command, parse_command, ConsoleCommand, HELP};
use config::{load_settings, parse_role, DEFAULT_CONFIG_FILE};
use mesh_storage::FileNaming;

const CONSOLE_QUEUE_CAPACITY: usize = 32;

/// Drives a scan session against the simulated engine from stdin.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// mirror or scanner
    #[arg(long)]
    role: Option<String>,
    /// Name each mesh `<timestamp>.ply` instead of `scan.ply`.
    #[arg(long)]
    timestamped: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(output_dir) = args.output_dir {
        settings.output_dir = output_dir;
    }
    if let Some(role) = args.role.as_deref() {
        settings.role = Some(parse_role(role)?);
    }
    if args.timestamped {
        settings.file_naming = FileNaming::Timestamped;
    }

    let (cmd_tx, cmd_rx) = bounded(CONSOLE_QUEUE_CAPACITY);
    let backend = bridge::launch(settings, cmd_rx);
    println!("{HELP}");

    let mut status = String::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let cmd = match parse_command(&line) {
            Ok(cmd) => cmd,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        let quitting = cmd == ConsoleCommand::Quit;
        dispatch_console_command(&cmd_tx, cmd, &mut status);
        if !status.is_empty() {
            println!("{status}");
            status.clear();
        }
        if quitting {
            break;
        }
    }

    drop(cmd_tx);
    if backend.join().is_err() {
        anyhow::bail!("backend worker panicked");
    }
    Ok(())
}
