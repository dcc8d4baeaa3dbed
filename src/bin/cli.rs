//! fsqueue CLI
//!
//! Command-line interface for pushing to and popping from a queue file.
//!
//! Payloads go to stdout, one per line; logs go to stderr.

use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fsqueue::{Config, Queue, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// Exit status of `pop`/`bpop` when no payload was returned
const EXIT_EMPTY: u8 = 2;

/// fsqueue CLI
#[derive(Parser, Debug)]
#[command(name = "fsqueue-cli")]
#[command(about = "CLI for fsqueue single-file FIFO queues")]
#[command(version)]
struct Args {
    /// Queue file (created if absent)
    #[arg(short, long, default_value = "./fsqueue.q")]
    path: String,

    /// Sleep between bpop polling attempts, in microseconds
    #[arg(long, default_value = "100000")]
    poll_interval_us: u64,

    /// Compact once the read cursor passes this many bytes
    #[arg(long, default_value_t = fsqueue::config::DEFAULT_COMPACTION_THRESHOLD)]
    compaction_threshold: u64,

    /// fdatasync after every mutation
    #[arg(long)]
    sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enqueue one or more values, in order
    Push {
        /// Values to enqueue
        #[arg(required_unless_present = "stdin")]
        values: Vec<String>,

        /// Enqueue all of stdin as a single payload
        #[arg(long, conflicts_with = "values")]
        stdin: bool,
    },

    /// Dequeue one value
    Pop,

    /// Dequeue one value, waiting for data
    Bpop {
        /// Seconds to wait (0 waits forever)
        #[arg(short, long, default_value = "0")]
        timeout: u64,
    },

    /// Print queued values without removing them
    Peek {
        /// Number of values to skip
        #[arg(short, long, default_value = "0")]
        offset: usize,

        /// Maximum number of values to print (0 prints all)
        #[arg(short, long, default_value = "0")]
        limit: usize,
    },

    /// Print the number of queued values
    Count,

    /// Print whether the queue is empty
    IsEmpty,

    /// Drop every queued value
    Clear,

    /// Remove the queue file
    Delete,

    /// Print cursor positions and file size
    Stats,

    /// Check every record against the index
    Verify,
}

fn main() -> ExitCode {
    // Logs on stderr so stdout carries only payloads
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fsqueue=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let sync_strategy = if args.sync {
        SyncStrategy::EveryWrite
    } else {
        SyncStrategy::Never
    };
    let config = Config::builder()
        .poll_interval_us(args.poll_interval_us)
        .compaction_threshold(args.compaction_threshold)
        .sync_strategy(sync_strategy)
        .build();

    let queue = match Queue::open_with_config(&args.path, config) {
        Ok(q) => q,
        Err(e) => {
            tracing::error!("Failed to open queue {}: {}", args.path, e);
            return ExitCode::FAILURE;
        }
    };

    match run(&queue, args.command) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(queue: &Queue, command: Commands) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut out = io::stdout().lock();

    match command {
        Commands::Push { values, stdin } => {
            if stdin {
                let mut payload = Vec::new();
                io::stdin().read_to_end(&mut payload)?;
                let len = queue.enqueue(&payload)?;
                writeln!(out, "{}", len)?;
            } else {
                for value in values {
                    let len = queue.enqueue(value.as_bytes())?;
                    writeln!(out, "{}", len)?;
                }
            }
        }
        Commands::Pop => return print_payload(&mut out, queue.dequeue()?),
        Commands::Bpop { timeout } => return print_payload(&mut out, queue.bdequeue(timeout)?),
        Commands::Peek { offset, limit } => {
            for payload in queue.items(offset, limit)? {
                out.write_all(&payload)?;
                out.write_all(b"\n")?;
            }
        }
        Commands::Count => writeln!(out, "{}", queue.count()?)?,
        Commands::IsEmpty => writeln!(out, "{}", queue.is_empty()?)?,
        Commands::Clear => queue.clear()?,
        Commands::Delete => queue.delete()?,
        Commands::Stats => {
            let stats = queue.stats()?;
            writeln!(out, "len:        {}", stats.len)?;
            writeln!(out, "start:      {}", stats.start)?;
            writeln!(out, "end:        {}", stats.end)?;
            writeln!(out, "file_size:  {}", stats.file_size)?;
            writeln!(out, "dead_bytes: {}", stats.dead_bytes)?;
        }
        Commands::Verify => {
            let report = queue.verify()?;
            writeln!(
                out,
                "ok: {} records, {} payload bytes",
                report.records, report.payload_bytes
            )?;
        }
    }

    out.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn print_payload(out: &mut impl Write, payload: Option<Vec<u8>>) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match payload {
        Some(payload) => {
            out.write_all(&payload)?;
            out.write_all(b"\n")?;
            out.flush()?;
            Ok(ExitCode::SUCCESS)
        }
        None => Ok(ExitCode::from(EXIT_EMPTY)),
    }
}
