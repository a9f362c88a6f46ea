use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "sift-cmd")]
#[command(about = "Command-line utility for building and inspecting sift postings files")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build postings files from a text file with one document per line
    Index {
        /// Input text file; whitespace-separated words are the terms
        input: String,

        /// Output directory for the postings files
        out_dir: String,

        /// Number of documents between skip points
        #[arg(long)]
        skip_interval: Option<u32>,

        /// Index documents and frequencies only
        #[arg(long)]
        no_positions: bool,
    },

    /// Display the header and term metadata of a postings directory
    Inspect {
        /// Directory written by the `index` command
        out_dir: String,

        /// Decode and display the postings of this term
        #[arg(long)]
        term: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Commands::Index {
            input,
            out_dir,
            skip_interval,
            no_positions,
        } => commands::index::run(input, out_dir, skip_interval, no_positions),
        Commands::Inspect { out_dir, term } => commands::inspect::run(out_dir, term),
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}
