use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use primify::picture::{self, ImageNumber};
use primify::search::{
    NumPrimeOracle, SearchConfig, SearchRequest, default_worker_count, find_next_prime,
    parse_start,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

// --- Command Line Arguments ---

#[derive(Parser)]
#[command(name = "primify")]
#[command(about = "primify - turn images into primes that look like them")]
#[command(version)]
#[command(subcommand_required = true)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an image into a similar looking prime
    Image {
        /// Source image to be converted
        #[arg(long, short = 'i', default_value = "./prime.png")]
        image: PathBuf,
        /// Maximal number of digits the prime can have
        #[arg(long, short = 'd', default_value = "5000")]
        max_digits: usize,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Find the smallest prime greater than or equal to a decimal number
    Next {
        /// Starting number (decimal)
        number: String,
        /// Digits per output line (0 disables wrapping)
        #[arg(long, short = 'w', default_value = "0")]
        width: usize,
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// File the prime is written to
    #[arg(long, short = 'o', default_value = "prime.txt")]
    output_file: PathBuf,
    /// Number of worker threads (defaults to one less than the CPU count)
    #[arg(long, short = 'j')]
    cores: Option<usize>,
    /// Candidates per round (defaults to ln of the starting number, at least 10)
    #[arg(long)]
    batch_size: Option<usize>,
    /// Give up after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl SearchArgs {
    fn search_config(&self) -> SearchConfig {
        SearchConfig::default()
            .with_batch_size_option(self.batch_size)
            .with_timeout_option(self.timeout.map(Duration::from_secs))
    }

    fn worker_count(&self) -> usize {
        self.cores.unwrap_or_else(default_worker_count)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Search for the next prime at or above `number` and keep its line width.
fn primify_number(number: ImageNumber, args: &SearchArgs) -> Result<ImageNumber> {
    let width = number.width;
    let request = SearchRequest::new(number.value, args.worker_count())?.with_metadata(width);

    let outcome = find_next_prime(request, &args.search_config(), Arc::new(NumPrimeOracle))
        .context("next-prime search failed")?;

    info!(
        workers = outcome.statistics.worker_count,
        rounds = outcome.statistics.rounds,
        tested = outcome.statistics.candidates_tested,
        skipped = outcome.statistics.candidates_skipped,
        elapsed = ?outcome.statistics.elapsed_time,
        "search statistics"
    );

    Ok(ImageNumber::new(outcome.prime, outcome.metadata))
}

fn write_prime(prime: &ImageNumber, path: &Path) -> Result<()> {
    let rendered = prime.to_string();
    println!("{}", rendered);
    fs::write(path, format!("{}\n", rendered))
        .with_context(|| format!("failed to write prime to {}", path.display()))?;
    info!(path = %path.display(), "saved prime");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Image {
            image,
            max_digits,
            search,
        } => {
            info!(path = %image.display(), "converting image into a number");
            let source = picture::load(&image)
                .with_context(|| format!("failed to open {}", image.display()))?;
            let number = picture::numberize(&source, max_digits)?;
            let prime = primify_number(number, &search)?;
            write_prime(&prime, &search.output_file)?;
        }
        Commands::Next {
            number,
            width,
            search,
        } => {
            let start = parse_start(&number)?;
            let prime = primify_number(ImageNumber::new(start, width), &search)?;
            write_prime(&prime, &search.output_file)?;
        }
    }

    Ok(())
}
