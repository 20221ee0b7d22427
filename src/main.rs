//! Command line entry point for punchline
//!
//! Runs single updates and compressions from the shell, or a small
//! tournament (round robin, or seeded random pairs) to watch a leaderboard settle.

use anyhow::Result;
use chrono::Duration;
use clap::{Parser, Subcommand};
use punchline::config::{validate_config, AppConfig};
use punchline::rating::{compress, update, RatingLedger};
use punchline::types::{JokeId, ParticipantStats};
use punchline::rating::history::{DEFAULT_FEED_LIMIT, DEFAULT_FEED_MAX_RANK};
use punchline::utils::{current_timestamp, generate_joke_id};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{error, info};

/// Punchline - adaptive pairwise Elo ratings for jokes
#[derive(Parser)]
#[command(
    name = "punchline",
    version,
    about = "Adaptive pairwise Elo rating engine for ranking jokes head-to-head",
    long_about = "Punchline rates jokes from head-to-head preferences. Each comparison moves both \
                 ratings by a step that adapts to experience, recent form, volatility and how \
                 surprising the result was. Idle ratings drift back toward the mean."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        global = true,
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, global = true, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, global = true, help = "Validate configuration and exit")]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Rate a single comparison and print the full result as JSON
    Compare {
        #[arg(long, allow_negative_numbers = true)]
        winner: f64,
        #[arg(long, allow_negative_numbers = true)]
        loser: f64,
        #[arg(long, default_value_t = 30)]
        winner_games: u32,
        #[arg(long, default_value_t = 30)]
        loser_games: u32,
        /// Recent results, oldest first, 1 for a win and 0 for a loss
        #[arg(long, value_delimiter = ',')]
        winner_form: Vec<u8>,
        #[arg(long, value_delimiter = ',')]
        loser_form: Vec<u8>,
    },
    /// Pull a rating toward the mean for a stretch of inactivity
    Compress {
        #[arg(long, allow_negative_numbers = true)]
        rating: f64,
        #[arg(long)]
        days: f64,
        #[arg(long)]
        mean: Option<f64>,
    },
    /// Tournament where the stronger joke always wins
    Simulate {
        #[arg(long, default_value_t = 8)]
        jokes: usize,
        #[arg(long, default_value_t = 10)]
        rounds: usize,
        /// Draw random pairs from this seed instead of playing round robin
        #[arg(long)]
        seed: Option<u64>,
        /// Print the latest top-10 movements after the leaderboard
        #[arg(long)]
        feed: bool,
        /// Print Prometheus metrics after the leaderboard
        #[arg(long)]
        metrics: bool,
    },
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Display startup banner with the active configuration
fn display_startup_banner(config: &AppConfig) {
    info!("🎭 Punchline rating engine v{}", punchline::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!(
        "   Engine: base K {}, min games {}, volatility decay {}",
        config.engine.base_k, config.engine.min_games, config.engine.volatility_decay
    );
    info!(
        "   Ledger: initial {}, mean {}, form window {}",
        config.ledger.initial_rating, config.ledger.mean_rating, config.ledger.form_window
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from environment, file and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    validate_config(&config)?;
    Ok(config)
}

fn run_compare(
    config: &AppConfig,
    winner: f64,
    loser: f64,
    winner_stats: ParticipantStats,
    loser_stats: ParticipantStats,
) -> Result<()> {
    let result = update(winner, loser, &winner_stats, &loser_stats, &config.engine)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

struct Simulation {
    jokes: usize,
    rounds: usize,
    seed: Option<u64>,
    show_feed: bool,
    show_metrics: bool,
}

fn run_simulation(config: &AppConfig, simulation: Simulation) -> Result<()> {
    let Simulation {
        jokes,
        rounds,
        seed,
        show_feed,
        show_metrics,
    } = simulation;
    let ledger = RatingLedger::from_config(config)?;

    // Hidden strength is the index: joke-0 is the weakest
    let ids: Vec<JokeId> = (0..jokes).map(|_| generate_joke_id()).collect();
    let labels: HashMap<JokeId, String> = ids
        .iter()
        .enumerate()
        .map(|(strength, id)| (*id, format!("joke-{strength:02}")))
        .collect();

    let mut now = current_timestamp();
    for id in &ids {
        ledger.register(*id, now)?;
    }

    let strength: HashMap<JokeId, usize> =
        ids.iter().enumerate().map(|(index, id)| (*id, index)).collect();
    let schedule: Vec<(JokeId, JokeId)> = (0..jokes)
        .flat_map(|weaker| ((weaker + 1)..jokes).map(move |stronger| (weaker, stronger)))
        .map(|(weaker, stronger)| (ids[weaker], ids[stronger]))
        .collect();
    let mut rng = seed.map(ChaCha8Rng::seed_from_u64);
    let strength_of = |id: &JokeId| strength.get(id).copied().unwrap_or(0);

    let mut comparisons = 0usize;
    for round in 0..rounds {
        for scheduled in &schedule {
            let (first, second) = match rng.as_mut() {
                Some(rng) => ledger.next_pair(rng)?,
                None => *scheduled,
            };
            let (winner, loser) = if strength_of(&first) > strength_of(&second) {
                (first, second)
            } else {
                (second, first)
            };

            now += Duration::minutes(1);
            ledger.record_comparison(winner, loser, now)?;
            comparisons += 1;
        }
        info!(round = round + 1, comparisons, "Round complete");
    }

    println!("{:>4}  {:<8}  {:>7}  {:>5}  {:>6}", "rank", "joke", "rating", "games", "form");
    for row in ledger.leaderboard(None)? {
        let label = labels.get(&row.joke_id).map(String::as_str).unwrap_or("?");
        println!(
            "{:>4}  {:<8}  {:>7.0}  {:>5}  {:>6.2}",
            row.rank, label, row.rating, row.games, row.form
        );
    }

    if show_feed {
        println!();
        println!("{:<8}  {:>7}  {:>7}  {:>4}  {:>4}", "joke", "before", "after", "rank", "was");
        for entry in ledger.recent_updates(DEFAULT_FEED_LIMIT, Some(DEFAULT_FEED_MAX_RANK))? {
            let label = labels.get(&entry.joke_id).map(String::as_str).unwrap_or("?");
            let previous = entry
                .prev_rank
                .map_or_else(|| "new".to_string(), |rank| rank.to_string());
            println!(
                "{:<8}  {:>7.0}  {:>7.0}  {:>4}  {:>4}",
                label, entry.elo_before, entry.elo_after, entry.rank, previous
            );
        }
    }

    if show_metrics {
        println!();
        print!("{}", ledger.metrics().encode_text()?);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without running a command");
        return Ok(());
    }

    let outcome = match args.command {
        Some(Command::Compare {
            winner,
            loser,
            winner_games,
            loser_games,
            winner_form,
            loser_form,
        }) => run_compare(
            &config,
            winner,
            loser,
            ParticipantStats::new(winner_games).with_form(winner_form),
            ParticipantStats::new(loser_games).with_form(loser_form),
        ),
        Some(Command::Compress { rating, days, mean }) => {
            compress(rating, days, mean.unwrap_or(config.ledger.mean_rating)).map(|compressed| {
                println!("{compressed}");
            })
        }
        Some(Command::Simulate {
            jokes,
            rounds,
            seed,
            feed,
            metrics,
        }) => run_simulation(
            &config,
            Simulation {
                jokes,
                rounds,
                seed,
                show_feed: feed,
                show_metrics: metrics,
            },
        ),
        None => {
            display_startup_banner(&config);
            info!("No command given, see --help");
            Ok(())
        }
    };

    if let Err(e) = outcome {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
