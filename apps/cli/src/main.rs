//! RewardTree CLI
//!
//! Builds reward distributions from raw earner records, prints their
//! Merkle roots and produces or checks claim bundles.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use rewardtree_core::Address;
use rewardtree_distribution::{generate_claim, parse_lines, Claim, Distribution, ParsedLines};
use rewardtree_logging::LogLevel;
use rewardtree_settings::{default_settings_path, expand_path, Settings};

/// RewardTree - Merkle commitments for cumulative token rewards
#[derive(Parser)]
#[command(name = "rewardtree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest earner lines, merklize and print the root
    Build {
        /// Newline-delimited JSON earner lines, `-` for stdin
        #[arg(short, long)]
        input: PathBuf,

        /// Write the serialized distribution here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the root of a serialized distribution
    Root {
        #[arg(short, long)]
        distribution: PathBuf,
    },

    /// Produce a claim for one earner
    Claim {
        #[arg(short, long)]
        distribution: PathBuf,

        /// Earner address (0x-prefixed hex)
        #[arg(short, long)]
        earner: String,

        /// Token addresses to include
        #[arg(short, long, required = true, num_args = 1..)]
        token: Vec<String>,

        /// Write the claim here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a claim against its own root
    Verify {
        #[arg(short, long)]
        claim: PathBuf,

        /// Also require this root (0x-prefixed hex)
        #[arg(short, long)]
        root: Option<String>,
    },

    /// Show or initialize settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Write default settings if no file exists
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    rewardtree_logging::try_init(LogLevel::from_quiet(cli.quiet, cli.verbose))
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let settings_path = cli
        .config
        .as_deref()
        .map(expand_path)
        .unwrap_or_else(default_settings_path);
    let settings = Settings::load_from(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
    debug!("Using settings {:?}", settings);

    match cli.command {
        Commands::Build { input, output } => build(&settings, &input, output.as_deref()),
        Commands::Root { distribution } => root(&settings, &distribution),
        Commands::Claim {
            distribution,
            earner,
            token,
            output,
        } => claim(&settings, &distribution, &earner, &token, output.as_deref()),
        Commands::Verify { claim, root } => verify(&claim, root.as_deref()),
        Commands::Config { action } => config(settings, action),
    }
}

fn read_lines(settings: &Settings, input: &Path) -> Result<ParsedLines> {
    let policy = settings.ingest.parse_error_policy;
    let parsed = if input == Path::new("-") {
        parse_lines(io::stdin().lock(), policy).context("Failed to read earner lines from stdin")?
    } else {
        let file = File::open(input)
            .with_context(|| format!("Failed to open {}", input.display()))?;
        parse_lines(BufReader::new(file), policy)
            .with_context(|| format!("Failed to read earner lines from {}", input.display()))?
    };
    Ok(parsed)
}

fn load(path: &Path) -> Result<Distribution> {
    Distribution::load_from_file(path)
        .with_context(|| format!("Failed to load distribution from {}", path.display()))
}

fn parse_address(s: &str) -> Result<Address> {
    s.parse::<Address>()
        .with_context(|| format!("Invalid address {:?}", s))
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", content)?;
        }
    }
    Ok(())
}

fn build(settings: &Settings, input: &Path, output: Option<&Path>) -> Result<()> {
    let parsed = read_lines(settings, input)?;
    let (mut distribution, mut report) =
        Distribution::from_lines(&parsed.lines, &settings.ingest_options())
            .context("Ingestion failed")?;
    // Malformed lines never reach the ingestor
    report.records += parsed.skipped;
    report.skipped += parsed.skipped;

    let merklization = distribution
        .merklize_with(&settings.tree_builder())
        .context("Merklization failed")?;

    if let Some(output) = output {
        distribution
            .save_to_file(output, settings.output.pretty)
            .with_context(|| format!("Failed to write distribution to {}", output.display()))?;
    }

    info!(
        "Built distribution: {} accounts, {} tokens ({} records, {} merged, {} skipped)",
        distribution.num_accounts(),
        distribution.num_tokens(),
        report.records,
        report.merged,
        report.skipped,
    );
    println!("0x{}", hex::encode(merklization.root()));
    Ok(())
}

fn root(settings: &Settings, path: &Path) -> Result<()> {
    let mut distribution = load(path)?;
    let merklization = distribution
        .merklize_with(&settings.tree_builder())
        .context("Merklization failed")?;
    println!("0x{}", hex::encode(merklization.root()));
    Ok(())
}

fn claim(
    settings: &Settings,
    path: &Path,
    earner: &str,
    tokens: &[String],
    output: Option<&Path>,
) -> Result<()> {
    let earner = parse_address(earner)?;
    let tokens = tokens
        .iter()
        .map(|t| parse_address(t))
        .collect::<Result<Vec<_>>>()?;

    let mut distribution = load(path)?;
    let merklization = distribution
        .merklize_with(&settings.tree_builder())
        .context("Merklization failed")?;

    let claim = generate_claim(&distribution, &merklization, earner, &tokens)
        .with_context(|| format!("Failed to generate claim for {}", earner))?;

    let json = if settings.output.pretty {
        serde_json::to_string_pretty(&claim)?
    } else {
        serde_json::to_string(&claim)?
    };
    write_output(output, &json)
}

fn verify(path: &Path, expected_root: Option<&str>) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let claim: Claim = serde_json::from_str(&content)
        .with_context(|| format!("Malformed claim in {}", path.display()))?;

    if let Some(expected) = expected_root {
        let expected = expected.strip_prefix("0x").unwrap_or(expected);
        if hex::encode(claim.root) != expected.to_lowercase() {
            bail!(
                "Claim root 0x{} does not match expected 0x{}",
                hex::encode(claim.root),
                expected
            );
        }
    }

    if !claim.check() {
        bail!("Claim for {} does not verify", claim.earner_leaf.earner);
    }
    println!(
        "Claim for {} verified against 0x{}",
        claim.earner_leaf.earner,
        hex::encode(claim.root)
    );
    Ok(())
}

fn config(settings: Settings, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigAction::Init => {
            let path = settings
                .config_path()
                .map(Path::to_path_buf)
                .unwrap_or_else(default_settings_path);
            if path.exists() {
                println!("Settings already exist at {}", path.display());
            } else {
                settings.save_to(&path)?;
                println!("Wrote default settings to {}", path.display());
            }
        }
    }
    Ok(())
}
