//! nettrie: CLI tool for checking addresses against prefix lists.

use clap::{Parser, Subcommand};
use nettrie::{Endpoint, PrefixSet, PrefixSetConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "nettrie")]
#[command(author = "Kaitu.io")]
#[command(version = "0.1.0")]
#[command(about = "Match addresses against allow/deny prefix lists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the prefix set comes from. Both sources may be combined.
#[derive(clap::Args)]
struct Source {
    /// Prefix list, e.g. "10.0.0.0/8, !10.0.1.0/24"
    #[arg(short, long)]
    prefixes: Option<String>,

    /// YAML or JSON prefix set configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the most specific matching entry for each address
    Match {
        #[command(flatten)]
        source: Source,

        /// Exit with status 1 if any address is denied or unmatched
        #[arg(short, long)]
        strict: bool,

        /// Addresses to check
        #[arg(required = true)]
        addresses: Vec<String>,
    },

    /// Print the canonical entries of the loaded set, one per line
    Normalize {
        #[command(flatten)]
        source: Source,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Match {
            source,
            strict,
            addresses,
        } => match_addresses(&source, &addresses).map(|all_allowed| {
            if strict && !all_allowed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }),
        Commands::Normalize { source } => normalize(&source).map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_set(source: &Source) -> Result<PrefixSet, Box<dyn std::error::Error>> {
    let mut set = match &source.config {
        Some(path) => {
            log::info!("Loading prefix set from {:?}", path);
            PrefixSetConfig::load(path)?.build()?
        }
        None => PrefixSet::new(),
    };
    if let Some(list) = &source.prefixes {
        set.add_list(list)?;
    }

    if set.is_empty() {
        log::warn!("Prefix set is empty; every address is unmatched");
    }
    Ok(set)
}

/// Returns whether every address was allowed.
fn match_addresses(source: &Source, addresses: &[String]) -> Result<bool, Box<dyn std::error::Error>> {
    let set = load_set(source)?;

    let mut all_allowed = true;
    for text in addresses {
        let address: Endpoint = text.parse()?;
        match set.lookup(&address) {
            Some((prefix, positive)) => {
                let verdict = if positive { "allow" } else { "deny" };
                println!("{}\t{}\t{}", text, prefix, verdict);
                all_allowed &= positive;
            }
            None => {
                println!("{}\tnone", text);
                all_allowed = false;
            }
        }
    }
    Ok(all_allowed)
}

fn normalize(source: &Source) -> Result<(), Box<dyn std::error::Error>> {
    let set = load_set(source)?;
    for entry in set.to_string_vec() {
        println!("{}", entry);
    }
    Ok(())
}
