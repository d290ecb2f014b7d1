//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and the subcommand enum.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// loadbroker - carrier rate negotiation for freight brokerage
#[derive(Parser, Debug)]
#[command(name = "loadbroker")]
#[command(about = "Decide whether to accept, counter or reject a carrier's rate offer")]
#[command(long_about = r#"
loadbroker evaluates a carrier's offer against a load's posted board rate and
decides whether to accept it, counter at a computed rate, or walk away. Each
negotiate call is one round; feed the returned attempts value into the next.

EXAMPLES:
  # One round against an explicit board rate
  loadbroker negotiate --board-rate 2000 --offer 2500

  # Second round for a posted load, JSON output
  loadbroker negotiate --load-id L1001 --offer 2300 --attempt 2 --json

  # Play a fixed offer until the negotiation ends
  loadbroker simulate --board-rate 2000 --offer 2500

  # Find posted loads
  loadbroker search-loads --origin dallas --destination atlanta --equipment-type van

  # Check carrier eligibility
  loadbroker verify-carrier --mc-number 123456

  # Record post-call analytics from a JSON file (or - for stdin)
  loadbroker record-call --file call.json

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is discovered by searching upward from CWD for .loadbroker/config.toml,
  or read from $LOADBROKER_HOME/config.toml
  Use --config to specify an explicit config file path
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Maximum negotiation attempts before a counter turns into a rejection
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Consult the advisory model before the deterministic policy
    #[arg(long, global = true, overrides_with = "no_advisory")]
    pub advisory: bool,

    /// Use the deterministic policy only, even if [advisory] is enabled
    #[arg(long, global = true, overrides_with = "advisory")]
    pub no_advisory: bool,

    /// Model name for the advisory provider
    #[arg(long, global = true)]
    pub advisory_model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Tri-state advisory override: `None` leaves the config file in charge.
    #[must_use]
    pub fn advisory_override(&self) -> Option<bool> {
        if self.advisory {
            Some(true)
        } else if self.no_advisory {
            Some(false)
        } else {
            None
        }
    }
}

/// How a round finds its board rate.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct BoardRateArgs {
    /// Posted load to negotiate (board rate comes from [[loads]])
    #[arg(long)]
    pub load_id: Option<String>,

    /// Explicit board rate in dollars
    #[arg(long)]
    pub board_rate: Option<f64>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decide a single negotiation round
    ///
    /// EXAMPLES:
    ///   loadbroker negotiate --board-rate 2000 --offer 1900
    ///   loadbroker negotiate --load-id L1001 --offer 2500 --attempt 2 --json
    Negotiate {
        #[command(flatten)]
        rate: BoardRateArgs,

        /// Carrier's offer in dollars
        #[arg(long)]
        offer: f64,

        /// 1-based attempt number (the attempts value from the previous round)
        #[arg(long, default_value_t = 1)]
        attempt: u32,

        /// Output the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay a fixed offer round after round until the negotiation ends
    ///
    /// EXAMPLES:
    ///   loadbroker simulate --board-rate 2000 --offer 2500
    ///   loadbroker simulate --load-id L1001 --offer 1500 --json
    Simulate {
        #[command(flatten)]
        rate: BoardRateArgs,

        /// Carrier's offer in dollars, repeated every round
        #[arg(long)]
        offer: f64,

        /// Output rounds and the call summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search the load board
    ///
    /// Terms are case-insensitive substrings and must all match.
    ///
    /// EXAMPLES:
    ///   loadbroker search-loads --origin dallas --destination atlanta --equipment-type van
    SearchLoads {
        #[arg(long)]
        origin: String,

        #[arg(long)]
        destination: String,

        #[arg(long)]
        equipment_type: String,

        /// Maximum number of loads (1-10, default 3)
        #[arg(long)]
        limit: Option<usize>,

        /// Output loads as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a carrier's eligibility by MC number
    ///
    /// Without a registry web key the check answers a mock success.
    VerifyCarrier {
        /// MC number (3 to 7 digits)
        #[arg(long)]
        mc_number: String,

        /// Output the verification as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record post-call analytics
    ///
    /// Reads one JSON object or an array of objects and prints the retained
    /// records.
    ///
    /// EXAMPLES:
    ///   loadbroker record-call --file call.json
    ///   cat calls.json | loadbroker record-call --file - --json
    RecordCall {
        /// JSON file to read, or - for stdin
        #[arg(long)]
        file: PathBuf,

        /// Output the retained records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration and where each value came from
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Operation name used in error reports.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Negotiate { .. } => "negotiate",
            Self::Simulate { .. } => "simulate",
            Self::SearchLoads { .. } => "search-loads",
            Self::VerifyCarrier { .. } => "verify-carrier",
            Self::RecordCall { .. } => "record-call",
            Self::Config { .. } => "config",
        }
    }
}
