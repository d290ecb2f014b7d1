//! loadbroker - carrier rate negotiation for freight brokerage
//!
//! Given a load's posted board rate, a carrier's offer and the negotiation
//! attempt number, loadbroker decides whether to accept, counter at a computed
//! rate, or walk away. Around that core sit the desk collaborators a carrier
//! call needs: a load board, a carrier eligibility registry and a post-call
//! analytics relay.
//!
//! loadbroker can be used in two ways:
//! - **CLI**: run `loadbroker negotiate`, `simulate`, `search-loads`,
//!   `verify-carrier`, `record-call` or `config`
//! - **Library**: embed the [`NegotiationOrchestrator`] in your own service
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # One round against an explicit board rate
//! loadbroker negotiate --board-rate 2000 --offer 2500
//!
//! # Play a fixed offer against a posted load until the negotiation ends
//! loadbroker simulate --load-id L1001 --offer 2500 --json
//!
//! # Show the effective configuration and where each value came from
//! loadbroker config
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust
//! use loadbroker::{NegotiationOrchestrator, NegotiationPolicy, NegotiationRound, Status};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let orchestrator = NegotiationOrchestrator::new(NegotiationPolicy::default());
//! let decision = orchestrator
//!     .negotiate(NegotiationRound::new(2000.0, 1500.0, 1))
//!     .await
//!     .unwrap();
//! assert_eq!(decision.status, Status::Counter);
//! assert_eq!(decision.target_rate, 1600.0);
//! # });
//! ```
//!
//! # Stable Public API
//!
//! - [`NegotiationOrchestrator`], [`NegotiationPolicy`], [`evaluate`] - the decision engine
//! - [`Config`] and [`ConfigBuilder`] - configuration management
//! - [`LoadBoard`], [`CarrierRegistry`], [`AnalyticsRelay`] - desk collaborators
//! - [`BrokerError`] - library error type
//! - [`ExitCode`] - CLI exit codes

// ============================================================================
// Stable Public API
// ============================================================================

pub use loadbroker_engine::{
    AdvisoryEvaluator, Decision, DecisionProvider, DeterministicEvaluator, NegotiationOrchestrator,
    NegotiationPolicy, NegotiationRound, OfferRequest, Proposal, RateSource, RoundOutcome, Status,
    evaluate, format_dollars, orchestrator_from_config, round_rate,
};

pub use loadbroker_config::{CliArgs, Config, ConfigBuilder, ConfigSource, LoadRecord};

pub use loadbroker_desk::{
    AnalyticsRelay, CallAnalytics, CarrierRegistry, CarrierVerification, Load, LoadBoard,
    LoadQuery, VerificationStatus,
};

pub use loadbroker_utils::error::{
    BrokerError, ConfigError, DeskError, ErrorCategory, LlmError, NegotiationError,
    UserFriendlyError,
};

pub use loadbroker_utils::exit_codes::ExitCode;

// ============================================================================
// Module re-exports for direct access
// ============================================================================

pub use loadbroker_config as config;
pub use loadbroker_desk as desk;
pub use loadbroker_engine as engine;
pub use loadbroker_llm as llm;
pub use loadbroker_utils::{logging, redaction};

pub mod cli;
pub mod error_reporter;
