use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `BrokerError` is the primary error type returned by loadbroker library operations.
/// It provides:
/// - Detailed error information for programmatic handling
/// - User-friendly messages with context and suggestions
/// - Mapping to CLI exit codes for consistent error reporting
///
/// # Error Categories
///
/// | Category | Description |
/// |----------|-------------|
/// | `Config` | Configuration file or CLI argument errors |
/// | `Negotiation` | Invalid negotiation input or unknown load |
/// | `Llm` | Advisory provider construction failures |
/// | `Desk` | Load board, carrier registry and analytics errors |
/// | `Io` | Filesystem errors |
///
/// # Exit Code Mapping
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration/CLI argument errors |
/// | 3 | Invalid negotiation or query input |
/// | 4 | Unknown load / no matching loads |
/// | 69 | External collaborator unavailable |
/// | 1 | Other errors |
///
/// Advisory provider failures during a negotiation never surface here: the
/// orchestrator falls back to the deterministic policy instead.
///
/// # Example
///
/// ```rust
/// use loadbroker_utils::error::{BrokerError, NegotiationError};
/// use loadbroker_utils::exit_codes::ExitCode;
///
/// let err = BrokerError::from(NegotiationError::invalid_input("board_rate", "must be > 0"));
/// assert_eq!(err.to_exit_code(), ExitCode::INVALID_INPUT);
/// assert!(err.display_for_user().contains("board_rate"));
/// ```
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Negotiation error: {0}")]
    Negotiation(#[from] NegotiationError),

    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("Desk error: {0}")]
    Desk(#[from] DeskError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    InputValidation,
    NotFound,
    Provider,
    Collaborator,
    FileSystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::InputValidation => write!(f, "Input Validation"),
            Self::NotFound => write!(f, "Not Found"),
            Self::Provider => write!(f, "Advisory Provider"),
            Self::Collaborator => write!(f, "External Collaborator"),
            Self::FileSystem => write!(f, "File System"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    #[must_use]
    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => {
                format!("Configuration file not found: {path}")
            }
            Self::DiscoveryFailed { reason } => {
                format!("Failed to discover configuration: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => {
                Some("Configuration files use TOML with [policy], [advisory], [carrier_registry], [logging] and [[loads]] sections.".to_string())
            }
            Self::InvalidValue { .. } => Some(
                "Policy fractions are expressed relative to the board rate (0.10 means 10%)."
                    .to_string(),
            ),
            Self::NotFound { .. } | Self::DiscoveryFailed { .. } => Some(
                "loadbroker searches upward from the current directory for .loadbroker/config.toml."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of the configuration file".to_string(),
                "Run 'loadbroker config' to see the effective configuration".to_string(),
            ],
            Self::InvalidValue { key, .. } => vec![
                format!("Correct the value of '{key}'"),
                "Remove the key to fall back to the built-in default".to_string(),
            ],
            Self::NotFound { .. } => vec![
                "Pass an existing file with --config".to_string(),
                "Set LOADBROKER_HOME to a directory containing config.toml".to_string(),
            ],
            Self::DiscoveryFailed { .. } => {
                vec!["Run loadbroker from a readable working directory".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors raised while validating or resolving a negotiation round.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NegotiationError {
    /// Client-fault input: non-positive rate or offer, attempt out of range.
    #[error("Invalid negotiation input '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    /// The rate source has no board rate for this load.
    #[error("Load '{load_id}' not found")]
    LoadNotFound { load_id: String },
}

impl NegotiationError {
    #[must_use]
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl UserFriendlyError for NegotiationError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidInput { field, reason } => {
                format!("Negotiation input '{field}' is invalid: {reason}")
            }
            Self::LoadNotFound { load_id } => format!("Load ID '{load_id}' not found"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidInput { .. } => Some(
                "Board rate and offer must be positive amounts; attempt is 1-based and capped by the policy."
                    .to_string(),
            ),
            Self::LoadNotFound { .. } => {
                Some("Board rates are resolved from the [[loads]] entries in the configuration.".to_string())
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidInput { .. } => vec![
                "Pass the attempts value returned by the previous round".to_string(),
                "Use --board-rate with a positive amount when no load id is available".to_string(),
            ],
            Self::LoadNotFound { .. } => vec![
                "Run 'loadbroker search-loads' to list available loads".to_string(),
                "Check the load id for typos".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::InputValidation,
            Self::LoadNotFound { .. } => ErrorCategory::NotFound,
        }
    }
}

/// LLM backend errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Budget limit exceeded
    #[error("Budget exceeded: attempted {attempted} calls, limit is {limit}")]
    BudgetExceeded { limit: u32, attempted: u32 },

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Response did not match the expected decision schema
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM invocation timed out after {:?}", duration)
            }
            Self::BudgetExceeded { limit, attempted } => {
                format!(
                    "LLM budget exceeded: attempted {} calls, limit is {}",
                    attempted, limit
                )
            }
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
            Self::InvalidResponse(msg) => format!("LLM returned an unusable decision: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Misconfiguration(_) => Some(
                "The advisory evaluator is optional; negotiations fall back to the deterministic policy."
                    .to_string(),
            ),
            Self::Timeout { .. } => Some(
                "Advisory calls are bounded by [advisory] timeout_secs and are never retried."
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Misconfiguration(_) | Self::ProviderAuth(_) => vec![
                "Check [advisory] api_key_env and that the variable is exported".to_string(),
                "Disable the advisory path with --no-advisory".to_string(),
            ],
            Self::Timeout { .. } => {
                vec!["Increase [advisory] timeout_secs or disable the advisory path".to_string()]
            }
            Self::BudgetExceeded { .. } => {
                vec!["Raise [advisory] budget to allow more advisory calls".to_string()]
            }
            _ => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Misconfiguration(_) => ErrorCategory::Configuration,
            _ => ErrorCategory::Provider,
        }
    }
}

/// Errors from the dispatcher desk collaborators: load board, carrier registry, analytics relay.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeskError {
    #[error("Invalid query parameter '{field}': {reason}")]
    InvalidQuery { field: String, reason: String },

    #[error("No matching loads")]
    NoMatchingLoads,

    #[error("Invalid MC number '{0}': expected 3 to 7 digits")]
    InvalidMcNumber(String),

    #[error("Carrier registry lookup failed: {reason}")]
    RegistryUnavailable { status: Option<u16>, reason: String },

    #[error("Invalid analytics record: {0}")]
    InvalidAnalytics(String),
}

impl DeskError {
    #[must_use]
    pub fn invalid_query(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl UserFriendlyError for DeskError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidQuery { field, reason } => {
                format!("Load search parameter '{field}' is invalid: {reason}")
            }
            Self::NoMatchingLoads => "No loads match the search".to_string(),
            Self::InvalidMcNumber(mc) => format!("'{mc}' is not a valid MC number"),
            Self::RegistryUnavailable { status, reason } => match status {
                Some(code) => format!("Carrier registry returned HTTP {code}: {reason}"),
                None => format!("Carrier registry unreachable: {reason}"),
            },
            Self::InvalidAnalytics(reason) => format!("Analytics record rejected: {reason}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::NoMatchingLoads => Some(
                "Origin, destination and equipment type are matched as case-insensitive substrings."
                    .to_string(),
            ),
            Self::RegistryUnavailable { .. } => Some(
                "Carrier eligibility is checked against the registry configured in [carrier_registry]."
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidQuery { .. } => vec![
                "Search terms need at least 2 characters".to_string(),
                "Limit must be between 1 and 10".to_string(),
            ],
            Self::NoMatchingLoads => vec!["Broaden the origin or destination term".to_string()],
            Self::InvalidMcNumber(_) => vec!["Pass digits only, e.g. --mc-number 123456".to_string()],
            Self::RegistryUnavailable { .. } => vec![
                "Check the web key exported in [carrier_registry] webkey_env".to_string(),
                "Retry once the registry is reachable".to_string(),
            ],
            Self::InvalidAnalytics(_) => {
                vec!["Provide call_outcome and a numeric final_rate".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidQuery { .. } | Self::InvalidMcNumber(_) | Self::InvalidAnalytics(_) => {
                ErrorCategory::InputValidation
            }
            Self::NoMatchingLoads => ErrorCategory::NotFound,
            Self::RegistryUnavailable { .. } => ErrorCategory::Collaborator,
        }
    }
}

impl UserFriendlyError for BrokerError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.user_message(),
            Self::Negotiation(e) => e.user_message(),
            Self::Llm(e) => e.user_message(),
            Self::Desk(e) => e.user_message(),
            Self::Io(e) => format!("File system error: {e}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.context(),
            Self::Negotiation(e) => e.context(),
            Self::Llm(e) => e.context(),
            Self::Desk(e) => e.context(),
            Self::Io(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(e) => e.suggestions(),
            Self::Negotiation(e) => e.suggestions(),
            Self::Llm(e) => e.suggestions(),
            Self::Desk(e) => e.suggestions(),
            Self::Io(_) => vec!["Check file permissions".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(e) => e.category(),
            Self::Negotiation(e) => e.category(),
            Self::Llm(e) => e.category(),
            Self::Desk(e) => e.category(),
            Self::Io(_) => ErrorCategory::FileSystem,
        }
    }
}

impl BrokerError {
    /// Get a user-friendly error message with context and actionable suggestions.
    ///
    /// ```text
    /// Error: <user message>
    ///
    /// Context: <context if available>
    ///
    /// Suggestions:
    ///   • <suggestion 1>
    /// ```
    ///
    /// Secrets are redacted from the rendered text.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error: {}\n", self.user_message()));

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {}\n", ctx));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {}\n", suggestion));
            }
        }

        crate::redaction::redact_secrets(&output)
    }

    /// Map this error to the appropriate CLI exit code.
    ///
    /// This is the single source of truth for CLI exit codes.
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            BrokerError::Config(_) => ExitCode::CLI_ARGS,

            BrokerError::Negotiation(NegotiationError::InvalidInput { .. }) => {
                ExitCode::INVALID_INPUT
            }
            BrokerError::Negotiation(NegotiationError::LoadNotFound { .. }) => ExitCode::NOT_FOUND,

            BrokerError::Llm(LlmError::Misconfiguration(_)) => ExitCode::CLI_ARGS,
            BrokerError::Llm(_) => ExitCode::UNAVAILABLE,

            BrokerError::Desk(desk_err) => match desk_err {
                DeskError::InvalidQuery { .. }
                | DeskError::InvalidMcNumber(_)
                | DeskError::InvalidAnalytics(_) => ExitCode::INVALID_INPUT,
                DeskError::NoMatchingLoads => ExitCode::NOT_FOUND,
                DeskError::RegistryUnavailable { .. } => ExitCode::UNAVAILABLE,
            },

            BrokerError::Io(_) => ExitCode::INTERNAL,
        }
    }
}
