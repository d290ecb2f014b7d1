//! Carrier eligibility lookup against the FMCSA docket registry
//!
//! Without a web key the registry answers a mock success so the desk works
//! offline.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use loadbroker_config::{
    Config, DEFAULT_REGISTRY_BASE_URL, DEFAULT_REGISTRY_TIMEOUT_SECS, DEFAULT_REGISTRY_WEBKEY_ENV,
};
use loadbroker_utils::error::DeskError;
use loadbroker_utils::redaction::redact_secrets;

static MC_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3,7}$").expect("valid regex"));

const MOCK_CARRIER_NAME: &str = "Demo Carrier Inc.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// No web key configured
    MockSuccess,
    Success,
    NotFound,
}

impl VerificationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MockSuccess => "MOCK_SUCCESS",
            Self::Success => "SUCCESS",
            Self::NotFound => "NOT_FOUND",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierVerification {
    pub mc_number: String,
    pub eligible: bool,
    pub status: VerificationStatus,
    pub carrier_name: Option<String>,
}

/// Check that `mc_number` is 3 to 7 ASCII digits.
///
/// # Errors
///
/// `DeskError::InvalidMcNumber` otherwise.
pub fn validate_mc_number(mc_number: &str) -> Result<(), DeskError> {
    if MC_NUMBER.is_match(mc_number) {
        Ok(())
    } else {
        Err(DeskError::InvalidMcNumber(mc_number.to_string()))
    }
}

pub struct CarrierRegistry {
    client: Client,
    base_url: String,
    webkey: Option<String>,
}

impl CarrierRegistry {
    /// # Errors
    ///
    /// `DeskError::RegistryUnavailable` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        webkey: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DeskError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeskError::RegistryUnavailable {
                status: None,
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            webkey: webkey.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Registry from `[carrier_registry]`; the web key is read from the
    /// environment variable named there.
    ///
    /// # Errors
    ///
    /// See [`CarrierRegistry::new`].
    pub fn from_config(config: &Config) -> Result<Self, DeskError> {
        let section = &config.carrier_registry;
        let env_var = section
            .webkey_env
            .as_deref()
            .unwrap_or(DEFAULT_REGISTRY_WEBKEY_ENV);
        let webkey = std::env::var(env_var).ok();
        if webkey.is_none() {
            debug!(env_var, "No registry web key; carrier checks are mocked");
        }

        Self::new(
            section
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_REGISTRY_BASE_URL.to_string()),
            webkey,
            Duration::from_secs(
                section
                    .timeout_secs
                    .unwrap_or(DEFAULT_REGISTRY_TIMEOUT_SECS),
            ),
        )
    }

    #[must_use]
    pub fn is_mock(&self) -> bool {
        self.webkey.is_none()
    }

    /// Look up a carrier by MC number.
    ///
    /// # Errors
    ///
    /// - `DeskError::InvalidMcNumber` for malformed numbers
    /// - `DeskError::RegistryUnavailable` for transport failures, non-200
    ///   responses or unreadable bodies
    pub async fn verify(&self, mc_number: &str) -> Result<CarrierVerification, DeskError> {
        validate_mc_number(mc_number)?;

        let Some(webkey) = &self.webkey else {
            return Ok(CarrierVerification {
                mc_number: mc_number.to_string(),
                eligible: true,
                status: VerificationStatus::MockSuccess,
                carrier_name: Some(MOCK_CARRIER_NAME.to_string()),
            });
        };

        let url = format!("{}/{}?webKey={}", self.base_url, mc_number, webkey);
        let response = self.client.get(&url).send().await.map_err(|e| {
            let reason = redact_secrets(&e.to_string());
            warn!(mc_number, %reason, "Carrier registry request failed");
            DeskError::RegistryUnavailable {
                status: None,
                reason,
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(mc_number, status = status.as_u16(), "Carrier registry returned an error");
            return Err(DeskError::RegistryUnavailable {
                status: Some(status.as_u16()),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| DeskError::RegistryUnavailable {
                status: Some(status.as_u16()),
                reason: format!("unreadable response body: {e}"),
            })?;

        let carriers = carrier_entries(&body);
        let carrier_name = carriers.first().and_then(|entry| legal_name(entry));
        let eligible = !carriers.is_empty();

        Ok(CarrierVerification {
            mc_number: mc_number.to_string(),
            eligible,
            status: if eligible {
                VerificationStatus::Success
            } else {
                VerificationStatus::NotFound
            },
            carrier_name,
        })
    }
}

/// Entries of a registry response: either a bare list or `{"content": [...]}`.
fn carrier_entries(body: &Value) -> &[Value] {
    match body {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("content")
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice),
        _ => &[],
    }
}

fn legal_name(entry: &Value) -> Option<String> {
    entry
        .get("legalName")
        .or_else(|| entry.get("carrier").and_then(|c| c.get("legalName")))
        .and_then(Value::as_str)
        .map(str::to_string)
}
