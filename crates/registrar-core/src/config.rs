//! Configuration types for the reconciliation engine
//!
//! This module defines the orchestrator settings, the registrar selection and
//! the desired-state manifest that drives a reconciliation run.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::engine::DomainRequest;
use crate::model::{ContactInfo, DomainName};
use crate::poller::BackoffPolicy;
use crate::records::{DomainRecord, RecordTypePolicy};

/// Production GoDaddy API endpoint
pub const DEFAULT_GODADDY_BASE_URL: &str = "https://api.godaddy.com";

/// Main orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Registrar adapter selection
    pub registrar: RegistrarConfig,

    /// Convergence polling schedule
    #[serde(default)]
    pub poll: PollConfig,

    /// Page size for record listings
    #[serde(default = "default_listing_page_size")]
    pub listing_page_size: u32,

    /// Capacity of the lifecycle event channel
    ///
    /// When full, new events are dropped (with a warning log) so that a slow
    /// consumer never stalls reconciliation.
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl OrchestratorConfig {
    /// Create a configuration with default polling for `registrar`
    pub fn new(registrar: RegistrarConfig) -> Self {
        Self {
            registrar,
            poll: PollConfig::default(),
            listing_page_size: default_listing_page_size(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Replace the polling schedule
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.registrar.validate()?;
        self.poll.backoff_policy().validate()?;

        if self.listing_page_size == 0 {
            return Err(crate::Error::config("Listing page size must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }
}

/// Registrar adapter configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistrarConfig {
    /// GoDaddy domains API
    #[serde(rename = "godaddy")]
    GoDaddy {
        /// API key
        api_key: String,
        /// API secret
        api_secret: String,
        /// API endpoint (production or OTE)
        #[serde(default = "default_godaddy_base_url")]
        base_url: String,
        /// Reseller sub-account to act on behalf of
        #[serde(default)]
        shopper_id: Option<String>,
    },

    /// Custom registrar
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl RegistrarConfig {
    /// GoDaddy configuration against the production endpoint
    pub fn godaddy(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        RegistrarConfig::GoDaddy {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            base_url: default_godaddy_base_url(),
            shopper_id: None,
        }
    }

    /// Validate the registrar configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            RegistrarConfig::GoDaddy {
                api_key,
                api_secret,
                base_url,
                ..
            } => {
                if api_key.is_empty() {
                    return Err(crate::Error::config("GoDaddy API key cannot be empty"));
                }
                if api_secret.is_empty() {
                    return Err(crate::Error::config("GoDaddy API secret cannot be empty"));
                }
                if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                    return Err(crate::Error::config(format!(
                        "GoDaddy base URL must be http(s), got '{}'",
                        base_url
                    )));
                }
                Ok(())
            }
            RegistrarConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom registrar factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom registrar config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the registrar type name
    pub fn type_name(&self) -> &str {
        match self {
            RegistrarConfig::GoDaddy { .. } => "godaddy",
            RegistrarConfig::Custom { factory, .. } => factory,
        }
    }
}

impl std::fmt::Debug for RegistrarConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrarConfig::GoDaddy {
                base_url,
                shopper_id,
                ..
            } => f
                .debug_struct("GoDaddy")
                .field("api_key", &"<redacted>")
                .field("api_secret", &"<redacted>")
                .field("base_url", base_url)
                .field("shopper_id", shopper_id)
                .finish(),
            RegistrarConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .finish_non_exhaustive(),
        }
    }
}

/// Convergence polling schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Wait after the first unconverged check (milliseconds)
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,

    /// Growth factor between waits
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Cap on a single wait (milliseconds)
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    /// Maximum check invocations
    #[serde(default = "default_max_attempts")]
    pub max_attempts: Option<u32>,

    /// Maximum total wait (seconds)
    #[serde(default = "default_max_elapsed_secs")]
    pub max_elapsed_secs: Option<u64>,
}

impl PollConfig {
    /// The backoff policy described by this configuration
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial_interval: Duration::from_millis(self.initial_interval_ms),
            multiplier: self.multiplier,
            max_interval: Some(Duration::from_millis(self.max_interval_ms)),
            max_attempts: self.max_attempts,
            max_elapsed: self.max_elapsed_secs.map(Duration::from_secs),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: default_initial_interval_ms(),
            multiplier: default_multiplier(),
            max_interval_ms: default_max_interval_ms(),
            max_attempts: default_max_attempts(),
            max_elapsed_secs: default_max_elapsed_secs(),
        }
    }
}

/// The set of domains a reconciliation run should converge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesiredStateManifest {
    pub domains: Vec<DesiredDomain>,
}

impl DesiredStateManifest {
    /// Parse a manifest from JSON text
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        let manifest: Self = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load a manifest from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Validate every entry; a domain may appear only once
    pub fn validate(&self) -> Result<(), crate::Error> {
        let mut seen = HashSet::new();
        for desired in &self.domains {
            if !seen.insert(&desired.domain) {
                return Err(crate::Error::config(format!(
                    "Domain '{}' appears more than once in the manifest",
                    desired.domain
                )));
            }
            desired.request()?;
        }
        Ok(())
    }
}

/// Desired state of one domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesiredDomain {
    pub domain: DomainName,

    /// Term for purchases and renewals
    #[serde(default = "default_purchase_years")]
    pub purchase_years: u32,

    /// Renewal threshold in days; negative disables renewal
    #[serde(default = "default_min_days_remaining")]
    pub min_days_remaining: i64,

    /// Price ceiling in whole currency units
    pub max_price: u64,

    /// Registrant contact, used for every role
    pub contact: ContactInfo,

    #[serde(default)]
    pub name_servers: Option<Vec<String>>,

    #[serde(default)]
    pub records: Option<Vec<DomainRecord>>,

    /// Defaults to every type except SOA
    #[serde(default)]
    pub record_policy: Option<RecordTypePolicy>,
}

impl DesiredDomain {
    /// The validated orchestrator request for this entry
    pub fn request(&self) -> Result<DomainRequest, crate::Error> {
        let request = DomainRequest {
            domain: self.domain.clone(),
            term_years: self.purchase_years,
            max_price: self.max_price,
            min_days_remaining: self.min_days_remaining,
            contact: self.contact.clone(),
        };
        request.validate()?;
        Ok(request)
    }

    /// Effective record policy
    pub fn policy(&self) -> RecordTypePolicy {
        self.record_policy.clone().unwrap_or_default()
    }
}

fn default_godaddy_base_url() -> String {
    DEFAULT_GODADDY_BASE_URL.to_string()
}

fn default_listing_page_size() -> u32 {
    500
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_initial_interval_ms() -> u64 {
    500
}

fn default_multiplier() -> f64 {
    1.5
}

fn default_max_interval_ms() -> u64 {
    60_000
}

fn default_max_attempts() -> Option<u32> {
    Some(20)
}

fn default_max_elapsed_secs() -> Option<u64> {
    Some(900)
}

fn default_purchase_years() -> u32 {
    1
}

fn default_min_days_remaining() -> i64 {
    30
}
