//! Configuration types for zonesync
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

use crate::zone::DomainFilter;

/// Default TTL applied to endpoints that carry TTL 0
pub const DEFAULT_TTL: u32 = 600;

/// Main zonesync configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Zones this adapter may observe or mutate
    #[serde(default)]
    pub domain_filter: DomainFilter,

    /// TTL handling for written records
    #[serde(default)]
    pub ttl: TtlPolicy,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SyncConfig {
    /// Create a configuration for the given provider with defaults elsewhere
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            domain_filter: DomainFilter::default(),
            ttl: TtlPolicy::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Restrict the adapter to the given domain filter
    pub fn with_domain_filter(mut self, domain_filter: DomainFilter) -> Self {
        self.domain_filter = domain_filter;
        self
    }

    /// Set the TTL policy
    pub fn with_ttl(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.ttl.validate()?;

        if self.engine.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// GoDaddy Domains API
    #[serde(rename = "godaddy")]
    GoDaddy {
        /// API key
        api_key: String,
        /// API secret
        api_secret: String,
        /// Use the OTE (test) environment
        #[serde(default)]
        ote: bool,
        /// Shopper ID for reseller accounts
        #[serde(default)]
        shopper_id: Option<String>,
        /// Read normally but only log writes
        #[serde(default)]
        dry_run: bool,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::GoDaddy {
                api_key,
                api_secret,
                ..
            } => {
                if api_key.is_empty() {
                    return Err(crate::Error::config("GoDaddy API key cannot be empty"));
                }
                if api_secret.is_empty() {
                    return Err(crate::Error::config("GoDaddy API secret cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::GoDaddy { .. } => "godaddy",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::GoDaddy {
            api_key: String::new(),
            api_secret: String::new(),
            ote: false,
            shopper_id: None,
            dry_run: false,
        }
    }
}

/// TTL applied when expanding endpoints into records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlPolicy {
    /// TTL used when an endpoint carries TTL 0
    #[serde(default = "default_ttl")]
    pub default_ttl: u32,

    /// Lowest TTL the provider accepts; smaller values are raised to it
    #[serde(default)]
    pub min_ttl: u32,
}

impl TtlPolicy {
    /// Create a policy
    pub fn new(default_ttl: u32, min_ttl: u32) -> Self {
        Self {
            default_ttl,
            min_ttl,
        }
    }

    /// TTL written for an endpoint TTL
    pub fn effective(&self, ttl: u32) -> u32 {
        let ttl = if ttl == 0 { self.default_ttl } else { ttl };
        ttl.max(self.min_ttl)
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.default_ttl == 0 {
            return Err(crate::Error::config("Default TTL must be > 0"));
        }
        Ok(())
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            default_ttl: default_ttl(),
            min_ttl: 0,
        }
    }
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    1000
}
