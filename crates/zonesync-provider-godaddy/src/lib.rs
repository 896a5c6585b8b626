// # GoDaddy Zone Provider
//
// This crate provides a GoDaddy Domains API implementation of the
// `ZoneProvider` trait.
//
// ## Behaviour
//
// - One HTTP request per trait call (zone listing pages aside)
// - Full error propagation to the caller, no retry or backoff here
// - HTTP timeout configured (30 seconds)
// - Specific error handling for HTTP status codes (401, 403, 404, 429, 5xx)
// - GoDaddy error bodies are parsed into the error message
// - Dry-run mode: reads go through, writes are only logged
// - Records of types outside `RecordType` are skipped on read
//
// ## Security Requirements
//
// - API key and secret NEVER appear in logs
// - Provider creation fails if either is empty
//
// ## API Reference
//
// - GoDaddy Domains API v1: https://developer.godaddy.com/doc/endpoint/domains
// - List Domains: GET `/v1/domains?statuses=ACTIVE,PENDING_DNS_ACTIVE`
// - List Records: GET `/v1/domains/{domain}/records`
// - Replace Records: PUT `/v1/domains/{domain}/records/{type}/{name}`
// - Delete Records: DELETE `/v1/domains/{domain}/records/{type}/{name}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use zonesync_core::config::ProviderConfig;
use zonesync_core::traits::{ZoneProvider, ZoneProviderFactory};
use zonesync_core::{APEX_NAME, Error, RecordType, Result, Zone, ZoneRecord};

/// GoDaddy production API base URL
pub const GODADDY_API_BASE: &str = "https://api.godaddy.com";

/// GoDaddy OTE (test environment) API base URL
pub const GODADDY_OTE_API_BASE: &str = "https://api.ote-godaddy.com";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Domain statuses whose DNS can be managed
const MANAGED_STATUSES: &str = "ACTIVE,PENDING_DNS_ACTIVE";

/// Page size used when listing domains
const DOMAIN_PAGE_LIMIT: usize = 1000;

const PROVIDER_NAME: &str = "godaddy";

/// A domain as returned by `GET /v1/domains`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GdDomain {
    domain: String,
}

/// A DNS record as returned by `GET /v1/domains/{domain}/records`
#[derive(Debug, Clone, Deserialize)]
struct GdRecord {
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    data: String,
    #[serde(default)]
    ttl: u32,
    #[serde(default)]
    priority: Option<u16>,
    #[serde(default)]
    weight: Option<u16>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    service: Option<String>,
    #[serde(default)]
    protocol: Option<String>,
}

/// A record value in a replace request body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct GdRecordValue {
    data: String,
    ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    protocol: Option<String>,
}

/// GoDaddy error body
#[derive(Debug, Clone, Default, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
struct GdErrorResponse {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    fields: Vec<GdErrorField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GdErrorField {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    path: Option<String>,
}

impl GdErrorResponse {
    /// Human readable description including per-field errors
    fn describe(&self) -> String {
        let mut description = self.to_string();
        for field in &self.fields {
            match &field.path {
                Some(path) => description.push_str(&format!("; {}: {} ({})", path, field.message, field.code)),
                None => description.push_str(&format!("; {} ({})", field.message, field.code)),
            }
        }
        description
    }
}

/// GoDaddy zone provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (domains, records)
/// - Log the intended PUT / DELETE requests
/// - **NOT** actually modify DNS records
///
/// # Security
///
/// The Debug implementation does NOT expose the API key or secret.
pub struct GoDaddyProvider {
    /// API key, never logged
    api_key: String,

    /// API secret, never logged
    api_secret: String,

    /// Shopper ID for reseller accounts
    shopper_id: Option<String>,

    /// API base URL without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip writes
    dry_run: bool,
}

impl std::fmt::Debug for GoDaddyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoDaddyProvider")
            .field("api_key", &"<REDACTED>")
            .field("api_secret", &"<REDACTED>")
            .field("shopper_id", &self.shopper_id)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl GoDaddyProvider {
    /// Create a new GoDaddy provider against the production API
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the key or secret is empty
    /// - `Error::Http` if the HTTP client cannot be built
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>, dry_run: bool) -> Result<Self> {
        let api_key = api_key.into();
        let api_secret = api_secret.into();

        if api_key.is_empty() {
            return Err(Error::config("GoDaddy API key cannot be empty"));
        }
        if api_secret.is_empty() {
            return Err(Error::config("GoDaddy API secret cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            api_secret,
            shopper_id: None,
            base_url: GODADDY_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Point the provider at another API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use the OTE test environment
    pub fn with_ote(self) -> Self {
        self.with_base_url(GODADDY_OTE_API_BASE)
    }

    /// Act on behalf of a reseller's shopper
    pub fn with_shopper_id(mut self, shopper_id: Option<String>) -> Self {
        self.shopper_id = shopper_id.filter(|id| !id.is_empty());
        self
    }

    /// Whether writes are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// API base URL in use
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Authorization", format!("sso-key {}:{}", self.api_key, self.api_secret))
            .header("Accept", "application/json");
        if let Some(shopper_id) = &self.shopper_id {
            request = request.header("X-Shopper-Id", shopper_id);
        }
        request
    }

    fn records_path(zone: &Zone, record_type: RecordType, name: &str) -> String {
        format!("/v1/domains/{}/records/{}/{}", zone.domain, record_type, name)
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("{}: request failed: {}", context, e)))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        let detail = serde_json::from_str::<GdErrorResponse>(&body)
            .map(|e| e.describe())
            .unwrap_or(body);

        // Map HTTP status codes to specific errors
        Err(match status.as_u16() {
            401 | 403 => Error::auth(format!(
                "{}: invalid API key or insufficient permissions. Status: {} - {}",
                context, status, detail
            )),
            404 => Error::not_found(format!("{}: {}", context, detail)),
            429 => Error::rate_limited(format!("{}: {}", context, detail)),
            500..=599 => Error::provider(
                PROVIDER_NAME,
                format!("{}: server error (transient): {} - {}", context, status, detail),
            ),
            _ => Error::provider(PROVIDER_NAME, format!("{}: {} - {}", context, status, detail)),
        })
    }
}

#[async_trait]
impl ZoneProvider for GoDaddyProvider {
    /// List managed domains, following `marker` pagination
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let mut zones = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let limit = DOMAIN_PAGE_LIMIT.to_string();
            let mut query = vec![("statuses", MANAGED_STATUSES), ("limit", limit.as_str())];
            if let Some(marker) = &marker {
                query.push(("marker", marker.as_str()));
            }

            let request = self.request(Method::GET, "/v1/domains").query(&query);
            let page: Vec<GdDomain> = self
                .send(request, "list domains")
                .await?
                .json()
                .await
                .map_err(|e| Error::provider(PROVIDER_NAME, format!("Failed to parse domains: {}", e)))?;

            let last = page.last().map(|d| d.domain.clone());
            if marker.is_some() && last == marker {
                tracing::warn!("GoDaddy ignored the domain page marker, stopping at {} domain(s)", zones.len());
                break;
            }

            let full_page = page.len() >= DOMAIN_PAGE_LIMIT;
            zones.extend(page.into_iter().map(|d| Zone::new(d.domain)));
            marker = last;

            if !full_page {
                break;
            }
        }

        tracing::debug!("GoDaddy lists {} domain(s)", zones.len());
        Ok(zones)
    }

    async fn list_records(&self, zone: &Zone) -> Result<Vec<ZoneRecord>> {
        let request = self.request(Method::GET, &format!("/v1/domains/{}/records", zone.domain));
        let records: Vec<GdRecord> = self
            .send(request, &format!("list records of {}", zone))
            .await?
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("Failed to parse records of {}: {}", zone, e)))?;

        let mut result = Vec::with_capacity(records.len());
        for record in records {
            let record_type = match record.record_type.parse::<RecordType>() {
                Ok(record_type) => record_type,
                Err(_) => {
                    tracing::debug!(
                        "Skipping {} record {} in {}",
                        record.record_type,
                        record.name,
                        zone
                    );
                    continue;
                }
            };
            result.push(ZoneRecord::new(
                record_name(&record),
                record_type,
                record.ttl,
                record_data(record_type, &record),
            ));
        }

        Ok(result)
    }

    async fn replace_record_set(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
        records: &[ZoneRecord],
    ) -> Result<()> {
        if records.is_empty() {
            tracing::debug!("Replacing {} ({}) in {} with nothing, deleting instead", name, record_type, zone);
            return self.delete_record_set(zone, name, record_type).await;
        }

        let path = Self::records_path(zone, record_type, name);
        let body = records
            .iter()
            .map(|r| record_value(name, record_type, r))
            .collect::<Result<Vec<_>>>()?;

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                path,
                serde_json::to_string(&body)?
            );
            return Ok(());
        }

        tracing::info!("Replacing {} ({}) in {} with {} record(s)", name, record_type, zone, body.len());
        let request = self.request(Method::PUT, &path).json(&body);
        self.send(request, &format!("replace {} ({}) in {}", name, record_type, zone))
            .await?;
        Ok(())
    }

    async fn delete_record_set(&self, zone: &Zone, name: &str, record_type: RecordType) -> Result<()> {
        let path = Self::records_path(zone, record_type, name);

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send DELETE request to {}", path);
            return Ok(());
        }

        tracing::info!("Deleting {} ({}) in {}", name, record_type, zone);
        let request = self.request(Method::DELETE, &path);
        self.send(request, &format!("delete {} ({}) in {}", name, record_type, zone))
            .await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Zone-relative name of a record, with SRV service and protocol prepended
fn record_name(record: &GdRecord) -> String {
    let (Some(service), Some(protocol)) = (&record.service, &record.protocol) else {
        return record.name.clone();
    };
    let prefix = format!("{}.{}", service, protocol);
    if record.name == prefix || record.name.starts_with(&format!("{}.", prefix)) {
        record.name.clone()
    } else if record.name.is_empty() || record.name == APEX_NAME {
        prefix
    } else {
        format!("{}.{}", prefix, record.name)
    }
}

/// Record value in zone-file order
///
/// GoDaddy keeps MX preference and SRV priority, weight and port in separate
/// fields; they are folded in front of the target.
fn record_data(record_type: RecordType, record: &GdRecord) -> String {
    match record_type {
        RecordType::Mx => match record.priority {
            Some(priority) => format!("{} {}", priority, record.data),
            None => record.data.clone(),
        },
        RecordType::Srv => format!(
            "{} {} {} {}",
            record.priority.unwrap_or(0),
            record.weight.unwrap_or(0),
            record.port.unwrap_or(0),
            record.data
        ),
        _ => record.data.clone(),
    }
}

/// Wire value for one record, splitting MX and SRV values back into fields
fn record_value(name: &str, record_type: RecordType, record: &ZoneRecord) -> Result<GdRecordValue> {
    let mut value = GdRecordValue {
        data: record.data.clone(),
        ttl: record.ttl,
        ..Default::default()
    };

    match record_type {
        RecordType::Mx => {
            let (preference, host) = record
                .data
                .split_once(' ')
                .and_then(|(p, host)| Some((p.parse::<u16>().ok()?, host.trim())))
                .ok_or_else(|| {
                    Error::invalid_input(format!(
                        "MX value for {} must be \"<preference> <host>\", got \"{}\"",
                        name, record.data
                    ))
                })?;
            value.priority = Some(preference);
            value.data = host.to_string();
        }
        RecordType::Srv => {
            let fields: Vec<&str> = record.data.split_whitespace().collect();
            let parsed = match fields.as_slice() {
                [priority, weight, port, target] => {
                    match (priority.parse::<u16>(), weight.parse::<u16>(), port.parse::<u16>()) {
                        (Ok(priority), Ok(weight), Ok(port)) => Some((priority, weight, port, *target)),
                        _ => None,
                    }
                }
                _ => None,
            };
            let (priority, weight, port, target) = parsed.ok_or_else(|| {
                Error::invalid_input(format!(
                    "SRV value for {} must be \"<priority> <weight> <port> <target>\", got \"{}\"",
                    name, record.data
                ))
            })?;

            let mut labels = name.splitn(3, '.');
            if let (Some(service), Some(protocol)) = (labels.next(), labels.next())
                && service.starts_with('_')
                && protocol.starts_with('_')
            {
                value.service = Some(service.to_string());
                value.protocol = Some(protocol.to_string());
            }
            value.priority = Some(priority);
            value.weight = Some(weight);
            value.port = Some(port);
            value.data = target.to_string();
        }
        _ => {}
    }

    Ok(value)
}

/// Factory for creating GoDaddy providers
pub struct GoDaddyFactory;

impl ZoneProviderFactory for GoDaddyFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneProvider>> {
        match config {
            ProviderConfig::GoDaddy {
                api_key,
                api_secret,
                ote,
                shopper_id,
                dry_run,
            } => {
                if *dry_run {
                    tracing::warn!("GoDaddy provider running in DRY-RUN mode - no changes will be made");
                }

                let mut provider = GoDaddyProvider::new(api_key.clone(), api_secret.clone(), *dry_run)?
                    .with_shopper_id(shopper_id.clone());
                if *ote {
                    provider = provider.with_ote();
                }

                Ok(Box::new(provider))
            }
            _ => Err(Error::config("Invalid config for GoDaddy provider")),
        }
    }
}

/// Register the GoDaddy provider with a registry
///
/// # Example
///
/// ```rust
/// use zonesync_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// zonesync_provider_godaddy::register(&registry);
/// assert!(registry.has_provider("godaddy"));
/// ```
pub fn register(registry: &zonesync_core::ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(GoDaddyFactory));
}
