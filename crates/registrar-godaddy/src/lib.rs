// # GoDaddy Registrar
//
// This crate provides a GoDaddy domains API implementation of the
// `Registrar` trait.
//
// ## Behavior
//
// - One HTTP request per trait call
// - Every failure is classified into a `TransportErrorKind` and returned
// - The registrar's error message is carried verbatim, so callers can
//   reinterpret specific outcomes (e.g. "Domain is invalid")
// - 30 second HTTP timeout
// - No retries, backoff or caching: waiting for convergence is owned by the
//   orchestrator's poller
// - No background tasks
//
// ## Security Requirements
//
// - API key and secret NEVER appear in logs or `Debug` output
// - Construction fails fast if either credential is empty
//
// ## API Reference
//
// - Domain detail: GET `/v1/domains/{domain}`
// - Availability: POST `/v1/domains/available`
// - Price quote: GET `/v1/domains/available?domain={domain}&checkType=FULL`
// - Purchase: POST `/v1/domains/purchase`
// - Renew: POST `/v1/domains/{domain}/renew`
// - Cancel: DELETE `/v1/domains/{domain}`
// - Records page: GET `/v1/domains/{domain}/records?limit={n}&offset={page}`
// - Replace records of a type: PUT `/v1/domains/{domain}/records/{type}`
// - Replace name servers: PATCH `/v1/domains/{domain}`

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use registrar_core::config::RegistrarConfig;
use registrar_core::traits::{Registrar, RegistrarFactory};
use registrar_core::{
    ContactInfo, DomainName, DomainRecord, DomainStatusReport, Error, RecordType, Result,
    TransportErrorKind,
};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Registrar name used in logs and the registry
const REGISTRAR_NAME: &str = "godaddy";

/// Agreement accepted on every purchase (domain name registration agreement)
const PURCHASE_AGREEMENT_KEY: &str = "DNRA";

/// Delegation assigned at purchase time; replaced later through `replace_name_servers`
pub const DEFAULT_PURCHASE_NAME_SERVERS: [&str; 2] =
    ["ns27.domaincontrol.com", "ns28.domaincontrol.com"];

/// GoDaddy domains API client
///
/// Stateless and single-shot; all coordination belongs to the
/// `LifecycleOrchestrator`.
///
/// # Security
///
/// The Debug implementation does NOT expose the API key or secret.
pub struct GoDaddyRegistrar {
    /// ⚠️ NEVER log this value
    api_key: String,

    /// ⚠️ NEVER log this value
    api_secret: String,

    /// API endpoint without trailing slash
    base_url: String,

    /// Reseller sub-account, sent as `X-Shopper-Id`
    shopper_id: Option<String>,

    client: reqwest::Client,
}

impl std::fmt::Debug for GoDaddyRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoDaddyRegistrar")
            .field("api_key", &"<REDACTED>")
            .field("api_secret", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("shopper_id", &self.shopper_id)
            .finish()
    }
}

impl GoDaddyRegistrar {
    /// Create a new GoDaddy registrar
    ///
    /// # Errors
    ///
    /// `Error::Config` if a credential is empty or the HTTP client cannot be
    /// built.
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        base_url: impl Into<String>,
        shopper_id: Option<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        let api_secret = api_secret.into();

        if api_key.is_empty() || api_secret.is_empty() {
            return Err(Error::config("GoDaddy API key and secret are required"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            api_secret,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            shopper_id: shopper_id.filter(|id| !id.is_empty()),
            client,
        })
    }

    /// Build an authenticated request for `path` (starting with `/v1/`)
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(
                "Authorization",
                format!("sso-key {}:{}", self.api_key, self.api_secret),
            )
            .header("Accept", "application/json");

        if let Some(shopper_id) = &self.shopper_id {
            builder = builder.header("X-Shopper-Id", shopper_id);
        }

        builder
    }

    /// Send a request and return the body of a successful response
    async fn execute(&self, builder: RequestBuilder, action: &str) -> Result<String> {
        tracing::debug!("[{}] {}", REGISTRAR_NAME, action);

        let response = builder.send().await.map_err(|e| {
            let reason = if e.is_timeout() { "timed out" } else { "failed" };
            Error::unavailable(format!("{} {}: {}", action, reason, e))
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::unavailable(format!("{}: failed to read response: {}", action, e)))?;

        tracing::debug!("[{}] {} -> HTTP {}", REGISTRAR_NAME, action, status);

        if (200..300).contains(&status) {
            Ok(body)
        } else {
            Err(classify(status, &body))
        }
    }

    /// Send a request and decode the JSON body of a successful response
    async fn execute_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        action: &str,
    ) -> Result<T> {
        let body = self.execute(builder, action).await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::malformed(format!("{}: unexpected response: {}", action, e)))
    }
}

/// Map a non-success HTTP status to a transport error
///
/// The registrar's own message is kept verbatim.
fn classify(status: u16, body: &str) -> Error {
    let kind = match status {
        401 | 403 => TransportErrorKind::Unauthorized,
        404 => TransportErrorKind::NotFound,
        429 => TransportErrorKind::RateLimited,
        500..=599 => TransportErrorKind::Unavailable,
        _ => TransportErrorKind::Malformed,
    };

    if kind == TransportErrorKind::RateLimited {
        tracing::warn!("[{}] Rate limited (HTTP 429)", REGISTRAR_NAME);
    }

    Error::registrar(kind, error_message(status, body))
}

/// GoDaddy error bodies look like `{"code": "...", "message": "..."}`
fn error_message(status: u16, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(message),
        }) => message,
        _ if body.trim().is_empty() => format!("HTTP {}", status),
        _ => body.trim().to_string(),
    }
}

/// Price of a `term_years` registration given a quote covering `period` years
///
/// `None` for a zero period or a result that does not fit in `u64`.
fn scale_quote(price: u64, period: u32, term_years: u32) -> Option<u64> {
    if period == 0 {
        return None;
    }
    if period == term_years {
        return Some(price);
    }
    let total = u128::from(price) * u128::from(term_years) / u128::from(period);
    u64::try_from(total).ok()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DomainDetail {
    status: String,
    #[serde(default)]
    expires: Option<String>,
    #[serde(default)]
    name_servers: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct AvailableBulk {
    #[serde(default)]
    domains: Vec<AvailableEntry>,
}

#[derive(Debug, Deserialize)]
struct AvailableEntry {
    available: bool,
    /// Micro-units of the account currency, for `period` years
    #[serde(default)]
    price: Option<u64>,
    #[serde(default)]
    period: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Consent {
    agreement_keys: Vec<&'static str>,
    agreed_by: String,
    agreed_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PurchaseRequest<'a> {
    domain: &'a str,
    consent: Consent,
    contact_admin: &'a ContactInfo,
    contact_billing: &'a ContactInfo,
    contact_registrant: &'a ContactInfo,
    contact_tech: &'a ContactInfo,
    name_servers: [&'static str; 2],
    period: u32,
    privacy: bool,
    renew_auto: bool,
}

impl<'a> PurchaseRequest<'a> {
    fn new(domain: &'a DomainName, term_years: u32, contact: &'a ContactInfo) -> Self {
        Self {
            domain: domain.as_str(),
            consent: Consent {
                agreement_keys: vec![PURCHASE_AGREEMENT_KEY],
                agreed_by: contact.full_name(),
                agreed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            },
            contact_admin: contact,
            contact_billing: contact,
            contact_registrant: contact,
            contact_tech: contact,
            name_servers: DEFAULT_PURCHASE_NAME_SERVERS,
            period: term_years,
            privacy: false,
            renew_auto: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct RenewRequest {
    period: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NameServersPatch<'a> {
    name_servers: &'a [String],
}

#[async_trait]
impl Registrar for GoDaddyRegistrar {
    async fn get_domain_status(&self, domain: &DomainName) -> Result<DomainStatusReport> {
        let detail: DomainDetail = self
            .execute_json(
                self.request(Method::GET, &format!("/v1/domains/{}", domain)),
                &format!("GET domain {}", domain),
            )
            .await?;

        Ok(DomainStatusReport {
            status: detail.status.into(),
            expires: detail.expires,
            name_servers: detail.name_servers.unwrap_or_default(),
        })
    }

    async fn check_availability(&self, domains: &[DomainName]) -> Result<bool> {
        if domains.is_empty() {
            return Err(Error::invalid_input("Availability check needs at least one domain"));
        }

        let names: Vec<&str> = domains.iter().map(DomainName::as_str).collect();
        let bulk: AvailableBulk = self
            .execute_json(
                self.request(Method::POST, "/v1/domains/available?checkType=FAST")
                    .json(&names),
                &format!("POST availability {}", names.join(",")),
            )
            .await?;

        bulk.domains
            .first()
            .map(|entry| entry.available)
            .ok_or_else(|| Error::malformed("Availability response listed no domains"))
    }

    async fn get_price_quote(&self, domain: &DomainName, term_years: u32) -> Result<u64> {
        let entry: AvailableEntry = self
            .execute_json(
                self.request(
                    Method::GET,
                    &format!("/v1/domains/available?domain={}&checkType=FULL", domain),
                ),
                &format!("GET price {}", domain),
            )
            .await?;

        let price = entry
            .price
            .ok_or_else(|| Error::malformed(format!("No price quoted for {}", domain)))?;
        let period = entry.period.unwrap_or(1);
        let quote = scale_quote(price, period, term_years).ok_or_else(|| {
            Error::malformed(format!(
                "Cannot scale quote of {} for {} year(s) to a {} year term",
                price, period, term_years
            ))
        })?;
        tracing::debug!(
            "[{}] {} quoted at {} micro-units per {} year(s), {} for {} year(s)",
            REGISTRAR_NAME,
            domain,
            price,
            period,
            quote,
            term_years
        );
        Ok(quote)
    }

    async fn purchase(
        &self,
        domain: &DomainName,
        term_years: u32,
        contact: &ContactInfo,
    ) -> Result<()> {
        let body = PurchaseRequest::new(domain, term_years, contact);
        self.execute(
            self.request(Method::POST, "/v1/domains/purchase").json(&body),
            &format!("POST purchase {}", domain),
        )
        .await?;

        tracing::info!("[{}] Purchase of {} accepted", REGISTRAR_NAME, domain);
        Ok(())
    }

    async fn renew(&self, domain: &DomainName, term_years: u32) -> Result<()> {
        self.execute(
            self.request(Method::POST, &format!("/v1/domains/{}/renew", domain))
                .json(&RenewRequest { period: term_years }),
            &format!("POST renew {}", domain),
        )
        .await?;

        tracing::info!("[{}] Renewal of {} accepted", REGISTRAR_NAME, domain);
        Ok(())
    }

    async fn cancel(&self, domain: &DomainName) -> Result<()> {
        self.execute(
            self.request(Method::DELETE, &format!("/v1/domains/{}", domain)),
            &format!("DELETE domain {}", domain),
        )
        .await?;

        tracing::info!("[{}] Cancellation of {} accepted", REGISTRAR_NAME, domain);
        Ok(())
    }

    async fn list_records_page(
        &self,
        domain: &DomainName,
        limit: u32,
        offset_page: u32,
    ) -> Result<Vec<DomainRecord>> {
        self.execute_json(
            self.request(
                Method::GET,
                &format!(
                    "/v1/domains/{}/records?limit={}&offset={}",
                    domain, limit, offset_page
                ),
            ),
            &format!("GET records {} page {}", domain, offset_page),
        )
        .await
    }

    async fn replace_records_of_type(
        &self,
        domain: &DomainName,
        record_type: RecordType,
        records: &[DomainRecord],
    ) -> Result<()> {
        if records.is_empty() {
            return Err(Error::invalid_input(format!(
                "Refusing to replace {} records of {} with an empty set",
                record_type, domain
            )));
        }
        if let Some(stray) = records.iter().find(|r| r.record_type != record_type) {
            return Err(Error::invalid_input(format!(
                "{} record '{}' submitted with the {} group",
                stray.record_type, stray.name, record_type
            )));
        }

        self.execute(
            self.request(
                Method::PUT,
                &format!("/v1/domains/{}/records/{}", domain, record_type),
            )
            .json(records),
            &format!("PUT {} records {}", record_type, domain),
        )
        .await?;
        Ok(())
    }

    async fn replace_name_servers(
        &self,
        domain: &DomainName,
        name_servers: &[String],
    ) -> Result<()> {
        self.execute(
            self.request(Method::PATCH, &format!("/v1/domains/{}", domain))
                .json(&NameServersPatch { name_servers }),
            &format!("PATCH name servers {}", domain),
        )
        .await?;
        Ok(())
    }

    fn registrar_name(&self) -> &'static str {
        REGISTRAR_NAME
    }
}

/// Factory for creating GoDaddy registrars
pub struct GoDaddyFactory;

impl RegistrarFactory for GoDaddyFactory {
    fn create(&self, config: &RegistrarConfig) -> Result<Box<dyn Registrar>> {
        match config {
            RegistrarConfig::GoDaddy {
                api_key,
                api_secret,
                base_url,
                shopper_id,
            } => Ok(Box::new(GoDaddyRegistrar::new(
                api_key.clone(),
                api_secret.clone(),
                base_url.clone(),
                shopper_id.clone(),
            )?)),
            _ => Err(Error::config("Invalid config for GoDaddy registrar")),
        }
    }
}

/// Register the GoDaddy registrar with a registry
///
/// # Example
///
/// ```rust
/// use registrar_core::RegistrarRegistry;
///
/// let registry = RegistrarRegistry::new();
/// registrar_godaddy::register(&registry);
/// assert!(registry.has_registrar("godaddy"));
/// ```
pub fn register(registry: &registrar_core::RegistrarRegistry) {
    registry.register_registrar(REGISTRAR_NAME, Box::new(GoDaddyFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registrar(server: &MockServer) -> GoDaddyRegistrar {
        GoDaddyRegistrar::new("key", "secret", server.uri(), Some("4242".into())).unwrap()
    }

    fn example() -> DomainName {
        DomainName::parse("example.com").unwrap()
    }

    fn contact() -> ContactInfo {
        serde_json::from_value(json!({
            "nameFirst": "Ada",
            "nameLast": "Lovelace",
            "email": "ada@example.com",
            "phone": "+1.5555550100",
            "addressMailing": {
                "address1": "1 Analytical Way",
                "city": "London",
                "state": "London",
                "postalCode": "N1",
                "country": "GB"
            }
        }))
        .unwrap()
    }

    #[test]
    fn status_codes_map_to_transport_kinds() {
        let cases = [
            (401, TransportErrorKind::Unauthorized),
            (403, TransportErrorKind::Unauthorized),
            (404, TransportErrorKind::NotFound),
            (422, TransportErrorKind::Malformed),
            (429, TransportErrorKind::RateLimited),
            (500, TransportErrorKind::Unavailable),
            (503, TransportErrorKind::Unavailable),
        ];
        for (status, kind) in cases {
            assert_eq!(classify(status, "").transport_kind(), Some(kind), "HTTP {}", status);
        }
    }

    #[test]
    fn registrar_message_is_verbatim() {
        let err = classify(422, r#"{"code":"INVALID_BODY","message":"Domain is invalid"}"#);
        assert_eq!(err.to_string(), "Registrar error (malformed): Domain is invalid");

        assert_eq!(error_message(502, "  Bad gateway \n"), "Bad gateway");
        assert_eq!(error_message(502, ""), "HTTP 502");
    }

    #[test]
    fn debug_output_hides_credentials() {
        let registrar =
            GoDaddyRegistrar::new("key-123", "secret-456", "https://api.ote-godaddy.com/", None)
                .unwrap();
        let debug = format!("{:?}", registrar);

        assert!(!debug.contains("key-123"));
        assert!(!debug.contains("secret-456"));
        assert!(debug.contains("https://api.ote-godaddy.com\""));
    }

    #[test]
    fn empty_credentials_are_rejected() {
        assert!(GoDaddyRegistrar::new("", "secret", "https://api.godaddy.com", None).is_err());
        assert!(GoDaddyRegistrar::new("key", "", "https://api.godaddy.com", None).is_err());
    }

    #[test]
    fn factory_builds_from_godaddy_config_only() {
        assert!(GoDaddyFactory.create(&RegistrarConfig::godaddy("key", "secret")).is_ok());

        let custom = RegistrarConfig::Custom {
            factory: "other".into(),
            config: json!({}),
        };
        assert!(GoDaddyFactory.create(&custom).is_err());
    }

    #[test]
    fn register_adds_godaddy() {
        let registry = registrar_core::RegistrarRegistry::new();
        register(&registry);

        let registrar = registry
            .create_registrar(&RegistrarConfig::godaddy("key", "secret"))
            .unwrap();
        assert_eq!(registrar.registrar_name(), "godaddy");
    }

    #[tokio::test]
    async fn domain_status_is_read_with_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/domains/example.com"))
            .and(header("Authorization", "sso-key key:secret"))
            .and(header("X-Shopper-Id", "4242"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "domain": "example.com",
                "status": "ACTIVE",
                "expires": "2027-03-01T12:00:00.000Z",
                "nameServers": ["ns1.example.net", "ns2.example.net"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let report = registrar(&server).get_domain_status(&example()).await.unwrap();

        assert!(report.status.is_active());
        assert_eq!(report.expires.as_deref(), Some("2027-03-01T12:00:00.000Z"));
        assert_eq!(report.name_servers.len(), 2);
    }

    #[tokio::test]
    async fn error_statuses_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/domains/gone.com"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "NOT_FOUND",
                "message": "Domain gone.com not found"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/domains/invalid.com"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "code": "INVALID_BODY",
                "message": "Domain is invalid"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/domains/busy.com"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let registrar = registrar(&server);
        assert!(status_error(&registrar, "gone.com").await.is_not_found());

        let invalid = status_error(&registrar, "invalid.com").await;
        assert_eq!(invalid.transport_kind(), Some(TransportErrorKind::Malformed));
        assert!(invalid.to_string().ends_with("Domain is invalid"));

        assert_eq!(
            status_error(&registrar, "busy.com").await.transport_kind(),
            Some(TransportErrorKind::RateLimited)
        );
    }

    async fn status_error(registrar: &GoDaddyRegistrar, name: &str) -> Error {
        registrar
            .get_domain_status(&DomainName::parse(name).unwrap())
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn undecodable_success_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/domains/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = registrar(&server)
            .get_domain_status(&example())
            .await
            .unwrap_err();
        assert_eq!(err.transport_kind(), Some(TransportErrorKind::Malformed));
    }

    #[tokio::test]
    async fn unreachable_registrar_is_unavailable() {
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };
        let registrar = GoDaddyRegistrar::new("key", "secret", uri, None).unwrap();
        let err = registrar.cancel(&example()).await.unwrap_err();
        assert_eq!(err.transport_kind(), Some(TransportErrorKind::Unavailable));
    }

    #[tokio::test]
    async fn availability_reads_the_first_entry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/domains/available"))
            .and(body_json(json!(["example.com"])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "domains": [{"domain": "example.com", "available": true, "price": 10690000}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert!(registrar(&server)
            .check_availability(&[example()])
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn price_quote_is_in_micro_units() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/domains/available"))
            .and(query_param("domain", "example.com"))
            .and(query_param("checkType", "FULL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "domain": "example.com",
                "available": true,
                "price": 11990000,
                "currency": "USD"
            })))
            .mount(&server)
            .await;

        let price = registrar(&server)
            .get_price_quote(&example(), 1)
            .await
            .unwrap();
        assert_eq!(price, 11_990_000);
    }

    #[tokio::test]
    async fn multi_year_quote_covers_the_whole_term() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/domains/available"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "domain": "example.com",
                "available": true,
                "price": 11990000,
                "currency": "USD",
                "period": 1
            })))
            .mount(&server)
            .await;

        let quote = registrar(&server)
            .get_price_quote(&example(), 5)
            .await
            .unwrap();
        assert_eq!(quote, 59_950_000);
        assert!(registrar_core::policy::check_price(quote, 12).is_err());
    }

    #[tokio::test]
    async fn zero_period_quote_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/domains/available"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "available": true,
                "price": 11990000,
                "period": 0
            })))
            .mount(&server)
            .await;

        let err = registrar(&server)
            .get_price_quote(&example(), 2)
            .await
            .unwrap_err();
        assert_eq!(err.transport_kind(), Some(TransportErrorKind::Malformed));
    }

    #[test]
    fn quotes_scale_with_the_term() {
        assert_eq!(scale_quote(10_000_000, 1, 1), Some(10_000_000));
        assert_eq!(scale_quote(10_000_000, 1, 3), Some(30_000_000));
        assert_eq!(scale_quote(20_000_000, 2, 1), Some(10_000_000));
        assert_eq!(scale_quote(10_000_000, 0, 1), None);
        assert_eq!(scale_quote(u64::MAX, 1, 2), None);
    }

    #[tokio::test]
    async fn purchase_sends_consent_and_one_contact_for_every_role() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/domains/purchase"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "orderId": 1, "itemCount": 1, "total": 10690000
            })))
            .expect(1)
            .mount(&server)
            .await;

        registrar(&server)
            .purchase(&example(), 2, &contact())
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = requests[0].body_json().unwrap();

        assert_eq!(body["domain"], "example.com");
        assert_eq!(body["period"], 2);
        assert_eq!(body["renewAuto"], false);
        assert_eq!(body["privacy"], false);
        assert_eq!(body["consent"]["agreementKeys"], json!(["DNRA"]));
        assert_eq!(body["consent"]["agreedBy"], "Ada Lovelace");
        assert!(body["consent"]["agreedAt"].as_str().unwrap().ends_with('Z'));
        for role in ["contactAdmin", "contactBilling", "contactRegistrant", "contactTech"] {
            assert_eq!(body[role]["email"], "ada@example.com", "{}", role);
        }
    }

    #[tokio::test]
    async fn renew_and_cancel_hit_domain_paths() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/domains/example.com/renew"))
            .and(body_json(json!({"period": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"orderId": 2})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/domains/example.com"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let registrar = registrar(&server);
        registrar.renew(&example(), 1).await.unwrap();
        registrar.cancel(&example()).await.unwrap();
    }

    #[tokio::test]
    async fn records_are_paged_and_replaced_per_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/domains/example.com/records"))
            .and(query_param("limit", "500"))
            .and(query_param("offset", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "@", "type": "MX", "data": "mx.example.net", "priority": 10, "ttl": 3600}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v1/domains/example.com/records/MX"))
            .and(body_json(json!([
                {"name": "@", "type": "MX", "data": "mx.example.net", "priority": 10}
            ])))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let registrar = registrar(&server);
        let page = registrar
            .list_records_page(&example(), 500, 2)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].record_type, RecordType::Mx);
        assert_eq!(page[0].ttl, Some(3600));

        let mx = DomainRecord::new("@", RecordType::Mx, "mx.example.net").with_priority(10);
        registrar
            .replace_records_of_type(&example(), RecordType::Mx, &[mx])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn mismatched_or_empty_groups_are_never_sent() {
        let server = MockServer::start().await;
        let registrar = registrar(&server);

        let a = DomainRecord::new("@", RecordType::A, "192.0.2.1");
        assert!(registrar
            .replace_records_of_type(&example(), RecordType::Mx, &[a])
            .await
            .is_err());
        assert!(registrar
            .replace_records_of_type(&example(), RecordType::Mx, &[])
            .await
            .is_err());

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn name_servers_are_patched() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v1/domains/example.com"))
            .and(body_json(json!({"nameServers": ["ns1.example.net", "ns2.example.net"]})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        registrar(&server)
            .replace_name_servers(
                &example(),
                &["ns1.example.net".to_string(), "ns2.example.net".to_string()],
            )
            .await
            .unwrap();
    }
}
