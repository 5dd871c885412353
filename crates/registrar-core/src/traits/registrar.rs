// # Registrar Trait
//
// Defines the capability interface the orchestrator drives.
//
// ## Implementations
//
// - GoDaddy: `registrar-godaddy` crate
// - Tests: scripted doubles under `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use registrar_core::{DomainName, Registrar};
//
// async fn show(registrar: &dyn Registrar) -> registrar_core::Result<()> {
//     let domain = DomainName::parse("example.com")?;
//     let report = registrar.get_domain_status(&domain).await?;
//     println!("{} expires {:?}", report.status, report.expires);
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::config::RegistrarConfig;
use crate::model::{ContactInfo, DomainName, DomainStatusReport};
use crate::records::{DomainRecord, RecordType};

/// Remote registrar capability interface
///
/// # Single-shot
///
/// Every method performs exactly one registrar request and reports its
/// outcome. Implementations must not:
/// - retry, back off or sleep (owned by the `ConvergencePoller`)
/// - cache registrar state between calls
/// - spawn tasks
/// - translate business outcomes into different error kinds
///
/// Failures are reported as [`Error::Registrar`](crate::Error::Registrar)
/// with a [`TransportErrorKind`](crate::TransportErrorKind); the
/// orchestrator propagates them untouched.
///
/// # Read-only methods
///
/// `get_domain_status` and `list_records_page` are used as convergence
/// checks and must be free of side effects.
#[async_trait]
pub trait Registrar: Send + Sync {
    /// Current status and expiry of a domain owned by the account
    async fn get_domain_status(&self, domain: &DomainName) -> crate::Result<DomainStatusReport>;

    /// Whether the first of `domains` can be purchased
    async fn check_availability(&self, domains: &[DomainName]) -> crate::Result<bool>;

    /// Price in micro-units for registering `domain` for `term_years`
    async fn get_price_quote(&self, domain: &DomainName, term_years: u32) -> crate::Result<u64>;

    /// Register `domain` for `term_years` on behalf of `contact`
    async fn purchase(
        &self,
        domain: &DomainName,
        term_years: u32,
        contact: &ContactInfo,
    ) -> crate::Result<()>;

    /// Extend the registration of `domain` by `term_years`
    async fn renew(&self, domain: &DomainName, term_years: u32) -> crate::Result<()>;

    /// Cancel the registration of `domain`
    async fn cancel(&self, domain: &DomainName) -> crate::Result<()>;

    /// One page of the domain's records; `offset_page` is 1-based
    async fn list_records_page(
        &self,
        domain: &DomainName,
        limit: u32,
        offset_page: u32,
    ) -> crate::Result<Vec<DomainRecord>>;

    /// Replace every record of `record_type` with `records`
    async fn replace_records_of_type(
        &self,
        domain: &DomainName,
        record_type: RecordType,
        records: &[DomainRecord],
    ) -> crate::Result<()>;

    /// Replace the delegation of `domain`
    async fn replace_name_servers(
        &self,
        domain: &DomainName,
        name_servers: &[String],
    ) -> crate::Result<()>;

    /// Registrar name for logging (e.g. "godaddy")
    fn registrar_name(&self) -> &'static str;
}

/// Helper trait for constructing registrars from configuration
pub trait RegistrarFactory: Send + Sync {
    /// Create a Registrar instance from configuration
    fn create(&self, config: &RegistrarConfig) -> crate::Result<Box<dyn Registrar>>;
}
