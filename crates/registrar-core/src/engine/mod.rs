//! Lifecycle orchestrator
//!
//! The LifecycleOrchestrator is responsible for:
//! - Purchasing absent domains once availability and price checks pass
//! - Renewing domains whose expiry falls inside their renewal window
//! - Replacing DNS records one type at a time
//! - Replacing name server delegations
//! - Releasing (cancelling) domains
//!
//! ## Architecture
//!
//! ```text
//!                       ┌───────────────────────┐
//!    DomainRequest ───▶ │ LifecycleOrchestrator │ ───▶ LifecycleEvent
//!                       └───────────────────────┘
//!                                   │
//!          ┌────────────────────────┼────────────────────────┐
//!          │                        │                        │
//!          ▼                        ▼                        ▼
//! ┌────────────────┐     ┌───────────────────┐     ┌───────────────────┐
//! │ policy         │     │ Registrar         │     │ ConvergencePoller │
//! │ (expiry/price) │     │ (single-shot I/O) │     │ (wait for reads)  │
//! └────────────────┘     └───────────────────┘     └───────────────────┘
//! ```
//!
//! ## Failure semantics
//!
//! Validation and business-rule failures are returned immediately and never
//! retried. The only waiting happens inside the poller, for writes that have
//! not yet become visible in the registrar's read path. Registrar errors are
//! propagated untranslated.

use std::slice;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::OrchestratorConfig;
use crate::error::{Error, Result};
use crate::model::{ContactInfo, DomainName, DomainStatus, ManagedDomain};
use crate::pagination::{Page, collect_all};
use crate::policy::{RenewalMode, check_price, evaluate_mode_at, parse_expiry};
use crate::poller::{CancelSignal, Clock, ConvergencePoller};
use crate::records::{DomainRecord, RecordType, RecordTypePolicy, partition};
use crate::traits::Registrar;

/// Registrars refuse delegations with fewer name servers than this
pub const MIN_NAME_SERVERS: usize = 2;

/// Longest term a registrar accepts for one purchase or renewal
pub const MAX_TERM_YEARS: u32 = 10;

/// Events emitted by the LifecycleOrchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Purchase request accepted by the registrar
    PurchaseIssued {
        domain: DomainName,
        term_years: u32,
        quoted_micros: u64,
    },

    /// Renewal request accepted by the registrar
    RenewalIssued {
        domain: DomainName,
        term_years: u32,
        previous_expiry: DateTime<Utc>,
    },

    /// Expiry outside the renewal window (or renewal disabled)
    RenewalSkipped {
        domain: DomainName,
        expires: DateTime<Utc>,
    },

    /// A purchase or renewal became visible
    Converged {
        domain: DomainName,
        expires: DateTime<Utc>,
    },

    /// All records of one type were replaced
    RecordGroupApplied {
        domain: DomainName,
        record_type: RecordType,
        records: usize,
    },

    /// Delegation replaced
    NameServersReplaced {
        domain: DomainName,
        name_servers: Vec<String>,
    },

    /// Cancellation request accepted by the registrar
    CancellationIssued { domain: DomainName },

    /// An operation failed
    OperationFailed {
        domain: DomainName,
        operation: &'static str,
        error: String,
    },
}

/// What the caller wants for one domain's registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRequest {
    pub domain: DomainName,
    /// Term for purchase and renewal
    pub term_years: u32,
    /// Price ceiling in whole currency units
    pub max_price: u64,
    /// Renewal threshold in days; negative disables renewal, zero is rejected
    pub min_days_remaining: i64,
    /// Contact used for every registrant role on purchase
    pub contact: ContactInfo,
}

impl DomainRequest {
    /// Validate the request
    pub fn validate(&self) -> Result<()> {
        if self.min_days_remaining == 0 {
            return Err(Error::invalid_input(format!(
                "min_days_remaining for {} must be negative (never renew) or positive, not 0",
                self.domain
            )));
        }

        if !(1..=MAX_TERM_YEARS).contains(&self.term_years) {
            return Err(Error::invalid_input(format!(
                "Term for {} must be between 1 and {} years, got {}",
                self.domain, MAX_TERM_YEARS, self.term_years
            )));
        }

        self.contact.validate()
    }
}

/// Status and parsed expiry observed by a check
#[derive(Debug, Clone, PartialEq, Eq)]
struct Observed {
    status: DomainStatus,
    expires: Option<DateTime<Utc>>,
}

/// Drives lifecycle operations against a registrar to completion
///
/// ## Threading
///
/// Each operation runs on the caller's task with no internal fan-out.
/// Operations on different domains may run concurrently; operations on the
/// same domain must be serialized by the caller.
///
/// ## Event Backpressure
///
/// Events go through a bounded channel. When it is full, new events are
/// dropped with a warning instead of stalling reconciliation.
pub struct LifecycleOrchestrator {
    /// Remote registrar
    registrar: Arc<dyn Registrar>,

    /// Waits for writes to become visible
    poller: ConvergencePoller,

    /// Page size for record listings
    listing_page_size: u32,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<LifecycleEvent>,
}

impl LifecycleOrchestrator {
    /// Create a new orchestrator
    ///
    /// # Returns
    ///
    /// A tuple of (orchestrator, event_receiver) where event_receiver yields
    /// lifecycle events
    pub fn new(
        registrar: Arc<dyn Registrar>,
        clock: Arc<dyn Clock>,
        config: &OrchestratorConfig,
    ) -> Result<(Self, mpsc::Receiver<LifecycleEvent>)> {
        config.validate()?;

        let poller = ConvergencePoller::new(clock, config.poll.backoff_policy())?;
        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let orchestrator = Self {
            registrar,
            poller,
            listing_page_size: config.listing_page_size,
            event_tx: tx,
        };

        Ok((orchestrator, rx))
    }

    /// Abort convergence waits when `signal` fires
    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.poller = self.poller.with_cancel(signal);
        self
    }

    /// The registrar this orchestrator drives
    pub fn registrar(&self) -> &dyn Registrar {
        self.registrar.as_ref()
    }

    /// Current time according to the injected clock
    pub fn now(&self) -> DateTime<Utc> {
        self.poller.clock().now()
    }

    /// Make sure `request.domain` is registered and outside its renewal window
    ///
    /// `existing` is the last known state of the domain, or `None` if it is
    /// not registered yet. An absent domain is purchased after availability
    /// and price checks; an existing one is renewed when it carries
    /// `pending_renewal` or its expiry falls inside the renewal window. Both
    /// paths wait until the registrar reports the change.
    pub async fn ensure_domain(
        &self,
        request: &DomainRequest,
        existing: Option<&ManagedDomain>,
    ) -> Result<ManagedDomain> {
        let result = self.ensure_domain_inner(request, existing).await;
        self.report("ensure_domain", &request.domain, result)
    }

    async fn ensure_domain_inner(
        &self,
        request: &DomainRequest,
        existing: Option<&ManagedDomain>,
    ) -> Result<ManagedDomain> {
        request.validate()?;

        let Some(existing) = existing else {
            return self.purchase(request).await;
        };

        if existing.domain != request.domain {
            return Err(Error::invalid_input(format!(
                "Managed state is for {}, request is for {}",
                existing.domain, request.domain
            )));
        }

        let mode = if existing.pending_renewal {
            debug!("{} was flagged for renewal on its last read", request.domain);
            RenewalMode::Renew
        } else {
            evaluate_mode_at(existing.expires, request.min_days_remaining, self.now())
        };

        match mode {
            RenewalMode::Renew => self.renew(request, existing.expires).await,
            RenewalMode::Skip => {
                debug!(
                    "{} expires {}, outside the {}-day window",
                    request.domain, existing.expires, request.min_days_remaining
                );
                self.emit_event(LifecycleEvent::RenewalSkipped {
                    domain: request.domain.clone(),
                    expires: existing.expires,
                });
                Ok(ManagedDomain {
                    domain: request.domain.clone(),
                    expires: existing.expires,
                    min_days_remaining: request.min_days_remaining,
                    term_years: request.term_years,
                    pending_renewal: false,
                })
            }
        }
    }

    async fn purchase(&self, request: &DomainRequest) -> Result<ManagedDomain> {
        let domain = &request.domain;

        let available = self
            .registrar
            .check_availability(slice::from_ref(domain))
            .await?;
        if !available {
            return Err(Error::NotAvailable(domain.to_string()));
        }

        let quoted = self
            .registrar
            .get_price_quote(domain, request.term_years)
            .await?;
        check_price(quoted, request.max_price)?;

        self.registrar
            .purchase(domain, request.term_years, &request.contact)
            .await?;
        info!(
            "Purchase of {} for {} year(s) issued via {}",
            domain,
            request.term_years,
            self.registrar.registrar_name()
        );
        self.emit_event(LifecycleEvent::PurchaseIssued {
            domain: domain.clone(),
            term_years: request.term_years,
            quoted_micros: quoted,
        });

        let observed = self
            .poll_observed(domain, |o| o.status.is_active())
            .await
            .map_err(|e| e.into_error(format!("Purchase of {}", domain)))?;

        let expires = observed.expires.ok_or_else(|| {
            Error::malformed(format!("Registrar reported no expiry for active domain {}", domain))
        })?;

        self.converged(domain, expires);
        Ok(ManagedDomain {
            domain: domain.clone(),
            expires,
            min_days_remaining: request.min_days_remaining,
            term_years: request.term_years,
            pending_renewal: false,
        })
    }

    async fn renew(&self, request: &DomainRequest, previous: DateTime<Utc>) -> Result<ManagedDomain> {
        let domain = &request.domain;

        self.registrar.renew(domain, request.term_years).await?;
        info!(
            "Renewal of {} for {} year(s) issued (expires {})",
            domain, request.term_years, previous
        );
        self.emit_event(LifecycleEvent::RenewalIssued {
            domain: domain.clone(),
            term_years: request.term_years,
            previous_expiry: previous,
        });

        let observed = self
            .poll_observed(domain, |o| o.expires.is_some_and(|e| e > previous))
            .await
            .map_err(|e| e.into_error(format!("Renewal of {}", domain)))?;

        // The predicate only holds with an expiry present.
        let expires = observed.expires.unwrap_or(previous);

        self.converged(domain, expires);
        Ok(ManagedDomain {
            domain: domain.clone(),
            expires,
            min_days_remaining: request.min_days_remaining,
            term_years: request.term_years,
            pending_renewal: false,
        })
    }

    /// Re-read a managed domain and evaluate its renewal window
    ///
    /// Sets `pending_renewal` when the refreshed expiry is due. Registrar
    /// errors, including not-found, are returned as-is.
    pub async fn refresh_domain(&self, managed: &ManagedDomain) -> Result<ManagedDomain> {
        self.read(&managed.domain, managed.min_days_remaining, managed.term_years)
            .await
    }

    /// First read of a domain described by `request`
    ///
    /// Same as [`refresh_domain`](Self::refresh_domain) for a domain with no
    /// prior managed state. A domain the registrar does not know yields a
    /// not-found error, which callers treat as absent.
    pub async fn read_domain(&self, request: &DomainRequest) -> Result<ManagedDomain> {
        request.validate()?;
        self.read(&request.domain, request.min_days_remaining, request.term_years)
            .await
    }

    async fn read(
        &self,
        domain: &DomainName,
        min_days_remaining: i64,
        term_years: u32,
    ) -> Result<ManagedDomain> {
        let observed = observe(self.registrar.as_ref(), domain).await?;

        let expires = observed.expires.ok_or_else(|| {
            Error::malformed(format!(
                "Registrar reported {} with no expiry for {}",
                observed.status, domain
            ))
        })?;
        let mode = evaluate_mode_at(expires, min_days_remaining, self.now());
        debug!("{} is {} and expires {} ({:?})", domain, observed.status, expires, mode);

        Ok(ManagedDomain {
            domain: domain.clone(),
            expires,
            min_days_remaining,
            term_years,
            pending_renewal: mode == RenewalMode::Renew,
        })
    }

    /// Replace the domain's records, one request per allowed record type
    ///
    /// Groups are applied in order of first appearance of their type. The
    /// first failing group stops the operation and its error is returned;
    /// groups applied before it stay applied.
    ///
    /// # Returns
    ///
    /// The number of groups applied
    pub async fn ensure_records(
        &self,
        domain: &DomainName,
        records: &[DomainRecord],
        policy: &RecordTypePolicy,
    ) -> Result<usize> {
        let result = self.ensure_records_inner(domain, records, policy).await;
        self.report("ensure_records", domain, result)
    }

    async fn ensure_records_inner(
        &self,
        domain: &DomainName,
        records: &[DomainRecord],
        policy: &RecordTypePolicy,
    ) -> Result<usize> {
        let groups = partition(records, policy);
        debug!("{}: {} record group(s) to apply", domain, groups.len());

        for (applied, group) in groups.iter().enumerate() {
            if let Err(e) = self
                .registrar
                .replace_records_of_type(domain, group.record_type, &group.records)
                .await
            {
                warn!(
                    "{}: replacing {} records failed after {} group(s) applied",
                    domain, group.record_type, applied
                );
                return Err(e);
            }

            info!("{}: replaced {} {} record(s)", domain, group.records.len(), group.record_type);
            self.emit_event(LifecycleEvent::RecordGroupApplied {
                domain: domain.clone(),
                record_type: group.record_type,
                records: group.records.len(),
            });
        }

        Ok(groups.len())
    }

    /// Replace the domain's delegation
    ///
    /// Names are normalized before the minimum count is checked. Propagation
    /// is not waited for.
    ///
    /// # Returns
    ///
    /// The normalized name servers that were submitted
    pub async fn ensure_name_servers(
        &self,
        domain: &DomainName,
        name_servers: &[String],
    ) -> Result<Vec<String>> {
        let result = self.ensure_name_servers_inner(domain, name_servers).await;
        self.report("ensure_name_servers", domain, result)
    }

    async fn ensure_name_servers_inner(
        &self,
        domain: &DomainName,
        name_servers: &[String],
    ) -> Result<Vec<String>> {
        let normalized = normalize_name_servers(name_servers);
        if normalized.len() < MIN_NAME_SERVERS {
            return Err(Error::InsufficientNameServers {
                required: MIN_NAME_SERVERS,
                actual: normalized.len(),
            });
        }

        self.registrar.replace_name_servers(domain, &normalized).await?;
        info!("{}: name servers set to {}", domain, normalized.join(", "));
        self.emit_event(LifecycleEvent::NameServersReplaced {
            domain: domain.clone(),
            name_servers: normalized.clone(),
        });

        Ok(normalized)
    }

    /// Cancel the domain's registration without waiting for it to disappear
    pub async fn release_domain(&self, domain: &DomainName) -> Result<()> {
        let result = self.registrar.cancel(domain).await;
        if result.is_ok() {
            info!("Cancellation of {} issued", domain);
            self.emit_event(LifecycleEvent::CancellationIssued {
                domain: domain.clone(),
            });
        }
        self.report("release_domain", domain, result)
    }

    /// Every record of the domain, collected across pages
    pub async fn list_records(&self, domain: &DomainName) -> Result<Vec<DomainRecord>> {
        let registrar = self.registrar.as_ref();
        let result = collect_all(self.listing_page_size, move |page| async move {
            registrar
                .list_records_page(domain, page.limit, page.offset)
                .await
                .map(Page::from)
        })
        .await;
        self.report("list_records", domain, result)
    }

    async fn poll_observed<F>(
        &self,
        domain: &DomainName,
        predicate: F,
    ) -> std::result::Result<Observed, crate::poller::PollError<Observed>>
    where
        F: Fn(&Observed) -> bool,
    {
        let registrar = self.registrar.as_ref();
        self.poller
            .poll_until(|| observe(registrar, domain), predicate)
            .await
    }

    fn converged(&self, domain: &DomainName, expires: DateTime<Utc>) {
        info!("{} converged, expires {}", domain, expires);
        self.emit_event(LifecycleEvent::Converged {
            domain: domain.clone(),
            expires,
        });
    }

    /// Log and publish a failed operation, passing the result through
    fn report<T>(&self, operation: &'static str, domain: &DomainName, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!("{} for {} failed: {}", operation, domain, e);
            self.emit_event(LifecycleEvent::OperationFailed {
                domain: domain.clone(),
                operation,
                error: e.to_string(),
            });
        }
        result
    }

    /// Emit a lifecycle event
    fn emit_event(&self, event: LifecycleEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping lifecycle event. Consider increasing event_channel_capacity.");
        }
    }
}

/// Read status and parse the expiry; a malformed expiry fails the check
async fn observe(registrar: &dyn Registrar, domain: &DomainName) -> Result<Observed> {
    let report = registrar.get_domain_status(domain).await?;
    let expires = report.expires.as_deref().map(parse_expiry).transpose()?;
    Ok(Observed {
        status: report.status,
        expires,
    })
}

/// Trim, drop trailing dots, lowercase and de-duplicate, keeping first occurrences
pub fn normalize_name_servers(name_servers: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(name_servers.len());
    for ns in name_servers {
        let ns = ns.trim().trim_end_matches('.').to_ascii_lowercase();
        if !ns.is_empty() && !normalized.contains(&ns) {
            normalized.push(ns);
        }
    }
    normalized
}
