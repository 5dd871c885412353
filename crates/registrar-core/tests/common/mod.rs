//! Test doubles and common utilities for contract tests
//!
//! The scripted registrar records every call it receives and answers from
//! canned responses, so tests can assert exactly which registrar requests an
//! operation issued and in what order. Time is simulated with `ManualClock`.

#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use registrar_core::config::{OrchestratorConfig, PollConfig, RegistrarConfig};
use registrar_core::error::{Error, Result, TransportErrorKind};
use registrar_core::policy::format_expiry;
use registrar_core::{
    ContactInfo, DomainName, DomainRecord, DomainRequest, DomainStatus, DomainStatusReport,
    LifecycleEvent, LifecycleOrchestrator, ManagedDomain, ManualClock, RecordType, Registrar,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// One request received by the scripted registrar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Status(String),
    Availability(Vec<String>),
    Quote(String, u32),
    Purchase { domain: String, term_years: u32, email: String },
    Renew(String, u32),
    Cancel(String),
    ListPage { limit: u32, offset: u32 },
    ReplaceRecords(RecordType, usize),
    ReplaceNameServers(Vec<String>),
}

/// Registrar double answering from scripts
pub struct ScriptedRegistrar {
    calls: Mutex<Vec<Call>>,
    /// Status answers in order; the last one repeats
    statuses: Mutex<VecDeque<DomainStatusReport>>,
    status_failure: Option<TransportErrorKind>,
    available: bool,
    price_micros: u64,
    /// Record pages by 1-based offset; past the end is empty
    pages: Vec<Vec<DomainRecord>>,
    failing_record_type: Option<RecordType>,
    status_call_count: Arc<AtomicUsize>,
}

impl ScriptedRegistrar {
    /// A registrar where everything is available at 10.69 units
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            statuses: Mutex::new(VecDeque::new()),
            status_failure: None,
            available: true,
            price_micros: 10_690_000,
            pages: Vec::new(),
            failing_record_type: None,
            status_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue status answers
    pub fn with_statuses(self, statuses: Vec<DomainStatusReport>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    /// Make every status read fail
    pub fn with_status_failure(mut self, kind: TransportErrorKind) -> Self {
        self.status_failure = Some(kind);
        self
    }

    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    pub fn with_price_micros(mut self, price: u64) -> Self {
        self.price_micros = price;
        self
    }

    pub fn with_pages(mut self, pages: Vec<Vec<DomainRecord>>) -> Self {
        self.pages = pages;
        self
    }

    /// Reject replacement of one record type with a rate limit error
    pub fn failing_on(mut self, record_type: RecordType) -> Self {
        self.failing_record_type = Some(record_type);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls matching `pred`
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn status_call_count(&self) -> usize {
        self.status_call_count.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl Registrar for ScriptedRegistrar {
    async fn get_domain_status(&self, domain: &DomainName) -> Result<DomainStatusReport> {
        self.record(Call::Status(domain.to_string()));
        self.status_call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(kind) = self.status_failure {
            return Err(Error::registrar(kind, "Domain is invalid"));
        }

        let mut statuses = self.statuses.lock().unwrap();
        let report = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        report.ok_or_else(|| Error::not_found(format!("Domain {} not found", domain)))
    }

    async fn check_availability(&self, domains: &[DomainName]) -> Result<bool> {
        self.record(Call::Availability(
            domains.iter().map(|d| d.to_string()).collect(),
        ));
        Ok(self.available)
    }

    async fn get_price_quote(&self, domain: &DomainName, term_years: u32) -> Result<u64> {
        self.record(Call::Quote(domain.to_string(), term_years));
        Ok(self.price_micros)
    }

    async fn purchase(
        &self,
        domain: &DomainName,
        term_years: u32,
        contact: &ContactInfo,
    ) -> Result<()> {
        self.record(Call::Purchase {
            domain: domain.to_string(),
            term_years,
            email: contact.email.clone(),
        });
        Ok(())
    }

    async fn renew(&self, domain: &DomainName, term_years: u32) -> Result<()> {
        self.record(Call::Renew(domain.to_string(), term_years));
        Ok(())
    }

    async fn cancel(&self, domain: &DomainName) -> Result<()> {
        self.record(Call::Cancel(domain.to_string()));
        Ok(())
    }

    async fn list_records_page(
        &self,
        _domain: &DomainName,
        limit: u32,
        offset_page: u32,
    ) -> Result<Vec<DomainRecord>> {
        self.record(Call::ListPage {
            limit,
            offset: offset_page,
        });
        Ok(self
            .pages
            .get(offset_page as usize - 1)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_records_of_type(
        &self,
        _domain: &DomainName,
        record_type: RecordType,
        records: &[DomainRecord],
    ) -> Result<()> {
        self.record(Call::ReplaceRecords(record_type, records.len()));
        if self.failing_record_type == Some(record_type) {
            return Err(Error::rate_limited(format!("Too many {} updates", record_type)));
        }
        Ok(())
    }

    async fn replace_name_servers(
        &self,
        _domain: &DomainName,
        name_servers: &[String],
    ) -> Result<()> {
        self.record(Call::ReplaceNameServers(name_servers.to_vec()));
        Ok(())
    }

    fn registrar_name(&self) -> &'static str {
        "scripted"
    }
}

/// Fixed starting instant for every test
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub fn manual_clock() -> ManualClock {
    ManualClock::new(start())
}

pub fn domain(name: &str) -> DomainName {
    DomainName::parse(name).unwrap()
}

pub fn contact() -> ContactInfo {
    serde_json::from_value(serde_json::json!({
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

/// One-year request with a 12-unit ceiling and a 30-day window
pub fn request(name: &str) -> DomainRequest {
    DomainRequest {
        domain: domain(name),
        term_years: 1,
        max_price: 12,
        min_days_remaining: 30,
        contact: contact(),
    }
}

/// Status answer expiring `days` after `start()`
pub fn status(state: &str, days: Option<i64>) -> DomainStatusReport {
    DomainStatusReport {
        status: DomainStatus::from(state),
        expires: days.map(|d| format_expiry(start() + TimeDelta::days(d))),
        name_servers: Vec::new(),
    }
}

/// Managed state expiring `days` after `start()`
pub fn managed(name: &str, days: i64) -> ManagedDomain {
    ManagedDomain {
        domain: domain(name),
        expires: start() + TimeDelta::days(days),
        min_days_remaining: 30,
        term_years: 1,
        pending_renewal: false,
    }
}

/// Poll config: 1s doubling, at most `max_attempts` checks
pub fn poll(max_attempts: u32) -> PollConfig {
    PollConfig {
        initial_interval_ms: 1_000,
        multiplier: 2.0,
        max_interval_ms: 60_000,
        max_attempts: Some(max_attempts),
        max_elapsed_secs: None,
    }
}

pub fn config(max_attempts: u32) -> OrchestratorConfig {
    OrchestratorConfig::new(RegistrarConfig::Custom {
        factory: "scripted".to_string(),
        config: serde_json::json!({}),
    })
    .with_poll(poll(max_attempts))
}

/// Orchestrator over `registrar` on `clock`
pub fn orchestrator(
    registrar: &Arc<ScriptedRegistrar>,
    clock: &ManualClock,
    max_attempts: u32,
) -> (LifecycleOrchestrator, mpsc::Receiver<LifecycleEvent>) {
    LifecycleOrchestrator::new(
        registrar.clone(),
        Arc::new(clock.clone()),
        &config(max_attempts),
    )
    .unwrap()
}

/// Everything currently buffered on the event channel
pub fn drain(rx: &mut mpsc::Receiver<LifecycleEvent>) -> Vec<LifecycleEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
