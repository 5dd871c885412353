//! Minimal embedding example for registrar-core
//!
//! Drives a full domain lifecycle against an in-memory registrar that, like a
//! real one, only reports writes after a few status reads.

use chrono::{Months, Utc};
use registrar_core::policy::format_expiry;
use registrar_core::{
    ContactInfo, DomainName, DomainRecord, DomainRequest, DomainStatus, DomainStatusReport,
    LifecycleOrchestrator, OrchestratorConfig, PollConfig, RecordType, RecordTypePolicy,
    Error, Registrar, RegistrarConfig, Result, SystemClock,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Status reads needed before a write becomes visible
const PROPAGATION_READS: u32 = 2;

#[derive(Debug, Clone)]
struct Registration {
    expires: chrono::DateTime<Utc>,
    /// Remaining reads that still show the previous state
    lag: u32,
    visible: Option<DomainStatusReport>,
    name_servers: Vec<String>,
    records: Vec<DomainRecord>,
}

impl Registration {
    fn report(&self) -> DomainStatusReport {
        DomainStatusReport {
            status: DomainStatus::Active,
            expires: Some(format_expiry(self.expires)),
            name_servers: self.name_servers.clone(),
        }
    }
}

/// Registrar that keeps everything in a map
#[derive(Default)]
struct InMemoryRegistrar {
    domains: Mutex<HashMap<DomainName, Registration>>,
}

#[async_trait::async_trait]
impl Registrar for InMemoryRegistrar {
    async fn get_domain_status(&self, domain: &DomainName) -> Result<DomainStatusReport> {
        let mut domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        let registration = domains
            .get_mut(domain)
            .ok_or_else(|| Error::not_found(format!("Domain {} not found", domain)))?;

        if registration.lag > 0 {
            registration.lag -= 1;
            if let Some(stale) = &registration.visible {
                return Ok(stale.clone());
            }
            return Ok(DomainStatusReport {
                status: DomainStatus::from("PENDING_SETUP"),
                expires: None,
                name_servers: Vec::new(),
            });
        }

        let report = registration.report();
        registration.visible = Some(report.clone());
        Ok(report)
    }

    async fn check_availability(&self, domains: &[DomainName]) -> Result<bool> {
        let registered = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        Ok(domains.iter().all(|d| !registered.contains_key(d)))
    }

    async fn get_price_quote(&self, _domain: &DomainName, term_years: u32) -> Result<u64> {
        Ok(10_990_000 * u64::from(term_years))
    }

    async fn purchase(
        &self,
        domain: &DomainName,
        term_years: u32,
        contact: &ContactInfo,
    ) -> Result<()> {
        println!("[InMemory] {} purchased for {}", domain, contact.full_name());
        let expires = Utc::now() + Months::new(12 * term_years);
        self.domains.lock().unwrap_or_else(|e| e.into_inner()).insert(
            domain.clone(),
            Registration {
                expires,
                lag: PROPAGATION_READS,
                visible: None,
                name_servers: Vec::new(),
                records: Vec::new(),
            },
        );
        Ok(())
    }

    async fn renew(&self, domain: &DomainName, term_years: u32) -> Result<()> {
        let mut domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        let registration = domains
            .get_mut(domain)
            .ok_or_else(|| Error::not_found(format!("Domain {} not found", domain)))?;
        registration.expires = registration.expires + Months::new(12 * term_years);
        registration.lag = PROPAGATION_READS;
        Ok(())
    }

    async fn cancel(&self, domain: &DomainName) -> Result<()> {
        self.domains
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(domain)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("Domain {} not found", domain)))
    }

    async fn list_records_page(
        &self,
        domain: &DomainName,
        limit: u32,
        offset_page: u32,
    ) -> Result<Vec<DomainRecord>> {
        let domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        let registration = domains
            .get(domain)
            .ok_or_else(|| Error::not_found(format!("Domain {} not found", domain)))?;
        let skip = (offset_page.saturating_sub(1) * limit) as usize;
        Ok(registration
            .records
            .iter()
            .skip(skip)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn replace_records_of_type(
        &self,
        domain: &DomainName,
        record_type: RecordType,
        records: &[DomainRecord],
    ) -> Result<()> {
        let mut domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        let registration = domains
            .get_mut(domain)
            .ok_or_else(|| Error::not_found(format!("Domain {} not found", domain)))?;
        registration.records.retain(|r| r.record_type != record_type);
        registration.records.extend_from_slice(records);
        Ok(())
    }

    async fn replace_name_servers(
        &self,
        domain: &DomainName,
        name_servers: &[String],
    ) -> Result<()> {
        let mut domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        let registration = domains
            .get_mut(domain)
            .ok_or_else(|| Error::not_found(format!("Domain {} not found", domain)))?;
        registration.name_servers = name_servers.to_vec();
        Ok(())
    }

    fn registrar_name(&self) -> &'static str {
        "in-memory"
    }
}

fn contact() -> ContactInfo {
    ContactInfo {
        name_first: "Grace".to_string(),
        name_last: "Hopper".to_string(),
        email: "grace@example.com".to_string(),
        phone: "+1.5555550199".to_string(),
        address_mailing: registrar_core::model::Address {
            address1: "1 Compiler Lane".to_string(),
            city: "Arlington".to_string(),
            state: "VA".to_string(),
            postal_code: "22201".to_string(),
            country: "US".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Embedded registrar-core Example ===\n");

    let registrar = Arc::new(InMemoryRegistrar::default());
    let config = OrchestratorConfig::new(RegistrarConfig::Custom {
        factory: "in-memory".to_string(),
        config: serde_json::json!({}),
    })
    .with_poll(PollConfig {
        initial_interval_ms: 20,
        multiplier: 2.0,
        max_interval_ms: 200,
        max_attempts: Some(10),
        max_elapsed_secs: Some(5),
    });

    println!("1. Creating orchestrator...");
    let (orchestrator, mut event_rx) =
        LifecycleOrchestrator::new(registrar.clone(), Arc::new(SystemClock), &config)?;

    let event_listener = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            println!("[Event] {:?}", event);
        }
    });

    let domain = DomainName::parse("embedded-example.com")?;
    let request = DomainRequest {
        domain: domain.clone(),
        term_years: 1,
        max_price: 15,
        min_days_remaining: 30,
        contact: contact(),
    };

    println!("2. Purchasing {} and waiting for it to activate...", domain);
    let managed = orchestrator.ensure_domain(&request, None).await?;
    println!("   Registered until {}", managed.expires_string());

    println!("3. Ensuring again (outside the renewal window, no write)...");
    let managed = orchestrator.ensure_domain(&request, Some(&managed)).await?;

    println!("4. Delegating and replacing records...");
    orchestrator
        .ensure_name_servers(
            &domain,
            &["NS1.Example.net.".to_string(), "ns2.example.net".to_string()],
        )
        .await?;
    let records = vec![
        DomainRecord::new("@", RecordType::A, "192.0.2.10").with_ttl(600),
        DomainRecord::new("www", RecordType::Cname, "@").with_ttl(600),
        DomainRecord::new("@", RecordType::Mx, "mail.example.net").with_priority(10),
    ];
    let groups = orchestrator
        .ensure_records(&domain, &records, &RecordTypePolicy::default())
        .await?;
    println!("   {} record group(s) replaced", groups);

    let listed = orchestrator.list_records(&domain).await?;
    println!("   Registrar now holds {} record(s)", listed.len());

    println!("5. Refreshing and releasing...");
    let refreshed = orchestrator.refresh_domain(&managed).await?;
    println!("   Pending renewal: {}", refreshed.pending_renewal);
    orchestrator.release_domain(&domain).await?;

    drop(orchestrator);
    let _ = event_listener.await;

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- The orchestrator owns every wait; the registrar is single-shot");
    println!("- Contact data and policies are passed per call");
    println!("- Any Registrar implementation can be plugged in");

    Ok(())
}

