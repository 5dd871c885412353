// # GoDaddy Adapter Sandbox Validation Tool
//
// Exercises the read-only half of the GoDaddy adapter against a real API
// endpoint (the OTE sandbox by default). Nothing is purchased, renewed or
// modified.
//
// ## Usage
//
// ```bash
// GODADDY_API_KEY=your_key \
// GODADDY_API_SECRET=your_secret \
// VALIDATION_DOMAIN=example.com \
// cargo run -p demos --bin godaddy_validation
// ```
//
// ## Environment Variables
//
// Required:
// - `GODADDY_API_KEY`, `GODADDY_API_SECRET`: API credentials
// - `VALIDATION_DOMAIN`: Domain to query
//
// Optional:
// - `GODADDY_BASE_URL`: API base URL (default: https://api.ote-godaddy.com)
// - `GODADDY_SHOPPER_ID`: Reseller shopper id

use registrar_core::policy::{MICROS_PER_UNIT, parse_expiry};
use registrar_core::{DomainName, Registrar};
use registrar_godaddy::GoDaddyRegistrar;
use std::env;
use std::process::ExitCode;

const SANDBOX_BASE_URL: &str = "https://api.ote-godaddy.com";

fn required(name: &str) -> Option<String> {
    let value = env::var(name).ok().filter(|v| !v.is_empty());
    if value.is_none() {
        tracing::error!("{} environment variable is required", name);
    }
    value
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("=== GoDaddy Adapter Sandbox Validation ===");

    let (Some(api_key), Some(api_secret), Some(raw_domain)) = (
        required("GODADDY_API_KEY"),
        required("GODADDY_API_SECRET"),
        required("VALIDATION_DOMAIN"),
    ) else {
        return ExitCode::from(1);
    };

    let base_url = env::var("GODADDY_BASE_URL").unwrap_or_else(|_| SANDBOX_BASE_URL.to_string());
    let shopper_id = env::var("GODADDY_SHOPPER_ID").ok();

    let domain = match DomainName::parse(&raw_domain) {
        Ok(domain) => domain,
        Err(e) => {
            tracing::error!("VALIDATION_DOMAIN is invalid: {}", e);
            return ExitCode::from(1);
        }
    };

    tracing::info!("Configuration:");
    tracing::info!("  Base URL: {}", base_url);
    tracing::info!("  Domain: {}", domain);

    let registrar = match GoDaddyRegistrar::new(api_key, api_secret, base_url, shopper_id) {
        Ok(registrar) => registrar,
        Err(e) => {
            tracing::error!("Failed to create registrar: {}", e);
            return ExitCode::from(1);
        }
    };
    tracing::info!("Registrar created: {:?}", registrar);

    tracing::info!("--- Step 1: Availability ---");
    match registrar.check_availability(std::slice::from_ref(&domain)).await {
        Ok(available) => tracing::info!("Available: {}", available),
        Err(e) => {
            tracing::error!("Availability check failed: {}", e);
            return ExitCode::from(2);
        }
    }

    tracing::info!("--- Step 2: Price Quote ---");
    match registrar.get_price_quote(&domain, 1).await {
        Ok(micros) => tracing::info!(
            "One-year price: {}.{:06}",
            micros / MICROS_PER_UNIT,
            micros % MICROS_PER_UNIT
        ),
        Err(e) => tracing::warn!("No quote (domain may be unavailable): {}", e),
    }

    tracing::info!("--- Step 3: Domain Status ---");
    match registrar.get_domain_status(&domain).await {
        Ok(report) => {
            tracing::info!("Status: {}", report.status);
            match report.expires.as_deref().map(parse_expiry) {
                Some(Ok(expires)) => tracing::info!("Expires: {}", expires),
                Some(Err(e)) => tracing::warn!("Unexpected expiry layout: {}", e),
                None => tracing::info!("Expires: (not yet assigned)"),
            }
            tracing::info!("Name servers: {}", report.name_servers.join(", "));
        }
        Err(e) if e.is_not_found() => {
            tracing::info!("Domain is not in this account; skipping record listing");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            tracing::error!("Status read failed: {}", e);
            return ExitCode::from(2);
        }
    }

    tracing::info!("--- Step 4: First Record Page ---");
    match registrar.list_records_page(&domain, 50, 1).await {
        Ok(records) => {
            tracing::info!("{} record(s) on the first page", records.len());
            for record in records {
                tracing::info!("  {} {} {}", record.name, record.record_type, record.data);
            }
        }
        Err(e) => {
            tracing::error!("Record listing failed: {}", e);
            return ExitCode::from(2);
        }
    }

    tracing::info!("=== Validation Complete (read-only) ===");
    ExitCode::SUCCESS
}
