//! Strongly-typed domain model
//!
//! Everything the orchestrator consumes is validated once, here, at the
//! boundary: domain names are normalized, contact payloads are checked for
//! the fields every registrar requires, and expiry timestamps are parsed into
//! instants before any comparison happens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// A normalized (lowercase, no trailing dot) fully-qualified domain name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainName(String);

impl DomainName {
    /// Parse and normalize a domain name
    ///
    /// Applies the RFC 1035 limits: 253 characters overall, 63 per label,
    /// labels made of alphanumerics and hyphens that neither start nor end
    /// with a hyphen, and at least two labels.
    pub fn parse(raw: &str) -> Result<Self> {
        let name = raw.trim().trim_end_matches('.').to_ascii_lowercase();

        if name.is_empty() {
            return Err(Error::invalid_input("Domain name cannot be empty"));
        }

        if name.len() > 253 {
            return Err(Error::invalid_input(format!(
                "Domain name too long: {} chars (max 253)",
                name.len()
            )));
        }

        let labels: Vec<&str> = name.split('.').collect();
        if labels.len() < 2 {
            return Err(Error::invalid_input(format!(
                "Domain name must contain a TLD: '{}'",
                name
            )));
        }

        for label in labels {
            if label.is_empty() {
                return Err(Error::invalid_input(format!(
                    "Domain name has empty label: '{}'",
                    name
                )));
            }
            if label.len() > 63 {
                return Err(Error::invalid_input(format!(
                    "Domain label too long: {} chars (max 63)",
                    label.len()
                )));
            }
            if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(Error::invalid_input(format!(
                    "Domain label contains invalid characters: '{}'",
                    label
                )));
            }
            if label.starts_with('-') || label.ends_with('-') {
                return Err(Error::invalid_input(format!(
                    "Domain label cannot start or end with hyphen: '{}'",
                    label
                )));
            }
        }

        Ok(Self(name))
    }

    /// The normalized name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The top-level label (e.g. `com` for `example.com`)
    pub fn tld(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DomainName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DomainName> for String {
    fn from(value: DomainName) -> Self {
        value.0
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Postal address of a contact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
}

/// Registrant contact used for purchases
///
/// Passed explicitly into every purchase so that domains with different
/// owners never share contact data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub name_first: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_middle: Option<String>,
    pub name_last: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    pub address_mailing: Address,
}

impl ContactInfo {
    /// Check that every field a registrar requires is present
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("nameFirst", &self.name_first),
            ("nameLast", &self.name_last),
            ("email", &self.email),
            ("phone", &self.phone),
            ("addressMailing.address1", &self.address_mailing.address1),
            ("addressMailing.city", &self.address_mailing.city),
            ("addressMailing.state", &self.address_mailing.state),
            ("addressMailing.postalCode", &self.address_mailing.postal_code),
            ("addressMailing.country", &self.address_mailing.country),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::invalid_input(format!(
                    "Contact field '{}' is required",
                    field
                )));
            }
        }

        if !self.email.contains('@') {
            return Err(Error::invalid_input(format!(
                "Contact email is not an address: '{}'",
                self.email
            )));
        }

        if self.address_mailing.country.len() != 2 {
            return Err(Error::invalid_input(format!(
                "Contact country must be a two-letter code, got '{}'",
                self.address_mailing.country
            )));
        }

        Ok(())
    }

    /// "First Last", the form registrars expect for consent attribution
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name_first, self.name_last)
    }
}

/// Registrar-side lifecycle status of a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DomainStatus {
    /// Registered and usable
    Active,
    /// Any other registrar status (pending registration, cancelled, …)
    Other(String),
}

impl DomainStatus {
    /// Whether the domain is registered and usable
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl From<String> for DomainStatus {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("ACTIVE") {
            Self::Active
        } else {
            Self::Other(value.to_ascii_uppercase())
        }
    }
}

impl From<&str> for DomainStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<DomainStatus> for String {
    fn from(value: DomainStatus) -> Self {
        match value {
            DomainStatus::Active => "ACTIVE".to_string(),
            DomainStatus::Other(status) => status,
        }
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("ACTIVE"),
            Self::Other(status) => f.write_str(status),
        }
    }
}

/// What `GetDomainStatus` reports about a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainStatusReport {
    pub status: DomainStatus,
    /// Expiry in the registrar's fixed layout; absent while a purchase is pending
    pub expires: Option<String>,
    #[serde(default)]
    pub name_servers: Vec<String>,
}

/// A domain whose lifecycle is managed by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedDomain {
    pub domain: DomainName,
    pub expires: DateTime<Utc>,
    /// Negative disables renewal
    pub min_days_remaining: i64,
    pub term_years: u32,
    /// Set by a read whose expiry evaluation said renew; the next
    /// `ensure_domain` renews without re-checking the window and clears it
    pub pending_renewal: bool,
}

impl ManagedDomain {
    /// Expiry rendered in the registrar layout
    pub fn expires_string(&self) -> String {
        crate::policy::format_expiry(self.expires)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_names_are_normalized() {
        let name = DomainName::parse("  WWW.Example.COM. ").unwrap();
        assert_eq!(name.as_str(), "www.example.com");
        assert_eq!(name.tld(), "com");
    }

    #[test]
    fn invalid_domain_names_are_rejected() {
        assert!(DomainName::parse("").is_err());
        assert!(DomainName::parse("localhost").is_err());
        assert!(DomainName::parse("bad..example.com").is_err());
        assert!(DomainName::parse("-bad.example.com").is_err());
        assert!(DomainName::parse("under_score.com").is_err());
        assert!(DomainName::parse(&format!("{}.com", "a".repeat(64))).is_err());
    }

    #[test]
    fn domain_name_deserializes_through_validation() {
        let name: DomainName = serde_json::from_str("\"Example.Org\"").unwrap();
        assert_eq!(name.as_str(), "example.org");
        assert!(serde_json::from_str::<DomainName>("\"nope\"").is_err());
    }

    #[test]
    fn status_comparison_is_case_insensitive() {
        assert!(DomainStatus::from("active").is_active());
        assert_eq!(
            DomainStatus::from("pending_setup"),
            DomainStatus::Other("PENDING_SETUP".into())
        );
    }

    fn contact() -> ContactInfo {
        ContactInfo {
            name_first: "Ada".into(),
            name_last: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "+1.5555550100".into(),
            address_mailing: Address {
                address1: "1 Analytical Way".into(),
                city: "London".into(),
                state: "London".into(),
                postal_code: "N1".into(),
                country: "GB".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn complete_contact_validates() {
        assert!(contact().validate().is_ok());
        assert_eq!(contact().full_name(), "Ada Lovelace");
    }

    #[test]
    fn contact_missing_fields_is_invalid() {
        let mut c = contact();
        c.address_mailing.postal_code.clear();
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("postalCode"));

        let mut c = contact();
        c.email = "not-an-email".into();
        assert!(c.validate().is_err());
    }

    #[test]
    fn contact_uses_registrar_field_names() {
        let json = serde_json::to_value(contact()).unwrap();
        assert_eq!(json["nameFirst"], "Ada");
        assert_eq!(json["addressMailing"]["postalCode"], "N1");
        assert!(json.get("fax").is_none());
    }
}
