//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and cross-field consistency
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("database.dsn must not be empty")]
    EmptyDsn,

    #[error("database.dsn must be a mysql:// URL, got '{0}'")]
    UnsupportedDsn(String),

    #[error("database.max_open must be at least 1")]
    ZeroMaxOpen,

    #[error("database.max_idle ({max_idle}) exceeds database.max_open ({max_open})")]
    IdleExceedsOpen { max_idle: u32, max_open: u32 },

    #[error("client.tls.client_cert and client.tls.client_key must be set together")]
    PartialClientIdentity,

    #[error("client.tls.min_version is newer than client.tls.max_version")]
    InvertedTlsVersions,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(db) = &config.database {
        if db.dsn.is_empty() {
            errors.push(ValidationError::EmptyDsn);
        } else if !db.dsn.starts_with("mysql://") {
            errors.push(ValidationError::UnsupportedDsn(redact_dsn(&db.dsn)));
        }
        if db.max_open == 0 {
            errors.push(ValidationError::ZeroMaxOpen);
        } else if db.max_idle > db.max_open {
            errors.push(ValidationError::IdleExceedsOpen {
                max_idle: db.max_idle,
                max_open: db.max_open,
            });
        }
    }

    if let Some(tls) = &config.client.tls {
        if tls.client_cert.is_some() != tls.client_key.is_some() {
            errors.push(ValidationError::PartialClientIdentity);
        }
        if let (Some(min), Some(max)) = (tls.min_version, tls.max_version) {
            if min > max {
                errors.push(ValidationError::InvertedTlsVersions);
            }
        }
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            obs.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Strip credentials from a DSN before it lands in an error message.
fn redact_dsn(dsn: &str) -> String {
    match dsn.split_once('@') {
        Some((_, host)) => format!("***@{}", host),
        None => dsn.to_string(),
    }
}
