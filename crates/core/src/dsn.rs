//! DSN parsing — the project endpoint descriptor.
//!
//! A DSN has the shape `scheme://public_key@host[:port]/project_id`.
//! The public key is a credential, so `Debug` output redacts it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DsnError;

/// Parsed components of a telemetry DSN.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dsn {
    pub scheme: String,
    pub public_key: String,
    pub host: String,
    pub port: Option<u16>,
    pub project_id: String,
}

impl Dsn {
    /// Default port implied by the scheme when none is given.
    pub fn effective_port(&self) -> u16 {
        self.port
            .unwrap_or(if self.scheme == "http" { 80 } else { 443 })
    }
}

impl FromStr for Dsn {
    type Err = DsnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s.split_once("://").ok_or(DsnError::InvalidUrl)?;
        if scheme != "http" && scheme != "https" {
            return Err(DsnError::InvalidScheme(scheme.to_string()));
        }

        let (public_key, rest) = rest.split_once('@').ok_or(DsnError::MissingPublicKey)?;
        if public_key.is_empty() {
            return Err(DsnError::MissingPublicKey);
        }

        let (authority, project_id) = rest.split_once('/').ok_or(DsnError::MissingProjectId)?;
        let project_id = project_id.trim_matches('/');
        if project_id.is_empty() || !project_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(DsnError::MissingProjectId);
        }

        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| DsnError::InvalidUrl)?;
                (host, Some(port))
            }
            None => (authority, None),
        };
        if host.is_empty() {
            return Err(DsnError::InvalidUrl);
        }

        Ok(Dsn {
            scheme: scheme.to_string(),
            public_key: public_key.to_string(),
            host: host.to_string(),
            port,
            project_id: project_id.to_string(),
        })
    }
}

impl std::fmt::Display for Dsn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}@{}", self.scheme, self.public_key, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        write!(f, "/{}", self.project_id)
    }
}

impl std::fmt::Debug for Dsn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dsn")
            .field("scheme", &self.scheme)
            .field("public_key", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("project_id", &self.project_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_dsn() {
        let dsn: Dsn = "https://abc123@o42.ingest.example.com/7".parse().unwrap();
        assert_eq!(dsn.scheme, "https");
        assert_eq!(dsn.public_key, "abc123");
        assert_eq!(dsn.host, "o42.ingest.example.com");
        assert_eq!(dsn.port, None);
        assert_eq!(dsn.project_id, "7");
        assert_eq!(dsn.effective_port(), 443);
    }

    #[test]
    fn parses_explicit_port() {
        let dsn: Dsn = "http://key@localhost:8080/1".parse().unwrap();
        assert_eq!(dsn.port, Some(8080));
        assert_eq!(dsn.effective_port(), 8080);
    }

    #[test]
    fn display_round_trips() {
        let raw = "https://abc123@o42.ingest.example.com:9000/7";
        let dsn: Dsn = raw.parse().unwrap();
        assert_eq!(dsn.to_string(), raw);
    }

    #[test]
    fn rejects_missing_key() {
        let err = "https://@host/1".parse::<Dsn>().unwrap_err();
        assert_eq!(err, DsnError::MissingPublicKey);
        let err = "https://host/1".parse::<Dsn>().unwrap_err();
        assert_eq!(err, DsnError::MissingPublicKey);
    }

    #[test]
    fn rejects_bad_scheme_and_project() {
        assert!(matches!(
            "ftp://key@host/1".parse::<Dsn>(),
            Err(DsnError::InvalidScheme(_))
        ));
        assert_eq!(
            "https://key@host/abc".parse::<Dsn>().unwrap_err(),
            DsnError::MissingProjectId
        );
        assert_eq!(
            "https://key@host".parse::<Dsn>().unwrap_err(),
            DsnError::MissingProjectId
        );
    }

    #[test]
    fn debug_redacts_public_key() {
        let dsn: Dsn = "https://secret@host/1".parse().unwrap();
        let dbg = format!("{dsn:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("[REDACTED]"));
    }
}
