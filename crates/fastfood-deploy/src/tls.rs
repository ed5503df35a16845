//! Self-signed certificate for the nginx edge.
//!
//! Generated once; existing files are never replaced.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SanType};
use tracing::{debug, info};

use fastfood_core::{OpsError, OpsResult};

pub const CERT_FILE: &str = "cert.pem";
pub const KEY_FILE: &str = "key.pem";

/// A generated certificate and private key pair.
#[derive(Debug, Clone)]
pub struct CertKeyPair {
    /// PEM-encoded certificate.
    pub cert_pem: String,
    /// PEM-encoded private key.
    pub key_pem: String,
}

fn tls_err(e: rcgen::Error) -> OpsError {
    OpsError::Tls(e.to_string())
}

/// Generate a self-signed certificate for `localhost` and 127.0.0.1.
pub fn generate_self_signed() -> OpsResult<CertKeyPair> {
    let mut params = CertificateParams::new(vec!["localhost".to_string()]).map_err(tls_err)?;
    params
        .subject_alt_names
        .push(SanType::IpAddress(std::net::IpAddr::from([127, 0, 0, 1])));

    let mut dn = DistinguishedName::new();
    dn.push(DnType::OrganizationName, "FastFood");
    dn.push(DnType::CommonName, "localhost");
    params.distinguished_name = dn;

    // Valid until the end of next year.
    params.not_after = rcgen::date_time_ymd(Utc::now().year() + 1, 12, 31);

    let key_pair = KeyPair::generate().map_err(tls_err)?;
    let cert = params.self_signed(&key_pair).map_err(tls_err)?;

    Ok(CertKeyPair {
        cert_pem: cert.pem(),
        key_pem: key_pair.serialize_pem(),
    })
}

/// Write `cert.pem`/`key.pem` into `cert_dir` unless both already exist.
///
/// Returns the certificate path and whether a new pair was generated.
pub fn ensure_certificates(cert_dir: &Path) -> OpsResult<(PathBuf, bool)> {
    let cert_path = cert_dir.join(CERT_FILE);
    let key_path = cert_dir.join(KEY_FILE);

    if cert_path.is_file() && key_path.is_file() {
        debug!(path = ?cert_path, "certificate present");
        return Ok((cert_path, false));
    }

    std::fs::create_dir_all(cert_dir)?;
    let pair = generate_self_signed()?;
    std::fs::write(&cert_path, &pair.cert_pem)?;
    std::fs::write(&key_path, &pair.key_pem)?;
    restrict_permissions(&key_path)?;

    info!(path = ?cert_path, "generated self-signed certificate");
    Ok((cert_path, true))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> OpsResult<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> OpsResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_self_signed_succeeds() {
        let pair = generate_self_signed().unwrap();
        assert!(pair.cert_pem.contains("BEGIN CERTIFICATE"));
        assert!(pair.key_pem.contains("BEGIN PRIVATE KEY"));
    }

    #[test]
    fn ensure_creates_missing_pair() {
        let dir = tempfile::tempdir().unwrap();
        let cert_dir = dir.path().join("ssl");

        let (path, created) = ensure_certificates(&cert_dir).unwrap();

        assert!(created);
        assert_eq!(path, cert_dir.join(CERT_FILE));
        assert!(cert_dir.join(KEY_FILE).is_file());
    }

    #[test]
    fn ensure_keeps_existing_pair() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CERT_FILE), "existing cert").unwrap();
        std::fs::write(dir.path().join(KEY_FILE), "existing key").unwrap();

        let (_, created) = ensure_certificates(dir.path()).unwrap();

        assert!(!created);
        assert_eq!(
            std::fs::read_to_string(dir.path().join(CERT_FILE)).unwrap(),
            "existing cert"
        );
    }

    #[test]
    fn ensure_regenerates_when_key_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CERT_FILE), "orphan cert").unwrap();

        let (_, created) = ensure_certificates(dir.path()).unwrap();

        assert!(created);
        let cert = std::fs::read_to_string(dir.path().join(CERT_FILE)).unwrap();
        assert!(cert.contains("BEGIN CERTIFICATE"));
    }
}
