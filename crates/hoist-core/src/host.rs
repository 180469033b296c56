use std::fmt;
use std::net::IpAddr;

/// How the public reaches the host.
///
/// Decides the TLS branch once for the whole run: a domain name gets an
/// ACME certificate and HTTPS, a bare address is served over plain HTTP
/// because no public CA issues certificates for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostIdentity {
    Domain(String),
    Address(IpAddr),
}

impl HostIdentity {
    /// Classify a `DOMAIN` input.
    pub fn parse(input: &str) -> crate::Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if let Ok(addr) = input.parse::<IpAddr>() {
            return Ok(Self::Address(addr));
        }

        let domain = input.trim_end_matches('.').to_ascii_lowercase();
        if domain.len() > 253 {
            return Err(invalid("longer than 253 characters"));
        }
        for label in domain.split('.') {
            if label.is_empty() || label.len() > 63 {
                return Err(invalid("every label must be 1-63 characters"));
            }
            if label.starts_with('-') || label.ends_with('-') {
                return Err(invalid("labels must not start or end with '-'"));
            }
            if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(invalid(
                    "only letters, digits, '-' and '.' are allowed in a domain name",
                ));
            }
        }
        Ok(Self::Domain(domain))
    }

    pub fn tls(&self) -> TlsMode {
        match self {
            Self::Domain(_) => TlsMode::Acme,
            Self::Address(_) => TlsMode::Plaintext,
        }
    }

    /// Public URL with scheme, e.g. `https://news.example.com`.
    pub fn url(&self) -> String {
        match self {
            Self::Domain(d) => format!("https://{d}"),
            Self::Address(IpAddr::V6(a)) => format!("http://[{a}]"),
            Self::Address(a) => format!("http://{a}"),
        }
    }
}

impl fmt::Display for HostIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(d) => f.write_str(d),
            Self::Address(a) => write!(f, "{a}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Certificate acquired and renewed by the proxy, HTTP redirected to HTTPS
    Acme,
    /// Plain HTTP only, no redirect
    Plaintext,
}

/// The three application settings that must agree with the proxy.
///
/// Only constructible from a [`TlsMode`], so a mixed combination (which
/// produces redirect loops or failed certificate orders) cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SslFlags {
    available: bool,
    force_ssl: bool,
    assume_ssl: bool,
}

impl SslFlags {
    pub fn for_mode(mode: TlsMode) -> Self {
        let on = mode == TlsMode::Acme;
        Self {
            available: on,
            force_ssl: on,
            assume_ssl: on,
        }
    }

    /// Site-level "is SSL available" flag.
    pub fn available(&self) -> bool {
        self.available
    }

    pub fn force_ssl(&self) -> bool {
        self.force_ssl
    }

    /// Trust the proxy's `X-Forwarded-Proto`.
    pub fn assume_ssl(&self) -> bool {
        self.assume_ssl
    }
}

fn invalid(reason: &str) -> crate::Error {
    crate::Error::InvalidInput {
        key: "DOMAIN",
        reason: reason.to_owned(),
    }
}
