//! Structured host, port, and certificate records.
//!
//! This module defines the data model for discovered hosts as reported by a
//! scan engine: the `Host` record with its address variant, the open-port
//! inventory, and the TLS certificate details a service-detection scan can
//! attach to a port.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::core::error::ScanError;

/// The ordered set of hosts produced by one completed scan invocation.
///
/// A result set is delivered atomically: an invocation either yields the
/// whole list or fails, never a partial stream.
pub type HostList = Vec<Host>;

/// How a discovered host is identified.
///
/// A host is identified either by its IPv4 address or by its MAC address
/// with the resolved vendor string, never both. Consumers must handle both
/// variants exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostAddress {
    /// Host identified by IPv4 address.
    Ipv4 {
        /// The address the host answered on.
        ip: Ipv4Addr,
    },
    /// Host identified by MAC address (link-local discovery).
    Mac {
        /// The MAC address in colon-separated hex form.
        mac: String,
        /// Vendor resolved from the OUI prefix.
        vendor: String,
    },
}

impl HostAddress {
    /// Returns the IPv4 address, if this host was identified by one.
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        match self {
            Self::Ipv4 { ip } => Some(*ip),
            Self::Mac { .. } => None,
        }
    }

    /// Returns the MAC address, if this host was identified by one.
    pub fn mac(&self) -> Option<&str> {
        match self {
            Self::Ipv4 { .. } => None,
            Self::Mac { mac, .. } => Some(mac),
        }
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4 { ip } => write!(f, "{ip}"),
            Self::Mac { mac, .. } => write!(f, "{mac}"),
        }
    }
}

/// A single discovered host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    /// How the host is identified (IPv4 or MAC+vendor).
    pub address: HostAddress,

    /// Reverse-resolved hostname; empty when resolution failed.
    pub hostname: String,

    /// Open ports, in the order the engine reported them.
    pub open_ports: Vec<Port>,

    /// OS fingerprint string, when the scan profile requested one.
    pub os_fingerprint: Option<String>,
}

impl Host {
    /// Creates a host identified by IPv4 address.
    pub fn ipv4(ip: Ipv4Addr) -> Self {
        Self {
            address: HostAddress::Ipv4 { ip },
            hostname: String::new(),
            open_ports: Vec::new(),
            os_fingerprint: None,
        }
    }

    /// Creates a host identified by MAC address and vendor.
    pub fn mac(mac: impl Into<String>, vendor: impl Into<String>) -> Self {
        Self {
            address: HostAddress::Mac {
                mac: mac.into(),
                vendor: vendor.into(),
            },
            hostname: String::new(),
            open_ports: Vec::new(),
            os_fingerprint: None,
        }
    }

    /// Sets the hostname.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Appends an open port.
    pub fn with_port(mut self, port: Port) -> Self {
        self.open_ports.push(port);
        self
    }

    /// Replaces the open-port list.
    pub fn with_ports(mut self, ports: Vec<Port>) -> Self {
        self.open_ports = ports;
        self
    }

    /// Sets the OS fingerprint.
    pub fn with_os_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.os_fingerprint = Some(fingerprint.into());
        self
    }
}

/// Transport protocol of an open port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// TCP.
    Tcp,
    /// UDP.
    Udp,
    /// SCTP.
    Sctp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
            Self::Sctp => write!(f, "sctp"),
        }
    }
}

impl FromStr for Transport {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "sctp" => Ok(Self::Sctp),
            other => Err(ScanError::unparseable_output(format!(
                "unknown transport protocol '{other}'"
            ))),
        }
    }
}

/// An open port on a discovered host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Port number.
    pub number: u16,

    /// Transport protocol.
    pub transport: Transport,

    /// Service name, when detected (e.g. "ssh", "https").
    pub service: Option<String>,

    /// Tunnel type wrapping the service (e.g. "ssl").
    pub tunnel: Option<String>,

    /// How the service was identified (e.g. "probed", "table").
    pub method: Option<String>,

    /// Product string reported by version detection.
    pub product: Option<String>,

    /// TLS certificate presented on this port, when captured.
    pub certificate: Option<Certificate>,
}

impl Port {
    /// Creates a port with the required fields.
    pub fn new(number: u16, transport: Transport) -> Self {
        Self {
            number,
            transport,
            service: None,
            tunnel: None,
            method: None,
            product: None,
            certificate: None,
        }
    }

    /// Sets the service name.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Sets the tunnel type.
    pub fn with_tunnel(mut self, tunnel: impl Into<String>) -> Self {
        self.tunnel = Some(tunnel.into());
        self
    }

    /// Sets the detection method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Sets the product string.
    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    /// Attaches a certificate.
    pub fn with_certificate(mut self, certificate: Certificate) -> Self {
        self.certificate = Some(certificate);
        self
    }
}

/// A TLS certificate captured from a scanned service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    /// Subject organization record.
    pub subject: CertificateOrganization,

    /// Issuer organization record.
    pub issuer: CertificateOrganization,

    /// Public key descriptor.
    pub pub_key: CertificatePublicKey,

    /// Validity window.
    pub validity: CertificateValidity,

    /// X.509 extensions, keyed by extension name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<HashMap<String, String>>,

    /// Signature algorithm (e.g. "sha256WithRSAEncryption").
    pub algorithm: String,

    /// MD5 fingerprint, when computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,

    /// SHA-1 fingerprint, when computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,

    /// PEM-encoded form, when captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pem: Option<String>,
}

/// Subject or issuer fields of a certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateOrganization {
    /// Common name (CN).
    pub common_name: Option<String>,

    /// Country name (C).
    pub country_name: Option<String>,

    /// Organization name (O).
    pub organization_name: Option<String>,

    /// State or province name (ST).
    pub state_or_province_name: Option<String>,
}

/// Public key descriptor of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificatePublicKey {
    /// Key type (e.g. "rsa", "ec").
    pub key_type: String,

    /// Key length in bits.
    pub bits: u32,

    /// Public exponent, for RSA keys.
    pub exponent: Option<String>,

    /// Modulus, for RSA keys.
    pub modulus: Option<String>,
}

/// Validity window of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateValidity {
    /// Start of the validity window.
    pub not_before: DateTime<Utc>,

    /// End of the validity window.
    pub not_after: DateTime<Utc>,
}
