use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use itertools::Itertools;
use url::Url;

use crate::error::EndpointError;

pub const DEFAULT_SCHEME: &str = "amqp";
pub const AMQP_PORT: u16 = 5672;
pub const AMQPS_PORT: u16 = 5671;

/// A resolvable network address. The scheme is carried along only so the
/// endpoint renders back in the form it was advertised in, equality and
/// hashing look at host and port alone.
#[derive(Debug, Clone)]
pub struct Endpoint {
    scheme: String,
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, EndpointError> {
        Self::with_scheme(DEFAULT_SCHEME, host, port)
    }

    pub fn with_scheme(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Result<Self, EndpointError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(EndpointError::EmptyHost);
        }
        if port == 0 {
            return Err(EndpointError::ZeroPort);
        }
        let scheme = scheme.into();
        let scheme = if scheme.is_empty() { DEFAULT_SCHEME.to_string() } else { scheme };
        Ok(Self { scheme, host, port })
    }

    /// Parses `scheme://host[:port]`. A missing port falls back to the default
    /// port of the scheme.
    pub fn parse_url(url: &str) -> Result<Self, EndpointError> {
        let invalid = |reason: String| EndpointError::InvalidUrl { url: url.to_string(), reason };
        let parsed = Url::parse(url.trim()).map_err(|e| invalid(e.to_string()))?;
        let host = parsed.host_str().ok_or_else(|| invalid("missing host".to_string()))?;
        let port = parsed.port().unwrap_or_else(|| default_port(parsed.scheme()));
        Self::with_scheme(parsed.scheme(), host, port)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port
    }
}

impl Eq for Endpoint {}

impl Hash for Endpoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.port.hash(state);
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Alternate endpoints in priority order, first is most preferred. Never
/// mutated once built, a new handshake produces a new list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailoverList {
    endpoints: Vec<Endpoint>,
}

impl FailoverList {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self { endpoints }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// External form used by management tooling: `scheme://host:port` entries
    /// joined by `", "`, or `None` when nothing was advertised.
    pub fn render(&self) -> Option<String> {
        if self.endpoints.is_empty() {
            None
        } else {
            Some(self.endpoints.iter().join(", "))
        }
    }
}

impl FromIterator<Endpoint> for FailoverList {
    fn from_iter<T: IntoIterator<Item=Endpoint>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

pub fn default_port(scheme: &str) -> u16 {
    match scheme {
        "amqps" => AMQPS_PORT,
        _ => AMQP_PORT,
    }
}

#[cfg(test)]
mod tests {
    use crate::endpoint::{AMQP_PORT, Endpoint, FailoverList};
    use crate::error::EndpointError;

    #[test]
    fn test_reject_invalid() {
        assert_eq!(Endpoint::new("", 10), Err(EndpointError::EmptyHost));
        assert_eq!(Endpoint::new("  ", 10), Err(EndpointError::EmptyHost));
        assert_eq!(Endpoint::new("localhost", 0), Err(EndpointError::ZeroPort));
    }

    #[test]
    fn test_parse_url() {
        let endpoint = Endpoint::parse_url("amqp://third-host:5671").unwrap();
        assert_eq!(endpoint.host(), "third-host");
        assert_eq!(endpoint.port(), 5671);
        assert_eq!(endpoint.to_string(), "amqp://third-host:5671");

        let endpoint = Endpoint::parse_url(" amqp://localhost ").unwrap();
        assert_eq!(endpoint.port(), AMQP_PORT);

        let endpoint = Endpoint::parse_url("amqps://secure").unwrap();
        assert_eq!(endpoint.to_string(), "amqps://secure:5671");

        assert!(Endpoint::parse_url("not a url").is_err());
    }

    #[test]
    fn test_equality_by_fields() {
        assert_eq!(Endpoint::new("a", 1).unwrap(), Endpoint::new("a", 1).unwrap());
        assert_ne!(Endpoint::new("a", 1).unwrap(), Endpoint::new("a", 2).unwrap());
        assert_ne!(Endpoint::new("a", 1).unwrap(), Endpoint::new("b", 1).unwrap());
    }

    #[test]
    fn test_scheme_only_affects_rendering() {
        let plain = Endpoint::new("secure", 5671).unwrap();
        let tls = Endpoint::with_scheme("amqps", "secure", 5671).unwrap();
        assert_eq!(plain, tls);
        let set: ahash::HashSet<Endpoint> = [plain.clone(), tls.clone()].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert_eq!(tls.to_string(), "amqps://secure:5671");
        assert_eq!(plain.to_string(), "amqp://secure:5671");
    }

    #[test]
    fn test_render_failover_list() {
        let list: FailoverList = vec![
            Endpoint::new("third-host", 5671).unwrap(),
            Endpoint::new("localhost", 25000).unwrap(),
        ].into_iter().collect();
        assert_eq!(list.render().as_deref(), Some("amqp://third-host:5671, amqp://localhost:25000"));
        assert_eq!(FailoverList::empty().render(), None);
    }
}
