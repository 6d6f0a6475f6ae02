use std::ops::{Deref, DerefMut};

use ahash::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::endpoint::{DEFAULT_SCHEME, Endpoint, FailoverList};
use crate::error::EndpointError;

pub const FAILOVER_SERVER_LIST: &str = "failover-server-list";
pub const PRODUCT: &str = "product";
pub const NETWORK_HOST: &str = "network-host";
pub const PORT: &str = "port";
pub const SCHEME: &str = "scheme";

/// Property map a peer sends when a connection opens. Lives only until the
/// failover list has been decoded out of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandshakeProperties {
    properties: HashMap<String, Value>,
}

impl HandshakeProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Properties advertising `list` the way a listener does. An empty list
    /// leaves the failover property out entirely.
    pub fn advertising(list: &FailoverList) -> Self {
        let mut properties = Self::new();
        if !list.is_empty() {
            let entries = list.endpoints()
                .iter()
                .map(|endpoint| {
                    json!({
                        SCHEME: endpoint.scheme(),
                        NETWORK_HOST: endpoint.host(),
                        PORT: endpoint.port().to_string(),
                    })
                })
                .collect::<Vec<_>>();
            properties.insert(FAILOVER_SERVER_LIST.to_string(), Value::Array(entries));
        }
        properties
    }
}

impl Deref for HandshakeProperties {
    type Target = HashMap<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.properties
    }
}

impl DerefMut for HandshakeProperties {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.properties
    }
}

impl FromIterator<(String, Value)> for HandshakeProperties {
    fn from_iter<T: IntoIterator<Item=(String, Value)>>(iter: T) -> Self {
        Self { properties: iter.into_iter().collect() }
    }
}

#[derive(Debug, Deserialize)]
struct FailoverEntry {
    #[serde(rename = "network-host")]
    network_host: Option<String>,
    port: Option<PortValue>,
    scheme: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u64),
    Text(String),
}

impl PortValue {
    fn to_port(&self) -> Option<u16> {
        match self {
            PortValue::Number(n) => u16::try_from(*n).ok(),
            PortValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Extracts the advertised failover list in the order it was sent. Entries
/// that cannot be turned into an endpoint are skipped. A missing property is
/// an empty list.
pub fn decode_failover_list(properties: &HandshakeProperties, default_port: u16) -> FailoverList {
    let entries = match properties.get(FAILOVER_SERVER_LIST) {
        None => return FailoverList::empty(),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            warn!("ignore {} property, expected a list but got {}", FAILOVER_SERVER_LIST, other);
            return FailoverList::empty();
        }
    };
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            match decode_entry(entry, default_port) {
                Ok(endpoint) => Some(endpoint),
                Err(reason) => {
                    warn!("skip failover entry {} {}: {}", index, entry, reason);
                    None
                }
            }
        })
        .collect()
}

fn decode_entry(entry: &Value, default_port: u16) -> Result<Endpoint, String> {
    let FailoverEntry { network_host, port, scheme } = FailoverEntry::deserialize(entry)
        .map_err(|e| e.to_string())?;
    let host = network_host.ok_or_else(|| format!("missing {}", NETWORK_HOST))?;
    let port = match port {
        None => default_port,
        Some(port) => port.to_port().ok_or_else(|| format!("invalid {} {:?}", PORT, port))?,
    };
    let scheme = scheme.unwrap_or_else(|| DEFAULT_SCHEME.to_string());
    Endpoint::with_scheme(scheme, host, port).map_err(|e| e.to_string())
}

/// Parses the comma separated url list a listener is configured to advertise,
/// e.g. `amqp://third-host:5671, amqp://localhost:25000`.
pub fn parse_failover_urls(urls: &str) -> Result<FailoverList, EndpointError> {
    urls.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(Endpoint::parse_url)
        .collect::<Result<Vec<_>, _>>()
        .map(FailoverList::new)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::endpoint::{AMQP_PORT, Endpoint, FailoverList};
    use crate::properties::{decode_failover_list, FAILOVER_SERVER_LIST, HandshakeProperties, parse_failover_urls, PRODUCT};

    fn properties(list: Value) -> HandshakeProperties {
        [
            (PRODUCT.to_string(), json!("router")),
            (FAILOVER_SERVER_LIST.to_string(), list),
        ].into_iter().collect()
    }

    #[test]
    fn test_decode_preserves_order() {
        let props = properties(json!([
            {"network-host": "third-host", "port": "5671"},
            {"network-host": "localhost", "port": 25000},
        ]));
        let list = decode_failover_list(&props, AMQP_PORT);
        assert_eq!(list.endpoints(), &[
            Endpoint::new("third-host", 5671).unwrap(),
            Endpoint::new("localhost", 25000).unwrap(),
        ]);
    }

    #[test]
    fn test_decode_absent_property() {
        let props: HandshakeProperties = [(PRODUCT.to_string(), json!("router"))].into_iter().collect();
        assert!(decode_failover_list(&props, AMQP_PORT).is_empty());
        assert!(decode_failover_list(&HandshakeProperties::new(), AMQP_PORT).is_empty());
    }

    #[test]
    fn test_decode_skips_malformed_entries() {
        let props = properties(json!([
            {"port": "1000"},
            {"network-host": "", "port": "1001"},
            {"network-host": "bad-port", "port": "http"},
            {"network-host": "too-large", "port": 70000},
            "not-an-entry",
            {"network-host": "default-port"},
            {"network-host": "secure", "port": "5671", "scheme": "amqps"},
        ]));
        let list = decode_failover_list(&props, 5555);
        assert_eq!(list.endpoints(), &[
            Endpoint::new("default-port", 5555).unwrap(),
            Endpoint::with_scheme("amqps", "secure", 5671).unwrap(),
        ]);
        assert_eq!(list.render().as_deref(), Some("amqp://default-port:5555, amqps://secure:5671"));
    }

    #[test]
    fn test_decode_non_list_property() {
        let props = properties(json!({"network-host": "localhost"}));
        assert!(decode_failover_list(&props, AMQP_PORT).is_empty());
    }

    #[test]
    fn test_advertise_then_decode() {
        let list = parse_failover_urls("amqp://third-host:5671, amqp://localhost:25000").unwrap();
        let props = HandshakeProperties::advertising(&list);
        assert_eq!(decode_failover_list(&props, AMQP_PORT), list);
        assert!(!HandshakeProperties::advertising(&FailoverList::empty()).contains_key(FAILOVER_SERVER_LIST));
    }

    #[test]
    fn test_parse_failover_urls() {
        assert!(parse_failover_urls("").unwrap().is_empty());
        assert_eq!(parse_failover_urls("amqp://a:1,,amqp://b:2").unwrap().len(), 2);
        assert!(parse_failover_urls("amqp://a:1, nonsense").is_err());
    }
}
