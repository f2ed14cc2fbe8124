use std::env;
use std::fmt;

use tablesync_core::{Namespace, Result, SyncError};

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-west-2";

pub const NAMESPACE_ENV: &str = "TABLESYNC_NAMESPACE";
pub const ACCESS_KEY_ID_ENV: &str = "TABLESYNC_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_ENV: &str = "TABLESYNC_SECRET_ACCESS_KEY";
pub const HOST_ENV: &str = "TABLESYNC_HOST";
pub const PORT_ENV: &str = "TABLESYNC_PORT";
pub const IS_SECURE_ENV: &str = "TABLESYNC_IS_SECURE";
pub const REGION_ENV: &str = "TABLESYNC_REGION";

/// Static access/secret key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}

/// Endpoint replacing the regional one, e.g. a local DynamoDB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointOverride {
    pub host: String,
    pub port: Option<u16>,
    pub use_tls: bool,
}

impl EndpointOverride {
    pub fn url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        match self.port {
            Some(port) => format!("{}://{}:{}", scheme, self.host, port),
            None => format!("{}://{}", scheme, self.host),
        }
    }
}

/// Process configuration, validated once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix applied to every logical table name.
    pub namespace: Namespace,
    pub credentials: Credentials,
    /// `None` means the default regional endpoint.
    pub endpoint: Option<EndpointOverride>,
    pub region: String,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load configuration from environment variables only.
    ///
    /// Environment variables:
    /// - `TABLESYNC_NAMESPACE` - Physical table name prefix (required)
    /// - `TABLESYNC_ACCESS_KEY_ID` - Access key (required)
    /// - `TABLESYNC_SECRET_ACCESS_KEY` - Secret key (required)
    /// - `TABLESYNC_HOST` - Endpoint host override (optional)
    /// - `TABLESYNC_PORT` - Endpoint port override (optional)
    /// - `TABLESYNC_IS_SECURE` - Use TLS for the endpoint override (default: false)
    /// - `TABLESYNC_REGION` - Region (default: "us-west-2")
    pub fn from_env() -> Result<Self> {
        ConfigBuilder::default().with_env().build()
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("Local DynamoDB ({})", endpoint.url()),
            None => format!("AWS DynamoDB (region: {})", self.region),
        }
    }
}

/// Collects configuration values. Explicit values win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    namespace: Option<String>,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    host: Option<String>,
    port: Option<String>,
    is_secure: Option<String>,
    region: Option<String>,
}

impl ConfigBuilder {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn access_key_id(mut self, access_key_id: impl Into<String>) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self
    }

    pub fn secret_access_key(mut self, secret_access_key: impl Into<String>) -> Self {
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port.to_string());
        self
    }

    pub fn is_secure(mut self, is_secure: bool) -> Self {
        self.is_secure = Some(is_secure.to_string());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Fills unset values from the process environment.
    pub fn with_env(self) -> Self {
        self.with_lookup(|key| env::var(key).ok())
    }

    /// Fills unset values through `lookup`, keyed by environment variable name.
    pub fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let fill = |value: Option<String>, key: &str| -> Option<String> {
            present(value).or_else(|| present(lookup(key)))
        };
        self.namespace = fill(self.namespace, NAMESPACE_ENV);
        self.access_key_id = fill(self.access_key_id, ACCESS_KEY_ID_ENV);
        self.secret_access_key = fill(self.secret_access_key, SECRET_ACCESS_KEY_ENV);
        self.host = fill(self.host, HOST_ENV);
        self.port = fill(self.port, PORT_ENV);
        self.is_secure = fill(self.is_secure, IS_SECURE_ENV);
        self.region = fill(self.region, REGION_ENV);
        self
    }

    /// Validates the collected values.
    pub fn build(self) -> Result<Config> {
        let namespace = present(self.namespace).ok_or_else(|| {
            configuration_error(format!(
                "Missing namespace OR environment variable {}",
                NAMESPACE_ENV
            ))
        })?;
        let namespace = Namespace::new(namespace)?;

        let access_key_id = present(self.access_key_id).ok_or_else(|| {
            configuration_error(format!(
                "Missing access_key_id OR environment variable {}",
                ACCESS_KEY_ID_ENV
            ))
        })?;
        let secret_access_key = present(self.secret_access_key).ok_or_else(|| {
            configuration_error(format!(
                "Missing secret_access_key OR environment variable {}",
                SECRET_ACCESS_KEY_ENV
            ))
        })?;

        let port = match present(self.port) {
            Some(port) => Some(port.trim().parse::<u16>().map_err(|_| {
                configuration_error(format!(
                    "Integer value expected for port OR environment variable {}. Got {}",
                    PORT_ENV, port
                ))
            })?),
            None => None,
        };

        let use_tls = match present(self.is_secure) {
            Some(flag) => parse_flag(&flag).ok_or_else(|| {
                configuration_error(format!(
                    "Boolean value expected for is_secure OR environment variable {}. Got {}",
                    IS_SECURE_ENV, flag
                ))
            })?,
            None => false,
        };

        let endpoint = present(self.host).map(|host| EndpointOverride {
            host,
            port,
            use_tls,
        });

        let config = Config {
            namespace,
            credentials: Credentials::new(access_key_id, secret_access_key),
            endpoint,
            region: present(self.region).unwrap_or_else(|| DEFAULT_REGION.to_string()),
        };

        tracing::info!(
            namespace = %config.namespace,
            target = %config.target_display(),
            "Configuration loaded"
        );
        Ok(config)
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn configuration_error(message: String) -> SyncError {
    tracing::error!("ConfigurationError: {}", message);
    SyncError::Configuration(message)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn base_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (NAMESPACE_ENV, "dev_"),
            (ACCESS_KEY_ID_ENV, "AKIDEXAMPLE"),
            (SECRET_ACCESS_KEY_ENV, "secret"),
        ]
    }

    #[test]
    fn test_build_from_lookup() {
        let config = Config::builder()
            .with_lookup(lookup(&base_env()))
            .build()
            .unwrap();

        assert_eq!(config.namespace.as_str(), "dev_");
        assert_eq!(config.credentials.access_key_id(), "AKIDEXAMPLE");
        assert_eq!(config.credentials.secret_access_key(), "secret");
        assert_eq!(config.endpoint, None);
        assert_eq!(config.region, DEFAULT_REGION);
        assert_eq!(config.target_display(), "AWS DynamoDB (region: us-west-2)");
    }

    #[test]
    fn test_explicit_values_win() {
        let config = Config::builder()
            .namespace("prod_")
            .region("eu-west-1")
            .with_lookup(lookup(&base_env()))
            .build()
            .unwrap();

        assert_eq!(config.namespace.as_str(), "prod_");
        assert_eq!(config.region, "eu-west-1");
    }

    #[test]
    fn test_missing_namespace() {
        let result = Config::builder()
            .access_key_id("a")
            .secret_access_key("b")
            .with_lookup(lookup(&[]))
            .build();
        assert!(matches!(result, Err(SyncError::Configuration(msg)) if msg.contains(NAMESPACE_ENV)));
    }

    #[test]
    fn test_empty_namespace_is_missing() {
        let result = Config::builder()
            .namespace("")
            .access_key_id("a")
            .secret_access_key("b")
            .with_lookup(lookup(&[]))
            .build();
        assert!(matches!(result, Err(SyncError::Configuration(_))));
    }

    #[test]
    fn test_missing_credentials() {
        let result = Config::builder()
            .namespace("dev_")
            .secret_access_key("b")
            .with_lookup(lookup(&[]))
            .build();
        assert!(matches!(result, Err(SyncError::Configuration(msg)) if msg.contains(ACCESS_KEY_ID_ENV)));

        let result = Config::builder()
            .namespace("dev_")
            .access_key_id("a")
            .with_lookup(lookup(&[]))
            .build();
        assert!(
            matches!(result, Err(SyncError::Configuration(msg)) if msg.contains(SECRET_ACCESS_KEY_ENV))
        );
    }

    #[test]
    fn test_malformed_port() {
        let mut vars = base_env();
        vars.push((HOST_ENV, "localhost"));
        vars.push((PORT_ENV, "eight thousand"));
        let result = Config::builder().with_lookup(lookup(&vars)).build();
        assert!(matches!(result, Err(SyncError::Configuration(msg)) if msg.contains("eight thousand")));
    }

    #[test]
    fn test_malformed_tls_flag() {
        let mut vars = base_env();
        vars.push((IS_SECURE_ENV, "maybe"));
        let result = Config::builder().with_lookup(lookup(&vars)).build();
        assert!(matches!(result, Err(SyncError::Configuration(_))));
    }

    #[test]
    fn test_endpoint_override() {
        let mut vars = base_env();
        vars.push((HOST_ENV, "localhost"));
        vars.push((PORT_ENV, "8000"));
        let config = Config::builder().with_lookup(lookup(&vars)).build().unwrap();

        let endpoint = config.endpoint.clone().unwrap();
        assert_eq!(endpoint.port, Some(8000));
        assert!(!endpoint.use_tls);
        assert_eq!(endpoint.url(), "http://localhost:8000");
        assert_eq!(
            config.target_display(),
            "Local DynamoDB (http://localhost:8000)"
        );
    }

    #[test]
    fn test_endpoint_override_with_tls() {
        let config = Config::builder()
            .host("dynamo.internal")
            .is_secure(true)
            .with_lookup(lookup(&base_env()))
            .build()
            .unwrap();
        assert_eq!(
            config.endpoint.map(|e| e.url()),
            Some("https://dynamo.internal".to_string())
        );
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let credentials = Credentials::new("AKIDEXAMPLE", "super-secret");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("super-secret"));
    }
}
