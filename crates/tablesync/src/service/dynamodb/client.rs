//! AWS SDK client setup (Imperative Shell).

use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::Client;

use crate::config::Config;

/// Creates a DynamoDB client from the validated configuration.
///
/// Static credentials from the configuration are always used. The endpoint
/// override, when present, replaces the regional endpoint.
pub async fn create_client(config: &Config) -> Client {
    let credentials = Credentials::new(
        config.credentials.access_key_id(),
        config.credentials.secret_access_key(),
        None,
        None,
        "tablesync",
    );

    let mut sdk_config_loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .credentials_provider(credentials);

    if let Some(endpoint) = &config.endpoint {
        sdk_config_loader = sdk_config_loader.endpoint_url(endpoint.url());
    }

    let sdk_config = sdk_config_loader.load().await;
    tracing::debug!(target_env = %config.target_display(), "DynamoDB client created");
    Client::new(&sdk_config)
}
