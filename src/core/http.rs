use std::time::Duration;

use super::config::ProxyCredentials;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// HTTP client for listing pages, routed through the rotating proxy when
/// credentials are given.
pub fn build_client(proxy: Option<&ProxyCredentials>) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .pool_idle_timeout(IDLE_TIMEOUT)
        .pool_max_idle_per_host(100);

    if let Some(credentials) = proxy {
        tracing::info!(host = %credentials.host, port = %credentials.port, "routing requests through proxy");
        builder = builder.proxy(reqwest::Proxy::all(credentials.proxy_url())?);
    }

    builder.build()
}
