// ─── HTTP ───
// Shared client for metadata, libraries and assets.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

use crate::core::error::LauncherResult;

const USER_AGENT: &str = concat!("Blocklaunch/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// Idle time between body chunks before a transfer is abandoned.
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Bodies are hashed exactly as served, so transparent compression is off.
pub fn build_http_client() -> LauncherResult<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(READ_TIMEOUT)
        .build()?)
}
