//! CLI command implementations.

pub mod edit;
pub mod get;
pub mod put;
pub mod serve;

use notepad_sync_engine::{HttpTransport, ReqwestClient, DEFAULT_TIMEOUT};

/// Builds a blocking HTTP transport for `server`.
pub(crate) fn transport(
    server: &str,
) -> Result<HttpTransport<ReqwestClient>, Box<dyn std::error::Error>> {
    let client = ReqwestClient::new(DEFAULT_TIMEOUT)?;
    Ok(HttpTransport::new(server, client))
}
