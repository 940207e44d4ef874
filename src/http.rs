//! Blocking HTTP plumbing shared by the remote service clients

use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::Result;
use crate::StarqueryError;

/// Create an HTTP client with the given timeout
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("starquery/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| StarqueryError::RemoteError(format!("Failed to create HTTP client: {}", e)))
}

/// Read a response body as text, failing on non-success status codes
pub fn read_text(response: Response) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        return Err(StarqueryError::RemoteError(format!(
            "request failed, status: {}",
            status
        )));
    }
    response
        .text()
        .map_err(|e| StarqueryError::RemoteError(format!("Failed to read response: {}", e)))
}

/// Quote a string literal for ADQL, doubling embedded single quotes
pub fn adql_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adql_quote() {
        assert_eq!(adql_quote("2MASS J04013208+2607332"), "'2MASS J04013208+2607332'");
        assert_eq!(adql_quote("Barnard's Star"), "'Barnard''s Star'");
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(Duration::from_secs(5)).is_ok());
    }
}
