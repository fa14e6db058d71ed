//! vPIC catalog HTTP client
//!
//! Issues single bounded-time GETs and classifies every failure into the
//! ingestion taxonomy. Retrying is the caller's responsibility via
//! [`crate::retry::with_retry`]; this client never retries itself.

use crate::error::{retryable_transport, IngestError};
use std::time::Duration;

/// Per-request timeout for catalog fetches
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("vcat/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the upstream vehicle catalog
pub struct VpicClient {
    http: reqwest::Client,
    base_url: String,
}

impl VpicClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, IngestError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| IngestError::network(e.to_string(), None, false))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Endpoint listing every vehicle make in the catalog
    pub fn all_makes_url(&self) -> String {
        format!("{}/getallmakes?format=XML", self.base_url)
    }

    /// Endpoint listing the vehicle types for one make
    pub fn vehicle_types_url(&self, make_id: i64) -> String {
        format!(
            "{}/GetVehicleTypesForMakeId/{}?format=XML",
            self.base_url, make_id
        )
    }

    /// One GET with the fixed timeout, classified into the taxonomy.
    ///
    /// Status >= 400 becomes a network error carrying the status; only
    /// server errors (5xx) are marked retryable. A timeout is retryable
    /// with no status. Any other transport failure carries the
    /// transport-classification verdict.
    pub async fn fetch_with_timeout(&self, url: &str) -> Result<String, IngestError> {
        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                IngestError::network(
                    format!("Request timeout after {}ms", HTTP_TIMEOUT.as_millis()),
                    None,
                    true,
                )
            } else {
                let retryable = retryable_transport(&e);
                IngestError::network(e.to_string(), e.status().map(|s| s.as_u16()), retryable)
            }
        })?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(IngestError::network(
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("unknown status")
                ),
                Some(status.as_u16()),
                status.as_u16() >= 500,
            ));
        }

        response.text().await.map_err(|e| {
            let retryable = retryable_transport(&e);
            IngestError::network(e.to_string(), None, retryable)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_urls_carry_the_xml_format_parameter() {
        let client = VpicClient::new("https://vpic.example.org/api/vehicles").unwrap();
        assert_eq!(
            client.all_makes_url(),
            "https://vpic.example.org/api/vehicles/getallmakes?format=XML"
        );
        assert_eq!(
            client.vehicle_types_url(440),
            "https://vpic.example.org/api/vehicles/GetVehicleTypesForMakeId/440?format=XML"
        );
    }

    #[tokio::test]
    async fn mid_request_connection_reset_is_retryable() {
        use tokio::io::AsyncReadExt;

        // A server that reads the request and then drops the socket with
        // linger zero, so the client sees ECONNRESET after the connect
        // has already succeeded.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let _ = stream.set_linger(Some(Duration::ZERO));
                drop(stream);
            }
        });

        let client = VpicClient::new(format!("http://{}", addr)).unwrap();
        let err = client
            .fetch_with_timeout(&client.all_makes_url())
            .await
            .unwrap_err();

        match err {
            IngestError::Network { retryable, .. } => {
                assert!(retryable, "a reset connection should be retryable");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn connect_failure_is_a_retryable_network_error() {
        // Nothing listens on this port; the connect error must classify
        // as retryable without the client retrying on its own.
        let client = VpicClient::new("http://127.0.0.1:1").unwrap();
        let err = client
            .fetch_with_timeout(&client.all_makes_url())
            .await
            .unwrap_err();

        match err {
            IngestError::Network { retryable, status, .. } => {
                assert!(retryable);
                assert_eq!(status, None);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
