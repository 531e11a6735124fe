//! Backend consistency verification
//!
//! The one point where the UI-driven and API-driven views of state are
//! cross-checked: a UI deletion can appear to succeed visually while the
//! backend lags or diverges, so after deleting through the UI the record is
//! read back out-of-band and expected to be gone.
//!
//! The read carries the cookies exported from the browser session, so it
//! observes the backend through the same authenticated context the UI does.

use std::fmt;
use std::time::Duration;

use reqwest::header::COOKIE;
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{LifecycleError, LifecycleResult};
use crate::session::Session;

/// Outcome of a backend read, correlated against an expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    /// The record is served (2xx).
    Ok,
    /// The record is gone (404).
    NotFound,
    /// Anything else, carrying the status code.
    Other(u16),
}

impl StatusOutcome {
    fn from_status(status: StatusCode) -> Self {
        if status == StatusCode::NOT_FOUND {
            StatusOutcome::NotFound
        } else if status.is_success() {
            StatusOutcome::Ok
        } else {
            StatusOutcome::Other(status.as_u16())
        }
    }
}

impl fmt::Display for StatusOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusOutcome::Ok => write!(f, "ok"),
            StatusOutcome::NotFound => write!(f, "not-found"),
            StatusOutcome::Other(code) => write!(f, "status {}", code),
        }
    }
}

/// Read-only client for the PIM employee endpoint.
pub struct PimClient {
    client: reqwest::Client,
    base_url: String,
    cookie_header: String,
}

impl PimClient {
    pub fn new(base_url: &str, cookie_header: String) -> LifecycleResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_header,
        })
    }

    /// Build a client that replays the session's cookies, so the backend
    /// sees the same authenticated context the UI does.
    pub async fn from_session(session: &mut Session) -> LifecycleResult<Self> {
        let cookies = session.bridge().cookies().await?;
        let cookie_header = cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        Self::new(session.base_url(), cookie_header)
    }

    /// Raw read of `GET /api/v2/pim/employees/{id}`, mapped to an outcome.
    pub async fn employee_status(&self, employee_id: &str) -> LifecycleResult<StatusOutcome> {
        let url = format!("{}/api/v2/pim/employees/{}", self.base_url, employee_id);
        let mut request = self.client.get(&url);
        if !self.cookie_header.is_empty() {
            request = request.header(COOKIE, &self.cookie_header);
        }
        let response = request.send().await?;
        let outcome = StatusOutcome::from_status(response.status());
        debug!(%url, %outcome, "backend read");
        Ok(outcome)
    }

    /// Read expecting a specific outcome; a mismatch is the scenario's
    /// primary correctness assertion failure, distinct from timeouts.
    pub async fn expect_status(
        &self,
        employee_id: &str,
        expected: StatusOutcome,
    ) -> LifecycleResult<StatusOutcome> {
        let outcome = self.employee_status(employee_id).await?;
        if outcome != expected {
            return Err(LifecycleError::ConsistencyMismatch {
                employee_id: employee_id.to_string(),
                expected,
                outcome,
            });
        }
        Ok(outcome)
    }

    /// Confirm the record is no longer served after deletion.
    pub async fn confirm_absence(&self, employee_id: &str) -> LifecycleResult<StatusOutcome> {
        self.expect_status(employee_id, StatusOutcome::NotFound).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test_case(StatusCode::OK => StatusOutcome::Ok; "200 is ok")]
    #[test_case(StatusCode::CREATED => StatusOutcome::Ok; "201 is ok")]
    #[test_case(StatusCode::NOT_FOUND => StatusOutcome::NotFound; "404 is not-found")]
    #[test_case(StatusCode::UNAUTHORIZED => StatusOutcome::Other(401); "401 is other")]
    #[test_case(StatusCode::INTERNAL_SERVER_ERROR => StatusOutcome::Other(500); "500 is other")]
    fn status_mapping(status: StatusCode) -> StatusOutcome {
        StatusOutcome::from_status(status)
    }

    #[test]
    fn outcome_display_distinguishes_cases() {
        assert_eq!(StatusOutcome::Ok.to_string(), "ok");
        assert_eq!(StatusOutcome::NotFound.to_string(), "not-found");
        assert_eq!(StatusOutcome::Other(502).to_string(), "status 502");
    }

    /// Serves `connections` canned HTTP responses with the given status line,
    /// then stops. Returns the base URL.
    async fn canned_server(status_line: &'static str, connections: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            for _ in 0..connections {
                let Ok((mut stream, _)) = listener.accept().await else { return };
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nconnection: close\r\ncontent-length: 0\r\n\r\n",
                    status_line
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn confirm_absence_accepts_not_found_and_is_idempotent() {
        let base_url = canned_server("404 Not Found", 2).await;
        let client = PimClient::new(&base_url, String::new()).unwrap();

        // Repeated reads after deletion keep yielding not-found.
        assert_eq!(
            client.confirm_absence("0421").await.unwrap(),
            StatusOutcome::NotFound
        );
        assert_eq!(
            client.confirm_absence("0421").await.unwrap(),
            StatusOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn confirm_absence_rejects_a_served_record() {
        let base_url = canned_server("200 OK", 1).await;
        let client = PimClient::new(&base_url, String::new()).unwrap();

        let err = client.confirm_absence("0421").await.unwrap_err();
        match err {
            LifecycleError::ConsistencyMismatch { employee_id, expected, outcome } => {
                assert_eq!(employee_id, "0421");
                assert_eq!(expected, StatusOutcome::NotFound);
                assert_eq!(outcome, StatusOutcome::Ok);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn expect_status_checks_the_pre_deletion_read() {
        let base_url = canned_server("200 OK", 1).await;
        let client = PimClient::new(&base_url, String::new()).unwrap();

        let outcome = client.expect_status("0421", StatusOutcome::Ok).await.unwrap();
        assert_eq!(outcome, StatusOutcome::Ok);
    }
}
