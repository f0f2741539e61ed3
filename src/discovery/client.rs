//! The cloud API boundary used by discovery.

use crate::discovery::error::ClientError;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Datasource query parameters, e.g. `compartment_id` or `vcn_id`.
pub type QueryParams = BTreeMap<String, String>;

/// Default retry budget for discovery calls. Tighter than CRUD defaults
/// since discovery has to get past endpoints that 404/500 transiently.
pub const DEFAULT_RETRY_TIMEOUT: Duration = Duration::from_secs(15);

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(4);

#[derive(Debug, Clone)]
pub struct ListRequest<'a> {
    pub datasource: &'a str,
    pub params: &'a QueryParams,
    pub page: Option<&'a str>,
}

/// One page of a plural datasource read.
#[derive(Debug, Clone)]
pub struct ListPage {
    /// Datasource result object holding the items attribute
    pub body: JsonValue,
    pub next_page: Option<String>,
}

/// Calls the discovery engine needs from the cloud SDK. All calls block.
pub trait CloudClient {
    /// Tenancy of the authenticated principal.
    fn tenancy_id(&self) -> Result<String, ClientError>;

    /// Region the client is pinned to, if known.
    fn region(&self) -> Option<String>;

    /// Read one page of a plural datasource.
    fn list(&self, request: &ListRequest<'_>) -> Result<ListPage, ClientError>;

    /// Read a singular datasource; an empty `id` in the result means nothing exists.
    fn read_singular(&self, datasource: &str, params: &QueryParams)
        -> Result<JsonValue, ClientError>;

    /// Re-read one resource by id. `Ok(None)` means it no longer exists.
    fn get(&self, resource_type: &str, id: &str) -> Result<Option<JsonValue>, ClientError>;
}

/// Retries retryable failures with exponential backoff until the timeout elapses.
pub struct RetryingClient<C> {
    inner: C,
    timeout: Duration,
    initial_backoff: Duration,
}

impl<C: CloudClient> RetryingClient<C> {
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            initial_backoff: INITIAL_BACKOFF,
        }
    }

    #[cfg(test)]
    fn with_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn with_retry<T>(
        &self,
        operation: &str,
        mut call: impl FnMut() -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        let started = Instant::now();
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;

        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && started.elapsed() + backoff < self.timeout => {
                    warn!(
                        "{} failed on attempt {} ({}), retrying in {:?}",
                        operation, attempt, err, backoff
                    );
                    std::thread::sleep(backoff);
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    attempt += 1;
                }
                Err(err) => {
                    debug!("{} giving up after {} attempt(s): {}", operation, attempt, err);
                    return Err(err);
                }
            }
        }
    }
}

impl<C: CloudClient> CloudClient for RetryingClient<C> {
    fn tenancy_id(&self) -> Result<String, ClientError> {
        self.with_retry("tenancy lookup", || self.inner.tenancy_id())
    }

    fn region(&self) -> Option<String> {
        self.inner.region()
    }

    fn list(&self, request: &ListRequest<'_>) -> Result<ListPage, ClientError> {
        self.with_retry(request.datasource, || self.inner.list(request))
    }

    fn read_singular(
        &self,
        datasource: &str,
        params: &QueryParams,
    ) -> Result<JsonValue, ClientError> {
        self.with_retry(datasource, || self.inner.read_singular(datasource, params))
    }

    fn get(&self, resource_type: &str, id: &str) -> Result<Option<JsonValue>, ClientError> {
        self.with_retry(resource_type, || self.inner.get(resource_type, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    struct FlakyClient {
        failures_left: Cell<u32>,
        calls: Cell<u32>,
        error: ClientError,
    }

    impl FlakyClient {
        fn new(failures: u32, error: ClientError) -> Self {
            Self {
                failures_left: Cell::new(failures),
                calls: Cell::new(0),
                error,
            }
        }
    }

    impl CloudClient for FlakyClient {
        fn tenancy_id(&self) -> Result<String, ClientError> {
            self.calls.set(self.calls.get() + 1);
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err(self.error.clone());
            }
            Ok("ocid1.tenancy.oc1..t".to_string())
        }

        fn region(&self) -> Option<String> {
            None
        }

        fn list(&self, _request: &ListRequest<'_>) -> Result<ListPage, ClientError> {
            Ok(ListPage {
                body: json!({}),
                next_page: None,
            })
        }

        fn read_singular(&self, _: &str, _: &QueryParams) -> Result<JsonValue, ClientError> {
            Ok(json!({}))
        }

        fn get(&self, _: &str, _: &str) -> Result<Option<JsonValue>, ClientError> {
            Ok(None)
        }
    }

    #[test]
    fn test_retries_transient_failures() {
        let client = RetryingClient::new(
            FlakyClient::new(2, ClientError::Throttled),
            Duration::from_secs(5),
        )
        .with_backoff(Duration::ZERO);

        assert_eq!(client.tenancy_id().unwrap(), "ocid1.tenancy.oc1..t");
        assert_eq!(client.inner().calls.get(), 3);
    }

    #[test]
    fn test_does_not_retry_not_found() {
        let client = RetryingClient::new(
            FlakyClient::new(1, ClientError::NotFound("t".to_string())),
            Duration::from_secs(5),
        )
        .with_backoff(Duration::ZERO);

        assert!(client.tenancy_id().is_err());
        assert_eq!(client.inner().calls.get(), 1);
    }

    #[test]
    fn test_zero_timeout_disables_retry() {
        let client = RetryingClient::new(
            FlakyClient::new(1, ClientError::Throttled),
            Duration::ZERO,
        )
        .with_backoff(Duration::ZERO);

        assert_eq!(client.tenancy_id(), Err(ClientError::Throttled));
        assert_eq!(client.inner().calls.get(), 1);
    }
}
