use std::future::Future;

use crate::data::Response;
use crate::error::FetchError;

/// Asynchronous HTTP client abstraction.
///
/// Implementations follow redirects on their own and report every status
/// they end up with, including `4xx` and `5xx`, as a [`Response`]. Only
/// transport failures are errors.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Issue a GET request and buffer the whole body.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch, without a fragment
    /// * `headers` - Headers to send, in order; repeated names are all sent
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] describing the transport failure
    /// (connection refused, DNS failure, timeout, malformed URL).
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<Response, FetchError>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::error::Error as _;

    use super::*;

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default configuration.
        pub fn new() -> Result<Self, FetchError> {
            let client = reqwest::Client::builder()
                .user_agent(concat!("linkward/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| FetchError::Network(e.to_string()))?;
            Ok(Self { client })
        }

        /// Wrap an already configured reqwest client.
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl HttpClient for ReqwestClient {
        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> Result<Response, FetchError> {
            let mut request = self.client.get(url);

            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await.map_err(|e| map_error(url, e))?;
            let status = i32::from(response.status().as_u16());

            let mut result = Response::new(url, status);
            for (name, value) in response.headers() {
                if let Ok(value) = value.to_str() {
                    result = result.header(name.as_str(), value);
                }
            }

            let body = response.bytes().await.map_err(|e| map_error(url, e))?;
            Ok(result.body(body))
        }
    }

    fn map_error(url: &str, error: reqwest::Error) -> FetchError {
        let host = error
            .url()
            .and_then(|u| u.host_str())
            .unwrap_or(url)
            .to_string();

        if error.is_builder() {
            return FetchError::InvalidUrl(url.to_string());
        }
        if error.is_timeout() {
            return FetchError::Timeout(url.to_string());
        }
        if error.is_connect() {
            if is_dns_failure(&error) {
                return FetchError::UnknownHost(host);
            }
            return FetchError::ConnectionRefused(root_cause(&error));
        }
        FetchError::Network(root_cause(&error))
    }

    fn is_dns_failure(error: &reqwest::Error) -> bool {
        let mut source = error.source();
        while let Some(err) = source {
            let message = err.to_string();
            if message.contains("dns error") || message.contains("failed to lookup address") {
                return true;
            }
            source = err.source();
        }
        false
    }

    fn root_cause(error: &reqwest::Error) -> String {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(err) = source {
            message = err.to_string();
            source = err.source();
        }
        message
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
