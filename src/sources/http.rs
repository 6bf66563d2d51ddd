//! # Network client contract (and optional reqwest implementation).
//!
//! [`HttpClient`] separates the two failure planes the modules care
//! about: a request that could not complete at all raises [`HttpError`]
//! (fatal for the calling module's update cycle), while a completed
//! request with a non-2xx status is *not* an error here — callers inspect
//! [`HttpClient::response_code`] and map statuses to their own policy
//! (e.g. 401 → "Bad credentials").

use async_trait::async_trait;

use crate::error::HttpError;

/// Minimal HTTP capability consumed by network modules.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Performs a GET and returns the response body.
    async fn get(&self, url: &str) -> Result<String, HttpError>;

    /// Performs a form POST and returns the response body.
    ///
    /// `fields` are sent urlencoded; `auth` adds Basic credentials
    /// (user, password). The request is performed with the credentials —
    /// the body is returned from the *authenticated* call.
    async fn post(
        &self,
        url: &str,
        fields: &[(&str, &str)],
        auth: Option<(&str, &str)>,
    ) -> Result<String, HttpError>;

    /// Status code of the most recently completed request (0 before any).
    fn response_code(&self) -> u16;
}

#[cfg(feature = "http")]
pub use downloader::Downloader;

#[cfg(feature = "http")]
mod downloader {
    use std::sync::atomic::{AtomicU16, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::HttpClient;
    use crate::error::HttpError;

    /// reqwest-backed [`HttpClient`].
    ///
    /// Follows redirects, negotiates deflate, and identifies itself with
    /// a crate user-agent. The last completed status is kept for
    /// [`HttpClient::response_code`].
    pub struct Downloader {
        client: reqwest::Client,
        status: AtomicU16,
    }

    impl Downloader {
        /// Creates a client with the given connection timeout.
        pub fn new(connect_timeout: Duration) -> Result<Self, HttpError> {
            let client = reqwest::Client::builder()
                .connect_timeout(connect_timeout)
                .redirect(reqwest::redirect::Policy::limited(10))
                .user_agent(concat!("barvisor/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| HttpError::new(e.to_string()))?;
            Ok(Self {
                client,
                status: AtomicU16::new(0),
            })
        }

        async fn read(&self, response: reqwest::Response) -> Result<String, HttpError> {
            self.status.store(response.status().as_u16(), Ordering::Relaxed);
            response.text().await.map_err(|e| HttpError::new(e.to_string()))
        }
    }

    #[async_trait]
    impl HttpClient for Downloader {
        async fn get(&self, url: &str) -> Result<String, HttpError> {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| HttpError::new(e.to_string()))?;
            self.read(response).await
        }

        async fn post(
            &self,
            url: &str,
            fields: &[(&str, &str)],
            auth: Option<(&str, &str)>,
        ) -> Result<String, HttpError> {
            let mut request = self.client.post(url).form(fields);
            if let Some((user, password)) = auth {
                request = request.basic_auth(user, Some(password));
            }
            let response = request
                .send()
                .await
                .map_err(|e| HttpError::new(e.to_string()))?;
            self.read(response).await
        }

        fn response_code(&self) -> u16 {
            self.status.load(Ordering::Relaxed)
        }
    }
}
