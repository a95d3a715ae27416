use crate::Result;
use async_trait::async_trait;

/// Fetches raw tile bytes by URL.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

#[cfg(feature = "http")]
pub use http::HttpTileFetcher;

#[cfg(feature = "http")]
mod http {
    use super::TileFetcher;
    use crate::{Result, ViewerError};
    use async_trait::async_trait;

    /// Fetches tiles over HTTP(S) with `reqwest`.
    ///
    /// Sends a descriptive User-Agent so public tile servers don't reject the
    /// request. Timeouts are applied by the caller.
    #[derive(Debug, Clone)]
    pub struct HttpTileFetcher {
        client: reqwest::Client,
    }

    impl HttpTileFetcher {
        pub fn new() -> Result<Self> {
            let client = reqwest::Client::builder()
                .user_agent(concat!("relief/", env!("CARGO_PKG_VERSION")))
                .build()?;
            Ok(Self { client })
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl TileFetcher for HttpTileFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            log::debug!("fetch DEM tile {}", url);
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ViewerError::HttpStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            let bytes = response.bytes().await?;
            Ok(bytes.to_vec())
        }
    }
}
