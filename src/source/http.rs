use super::{parse_pool, validate_key, CardSource};
use crate::error::LoadError;
use crate::model::Card;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;

/// Fetches pools over HTTP(S), resolving source keys against a base URL.
///
/// The client has no request timeout of its own; callers bound each fetch
/// with [`super::fetch_with_timeout`].
#[derive(Debug, Clone)]
pub struct HttpSource {
    http: reqwest::Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url).context("invalid base URL")?;
        // `Url::join` replaces the last segment unless the path ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .user_agent(format!("card-draw/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self { http, base })
    }

    pub fn url_for(&self, key: &str) -> Result<Url, LoadError> {
        let key = validate_key(key)?;
        self.base
            .join(key)
            .map_err(|_| LoadError::InvalidKey(key.to_string()))
    }
}

#[async_trait]
impl CardSource for HttpSource {
    async fn fetch(&self, key: &str) -> Result<Vec<Card>, LoadError> {
        let url = self.url_for(key)?;
        tracing::debug!(%url, "fetching card pool");
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(LoadError::Status {
                status: resp.status().as_u16(),
            });
        }
        let body = resp.bytes().await?;
        parse_pool(&body)
    }
}
