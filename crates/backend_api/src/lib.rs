use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::ProductId,
    error::BackendError,
    protocol::{Catalog, PitchRequest, RecommendationResponse},
};
use tracing::debug;
use url::Url;

/// The pitch backend as the client consumes it. Each call is atomic from the
/// client's perspective; no partial success is possible within one request.
#[async_trait]
pub trait PitchBackend: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Catalog, BackendError>;
    async fn recommend(&self, payload: &PitchRequest)
        -> Result<RecommendationResponse, BackendError>;
    /// Returns the combined pitch deck as raw PDF bytes.
    async fn generate(&self, payload: &PitchRequest) -> Result<Vec<u8>, BackendError>;
    /// Returns the standalone pitch deck for a single product.
    async fn product_pitch(&self, product_id: &ProductId) -> Result<Vec<u8>, BackendError>;
}

/// Stub used where no backend has been wired up yet.
pub struct MissingPitchBackend;

#[async_trait]
impl PitchBackend for MissingPitchBackend {
    async fn fetch_catalog(&self) -> Result<Catalog, BackendError> {
        Err(BackendError::Transport("pitch backend is unavailable".into()))
    }

    async fn recommend(
        &self,
        _payload: &PitchRequest,
    ) -> Result<RecommendationResponse, BackendError> {
        Err(BackendError::Transport("pitch backend is unavailable".into()))
    }

    async fn generate(&self, _payload: &PitchRequest) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::Transport("pitch backend is unavailable".into()))
    }

    async fn product_pitch(&self, product_id: &ProductId) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::Transport(format!(
            "pitch backend is unavailable for product {product_id}"
        )))
    }
}

/// HTTP implementation of [`PitchBackend`] over reqwest.
pub struct HttpPitchBackend {
    http: Client,
    base_url: Url,
}

impl HttpPitchBackend {
    /// `base_url` is the backend root, e.g. `http://localhost:8000`.
    pub fn new(mut base_url: Url) -> Self {
        // Url::join drops the last path segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        Self {
            http: Client::new(),
            base_url,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|err| BackendError::Transport(format!("invalid endpoint {path}: {err}")))
    }
}

/// Maps a non-success response to [`BackendError::Status`], keeping the body
/// text verbatim so it can be surfaced to the operator unchanged.
async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        format!("request failed with status {status}")
    } else {
        body
    };
    Err(BackendError::status(status.as_u16(), message))
}

fn transport(err: reqwest::Error) -> BackendError {
    BackendError::Transport(err.to_string())
}

#[async_trait]
impl PitchBackend for HttpPitchBackend {
    async fn fetch_catalog(&self) -> Result<Catalog, BackendError> {
        let url = self.endpoint("api/catalog")?;
        debug!(%url, "fetching catalog");
        let response = self.http.get(url).send().await.map_err(transport)?;
        expect_success(response)
            .await?
            .json::<Catalog>()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))
    }

    async fn recommend(
        &self,
        payload: &PitchRequest,
    ) -> Result<RecommendationResponse, BackendError> {
        let url = self.endpoint("api/recommend")?;
        debug!(%url, industry = %payload.industry, "requesting recommendation");
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(transport)?;
        expect_success(response)
            .await?
            .json::<RecommendationResponse>()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))
    }

    async fn generate(&self, payload: &PitchRequest) -> Result<Vec<u8>, BackendError> {
        let url = self.endpoint("api/generate")?;
        debug!(%url, industry = %payload.industry, "requesting deck generation");
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(transport)?;
        let bytes = expect_success(response)
            .await?
            .bytes()
            .await
            .map_err(transport)?;
        Ok(bytes.to_vec())
    }

    async fn product_pitch(&self, product_id: &ProductId) -> Result<Vec<u8>, BackendError> {
        let url = self.endpoint(&format!("api/product-pitch/{product_id}"))?;
        debug!(%url, %product_id, "fetching product pitch deck");
        let response = self.http.get(url).send().await.map_err(transport)?;
        let bytes = expect_success(response)
            .await?
            .bytes()
            .await
            .map_err(transport)?;
        Ok(bytes.to_vec())
    }
}
