//! Embedding backends
//!
//! Two backends behind one trait:
//! - [`HashEmbedder`]: offline signed feature hashing, deterministic per seed
//! - [`OpenAiEmbedder`]: blocking client for an OpenAI-compatible `/embeddings`
//!   endpoint (also served by text-embeddings-inference)
//!
//! Backends may return unnormalised vectors; the coverage scorer normalises.

use crate::error::EmbedError;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vignette_core::EmbeddingBackendConfig;

/// Maps texts to vectors in a shared space
pub trait Embedder: Send + Sync {
    /// One vector per input, in input order
    ///
    /// # Errors
    /// Backend failures; the caller aborts the current log.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Output dimension, when known before the first call
    fn dimensions(&self) -> Option<usize>;

    /// Backend name, for logs
    fn name(&self) -> &str;
}

/// Scale to unit length; zero vectors stay zero
pub fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec.iter_mut() {
        *value /= norm;
    }
}

/// Signed feature hashing of word unigrams and bigrams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEmbedder {
    dimensions: usize,
    seed: u64,
}

impl HashEmbedder {
    /// Create embedder; `dimensions` must be positive
    ///
    /// # Errors
    /// `EmbedError::Config` for zero dimensions.
    pub fn new(dimensions: usize, seed: u64) -> Result<Self, EmbedError> {
        if dimensions == 0 {
            return Err(EmbedError::Config("hash dimensions must be positive".to_string()));
        }
        Ok(Self { dimensions, seed })
    }

    /// Embed one text
    #[must_use]
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let mut vec = vec![0.0f32; self.dimensions];
        for word in &words {
            self.accumulate(&mut vec, word);
        }
        for pair in words.windows(2) {
            self.accumulate(&mut vec, &format!("{} {}", pair[0], pair[1]));
        }
        vec
    }

    fn accumulate(&self, vec: &mut [f32], feature: &str) {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(feature.as_bytes());
        let hash = hasher.finalize();
        let bytes = hash.as_bytes();
        let mut word = [0u8; 8];
        word.copy_from_slice(&bytes[..8]);
        let bucket = u64::from_le_bytes(word) % self.dimensions as u64;
        let index = usize::try_from(bucket).unwrap_or(0);
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        vec[index] += sign;
    }
}

impl Embedder for HashEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// OpenAI-compatible `/embeddings` client
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: HttpClient,
    model: String,
    api_key: Option<String>,
    base_url: String,
    batch_size: usize,
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("batch_size", &self.batch_size)
            .field("has_api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiEmbedder {
    /// Create client
    ///
    /// # Errors
    /// `EmbedError::Config` for a zero batch size, or client build failures.
    pub fn new(
        model: impl Into<String>,
        base_url: &str,
        api_key: Option<String>,
        batch_size: usize,
    ) -> Result<Self, EmbedError> {
        if batch_size == 0 {
            return Err(EmbedError::Config("batch size must be positive".to_string()));
        }
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            model: model.into(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            batch_size,
        })
    }

    /// Model name sent with each request
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap, EmbedError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| EmbedError::Config(format!("invalid api key: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.model,
            input: chunk,
        };
        let response = self
            .client
            .post(url)
            .headers(self.headers()?)
            .json(&request)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .map_or_else(|_| "unknown error".to_string(), |body| body.error.message);
            return Err(EmbedError::Status {
                status: status.as_u16(),
                message,
            });
        }
        let mut body: EmbeddingResponse = response.json()?;
        if body.data.len() != chunk.len() {
            return Err(EmbedError::CountMismatch {
                expected: chunk.len(),
                got: body.data.len(),
            });
        }
        body.data.sort_by_key(|item| item.index.unwrap_or(usize::MAX));
        Ok(body.data.into_iter().map(|item| item.embedding).collect())
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_chunk(chunk)?);
        }
        tracing::debug!(model = %self.model, inputs = texts.len(), "embedded batch");
        Ok(vectors)
    }

    fn dimensions(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Build the configured backend
///
/// The API key is read from the configured environment variable; when unset,
/// requests go out without an `Authorization` header.
///
/// # Errors
/// Invalid settings or client build failures.
pub fn build_embedder(config: &EmbeddingBackendConfig) -> Result<Box<dyn Embedder>, EmbedError> {
    match config {
        EmbeddingBackendConfig::Hash { dimensions, seed } => {
            Ok(Box::new(HashEmbedder::new(*dimensions, *seed)?))
        }
        EmbeddingBackendConfig::OpenAi {
            model,
            base_url,
            api_key_env,
            batch_size,
        } => {
            let api_key = std::env::var(api_key_env).ok().filter(|k| !k.is_empty());
            if api_key.is_none() {
                tracing::warn!(var = %api_key_env, "embedding api key not set, sending unauthenticated requests");
            }
            Ok(Box::new(OpenAiEmbedder::new(
                model.clone(),
                base_url,
                api_key,
                *batch_size,
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let mut a = a.to_vec();
        let mut b = b.to_vec();
        normalize(&mut a);
        normalize(&mut b);
        a.iter().zip(&b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn normalize_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        let mut zero = vec![0.0, 0.0];
        normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[test]
    fn hash_embedder_is_deterministic() {
        let e = HashEmbedder::new(256, 7).unwrap();
        assert_eq!(e.embed_text("Mr H had a knife"), e.embed_text("Mr H had a knife"));
        let other = HashEmbedder::new(256, 8).unwrap();
        assert_ne!(e.embed_text("Mr H had a knife"), other.embed_text("Mr H had a knife"));
    }

    #[test]
    fn hash_embedder_ignores_case_and_punctuation() {
        let e = HashEmbedder::new(512, 1).unwrap();
        let sim = cosine(
            &e.embed_text("Mr H was found with a knife."),
            &e.embed_text("mr h was found with a knife"),
        );
        assert!((sim - 1.0).abs() < 1e-5);
    }

    #[test]
    fn hash_embedder_separates_unrelated_text() {
        let e = HashEmbedder::new(1024, 1).unwrap();
        let sim = cosine(
            &e.embed_text("Mr H was found with a knife."),
            &e.embed_text("The shopkeeper was threatened repeatedly yesterday."),
        );
        assert!(sim < 0.85);
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(HashEmbedder::new(0, 1), Err(EmbedError::Config(_))));
    }

    #[test]
    fn build_hash_backend() {
        let embedder = build_embedder(&EmbeddingBackendConfig::Hash {
            dimensions: 64,
            seed: 3,
        })
        .unwrap();
        assert_eq!(embedder.name(), "hash");
        assert_eq!(embedder.dimensions(), Some(64));
        let out = embedder.embed_batch(&["a b".to_string()]).unwrap();
        assert_eq!(out[0].len(), 64);
    }

    #[test]
    fn openai_rejects_zero_batch() {
        assert!(matches!(
            OpenAiEmbedder::new("m", "http://localhost:1/v1", None, 0),
            Err(EmbedError::Config(_))
        ));
    }

    #[test]
    fn openai_debug_hides_key() {
        let e = OpenAiEmbedder::new("m", "http://localhost:1/v1/", Some("secret".to_string()), 8)
            .unwrap();
        let shown = format!("{e:?}");
        assert!(!shown.contains("secret"));
        assert!(shown.contains("http://localhost:1/v1\""));
    }
}
