//! Embedding provider abstraction and the local fastembed implementation.
//!
//! Defines the [`EmbeddingProvider`] trait and [`LocalProvider`], which
//! runs a sentence-embedding model locally via fastembed (bundled ORT, no
//! network calls after the model download).
//!
//! Also provides vector utilities shared by the index and tests:
//! - [`l2_normalize`] — scale a vector to unit length
//! - [`l2_norm`] — compute a vector's Euclidean norm
//!
//! # Process-wide model state
//!
//! Loading the model is expensive, so [`global_provider`] memoizes a single
//! [`LocalProvider`] for the process lifetime. Initialization is lazy and
//! fails fast: if the model cannot be loaded, the first caller gets the
//! error and nothing is cached. There is no teardown — process exit
//! reclaims the model.
//!
//! # Batching
//!
//! `embed` accepts arbitrarily large input slices and batches internally
//! at the configured batch size to bound peak memory. Output order and
//! count always equal input order and count; batching is invisible to the
//! caller.

use std::sync::{Mutex, OnceLock};

use anyhow::{anyhow, bail, Result};

use crate::config::EmbeddingConfig;

/// Trait for embedding providers.
///
/// Implementations must return one unit-norm vector of exactly `dims()`
/// elements per input string, in input order.
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;

    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;

    /// Embed a batch of texts.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text.
    ///
    /// Convenience wrapper around [`EmbeddingProvider::embed`] for
    /// single-text use cases (e.g. embedding a search query).
    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Empty embedding response"))
    }
}

/// Embedding provider for local inference via fastembed.
///
/// The model is downloaded on first use from Hugging Face and cached;
/// after that, embedding runs entirely offline.
pub struct LocalProvider {
    // fastembed's embed call needs `&mut`, so the model sits behind a lock
    // even though the crate's query path is single-threaded.
    model: Mutex<fastembed::TextEmbedding>,
    model_name: String,
    dims: usize,
    batch_size: usize,
}

impl LocalProvider {
    /// Load the configured model.
    ///
    /// # Errors
    ///
    /// Fails fast if the model name is unknown or the model cannot be
    /// loaded (missing weights, incompatible environment). A failed
    /// construction leaves no partial state behind.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let dims = resolve_model_dims(&config.model)?;
        let fastembed_model = config_to_fastembed_model(&config.model)?;

        let model = fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(fastembed_model).with_show_download_progress(true),
        )
        .map_err(|e| {
            anyhow!(
                "Failed to initialize local embedding model '{}': {}",
                config.model,
                e
            )
        })?;

        Ok(Self {
            model: Mutex::new(model),
            model_name: config.model.clone(),
            dims,
            batch_size: config.batch_size.max(1),
        })
    }
}

impl EmbeddingProvider for LocalProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| anyhow!("Embedding model lock poisoned"))?;

        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let batch_embeddings = model
                .embed(batch.to_vec(), None)
                .map_err(|e| anyhow!("Local embedding failed: {}", e))?;

            if batch_embeddings.len() != batch.len() {
                bail!(
                    "Embedding batch size mismatch: sent {} texts, got {} vectors",
                    batch.len(),
                    batch_embeddings.len()
                );
            }

            for mut vector in batch_embeddings {
                if vector.len() != self.dims {
                    bail!(
                        "Embedding dimension mismatch: model '{}' returned {} dims, expected {}",
                        self.model_name,
                        vector.len(),
                        self.dims
                    );
                }
                l2_normalize(&mut vector);
                embeddings.push(vector);
            }
        }

        Ok(embeddings)
    }
}

/// Return the process-wide embedding provider, loading the model on first
/// use.
///
/// The provider is read-only after initialization and reused by every
/// subsequent caller regardless of their config; the first caller's model
/// choice wins for the process lifetime.
pub fn global_provider(config: &EmbeddingConfig) -> Result<&'static LocalProvider> {
    static PROVIDER: OnceLock<LocalProvider> = OnceLock::new();

    if let Some(provider) = PROVIDER.get() {
        return Ok(provider);
    }

    let provider = LocalProvider::new(config)?;
    Ok(PROVIDER.get_or_init(|| provider))
}

/// Resolve a model name to its embedding dimensionality.
fn resolve_model_dims(name: &str) -> Result<usize> {
    Ok(match name {
        "all-minilm-l6-v2" => 384,
        "bge-small-en-v1.5" => 384,
        "bge-base-en-v1.5" => 768,
        "bge-large-en-v1.5" => 1024,
        "nomic-embed-text-v1" | "nomic-embed-text-v1.5" => 768,
        "multilingual-e5-small" => 384,
        "multilingual-e5-base" => 768,
        "multilingual-e5-large" => 1024,
        other => bail!("Unknown embedding model: '{}'", other),
    })
}

fn config_to_fastembed_model(name: &str) -> Result<fastembed::EmbeddingModel> {
    match name {
        "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        "bge-large-en-v1.5" => Ok(fastembed::EmbeddingModel::BGELargeENV15),
        "nomic-embed-text-v1" => Ok(fastembed::EmbeddingModel::NomicEmbedTextV1),
        "nomic-embed-text-v1.5" => Ok(fastembed::EmbeddingModel::NomicEmbedTextV15),
        "multilingual-e5-small" => Ok(fastembed::EmbeddingModel::MultilingualE5Small),
        "multilingual-e5-base" => Ok(fastembed::EmbeddingModel::MultilingualE5Base),
        "multilingual-e5-large" => Ok(fastembed::EmbeddingModel::MultilingualE5Large),
        other => bail!(
            "Unknown embedding model: '{}'. Supported models: \
             all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5, \
             nomic-embed-text-v1, nomic-embed-text-v1.5, \
             multilingual-e5-small, multilingual-e5-base, multilingual-e5-large",
            other
        ),
    }
}

/// Compute a vector's Euclidean (L2) norm.
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|v| v * v).sum::<f32>().sqrt()
}

/// Scale `vector` to unit L2 norm in place.
///
/// Inner-product search over unit vectors is cosine similarity, so every
/// stored and query vector must pass through this before reaching the
/// index. Zero vectors are left untouched (no meaningful direction).
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = l2_norm(vector);
    if norm > f32::EPSILON {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}
