//! # libragen-embeddings
//!
//! Local embedding and reranking via fastembed (ONNX runtime).
//!
//! Models load lazily on first use and download into a stable cache
//! directory (`LIBRAGEN_MODEL_CACHE`, else `$LIBRAGEN_HOME/models`) so
//! repeated builds and tests reuse the same files. fastembed is
//! synchronous (the ONNX runtime parallelizes internally), so the async
//! trait methods simply wrap the blocking calls at the inference boundary.
//!
//! Output vectors are re-normalized to unit length; the store's cosine
//! invariant does not depend on a particular model's pooling choice.

mod error;

use std::path::PathBuf;

use fastembed::{
    EmbeddingModel, RerankInitOptions, RerankerModel, TextEmbedding, TextInitOptions, TextRerank,
};
use libragen_core::embedder::{Embedder, Reranker, l2_normalize};
use libragen_core::home::LibragenHome;

pub use error::EmbeddingError;

/// Default embedding model id.
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Default reranker model id.
pub const DEFAULT_RERANKER_MODEL: &str = "BAAI/bge-reranker-base";

/// Options for constructing a [`FastEmbedder`] or [`FastReranker`].
#[derive(Debug, Clone)]
pub struct ModelOptions {
    /// Model identifier; see [`supported_embedding_models`].
    pub model: String,
    /// Cache directory override; defaults to the libragen model cache.
    pub cache_dir: Option<PathBuf>,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            cache_dir: None,
        }
    }
}

/// Supported embedding model ids and their dimensionality.
#[must_use]
pub const fn supported_embedding_models() -> &'static [(&'static str, usize)] {
    &[
        ("sentence-transformers/all-MiniLM-L6-v2", 384),
        ("BAAI/bge-small-en-v1.5", 384),
        ("BAAI/bge-base-en-v1.5", 768),
    ]
}

fn embedding_model_for(id: &str) -> Result<(EmbeddingModel, usize), EmbeddingError> {
    match id {
        "sentence-transformers/all-MiniLM-L6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
        "BAAI/bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "BAAI/bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        other => Err(EmbeddingError::UnsupportedModel(other.to_string())),
    }
}

fn default_cache_dir() -> PathBuf {
    LibragenHome::resolve().models_dir()
}

/// fastembed-backed [`Embedder`]. The model loads on first `embed` call.
pub struct FastEmbedder {
    model_id: String,
    dimensions: usize,
    cache_dir: PathBuf,
    engine: Option<TextEmbedding>,
}

impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model_id", &self.model_id)
            .field("dimensions", &self.dimensions)
            .field("loaded", &self.engine.is_some())
            .finish()
    }
}

impl FastEmbedder {
    /// Configure an embedder without loading the model.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::UnsupportedModel`] for unknown model ids.
    pub fn new(options: ModelOptions) -> Result<Self, EmbeddingError> {
        let (_, dimensions) = embedding_model_for(&options.model)?;
        Ok(Self {
            model_id: options.model,
            dimensions,
            cache_dir: options.cache_dir.unwrap_or_else(default_cache_dir),
            engine: None,
        })
    }

    fn engine(&mut self) -> Result<&mut TextEmbedding, EmbeddingError> {
        if self.engine.is_none() {
            let (model, _) = embedding_model_for(&self.model_id)?;
            tracing::info!(model = %self.model_id, cache = %self.cache_dir.display(), "loading embedding model");
            let engine = TextEmbedding::try_new(
                TextInitOptions::new(model)
                    .with_cache_dir(self.cache_dir.clone())
                    .with_show_download_progress(false),
            )
            .map_err(|e| EmbeddingError::Init(e.to_string()))?;
            self.engine = Some(engine);
        }
        self.engine
            .as_mut()
            .ok_or_else(|| EmbeddingError::Init("model failed to initialize".to_string()))
    }

    /// Drop the loaded model, releasing ONNX resources. The next `embed`
    /// call reloads it.
    pub fn release(&mut self) {
        self.engine = None;
    }
}

impl Embedder for FastEmbedder {
    fn model(&self) -> &str {
        &self.model_id
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&mut self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let dimensions = self.dimensions;
        let engine = self.engine()?;
        let mut embeddings = engine
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;
        for embedding in &mut embeddings {
            if embedding.len() != dimensions {
                return Err(EmbeddingError::Inference(format!(
                    "model returned {} dimensions, expected {dimensions}",
                    embedding.len()
                ))
                .into());
            }
            l2_normalize(embedding);
        }
        Ok(embeddings)
    }
}

/// fastembed-backed [`Reranker`]. The model loads on first `rerank` call.
pub struct FastReranker {
    model_id: String,
    cache_dir: PathBuf,
    engine: Option<TextRerank>,
}

impl std::fmt::Debug for FastReranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastReranker")
            .field("model_id", &self.model_id)
            .field("loaded", &self.engine.is_some())
            .finish()
    }
}

fn reranker_model_for(id: &str) -> Result<RerankerModel, EmbeddingError> {
    match id {
        "BAAI/bge-reranker-base" => Ok(RerankerModel::BGERerankerBase),
        other => Err(EmbeddingError::UnsupportedModel(other.to_string())),
    }
}

impl FastReranker {
    /// Configure a reranker without loading the model.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::UnsupportedModel`] for unknown model ids.
    pub fn new(options: ModelOptions) -> Result<Self, EmbeddingError> {
        reranker_model_for(&options.model)?;
        Ok(Self {
            model_id: options.model,
            cache_dir: options.cache_dir.unwrap_or_else(default_cache_dir),
            engine: None,
        })
    }

    fn engine(&mut self) -> Result<&mut TextRerank, EmbeddingError> {
        if self.engine.is_none() {
            let model = reranker_model_for(&self.model_id)?;
            tracing::info!(model = %self.model_id, "loading reranker model");
            let engine = TextRerank::try_new(
                RerankInitOptions::new(model)
                    .with_cache_dir(self.cache_dir.clone())
                    .with_show_download_progress(false),
            )
            .map_err(|e| EmbeddingError::Init(e.to_string()))?;
            self.engine = Some(engine);
        }
        self.engine
            .as_mut()
            .ok_or_else(|| EmbeddingError::Init("model failed to initialize".to_string()))
    }

    /// Drop the loaded model. The next `rerank` call reloads it.
    pub fn release(&mut self) {
        self.engine = None;
    }
}

impl Reranker for FastReranker {
    async fn rerank(&mut self, query: &str, documents: &[String]) -> anyhow::Result<Vec<f32>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let engine = self.engine()?;
        let docs: Vec<&str> = documents.iter().map(String::as_str).collect();
        let results = engine
            .rerank(query, docs, false, None)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;

        // fastembed returns results sorted by score; map back to input order.
        let mut scores = vec![0.0f32; documents.len()];
        for result in results {
            if let Some(slot) = scores.get_mut(result.index) {
                *slot = result.score;
            }
        }
        Ok(scores)
    }
}
