use crate::config::ServerConfig;
use crate::error::ServerResult;
use florify::{
    AssetStore, DegradedDetector, DegradedEmbedder, DirAssetStore, EmbeddingProvider,
    GardenPipeline, LinearSearch, MatchError, MatchSelector, ReferenceCorpus,
};
use std::path::Path;
use std::sync::Arc;

/// Shared application state
///
/// All collaborators are constructed once here and shared read-only across
/// requests; refreshing the corpus means building a new state, never
/// editing this one in place.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// The garden pipeline (shared across requests)
    pub pipeline: Arc<GardenPipeline>,

    /// Blueprint asset store, also used by the samples endpoint
    pub assets: Arc<dyn AssetStore>,
}

impl ServerState {
    /// Create new server state.
    ///
    /// Tries to load the reference corpus and embedding rows from
    /// `config.data_dir`; when either is unavailable the match selector
    /// starts in degraded sentinel mode so the rest of the pipeline stays
    /// exercisable.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let data_dir = Path::new(&config.data_dir);
        let assets: Arc<dyn AssetStore> = Arc::new(DirAssetStore::new(data_dir.join("png_cache")));

        let (selector, embedder): (MatchSelector, Arc<dyn EmbeddingProvider>) =
            match load_selector(data_dir, assets.clone()) {
                Ok((selector, dimension)) => {
                    tracing::info!(
                        pairs = selector.corpus().len(),
                        dimension,
                        "loaded reference corpus and embedding index"
                    );
                    (selector, Arc::new(DegradedEmbedder::new(dimension)))
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        data_dir = %data_dir.display(),
                        "corpus/index unavailable, starting in degraded mode"
                    );
                    (
                        MatchSelector::degraded(assets.clone()),
                        Arc::new(DegradedEmbedder::default()),
                    )
                }
            };

        let pipeline = GardenPipeline::new(
            embedder,
            Arc::new(selector),
            Arc::new(DegradedDetector),
            config.pipeline,
        )?;

        Ok(Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            assets,
        })
    }

    /// State with an explicitly wired pipeline, for tests and deployments
    /// that inject real embedding/detection providers.
    pub fn with_pipeline(
        config: ServerConfig,
        pipeline: Arc<GardenPipeline>,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            pipeline,
            assets,
        }
    }
}

/// Load the live selector: `pairs.json` + `embeddings.json`, aligned by
/// position. Returns the embedding dimension alongside so the stand-in
/// embedder can be built to match.
fn load_selector(
    data_dir: &Path,
    assets: Arc<dyn AssetStore>,
) -> Result<(MatchSelector, usize), MatchError> {
    let corpus = ReferenceCorpus::load(&data_dir.join("pairs.json"))?;

    let embeddings_path = data_dir.join("embeddings.json");
    let raw = std::fs::read_to_string(&embeddings_path)
        .map_err(|e| MatchError::CorpusLoad(format!("{}: {e}", embeddings_path.display())))?;
    let rows: Vec<Vec<f32>> = serde_json::from_str(&raw)
        .map_err(|e| MatchError::CorpusLoad(format!("{}: {e}", embeddings_path.display())))?;

    let search = LinearSearch::from_rows(rows)?;
    let dimension = search.dimension();
    let selector = MatchSelector::new(Box::new(search), corpus, assets)?;
    Ok((selector, dimension))
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
    pub degraded: bool,
}
