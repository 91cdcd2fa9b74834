use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::{
    config::RecommendationSettings,
    error::{AppError, AppResult},
    services::{CatalogSource, ModelStats, RecommendationModel},
};

/// Shared application state
///
/// The active model sits behind a pointer that is swapped whole on reload.
/// Readers clone the inner `Arc` and query without holding the lock, so a
/// query always sees one complete model, old or new.
#[derive(Clone)]
pub struct AppState {
    model: Arc<RwLock<Arc<RecommendationModel>>>,
    source: Arc<dyn CatalogSource>,
    settings: RecommendationSettings,
    reload_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Creates state around an already built model
    pub fn new(
        model: RecommendationModel,
        source: Arc<dyn CatalogSource>,
        settings: RecommendationSettings,
    ) -> Self {
        Self {
            model: Arc::new(RwLock::new(Arc::new(model))),
            source,
            settings,
            reload_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Loads the catalog from `source` and builds the first model
    pub async fn bootstrap(
        source: Arc<dyn CatalogSource>,
        settings: RecommendationSettings,
    ) -> AppResult<Self> {
        let model = build_model(source.as_ref(), settings).await?;
        Ok(Self::new(model, source, settings))
    }

    /// The model currently serving queries
    pub async fn model(&self) -> Arc<RecommendationModel> {
        self.model.read().await.clone()
    }

    pub fn settings(&self) -> RecommendationSettings {
        self.settings
    }

    /// Rebuilds the model from the catalog source and swaps it in.
    ///
    /// On failure the active model is left untouched. Concurrent reloads are
    /// serialized.
    pub async fn reload(&self) -> AppResult<ModelStats> {
        let _guard = self.reload_lock.lock().await;
        tracing::info!(source = self.source.name(), "Reloading catalog");

        let model = match build_model(self.source.as_ref(), self.settings).await {
            Ok(model) => model,
            Err(e) => {
                tracing::error!(error = %e, "Reload failed, keeping current model");
                return Err(e);
            }
        };

        let stats = model.stats();
        *self.model.write().await = Arc::new(model);

        tracing::info!(corpus_size = stats.corpus_size, "Reloaded model is live");
        Ok(stats)
    }
}

async fn build_model(
    source: &dyn CatalogSource,
    settings: RecommendationSettings,
) -> AppResult<RecommendationModel> {
    let records = source.load().await?;
    let strategy = settings.strategy;
    tokio::task::spawn_blocking(move || RecommendationModel::build(records, strategy))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
}
