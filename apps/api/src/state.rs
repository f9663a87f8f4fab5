use std::sync::Arc;

use crate::config::Config;
use crate::store::Store;
use crate::uploads::FileStorage;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    /// Pluggable upload backend. Default: local directory. S3 when `S3_BUCKET` is set.
    pub files: Arc<dyn FileStorage>,
    pub config: Config,
}
