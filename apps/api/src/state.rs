use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;

use crate::config::Config;
use crate::matching::MatchResolver;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every client in here is created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Pluggable match resolver. Default: `LlmMatchResolver`.
    pub resolver: Arc<dyn MatchResolver>,
    /// Archive for uploaded job-description PDFs.
    pub s3: S3Client,
    pub config: Config,
}
