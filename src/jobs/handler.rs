//! Handler trait and the explicit dependency bundle every handler closes
//! over: dependencies are passed into the constructor rather than reached
//! for via a global, so a handler can be unit-tested against fakes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::Result;
use crate::identify::ProviderClient;
use crate::models::job::Job;
use crate::repo::Database;
use crate::ws::Broadcaster;

#[derive(Clone)]
pub struct HandlerDependencies {
    pub db: Database,
    pub cache: Arc<CacheStore>,
    pub broadcaster: Broadcaster,
    pub provider: Arc<dyn ProviderClient>,
    pub video_probe: Arc<dyn crate::facts::VideoProbe>,
    pub config: Arc<Config>,
    /// Downloads provider asset bytes ahead of caching, the way the teacher's
    /// `ArtworkService` downloads an image before handing it to storage.
    pub http: reqwest::Client,
}

/// Outcome a handler reports to the queue; distinguishes a retriable failure
/// from a permanent one.
pub enum JobOutcome {
    Completed(Option<serde_json::Value>),
    Failed { message: String, permanent: bool },
}

#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job, deps: &HandlerDependencies) -> JobOutcome;
}

/// Registry mapping `job_type -> handler`.
pub type Registry = HashMap<&'static str, Arc<dyn JobHandler>>;

/// Converts a handler-level `Result` into a `JobOutcome`, classifying errors
/// via `CuratorError::is_retriable`.
pub fn outcome_of(result: Result<Option<serde_json::Value>>) -> JobOutcome {
    match result {
        Ok(value) => JobOutcome::Completed(value),
        Err(e) => JobOutcome::Failed { permanent: !e.is_retriable(), message: e.to_string() },
    }
}
