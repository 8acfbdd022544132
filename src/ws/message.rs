//! Server/client message kinds.

use uuid::Uuid;

#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome { client_id: Uuid },
    Pong,
    MoviesChanged { ids: Vec<Uuid> },
    LibraryChanged { id: Uuid },
    ScanStatus { job_id: Uuid, progress: f32 },
    JobStarted { job_id: Uuid, job_type: String },
    JobCompleted { job_id: Uuid, job_type: String },
    JobFailed { job_id: Uuid, job_type: String, error: String },
    PlayerStatus { player_id: Uuid, state: String },
    TrailerProgress { movie_id: Uuid, progress: f32 },
    TrailerCompleted { movie_id: Uuid },
    TrailerFailed { movie_id: Uuid, error: String },
    ResyncData { scope: String },
    Ack { ref_id: String },
    Conflict { message: String },
    Error { message: String },
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
    Resync { scope: String },
    UpdateMovie { id: Uuid, patch: serde_json::Value },
    DeleteImage { id: Uuid },
    UpdatePlayer { id: Uuid, patch: serde_json::Value },
    StartLibraryScan { library_id: Uuid },
    CancelLibraryScan { job_id: Uuid },
}
