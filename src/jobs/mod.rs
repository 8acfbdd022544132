//! Job queue worker.
//!
//! `JobWorker` is modeled on the teacher's `Service` trait in
//! `services/manager.rs` (name/start/stop/health lifecycle) but specialised
//! to the single responsibility of polling `pick_next` and dispatching to a
//! handler registry; handlers are registered at startup the way the teacher
//! wires its `HandlerDependencies` record rather than reaching for globals.

mod handler;
mod handlers;
mod worker;

pub use handler::{HandlerDependencies, JobHandler, JobOutcome};
pub use handlers::registry;
pub use worker::JobWorker;
