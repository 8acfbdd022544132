//! Media-library curator: a classifier, content-addressed cache, job queue,
//! and WebSocket bus over a directory of movie files.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod facts;
pub mod hash;
pub mod identify;
pub mod jobs;
pub mod models;
pub mod publish;
pub mod repo;
pub mod ws;
