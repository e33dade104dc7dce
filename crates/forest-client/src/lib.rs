//! Typed HTTP client for the Magic Forest backend.
//!
//! Every JSON endpoint is wrapped behind the uniform [`ApiResponse`] shape:
//! the client never returns an error to its caller for these calls. Network
//! failures and non-2xx statuses both surface as `ok == false`, and a body
//! that is not JSON degrades to `data == None`. Retry policy belongs to the
//! caller; the client itself never retries.
//!
//! # Modules
//!
//! - [`api`] -- [`ForestApi`], the reqwest-backed client
//! - [`backend`] -- [`ForestBackend`], the seam the scene coordinator polls through
//! - [`config`] -- [`ClientConfig`]
//! - [`error`] -- [`ClientError`]
//! - [`submission`] -- Capture, wait for review, approve (mobile scan flow)
//! - [`watcher`] -- Long-poll pipeline status watcher (operator dashboard)

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod submission;
pub mod watcher;

pub use api::{
    cache_busted, ApiResponse, ApproveRequest, CaptureRequest, ForestApi, GalleryQuery,
    PipelineQuery,
};
pub use backend::ForestBackend;
pub use config::ClientConfig;
pub use error::ClientError;
pub use submission::{submit_capture, SubmissionError, SubmissionOutcome, SubmissionPolicy, SubmissionRequest};
pub use watcher::PipelineWatcher;
