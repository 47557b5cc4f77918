//! Error types for the sound subsystem
//!
//! These never cross the public playback boundary. The engine turns every
//! `AudioError` into a [`Diagnostic`](super::diagnostics::Diagnostic).

use thiserror::Error;

/// Failure reported by an audio backend or the asset fetcher
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// No audio output capability on this platform
    #[error("audio output unsupported: {0}")]
    Unsupported(String),
    /// Platform refused to resume the context (no user gesture)
    #[error("audio context resume rejected: {0}")]
    ResumeRejected(String),
    /// Fetch did not produce a response at all
    #[error("network error: {0}")]
    Network(String),
    /// Fetch produced a non-success status
    #[error("fetch of {url} failed with status {status}")]
    Status { url: String, status: u16 },
    /// Bytes were not decodable audio
    #[error("decode failed: {0}")]
    Decode(String),
    /// Building or starting the playback graph failed
    #[error("playback failed: {0}")]
    Playback(String),
}

/// Catalog data that breaks the catalog invariants
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("variation group `{0}` has no members")]
    EmptyGroup(String),
    #[error("variation group `{group}` references unknown sound `{id}`")]
    UnknownMember { group: String, id: String },
    #[error("sound `{id}` has invalid default volume {volume}")]
    InvalidVolume { id: String, volume: f32 },
}
