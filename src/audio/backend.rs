//! Platform seams for the audio engine
//!
//! The engine only talks to the outside world through these traits:
//! - `AudioDevice` / `AudioOutput`: gesture-gated output context
//! - `AssetFetcher`: plain GET of a catalog source URL
//! - `Spawner`: run a local (non-`Send`) background task
//! - `Clock`: milliseconds for throttling
//!
//! The browser implementations live in `audio::web`.

use std::future::Future;
use std::pin::Pin;

use super::error::AudioError;

/// Boxed single-threaded future
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Audio context run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

/// Factory for the shared output context
pub trait AudioDevice: 'static {
    type Output: AudioOutput;

    /// Construct the output context. Called at most once per engine.
    fn create_context(&self) -> Result<Self::Output, AudioError>;
}

/// A live output context
pub trait AudioOutput: 'static {
    /// Decoded PCM, ready to play without further work
    type Buffer: Clone + 'static;

    fn state(&self) -> ContextState;

    /// Request a resume. The request is issued before this returns; the
    /// future resolves when the platform accepts or rejects it.
    fn resume(&self) -> LocalBoxFuture<'static, Result<(), AudioError>>;

    /// Decode compressed audio bytes
    fn decode(&self, bytes: Vec<u8>) -> LocalBoxFuture<'static, Result<Self::Buffer, AudioError>>;

    /// Start a fresh one-shot source -> gain -> destination graph now
    fn play(&self, buffer: &Self::Buffer, gain: f32) -> Result<(), AudioError>;
}

/// Result of a resource fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn ok(body: Vec<u8>) -> Self {
        Self { status: 200, body }
    }

    /// 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches encoded audio bytes by URL
pub trait AssetFetcher {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<FetchResponse, AudioError>>;
}

/// Runs background tasks on the current thread
pub trait Spawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// Monotonic-enough millisecond clock
pub trait Clock {
    fn now_ms(&self) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_status_range() {
        assert!(FetchResponse::ok(vec![]).is_success());
        assert!(FetchResponse { status: 204, body: vec![] }.is_success());
        assert!(!FetchResponse { status: 304, body: vec![] }.is_success());
        assert!(!FetchResponse { status: 404, body: vec![] }.is_success());
        assert!(!FetchResponse { status: 0, body: vec![] }.is_success());
    }
}
