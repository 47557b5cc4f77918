//! Sound playback
//!
//! - `catalog`: sound ids, sources, default volumes, variation groups
//! - `engine`: shared context, buffer cache, init/load/play state machine
//! - `facade`: per-UI-root lazy engine + handles
//! - `backend`: platform seams (output, fetch, spawn, clock)
//! - `web`: browser implementations of the seams (wasm32 only)

pub mod backend;
pub mod catalog;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod facade;
#[cfg(test)]
pub(crate) mod testing;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use backend::{AssetFetcher, AudioDevice, AudioOutput, Clock, ContextState, FetchResponse, Spawner};
pub use catalog::{SoundCatalog, SoundDescriptor};
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, LogSink, Severity};
pub use engine::{AudioEngine, EnginePhase, EngineServices, EngineState, LoadState, PlayOptions};
pub use error::{AudioError, CatalogError};
pub use facade::{AudioRoot, SoundHandle};
