//! Physics Shell - client shell for a casual physics game
//!
//! Core modules:
//! - `audio`: Sound catalog, audio engine and playback facade
//! - `settings`: Persisted shell preferences
//! - `shell`: JS-facing bridge (wasm32 only)

pub mod audio;
pub mod settings;
#[cfg(target_arch = "wasm32")]
pub mod shell;

pub use audio::{AudioEngine, AudioRoot, PlayOptions, SoundCatalog, SoundHandle};
pub use settings::Settings;
