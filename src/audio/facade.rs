//! Playback facade
//!
//! One `AudioRoot` per UI root. It builds the engine on first access and
//! hands out `SoundHandle`s that all point at that same engine, so the
//! single audio context is passed down explicitly instead of living in a
//! global.

use std::cell::OnceCell;

use super::backend::{AudioDevice, LocalBoxFuture};
use super::engine::{AudioEngine, EnginePhase, PlayOptions};

/// Lazily constructed engine owned by a UI root
pub struct AudioRoot<D: AudioDevice> {
    engine: OnceCell<AudioEngine<D>>,
    factory: Box<dyn Fn() -> AudioEngine<D>>,
}

impl<D: AudioDevice> AudioRoot<D> {
    pub fn new(factory: impl Fn() -> AudioEngine<D> + 'static) -> Self {
        Self {
            engine: OnceCell::new(),
            factory: Box::new(factory),
        }
    }

    /// Handle to the root's engine, constructing it on first call
    pub fn handle(&self) -> SoundHandle<D> {
        let engine = self.engine.get_or_init(|| (self.factory)());
        SoundHandle {
            engine: engine.clone(),
        }
    }

    /// Whether the engine has been constructed yet
    pub fn is_constructed(&self) -> bool {
        self.engine.get().is_some()
    }
}

/// What UI code holds to trigger sounds
pub struct SoundHandle<D: AudioDevice> {
    engine: AudioEngine<D>,
}

impl<D: AudioDevice> Clone for SoundHandle<D> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<D: AudioDevice> SoundHandle<D> {
    /// Initialize the engine; the returned future settles once the resume
    /// request does. Start it from a user-gesture handler.
    pub fn init(&self) -> LocalBoxFuture<'static, ()> {
        self.engine.init()
    }

    /// Unlock and start loading; call from a user-gesture handler
    pub fn prepare(&self) {
        self.engine.prepare();
    }

    pub fn play(&self, name: &str, options: PlayOptions) {
        self.engine.play_sound(name, options);
    }

    pub fn set_muted(&self, muted: bool) {
        self.engine.set_muted(muted);
    }

    pub fn phase(&self) -> EnginePhase {
        self.engine.phase()
    }

    pub fn engine(&self) -> &AudioEngine<D> {
        &self.engine
    }
}
