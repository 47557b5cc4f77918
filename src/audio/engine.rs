//! Audio engine: one shared context, a decoded-buffer cache and the
//! init/loading/playback state machine.
//!
//! Single-threaded. State sits behind `Rc` with `Cell`/`RefCell`, and no
//! borrow is held across an `.await`. The buffer cache is insert-only, so a
//! play racing a load either finds the buffer or reports "still loading".

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use rand::{Rng, RngCore};

use super::backend::{AssetFetcher, AudioDevice, AudioOutput, Clock, ContextState, LocalBoxFuture, Spawner};
use super::catalog::{SoundCatalog, SoundDescriptor};
use super::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
use super::error::AudioError;

type BufferOf<D> = <<D as AudioDevice>::Output as AudioOutput>::Buffer;

/// Initialization lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    /// Context running
    Ready,
    /// Context unsupported or resume rejected; terminal
    InitFailed,
}

/// Bulk loading progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoading,
    Loading,
    /// Every per-sound attempt finished, successfully or not
    Loaded,
}

/// Combined view of both state machines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Uninitialized,
    Initializing,
    InitFailed,
    ReadyNotLoaded,
    Loading,
    Loaded,
}

/// Per-call playback options
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayOptions {
    /// Gain override; the descriptor default applies when unset
    pub volume: Option<f32>,
    /// Minimum interval between triggers of the same requested name
    pub throttle_ms: Option<f64>,
}

impl PlayOptions {
    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn throttle_ms(mut self, ms: f64) -> Self {
        self.throttle_ms = Some(ms);
        self
    }
}

/// Collaborators the engine needs besides the output device
pub struct EngineServices {
    pub fetcher: Box<dyn AssetFetcher>,
    pub spawner: Box<dyn Spawner>,
    pub clock: Box<dyn Clock>,
    pub rng: Box<dyn RngCore>,
    pub sink: Box<dyn DiagnosticSink>,
}

struct Shared<D: AudioDevice> {
    device: D,
    catalog: SoundCatalog,
    fetcher: Box<dyn AssetFetcher>,
    spawner: Box<dyn Spawner>,
    clock: Box<dyn Clock>,
    sink: Box<dyn DiagnosticSink>,
    rng: RefCell<Box<dyn RngCore>>,
    state: Cell<EngineState>,
    load_state: Cell<LoadState>,
    muted: Cell<bool>,
    context: OnceCell<D::Output>,
    buffers: RefCell<HashMap<String, BufferOf<D>>>,
    last_played: RefCell<HashMap<String, f64>>,
}

/// Handle to the audio engine. Clones share the same engine.
pub struct AudioEngine<D: AudioDevice> {
    shared: Rc<Shared<D>>,
}

impl<D: AudioDevice> Clone for AudioEngine<D> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<D: AudioDevice> AudioEngine<D> {
    pub fn new(device: D, catalog: SoundCatalog, services: EngineServices) -> Self {
        let EngineServices {
            fetcher,
            spawner,
            clock,
            rng,
            sink,
        } = services;
        Self {
            shared: Rc::new(Shared {
                device,
                catalog,
                fetcher,
                spawner,
                clock,
                sink,
                rng: RefCell::new(rng),
                state: Cell::new(EngineState::Uninitialized),
                load_state: Cell::new(LoadState::NotLoading),
                muted: Cell::new(false),
                context: OnceCell::new(),
                buffers: RefCell::new(HashMap::new()),
                last_played: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub fn state(&self) -> EngineState {
        self.shared.state.get()
    }

    pub fn load_state(&self) -> LoadState {
        self.shared.load_state.get()
    }

    pub fn phase(&self) -> EnginePhase {
        match (self.state(), self.load_state()) {
            (EngineState::Uninitialized, _) => EnginePhase::Uninitialized,
            (EngineState::Initializing, _) => EnginePhase::Initializing,
            (EngineState::InitFailed, _) => EnginePhase::InitFailed,
            (EngineState::Ready, LoadState::NotLoading) => EnginePhase::ReadyNotLoaded,
            (EngineState::Ready, LoadState::Loading) => EnginePhase::Loading,
            (EngineState::Ready, LoadState::Loaded) => EnginePhase::Loaded,
        }
    }

    pub fn catalog(&self) -> &SoundCatalog {
        &self.shared.catalog
    }

    /// Number of decoded buffers in the cache
    pub fn cached_count(&self) -> usize {
        self.shared.buffers.borrow().len()
    }

    pub fn is_cached(&self, id: &str) -> bool {
        self.shared.buffers.borrow().contains_key(id)
    }

    pub fn set_muted(&self, muted: bool) {
        self.shared.muted.set(muted);
    }

    pub fn is_muted(&self) -> bool {
        self.shared.muted.get()
    }

    fn emit(&self, diagnostic: Diagnostic) {
        self.shared.sink.emit(diagnostic);
    }

    /// Unlock audio. Call from a user-gesture handler.
    ///
    /// Everything that must happen inside the gesture (context creation and
    /// the resume request) runs before this returns. The returned future
    /// finishes once the resume settles; awaiting it is optional.
    /// Only the first call has any effect.
    pub fn init(&self) -> LocalBoxFuture<'static, ()> {
        let shared = &self.shared;
        if shared.state.get() != EngineState::Uninitialized {
            return Box::pin(std::future::ready(()));
        }
        shared.state.set(EngineState::Initializing);
        log::info!("Initializing audio engine");

        let context = match shared.device.create_context() {
            Ok(context) => shared.context.get_or_init(|| context),
            Err(err) => {
                shared.state.set(EngineState::InitFailed);
                self.emit(Diagnostic::new(
                    Severity::Error,
                    DiagnosticCode::Unsupported,
                    err.to_string(),
                ));
                return Box::pin(std::future::ready(()));
            }
        };

        if context.state() == ContextState::Running {
            self.on_running();
            return Box::pin(std::future::ready(()));
        }

        let resume = context.resume();
        let engine = self.clone();
        Box::pin(async move {
            match resume.await {
                Ok(()) => engine.on_running(),
                Err(err) => {
                    engine.shared.state.set(EngineState::InitFailed);
                    engine.emit(Diagnostic::new(
                        Severity::Error,
                        DiagnosticCode::ResumeRejected,
                        err.to_string(),
                    ));
                }
            }
        })
    }

    /// Fire-and-forget `init`: the resume wait runs on the spawner
    pub fn prepare(&self) {
        let pending = self.init();
        self.shared.spawner.spawn(pending);
    }

    fn on_running(&self) {
        self.shared.state.set(EngineState::Ready);
        log::info!("Audio context running");
        self.load_all();
    }

    /// Fetch and decode every catalog sound in the background.
    ///
    /// Runs once; later calls are no-ops. Per-sound failures are reported and
    /// leave that sound unavailable for the session.
    pub fn load_all(&self) {
        let shared = &self.shared;
        if shared.load_state.get() != LoadState::NotLoading {
            return;
        }
        if shared.state.get() != EngineState::Ready {
            log::debug!("load_all ignored: engine is {:?}", shared.state.get());
            return;
        }
        shared.load_state.set(LoadState::Loading);

        let descriptors: Vec<SoundDescriptor> = shared.catalog.descriptors().cloned().collect();
        if descriptors.is_empty() {
            shared.load_state.set(LoadState::Loaded);
            return;
        }
        log::info!("Loading {} sounds", descriptors.len());

        let pending = Rc::new(Cell::new(descriptors.len()));
        for descriptor in descriptors {
            let engine = self.clone();
            let pending = Rc::clone(&pending);
            shared.spawner.spawn(Box::pin(async move {
                engine.load_one(&descriptor).await;
                pending.set(pending.get() - 1);
                if pending.get() == 0 {
                    engine.shared.load_state.set(LoadState::Loaded);
                    log::info!(
                        "Sound loading complete ({}/{} cached)",
                        engine.cached_count(),
                        engine.shared.catalog.len()
                    );
                }
            }));
        }
    }

    async fn load_one(&self, descriptor: &SoundDescriptor) {
        match self.fetch_and_decode(descriptor).await {
            Ok(buffer) => {
                self.shared
                    .buffers
                    .borrow_mut()
                    .insert(descriptor.id.clone(), buffer);
                log::debug!("Cached sound {}", descriptor.id);
            }
            Err(err) => self.emit(Diagnostic::load_failed(&descriptor.id, &err)),
        }
    }

    async fn fetch_and_decode(&self, descriptor: &SoundDescriptor) -> Result<BufferOf<D>, AudioError> {
        let response = self.shared.fetcher.fetch(&descriptor.source).await?;
        if !response.is_success() {
            return Err(AudioError::Status {
                url: descriptor.source.clone(),
                status: response.status,
            });
        }
        let decode = match self.shared.context.get() {
            Some(context) => context.decode(response.body),
            None => return Err(AudioError::Unsupported("no audio context".into())),
        };
        decode.await
    }

    /// Play a sound id or family. Never fails; problems become diagnostics.
    pub fn play_sound(&self, name: &str, options: PlayOptions) {
        let shared = &*self.shared;
        if shared.state.get() == EngineState::Uninitialized {
            return;
        }
        let Some(context) = shared.context.get() else {
            return;
        };
        if context.state() != ContextState::Running {
            self.emit(
                Diagnostic::new(
                    Severity::Warn,
                    DiagnosticCode::ContextNotRunning,
                    format!("play requested while context is {:?}", context.state()),
                )
                .with_sound(name),
            );
            return;
        }
        if shared.muted.get() {
            return;
        }

        if let Some(throttle_ms) = options.throttle_ms {
            let now = shared.clock.now_ms();
            let mut last_played = shared.last_played.borrow_mut();
            if let Some(&last) = last_played.get(name) {
                if now - last < throttle_ms {
                    return;
                }
            }
            last_played.insert(name.to_owned(), now);
        }

        let candidates = shared.catalog.resolve(name);
        if candidates.is_empty() {
            return;
        }
        let pick = shared.rng.borrow_mut().random_range(0..candidates.len());
        let id = candidates[pick];

        let buffer = shared.buffers.borrow().get(id).cloned();
        let Some(buffer) = buffer else {
            self.report_missing(id);
            return;
        };

        let gain = options.volume.unwrap_or_else(|| {
            shared
                .catalog
                .get(id)
                .map_or(1.0, |descriptor| descriptor.default_volume)
        });
        if let Err(err) = context.play(&buffer, gain) {
            self.emit(
                Diagnostic::new(Severity::Warn, DiagnosticCode::PlaybackFailed, err.to_string())
                    .with_sound(id),
            );
        }
    }

    fn report_missing(&self, id: &str) {
        let diagnostic = match (self.state(), self.load_state()) {
            (_, LoadState::Loaded) => Diagnostic::new(
                Severity::Error,
                DiagnosticCode::BufferMissing,
                "no buffer after loading completed (load failed or unknown id)",
            ),
            (_, LoadState::Loading) => Diagnostic::new(
                Severity::Debug,
                DiagnosticCode::StillLoading,
                "sound still loading",
            ),
            // Context already running, resume continuation not yet run
            (EngineState::Initializing, LoadState::NotLoading) => Diagnostic::new(
                Severity::Debug,
                DiagnosticCode::StillLoading,
                "audio still initializing",
            ),
            (_, LoadState::NotLoading) => Diagnostic::new(
                Severity::Warn,
                DiagnosticCode::LoadingNotStarted,
                "loading never started despite initialization",
            ),
        };
        self.emit(diagnostic.with_sound(id));
    }
}
