//! Browser backends: Web Audio output, `fetch`, `spawn_local`, `Date.now`

use js_sys::{ArrayBuffer, Uint8Array};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioBuffer, AudioContext, AudioContextState, Response};

use super::backend::{
    AssetFetcher, AudioDevice, AudioOutput, Clock, ContextState, FetchResponse, LocalBoxFuture,
    Spawner,
};
use super::catalog::SoundCatalog;
use super::diagnostics::LogSink;
use super::engine::{AudioEngine, EngineServices};
use super::error::AudioError;

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// Creates the page's `AudioContext`
#[derive(Debug, Default, Clone, Copy)]
pub struct WebAudioDevice;

impl AudioDevice for WebAudioDevice {
    type Output = WebAudioOutput;

    fn create_context(&self) -> Result<WebAudioOutput, AudioError> {
        // May fail outside a secure context or without Web Audio support
        let ctx = AudioContext::new().map_err(|e| AudioError::Unsupported(describe(&e)))?;
        Ok(WebAudioOutput { ctx })
    }
}

pub struct WebAudioOutput {
    ctx: AudioContext,
}

impl AudioOutput for WebAudioOutput {
    type Buffer = AudioBuffer;

    fn state(&self) -> ContextState {
        match self.ctx.state() {
            AudioContextState::Running => ContextState::Running,
            AudioContextState::Suspended => ContextState::Suspended,
            _ => ContextState::Closed,
        }
    }

    fn resume(&self) -> LocalBoxFuture<'static, Result<(), AudioError>> {
        match self.ctx.resume() {
            Ok(promise) => Box::pin(async move {
                JsFuture::from(promise)
                    .await
                    .map(|_| ())
                    .map_err(|e| AudioError::ResumeRejected(describe(&e)))
            }),
            Err(e) => Box::pin(std::future::ready(Err(AudioError::ResumeRejected(
                describe(&e),
            )))),
        }
    }

    fn decode(&self, bytes: Vec<u8>) -> LocalBoxFuture<'static, Result<AudioBuffer, AudioError>> {
        let data: ArrayBuffer = Uint8Array::from(bytes.as_slice()).buffer();
        let promise = match self.ctx.decode_audio_data(&data) {
            Ok(promise) => promise,
            Err(e) => return Box::pin(std::future::ready(Err(AudioError::Decode(describe(&e))))),
        };
        Box::pin(async move {
            let decoded = JsFuture::from(promise)
                .await
                .map_err(|e| AudioError::Decode(describe(&e)))?;
            decoded
                .dyn_into::<AudioBuffer>()
                .map_err(|e| AudioError::Decode(describe(&e)))
        })
    }

    fn play(&self, buffer: &AudioBuffer, gain: f32) -> Result<(), AudioError> {
        let playback = |e: JsValue| AudioError::Playback(describe(&e));

        let source = self.ctx.create_buffer_source().map_err(playback)?;
        source.set_buffer(Some(buffer));
        let gain_node = self.ctx.create_gain().map_err(playback)?;
        gain_node.gain().set_value(gain);

        source.connect_with_audio_node(&gain_node).map_err(playback)?;
        gain_node
            .connect_with_audio_node(&self.ctx.destination())
            .map_err(playback)?;
        source.start_with_when(0.0).map_err(playback)
    }
}

/// `window.fetch` over plain GET
#[derive(Debug, Default, Clone, Copy)]
pub struct WebFetcher;

impl WebFetcher {
    async fn get(url: String) -> Result<FetchResponse, AudioError> {
        let window = web_sys::window().ok_or_else(|| AudioError::Network("no window".into()))?;
        let response: Response = JsFuture::from(window.fetch_with_str(&url))
            .await
            .map_err(|e| AudioError::Network(describe(&e)))?
            .dyn_into()
            .map_err(|e| AudioError::Network(describe(&e)))?;

        let status = response.status();
        if !response.ok() {
            return Ok(FetchResponse {
                status,
                body: Vec::new(),
            });
        }

        let promise = response
            .array_buffer()
            .map_err(|e| AudioError::Network(describe(&e)))?;
        let body = JsFuture::from(promise)
            .await
            .map_err(|e| AudioError::Network(describe(&e)))?;
        Ok(FetchResponse {
            status,
            body: Uint8Array::new(&body).to_vec(),
        })
    }
}

impl AssetFetcher for WebFetcher {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<FetchResponse, AudioError>> {
        Box::pin(Self::get(url.to_owned()))
    }
}

/// Runs tasks on the browser microtask queue
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalSpawner;

impl Spawner for LocalSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// Monotonic page clock (`performance.now()`); wall time only if the page
/// has no `Performance` object
#[derive(Debug, Default, Clone, Copy)]
pub struct PerformanceClock;

impl Clock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }
}

/// Engine wired to the browser backends
pub fn web_engine(catalog: SoundCatalog) -> AudioEngine<WebAudioDevice> {
    let seed = js_sys::Date::now() as u64;
    AudioEngine::new(
        WebAudioDevice,
        catalog,
        EngineServices {
            fetcher: Box::new(WebFetcher),
            spawner: Box::new(LocalSpawner),
            clock: Box::new(PerformanceClock),
            rng: Box::new(Pcg32::seed_from_u64(seed)),
            sink: Box::new(LogSink),
        },
    )
}
