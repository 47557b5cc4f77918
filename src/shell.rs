//! JS-facing sound bridge
//!
//! The page's UI root constructs one `SoundBridge` and passes it to the
//! components that trigger sounds.

use wasm_bindgen::prelude::*;
use web_sys::Event;

use crate::audio::web::{WebAudioDevice, web_engine};
use crate::audio::{AudioRoot, PlayOptions, SoundCatalog};
use crate::settings::Settings;

/// Events that count as a user gesture for unlocking audio
const GESTURE_EVENTS: [&str; 3] = ["pointerdown", "keydown", "touchstart"];

#[wasm_bindgen]
pub struct SoundBridge {
    // Owns the engine for the lifetime of the UI root
    root: AudioRoot<WebAudioDevice>,
    settings: Settings,
}

#[wasm_bindgen]
impl SoundBridge {
    /// Bridge over the builtin catalog
    #[wasm_bindgen(constructor)]
    pub fn new() -> SoundBridge {
        Self::with_catalog(SoundCatalog::builtin())
    }

    /// Bridge over a JSON catalog
    #[wasm_bindgen(js_name = fromCatalogJson)]
    pub fn from_catalog_json(json: &str) -> Result<SoundBridge, JsValue> {
        let catalog =
            SoundCatalog::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self::with_catalog(catalog))
    }

    /// Call `prepare` on the first user gesture anywhere in the document
    #[wasm_bindgen(js_name = unlockOnGesture)]
    pub fn unlock_on_gesture(&self) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;

        for name in GESTURE_EVENTS {
            let handle = self.root.handle();
            // prepare() is idempotent, so later gestures are harmless
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: Event| {
                handle.prepare();
            });
            document.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    /// Unlock audio now; must run inside a user-gesture handler
    pub fn prepare(&self) {
        self.root.handle().prepare();
    }

    pub fn play(&self, name: &str, volume: Option<f32>, throttle_ms: Option<f64>) {
        self.root.handle().play(name, PlayOptions { volume, throttle_ms });
    }

    #[wasm_bindgen(js_name = setSoundEnabled)]
    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.settings.sound_enabled = enabled;
        self.settings.save();
        self.root.handle().set_muted(!enabled);
    }

    #[wasm_bindgen(js_name = soundEnabled)]
    pub fn sound_enabled(&self) -> bool {
        self.settings.sound_enabled
    }

    /// Engine phase, for debugging overlays
    pub fn phase(&self) -> String {
        format!("{:?}", self.root.handle().phase())
    }
}

impl SoundBridge {
    fn with_catalog(catalog: SoundCatalog) -> SoundBridge {
        let settings = Settings::load();
        let root = AudioRoot::new(move || web_engine(catalog.clone()));
        let handle = root.handle();
        handle.set_muted(!settings.sound_enabled);
        log::info!("Sound bridge ready ({} sounds)", handle.engine().catalog().len());
        SoundBridge { root, settings }
    }
}

impl Default for SoundBridge {
    fn default() -> Self {
        Self::new()
    }
}
