#![cfg(target_arch = "wasm32")]
//! Browser front-end for the firecracker greeting effects.
//!
//! `create_effects` wires a WebAudio-backed [`ToneSynthesizer`] and a WebGPU
//! particle renderer to a canvas and hands back a [`GreetingEffects`] handle
//! for the page's timeline to drive.

use audio::{play_cue, WebAudioBackend, WebSynth};
use burst_core::{AudioUnlocked, BurstParams, CueAction, ParticleBurstSimulator, ToneSynthesizer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys as web;

mod audio;
mod constants;
mod dom;
mod frame;
mod render;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("burst-web starting");
    Ok(())
}

/// Resume audio from inside a click or tap and keep the unlock token.
///
/// The listeners are independent: a `touchstart` that is not a user
/// activation gets refused, and the following `click` tries again.
fn wire_first_interaction(
    document: &web::Document,
    synth: &Rc<RefCell<WebSynth>>,
    unlocked: &Rc<Cell<Option<AudioUnlocked>>>,
) {
    for event in constants::UNLOCK_EVENTS {
        let synth = synth.clone();
        let unlocked = unlocked.clone();
        dom::add_once_listener(document, event, move || {
            if unlocked.get().is_some() {
                return;
            }
            // The resume request is issued here, synchronously in the gesture
            let pending = synth.borrow().unlock_into(&unlocked);
            spawn_local(async move {
                if pending.await {
                    log::info!("[audio] unlocked by {}", event);
                } else {
                    log::warn!("[audio] {} did not unlock audio", event);
                }
            });
        });
    }
}

async fn init(canvas_id: &str) -> anyhow::Result<GreetingEffects> {
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let canvas: web::HtmlCanvasElement = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| anyhow::anyhow!("missing #{}", canvas_id))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
    dom::sync_canvas_backing_size(&canvas);

    let backend = match WebAudioBackend::new() {
        Ok(b) => Some(b),
        Err(e) => {
            log::warn!("[audio] unavailable: {:?}", e);
            None
        }
    };
    let synth = Rc::new(RefCell::new(ToneSynthesizer::with_rng(
        backend,
        StdRng::from_entropy(),
    )));
    let unlocked = Rc::new(Cell::new(None));
    wire_first_interaction(&document, &synth, &unlocked);

    let particles = ParticleBurstSimulator::with_rng(StdRng::from_entropy(), BurstParams::default());
    let gpu = frame::init_gpu(&canvas).await;
    let frames = frame::FrameLoop::new(frame::FrameContext::new(
        synth.clone(),
        unlocked.clone(),
        particles,
        gpu,
        canvas,
    ));
    let frames_resize = frames.clone();
    dom::add_resize_listener(move || frames_resize.resize());

    log::info!("[effects] ready on #{}", canvas_id);
    Ok(GreetingEffects {
        synth,
        unlocked,
        frames,
    })
}

/// Create the effects for the canvas with id `canvas_id`.
///
/// Missing WebAudio or WebGPU degrade to silent or invisible effects; only a
/// missing canvas rejects.
#[wasm_bindgen]
pub async fn create_effects(canvas_id: String) -> Result<GreetingEffects, JsValue> {
    init(&canvas_id).await.map_err(|e| {
        log::error!("init error: {:?}", e);
        JsValue::from_str(&format!("{e:#}"))
    })
}

#[wasm_bindgen]
pub struct GreetingEffects {
    synth: Rc<RefCell<WebSynth>>,
    unlocked: Rc<Cell<Option<AudioUnlocked>>>,
    frames: frame::FrameLoop,
}

impl GreetingEffects {
    fn sound(&self, action: CueAction) -> js_sys::Promise {
        let pending = play_cue(self.synth.clone(), self.unlocked.get(), action);
        future_to_promise(async move { Ok(JsValue::from_bool(pending.await)) })
    }
}

#[wasm_bindgen]
impl GreetingEffects {
    /// Firecracker sound and a particle burst. Resolves to whether the sound
    /// was scheduled; the particles run regardless.
    pub fn burst(&self) -> js_sys::Promise {
        self.frames.spawn_burst();
        self.sound(CueAction::Burst)
    }

    /// Resolves to `false` while a previous layer is still playing.
    pub fn play_background_music(&self) -> js_sys::Promise {
        self.sound(CueAction::BackgroundMusic)
    }

    /// Resume audio and keep the unlock token on success. Call it from a
    /// user gesture to retry after a refused first interaction.
    pub fn resume_context(&self) -> js_sys::Promise {
        let pending = self.synth.borrow().unlock_into(&self.unlocked);
        future_to_promise(async move { Ok(JsValue::from_bool(pending.await)) })
    }

    pub fn stop_all(&self) {
        self.synth.borrow_mut().stop_all();
    }

    /// Replay the opening cues: burst at 0.5 s, music at 1.8 s.
    pub fn play_opening(&self) {
        self.frames.start_opening();
    }

    pub fn is_music_playing(&self) -> bool {
        self.synth.borrow().is_music_playing()
    }

    pub fn is_burst_playing(&self) -> bool {
        self.synth.borrow().is_burst_playing()
    }

    pub fn active_bursts(&self) -> u32 {
        self.frames.active_bursts() as u32
    }
}
