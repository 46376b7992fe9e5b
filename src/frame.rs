use crate::audio::{play_cue, WebSynth};
use crate::constants::{POINT_SIZE_DESKTOP, POINT_SIZE_MOBILE};
use crate::dom;
use crate::render;
use burst_core::{AudioUnlocked, BurstId, Camera, CueAction, CueSheet, ParticleBurstSimulator};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

/// A cue sheet and the frame timestamp it started at.
struct Opening {
    sheet: CueSheet,
    started_ms: f64,
}

pub struct FrameContext {
    pub synth: Rc<RefCell<WebSynth>>,
    pub unlocked: Rc<Cell<Option<AudioUnlocked>>>,
    pub particles: ParticleBurstSimulator,
    pub camera: Camera,
    pub gpu: Option<render::GpuState>,
    pub canvas: web::HtmlCanvasElement,
    opening: Option<Opening>,
    loop_running: bool,
}

impl FrameContext {
    pub fn new(
        synth: Rc<RefCell<WebSynth>>,
        unlocked: Rc<Cell<Option<AudioUnlocked>>>,
        particles: ParticleBurstSimulator,
        gpu: Option<render::GpuState>,
        canvas: web::HtmlCanvasElement,
    ) -> Self {
        let mut ctx = Self {
            synth,
            unlocked,
            particles,
            camera: Camera::new(1.0),
            gpu,
            canvas,
            opening: None,
            loop_running: false,
        };
        ctx.resize();
        ctx
    }

    /// Re-sync the canvas backing store, camera aspect and sprite size.
    /// Particle state is left alone.
    pub fn resize(&mut self) {
        let (w, h) = dom::sync_canvas_backing_size(&self.canvas);
        self.camera.resize(w as f64, h as f64);
        let point_size = if dom::viewport().is_mobile() {
            POINT_SIZE_MOBILE
        } else {
            POINT_SIZE_DESKTOP
        };
        if let Some(g) = &mut self.gpu {
            g.set_point_size(point_size, dom::pixel_ratio() as f32);
            g.resize_if_needed(w, h);
        }
    }

    pub fn spawn_burst(&mut self, now_ms: f64) -> BurstId {
        self.particles.burst(&dom::viewport(), now_ms)
    }

    pub fn start_opening(&mut self, now_ms: f64) {
        log::info!("[cue] opening sequence started");
        self.opening = Some(Opening {
            sheet: CueSheet::opening(),
            started_ms: now_ms,
        });
    }

    fn run_cues(&mut self, now_ms: f64) {
        let Some(opening) = self.opening.as_mut() else {
            return;
        };
        let elapsed = (now_ms - opening.started_ms).max(0.0) / 1000.0;
        let due = opening.sheet.due(elapsed);
        if opening.sheet.is_finished() {
            self.opening = None;
        }
        for action in due {
            log::debug!("[cue] {:?} at {:.2}s", action, elapsed);
            if action == CueAction::Burst {
                self.spawn_burst(now_ms);
            }
            let synth = self.synth.clone();
            let unlocked = self.unlocked.get();
            spawn_local(async move {
                play_cue(synth, unlocked, action).await;
            });
        }
    }

    /// One display frame. Returns whether another frame is needed.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        self.synth.borrow_mut().poll();
        self.run_cues(now_ms);
        let released = self.particles.step(now_ms);

        if let Some(g) = &mut self.gpu {
            for id in &released {
                g.release_burst(*id);
            }
            g.resize_if_needed(self.canvas.width(), self.canvas.height());
            if let Err(e) = g.render(&self.camera, self.particles.active()) {
                log::error!("[gpu] render error: {:?}", e);
            }
        }

        !self.particles.is_idle() || self.opening.is_some()
    }
}

pub async fn init_gpu(canvas: &web::HtmlCanvasElement) -> Option<render::GpuState> {
    match render::GpuState::new(canvas).await {
        Ok(g) => Some(g),
        Err(e) => {
            log::error!("[gpu] WebGPU init error: {:?}", e);
            None
        }
    }
}

type Tick = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn request_frame(tick: &Tick) {
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

/// requestAnimationFrame loop that only runs while there is something to
/// animate. [`FrameLoop::wake`] restarts it.
#[derive(Clone)]
pub struct FrameLoop {
    ctx: Rc<RefCell<FrameContext>>,
    tick: Tick,
}

impl FrameLoop {
    pub fn new(ctx: FrameContext) -> Self {
        let ctx = Rc::new(RefCell::new(ctx));
        let tick: Tick = Rc::new(RefCell::new(None));
        let tick_clone = tick.clone();
        let ctx_tick = ctx.clone();
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move |now_ms: f64| {
            let mut ctx = ctx_tick.borrow_mut();
            if ctx.frame(now_ms) {
                request_frame(&tick_clone);
            } else {
                ctx.loop_running = false;
                log::debug!("[particles] idle, frame loop parked");
            }
        }) as Box<dyn FnMut(f64)>));
        Self { ctx, tick }
    }

    pub fn wake(&self) {
        {
            let mut ctx = self.ctx.borrow_mut();
            if ctx.loop_running {
                return;
            }
            ctx.loop_running = true;
        }
        request_frame(&self.tick);
    }

    pub fn spawn_burst(&self) -> BurstId {
        let id = self.ctx.borrow_mut().spawn_burst(instant::now());
        self.wake();
        id
    }

    pub fn start_opening(&self) {
        self.ctx.borrow_mut().start_opening(instant::now());
        self.wake();
    }

    pub fn resize(&self) {
        self.ctx.borrow_mut().resize();
    }

    pub fn active_bursts(&self) -> usize {
        self.ctx.borrow().particles.active_count()
    }
}
