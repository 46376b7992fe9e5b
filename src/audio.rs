use burst_core::constants::{MASTER_LEVEL, MUSIC_DELAY_MAX, MUSIC_DELAY_TIME, MUSIC_FEEDBACK};
use burst_core::impulse::reverb_impulse;
use burst_core::{
    burst_resuming, play_background_music_resuming, AudioBackend, AudioUnlocked, BackendState,
    Bus, CueAction, Envelope, FilterKind, Ramp, SoundEvent, SoundSource, ToneSynthesizer,
    Waveform,
};
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

pub type WebSynth = ToneSynthesizer<WebAudioBackend>;

fn create_gain(
    audio_ctx: &web::AudioContext,
    value: f32,
    label: &str,
) -> Result<web::GainNode, ()> {
    match web::GainNode::new(audio_ctx) {
        Ok(g) => {
            g.gain().set_value(value);
            Ok(g)
        }
        Err(e) => {
            log::error!("[audio] {} GainNode error: {:?}", label, e);
            Err(())
        }
    }
}

/// Master and music buses.
///
/// master → destination; music → master (dry) and music → reverb → delay
/// with feedback → master.
struct Buses {
    master: web::GainNode,
    music: web::GainNode,
}

fn build_buses(audio_ctx: &web::AudioContext) -> Result<Buses, ()> {
    let master = create_gain(audio_ctx, MASTER_LEVEL, "Master")?;
    _ = master.connect_with_audio_node(&audio_ctx.destination());

    // Silent until the first music layer automates it
    let music = create_gain(audio_ctx, 0.0, "Music")?;
    _ = music.connect_with_audio_node(&master);

    let reverb = web::ConvolverNode::new(audio_ctx)
        .map_err(|e| {
            log::error!("[audio] ConvolverNode error: {:?}", e);
        })
        .map_err(|_| ())?;
    reverb.set_normalize(true);
    let ir = reverb_impulse(audio_ctx.sample_rate());
    if let Ok(buffer) = audio_ctx.create_buffer(2, ir.len() as u32, ir.sample_rate) {
        for (ch, samples) in ir.channels.iter().enumerate() {
            let mut samples = samples.clone();
            _ = buffer.copy_to_channel(&mut samples, ch as i32);
        }
        reverb.set_buffer(Some(&buffer));
    }

    let delay = audio_ctx
        .create_delay_with_max_delay_time(MUSIC_DELAY_MAX)
        .map_err(|e| {
            log::error!("[audio] DelayNode error: {:?}", e);
        })
        .map_err(|_| ())?;
    delay.delay_time().set_value(MUSIC_DELAY_TIME as f32);
    let feedback = create_gain(audio_ctx, MUSIC_FEEDBACK, "Delay feedback")?;

    _ = music.connect_with_audio_node(&reverb);
    _ = reverb.connect_with_audio_node(&delay);
    _ = delay.connect_with_audio_node(&feedback);
    _ = feedback.connect_with_audio_node(&delay);
    _ = delay.connect_with_audio_node(&master);

    Ok(Buses { master, music })
}

/// Unity gains between the voices and the buses. `stop_all` retires the
/// current pair and later voices attach to a fresh one.
struct Stages {
    master: web::GainNode,
    music: web::GainNode,
}

fn build_stages(audio_ctx: &web::AudioContext, buses: &Buses) -> Result<Stages, ()> {
    let master = create_gain(audio_ctx, 1.0, "Master stage")?;
    _ = master.connect_with_audio_node(&buses.master);
    let music = create_gain(audio_ctx, 1.0, "Music stage")?;
    _ = music.connect_with_audio_node(&buses.music);
    Ok(Stages { master, music })
}

// Full level at `at`, exponential to `floor` by `at + fade`, then cut.
fn retire_stage(stage: &web::GainNode, at: f64, fade: f64, floor: f32) -> Result<(), JsValue> {
    let param = stage.gain();
    param.cancel_scheduled_values(at)?;
    param.set_value_at_time(1.0, at)?;
    param.exponential_ramp_to_value_at_time(floor, at + fade)?;
    param.set_value_at_time(0.0, at + fade)?;
    Ok(())
}

fn oscillator_type(waveform: Waveform) -> web::OscillatorType {
    match waveform {
        Waveform::Sine => web::OscillatorType::Sine,
        Waveform::Square => web::OscillatorType::Square,
        Waveform::Saw => web::OscillatorType::Sawtooth,
        Waveform::Triangle => web::OscillatorType::Triangle,
    }
}

fn filter_type(kind: FilterKind) -> web::BiquadFilterType {
    match kind {
        FilterKind::Lowpass => web::BiquadFilterType::Lowpass,
        FilterKind::Highpass => web::BiquadFilterType::Highpass,
        FilterKind::Bandpass => web::BiquadFilterType::Bandpass,
    }
}

fn write_points(param: &web::AudioParam, envelope: &Envelope) -> Result<(), JsValue> {
    for p in envelope.points() {
        match p.ramp {
            Ramp::Step => param.set_value_at_time(p.value, p.time)?,
            Ramp::Linear => param.linear_ramp_to_value_at_time(p.value, p.time)?,
            Ramp::Exponential => param.exponential_ramp_to_value_at_time(p.value, p.time)?,
        };
    }
    Ok(())
}

// Fresh parameter: intrinsic value first, then the automation.
fn apply_envelope(param: &web::AudioParam, envelope: &Envelope) -> Result<(), JsValue> {
    param.set_value(envelope.initial());
    write_points(param, envelope)
}

/// [`AudioBackend`] over a browser `AudioContext`.
pub struct WebAudioBackend {
    ctx: web::AudioContext,
    buses: Buses,
    stages: Stages,
}

impl WebAudioBackend {
    pub fn new() -> anyhow::Result<Self> {
        let ctx = web::AudioContext::new().map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let buses = build_buses(&ctx).map_err(|_| anyhow::anyhow!("audio graph setup failed"))?;
        let stages =
            build_stages(&ctx, &buses).map_err(|_| anyhow::anyhow!("voice stage setup failed"))?;
        log::info!(
            "[audio] context created at {} Hz ({:?})",
            ctx.sample_rate(),
            ctx.state()
        );
        Ok(Self { ctx, buses, stages })
    }

    fn bus(&self, bus: Bus) -> &web::GainNode {
        match bus {
            Bus::Master => &self.buses.master,
            Bus::Music => &self.buses.music,
        }
    }

    fn stage(&self, bus: Bus) -> &web::GainNode {
        match bus {
            Bus::Master => &self.stages.master,
            Bus::Music => &self.stages.music,
        }
    }

    fn try_schedule(&self, event: &SoundEvent) -> Result<(), JsValue> {
        let source: web::AudioScheduledSourceNode = match &event.source {
            SoundSource::Oscillator {
                waveform,
                frequency,
                detune_cents,
            } => {
                let osc = web::OscillatorNode::new(&self.ctx)?;
                osc.set_type(oscillator_type(*waveform));
                apply_envelope(&osc.frequency(), frequency)?;
                osc.detune().set_value(*detune_cents);
                osc.into()
            }
            SoundSource::Noise(noise) => {
                let buffer =
                    self.ctx
                        .create_buffer(1, noise.samples.len() as u32, noise.sample_rate)?;
                let mut samples = noise.samples.clone();
                buffer.copy_to_channel(&mut samples, 0)?;
                let src = web::AudioBufferSourceNode::new(&self.ctx)?;
                src.set_buffer(Some(&buffer));
                src.into()
            }
        };

        let gain = web::GainNode::new(&self.ctx)?;
        apply_envelope(&gain.gain(), &event.gain)?;
        match &event.filter {
            Some(f) => {
                let filter = web::BiquadFilterNode::new(&self.ctx)?;
                filter.set_type(filter_type(f.kind));
                apply_envelope(&filter.frequency(), &f.cutoff)?;
                filter.q().set_value(f.q);
                source.connect_with_audio_node(&filter)?;
                filter.connect_with_audio_node(&gain)?;
            }
            None => {
                source.connect_with_audio_node(&gain)?;
            }
        }
        gain.connect_with_audio_node(self.stage(event.bus))?;
        source.start_with_when(event.start)?;
        source.stop_with_when(event.stop)?;
        Ok(())
    }
}

impl AudioBackend for WebAudioBackend {
    type Resume = Pin<Box<dyn Future<Output = bool>>>;

    fn state(&self) -> BackendState {
        match self.ctx.state() {
            web::AudioContextState::Running => BackendState::Running,
            web::AudioContextState::Closed => BackendState::Closed,
            _ => BackendState::Suspended,
        }
    }

    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    fn sample_rate(&self) -> f32 {
        self.ctx.sample_rate()
    }

    fn request_resume(&self) -> Self::Resume {
        // The request itself must be issued now, inside the gesture handler.
        let request = self.ctx.resume();
        let ctx = self.ctx.clone();
        Box::pin(async move {
            let promise = match request {
                Ok(p) => p,
                Err(e) => {
                    log::error!("[audio] resume error: {:?}", e);
                    return false;
                }
            };
            match JsFuture::from(promise).await {
                Ok(_) => ctx.state() == web::AudioContextState::Running,
                Err(e) => {
                    log::warn!("[audio] resume rejected: {:?}", e);
                    false
                }
            }
        })
    }

    fn schedule(&mut self, event: &SoundEvent) {
        if let Err(e) = self.try_schedule(event) {
            log::error!("[audio] {} dropped: {:?}", event.name, e);
        }
    }

    fn retire_voices(&mut self, at: f64, fade: f64, floor: f32) {
        for stage in [&self.stages.master, &self.stages.music] {
            if let Err(e) = retire_stage(stage, at, fade, floor) {
                log::error!("[audio] stage retirement error: {:?}", e);
            }
        }
        match build_stages(&self.ctx, &self.buses) {
            Ok(stages) => self.stages = stages,
            Err(_) => log::error!("[audio] no fresh voice stages; keeping the retired pair"),
        }
    }

    fn automate(&mut self, bus: Bus, automation: &Envelope) {
        let param = self.bus(bus).gain();
        let from = automation
            .start_time()
            .unwrap_or_else(|| self.ctx.current_time());
        let result = param
            .cancel_scheduled_values(from)
            .and_then(|_| write_points(&param, automation));
        if let Err(e) = result {
            log::error!("[audio] {:?} bus automation error: {:?}", bus, e);
        }
    }
}

/// Play the sound half of a cue, resuming first. Without an unlock token
/// (no user gesture yet) nothing is attempted.
pub async fn play_cue(
    synth: Rc<RefCell<WebSynth>>,
    unlocked: Option<AudioUnlocked>,
    action: CueAction,
) -> bool {
    let Some(token) = unlocked else {
        log::warn!("[audio] {:?} before first interaction; sound skipped", action);
        return false;
    };
    match action {
        CueAction::Burst => burst_resuming(&synth, &token).await,
        CueAction::BackgroundMusic => play_background_music_resuming(&synth, &token).await,
    }
}
