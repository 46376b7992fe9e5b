//! Firecracker and ambient-music synthesizer.
//!
//! [`ToneSynthesizer`] turns the patches in [`crate::patches`] into scheduled
//! events on an [`AudioBackend`] and tracks what is playing. Playback phases
//! are derived from the backend's audio clock against the completion times
//! the synthesizer itself scheduled, so no wall-clock timers are involved.
//!
//! Failures never escape: every public operation logs and degrades to a
//! `false`/no-op result.

use crate::backend::{AudioBackend, BackendState};
use crate::constants::*;
use crate::envelope::Envelope;
use crate::error::SynthError;
use crate::patches;
use crate::sound::Bus;
use rand::prelude::*;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

/// Proof that a user gesture unlocked audio output.
///
/// Only [`ToneSynthesizer::unlock`] hands these out; `burst` and
/// `play_background_music` require one.
#[derive(Clone, Copy, Debug)]
pub struct AudioUnlocked {
    _private: (),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackPhase {
    Idle,
    Playing,
    FadingOut,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Track {
    #[default]
    Idle,
    Scheduled { fade_at: f64, ends_at: f64 },
}

impl Track {
    fn phase_at(&self, now: f64) -> PlaybackPhase {
        match *self {
            Track::Idle => PlaybackPhase::Idle,
            Track::Scheduled { ends_at, .. } if now >= ends_at => PlaybackPhase::Idle,
            Track::Scheduled { fade_at, .. } if now >= fade_at => PlaybackPhase::FadingOut,
            Track::Scheduled { .. } => PlaybackPhase::Playing,
        }
    }

    // Overlapping schedules merge into one window.
    fn extend(&mut self, now: f64, fade_at: f64, ends_at: f64) {
        *self = match *self {
            Track::Scheduled {
                fade_at: f0,
                ends_at: e0,
            } if now < e0 => Track::Scheduled {
                fade_at: f0.max(fade_at),
                ends_at: e0.max(ends_at),
            },
            _ => Track::Scheduled { fade_at, ends_at },
        };
    }
}

fn running<B: AudioBackend>(backend: &mut Option<B>) -> Result<&mut B, SynthError> {
    let backend = backend.as_mut().ok_or(SynthError::BackendUnavailable)?;
    match backend.state() {
        BackendState::Running => Ok(backend),
        state => Err(SynthError::NotRunning(state)),
    }
}

// Last writer wins; history before `now` collapses to one anchor point.
fn overwrite(mirror: &mut Envelope, now: f64, automation: &Envelope) {
    mirror.cancel_from(now);
    mirror.prune_before(now);
    mirror.extend_from(automation);
}

// Restore the master level after a previous `stop_all`. Voices from before
// the stop were retired and stay silent.
fn rearm_master<B: AudioBackend>(backend: &mut B, master: &mut Envelope, now: f64) {
    if master.value_at(f64::INFINITY) >= MASTER_LEVEL * 0.999 {
        return;
    }
    let current = master.value_at(now);
    let automation = Envelope::new(current)
        .set_at(now, current)
        .linear_to(MASTER_LEVEL, now + REARM_RAMP);
    overwrite(master, now, &automation);
    backend.automate(Bus::Master, &automation);
    log::info!("[synth] master gain re-armed");
}

pub struct ToneSynthesizer<B: AudioBackend, R: Rng = StdRng> {
    backend: Option<B>,
    rng: R,
    master: Envelope,
    music: Envelope,
    burst_track: Track,
    music_track: Track,
}

impl<B: AudioBackend> ToneSynthesizer<B, StdRng> {
    /// `None` models a missing audio backend: everything becomes a no-op.
    pub fn new(backend: Option<B>, seed: u64) -> Self {
        Self::with_rng(backend, StdRng::seed_from_u64(seed))
    }
}

impl<B: AudioBackend, R: Rng> ToneSynthesizer<B, R> {
    pub fn with_rng(backend: Option<B>, rng: R) -> Self {
        if backend.is_none() {
            log::warn!("[synth] {}; sound disabled", SynthError::BackendUnavailable);
        }
        Self {
            backend,
            rng,
            master: Envelope::new(MASTER_LEVEL),
            music: Envelope::new(0.0),
            burst_track: Track::Idle,
            music_track: Track::Idle,
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    fn now(&self) -> f64 {
        self.backend.as_ref().map_or(0.0, |b| b.current_time())
    }

    /// Resume a suspended backend.
    ///
    /// Resolves to `true` immediately, without a request, when already
    /// running. The returned future holds no borrow of `self`.
    pub fn resume_context(&self) -> impl Future<Output = bool> + 'static
    where
        B: 'static,
        R: 'static,
    {
        enum Step<F> {
            Ready(bool),
            Pending(F),
        }
        let step = match self.backend.as_ref() {
            None => {
                log::warn!("[synth] resume skipped: {}", SynthError::BackendUnavailable);
                Step::Ready(false)
            }
            Some(b) => match b.state() {
                BackendState::Running => Step::Ready(true),
                BackendState::Suspended => Step::Pending(b.request_resume()),
                state => {
                    log::warn!("[synth] resume skipped: {}", SynthError::NotRunning(state));
                    Step::Ready(false)
                }
            },
        };
        async move {
            match step {
                Step::Ready(ok) => ok,
                Step::Pending(request) => {
                    let ok = request.await;
                    if ok {
                        log::info!("[synth] audio context resumed");
                    } else {
                        log::warn!("[synth] {}", SynthError::ResumeFailed);
                    }
                    ok
                }
            }
        }
    }

    /// Resume from inside a user-gesture handler and, if the backend ends up
    /// running, hand out the unlock token.
    pub fn unlock(&self) -> impl Future<Output = Option<AudioUnlocked>> + 'static
    where
        B: 'static,
        R: 'static,
    {
        let resumed = self.resume_context();
        async move { resumed.await.then_some(AudioUnlocked { _private: () }) }
    }

    /// [`unlock`](Self::unlock), keeping the token in `slot` on success.
    ///
    /// A refused attempt leaves `slot` as it was, so a later gesture can try
    /// again.
    pub fn unlock_into(
        &self,
        slot: &Rc<Cell<Option<AudioUnlocked>>>,
    ) -> impl Future<Output = bool> + 'static
    where
        B: 'static,
        R: 'static,
    {
        let pending = self.unlock();
        let slot = slot.clone();
        async move {
            match pending.await {
                Some(token) => {
                    slot.set(Some(token));
                    true
                }
                None => false,
            }
        }
    }

    /// Schedule one firecracker burst at the current audio time.
    ///
    /// Returns `false` with nothing scheduled unless the backend is running;
    /// see [`burst_resuming`] for the variant that resumes first.
    pub fn burst(&mut self, _unlocked: &AudioUnlocked) -> bool {
        match self.try_burst() {
            Ok(span) => {
                log::debug!("[synth] burst scheduled, span {:.3}s", span);
                true
            }
            Err(e) => {
                log::warn!("[synth] burst skipped: {}", e);
                false
            }
        }
    }

    fn try_burst(&mut self) -> Result<f64, SynthError> {
        let backend = running(&mut self.backend)?;
        let now = backend.current_time();
        let events = patches::burst_events(now, backend.sample_rate(), &mut self.rng);
        rearm_master(backend, &mut self.master, now);
        let mut ends_at = now;
        for ev in &events {
            backend.schedule(ev);
            ends_at = ends_at.max(ev.end_time());
        }
        self.burst_track.extend(now, ends_at, ends_at);
        Ok(ends_at - now)
    }

    /// Start the ambient pad and pulse layer. No-op while a previous layer
    /// is still playing or fading out.
    pub fn play_background_music(&mut self, _unlocked: &AudioUnlocked) -> bool {
        if self.music_track.phase_at(self.now()) != PlaybackPhase::Idle {
            log::debug!("[synth] music already playing");
            return false;
        }
        match self.try_music() {
            Ok(voices) => {
                log::info!("[synth] background music started ({} voices)", voices);
                true
            }
            Err(e) => {
                log::warn!("[synth] music skipped: {}", e);
                false
            }
        }
    }

    fn try_music(&mut self) -> Result<usize, SynthError> {
        let backend = running(&mut self.backend)?;
        let now = backend.current_time();
        rearm_master(backend, &mut self.master, now);
        let events = patches::music_events(now, &mut self.rng);
        for ev in &events {
            backend.schedule(ev);
        }
        let automation = patches::music_bus_automation(now);
        overwrite(&mut self.music, now, &automation);
        backend.automate(Bus::Music, &automation);
        self.music_track = Track::Scheduled {
            fade_at: now + MUSIC_FADE_AT,
            ends_at: now + MUSIC_FADE_AT + MUSIC_FADE_LENGTH,
        };
        Ok(events.len())
    }

    /// Ramp the master output to silence over one second.
    ///
    /// In-flight events keep running on their own envelopes but are retired:
    /// they are cut once the ramp ends, so a later re-arm of the master
    /// cannot bring them back. Both phases drop to `Idle` immediately.
    pub fn stop_all(&mut self) {
        let Some(backend) = self.backend.as_mut() else {
            log::warn!("[synth] stop skipped: {}", SynthError::BackendUnavailable);
            return;
        };
        let now = backend.current_time();
        let prior = self.master.value_at(now);
        let automation = if prior > 0.0 {
            Envelope::new(prior)
                .set_at(now, prior)
                .exponential_to(prior * STOP_RATIO, now + STOP_RAMP)
        } else {
            Envelope::new(0.0).set_at(now, 0.0)
        };
        overwrite(&mut self.master, now, &automation);
        backend.automate(Bus::Master, &automation);
        backend.retire_voices(now, STOP_RAMP, STOP_RATIO);

        let music_now = self.music.value_at(now);
        let music_stop = Envelope::new(music_now)
            .set_at(now, music_now)
            .linear_to(0.0, now + STOP_RAMP);
        overwrite(&mut self.music, now, &music_stop);
        backend.automate(Bus::Music, &music_stop);

        self.burst_track = Track::Idle;
        self.music_track = Track::Idle;
        log::info!("[synth] stopping all sound");
    }

    /// Collapse finished tracks to `Idle`; called once per frame.
    pub fn poll(&mut self) {
        let now = self.now();
        for (label, track) in [
            ("burst", &mut self.burst_track),
            ("music", &mut self.music_track),
        ] {
            if *track != Track::Idle && track.phase_at(now) == PlaybackPhase::Idle {
                *track = Track::Idle;
                log::debug!("[synth] {} finished", label);
            }
        }
    }

    pub fn music_phase(&self) -> PlaybackPhase {
        self.music_track.phase_at(self.now())
    }

    pub fn burst_phase(&self) -> PlaybackPhase {
        self.burst_track.phase_at(self.now())
    }

    pub fn is_music_playing(&self) -> bool {
        self.music_phase() != PlaybackPhase::Idle
    }

    pub fn is_burst_playing(&self) -> bool {
        self.burst_phase() != PlaybackPhase::Idle
    }

    /// Master gain at the current audio time, as scheduled.
    pub fn master_level(&self) -> f32 {
        self.master.value_at(self.now())
    }

    pub fn music_level(&self) -> f32 {
        self.music.value_at(self.now())
    }
}

/// Resume if needed, then burst. Nothing is audible if the resume is refused.
///
/// No `RefCell` borrow is held across the await, so other callbacks may use
/// the synthesizer while the resume is pending.
pub async fn burst_resuming<B, R>(
    synth: &RefCell<ToneSynthesizer<B, R>>,
    unlocked: &AudioUnlocked,
) -> bool
where
    B: AudioBackend + 'static,
    R: Rng + 'static,
{
    let resumed = synth.borrow().resume_context();
    if !resumed.await {
        return false;
    }
    synth.borrow_mut().burst(unlocked)
}

pub async fn play_background_music_resuming<B, R>(
    synth: &RefCell<ToneSynthesizer<B, R>>,
    unlocked: &AudioUnlocked,
) -> bool
where
    B: AudioBackend + 'static,
    R: Rng + 'static,
{
    if synth.borrow().is_music_playing() {
        return false;
    }
    let resumed = synth.borrow().resume_context();
    if !resumed.await {
        return false;
    }
    synth.borrow_mut().play_background_music(unlocked)
}
