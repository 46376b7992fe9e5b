use crate::envelope::Envelope;
use crate::sound::{Bus, SoundEvent};
use std::future::Future;

/// Lifecycle of the underlying audio context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendState {
    Suspended,
    Running,
    Closed,
}

/// The audio graph the synthesizer schedules into.
///
/// Implemented over WebAudio in the browser and by recording mocks in tests.
/// Scheduling is fire-and-forget: once handed over, an event plays out on its
/// own envelopes and cannot be recalled.
pub trait AudioBackend {
    /// Outcome of a resume request; resolves to `true` once running.
    type Resume: Future<Output = bool> + 'static;

    fn state(&self) -> BackendState;

    /// Audio clock in seconds.
    fn current_time(&self) -> f64;

    fn sample_rate(&self) -> f32;

    /// Ask the environment to resume a suspended context. Only honoured
    /// reliably from inside a user-gesture handler.
    fn request_resume(&self) -> Self::Resume;

    fn schedule(&mut self, event: &SoundEvent);

    /// Fade every voice scheduled so far from full level at `at` down to
    /// `floor` at `at + fade`, then cut it. Events scheduled afterwards play
    /// on fresh stages that the retirement does not touch.
    fn retire_voices(&mut self, at: f64, fade: f64, floor: f32);

    /// Replace the bus gain automation from `automation.start_time()` on:
    /// everything scheduled at or after that time is cancelled first.
    fn automate(&mut self, bus: Bus, automation: &Envelope);
}
