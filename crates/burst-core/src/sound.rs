use crate::envelope::Envelope;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Saw,
    Triangle,
}

/// Gain stage a sound event is mixed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bus {
    /// Straight into the master gain.
    Master,
    /// The music bus: dry into master plus the reverb/delay send.
    Music,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Highpass,
    Bandpass,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub kind: FilterKind,
    pub cutoff: Envelope,
    pub q: f32,
}

/// Mono sample buffer played once from the start.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseBuffer {
    pub sample_rate: f32,
    pub samples: Vec<f32>,
}

impl NoiseBuffer {
    pub fn duration(&self) -> f64 {
        if self.sample_rate <= 0.0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SoundSource {
    Oscillator {
        waveform: Waveform,
        frequency: Envelope,
        detune_cents: f32,
    },
    Noise(NoiseBuffer),
}

/// One scheduled voice: source → optional filter → gain → bus.
///
/// Built at schedule time and handed to the backend; nothing keeps it
/// afterwards. `start`/`stop` are absolute audio-clock seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct SoundEvent {
    pub name: &'static str,
    pub source: SoundSource,
    pub start: f64,
    pub stop: f64,
    pub gain: Envelope,
    pub filter: Option<Filter>,
    pub bus: Bus,
}

impl SoundEvent {
    pub fn duration(&self) -> f64 {
        self.stop - self.start
    }

    /// Latest time any part of the event is still active.
    pub fn end_time(&self) -> f64 {
        let gain_end = self.gain.end_time().unwrap_or(self.stop);
        self.stop.max(gain_end)
    }

    pub fn waveform(&self) -> Option<Waveform> {
        match &self.source {
            SoundSource::Oscillator { waveform, .. } => Some(*waveform),
            SoundSource::Noise(_) => None,
        }
    }
}
