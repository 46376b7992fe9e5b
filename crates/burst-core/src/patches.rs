//! Declarative sound patches.
//!
//! Each function describes one voice of the firecracker or the ambient music
//! as a [`SoundEvent`]; nothing here touches an audio backend. All times are
//! absolute audio-clock seconds derived from a single captured `now`, so the
//! relative timing inside a burst is exact.

use crate::constants::*;
use crate::envelope::Envelope;
use crate::sound::{Bus, Filter, FilterKind, NoiseBuffer, SoundEvent, SoundSource, Waveform};
use rand::Rng;

fn oscillator(waveform: Waveform, frequency: Envelope, detune_cents: f32) -> SoundSource {
    SoundSource::Oscillator {
        waveform,
        frequency,
        detune_cents,
    }
}

/// Square-wave crack with a falling pitch and a closing lowpass.
pub fn explosion(now: f64) -> SoundEvent {
    let end = now + EXPLOSION_DURATION;
    SoundEvent {
        name: "explosion",
        source: oscillator(
            Waveform::Square,
            Envelope::starting_at(now, EXPLOSION_FREQ_START).exponential_to(EXPLOSION_FREQ_END, end),
            0.0,
        ),
        start: now,
        stop: end + EXPLOSION_TAIL,
        gain: Envelope::starting_at(now, 0.0)
            .linear_to(EXPLOSION_PEAK, now + EXPLOSION_ATTACK)
            .exponential_to(SILENCE, end),
        filter: Some(Filter {
            kind: FilterKind::Lowpass,
            cutoff: Envelope::starting_at(now, EXPLOSION_CUTOFF_START)
                .exponential_to(EXPLOSION_CUTOFF_END, end),
            q: EXPLOSION_Q,
        }),
        bus: Bus::Master,
    }
}

/// Low triangle body under the crack.
pub fn rumble(start: f64, duration: f64) -> SoundEvent {
    let end = start + duration;
    SoundEvent {
        name: "rumble",
        source: oscillator(
            Waveform::Triangle,
            Envelope::starting_at(start, RUMBLE_FREQ_START).exponential_to(RUMBLE_FREQ_END, end),
            0.0,
        ),
        start,
        stop: end + RUMBLE_TAIL,
        gain: Envelope::starting_at(start, 0.0)
            .linear_to(RUMBLE_PEAK, start + RUMBLE_ATTACK)
            .exponential_to(SILENCE, end),
        filter: Some(Filter {
            kind: FilterKind::Lowpass,
            cutoff: Envelope::starting_at(start, RUMBLE_CUTOFF_START)
                .linear_to(RUMBLE_CUTOFF_END, end),
            q: 1.0,
        }),
        bus: Bus::Master,
    }
}

pub fn sparkle(start: f64, frequency: f32) -> SoundEvent {
    SoundEvent {
        name: "sparkle",
        source: oscillator(Waveform::Sine, Envelope::starting_at(start, frequency), 0.0),
        start,
        stop: start + SPARKLE_STOP,
        gain: Envelope::starting_at(start, 0.0)
            .linear_to(SPARKLE_PEAK, start + SPARKLE_ATTACK)
            .exponential_to(SILENCE, start + SPARKLE_DECAY),
        filter: None,
        bus: Bus::Master,
    }
}

/// The four high sine pings, staggered.
pub fn sparkles(start: f64) -> impl Iterator<Item = SoundEvent> {
    SPARKLE_FREQS
        .into_iter()
        .enumerate()
        .map(move |(i, f)| sparkle(start + i as f64 * SPARKLE_STAGGER, f))
}

pub fn white_noise<R: Rng + ?Sized>(rng: &mut R, sample_rate: f32, seconds: f64) -> NoiseBuffer {
    let len = (sample_rate as f64 * seconds).round().max(1.0) as usize;
    let samples = (0..len).map(|_| rng.gen_range(-1.0_f32..1.0)).collect();
    NoiseBuffer {
        sample_rate,
        samples,
    }
}

/// Highpassed noise tail.
pub fn crackle(start: f64, noise: NoiseBuffer) -> SoundEvent {
    let stop = start + noise.duration();
    SoundEvent {
        name: "crackle",
        source: SoundSource::Noise(noise),
        start,
        stop,
        gain: Envelope::starting_at(start, 0.0)
            .linear_to(CRACKLE_PEAK, start + CRACKLE_ATTACK)
            .exponential_to(SILENCE, start + CRACKLE_DURATION),
        filter: Some(Filter {
            kind: FilterKind::Highpass,
            cutoff: Envelope::starting_at(start, CRACKLE_HIGHPASS),
            q: 1.0,
        }),
        bus: Bus::Master,
    }
}

/// Every voice of one firecracker burst, relative to `now`.
pub fn burst_events<R: Rng + ?Sized>(now: f64, sample_rate: f32, rng: &mut R) -> Vec<SoundEvent> {
    let mut events = Vec::with_capacity(3 + SPARKLE_FREQS.len());
    events.push(explosion(now));
    events.push(rumble(
        now + RUMBLE_OFFSET,
        EXPLOSION_DURATION * RUMBLE_DURATION_FACTOR,
    ));
    events.extend(sparkles(now + SPARKLE_OFFSET));
    let noise = white_noise(rng, sample_rate, CRACKLE_DURATION);
    events.push(crackle(now + CRACKLE_OFFSET, noise));
    events
}

/// Slow-attack sawtooth pad note on the music bus.
pub fn pad_note(frequency: f32, level: f32, detune_cents: f32, start: f64, duration: f64) -> SoundEvent {
    SoundEvent {
        name: "pad",
        source: oscillator(
            Waveform::Saw,
            Envelope::starting_at(start, frequency),
            detune_cents,
        ),
        start,
        stop: start + duration + PAD_RELEASE_TAIL,
        gain: Envelope::starting_at(start, 0.0)
            .linear_to(level, start + PAD_ATTACK)
            .exponential_to(SILENCE, start + duration),
        filter: None,
        bus: Bus::Music,
    }
}

pub fn pulse(start: f64, frequency: f32) -> SoundEvent {
    SoundEvent {
        name: "pulse",
        source: oscillator(Waveform::Sine, Envelope::starting_at(start, frequency), 0.0),
        start,
        stop: start + PULSE_STOP,
        gain: Envelope::starting_at(start, PULSE_START_GAIN)
            .linear_to(PULSE_PEAK, start + PULSE_RISE)
            .exponential_to(SILENCE, start + PULSE_DECAY),
        filter: None,
        bus: Bus::Music,
    }
}

/// Pad chord plus the jittered pulse layer.
pub fn music_events<R: Rng + ?Sized>(now: f64, rng: &mut R) -> Vec<SoundEvent> {
    let mut events = Vec::new();
    for (i, ((freq, level), detune)) in PAD_NOTES
        .iter()
        .copied()
        .zip(PAD_DETUNE_CENTS.iter().copied())
        .enumerate()
    {
        let duration = PAD_MIN_DURATION + rng.gen::<f64>() * PAD_DURATION_SPREAD;
        events.push(pad_note(freq, level, detune, now + i as f64 * PAD_SPACING, duration));
    }
    // Pulses run from the call time, alongside the pad attacks
    let mut offset = 0.0;
    while offset < PULSE_SPAN {
        let jitter = rng.gen::<f64>() * PULSE_MAX_JITTER;
        let freq = PULSE_FREQ_MIN + rng.gen::<f32>() * PULSE_FREQ_SPREAD;
        events.push(pulse(now + offset + jitter, freq));
        offset += PULSE_INTERVAL;
    }
    events
}

/// Music-bus gain over the whole layer: fade in, settle, hold, fade out.
pub fn music_bus_automation(now: f64) -> Envelope {
    Envelope::starting_at(now, 0.0)
        .linear_to(MUSIC_BUS_PEAK, now + MUSIC_FADE_IN)
        .linear_to(MUSIC_BUS_SETTLE, now + MUSIC_SETTLE_AT)
        .set_at(now + MUSIC_FADE_AT, MUSIC_BUS_SETTLE)
        .exponential_to(SILENCE, now + MUSIC_FADE_AT + MUSIC_FADE_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn explosion_shape() {
        let ev = explosion(10.0);
        assert_eq!(ev.waveform(), Some(Waveform::Square));
        assert!((ev.gain.value_at(10.015) - EXPLOSION_PEAK).abs() < 1e-6);
        assert!((ev.gain.value_at(10.22) - SILENCE).abs() < 1e-6);
        let filter = ev.filter.as_ref().map(|f| f.kind);
        assert_eq!(filter, Some(FilterKind::Lowpass));
    }

    #[test]
    fn white_noise_is_bounded_and_sized() {
        let mut rng = StdRng::seed_from_u64(3);
        let noise = white_noise(&mut rng, 48_000.0, CRACKLE_DURATION);
        assert_eq!(noise.samples.len(), 3840);
        assert!(noise.samples.iter().all(|s| (-1.0..1.0).contains(s)));
        assert!((noise.duration() - CRACKLE_DURATION).abs() < 1e-9);
    }

    #[test]
    fn music_bus_holds_then_fades() {
        let env = music_bus_automation(0.0);
        assert!((env.value_at(0.5) - MUSIC_BUS_PEAK).abs() < 1e-6);
        assert!((env.value_at(15.0) - MUSIC_BUS_SETTLE).abs() < 1e-6);
        assert!(env.value_at(19.0) < MUSIC_BUS_SETTLE);
        assert!((env.value_at(20.0) - SILENCE).abs() < 1e-6);
    }

    #[test]
    fn pulses_cover_the_span_with_bounded_jitter() {
        let mut rng = StdRng::seed_from_u64(11);
        let events = music_events(0.0, &mut rng);
        let pulses: Vec<_> = events.iter().filter(|e| e.name == "pulse").collect();
        assert_eq!(pulses.len(), 15);
        for (i, p) in pulses.iter().enumerate() {
            let nominal = i as f64 * PULSE_INTERVAL;
            assert!(p.start >= nominal - 1e-9 && p.start <= nominal + PULSE_MAX_JITTER);
        }
    }
}
