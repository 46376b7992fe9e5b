// Host-side tests for tuning constants and their relationships.

use burst_core::constants::*;

#[test]
#[allow(clippy::assertions_on_constants)]
fn burst_voices_fit_inside_the_span_budget() {
    let explosion_end = EXPLOSION_DURATION + EXPLOSION_TAIL;
    let rumble_end = RUMBLE_OFFSET + EXPLOSION_DURATION * RUMBLE_DURATION_FACTOR + RUMBLE_TAIL;
    let sparkle_end =
        SPARKLE_OFFSET + (SPARKLE_FREQS.len() - 1) as f64 * SPARKLE_STAGGER + SPARKLE_STOP;
    let crackle_end = CRACKLE_OFFSET + CRACKLE_DURATION;
    let span = explosion_end.max(rumble_end).max(sparkle_end).max(crackle_end);
    assert!(span <= BURST_MAX_SPAN, "span {span}");
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn envelopes_attack_before_they_decay() {
    assert!(EXPLOSION_ATTACK < EXPLOSION_DURATION);
    assert!(RUMBLE_ATTACK < EXPLOSION_DURATION * RUMBLE_DURATION_FACTOR);
    assert!(SPARKLE_ATTACK < SPARKLE_DECAY && SPARKLE_DECAY < SPARKLE_STOP);
    assert!(CRACKLE_ATTACK < CRACKLE_DURATION);
    assert!(PULSE_RISE < PULSE_DECAY && PULSE_DECAY < PULSE_STOP);
    assert!(PAD_ATTACK < PAD_MIN_DURATION);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn music_layer_finishes_before_the_fade_completes() {
    assert!(MUSIC_FADE_IN < MUSIC_SETTLE_AT && MUSIC_SETTLE_AT < MUSIC_FADE_AT);
    let last_pad = (PAD_NOTES.len() - 1) as f64 * PAD_SPACING
        + PAD_MIN_DURATION
        + PAD_DURATION_SPREAD
        + PAD_RELEASE_TAIL;
    let last_pulse = PULSE_SPAN + PULSE_MAX_JITTER + PULSE_STOP;
    let track_end = MUSIC_FADE_AT + MUSIC_FADE_LENGTH;
    assert!(last_pad < track_end);
    assert!(last_pulse < track_end);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn exponential_targets_are_positive() {
    assert!(SILENCE > 0.0);
    assert!(STOP_RATIO > 0.0 && STOP_RATIO <= 0.001);
    assert!(EXPLOSION_FREQ_END > 0.0 && RUMBLE_FREQ_END > 0.0);
    assert!(EXPLOSION_CUTOFF_END > 0.0);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn particle_constants_are_sane() {
    assert!(PARTICLES_MOBILE < PARTICLES_DESKTOP);
    assert!(SPEED_MIN > 0.0 && SPEED_MIN < SPEED_MAX);
    assert!(DRAG_PER_FRAME > 0.0 && DRAG_PER_FRAME < 1.0);
    assert!(MAX_FRAME_SCALE >= 1.0);
    for color in PALETTE {
        assert!(color.iter().all(|c| (0.0..=1.0).contains(c)));
    }
}
