// Tuning constants for the burst synthesis and particle simulation.
//
// Times are seconds relative to the captured audio-clock `now` unless the
// name says otherwise. Gains are linear amplitudes.

// ---------------- Mix levels ----------------
pub const MASTER_LEVEL: f32 = 0.35;
pub const MUSIC_BUS_PEAK: f32 = 0.22;
pub const MUSIC_BUS_SETTLE: f32 = 0.18;

// Exponential ramps cannot reach zero; this is the "silent" floor.
pub const SILENCE: f32 = 0.001;

// ---------------- Explosion ----------------
pub const EXPLOSION_DURATION: f64 = 0.22;
pub const EXPLOSION_TAIL: f64 = 0.1; // oscillator keeps running after the envelope
pub const EXPLOSION_FREQ_START: f32 = 2400.0;
pub const EXPLOSION_FREQ_END: f32 = 60.0;
pub const EXPLOSION_CUTOFF_START: f32 = 5000.0;
pub const EXPLOSION_CUTOFF_END: f32 = 800.0;
pub const EXPLOSION_Q: f32 = 2.0;
pub const EXPLOSION_ATTACK: f64 = 0.015;
pub const EXPLOSION_PEAK: f32 = 0.85;

// ---------------- Rumble ----------------
pub const RUMBLE_OFFSET: f64 = 0.03;
pub const RUMBLE_DURATION_FACTOR: f64 = 1.5; // relative to the explosion
pub const RUMBLE_TAIL: f64 = 0.2;
pub const RUMBLE_FREQ_START: f32 = 120.0;
pub const RUMBLE_FREQ_END: f32 = 30.0;
pub const RUMBLE_CUTOFF_START: f32 = 800.0;
pub const RUMBLE_CUTOFF_END: f32 = 100.0;
pub const RUMBLE_ATTACK: f64 = 0.04;
pub const RUMBLE_PEAK: f32 = 0.45;

// ---------------- Sparkles ----------------
pub const SPARKLE_OFFSET: f64 = 0.08;
pub const SPARKLE_STAGGER: f64 = 0.025;
pub const SPARKLE_FREQS: [f32; 4] = [2800.0, 3800.0, 5200.0, 6800.0];
pub const SPARKLE_ATTACK: f64 = 0.008;
pub const SPARKLE_DECAY: f64 = 0.12;
pub const SPARKLE_STOP: f64 = 0.15;
pub const SPARKLE_PEAK: f32 = 0.28;

// ---------------- Crackle ----------------
pub const CRACKLE_OFFSET: f64 = 0.12;
pub const CRACKLE_DURATION: f64 = 0.08;
pub const CRACKLE_HIGHPASS: f32 = 2000.0;
pub const CRACKLE_ATTACK: f64 = 0.01;
pub const CRACKLE_PEAK: f32 = 0.22;

// Upper bound on the scheduled span of one burst (seconds from `now`).
pub const BURST_MAX_SPAN: f64 = 0.65;

// ---------------- Ambient pad ----------------
pub const PAD_NOTES: [(f32, f32); 4] = [
    (220.0, 0.12), // A3
    (277.0, 0.09), // C#4
    (330.0, 0.11), // E4
    (440.0, 0.08), // A4
];
pub const PAD_DETUNE_CENTS: [f32; 4] = [-4.0, 3.0, -2.0, 5.0];
pub const PAD_SPACING: f64 = 0.3;
pub const PAD_ATTACK: f64 = 1.2;
pub const PAD_MIN_DURATION: f64 = 8.0;
pub const PAD_DURATION_SPREAD: f64 = 4.0;
pub const PAD_RELEASE_TAIL: f64 = 0.5;

// ---------------- Rhythmic pulse ----------------
pub const PULSE_INTERVAL: f64 = 1.1;
pub const PULSE_SPAN: f64 = 16.0;
pub const PULSE_MAX_JITTER: f64 = 0.3;
pub const PULSE_FREQ_MIN: f32 = 110.0;
pub const PULSE_FREQ_SPREAD: f32 = 20.0;
pub const PULSE_START_GAIN: f32 = 0.08;
pub const PULSE_PEAK: f32 = 0.18;
pub const PULSE_RISE: f64 = 0.12;
pub const PULSE_DECAY: f64 = 0.45;
pub const PULSE_STOP: f64 = 0.5;

// ---------------- Music bus timeline ----------------
pub const MUSIC_FADE_IN: f64 = 0.5;
pub const MUSIC_SETTLE_AT: f64 = 12.0;
pub const MUSIC_FADE_AT: f64 = 18.0;
pub const MUSIC_FADE_LENGTH: f64 = 2.0;

// ---------------- Music FX send ----------------
pub const MUSIC_DELAY_TIME: f64 = 0.12;
pub const MUSIC_DELAY_MAX: f64 = 0.3;
pub const MUSIC_FEEDBACK: f32 = 0.4;
pub const REVERB_SECONDS: f32 = 2.5;
pub const REVERB_DECAY_TAU: f32 = 0.8;

// ---------------- stop_all ----------------
pub const STOP_RAMP: f64 = 1.0;
pub const STOP_RATIO: f32 = 0.001;
pub const REARM_RAMP: f64 = 0.01;

// ---------------- Particles ----------------
pub const MOBILE_BREAKPOINT_PX: f64 = 768.0;
pub const MOBILE_UA_TOKENS: [&str; 4] = ["android", "iphone", "ipad", "ipod"];
pub const PARTICLES_MOBILE: usize = 200;
pub const PARTICLES_DESKTOP: usize = 400;

pub const BURST_DURATION_MS: f64 = 1500.0;
pub const FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;
pub const MAX_FRAME_SCALE: f32 = 4.0; // long frames (tab switch) advance at most 4 frames
pub const FRAME_STEP: f32 = 0.016; // velocity → displacement per reference frame
pub const GRAVITY_BIAS: f32 = 0.02; // downward shift per frame at progress = 1
pub const DRAG_PER_FRAME: f32 = 0.99;
pub const SPEED_MIN: f32 = 0.8;
pub const SPEED_MAX: f32 = 2.6;

pub const PALETTE: [[f32; 3]; 5] = [
    [1.0, 0.84, 0.0],   // gold
    [1.0, 0.71, 0.76],  // rose gold
    [0.8, 0.52, 0.79],  // amethyst
    [0.92, 0.75, 0.84], // mauve pink
    [1.0, 1.0, 1.0],    // white
];

// ---------------- Camera ----------------
pub const CAMERA_FOV_DEGREES: f32 = 75.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;
pub const CAMERA_Z: f32 = 5.0;

// ---------------- Opening cues ----------------
pub const OPENING_BURST_AT: f64 = 0.5;
pub const OPENING_MUSIC_AT: f64 = 1.8;
