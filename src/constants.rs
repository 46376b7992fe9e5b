// Canvas and renderer tuning for the web front-end.
//
// Kept free of wasm-only types so host tests can `include!` it.

// Backing-store pixel ratio is capped to keep fill rate sane on dense screens
pub const MAX_PIXEL_RATIO: f64 = 2.0;

// Point sprite size in world units at unit depth (size-attenuated)
pub const POINT_SIZE_MOBILE: f32 = 6.0;
pub const POINT_SIZE_DESKTOP: f32 = 10.0;

// Upper bound on a sprite's on-screen diameter, matching typical point-size limits
pub const MAX_POINT_SIZE_PX: f32 = 64.0;

// Transparent clear so the page shows through; particles blend additively
pub const CLEAR_RGBA: [f64; 4] = [0.0, 0.0, 0.0, 0.0];

// Events that count as the first user interaction for audio unlock
pub const UNLOCK_EVENTS: [&str; 2] = ["click", "touchstart"];
