// Host-side tests for the front-end's rendering constants.
// The main crate is wasm-only, so we include the pure-Rust module directly.

#![allow(dead_code)]
mod constants {
    include!("../src/constants.rs");
}

use constants::*;

#[test]
#[allow(clippy::assertions_on_constants)]
fn pixel_ratio_cap_is_at_least_one() {
    assert!(MAX_PIXEL_RATIO >= 1.0);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn mobile_sprites_are_smaller() {
    assert!(POINT_SIZE_MOBILE > 0.0);
    assert!(POINT_SIZE_MOBILE < POINT_SIZE_DESKTOP);
    assert!(MAX_POINT_SIZE_PX >= POINT_SIZE_DESKTOP);
}

#[test]
fn clear_colour_is_fully_transparent() {
    assert_eq!(CLEAR_RGBA[3], 0.0);
    assert!(CLEAR_RGBA.iter().all(|c| *c == 0.0));
}

#[test]
fn first_interaction_covers_mouse_and_touch() {
    assert!(UNLOCK_EVENTS.contains(&"click"));
    assert!(UNLOCK_EVENTS.contains(&"touchstart"));
}
