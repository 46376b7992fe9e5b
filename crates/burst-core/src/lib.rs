//! Platform-free core of the firecracker effects: sound patches and the
//! synthesizer state machine over an [`AudioBackend`], plus the particle
//! burst simulator. The web front-end supplies the WebAudio backend, the
//! renderer and the frame clock.

pub mod backend;
pub mod camera;
pub mod constants;
pub mod cue;
pub mod envelope;
pub mod error;
pub mod impulse;
pub mod particles;
pub mod patches;
pub mod sound;
pub mod synth;
pub mod viewport;

pub use backend::*;
pub use camera::*;
pub use cue::*;
pub use envelope::*;
pub use error::*;
pub use particles::*;
pub use sound::*;
pub use synth::*;
pub use viewport::*;
