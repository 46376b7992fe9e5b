use crate::constants::{MOBILE_BREAKPOINT_PX, MOBILE_UA_TOKENS, PARTICLES_DESKTOP, PARTICLES_MOBILE};

/// The one environmental read the simulator needs: how big the page is and
/// what kind of device it runs on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Viewport {
    /// CSS (device-independent) pixels.
    pub width: f64,
    pub height: f64,
    pub user_agent: String,
}

impl Viewport {
    pub fn new(width: f64, height: f64, user_agent: impl Into<String>) -> Self {
        Self {
            width,
            height,
            user_agent: user_agent.into(),
        }
    }

    pub fn is_mobile(&self) -> bool {
        if self.width < MOBILE_BREAKPOINT_PX {
            return true;
        }
        let ua = self.user_agent.to_ascii_lowercase();
        MOBILE_UA_TOKENS.iter().any(|t| ua.contains(t))
    }

    pub fn particle_count(&self) -> usize {
        if self.is_mobile() {
            PARTICLES_MOBILE
        } else {
            PARTICLES_DESKTOP
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.height <= 0.0 {
            return 1.0;
        }
        (self.width / self.height) as f32
    }
}
