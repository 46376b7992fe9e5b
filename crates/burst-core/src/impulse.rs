use crate::constants::{REVERB_DECAY_TAU, REVERB_SECONDS};

/// Stereo impulse response for the music send.
pub struct Impulse {
    pub sample_rate: f32,
    pub channels: [Vec<f32>; 2],
}

impl Impulse {
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[inline]
fn xorshift32(state: &mut u32) -> f32 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    *state = x;
    (x as f32 / u32::MAX as f32) * 2.0 - 1.0
}

/// Decaying noise tail, deterministic per channel seed so both channels are
/// decorrelated but reproducible.
pub fn reverb_impulse(sample_rate: f32) -> Impulse {
    let len = (sample_rate * REVERB_SECONDS).max(1.0) as usize;
    let dt = 1.0 / sample_rate.max(1.0);
    let mut seeds: [u32; 2] = [0x1234_ABCD, 0x7890_FEDC];
    let channels = seeds.each_mut().map(|seed| {
        let mut buf = Vec::with_capacity(len);
        let mut t = 0.0_f32;
        for _ in 0..len {
            let n = xorshift32(seed);
            // Exponential decay with a slight darkening toward the tail
            let decay = (-t / REVERB_DECAY_TAU).exp();
            let dark = (1.0 - t / REVERB_SECONDS).max(0.0);
            buf.push(n * decay * (0.6 + 0.4 * dark));
            t += dt;
        }
        buf
    });
    Impulse {
        sample_rate,
        channels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn energy(samples: &[f32]) -> f32 {
        samples.iter().map(|s| s * s).sum()
    }

    #[test]
    fn tail_decays() {
        let ir = reverb_impulse(8_000.0);
        assert_eq!(ir.len(), 20_000);
        let quarter = ir.len() / 4;
        for ch in &ir.channels {
            assert!(energy(&ch[..quarter]) > 10.0 * energy(&ch[3 * quarter..]));
        }
    }

    #[test]
    fn channels_are_decorrelated() {
        let ir = reverb_impulse(8_000.0);
        assert_ne!(ir.channels[0][..64], ir.channels[1][..64]);
    }
}
