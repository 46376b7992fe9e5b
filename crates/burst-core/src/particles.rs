//! Point-particle firecracker bursts.
//!
//! Every `burst()` owns a private arena (positions, velocities, colours
//! indexed by particle id) integrated with forward Euler under drag and a
//! stylised gravity bias that grows with progress. Bursts never share state,
//! so any number may run at once; a burst is dropped as soon as its progress
//! reaches 1.

use crate::constants::*;
use crate::viewport::Viewport;
use fnv::FnvHashMap;
use glam::Vec3;
use rand::prelude::*;
use smallvec::SmallVec;
use std::f32::consts::{PI, TAU};
use std::fmt;

/// GPU instance layout: one per particle.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BurstId(u64);

impl BurstId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for BurstId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for BurstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Integration parameters; the defaults reproduce the firecracker look.
#[derive(Clone, Debug, PartialEq)]
pub struct BurstParams {
    pub duration_ms: f64,
    /// Displacement per unit velocity per reference (1/60 s) frame.
    pub frame_step: f32,
    /// Downward shift per reference frame at progress 1.
    pub gravity_bias: f32,
    pub drag_per_frame: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub max_frame_scale: f32,
}

impl Default for BurstParams {
    fn default() -> Self {
        Self {
            duration_ms: BURST_DURATION_MS,
            frame_step: FRAME_STEP,
            gravity_bias: GRAVITY_BIAS,
            drag_per_frame: DRAG_PER_FRAME,
            speed_min: SPEED_MIN,
            speed_max: SPEED_MAX,
            max_frame_scale: MAX_FRAME_SCALE,
        }
    }
}

pub struct ParticleBurst {
    id: BurstId,
    started_ms: f64,
    last_ms: f64,
    progress: f32,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    colors: Vec<[f32; 3]>,
}

impl ParticleBurst {
    /// Spawn `count` particles at the origin with random spherical velocities.
    pub fn spawn<R: Rng + ?Sized>(
        id: BurstId,
        count: usize,
        now_ms: f64,
        params: &BurstParams,
        rng: &mut R,
    ) -> Self {
        let mut velocities = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);
        for _ in 0..count {
            let theta = rng.gen::<f32>() * TAU;
            let phi = rng.gen::<f32>() * PI;
            let speed = params.speed_min + rng.gen::<f32>() * (params.speed_max - params.speed_min);
            velocities.push(
                speed * Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos()),
            );
            colors.push(PALETTE[rng.gen_range(0..PALETTE.len())]);
        }
        Self {
            id,
            started_ms: now_ms,
            last_ms: now_ms,
            progress: 0.0,
            positions: vec![Vec3::ZERO; count],
            velocities,
            colors,
        }
    }

    /// Advance to frame timestamp `now_ms`.
    ///
    /// Timestamps earlier than the spawn or the previous frame (display
    /// callbacks can carry a frame-start time older than the burst) count as
    /// zero elapsed time.
    pub fn step(&mut self, now_ms: f64, params: &BurstParams) {
        let elapsed = (now_ms - self.started_ms).max(0.0);
        self.progress = (elapsed / params.duration_ms).clamp(0.0, 1.0) as f32;
        let dt = (now_ms - self.last_ms).max(0.0);
        self.last_ms = self.last_ms.max(now_ms);

        let scale = ((dt / FRAME_INTERVAL_MS) as f32).min(params.max_frame_scale);
        let advance = params.frame_step * scale;
        let fall = self.progress * params.gravity_bias * scale;
        let drag = params.drag_per_frame.powf(scale);
        for (p, v) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            *p += *v * advance;
            p.y -= fall;
            *v *= drag;
        }
    }

    pub fn id(&self) -> BurstId {
        self.id
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn opacity(&self) -> f32 {
        1.0 - self.progress
    }

    pub fn is_finished(&self) -> bool {
        self.progress >= 1.0
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    pub fn mean_radius(&self) -> f32 {
        if self.positions.is_empty() {
            return 0.0;
        }
        self.positions.iter().map(|p| p.length()).sum::<f32>() / self.positions.len() as f32
    }

    /// Pack the arena into GPU instances, reusing `out`'s allocation.
    pub fn write_vertices(&self, out: &mut Vec<ParticleVertex>) {
        out.clear();
        out.extend(
            self.positions
                .iter()
                .zip(self.colors.iter())
                .map(|(p, c)| ParticleVertex {
                    position: p.to_array(),
                    color: *c,
                }),
        );
    }
}

pub struct ParticleBurstSimulator<R: Rng = StdRng> {
    rng: R,
    params: BurstParams,
    bursts: FnvHashMap<BurstId, ParticleBurst>,
    next_id: u64,
}

impl ParticleBurstSimulator<StdRng> {
    pub fn new(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), BurstParams::default())
    }
}

impl<R: Rng> ParticleBurstSimulator<R> {
    pub fn with_rng(rng: R, params: BurstParams) -> Self {
        Self {
            rng,
            params,
            bursts: FnvHashMap::default(),
            next_id: 0,
        }
    }

    pub fn params(&self) -> &BurstParams {
        &self.params
    }

    /// Start a new, independent burst sized for `viewport`.
    pub fn burst(&mut self, viewport: &Viewport, now_ms: f64) -> BurstId {
        let id = BurstId(self.next_id);
        self.next_id += 1;
        let count = viewport.particle_count();
        let burst = ParticleBurst::spawn(id, count, now_ms, &self.params, &mut self.rng);
        self.bursts.insert(id, burst);
        log::debug!("[particles] burst {} spawned {} particles", id, count);
        id
    }

    /// Advance every active burst and release the finished ones.
    ///
    /// Returns the ids released this frame so per-burst GPU resources can be
    /// dropped alongside.
    pub fn step(&mut self, now_ms: f64) -> SmallVec<[BurstId; 2]> {
        let params = &self.params;
        for burst in self.bursts.values_mut() {
            burst.step(now_ms, params);
        }
        let mut finished = SmallVec::new();
        self.bursts.retain(|id, burst| {
            if burst.is_finished() {
                finished.push(*id);
                false
            } else {
                true
            }
        });
        for id in &finished {
            log::debug!("[particles] burst {} released", id);
        }
        finished
    }

    pub fn get(&self, id: BurstId) -> Option<&ParticleBurst> {
        self.bursts.get(&id)
    }

    pub fn active(&self) -> impl Iterator<Item = &ParticleBurst> {
        self.bursts.values()
    }

    pub fn active_count(&self) -> usize {
        self.bursts.len()
    }

    pub fn live_particles(&self) -> usize {
        self.bursts.values().map(ParticleBurst::len).sum()
    }

    pub fn is_idle(&self) -> bool {
        self.bursts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_starts_at_origin_with_bounded_speed() {
        let mut rng = StdRng::seed_from_u64(9);
        let params = BurstParams::default();
        let burst = ParticleBurst::spawn(BurstId(0), 64, 0.0, &params, &mut rng);
        assert!(burst.positions().iter().all(|p| *p == Vec3::ZERO));
        for v in burst.velocities() {
            let s = v.length();
            assert!(s >= SPEED_MIN - 1e-4 && s <= SPEED_MAX + 1e-4, "speed {s}");
        }
        assert!(burst.colors().iter().all(|c| PALETTE.contains(c)));
    }

    #[test]
    fn stale_timestamps_do_not_move_particles() {
        let mut rng = StdRng::seed_from_u64(9);
        let params = BurstParams::default();
        let mut burst = ParticleBurst::spawn(BurstId(0), 8, 100.0, &params, &mut rng);
        burst.step(90.0, &params);
        assert_eq!(burst.progress(), 0.0);
        assert!(burst.positions().iter().all(|p| *p == Vec3::ZERO));
    }

    #[test]
    fn vertices_mirror_the_arena() {
        let mut rng = StdRng::seed_from_u64(1);
        let params = BurstParams::default();
        let mut burst = ParticleBurst::spawn(BurstId(0), 16, 0.0, &params, &mut rng);
        burst.step(16.0, &params);
        let mut out = Vec::new();
        burst.write_vertices(&mut out);
        assert_eq!(out.len(), 16);
        assert_eq!(out[3].position, burst.positions()[3].to_array());
        assert_eq!(out[3].color, burst.colors()[3]);
    }
}
