//! Parameter automation curves.
//!
//! An [`Envelope`] is the host-side mirror of what gets written to a WebAudio
//! `AudioParam`: a time-ordered list of control points, each either setting a
//! value outright or ramping to it from the previous point. Evaluation follows
//! the `AudioParam` rules so the synthesizer can reason about levels (e.g. the
//! master gain before a fade) without asking the browser.

use smallvec::SmallVec;

/// How a control point is reached from the point before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ramp {
    /// `setValueAtTime`
    Step,
    /// `linearRampToValueAtTime`
    Linear,
    /// `exponentialRampToValueAtTime`
    Exponential,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlPoint {
    pub time: f64,
    pub value: f32,
    pub ramp: Ramp,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    initial: f32,
    points: SmallVec<[ControlPoint; 4]>,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Envelope {
    /// Empty automation over a parameter whose intrinsic value is `initial`.
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            points: SmallVec::new(),
        }
    }

    /// Parameter pinned to `value` from `time` on.
    pub fn starting_at(time: f64, value: f32) -> Self {
        Self::new(value).set_at(time, value)
    }

    pub fn set_at(mut self, time: f64, value: f32) -> Self {
        self.push(ControlPoint {
            time,
            value,
            ramp: Ramp::Step,
        });
        self
    }

    pub fn linear_to(mut self, value: f32, time: f64) -> Self {
        self.push(ControlPoint {
            time,
            value,
            ramp: Ramp::Linear,
        });
        self
    }

    pub fn exponential_to(mut self, value: f32, time: f64) -> Self {
        self.push(ControlPoint {
            time,
            value,
            ramp: Ramp::Exponential,
        });
        self
    }

    // Points at equal times keep insertion order, as AudioParam does.
    fn push(&mut self, point: ControlPoint) {
        let idx = self.points.partition_point(|p| p.time <= point.time);
        self.points.insert(idx, point);
    }

    pub fn initial(&self) -> f32 {
        self.initial
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start_time(&self) -> Option<f64> {
        self.points.first().map(|p| p.time)
    }

    pub fn end_time(&self) -> Option<f64> {
        self.points.last().map(|p| p.time)
    }

    /// Drop every point at or after `time` (`cancelScheduledValues`).
    pub fn cancel_from(&mut self, time: f64) {
        self.points.retain(|p| p.time < time);
    }

    /// Collapse everything before `time` into one anchor.
    ///
    /// The last point before `time` becomes a step and the intrinsic value,
    /// so `value_at` is unchanged for any time at or after it.
    pub fn prune_before(&mut self, time: f64) {
        let before = self.points.partition_point(|p| p.time < time);
        if before == 0 {
            return;
        }
        self.points.drain(..before - 1);
        let anchor = &mut self.points[0];
        anchor.ramp = Ramp::Step;
        self.initial = anchor.value;
    }

    /// Append another envelope's points, keeping time order.
    pub fn extend_from(&mut self, other: &Envelope) {
        for p in other.points.iter() {
            self.push(*p);
        }
    }

    /// Parameter value at `time`.
    ///
    /// A ramp with no preceding point holds the intrinsic value until its end
    /// time. An exponential ramp between values of different sign (or from
    /// zero) holds the previous value until its end time.
    pub fn value_at(&self, time: f64) -> f32 {
        let mut prev: Option<(f64, f32)> = None;
        let mut current = self.initial;
        for p in self.points.iter() {
            if p.time <= time {
                prev = Some((p.time, p.value));
                current = p.value;
                continue;
            }
            let Some((t0, v0)) = prev else {
                return current;
            };
            let span = p.time - t0;
            if span <= 0.0 {
                return current;
            }
            let frac = ((time - t0) / span).clamp(0.0, 1.0);
            return match p.ramp {
                Ramp::Step => v0,
                Ramp::Linear => (v0 as f64 + (p.value as f64 - v0 as f64) * frac) as f32,
                Ramp::Exponential => {
                    if (v0 as f64) * (p.value as f64) <= 0.0 {
                        v0
                    } else {
                        (v0 as f64 * (p.value as f64 / v0 as f64).powf(frac)) as f32
                    }
                }
            };
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_ramp_hits_midpoint() {
        let env = Envelope::starting_at(1.0, 0.0).linear_to(1.0, 2.0);
        assert_eq!(env.value_at(0.5), 0.0);
        assert!((env.value_at(1.5) - 0.5).abs() < 1e-6);
        assert_eq!(env.value_at(3.0), 1.0);
    }

    #[test]
    fn exponential_ramp_is_geometric() {
        let env = Envelope::starting_at(0.0, 100.0).exponential_to(1.0, 2.0);
        assert!((env.value_at(1.0) - 10.0).abs() < 1e-3);
        assert!((env.value_at(2.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn exponential_from_zero_holds_until_end() {
        let env = Envelope::starting_at(0.0, 0.0).exponential_to(1.0, 1.0);
        assert_eq!(env.value_at(0.9), 0.0);
        assert_eq!(env.value_at(1.0), 1.0);
    }

    #[test]
    fn intrinsic_value_before_first_point() {
        let env = Envelope::new(0.35).linear_to(0.0, 1.0);
        assert_eq!(env.value_at(0.5), 0.35);
        assert_eq!(env.value_at(1.0), 0.0);
    }

    #[test]
    fn cancel_then_extend_replaces_the_tail() {
        let mut env = Envelope::starting_at(0.0, 1.0).linear_to(0.0, 10.0);
        env.cancel_from(2.0);
        env.extend_from(&Envelope::new(0.0).set_at(2.0, 0.5));
        assert_eq!(env.points().len(), 2);
        assert_eq!(env.value_at(5.0), 0.5);
    }

    #[test]
    fn pruning_keeps_the_ramp_in_progress() {
        let mut env = Envelope::starting_at(0.0, 0.0)
            .linear_to(1.0, 1.0)
            .linear_to(0.0, 3.0);
        let at_two = env.value_at(2.0);
        env.prune_before(2.0);
        assert_eq!(env.points().len(), 2);
        assert_eq!(env.initial(), 1.0);
        assert!((env.value_at(2.0) - at_two).abs() < 1e-6);
        assert_eq!(env.value_at(3.0), 0.0);
    }

    #[test]
    fn repeated_rewrites_stay_bounded() {
        let mut env = Envelope::new(0.35);
        for i in 0..50 {
            let now = i as f64;
            let current = env.value_at(now);
            env.cancel_from(now);
            env.prune_before(now);
            env.extend_from(
                &Envelope::new(current)
                    .set_at(now, current)
                    .exponential_to(0.001, now + 0.5),
            );
        }
        assert!(env.points().len() <= 3);
        assert!((env.value_at(49.5) - 0.001).abs() < 1e-6);
    }

    #[test]
    fn equal_times_keep_insertion_order() {
        let env = Envelope::new(0.0).set_at(1.0, 0.2).set_at(1.0, 0.7);
        assert_eq!(env.value_at(1.0), 0.7);
    }
}
