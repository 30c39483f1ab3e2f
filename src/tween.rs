//! Easing curves and single-value tweens on the virtual clock.

/// Cubic ease-in: slow start, fast finish.
#[inline]
pub fn ease_in_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * t
}

/// Cubic ease-out: fast start, slow finish.
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Cubic ease-in-out; the default curve for UI timing.
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[inline]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    Linear,
    In,
    Out,
    #[default]
    InOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Easing::Linear => linear(t),
            Easing::In => ease_in_cubic(t),
            Easing::Out => ease_out_cubic(t),
            Easing::InOut => ease_in_out_cubic(t),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    Once,
    /// Runs `from -> to -> from` forever; `duration_ms` is one leg.
    PingPong,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub start_ms: u64,
    pub duration_ms: u64,
    pub easing: Easing,
    pub repeat: Repeat,
}

impl Tween {
    pub fn new(from: f32, to: f32, start_ms: u64, duration_ms: u64, easing: Easing) -> Self {
        Self {
            from,
            to,
            start_ms,
            duration_ms,
            easing,
            repeat: Repeat::Once,
        }
    }

    pub fn ping_pong(from: f32, to: f32, start_ms: u64, leg_ms: u64, easing: Easing) -> Self {
        Self {
            repeat: Repeat::PingPong,
            duration_ms: leg_ms.max(1),
            ..Self::new(from, to, start_ms, leg_ms, easing)
        }
    }

    /// When a one-shot tween reaches its target. Looping tweens never end.
    pub fn end_ms(&self) -> Option<u64> {
        match self.repeat {
            Repeat::Once => Some(self.start_ms + self.duration_ms),
            Repeat::PingPong => None,
        }
    }

    pub fn is_finished(&self, now_ms: u64) -> bool {
        self.end_ms().is_some_and(|end| now_ms >= end)
    }

    pub fn sample(&self, now_ms: u64) -> f32 {
        let elapsed = now_ms.saturating_sub(self.start_ms);
        match self.repeat {
            Repeat::Once => {
                if self.duration_ms == 0 || elapsed >= self.duration_ms {
                    return self.to;
                }
                let t = elapsed as f32 / self.duration_ms as f32;
                lerp(self.from, self.to, self.easing.apply(t))
            }
            Repeat::PingPong => {
                let leg = elapsed / self.duration_ms;
                let t = (elapsed % self.duration_ms) as f32 / self.duration_ms as f32;
                let eased = self.easing.apply(t);
                if leg % 2 == 0 {
                    lerp(self.from, self.to, eased)
                } else {
                    lerp(self.to, self.from, eased)
                }
            }
        }
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamped linear map of `value` from `input` onto `output`.
#[inline]
pub fn interpolate(value: f32, input: [f32; 2], output: [f32; 2]) -> f32 {
    let span = input[1] - input[0];
    if span.abs() < f32::EPSILON {
        return output[0];
    }
    let t = ((value - input[0]) / span).clamp(0.0, 1.0);
    lerp(output[0], output[1], t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_curves_hit_their_endpoints() {
        for e in [Easing::Linear, Easing::In, Easing::Out, Easing::InOut] {
            assert!(e.apply(0.0).abs() < 1e-6, "{e:?} at 0");
            assert!((e.apply(1.0) - 1.0).abs() < 1e-6, "{e:?} at 1");
        }
        assert!(Easing::Out.apply(0.25) > 0.25);
        assert!(Easing::In.apply(0.25) < 0.25);
    }

    #[test]
    fn one_shot_tween_lands_on_target() {
        let tw = Tween::new(0.0, 1.0, 100, 1000, Easing::Linear);
        assert_eq!(tw.sample(0), 0.0);
        assert!((tw.sample(600) - 0.5).abs() < 1e-6);
        assert_eq!(tw.sample(1100), 1.0);
        assert!(tw.is_finished(1100));
        assert!(!tw.is_finished(1099));
    }

    #[test]
    fn zero_duration_jumps_immediately() {
        let tw = Tween::new(3.0, 7.0, 50, 0, Easing::InOut);
        assert_eq!(tw.sample(50), 7.0);
        assert!(tw.is_finished(50));
    }

    #[test]
    fn ping_pong_bounces_and_never_finishes() {
        let tw = Tween::ping_pong(0.3, 0.8, 0, 1500, Easing::Linear);
        assert!((tw.sample(0) - 0.3).abs() < 1e-6);
        assert!((tw.sample(1500) - 0.8).abs() < 1e-6);
        assert!((tw.sample(3000) - 0.3).abs() < 1e-6);
        assert!(!tw.is_finished(u64::MAX / 2));
        for t in (0..10_000).step_by(37) {
            let v = tw.sample(t);
            assert!((0.3 - 1e-6..=0.8 + 1e-6).contains(&v));
        }
    }

    #[test]
    fn interpolate_clamps() {
        assert_eq!(interpolate(0.5, [0.0, 1.0], [15.0, 30.0]), 22.5);
        assert_eq!(interpolate(2.0, [0.0, 1.0], [15.0, 30.0]), 30.0);
        assert_eq!(interpolate(-1.0, [0.0, 1.0], [0.2, 1.0]), 0.2);
    }
}
