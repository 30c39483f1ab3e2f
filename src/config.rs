//! Runtime tunables for the hold engine.
//!
//! `HoldConfig::default()` mirrors `constants.rs`. Hosts override individual
//! fields, e.g. a demo that wants a quicker charge.

use crate::constants::*;
use glam::Vec2;

/// Screen size in points, as reported by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT[0],
            height: DEFAULT_VIEWPORT[1],
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Top-left position that centres a dot of the given radius.
    pub fn dot_home(&self, radius: f32) -> Vec2 {
        Vec2::new(self.width / 2.0 - radius, self.height / 2.0 - radius)
    }

    /// Finger position relative to the screen centre, in units of screen size.
    /// Returns `None` until the host has reported a real size.
    pub fn normalize(&self, page: Vec2) -> Option<Vec2> {
        if self.is_empty() {
            return None;
        }
        Some(Vec2::new(
            (page.x - self.width / 2.0) / self.width,
            (page.y - self.height / 2.0) / self.height,
        ))
    }
}

#[derive(Clone, Debug)]
pub struct HoldConfig {
    pub hit_radius: f32,
    pub confirm_delay_ms: u64,
    pub charge_duration_ms: u64,
    pub elapsed_tick_ms: u64,
    pub rest_dot_scale: f32,
    pub hold_dot_scale: f32,
    pub pop_dot_scale: f32,
    pub hold_grow_ms: u64,
    pub success_return_ms: u64,
    pub drain_charge_ms: u64,
    pub card_entry_ms: u64,
    pub card_transition_ms: u64,
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            hit_radius: DOT_RADIUS,
            confirm_delay_ms: CONFIRM_DELAY_MS,
            charge_duration_ms: CHARGE_DURATION_MS,
            elapsed_tick_ms: ELAPSED_TICK_MS,
            rest_dot_scale: DOT_SCALE_REST,
            hold_dot_scale: DOT_SCALE_HOLD,
            pop_dot_scale: DOT_SCALE_POP,
            hold_grow_ms: HOLD_GROW_MS,
            success_return_ms: SUCCESS_RETURN_MS,
            drain_charge_ms: DRAIN_CHARGE_MS,
            card_entry_ms: CARD_ENTRY_MS,
            card_transition_ms: CARD_TRANSITION_MS,
        }
    }
}

impl HoldConfig {
    pub fn with_charge_duration_ms(mut self, ms: u64) -> Self {
        self.charge_duration_ms = ms.max(1);
        self
    }

    pub fn with_confirm_delay_ms(mut self, ms: u64) -> Self {
        self.confirm_delay_ms = ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_home_centres_the_dot() {
        let vp = Viewport::new(400.0, 800.0);
        let home = vp.dot_home(40.0);
        assert_eq!(home, Vec2::new(160.0, 360.0));
    }

    #[test]
    fn normalize_is_none_for_empty_viewport() {
        let vp = Viewport::new(0.0, 0.0);
        assert!(vp.normalize(Vec2::new(10.0, 10.0)).is_none());
        let vp = Viewport::new(200.0, 100.0);
        let n = vp.normalize(Vec2::new(150.0, 25.0)).unwrap();
        assert!((n.x - 0.25).abs() < 1e-6);
        assert!((n.y + 0.25).abs() < 1e-6);
    }
}
