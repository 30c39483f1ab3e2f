//! Animated signal set and the choreographer that retargets it.
//!
//! Every visual property the renderer reads is a `Channel`. A channel has at
//! most one running tween; starting another on the same channel stops the
//! first, and the group the stopped tween belonged to never reports
//! completion. Groups are how the hold engine sequences its choreography:
//! it starts a group with a tag and gets the tag back once every tween in the
//! group has landed.

use crate::constants::*;
use crate::tween::{interpolate, Easing, Tween};
use fnv::FnvHashMap;
use glam::Vec2;
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    DotX,
    DotY,
    DotScale,
    CardOpacity,
    CardScale,
    CardTranslateX,
    CardTranslateY,
    CardRotation,
    GlowOpacity,
    GlowScale,
    FlashOpacity,
    UiOpacity,
    ChargeProgress,
    ColorMix,
    FingerX,
    FingerY,
}

impl Channel {
    pub const ALL: [Channel; 16] = [
        Channel::DotX,
        Channel::DotY,
        Channel::DotScale,
        Channel::CardOpacity,
        Channel::CardScale,
        Channel::CardTranslateX,
        Channel::CardTranslateY,
        Channel::CardRotation,
        Channel::GlowOpacity,
        Channel::GlowScale,
        Channel::FlashOpacity,
        Channel::UiOpacity,
        Channel::ChargeProgress,
        Channel::ColorMix,
        Channel::FingerX,
        Channel::FingerY,
    ];

    /// Value at mount, before anything animates.
    pub fn initial(self) -> f32 {
        match self {
            Channel::DotScale => DOT_SCALE_REST,
            Channel::CardScale => CARD_HIDDEN_SCALE,
            Channel::GlowOpacity => GLOW_OPACITY_MIN,
            Channel::GlowScale => GLOW_SCALE_MIN,
            Channel::UiOpacity => 1.0,
            _ => 0.0,
        }
    }
}

/// One leg of a group: drive `channel` to `to` over `duration_ms`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Target {
    pub channel: Channel,
    pub to: f32,
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Target {
    pub fn eased(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

#[inline]
pub fn to(channel: Channel, value: f32, duration_ms: u64) -> Target {
    Target {
        channel,
        to: value,
        duration_ms,
        easing: Easing::default(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(u64);

#[derive(Clone, Copy, Debug)]
struct Running {
    tween: Tween,
    group: Option<GroupId>,
}

#[derive(Clone, Debug)]
struct Group<T> {
    tag: T,
    remaining: usize,
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Signals {
    pub dot_position: Vec2,
    pub dot_scale: f32,
    pub card_opacity: f32,
    pub card_scale: f32,
    pub card_translate: Vec2,
    pub card_rotation_deg: f32,
    pub glow_opacity: f32,
    pub glow_scale: f32,
    pub flash_opacity: f32,
    pub ui_opacity: f32,
    pub charge_progress: f32,
    pub color_mix: f32,
    pub finger: Vec2,
    pub shadow_radius: f32,
    pub shadow_opacity: f32,
    pub elevation: f32,
}

pub fn shadow_radius(charge: f32) -> f32 {
    interpolate(charge, [0.0, 1.0], SHADOW_RADIUS_RANGE)
}

pub fn shadow_opacity(charge: f32) -> f32 {
    interpolate(charge, [0.0, 1.0], SHADOW_OPACITY_RANGE)
}

pub fn elevation(charge: f32) -> f32 {
    interpolate(charge, [0.0, 1.0], ELEVATION_RANGE)
}

#[derive(Debug)]
pub struct Choreographer<T> {
    now_ms: u64,
    values: FnvHashMap<Channel, f32>,
    running: FnvHashMap<Channel, Running>,
    groups: FnvHashMap<GroupId, Group<T>>,
    completed: VecDeque<(GroupId, T)>,
    next_group: u64,
}

impl<T: Clone> Default for Choreographer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Choreographer<T> {
    pub fn new() -> Self {
        let values = Channel::ALL.iter().map(|c| (*c, c.initial())).collect();
        Self {
            now_ms: 0,
            values,
            running: FnvHashMap::default(),
            groups: FnvHashMap::default(),
            completed: VecDeque::new(),
            next_group: 1,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn value(&self, channel: Channel) -> f32 {
        match self.running.get(&channel) {
            Some(r) => r.tween.sample(self.now_ms),
            None => self.values.get(&channel).copied().unwrap_or(channel.initial()),
        }
    }

    pub fn is_animating(&self, channel: Channel) -> bool {
        self.running.contains_key(&channel)
    }

    pub fn is_running(&self, group: GroupId) -> bool {
        self.groups.contains_key(&group)
    }

    /// Jump a channel to a value, stopping whatever was driving it.
    pub fn set(&mut self, channel: Channel, value: f32) {
        self.stop(channel);
        self.values.insert(channel, value);
    }

    /// Freeze a channel where it is. Its group, if any, will not complete.
    pub fn stop(&mut self, channel: Channel) {
        if let Some(r) = self.running.remove(&channel) {
            self.values.insert(channel, r.tween.sample(self.now_ms));
            if let Some(g) = r.group {
                if self.groups.remove(&g).is_some() {
                    log::debug!("[anim] group {:?} interrupted on {:?}", g, channel);
                }
            }
        }
    }

    /// Start every target together; `tag` comes back from `pop_completed`
    /// once all of them have landed.
    pub fn start(&mut self, tag: T, targets: &[Target]) -> GroupId {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        for t in targets {
            let from = self.value(t.channel);
            self.stop(t.channel);
            self.running.insert(
                t.channel,
                Running {
                    tween: Tween::new(from, t.to, self.now_ms, t.duration_ms, t.easing),
                    group: Some(id),
                },
            );
        }
        if targets.is_empty() {
            self.completed.push_back((id, tag));
        } else {
            self.groups.insert(
                id,
                Group {
                    tag,
                    remaining: targets.len(),
                },
            );
        }
        id
    }

    /// Ping-pong a channel between two values forever. Only `stop`,
    /// `set` or `teardown` end it.
    pub fn start_loop(&mut self, channel: Channel, from: f32, to: f32, leg_ms: u64) {
        self.stop(channel);
        self.running.insert(
            channel,
            Running {
                tween: Tween::ping_pong(from, to, self.now_ms, leg_ms, Easing::InOut),
                group: None,
            },
        );
    }

    /// Stop every channel still driven by `group`. Idempotent.
    pub fn cancel(&mut self, group: GroupId) {
        if self.groups.remove(&group).is_none() {
            return;
        }
        let channels: Vec<Channel> = self
            .running
            .iter()
            .filter(|(_, r)| r.group == Some(group))
            .map(|(c, _)| *c)
            .collect();
        for c in channels {
            self.stop(c);
        }
        log::debug!("[anim] group {:?} cancelled", group);
    }

    /// Earliest time something needs attention: a grouped tween landing or a
    /// completion waiting to be collected.
    pub fn next_completion(&self) -> Option<u64> {
        if !self.completed.is_empty() {
            return Some(self.now_ms);
        }
        self.running
            .values()
            .filter(|r| r.group.is_some())
            .filter_map(|r| r.tween.end_ms())
            .min()
    }

    pub fn advance_to(&mut self, t_ms: u64) {
        if t_ms > self.now_ms {
            self.now_ms = t_ms;
        }
        let now = self.now_ms;
        let mut landed: Vec<(Channel, Running)> = self
            .running
            .iter()
            .filter(|(_, r)| r.tween.is_finished(now))
            .map(|(c, r)| (*c, *r))
            .collect();
        landed.sort_by_key(|(_, r)| r.group);
        let mut finished_groups = Vec::new();
        for (channel, r) in landed {
            self.running.remove(&channel);
            self.values.insert(channel, r.tween.to);
            let Some(gid) = r.group else { continue };
            if let Some(g) = self.groups.get_mut(&gid) {
                g.remaining -= 1;
                if g.remaining == 0 {
                    finished_groups.push(gid);
                }
            }
        }
        finished_groups.sort();
        for gid in finished_groups {
            if let Some(g) = self.groups.remove(&gid) {
                self.completed.push_back((gid, g.tag));
            }
        }
    }

    pub fn pop_completed(&mut self) -> Option<(GroupId, T)> {
        self.completed.pop_front()
    }

    /// Freeze everything, loops included, and forget pending completions.
    pub fn teardown(&mut self) {
        let channels: Vec<Channel> = self.running.keys().copied().collect();
        for c in channels {
            self.stop(c);
        }
        self.groups.clear();
        self.completed.clear();
    }

    pub fn signals(&self) -> Signals {
        let charge = self.value(Channel::ChargeProgress);
        Signals {
            dot_position: Vec2::new(self.value(Channel::DotX), self.value(Channel::DotY)),
            dot_scale: self.value(Channel::DotScale),
            card_opacity: self.value(Channel::CardOpacity),
            card_scale: self.value(Channel::CardScale),
            card_translate: Vec2::new(
                self.value(Channel::CardTranslateX),
                self.value(Channel::CardTranslateY),
            ),
            card_rotation_deg: self.value(Channel::CardRotation),
            glow_opacity: self.value(Channel::GlowOpacity),
            glow_scale: self.value(Channel::GlowScale),
            flash_opacity: self.value(Channel::FlashOpacity),
            ui_opacity: self.value(Channel::UiOpacity),
            charge_progress: charge,
            color_mix: self.value(Channel::ColorMix),
            finger: Vec2::new(self.value(Channel::FingerX), self.value(Channel::FingerY)),
            shadow_radius: shadow_radius(charge),
            shadow_opacity: shadow_opacity(charge),
            elevation: elevation(charge),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_completes_when_its_longest_leg_lands() {
        let mut c: Choreographer<&str> = Choreographer::new();
        c.start(
            "drain",
            &[
                to(Channel::ChargeProgress, 0.0, 2000),
                to(Channel::DotScale, 0.25, 900),
            ],
        );
        c.advance_to(900);
        assert!(c.pop_completed().is_none());
        c.advance_to(2000);
        assert_eq!(c.pop_completed().map(|(_, t)| t), Some("drain"));
    }

    #[test]
    fn retargeting_a_channel_interrupts_its_group() {
        let mut c: Choreographer<&str> = Choreographer::new();
        let first = c.start("first", &[to(Channel::DotScale, 1.0, 1000)]);
        c.advance_to(500);
        let mid = c.value(Channel::DotScale);
        assert!(mid > DOT_SCALE_REST && mid < 1.0);
        c.start("second", &[to(Channel::DotScale, 0.0, 100)]);
        assert!(!c.is_running(first));
        c.advance_to(5000);
        let done: Vec<_> = std::iter::from_fn(|| c.pop_completed()).map(|(_, t)| t).collect();
        assert_eq!(done, vec!["second"]);
        assert_eq!(c.value(Channel::DotScale), 0.0);
    }

    #[test]
    fn new_tween_starts_from_the_current_value() {
        let mut c: Choreographer<()> = Choreographer::new();
        c.start((), &[to(Channel::ChargeProgress, 1.0, 1000).eased(Easing::Linear)]);
        c.advance_to(400);
        c.start((), &[to(Channel::ChargeProgress, 0.0, 1000).eased(Easing::Linear)]);
        assert!((c.value(Channel::ChargeProgress) - 0.4).abs() < 1e-5);
    }

    #[test]
    fn cancel_freezes_and_suppresses_completion() {
        let mut c: Choreographer<u8> = Choreographer::new();
        let g = c.start(1, &[to(Channel::FlashOpacity, 1.0, 200).eased(Easing::Linear)]);
        c.advance_to(100);
        c.cancel(g);
        c.cancel(g);
        c.advance_to(1000);
        assert!(c.pop_completed().is_none());
        assert!((c.value(Channel::FlashOpacity) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn empty_group_completes_immediately() {
        let mut c: Choreographer<u8> = Choreographer::new();
        c.start(9, &[]);
        assert_eq!(c.next_completion(), Some(0));
        assert_eq!(c.pop_completed().map(|(_, t)| t), Some(9));
    }

    #[test]
    fn loops_survive_until_teardown() {
        let mut c: Choreographer<u8> = Choreographer::new();
        c.start_loop(Channel::GlowScale, 1.0, 1.05, 2000);
        assert_eq!(c.next_completion(), None);
        c.advance_to(1_000_000);
        assert!(c.is_animating(Channel::GlowScale));
        c.teardown();
        assert!(!c.is_animating(Channel::GlowScale));
    }

    #[test]
    fn shadow_values_follow_charge() {
        assert_eq!(shadow_radius(0.0), 15.0);
        assert_eq!(shadow_radius(1.0), 30.0);
        assert!((shadow_opacity(0.5) - 0.6).abs() < 1e-6);
        assert_eq!(elevation(1.0), 30.0);
    }
}
