//! The hold state machine.
//!
//! `HoldEngine` owns the session, the timers and the animated signal set.
//! Pointer events come in through `handle_pointer`; time moves only through
//! `tick`. Every deferred callback (timer fire or animation completion)
//! carries the id of the session it was scheduled for and is dropped if that
//! session is no longer the live one.

use crate::choreographer::{to, Channel, Choreographer, GroupId, Signals};
use crate::config::{HoldConfig, Viewport};
use crate::constants::*;
use crate::deck::{select_next, Card, CardSelection, Deck};
use crate::feedback::{Feedback, SoundCue};
use crate::gesture::{GestureRecognizer, GestureSignal, PointerEvent, TouchPoint};
use crate::theme::ThemeProvider;
use crate::timer::{Scheduler, TimerId};
use crate::tween::Easing;
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Steps of the success sequence that follows a full charge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleStep {
    /// Dot pops, flash fades in.
    Pop,
    /// Dot settles back, flash fades out.
    Fade,
    /// Charge and colour return to zero.
    Return,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoldPhase {
    Charging,
    Settling(SettleStep),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HoldState {
    #[default]
    Idle,
    /// Finger is down, waiting out the confirmation delay.
    PendingConfirm,
    Holding(HoldPhase),
}

impl HoldState {
    pub fn is_holding(self) -> bool {
        matches!(self, HoldState::Holding(_))
    }
}

/// What the engine reports back to its host, in the order it happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HoldEvent {
    TouchClaimed,
    /// Finger lifted before the hold was confirmed.
    TapCancelled,
    HoldStarted(SessionId),
    ElapsedTick(u32),
    ChargeComplete { session: SessionId, cycle: u32 },
    ChargeRestarted { session: SessionId, cycle: u32 },
    /// New card content is on screen.
    CardShown { index: usize },
    CardCleared,
    Released(SessionId),
    Interrupted(SessionId),
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Timer {
    Confirm(SessionId),
    ElapsedTick(SessionId),
}

/// Completion tags for animation groups. Card tags carry the card epoch
/// they were started under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cue {
    HoldGrow,
    Charge(SessionId),
    Settle(SessionId, SettleStep),
    Drain(SessionId),
    TapReset,
    FingerReturn,
    Recenter,
    CardEntry(u64),
    CardWiggle(u64),
    CardFling(u64),
    CardSlideIn(u64),
    CardHide(u64),
    ResetFling(u64),
}

/// One confirmed hold, from the end of the confirmation delay until release,
/// interruption or reset. Owns every timer and animation it started.
#[derive(Debug)]
pub struct HoldSession {
    id: SessionId,
    started_ms: u64,
    cycles: u32,
    elapsed_timer: Option<TimerId>,
    grow: Option<GroupId>,
    charge: Option<GroupId>,
    settle: Option<GroupId>,
}

impl HoldSession {
    fn new(id: SessionId, started_ms: u64) -> Self {
        Self {
            id,
            started_ms,
            cycles: 0,
            elapsed_timer: None,
            grow: None,
            charge: None,
            settle: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn started_ms(&self) -> u64 {
        self.started_ms
    }

    /// Charge windows completed so far in this session.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    fn cancel_all(&mut self, timers: &mut Scheduler<Timer>, anim: &mut Choreographer<Cue>) {
        timers.cancel_slot(&mut self.elapsed_timer);
        for slot in [&mut self.grow, &mut self.charge, &mut self.settle] {
            if let Some(g) = slot.take() {
                anim.cancel(g);
            }
        }
    }
}

/// Renderer-facing snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub state: HoldState,
    pub signals: Signals,
    pub card_tint: Vec3,
    pub card: Option<Card>,
    pub elapsed_seconds: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EndKind {
    Release,
    Interrupt,
}

pub struct HoldEngine {
    config: HoldConfig,
    viewport: Viewport,
    deck: Option<Deck>,
    rng: StdRng,
    feedback: Feedback,
    gesture: GestureRecognizer,
    timers: Scheduler<Timer>,
    anim: Choreographer<Cue>,
    state: HoldState,
    session: Option<HoldSession>,
    confirm_timer: Option<TimerId>,
    pending_id: Option<SessionId>,
    next_session: u64,
    elapsed_seconds: u32,
    card: Option<CardSelection>,
    card_visible: bool,
    incoming: Option<CardSelection>,
    card_epoch: u64,
    previous_index: Option<usize>,
    carry_us: u64,
}

impl HoldEngine {
    pub fn new(
        config: HoldConfig,
        viewport: Viewport,
        deck: Option<Deck>,
        feedback: Feedback,
        seed: u64,
    ) -> Self {
        let mut anim = Choreographer::new();
        let home = viewport.dot_home(config.hit_radius);
        anim.set(Channel::DotX, home.x);
        anim.set(Channel::DotY, home.y);
        anim.set(Channel::DotScale, config.rest_dot_scale);
        anim.start_loop(
            Channel::GlowOpacity,
            GLOW_OPACITY_MIN,
            GLOW_OPACITY_MAX,
            GLOW_OPACITY_HALF_PERIOD_MS,
        );
        anim.start_loop(
            Channel::GlowScale,
            GLOW_SCALE_MIN,
            GLOW_SCALE_MAX,
            GLOW_SCALE_HALF_PERIOD_MS,
        );
        log::info!(
            "[hold] engine ready: viewport={}x{} cards={}",
            viewport.width,
            viewport.height,
            deck.as_ref().map_or(0, |d| d.cards.len())
        );
        Self {
            gesture: GestureRecognizer::new(config.hit_radius),
            config,
            viewport,
            deck,
            rng: StdRng::seed_from_u64(seed),
            feedback,
            timers: Scheduler::new(),
            anim,
            state: HoldState::Idle,
            session: None,
            confirm_timer: None,
            pending_id: None,
            next_session: 1,
            elapsed_seconds: 0,
            card: None,
            card_visible: false,
            incoming: None,
            card_epoch: 0,
            previous_index: None,
            carry_us: 0,
        }
    }

    // ---------------- Accessors ----------------

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    pub fn state(&self) -> HoldState {
        self.state
    }

    pub fn is_holding(&self) -> bool {
        self.state.is_holding()
    }

    pub fn session(&self) -> Option<&HoldSession> {
        self.session.as_ref()
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn charge_progress(&self) -> f32 {
        self.anim.value(Channel::ChargeProgress)
    }

    pub fn value(&self, channel: Channel) -> f32 {
        self.anim.value(channel)
    }

    pub fn dot_position(&self) -> Vec2 {
        Vec2::new(self.anim.value(Channel::DotX), self.anim.value(Channel::DotY))
    }

    pub fn touch(&self) -> Option<TouchPoint> {
        self.gesture.touch()
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.card.as_ref().map(|c| &c.card)
    }

    pub fn current_card_index(&self) -> Option<usize> {
        self.card.as_ref().map(|c| c.index)
    }

    pub fn card_visible(&self) -> bool {
        self.card_visible
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn signals(&self) -> Signals {
        self.anim.signals()
    }

    pub fn frame(&self, theme: &dyn ThemeProvider) -> Frame {
        let signals = self.anim.signals();
        Frame {
            state: self.state,
            card_tint: theme.palette().card_tint(signals.color_mix),
            signals,
            card: self.current_card().cloned(),
            elapsed_seconds: self.elapsed_seconds,
        }
    }

    // ---------------- Host inputs ----------------

    pub fn set_deck(&mut self, deck: Option<Deck>) {
        self.deck = deck;
        self.previous_index = None;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Feed one pointer event. Returns whether the engine claimed it.
    pub fn handle_pointer(&mut self, event: PointerEvent, out: &mut Vec<HoldEvent>) -> bool {
        let dot = self.dot_position();
        let Some(signal) = self.gesture.handle(event, dot) else {
            return false;
        };
        match signal {
            GestureSignal::Began(touch) => self.on_touch_down(touch, out),
            GestureSignal::Moved { page, dot } => {
                self.anim.set(Channel::DotX, dot.x);
                self.anim.set(Channel::DotY, dot.y);
                self.track_finger(page);
            }
            GestureSignal::Released => self.release(out),
            GestureSignal::Terminated => self.interrupt(out),
        }
        true
    }

    /// Advance the virtual clock, firing timers and animation completions in
    /// time order.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<HoldEvent>) {
        let total_us = self.carry_us + dt.as_micros() as u64;
        self.carry_us = total_us % 1000;
        let target = self.now_ms() + total_us / 1000;
        loop {
            self.dispatch_due(out);
            let next = [self.timers.next_due(), self.anim.next_completion()]
                .into_iter()
                .flatten()
                .min();
            match next {
                Some(t) if t <= target => {
                    self.timers.advance_to(t);
                    self.anim.advance_to(t);
                }
                _ => break,
            }
        }
        self.timers.advance_to(target);
        self.anim.advance_to(target);
        self.dispatch_due(out);
    }

    fn dispatch_due(&mut self, out: &mut Vec<HoldEvent>) {
        loop {
            if let Some((_, timer)) = self.timers.pop_due() {
                self.on_timer(timer, out);
                continue;
            }
            if let Some((_, cue)) = self.anim.pop_completed() {
                self.on_animation_done(cue, out);
                continue;
            }
            break;
        }
    }

    // ---------------- Transitions ----------------

    fn on_touch_down(&mut self, touch: TouchPoint, out: &mut Vec<HoldEvent>) {
        if self.state != HoldState::Idle {
            log::debug!("[hold] touch down while {:?}, ignored", self.state);
            return;
        }
        self.track_finger(touch.position);
        self.timers.cancel_slot(&mut self.confirm_timer);
        let id = self.allocate_session_id();
        self.pending_id = Some(id);
        self.confirm_timer = Some(
            self.timers
                .schedule_once(self.config.confirm_delay_ms, Timer::Confirm(id)),
        );
        self.state = HoldState::PendingConfirm;
        out.push(HoldEvent::TouchClaimed);
    }

    /// Begin a hold right away. Does nothing if one is already active.
    pub fn start_hold(&mut self, out: &mut Vec<HoldEvent>) {
        if self.state.is_holding() {
            log::debug!("[hold] start requested while holding, ignored");
            return;
        }
        let id = match self.pending_id.take() {
            Some(id) => id,
            None => self.allocate_session_id(),
        };
        self.begin_session(id, out);
    }

    fn begin_session(&mut self, id: SessionId, out: &mut Vec<HoldEvent>) {
        self.timers.cancel_slot(&mut self.confirm_timer);
        self.pending_id = None;
        self.state = HoldState::Holding(HoldPhase::Charging);
        log::info!("[hold] session {} started", id);

        self.feedback.pulse(&HOLD_HAPTIC_PATTERN_MS);
        if !self.card_visible || self.card.is_none() {
            self.show_first_card(out);
        }
        self.feedback.play(SoundCue::Hold);

        self.anim.set(Channel::ColorMix, 0.0);
        self.anim.set(Channel::ChargeProgress, 0.0);
        self.anim.set(Channel::FlashOpacity, 0.0);

        let mut session = HoldSession::new(id, self.now_ms());
        session.grow = Some(self.anim.start(
            Cue::HoldGrow,
            &[
                to(Channel::DotScale, self.config.hold_dot_scale, self.config.hold_grow_ms),
                to(Channel::UiOpacity, 0.0, self.config.hold_grow_ms),
            ],
        ));
        session.elapsed_timer = Some(
            self.timers
                .schedule_every(self.config.elapsed_tick_ms, Timer::ElapsedTick(id)),
        );
        self.session = Some(session);
        out.push(HoldEvent::HoldStarted(id));
        self.start_charge(id);
    }

    fn start_charge(&mut self, id: SessionId) {
        let duration = self.config.charge_duration_ms;
        let group = self.anim.start(
            Cue::Charge(id),
            &[
                to(Channel::ChargeProgress, 1.0, duration).eased(Easing::Linear),
                to(Channel::ColorMix, 1.0, duration).eased(Easing::Linear),
            ],
        );
        if let Some(s) = self.session.as_mut() {
            s.charge = Some(group);
        }
        self.state = HoldState::Holding(HoldPhase::Charging);
        log::debug!("[hold] session {} charging for {}ms", id, duration);
    }

    fn on_charge_complete(&mut self, id: SessionId, out: &mut Vec<HoldEvent>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.charge = None;
        session.cycles += 1;
        let cycle = session.cycles;
        log::info!("[hold] session {} charge complete (cycle {})", id, cycle);

        self.feedback.pulse(&SUCCESS_HAPTIC_PATTERN_MS);
        self.feedback.replay(SoundCue::Success);
        out.push(HoldEvent::ChargeComplete { session: id, cycle });

        self.settle(id, SettleStep::Pop);
    }

    fn settle(&mut self, id: SessionId, step: SettleStep) {
        let targets = match step {
            SettleStep::Pop => [
                to(Channel::DotScale, self.config.pop_dot_scale, DOT_POP_MS),
                to(Channel::FlashOpacity, 1.0, FLASH_IN_MS),
            ],
            SettleStep::Fade => [
                to(Channel::DotScale, self.config.hold_dot_scale, SETTLE_MS),
                to(Channel::FlashOpacity, 0.0, SETTLE_MS),
            ],
            SettleStep::Return => [
                to(Channel::ChargeProgress, 0.0, self.config.success_return_ms),
                to(Channel::ColorMix, 0.0, self.config.success_return_ms),
            ],
        };
        let group = self.anim.start(Cue::Settle(id, step), &targets);
        if let Some(s) = self.session.as_mut() {
            s.settle = Some(group);
        }
        self.state = HoldState::Holding(HoldPhase::Settling(step));
    }

    /// Success sequence finished: rotate the card and, if the finger is still
    /// down on this same session, charge again.
    fn restart_cycle(&mut self, id: SessionId, out: &mut Vec<HoldEvent>) {
        if let Some(s) = self.session.as_mut() {
            s.settle = None;
        }
        self.swap_card(out);
        if !self.is_live(id) {
            log::debug!("[hold] session {} ended during settle, not restarting", id);
            return;
        }
        let cycle = self.session.as_ref().map_or(0, |s| s.cycles);
        self.start_charge(id);
        out.push(HoldEvent::ChargeRestarted { session: id, cycle });
    }

    pub fn release(&mut self, out: &mut Vec<HoldEvent>) {
        self.end_hold(EndKind::Release, out);
    }

    pub fn interrupt(&mut self, out: &mut Vec<HoldEvent>) {
        self.end_hold(EndKind::Interrupt, out);
    }

    fn end_hold(&mut self, kind: EndKind, out: &mut Vec<HoldEvent>) {
        match self.state {
            HoldState::Idle => {
                log::debug!("[hold] {:?} with nothing active, ignored", kind);
            }
            HoldState::PendingConfirm => {
                self.timers.cancel_slot(&mut self.confirm_timer);
                self.pending_id = None;
                self.state = HoldState::Idle;
                self.anim.start(
                    Cue::TapReset,
                    &[to(Channel::DotScale, self.config.rest_dot_scale, TAP_RESET_MS)],
                );
                log::debug!("[hold] tap released before confirmation");
                out.push(HoldEvent::TapCancelled);
                // the dot-scale reset above stops a running drain, so its hide never fires
                if self.card_visible && self.session.is_none() {
                    self.hide_card();
                }
                self.return_finger();
            }
            HoldState::Holding(_) => {
                let Some(mut session) = self.session.take() else {
                    self.state = HoldState::Idle;
                    return;
                };
                session.cancel_all(&mut self.timers, &mut self.anim);
                self.state = HoldState::Idle;
                let id = session.id;
                log::info!(
                    "[hold] session {} {} after {} cycle(s), {}s elapsed",
                    id,
                    match kind {
                        EndKind::Release => "released",
                        EndKind::Interrupt => "interrupted",
                    },
                    session.cycles,
                    self.elapsed_seconds
                );

                self.feedback.pause(SoundCue::Hold);
                let drain = self.config.drain_charge_ms;
                self.anim.start(
                    Cue::Drain(id),
                    &[
                        to(Channel::ColorMix, 0.0, drain),
                        to(Channel::ChargeProgress, 0.0, drain),
                        to(Channel::DotScale, self.config.rest_dot_scale, DRAIN_DOT_MS),
                        to(Channel::FlashOpacity, 0.0, DRAIN_FLASH_MS),
                        to(Channel::UiOpacity, 1.0, DRAIN_UI_MS),
                    ],
                );
                out.push(match kind {
                    EndKind::Release => HoldEvent::Released(id),
                    EndKind::Interrupt => HoldEvent::Interrupted(id),
                });
                self.return_finger();
            }
        }
    }

    /// Explicit "start over": stop everything, fling the card away, zero the
    /// counter and bring the dot home alongside the fling.
    pub fn reset(&mut self, out: &mut Vec<HoldEvent>) {
        log::info!("[hold] full reset");
        self.timers.cancel_slot(&mut self.confirm_timer);
        self.pending_id = None;
        if let Some(mut session) = self.session.take() {
            session.cancel_all(&mut self.timers, &mut self.anim);
        }
        self.state = HoldState::Idle;

        self.feedback.pause(SoundCue::Hold);
        self.feedback.replay(SoundCue::Reset);

        self.anim.set(Channel::ColorMix, 0.0);
        self.anim.set(Channel::ChargeProgress, 0.0);
        self.anim.set(Channel::FlashOpacity, 0.0);
        self.anim.set(Channel::DotScale, self.config.rest_dot_scale);

        self.card_epoch += 1;
        self.incoming = None;
        self.card_visible = false;
        self.anim.start(
            Cue::ResetFling(self.card_epoch),
            &[
                to(Channel::UiOpacity, 1.0, RESET_FLING_MS),
                to(Channel::CardOpacity, 0.0, RESET_FLING_MS),
                to(Channel::CardScale, CARD_HIDDEN_SCALE, RESET_FLING_MS),
                to(Channel::CardTranslateX, -self.viewport.width, RESET_FLING_MS),
                to(Channel::CardRotation, RESET_ROTATION_DEG, RESET_FLING_MS),
            ],
        );
        let home = self.viewport.dot_home(self.config.hit_radius);
        self.anim.start(
            Cue::Recenter,
            &[
                to(Channel::DotX, home.x, RECENTER_MS),
                to(Channel::DotY, home.y, RECENTER_MS),
            ],
        );
        self.previous_index = None;
        self.elapsed_seconds = 0;
        out.push(HoldEvent::Reset);
    }

    /// Rotate to another card with the full swap transition.
    pub fn next_card(&mut self, out: &mut Vec<HoldEvent>) {
        self.swap_card(out);
    }

    /// Stop everything, the ambient pulse included. The engine is inert
    /// afterwards until the host feeds it new input.
    pub fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.cancel_all(&mut self.timers, &mut self.anim);
            self.feedback.pause(SoundCue::Hold);
        }
        self.timers.clear();
        self.anim.teardown();
        self.confirm_timer = None;
        self.pending_id = None;
        self.incoming = None;
        self.state = HoldState::Idle;
        log::info!("[hold] torn down");
    }

    // ---------------- Callbacks ----------------

    fn is_live(&self, id: SessionId) -> bool {
        self.state.is_holding() && self.session.as_ref().is_some_and(|s| s.id == id)
    }

    fn on_timer(&mut self, timer: Timer, out: &mut Vec<HoldEvent>) {
        match timer {
            Timer::Confirm(id) => {
                if self.state == HoldState::PendingConfirm && self.pending_id == Some(id) {
                    self.confirm_timer = None;
                    self.begin_session(id, out);
                } else {
                    log::debug!("[hold] stale confirm for {}", id);
                }
            }
            Timer::ElapsedTick(id) => {
                if self.is_live(id) {
                    self.elapsed_seconds += 1;
                    out.push(HoldEvent::ElapsedTick(self.elapsed_seconds));
                } else {
                    log::debug!("[hold] stale tick for {}", id);
                }
            }
        }
    }

    fn on_animation_done(&mut self, cue: Cue, out: &mut Vec<HoldEvent>) {
        match cue {
            Cue::Charge(id) => {
                if self.is_live(id) && self.state == HoldState::Holding(HoldPhase::Charging) {
                    self.on_charge_complete(id, out);
                }
            }
            Cue::Settle(id, step) => {
                if !self.is_live(id) || self.state != HoldState::Holding(HoldPhase::Settling(step)) {
                    log::debug!("[hold] stale settle {:?} for {}", step, id);
                    return;
                }
                match step {
                    SettleStep::Pop => self.settle(id, SettleStep::Fade),
                    SettleStep::Fade => self.settle(id, SettleStep::Return),
                    SettleStep::Return => self.restart_cycle(id, out),
                }
            }
            Cue::Drain(id) => {
                log::debug!("[hold] drain for {} finished", id);
                if !self.state.is_holding() && self.card_visible {
                    self.hide_card();
                }
            }
            Cue::CardWiggle(epoch) if epoch == self.card_epoch => self.fling_card(epoch),
            Cue::CardFling(epoch) if epoch == self.card_epoch => self.slide_in_card(epoch, out),
            Cue::CardHide(epoch) if epoch == self.card_epoch => {
                self.card = None;
                out.push(HoldEvent::CardCleared);
            }
            Cue::ResetFling(epoch) => {
                self.anim.set(Channel::CardTranslateX, 0.0);
                self.anim.set(Channel::CardRotation, 0.0);
                if epoch == self.card_epoch && self.card.take().is_some() {
                    out.push(HoldEvent::CardCleared);
                }
            }
            Cue::HoldGrow
            | Cue::TapReset
            | Cue::FingerReturn
            | Cue::Recenter
            | Cue::CardEntry(_)
            | Cue::CardSlideIn(_)
            | Cue::CardWiggle(_)
            | Cue::CardFling(_)
            | Cue::CardHide(_) => {}
        }
    }

    // ---------------- Cards ----------------

    fn show_first_card(&mut self, out: &mut Vec<HoldEvent>) {
        let Some(selection) = select_next(self.deck.as_ref(), self.previous_index, &mut self.rng)
        else {
            log::debug!("[card] deck is empty, holding without a card");
            self.clear_card(out);
            return;
        };
        self.card_epoch += 1;
        self.incoming = None;
        let index = selection.index;
        self.previous_index = Some(index);
        self.card = Some(selection);
        self.card_visible = true;

        self.anim.set(Channel::CardOpacity, 0.0);
        self.anim.set(Channel::CardScale, CARD_HIDDEN_SCALE);
        self.anim.set(Channel::CardTranslateX, 0.0);
        self.anim.set(Channel::CardRotation, 0.0);
        let entry = self.config.card_entry_ms;
        self.anim.start(
            Cue::CardEntry(self.card_epoch),
            &[
                to(Channel::CardOpacity, 1.0, entry).eased(Easing::Out),
                to(Channel::CardScale, 1.0, entry).eased(Easing::Out),
            ],
        );
        log::debug!("[card] entering card {}", index);
        out.push(HoldEvent::CardShown { index });
    }

    fn swap_card(&mut self, out: &mut Vec<HoldEvent>) {
        if !self.card_visible || self.card.is_none() {
            self.show_first_card(out);
            return;
        }
        let Some(selection) = select_next(self.deck.as_ref(), self.previous_index, &mut self.rng)
        else {
            self.clear_card(out);
            return;
        };
        self.card_epoch += 1;
        log::debug!("[card] swapping to card {}", selection.index);
        self.incoming = Some(selection);
        let wiggle_ms = (self.config.card_transition_ms as f32 * CARD_WIGGLE_FRACTION) as u64;
        self.anim.start(
            Cue::CardWiggle(self.card_epoch),
            &[to(Channel::CardTranslateX, CARD_WIGGLE_AMOUNT, wiggle_ms)],
        );
    }

    fn fling_card(&mut self, epoch: u64) {
        let fling_ms = (self.config.card_transition_ms as f32 * (1.0 - CARD_WIGGLE_FRACTION)) as u64;
        self.anim.start(
            Cue::CardFling(epoch),
            &[
                to(
                    Channel::CardTranslateX,
                    self.viewport.width * CARD_FLING_DISTANCE,
                    fling_ms,
                )
                .eased(Easing::In),
                to(Channel::CardRotation, CARD_FLING_ROTATION_DEG, fling_ms).eased(Easing::In),
                to(Channel::CardOpacity, 0.0, fling_ms).eased(Easing::Out),
                to(Channel::CardScale, CARD_HIDDEN_SCALE, fling_ms).eased(Easing::Out),
            ],
        );
    }

    /// The outgoing card is off-screen: swap content, park the card on the
    /// opposite side and bring it in.
    fn slide_in_card(&mut self, epoch: u64, out: &mut Vec<HoldEvent>) {
        self.anim
            .set(Channel::CardTranslateX, -self.viewport.width * CARD_FLING_DISTANCE);
        self.anim.set(Channel::CardRotation, -CARD_FLING_ROTATION_DEG);
        self.anim.set(Channel::CardOpacity, 0.0);
        self.anim.set(Channel::CardScale, CARD_HIDDEN_SCALE);

        if let Some(selection) = self.incoming.take() {
            let index = selection.index;
            self.previous_index = Some(index);
            self.card = Some(selection);
            out.push(HoldEvent::CardShown { index });
        }

        let ms = self.config.card_transition_ms;
        self.anim.start(
            Cue::CardSlideIn(epoch),
            &[
                to(Channel::CardTranslateX, 0.0, ms).eased(Easing::Out),
                to(Channel::CardRotation, 0.0, ms).eased(Easing::Out),
                to(Channel::CardOpacity, 1.0, ms).eased(Easing::Out),
                to(Channel::CardScale, 1.0, ms).eased(Easing::Out),
            ],
        );
    }

    fn hide_card(&mut self) {
        self.card_epoch += 1;
        self.incoming = None;
        self.card_visible = false;
        self.anim.start(
            Cue::CardHide(self.card_epoch),
            &[
                to(Channel::CardOpacity, 0.0, CARD_HIDE_MS),
                to(Channel::CardScale, CARD_HIDDEN_SCALE, CARD_HIDE_MS),
                to(Channel::CardTranslateX, 0.0, CARD_SNAP_MS),
                to(Channel::CardRotation, 0.0, CARD_SNAP_MS),
            ],
        );
        log::debug!("[card] hiding");
    }

    fn clear_card(&mut self, out: &mut Vec<HoldEvent>) {
        self.card_epoch += 1;
        self.incoming = None;
        self.card_visible = false;
        self.anim.set(Channel::CardOpacity, 0.0);
        if self.card.take().is_some() {
            out.push(HoldEvent::CardCleared);
        }
    }

    // ---------------- Helpers ----------------

    fn allocate_session_id(&mut self) -> SessionId {
        let id = SessionId(self.next_session);
        self.next_session += 1;
        id
    }

    fn track_finger(&mut self, page: Vec2) {
        if let Some(n) = self.viewport.normalize(page) {
            self.anim.set(Channel::FingerX, n.x);
            self.anim.set(Channel::FingerY, n.y);
        }
    }

    fn return_finger(&mut self) {
        self.anim.start(
            Cue::FingerReturn,
            &[
                to(Channel::FingerX, 0.0, FINGER_RETURN_MS).eased(Easing::Out),
                to(Channel::FingerY, 0.0, FINGER_RETURN_MS).eased(Easing::Out),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(cards: usize) -> HoldEngine {
        let deck = Deck::new(
            "t",
            "Test",
            (0..cards).map(|i| Card::new(format!("card {i}"))).collect(),
        );
        HoldEngine::new(
            HoldConfig::default(),
            Viewport::default(),
            Some(deck),
            Feedback::silent(),
            7,
        )
    }

    fn centre(e: &HoldEngine) -> Vec2 {
        e.dot_position() + Vec2::splat(DOT_RADIUS)
    }

    #[test]
    fn fractional_frames_accumulate() {
        let mut e = engine(3);
        let mut out = Vec::new();
        let at = centre(&e);
        e.handle_pointer(PointerEvent::Down(at), &mut out);
        for _ in 0..12 {
            e.tick(Duration::from_micros(16_667), &mut out);
        }
        assert_eq!(e.now_ms(), 200);
        assert!(e.is_holding());
    }

    #[test]
    fn start_hold_is_a_no_op_while_holding() {
        let mut e = engine(3);
        let mut out = Vec::new();
        e.start_hold(&mut out);
        e.start_hold(&mut out);
        let started = out
            .iter()
            .filter(|ev| matches!(ev, HoldEvent::HoldStarted(_)))
            .count();
        assert_eq!(started, 1);
        assert_eq!(e.state(), HoldState::Holding(HoldPhase::Charging));
    }

    #[test]
    fn stale_confirm_is_ignored_after_a_quick_tap() {
        let mut e = engine(3);
        let mut out = Vec::new();
        let at = centre(&e);
        e.handle_pointer(PointerEvent::Down(at), &mut out);
        e.tick(Duration::from_millis(150), &mut out);
        e.handle_pointer(PointerEvent::Up, &mut out);
        e.tick(Duration::from_millis(1000), &mut out);
        assert_eq!(e.state(), HoldState::Idle);
        assert!(e.session().is_none());
        assert_eq!(out, vec![HoldEvent::TouchClaimed, HoldEvent::TapCancelled]);
    }

    #[test]
    fn reset_clears_card_and_counter() {
        let mut e = engine(3);
        let mut out = Vec::new();
        e.start_hold(&mut out);
        e.tick(Duration::from_millis(3_500), &mut out);
        assert_eq!(e.elapsed_seconds(), 3);
        assert!(e.current_card().is_some());

        e.reset(&mut out);
        assert_eq!(e.elapsed_seconds(), 0);
        assert_eq!(e.charge_progress(), 0.0);
        assert!(!e.card_visible());
        e.tick(Duration::from_millis(RESET_FLING_MS), &mut out);
        assert!(e.current_card().is_none());
        assert_eq!(out.last(), Some(&HoldEvent::CardCleared));
    }

    #[test]
    fn frame_tint_follows_colour_mix() {
        let mut e = engine(2);
        let mut out = Vec::new();
        let palette = crate::theme::SUNRISE_SERENITY;
        assert_eq!(e.frame(&palette).card_tint, palette.rest_tint());
        e.start_hold(&mut out);
        e.tick(Duration::from_millis(CHARGE_DURATION_MS), &mut out);
        let f = e.frame(&palette);
        assert!((f.card_tint - palette.charged_tint()).length() < 1e-5);
        assert!(f.card.is_some());
    }

    #[test]
    fn teardown_stops_the_ambient_pulse() {
        let mut e = engine(1);
        let mut out = Vec::new();
        e.start_hold(&mut out);
        e.teardown();
        let glow = e.value(Channel::GlowOpacity);
        e.tick(Duration::from_millis(5_000), &mut out);
        assert_eq!(e.value(Channel::GlowOpacity), glow);
        assert!(!e.is_holding());
        assert!(out.iter().all(|ev| !matches!(ev, HoldEvent::ElapsedTick(_))));
    }
}
