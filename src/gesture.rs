//! Pointer stream to gesture signals.
//!
//! A gesture is claimed only when it starts inside the circular hit-region
//! around the dot. Once claimed, every move belongs to it until the pointer
//! lifts or the platform cancels it.

use glam::Vec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up,
    Cancel,
}

/// Where the finger is, and how far it was from the dot centre at touch-down.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TouchPoint {
    pub position: Vec2,
    pub offset: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureSignal {
    Began(TouchPoint),
    /// `dot` is the top-left position that keeps the dot anchored under the finger.
    Moved { page: Vec2, dot: Vec2 },
    Released,
    Terminated,
}

/// `dot` is the top-left corner of a dot whose radius equals the hit radius.
#[inline]
pub fn hit_test(page: Vec2, dot: Vec2, radius: f32) -> bool {
    let center = dot + Vec2::splat(radius);
    page.distance(center) <= radius
}

#[derive(Clone, Debug)]
pub struct GestureRecognizer {
    radius: f32,
    active: Option<TouchPoint>,
}

impl GestureRecognizer {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            active: None,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn is_tracking(&self) -> bool {
        self.active.is_some()
    }

    pub fn touch(&self) -> Option<TouchPoint> {
        self.active
    }

    /// Feed one pointer event. `None` means the event is not ours and
    /// should pass through to whatever sits underneath.
    pub fn handle(&mut self, event: PointerEvent, dot: Vec2) -> Option<GestureSignal> {
        match event {
            PointerEvent::Down(page) => {
                if self.active.is_some() {
                    log::debug!("[gesture] ignoring extra pointer at {:?}", page);
                    return None;
                }
                if !hit_test(page, dot, self.radius) {
                    return None;
                }
                let touch = TouchPoint {
                    position: page,
                    offset: page - dot - Vec2::splat(self.radius),
                };
                self.active = Some(touch);
                log::debug!("[gesture] claimed touch at ({:.1},{:.1})", page.x, page.y);
                Some(GestureSignal::Began(touch))
            }
            PointerEvent::Move(page) => {
                let touch = self.active.as_mut()?;
                touch.position = page;
                let dot = page - touch.offset - Vec2::splat(self.radius);
                Some(GestureSignal::Moved { page, dot })
            }
            PointerEvent::Up => self.active.take().map(|_| GestureSignal::Released),
            PointerEvent::Cancel => self.active.take().map(|_| GestureSignal::Terminated),
        }
    }
}
