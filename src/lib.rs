//! Hold-to-reveal interaction engine.
//!
//! A pointer pressed on the dot and held past a short confirmation delay
//! starts a hold session. The session charges for a fixed window, celebrates,
//! rotates to a new card and charges again for as long as the finger stays
//! down. The host feeds pointer events and frame deltas in, and reads animated
//! signals and `HoldEvent`s back out.

pub mod choreographer;
pub mod config;
pub mod constants;
pub mod deck;
pub mod feedback;
pub mod format;
pub mod gesture;
pub mod hold;
pub mod theme;
pub mod timer;
pub mod tween;

pub use choreographer::{Channel, Signals};
pub use config::{HoldConfig, Viewport};
pub use deck::{select_next, Card, CardSelection, Deck, DeckError, DeckStore, MemoryDeckStore};
pub use feedback::{Feedback, FeedbackError, Haptics, Silent, SoundCue, SoundPlayer};
pub use format::format_elapsed;
pub use gesture::{GestureRecognizer, GestureSignal, PointerEvent, TouchPoint};
pub use hold::{Frame, HoldEngine, HoldEvent, HoldPhase, HoldSession, HoldState, SessionId, SettleStep};
pub use theme::{Palette, PaletteRegistry, ThemeProvider};
