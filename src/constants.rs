/// Timing, geometry and visual tuning constants for the hold interaction.
///
/// These constants express intended behavior (durations, target values,
/// interpolation ranges) and keep magic numbers out of the engine code.
// Gesture
pub const DOT_RADIUS: f32 = 40.0; // hit-region radius, also half the dot size
pub const CONFIRM_DELAY_MS: u64 = 200; // press must survive this long to count as a hold

// Charge cycle
pub const CHARGE_DURATION_MS: u64 = 17_000; // one full charge window
pub const ELAPSED_TICK_MS: u64 = 1_000; // elapsed-seconds counter period

// Dot scale targets
pub const DOT_SCALE_REST: f32 = 0.25; // idle dot
pub const DOT_SCALE_HOLD: f32 = 0.5; // dot while holding
pub const DOT_SCALE_POP: f32 = 1.9; // peak of the success pulse

// Hold start
pub const HOLD_GROW_MS: u64 = 600; // dot grows and UI chrome fades over this
pub const HOLD_HAPTIC_PATTERN_MS: [u32; 3] = [50, 50, 50]; // triple pulse
pub const SUCCESS_HAPTIC_PATTERN_MS: [u32; 1] = [500]; // single strong pulse

// Success cycle
pub const DOT_POP_MS: u64 = 200; // dot pulse up, flash fades in alongside
pub const FLASH_IN_MS: u64 = 200;
pub const SETTLE_MS: u64 = 300; // dot back to hold scale, flash out
pub const SUCCESS_RETURN_MS: u64 = 1_000; // charge + colour drain after success

// Release
pub const DRAIN_CHARGE_MS: u64 = 2_000; // gentle charge/colour drain
pub const DRAIN_DOT_MS: u64 = 900;
pub const DRAIN_FLASH_MS: u64 = 300;
pub const DRAIN_UI_MS: u64 = 600; // UI chrome fades back in
pub const TAP_RESET_MS: u64 = 300; // dot scale reset when no hold was confirmed
pub const FINGER_RETURN_MS: u64 = 500; // parallax channels ease back to centre

// Card transitions
pub const CARD_ENTRY_MS: u64 = 500;
pub const CARD_TRANSITION_MS: u64 = 400;
pub const CARD_WIGGLE_FRACTION: f32 = 0.2; // share of the transition spent wiggling
pub const CARD_WIGGLE_AMOUNT: f32 = 28.0; // horizontal wiggle in points
pub const CARD_FLING_DISTANCE: f32 = 1.5; // fling distance as a multiple of screen width
pub const CARD_FLING_ROTATION_DEG: f32 = 20.0;
pub const CARD_HIDDEN_SCALE: f32 = 0.8;
pub const CARD_HIDE_MS: u64 = 300;
pub const CARD_SNAP_MS: u64 = 1; // translate/rotation snap back while hiding

// Full reset
pub const RESET_FLING_MS: u64 = 300;
pub const RESET_ROTATION_DEG: f32 = -10.0;
pub const RECENTER_MS: u64 = 500;

// Ambient pulse (never stops while mounted)
pub const GLOW_OPACITY_MIN: f32 = 0.3;
pub const GLOW_OPACITY_MAX: f32 = 0.8;
pub const GLOW_OPACITY_HALF_PERIOD_MS: u64 = 1_500;
pub const GLOW_SCALE_MIN: f32 = 1.0;
pub const GLOW_SCALE_MAX: f32 = 1.05;
pub const GLOW_SCALE_HALF_PERIOD_MS: u64 = 2_000;

// Charge-derived shadow ranges (pure interpolations of charge progress)
pub const SHADOW_RADIUS_RANGE: [f32; 2] = [15.0, 30.0];
pub const SHADOW_OPACITY_RANGE: [f32; 2] = [0.2, 1.0];
pub const ELEVATION_RANGE: [f32; 2] = [10.0, 30.0];

// Cards without tags are labelled with this
pub const DEFAULT_TAG: &str = "General";

// Fallback screen size until the host reports one
pub const DEFAULT_VIEWPORT: [f32; 2] = [390.0, 844.0];
