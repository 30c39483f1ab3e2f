use anyhow::{anyhow, bail, Context};
use glam::Vec2;
use instant::Instant;
use std::thread;
use std::time::Duration;

use lucid::constants::DOT_RADIUS;
use lucid::{
    format_elapsed, Card, Deck, Feedback, FeedbackError, Haptics, HoldConfig, HoldEngine,
    HoldEvent, PaletteRegistry, PointerEvent, SoundCue, SoundPlayer, Viewport,
};

const FRAME: Duration = Duration::from_micros(16_667);

struct SimArgs {
    seed: u64,
    realtime: bool,
}

fn parse_args() -> anyhow::Result<SimArgs> {
    let mut out = SimArgs {
        seed: 42,
        realtime: false,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let v = args.next().ok_or_else(|| anyhow!("--seed needs a value"))?;
                out.seed = v.parse().with_context(|| format!("invalid seed {v:?}"))?;
            }
            "--realtime" => out.realtime = true,
            other => bail!("unknown argument {other:?} (expected --seed N or --realtime)"),
        }
    }
    Ok(out)
}

struct LogSound;

impl SoundPlayer for LogSound {
    fn play(&mut self, cue: SoundCue) -> Result<(), FeedbackError> {
        log::info!("[sim] sound: play {:?}", cue);
        Ok(())
    }
    fn pause(&mut self, cue: SoundCue) -> Result<(), FeedbackError> {
        log::info!("[sim] sound: pause {:?}", cue);
        Ok(())
    }
    fn seek_to_start(&mut self, _cue: SoundCue) -> Result<(), FeedbackError> {
        Ok(())
    }
}

struct LogHaptics;

impl Haptics for LogHaptics {
    fn pulse(&mut self, pattern_ms: &[u32]) -> Result<(), FeedbackError> {
        log::info!("[sim] haptics: {:?}", pattern_ms);
        Ok(())
    }
}

/// Scripted pointer/host actions; offsets are relative to the dot centre at
/// the time the action runs.
#[derive(Clone, Copy, Debug)]
enum Step {
    Press,
    Drag(Vec2),
    Lift,
    Cancel,
    NextCard,
    Reset,
}

const SCRIPT: &[(u64, Step)] = &[
    // a tap too short to count
    (0, Step::Press),
    (120, Step::Lift),
    // one full charge, part of the next, then let go
    (1_000, Step::Press),
    (1_600, Step::Drag(Vec2::new(24.0, -12.0))),
    (26_000, Step::Lift),
    // a hold the platform takes away
    (29_000, Step::Press),
    (31_000, Step::Cancel),
    (32_000, Step::NextCard),
    (34_000, Step::Reset),
];

const SCRIPT_END_MS: u64 = 36_000;

fn sample_deck() -> Deck {
    let cards = [
        ("I am allowed to take up space.", "self-worth"),
        ("This breath is enough.", "calm"),
        ("I can begin again at any moment.", "resilience"),
        ("My pace is the right pace.", "patience"),
        ("I notice, and I let it pass.", "awareness"),
    ]
    .into_iter()
    .map(|(statement, tag)| Card::new(statement).with_tags([tag]))
    .collect();
    Deck::new("starter", "Starter deck", cards)
}

fn run_step(engine: &mut HoldEngine, step: Step, events: &mut Vec<HoldEvent>) {
    let centre = engine.dot_position() + Vec2::splat(DOT_RADIUS);
    match step {
        Step::Press => {
            engine.handle_pointer(PointerEvent::Down(centre), events);
        }
        Step::Drag(by) => {
            engine.handle_pointer(PointerEvent::Move(centre + by), events);
        }
        Step::Lift => {
            engine.handle_pointer(PointerEvent::Up, events);
        }
        Step::Cancel => {
            engine.handle_pointer(PointerEvent::Cancel, events);
        }
        Step::NextCard => engine.next_card(events),
        Step::Reset => engine.reset(events),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = parse_args()?;
    log::info!(
        "[sim] seed={} realtime={} script={}ms",
        args.seed,
        args.realtime,
        SCRIPT_END_MS
    );

    let themes = PaletteRegistry::default();
    let mut engine = HoldEngine::new(
        HoldConfig::default(),
        Viewport::default(),
        Some(sample_deck()),
        Feedback::new(Box::new(LogSound), Box::new(LogHaptics)),
        args.seed,
    );

    let start = Instant::now();
    let mut events = Vec::new();
    let mut script = SCRIPT.iter().peekable();
    let mut last_readout = 0u64;

    while engine.now_ms() < SCRIPT_END_MS {
        while let Some((_, step)) = script.next_if(|(at, _)| *at <= engine.now_ms()) {
            log::info!("[sim] t={}ms {:?}", engine.now_ms(), step);
            run_step(&mut engine, *step, &mut events);
        }

        engine.tick(FRAME, &mut events);
        for ev in events.drain(..) {
            match ev {
                HoldEvent::CardShown { index } => {
                    let statement = engine.current_card().map_or("", |c| c.statement.as_str());
                    log::info!("[sim] card {}: {}", index, statement);
                }
                HoldEvent::ElapsedTick(_) => {}
                other => log::info!("[sim] {:?}", other),
            }
        }

        if engine.now_ms() >= last_readout + 1_000 {
            last_readout = engine.now_ms();
            let frame = engine.frame(&themes);
            println!(
                "{}  charge {:>5.1}%  shadow {:>4.1}  tint ({:.2}, {:.2}, {:.2})  {:?}",
                format_elapsed(frame.elapsed_seconds),
                frame.signals.charge_progress * 100.0,
                frame.signals.shadow_radius,
                frame.card_tint.x,
                frame.card_tint.y,
                frame.card_tint.z,
                frame.state,
            );
        }

        if args.realtime {
            let target = Duration::from_millis(engine.now_ms());
            let behind = start.elapsed();
            if target > behind {
                thread::sleep(target - behind);
            }
        }
    }

    engine.teardown();
    log::info!("[sim] done after {:?} wall time", start.elapsed());
    Ok(())
}
