//! Scrapline entry point
//!
//! Runs a headless scripted session: start the first level, walk right and
//! swing at whatever gets close, and report the result. Useful for smoke
//! testing the simulation without a renderer attached.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use scrapline::audio::LogAudio;
use scrapline::consts::*;
use scrapline::input::InputSnapshot;
use scrapline::progress::{JsonFileStore, load_or_default};
use scrapline::sim::{GameMode, Session, builtin_levels};

fn main() {
    env_logger::init();
    log::info!("Scrapline (headless) starting...");

    let levels = builtin_levels();
    let mut store = JsonFileStore::new("progress.json");
    let progress = load_or_default(&store, levels.len());

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5c3a);
    let mut session = Session::new(seed, levels, progress);
    let mut audio = LogAudio;

    // Start level 1
    let mut input = InputSnapshot {
        confirm: true,
        ..Default::default()
    };
    session.advance(&input, SIM_DT, &mut store);
    input.clear_menu_intents();
    log::info!("Entered level: {}", session.level_name());

    // Scripted run: hold right and attack, with the fixed-step accumulator
    // the host loop would use
    input.move_right = true;
    input.attack = true;

    let start = Instant::now();
    let mut last = start;
    let mut accumulator = 0.0f32;
    let mut ticks = 0u32;

    while session.mode == GameMode::Playing || session.mode == GameMode::Paused {
        let now = Instant::now();
        accumulator += now.duration_since(last).as_secs_f32().min(MAX_TICK_DT);
        last = now;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            session.advance(&input, SIM_DT, &mut store);
            session.world.drain_events(&mut audio);
            accumulator -= SIM_DT;
            substeps += 1;
            ticks += 1;
        }

        if ticks >= 60 * 120 {
            log::info!("Demo time limit reached");
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }

    let outcome = match session.mode {
        GameMode::LevelComplete => "level complete",
        GameMode::GameOver => "game over",
        _ => "timed out",
    };
    log::info!(
        "Demo finished after {} ticks: {} (score {}, defeated {}, lives {})",
        ticks,
        outcome,
        session.world.score,
        session.world.defeated,
        session.world.avatar.lives,
    );
}
