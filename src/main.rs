//! Ball Arena entry point
//!
//! On the web this only installs logging and the panic hook; the page drives
//! `WebArena`. Natively it runs one battle headless and logs the result.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
pub use ball_arena::platform::web::WebArena;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).expect("Failed to init logger");
    log::info!("Ball Arena ready");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Synthetic frame rate for headless runs
#[cfg(not(target_arch = "wasm32"))]
const HEADLESS_FPS: f32 = 60.0;
/// Give up after this many simulated seconds (plus loading and countdown)
#[cfg(not(target_arch = "wasm32"))]
const HEADLESS_LIMIT_SECS: f32 = 600.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Ball Arena (native, headless) starting...");

    if let Err(err) = run_headless() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

/// `ball-arena [roster.json] [seed]`
#[cfg(not(target_arch = "wasm32"))]
fn run_headless() -> Result<(), Box<dyn std::error::Error>> {
    use ball_arena::Roster;
    use ball_arena::platform::run_fixed;
    use ball_arena::sim::GameEvent;

    let mut args = std::env::args().skip(1);
    let mut roster = match args.next() {
        Some(path) => {
            log::info!("Loading roster from {}", path);
            Roster::from_json(&std::fs::read_to_string(&path)?)?
        }
        None => {
            log::info!("No roster given, using the demo roster");
            Roster::demo()
        }
    };
    if let Some(seed) = args.next() {
        roster.seed = seed.parse()?;
    }

    let mut battle = roster.into_battle();
    battle.start()?;
    let dt = 1.0 / HEADLESS_FPS;
    let events = run_fixed(&mut battle, dt, (HEADLESS_LIMIT_SECS * HEADLESS_FPS) as usize);

    let defeats = events
        .iter()
        .filter(|e| matches!(e, GameEvent::Defeated { .. }))
        .count();
    log::info!("{} events, {} defeats", events.len(), defeats);

    if battle.outcome().is_none() {
        log::warn!("Time limit reached, ending battle");
        battle.end_game();
    }
    let snapshot = battle.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot.outcome)?);
    Ok(())
}
