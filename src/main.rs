//! Star Invaders - headless demo runner
//!
//! Plays a run on autopilot without a window: the frame walker draws into a
//! recording surface and audio cues go to the log.
//!
//! Usage: `star-invaders [seconds] [seed]`

use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};

use star_invaders::audio::{AudioManager, LogBackend};
use star_invaders::consts::SIM_DT;
use star_invaders::renderer::{AssetRegistry, RecordingSurface};
use star_invaders::sim::{GameEvent, GamePhase, TickInput};
use star_invaders::{Catalog, Game, HighScore, Settings, Tuning};

const SETTINGS_PATH: &str = "settings.json";
const HIGHSCORE_PATH: &str = "highscore.json";
const CATALOG_PATH: &str = "catalog.json";

fn main() -> Result<()> {
    env_logger::init();
    log::info!("Star Invaders (headless) starting...");

    let mut args = std::env::args().skip(1);
    let seconds: f32 = match args.next() {
        Some(arg) => arg.parse().context("seconds must be a number")?,
        None => 60.0,
    };

    let settings = Settings::load_or_default(SETTINGS_PATH);
    let seed = match args.next() {
        Some(arg) => arg.parse().context("seed must be an integer")?,
        None => settings.seed.unwrap_or_else(rand::random),
    };

    let catalog_path = Path::new(CATALOG_PATH);
    let catalog = if catalog_path.exists() {
        Catalog::load(catalog_path).with_context(|| format!("loading {CATALOG_PATH}"))?
    } else {
        Catalog::default()
    };
    let tuning = Rc::new(Tuning::from_catalog(&catalog).context("invalid catalog")?);
    let assets = Rc::new(AssetRegistry::headless(&tuning));
    let best = HighScore::load(HIGHSCORE_PATH);

    let mut game = Game::new(
        tuning,
        assets,
        settings,
        AudioManager::new(Box::new(LogBackend::default())),
        best,
        seed,
    );
    game.start();

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let mut surface = RecordingSurface::new();
    let frames = (seconds / SIM_DT).ceil() as u64;
    let mut waves = 0;
    let mut deaths = 0;

    for _ in 0..frames {
        for event in game.update(SIM_DT, &input) {
            match event {
                GameEvent::WaveStarted { number, kind } => {
                    waves += 1;
                    println!("Wave {number}: {}", kind.as_key());
                }
                GameEvent::PlayerDestroyed { .. } => deaths += 1,
                _ => {}
            }
        }
        surface.clear();
        game.render(&mut surface);
        if game.phase() == GamePhase::GameOver {
            break;
        }
    }

    let state = &game.state;
    println!(
        "Finished after {:.1}s: score {}, kills {}, waves {waves}, deaths {deaths}, last frame drew {} sprites",
        state.now_ms() / 1000.0,
        state.score,
        state.kills,
        surface.sprite_count()
    );

    let best = game.best();
    best.save(HIGHSCORE_PATH)
        .with_context(|| format!("saving {HIGHSCORE_PATH}"))?;
    println!("Best: {}", best.highscore);
    Ok(())
}
