//! Game loop driver
//!
//! Owns the simulation, the fixed-step accumulator and the audio front end.
//! Phases: Menu -> Playing <-> Paused -> Menu, and Playing -> GameOver -> Menu.

use std::rc::Rc;

use crate::audio::{AudioManager, SoundEffect};
use crate::consts::SIM_DT;
use crate::error::ConfigError;
use crate::highscores::HighScore;
use crate::platform::{FixedStepper, InputSnapshot, Key};
use crate::renderer::{AssetRegistry, Surface, draw_world};
use crate::settings::Settings;
use crate::sim::{GameEvent, GamePhase, GameState, TickInput, frame_update, physics_tick};
use crate::tuning::Tuning;

/// Game instance holding all state
pub struct Game {
    pub state: GameState,
    settings: Settings,
    audio: AudioManager,
    stepper: FixedStepper,
    best: HighScore,
    // FPS tracking
    frame_times: [f64; 60],
    frame_index: usize,
    fps: u32,
    wall_ms: f64,
}

impl Game {
    pub fn new(
        tuning: Rc<Tuning>,
        assets: Rc<AssetRegistry>,
        settings: Settings,
        mut audio: AudioManager,
        best: HighScore,
        seed: u64,
    ) -> Self {
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);
        audio.set_music_volume(settings.music_volume);
        audio.set_muted(settings.muted);

        let mut state = GameState::new(tuning, assets, &settings, seed);
        state.highscore = best.highscore;
        log::info!("Game ready with seed {seed}, best {}", best.highscore);
        Self {
            state,
            settings,
            audio,
            stepper: FixedStepper::default(),
            best,
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
            wall_ms: 0.0,
        }
    }

    /// Built-in tables, headless assets and silent audio
    pub fn headless(settings: Settings, seed: u64) -> Result<Self, ConfigError> {
        let tuning = Rc::new(Tuning::builtin()?);
        let assets = Rc::new(AssetRegistry::headless(&tuning));
        Ok(Self::new(
            tuning,
            assets,
            settings,
            AudioManager::default(),
            HighScore::default(),
            seed,
        ))
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn audio_mut(&mut self) -> &mut AudioManager {
        &mut self.audio
    }

    /// Best score including the current run
    pub fn best(&self) -> HighScore {
        HighScore::new(self.best.highscore.max(self.state.highscore))
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Menu or GameOver -> Playing. A finished run restarts with the next seed.
    pub fn start(&mut self) {
        match self.state.phase {
            GamePhase::Menu => {}
            GamePhase::GameOver => {
                let seed = self.state.seed.wrapping_add(1);
                self.state.restart_with_seed(seed);
            }
            GamePhase::Playing | GamePhase::Paused => return,
        }
        self.stepper.reset();
        self.state.phase = GamePhase::Playing;
        log::info!("Run started (seed {})", self.state.seed);
    }

    pub fn toggle_pause(&mut self) {
        self.state.phase = match self.state.phase {
            GamePhase::Playing => GamePhase::Paused,
            GamePhase::Paused => {
                self.stepper.reset();
                GamePhase::Playing
            }
            other => other,
        };
        log::info!("Phase now {:?}", self.state.phase);
    }

    /// Abandon the run and return to the title screen
    pub fn quit_to_menu(&mut self) {
        if self.state.phase == GamePhase::Menu {
            return;
        }
        self.best.record(self.state.score);
        self.state.restart();
        self.state.phase = GamePhase::Menu;
        log::info!("Returned to menu");
    }

    /// Auto-pause when the window loses focus
    pub fn focus_lost(&mut self) {
        if self.state.phase == GamePhase::Playing {
            self.state.phase = GamePhase::Paused;
            log::info!("Auto-paused (focus lost)");
        }
    }

    /// Apply phase keys and translate the rest into simulation input
    pub fn handle_input(&mut self, input: &InputSnapshot) -> TickInput {
        if input.was_pressed(Key::Escape) {
            self.toggle_pause();
        }
        if input.was_pressed(Key::Enter) {
            self.start();
        }
        if input.was_pressed(Key::Q) && self.state.phase != GamePhase::Playing {
            self.quit_to_menu();
        }
        input.to_tick_input()
    }

    /// Run one rendered frame: fixed physics substeps, then the frame update.
    /// Returns the events the frame produced after audio has seen them.
    pub fn update(&mut self, frame_dt: f32, input: &TickInput) -> Vec<GameEvent> {
        self.track_fps(frame_dt);
        if self.state.phase != GamePhase::Playing {
            return Vec::new();
        }
        let steps = self.stepper.advance(frame_dt);
        for _ in 0..steps {
            physics_tick(&mut self.state);
        }
        frame_update(&mut self.state, input, steps as f32 * SIM_DT);

        let events = self.state.drain_events();
        self.dispatch(&events);
        events
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        draw_world(&self.state, &self.settings, surface);
    }

    fn dispatch(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::Sound(effect) => self.audio.play(*effect),
                GameEvent::NewHighScore(score) => {
                    log::info!("New high score: {score}");
                    self.audio.play(SoundEffect::HighScore);
                }
                GameEvent::GameOver { score } => {
                    if self.best.record(*score) {
                        log::info!("Best score is now {score}");
                    }
                }
                _ => {}
            }
        }
    }

    fn track_fps(&mut self, frame_dt: f32) {
        self.wall_ms += frame_dt.max(0.0) as f64 * 1000.0;
        self.frame_times[self.frame_index] = self.wall_ms;
        self.frame_index = (self.frame_index + 1) % self.frame_times.len();

        // Oldest sample is the one about to be overwritten
        let oldest = self.frame_times[self.frame_index];
        if oldest > 0.0 {
            let elapsed = self.wall_ms - oldest;
            if elapsed > 0.0 {
                self.fps = (60000.0 / elapsed).round() as u32;
            }
        }
    }
}
