//! Data-driven game tables
//!
//! `Catalog` is the string-keyed serde form (what lives in JSON). `Tuning`
//! is the validated, kind-indexed form the simulation reads from. Every
//! string lookup is resolved once in [`Tuning::from_catalog`]; after that,
//! lookups by kind cannot fail.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::enemy::EnemyKind;
use crate::sim::powerup::PowerUpKind;
use crate::sim::projectile::{Owner, ProjectileKind};

/// Sprite-sheet explosion style for a weapon impact or death
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplosionStyle {
    pub sheet: String,
    pub cols: u32,
    pub rows: u32,
    pub scale: f32,
    pub fps: f32,
    /// Only use the first N frames of the sheet
    #[serde(default)]
    pub keep: Option<usize>,
}

/// Guidance parameters for homing shots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomingConfig {
    /// Flight time before guidance engages
    pub delay_ms: f64,
    /// Blend factor toward the target per correction
    pub strength: f32,
    /// Upper bound on the blend factor
    pub max_turn_rate: f32,
    /// Guidance switches off after this long in flight
    #[serde(default)]
    pub duration_ms: Option<f64>,
    /// Guidance switches off after this many corrections
    #[serde(default)]
    pub max_corrections: Option<u32>,
    /// Minimum time between corrections (0 = every tick)
    #[serde(default)]
    pub correction_interval_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponConfig {
    pub sprite: String,
    pub damage: i32,
    pub size: (f32, f32),
    /// Area-of-effect radius, 0 for point damage
    #[serde(default)]
    pub radius: f32,
    pub cooldown_ms: f64,
    /// Shots per trigger pull when a loadout does not say otherwise
    #[serde(default = "one_shot")]
    pub amount: u32,
    /// Pixels per physics tick
    pub speed: f32,
    /// Per-tick speed multiplier
    #[serde(default = "unit_accel")]
    pub accel: f32,
    #[serde(default)]
    pub enemy_speed: Option<f32>,
    #[serde(default)]
    pub enemy_accel: Option<f32>,
    pub explosion: ExplosionStyle,
    #[serde(default)]
    pub homing: Option<HomingConfig>,
    #[serde(default)]
    pub enemy_homing: Option<HomingConfig>,
}

fn one_shot() -> u32 {
    1
}

fn unit_accel() -> f32 {
    1.0
}

impl WeaponConfig {
    pub fn size_vec(&self) -> Vec2 {
        Vec2::new(self.size.0, self.size.1)
    }

    pub fn speed_for(&self, owner: Owner) -> f32 {
        match owner {
            Owner::Player => self.speed,
            Owner::Enemy => self.enemy_speed.unwrap_or(self.speed),
        }
    }

    pub fn accel_for(&self, owner: Owner) -> f32 {
        match owner {
            Owner::Player => self.accel,
            Owner::Enemy => self.enemy_accel.unwrap_or(self.accel),
        }
    }

    pub fn homing_for(&self, owner: Owner) -> Option<&HomingConfig> {
        match owner {
            Owner::Player => self.homing.as_ref(),
            Owner::Enemy => self.enemy_homing.as_ref().or(self.homing.as_ref()),
        }
    }
}

/// Path a fly-in enemy follows once it reaches its hold line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlyInPath {
    Straight,
    Sine,
    Circle,
}

impl FlyInPath {
    pub const ALL: [FlyInPath; 3] = [FlyInPath::Straight, FlyInPath::Sine, FlyInPath::Circle];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MovementConfig {
    /// Formation drift with edge reversal
    Grid { drop_px: f32, speed_start: f32 },
    /// Horizontal sinusoid around the playfield center
    Float { amp_frac: f32, hz: f32 },
    /// Descend to `target_y`, then follow a path
    FlyIn {
        target_y: f32,
        path: FlyInPath,
        speed: f32,
        amplitude: f32,
        frequency: f32,
        radius: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationConfig {
    pub cols: u32,
    pub rows: u32,
    pub h_spacing: f32,
    pub v_spacing: f32,
    pub margin_x: f32,
    pub margin_y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShootConfig {
    /// Per-frame fire probability
    pub prob: f32,
    /// Per-weapon overrides of `prob`
    #[serde(default)]
    pub weapon_probs: BTreeMap<String, f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyConfig {
    pub sprite: String,
    pub size: (f32, f32),
    pub hp: i32,
    pub points: u32,
    pub movement: MovementConfig,
    pub formation: FormationConfig,
    pub shoot: ShootConfig,
    /// Weapon key -> shots per volley
    pub weapons: BTreeMap<String, u32>,
    /// Weapon key -> cyclic firing angles in degrees
    #[serde(default)]
    pub angles: BTreeMap<String, Vec<f32>>,
    #[serde(default)]
    pub spawn_y: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpConfig {
    pub sprite: String,
    pub size: (f32, f32),
    pub drop_chance: f64,
    pub fall_speed: f32,
    /// Lifetime on the field
    pub duration_ms: f64,
    pub points: u32,
    /// Fraction of max health restored
    #[serde(default)]
    pub heal_percentage: f32,
    /// Length of a timed effect after pickup
    #[serde(default)]
    pub effect_duration_ms: f64,
    #[serde(default)]
    pub speed_multiplier: Option<f32>,
    #[serde(default)]
    pub emp_charges: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShieldConfig {
    pub sheet: String,
    pub cols: u32,
    pub rows: u32,
    pub fps: f32,
    pub radius: f32,
    pub duration_ms: f64,
    /// Ship stage -> duration override
    #[serde(default)]
    pub duration_by_stage: BTreeMap<u8, f64>,
    #[serde(default)]
    pub cooldown_ms: f64,
    /// Fraction of the owner's max health the shield starts with
    pub health_percentage: f32,
    /// Fraction of incoming damage the shield takes on
    pub damage_reduction: f32,
    /// Fraction of shield max regenerated per second
    #[serde(default)]
    pub regen_rate: f32,
    /// Floor for partial recharge after the shield was destroyed
    #[serde(default)]
    pub min_health_percentage: f32,
    pub hit_sound_cooldown_ms: f64,
    #[serde(default)]
    pub looping: bool,
}

impl ShieldConfig {
    pub fn duration_for_stage(&self, stage: u8) -> f64 {
        self.duration_by_stage
            .get(&stage)
            .copied()
            .unwrap_or(self.duration_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipConfig {
    pub sprite: String,
    pub size: (f32, f32),
    pub health: i32,
    pub speed: f32,
    pub weapons: BTreeMap<String, u32>,
    /// Weapon key -> muzzle offsets from the ship center
    #[serde(default)]
    pub muzzles: BTreeMap<String, Vec<(f32, f32)>>,
    #[serde(default)]
    pub angles: BTreeMap<String, Vec<f32>>,
    #[serde(default)]
    pub shield: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmpConfig {
    pub sheet: String,
    pub cols: u32,
    pub rows: u32,
    pub fps: f32,
    pub start_diameter: f32,
    pub max_diameter: f32,
    pub expand_duration_s: f32,
    pub cooldown_ms: f64,
    pub start_charges: u32,
    pub max_charges: u32,
    pub weapon_disable_s: f32,
    pub movement_disable_s: f32,
    pub movement_speed_factor: f32,
    pub visual_effect_s: f32,
    pub score_bonus: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectsConfig {
    pub enemy_death: ExplosionStyle,
    pub player_death: ExplosionStyle,
    /// Ring explosions spawned around a nuke detonation
    pub nuke_ring_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    /// Grid speed added per wave number
    pub speed_add: f32,
    pub fly_in_interval_ms: f64,
    pub fly_in_max_alive: usize,
    /// Fly-ins start appearing from this wave number
    pub fly_in_from_wave: u32,
}

/// String-keyed game tables, as stored in JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub weapons: BTreeMap<String, WeaponConfig>,
    pub enemies: BTreeMap<String, EnemyConfig>,
    pub powerups: BTreeMap<String, PowerUpConfig>,
    pub shields: BTreeMap<String, ShieldConfig>,
    pub ships: BTreeMap<u8, ShipConfig>,
    pub emp: EmpConfig,
    pub effects: EffectsConfig,
    pub waves: WaveConfig,
}

/// Shield tier used by the activatable ability
pub const ABILITY_SHIELD_KEY: &str = "tier_1";
/// Shield tier granted by the shield power-up
pub const POWERUP_SHIELD_KEY: &str = "powerup";

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        log::info!("Loaded catalog from {}", path.display());
        Ok(catalog)
    }
}

fn style(sheet: &str, cols: u32, rows: u32, scale: f32, fps: f32) -> ExplosionStyle {
    ExplosionStyle {
        sheet: sheet.to_string(),
        cols,
        rows,
        scale,
        fps,
        keep: None,
    }
}

fn counts(entries: &[(&str, u32)]) -> BTreeMap<String, u32> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn angle_table(entries: &[(&str, &[f32])]) -> BTreeMap<String, Vec<f32>> {
    entries.iter().map(|(k, v)| (k.to_string(), v.to_vec())).collect()
}

fn muzzle_table(entries: &[(&str, &[(f32, f32)])]) -> BTreeMap<String, Vec<(f32, f32)>> {
    entries.iter().map(|(k, v)| (k.to_string(), v.to_vec())).collect()
}

fn default_weapons() -> BTreeMap<String, WeaponConfig> {
    let mut weapons = BTreeMap::new();
    weapons.insert(
        "laser".to_string(),
        WeaponConfig {
            sprite: "weapons/laser".into(),
            damage: 50,
            size: (6.0, 24.0),
            radius: 0.0,
            cooldown_ms: 150.0,
            amount: 1,
            speed: 15.0,
            accel: 1.0,
            enemy_speed: None,
            enemy_accel: None,
            explosion: ExplosionStyle {
                keep: Some(4),
                ..style("explosions/laser", 4, 2, 0.8, 10.0)
            },
            homing: None,
            enemy_homing: None,
        },
    );
    weapons.insert(
        "double_laser".to_string(),
        WeaponConfig {
            sprite: "weapons/double_laser".into(),
            damage: 50,
            size: (14.0, 24.0),
            radius: 0.0,
            cooldown_ms: 200.0,
            amount: 2,
            speed: 15.0,
            accel: 1.0,
            enemy_speed: None,
            enemy_accel: None,
            explosion: ExplosionStyle {
                keep: Some(4),
                ..style("explosions/laser", 4, 2, 0.8, 10.0)
            },
            homing: None,
            enemy_homing: None,
        },
    );
    weapons.insert(
        "rocket".to_string(),
        WeaponConfig {
            sprite: "weapons/rocket".into(),
            damage: 200,
            size: (12.0, 32.0),
            radius: 120.0,
            cooldown_ms: 1000.0,
            amount: 1,
            speed: 5.0,
            accel: 1.03,
            enemy_speed: None,
            enemy_accel: None,
            explosion: style("explosions/rocket", 8, 6, 1.4, 30.0),
            homing: None,
            enemy_homing: None,
        },
    );
    weapons.insert(
        "homing_rocket".to_string(),
        WeaponConfig {
            sprite: "weapons/homing_rocket".into(),
            damage: 150,
            size: (12.0, 32.0),
            radius: 140.0,
            cooldown_ms: 1200.0,
            amount: 1,
            speed: 6.0,
            accel: 1.02,
            enemy_speed: None,
            enemy_accel: None,
            explosion: style("explosions/rocket", 8, 6, 1.2, 30.0),
            homing: Some(HomingConfig {
                delay_ms: 300.0,
                strength: 0.12,
                max_turn_rate: 0.08,
                duration_ms: None,
                max_corrections: None,
                correction_interval_ms: 0.0,
            }),
            enemy_homing: Some(HomingConfig {
                delay_ms: 300.0,
                strength: 0.1,
                max_turn_rate: 0.05,
                duration_ms: Some(3000.0),
                max_corrections: None,
                correction_interval_ms: 0.0,
            }),
        },
    );
    weapons.insert(
        "blaster".to_string(),
        WeaponConfig {
            sprite: "weapons/blaster".into(),
            damage: 80,
            size: (10.0, 20.0),
            radius: 0.0,
            cooldown_ms: 300.0,
            amount: 1,
            speed: 13.0,
            accel: 1.02,
            enemy_speed: Some(11.0),
            enemy_accel: Some(1.0),
            explosion: style("explosions/blaster", 4, 4, 1.0, 20.0),
            homing: Some(HomingConfig {
                delay_ms: 150.0,
                strength: 0.08,
                max_turn_rate: 0.05,
                duration_ms: None,
                max_corrections: None,
                correction_interval_ms: 0.0,
            }),
            enemy_homing: Some(HomingConfig {
                delay_ms: 200.0,
                strength: 0.06,
                max_turn_rate: 0.04,
                duration_ms: Some(1500.0),
                max_corrections: Some(6),
                correction_interval_ms: 250.0,
            }),
        },
    );
    weapons.insert(
        "nuke".to_string(),
        WeaponConfig {
            sprite: "weapons/nuke".into(),
            damage: 600,
            size: (20.0, 40.0),
            radius: 300.0,
            cooldown_ms: 5000.0,
            amount: 1,
            speed: 3.0,
            accel: 1.01,
            enemy_speed: None,
            enemy_accel: None,
            explosion: style("explosions/nuke", 8, 8, 3.0, 24.0),
            homing: None,
            enemy_homing: None,
        },
    );
    weapons
}

fn grid_enemy(
    sprite: &str,
    size: f32,
    hp: i32,
    points: u32,
    drop_px: f32,
    speed_start: f32,
    formation: FormationConfig,
    prob: f32,
    weapon: &str,
) -> EnemyConfig {
    EnemyConfig {
        sprite: sprite.into(),
        size: (size, size),
        hp,
        points,
        movement: MovementConfig::Grid {
            drop_px,
            speed_start,
        },
        formation,
        shoot: ShootConfig {
            prob,
            weapon_probs: BTreeMap::new(),
        },
        weapons: counts(&[(weapon, 1)]),
        angles: BTreeMap::new(),
        spawn_y: None,
    }
}

fn formation(
    cols: u32,
    rows: u32,
    h_spacing: f32,
    v_spacing: f32,
    margin_x: f32,
    margin_y: f32,
) -> FormationConfig {
    FormationConfig {
        cols,
        rows,
        h_spacing,
        v_spacing,
        margin_x,
        margin_y,
    }
}

fn default_enemies() -> BTreeMap<String, EnemyConfig> {
    let mut enemies = BTreeMap::new();
    enemies.insert(
        "alien".to_string(),
        grid_enemy(
            "enemies/alien",
            45.0,
            100,
            10,
            30.0,
            2.0,
            formation(8, 4, 60.0, 70.0, 50.0, 50.0),
            0.008,
            "laser",
        ),
    );
    enemies.insert(
        "drone".to_string(),
        grid_enemy(
            "enemies/drone",
            30.0,
            50,
            20,
            20.0,
            4.0,
            formation(10, 2, 40.0, 40.0, 50.0, 50.0),
            0.02,
            "laser",
        ),
    );
    enemies.insert(
        "tank".to_string(),
        grid_enemy(
            "enemies/tank",
            60.0,
            300,
            50,
            25.0,
            1.0,
            formation(4, 2, 80.0, 60.0, 100.0, 50.0),
            0.005,
            "rocket",
        ),
    );
    enemies.insert(
        "sniper".to_string(),
        grid_enemy(
            "enemies/sniper",
            40.0,
            120,
            30,
            30.0,
            2.0,
            formation(6, 2, 60.0, 50.0, 80.0, 50.0),
            0.003,
            "blaster",
        ),
    );
    enemies.insert(
        "boss".to_string(),
        EnemyConfig {
            sprite: "enemies/boss".into(),
            size: (140.0, 100.0),
            hp: 1000,
            points: 1000,
            movement: MovementConfig::Float {
                amp_frac: 0.2,
                hz: 0.25,
            },
            formation: formation(1, 1, 0.0, 0.0, 0.0, 140.0),
            shoot: ShootConfig {
                prob: 0.001,
                weapon_probs: [
                    ("laser", 0.008),
                    ("blaster", 0.006),
                    ("rocket", 0.003),
                    ("nuke", 0.001),
                    ("homing_rocket", 0.001),
                ]
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            },
            weapons: counts(&[
                ("laser", 3),
                ("blaster", 2),
                ("rocket", 1),
                ("nuke", 1),
                ("homing_rocket", 1),
            ]),
            angles: angle_table(&[
                ("laser", &[-15.0, 0.0, 15.0]),
                ("blaster", &[-8.0, 8.0]),
            ]),
            spawn_y: None,
        },
    );
    enemies.insert(
        "interceptor".to_string(),
        EnemyConfig {
            sprite: "enemies/interceptor".into(),
            size: (35.0, 35.0),
            hp: 75,
            points: 25,
            movement: MovementConfig::FlyIn {
                target_y: 120.0,
                path: FlyInPath::Sine,
                speed: 3.0,
                amplitude: 40.0,
                frequency: 1.2,
                radius: 35.0,
            },
            formation: formation(1, 1, 0.0, 0.0, 60.0, 0.0),
            shoot: ShootConfig {
                prob: 0.01,
                weapon_probs: BTreeMap::new(),
            },
            weapons: counts(&[("laser", 1)]),
            angles: BTreeMap::new(),
            spawn_y: Some(-50.0),
        },
    );
    enemies
}

fn powerup(
    sprite: &str,
    drop_chance: f64,
    points: u32,
    heal_percentage: f32,
    effect_duration_ms: f64,
) -> PowerUpConfig {
    PowerUpConfig {
        sprite: sprite.into(),
        size: (32.0, 32.0),
        drop_chance,
        fall_speed: 2.0,
        duration_ms: 8000.0,
        points,
        heal_percentage,
        effect_duration_ms,
        speed_multiplier: None,
        emp_charges: 0,
    }
}

fn default_powerups() -> BTreeMap<String, PowerUpConfig> {
    let mut powerups = BTreeMap::new();
    powerups.insert(
        "health".to_string(),
        powerup("powerups/health", 0.15, 50, 0.25, 0.0),
    );
    powerups.insert(
        "repair".to_string(),
        powerup("powerups/repair", 0.10, 25, 0.15, 0.0),
    );
    powerups.insert(
        "shield".to_string(),
        powerup("powerups/shield", 0.08, 75, 0.0, 0.0),
    );
    powerups.insert(
        "double_laser".to_string(),
        powerup("powerups/double_laser", 0.05, 60, 0.0, 10_000.0),
    );
    powerups.insert(
        "speed_boost".to_string(),
        PowerUpConfig {
            speed_multiplier: Some(1.5),
            ..powerup("powerups/speed_boost", 0.05, 40, 0.0, 8000.0)
        },
    );
    powerups.insert(
        "emp".to_string(),
        PowerUpConfig {
            emp_charges: 1,
            ..powerup("powerups/emp", 0.05, 50, 0.0, 0.0)
        },
    );
    powerups
}

fn default_shields() -> BTreeMap<String, ShieldConfig> {
    let mut shields = BTreeMap::new();
    shields.insert(
        ABILITY_SHIELD_KEY.to_string(),
        ShieldConfig {
            sheet: "shields/tier_1".into(),
            cols: 5,
            rows: 4,
            fps: 20.0,
            radius: 70.0,
            duration_ms: 5000.0,
            duration_by_stage: BTreeMap::new(),
            cooldown_ms: 7000.0,
            health_percentage: 0.5,
            damage_reduction: 0.9,
            regen_rate: 0.1,
            min_health_percentage: 0.3,
            hit_sound_cooldown_ms: 150.0,
            looping: true,
        },
    );
    shields.insert(
        POWERUP_SHIELD_KEY.to_string(),
        ShieldConfig {
            sheet: "shields/powerup".into(),
            cols: 4,
            rows: 4,
            fps: 16.0,
            radius: 70.0,
            duration_ms: 6000.0,
            duration_by_stage: [(1, 6000.0), (2, 8000.0), (3, 10_000.0), (4, 12_000.0)]
                .into_iter()
                .collect(),
            cooldown_ms: 0.0,
            health_percentage: 1.0,
            damage_reduction: 1.0,
            regen_rate: 0.0,
            min_health_percentage: 0.0,
            hit_sound_cooldown_ms: 150.0,
            looping: true,
        },
    );
    shields
}

fn default_ships() -> BTreeMap<u8, ShipConfig> {
    let mut ships = BTreeMap::new();
    ships.insert(
        1,
        ShipConfig {
            sprite: "ships/stage_1".into(),
            size: (40.0, 40.0),
            health: 1000,
            speed: 4.0,
            weapons: counts(&[("laser", 1)]),
            muzzles: muzzle_table(&[("laser", &[(0.0, -20.0)])]),
            angles: BTreeMap::new(),
            shield: true,
        },
    );
    ships.insert(
        2,
        ShipConfig {
            sprite: "ships/stage_2".into(),
            size: (40.0, 40.0),
            health: 2000,
            speed: 5.0,
            weapons: counts(&[("laser", 2), ("rocket", 1)]),
            muzzles: muzzle_table(&[
                ("laser", &[(-12.0, -18.0), (12.0, -18.0)]),
                ("rocket", &[(0.0, -20.0)]),
            ]),
            angles: BTreeMap::new(),
            shield: true,
        },
    );
    ships.insert(
        3,
        ShipConfig {
            sprite: "ships/stage_3".into(),
            size: (55.0, 55.0),
            health: 4000,
            speed: 7.0,
            weapons: counts(&[
                ("laser", 3),
                ("rocket", 2),
                ("homing_rocket", 1),
                ("blaster", 1),
                ("nuke", 1),
            ]),
            muzzles: muzzle_table(&[
                ("laser", &[(-16.0, -22.0), (0.0, -27.0), (16.0, -22.0)]),
                ("rocket", &[(-22.0, -10.0), (22.0, -10.0)]),
                ("homing_rocket", &[(0.0, -27.0)]),
                ("blaster", &[(0.0, -27.0)]),
                ("nuke", &[(0.0, -27.0)]),
            ]),
            angles: angle_table(&[("laser", &[-5.0, 0.0, 5.0]), ("rocket", &[-3.0, 3.0])]),
            shield: true,
        },
    );
    ships.insert(
        4,
        ShipConfig {
            sprite: "ships/stage_4".into(),
            size: (70.0, 70.0),
            health: 10_000,
            speed: 10.0,
            weapons: counts(&[
                ("laser", 5),
                ("rocket", 4),
                ("homing_rocket", 2),
                ("blaster", 2),
                ("nuke", 1),
            ]),
            muzzles: muzzle_table(&[
                (
                    "laser",
                    &[
                        (-30.0, -20.0),
                        (-15.0, -28.0),
                        (15.0, -28.0),
                        (30.0, -20.0),
                        (0.0, -35.0),
                    ],
                ),
                (
                    "rocket",
                    &[(-28.0, -8.0), (-14.0, -14.0), (14.0, -14.0), (28.0, -8.0)],
                ),
                ("homing_rocket", &[(-20.0, -16.0), (20.0, -16.0)]),
                ("blaster", &[(-8.0, -32.0), (8.0, -32.0)]),
                ("nuke", &[(0.0, -35.0)]),
            ]),
            angles: angle_table(&[
                ("laser", &[-10.0, -7.0, 7.0, 10.0, 0.0]),
                ("rocket", &[-6.0, -2.0, 2.0, 6.0]),
                ("homing_rocket", &[-20.0, 20.0]),
                ("blaster", &[-3.0, 3.0]),
            ]),
            shield: true,
        },
    );
    ships
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            weapons: default_weapons(),
            enemies: default_enemies(),
            powerups: default_powerups(),
            shields: default_shields(),
            ships: default_ships(),
            emp: EmpConfig {
                sheet: "effects/emp".into(),
                cols: 4,
                rows: 4,
                fps: 16.0,
                start_diameter: 64.0,
                max_diameter: 800.0,
                expand_duration_s: 0.5,
                cooldown_ms: 5000.0,
                start_charges: 0,
                max_charges: 99,
                weapon_disable_s: 10.0,
                movement_disable_s: 7.0,
                movement_speed_factor: 0.1,
                visual_effect_s: 10.0,
                score_bonus: 50,
            },
            effects: EffectsConfig {
                enemy_death: style("explosions/enemy", 8, 4, 1.2, 30.0),
                player_death: style("explosions/player", 8, 6, 2.0, 24.0),
                nuke_ring_count: 8,
            },
            waves: WaveConfig {
                speed_add: 0.5,
                fly_in_interval_ms: 4000.0,
                fly_in_max_alive: 4,
                fly_in_from_wave: 2,
            },
        }
    }
}

/// Enemy table entry with weapon keys resolved
#[derive(Debug, Clone)]
pub struct EnemyTemplate {
    pub kind: EnemyKind,
    pub sprite: String,
    pub size: Vec2,
    pub hp: i32,
    pub points: u32,
    pub movement: MovementConfig,
    pub formation: FormationConfig,
    pub shoot_prob: f32,
    pub weapon_probs: BTreeMap<ProjectileKind, f32>,
    pub weapons: Vec<(ProjectileKind, u32)>,
    pub angles: BTreeMap<ProjectileKind, Vec<f32>>,
    pub spawn_y: Option<f32>,
}

/// Ship stage entry with weapon keys resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipTemplate {
    pub stage: u8,
    pub sprite: String,
    pub size: Vec2,
    pub health: i32,
    pub speed: f32,
    pub weapons: BTreeMap<ProjectileKind, u32>,
    pub muzzles: BTreeMap<ProjectileKind, Vec<Vec2>>,
    pub angles: BTreeMap<ProjectileKind, Vec<f32>>,
    pub shield: bool,
}

impl ShipTemplate {
    /// Shots per trigger pull for `kind`, 0 when the stage lacks it
    pub fn weapon_count(&self, kind: ProjectileKind) -> u32 {
        self.weapons.get(&kind).copied().unwrap_or(0)
    }
}

/// Validated, kind-indexed game tables
#[derive(Debug, Clone)]
pub struct Tuning {
    weapons: Vec<WeaponConfig>,
    enemies: Vec<EnemyTemplate>,
    powerups: Vec<PowerUpConfig>,
    ability_shield: ShieldConfig,
    powerup_shield: ShieldConfig,
    ships: BTreeMap<u8, ShipTemplate>,
    base_ship: ShipTemplate,
    pub emp: EmpConfig,
    pub effects: EffectsConfig,
    pub waves: WaveConfig,
}

fn resolve_weapon(key: &str) -> Result<ProjectileKind, ConfigError> {
    ProjectileKind::from_key(key).ok_or_else(|| ConfigError::UnknownWeapon(key.to_string()))
}

fn check_positive(key: &str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, field, format!("must be positive, got {value}")))
    }
}

fn check_fraction(key: &str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, field, format!("must be within 0..=1, got {value}")))
    }
}

fn validate_homing(key: &str, homing: &HomingConfig) -> Result<(), ConfigError> {
    check_fraction(key, "homing.strength", homing.strength)?;
    check_fraction(key, "homing.max_turn_rate", homing.max_turn_rate)?;
    if homing.delay_ms < 0.0 {
        return Err(ConfigError::invalid(key, "homing.delay_ms", "must not be negative"));
    }
    Ok(())
}

fn validate_weapon(key: &str, cfg: &WeaponConfig) -> Result<(), ConfigError> {
    if cfg.damage < 0 {
        return Err(ConfigError::invalid(key, "damage", "must not be negative"));
    }
    if cfg.radius < 0.0 {
        return Err(ConfigError::invalid(key, "radius", "must not be negative"));
    }
    if cfg.speed < 0.0 {
        return Err(ConfigError::invalid(key, "speed", "must not be negative"));
    }
    check_positive(key, "accel", cfg.accel)?;
    check_positive(key, "size.w", cfg.size.0)?;
    check_positive(key, "size.h", cfg.size.1)?;
    check_positive(key, "explosion.fps", cfg.explosion.fps)?;
    if let Some(homing) = &cfg.homing {
        validate_homing(key, homing)?;
    }
    if let Some(homing) = &cfg.enemy_homing {
        validate_homing(key, homing)?;
    }
    Ok(())
}

fn resolve_weapon_map<T: Clone>(
    entries: &BTreeMap<String, T>,
) -> Result<BTreeMap<ProjectileKind, T>, ConfigError> {
    entries
        .iter()
        .map(|(key, value)| Ok((resolve_weapon(key)?, value.clone())))
        .collect()
}

fn resolve_enemy(kind: EnemyKind, cfg: &EnemyConfig) -> Result<EnemyTemplate, ConfigError> {
    let key = kind.as_key();
    if cfg.hp <= 0 {
        return Err(ConfigError::invalid(key, "hp", "must be positive"));
    }
    check_fraction(key, "shoot.prob", cfg.shoot.prob)?;
    check_positive(key, "size.w", cfg.size.0)?;
    check_positive(key, "size.h", cfg.size.1)?;
    let weapon_probs = resolve_weapon_map(&cfg.shoot.weapon_probs)?;
    for prob in weapon_probs.values() {
        check_fraction(key, "shoot.weapon_probs", *prob)?;
    }
    let weapons = cfg
        .weapons
        .iter()
        .map(|(key, count)| Ok((resolve_weapon(key)?, *count)))
        .collect::<Result<Vec<_>, ConfigError>>()?;
    Ok(EnemyTemplate {
        kind,
        sprite: cfg.sprite.clone(),
        size: Vec2::new(cfg.size.0, cfg.size.1),
        hp: cfg.hp,
        points: cfg.points,
        movement: cfg.movement.clone(),
        formation: cfg.formation.clone(),
        shoot_prob: cfg.shoot.prob,
        weapon_probs,
        weapons,
        angles: resolve_weapon_map(&cfg.angles)?,
        spawn_y: cfg.spawn_y,
    })
}

fn resolve_ship(stage: u8, cfg: &ShipConfig) -> Result<ShipTemplate, ConfigError> {
    let key = format!("ship_{stage}");
    if cfg.health <= 0 {
        return Err(ConfigError::invalid(&key, "health", "must be positive"));
    }
    check_positive(&key, "speed", cfg.speed)?;
    let muzzles = resolve_weapon_map(&cfg.muzzles)?
        .into_iter()
        .map(|(kind, offsets)| {
            (
                kind,
                offsets.into_iter().map(|(x, y)| Vec2::new(x, y)).collect(),
            )
        })
        .collect();
    Ok(ShipTemplate {
        stage,
        sprite: cfg.sprite.clone(),
        size: Vec2::new(cfg.size.0, cfg.size.1),
        health: cfg.health,
        speed: cfg.speed,
        weapons: resolve_weapon_map(&cfg.weapons)?,
        muzzles,
        angles: resolve_weapon_map(&cfg.angles)?,
        shield: cfg.shield,
    })
}

fn validate_shield(key: &str, cfg: &ShieldConfig) -> Result<(), ConfigError> {
    check_fraction(key, "health_percentage", cfg.health_percentage)?;
    check_fraction(key, "damage_reduction", cfg.damage_reduction)?;
    check_fraction(key, "min_health_percentage", cfg.min_health_percentage)?;
    check_positive(key, "radius", cfg.radius)?;
    check_positive(key, "fps", cfg.fps)?;
    Ok(())
}

impl Tuning {
    /// Resolve and validate every table in `catalog`
    pub fn from_catalog(catalog: &Catalog) -> Result<Self, ConfigError> {
        for key in catalog.weapons.keys() {
            resolve_weapon(key)?;
        }
        for key in catalog.enemies.keys() {
            EnemyKind::from_key(key).ok_or_else(|| ConfigError::UnknownEnemy(key.clone()))?;
        }
        for key in catalog.powerups.keys() {
            PowerUpKind::from_key(key).ok_or_else(|| ConfigError::UnknownPowerUp(key.clone()))?;
        }

        let weapons = ProjectileKind::ALL
            .iter()
            .map(|kind| {
                let cfg = catalog
                    .weapons
                    .get(kind.as_key())
                    .ok_or_else(|| ConfigError::UnknownWeapon(kind.as_key().to_string()))?;
                validate_weapon(kind.as_key(), cfg)?;
                Ok(cfg.clone())
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let enemies = EnemyKind::ALL
            .iter()
            .map(|kind| {
                let cfg = catalog
                    .enemies
                    .get(kind.as_key())
                    .ok_or_else(|| ConfigError::UnknownEnemy(kind.as_key().to_string()))?;
                resolve_enemy(*kind, cfg)
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let powerups = PowerUpKind::ALL
            .iter()
            .map(|kind| {
                let cfg = catalog
                    .powerups
                    .get(kind.as_key())
                    .ok_or_else(|| ConfigError::UnknownPowerUp(kind.as_key().to_string()))?;
                if !(0.0..=1.0).contains(&cfg.drop_chance) {
                    return Err(ConfigError::invalid(
                        kind.as_key(),
                        "drop_chance",
                        "must be within 0..=1",
                    ));
                }
                Ok(cfg.clone())
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        let total_drop: f64 = powerups.iter().map(|p| p.drop_chance).sum();
        if total_drop > 1.0 + 1e-9 {
            return Err(ConfigError::invalid(
                "powerups",
                "drop_chance",
                format!("chances sum to {total_drop}, more than 1"),
            ));
        }

        let shield = |key: &str| -> Result<ShieldConfig, ConfigError> {
            let cfg = catalog
                .shields
                .get(key)
                .ok_or_else(|| ConfigError::MissingShield(key.to_string()))?;
            validate_shield(key, cfg)?;
            Ok(cfg.clone())
        };
        let ability_shield = shield(ABILITY_SHIELD_KEY)?;
        let powerup_shield = shield(POWERUP_SHIELD_KEY)?;

        let ships = catalog
            .ships
            .iter()
            .map(|(stage, cfg)| Ok((*stage, resolve_ship(*stage, cfg)?)))
            .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;
        let base_ship = ships.get(&1).cloned().ok_or(ConfigError::UnknownShip(1))?;

        check_positive("emp", "max_diameter", catalog.emp.max_diameter)?;
        check_positive("emp", "expand_duration_s", catalog.emp.expand_duration_s)?;
        check_fraction("emp", "movement_speed_factor", catalog.emp.movement_speed_factor)?;

        log::debug!(
            "Tuning resolved: {} weapons, {} enemies, {} power-ups, {} ship stages",
            weapons.len(),
            enemies.len(),
            powerups.len(),
            ships.len()
        );

        Ok(Self {
            weapons,
            enemies,
            powerups,
            ability_shield,
            powerup_shield,
            ships,
            base_ship,
            emp: catalog.emp.clone(),
            effects: catalog.effects.clone(),
            waves: catalog.waves.clone(),
        })
    }

    /// Tables built from the default catalog
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_catalog(&Catalog::default())
    }

    pub fn weapon(&self, kind: ProjectileKind) -> &WeaponConfig {
        &self.weapons[kind.index()]
    }

    pub fn weapon_by_key(&self, key: &str) -> Result<&WeaponConfig, ConfigError> {
        Ok(self.weapon(resolve_weapon(key)?))
    }

    pub fn enemy(&self, kind: EnemyKind) -> &EnemyTemplate {
        &self.enemies[kind.index()]
    }

    pub fn enemy_by_key(&self, key: &str) -> Result<&EnemyTemplate, ConfigError> {
        let kind =
            EnemyKind::from_key(key).ok_or_else(|| ConfigError::UnknownEnemy(key.to_string()))?;
        Ok(self.enemy(kind))
    }

    pub fn powerup(&self, kind: PowerUpKind) -> &PowerUpConfig {
        &self.powerups[kind.index()]
    }

    pub fn powerup_by_key(&self, key: &str) -> Result<&PowerUpConfig, ConfigError> {
        let kind = PowerUpKind::from_key(key)
            .ok_or_else(|| ConfigError::UnknownPowerUp(key.to_string()))?;
        Ok(self.powerup(kind))
    }

    pub fn ability_shield(&self) -> &ShieldConfig {
        &self.ability_shield
    }

    pub fn powerup_shield(&self) -> &ShieldConfig {
        &self.powerup_shield
    }

    pub fn ship(&self, stage: u8) -> Result<&ShipTemplate, ConfigError> {
        self.ships.get(&stage).ok_or(ConfigError::UnknownShip(stage))
    }

    /// Stage 1 ship, guaranteed present after validation
    pub fn base_ship(&self) -> &ShipTemplate {
        &self.base_ship
    }

    pub fn ship_stages(&self) -> impl Iterator<Item = u8> + '_ {
        self.ships.keys().copied()
    }
}
