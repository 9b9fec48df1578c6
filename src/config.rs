use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::motion::MotionInfo;
use crate::render::arrow::{UserArrowSetting, ARROW_SIZE_RANGE, SMOOTHING_WINDOW_RANGE};
use crate::render::scene::{ArrowKind, MeshState};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub arrows: ArrowsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    /// モーションカタログ
    #[serde(default = "default_motions")]
    pub motions: Vec<MotionEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 再生ループの tick レート
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    /// ログ出力先
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

fn default_target_fps() -> u32 { 30 }
fn default_log_dir() -> String { "logs".to_string() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            log_dir: default_log_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArrowsConfig {
    #[serde(default = "default_velocity_arrow")]
    pub velocity: ArrowConfig,
    #[serde(default = "default_acceleration_arrow")]
    pub acceleration: ArrowConfig,
}

impl Default for ArrowsConfig {
    fn default() -> Self {
        Self {
            velocity: default_velocity_arrow(),
            acceleration: default_acceleration_arrow(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArrowConfig {
    #[serde(default)]
    pub enabled: bool,
    /// ベクトルの大きさを矢印に反映
    #[serde(default)]
    pub scaling_enabled: bool,
    /// 1..=5
    #[serde(default = "default_arrow_size")]
    pub arrow_size: u8,
    /// 1..=10
    #[serde(default = "default_smoothing_window_size")]
    pub smoothing_window_size: usize,
    /// RGBA。省略時は種別ごとの既定色
    #[serde(default)]
    pub color: Option<[f32; 4]>,
}

fn default_arrow_size() -> u8 { 1 }
fn default_smoothing_window_size() -> usize { 1 }
fn default_velocity_arrow() -> ArrowConfig { ArrowConfig::with_color(VELOCITY_COLOR) }
fn default_acceleration_arrow() -> ArrowConfig { ArrowConfig::with_color(ACCELERATION_COLOR) }

pub const VELOCITY_COLOR: [f32; 4] = [1.0, 1.0, 0.0, 1.0];
pub const ACCELERATION_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

impl ArrowConfig {
    fn with_color(color: [f32; 4]) -> Self {
        Self {
            enabled: false,
            scaling_enabled: false,
            arrow_size: default_arrow_size(),
            smoothing_window_size: default_smoothing_window_size(),
            color: Some(color),
        }
    }

    /// 範囲外の値は範囲内に丸める
    pub fn to_setting(&self, default_color: [f32; 4]) -> UserArrowSetting {
        let mut setting = UserArrowSetting::new(self.color.unwrap_or(default_color));
        setting.enabled = self.enabled;
        setting.scaling_enabled = self.scaling_enabled;
        setting.arrow_size = self
            .arrow_size
            .clamp(*ARROW_SIZE_RANGE.start(), *ARROW_SIZE_RANGE.end());
        setting.smoothing_window_size = self
            .smoothing_window_size
            .clamp(*SMOOTHING_WINDOW_RANGE.start(), *SMOOTHING_WINDOW_RANGE.end());
        setting
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default)]
    pub mesh: MeshState,
    /// 関節マーカーの大きさ 1..=5 (点サイズ = 4 + joint_size)
    #[serde(default = "default_joint_size")]
    pub joint_size: u8,
}

fn default_joint_size() -> u8 { 1 }

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mesh: MeshState::default(),
            joint_size: default_joint_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MotionEntry {
    pub name: String,
    /// 速度矢印の正規化基準 (units/s)
    pub max_velocity: f64,
    /// 加速度矢印の正規化基準 (units/s^2)
    pub max_acceleration: f64,
    /// データセットファイル
    pub path: String,
}

impl MotionEntry {
    pub fn info(&self) -> MotionInfo {
        MotionInfo::new(self.name.clone(), self.max_velocity, self.max_acceleration)
    }
}

fn motion_entry(name: &str, max_velocity: f64, max_acceleration: f64, path: &str) -> MotionEntry {
    MotionEntry {
        name: name.to_string(),
        max_velocity,
        max_acceleration,
        path: path.to_string(),
    }
}

fn default_motions() -> Vec<MotionEntry> {
    vec![
        motion_entry("Dance", 5.34, 489.42, "./dataset/05_03_stageii.npz"),
        motion_entry("Walking", 5.7, 222.7, "./dataset/02_02_stageii.npz"),
        motion_entry("Running", 6.5, 165.407, "./dataset/02_03_stageii.npz"),
        motion_entry("Star jump", 4.0, 144.7, "./dataset/Subject_2_F_2_stageii.npz"),
        motion_entry("Basketball - walking dribble", 6.3, 947.0, "./dataset/06_03_stageii.npz"),
        motion_entry("Basketball - side hop dribble", 5.2, 374.4, "./dataset/06_09_stageii.npz"),
        motion_entry("Basketball - jump shoot", 4.3, 365.7, "./dataset/06_14_stageii.npz"),
        motion_entry("Basketball - jump shoot 2", 5.7, 619.2, "./dataset/06_15_stageii.npz"),
        motion_entry("Football", 11.7, 514.6, "./dataset/10_05_stageii.npz"),
        motion_entry("Chicken Wings", 4.8, 295.7, "./dataset/50002_chicken_wings_stageii.npz"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            arrows: ArrowsConfig::default(),
            display: DisplayConfig::default(),
            motions: default_motions(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// 読めなければ既定値
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("config: {:#}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn arrow_setting(&self, kind: ArrowKind) -> UserArrowSetting {
        match kind {
            ArrowKind::Velocity => self.arrows.velocity.to_setting(VELOCITY_COLOR),
            ArrowKind::Acceleration => self.arrows.acceleration.to_setting(ACCELERATION_COLOR),
        }
    }

    /// 関節マーカーの大きさ（1..=5 に丸める）
    pub fn joint_size(&self) -> u8 {
        self.display.joint_size.clamp(1, 5)
    }

    pub fn find_motion(&self, name: &str) -> Option<&MotionEntry> {
        self.motions.iter().find(|m| m.name == name)
    }
}
