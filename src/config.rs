//! Scene configuration.
//!
//! A `SceneConfig` is an immutable description of how the scene should look.
//! Runtime toggles never poke at GPU objects directly: they produce a new
//! config, and the renderer re-derives its render graph from it.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::geometry::constants::*;
use crate::geometry::GridSize;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "KLEIN_ORBIT_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    /// Colour from the view-independent surface normal.
    Normal,
    /// Lambert + Blinn-Phong, lit by the orbiters and an ambient term.
    Lit,
    /// Unlit surface colour.
    Flat,
}

impl MaterialKind {
    pub fn next(self) -> Self {
        match self {
            MaterialKind::Normal => MaterialKind::Lit,
            MaterialKind::Lit => MaterialKind::Flat,
            MaterialKind::Flat => MaterialKind::Normal,
        }
    }

    /// Discriminant handed to the surface shader.
    pub fn shader_index(self) -> u32 {
        match self {
            MaterialKind::Normal => 0,
            MaterialKind::Lit => 1,
            MaterialKind::Flat => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneMapping {
    None,
    Linear,
    Reinhard,
    Aces,
}

impl ToneMapping {
    pub fn next(self) -> Self {
        match self {
            ToneMapping::None => ToneMapping::Linear,
            ToneMapping::Linear => ToneMapping::Reinhard,
            ToneMapping::Reinhard => ToneMapping::Aces,
            ToneMapping::Aces => ToneMapping::None,
        }
    }

    pub fn shader_index(self) -> u32 {
        match self {
            ToneMapping::None => 0,
            ToneMapping::Linear => 1,
            ToneMapping::Reinhard => 2,
            ToneMapping::Aces => 3,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("tessellation grid must be non-empty, got {slices}x{stacks}")]
    EmptyGrid { slices: u32, stacks: u32 },
    #[error("exposure must be positive and finite, got {0}")]
    Exposure(f32),
    #[error("orbit step must be non-negative and finite, got {0}")]
    OrbitStep(f64),
    #[error("phase spacing must be finite, got {0}")]
    PhaseSpacing(f64),
    #[error("at most {max} orbiters are supported, got {requested}")]
    TooManyOrbiters { requested: u32, max: u32 },
    #[error("orbiter palette must contain at least one colour")]
    EmptyPalette,
    #[error("{name} must be non-negative and finite, got {value}")]
    Intensity { name: &'static str, value: f32 },
    #[error("rotation speed must be finite, got {0}")]
    RotationSpeed(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub material: MaterialKind,
    pub double_sided: bool,
    pub tone_mapping: ToneMapping,
    pub exposure: f32,
    pub orbiter_lights: bool,
    pub ambient_intensity: f32,
    pub light_intensity: f32,
    pub orbiter_count: u32,
    pub phase_spacing: f64,
    pub orbiter_palette: Vec<[f32; 3]>,
    pub slices: u32,
    pub stacks: u32,
    pub orbit_step: f64,
    pub rotation_speed: f32,
    pub show_hud: bool,
    pub surface_color: [f32; 3],
    pub sky_top: [f32; 3],
    pub sky_bottom: [f32; 3],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            material: MaterialKind::Normal,
            double_sided: true,
            tone_mapping: ToneMapping::Aces,
            exposure: 1.0,
            orbiter_lights: true,
            ambient_intensity: 0.15,
            light_intensity: 40.0,
            orbiter_count: DEFAULT_ORBITER_COUNT,
            phase_spacing: DEFAULT_PHASE_SPACING,
            orbiter_palette: vec![
                [1.0, 0.45, 0.2],
                [0.3, 0.8, 1.0],
                [1.0, 0.9, 0.35],
                [0.75, 0.4, 1.0],
                [0.4, 1.0, 0.55],
            ],
            slices: DEFAULT_SLICES,
            stacks: DEFAULT_STACKS,
            orbit_step: DEFAULT_ORBIT_STEP,
            rotation_speed: DEFAULT_ROTATION_SPEED,
            show_hud: true,
            surface_color: [0.55, 0.6, 0.75],
            sky_top: [0.02, 0.03, 0.08],
            sky_bottom: [0.12, 0.08, 0.18],
        }
    }
}

impl SceneConfig {
    /// Load and validate a JSON config. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: SceneConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json).context("Failed to write config file")?;
        Ok(())
    }

    /// Resolve the config from an explicit path, then `KLEIN_ORBIT_CONFIG`,
    /// falling back to defaults.
    pub fn resolve(cli_path: Option<&str>) -> Result<Self> {
        Self::resolve_from(cli_path, std::env::var(CONFIG_ENV_VAR).ok())
    }

    /// Same as [`SceneConfig::resolve`] with the environment value passed in.
    pub fn resolve_from(cli_path: Option<&str>, env_path: Option<String>) -> Result<Self> {
        match cli_path.map(str::to_owned).or(env_path) {
            Some(path) => {
                log::info!("Loading scene config from {path}");
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slices == 0 || self.stacks == 0 {
            return Err(ConfigError::EmptyGrid {
                slices: self.slices,
                stacks: self.stacks,
            });
        }
        if !(self.exposure.is_finite() && self.exposure > 0.0) {
            return Err(ConfigError::Exposure(self.exposure));
        }
        for (name, value) in [
            ("ambient_intensity", self.ambient_intensity),
            ("light_intensity", self.light_intensity),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Intensity { name, value });
            }
        }
        if !self.rotation_speed.is_finite() {
            return Err(ConfigError::RotationSpeed(self.rotation_speed));
        }
        if !(self.orbit_step.is_finite() && self.orbit_step >= 0.0) {
            return Err(ConfigError::OrbitStep(self.orbit_step));
        }
        if !self.phase_spacing.is_finite() {
            return Err(ConfigError::PhaseSpacing(self.phase_spacing));
        }
        if self.orbiter_count > MAX_ORBITERS {
            return Err(ConfigError::TooManyOrbiters {
                requested: self.orbiter_count,
                max: MAX_ORBITERS,
            });
        }
        if self.orbiter_palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        Ok(())
    }

    pub fn grid(&self) -> Result<GridSize, ConfigError> {
        GridSize::new(self.slices, self.stacks).map_err(|_| ConfigError::EmptyGrid {
            slices: self.slices,
            stacks: self.stacks,
        })
    }

    /// Phase offsets `0, s, 2s, ...` for every orbiter.
    pub fn phase_offsets(&self) -> Vec<f64> {
        (0..self.orbiter_count)
            .map(|i| i as f64 * self.phase_spacing)
            .collect()
    }

    pub fn orbiter_color(&self, index: usize) -> [f32; 3] {
        self.orbiter_palette
            .get(index % self.orbiter_palette.len().max(1))
            .copied()
            .unwrap_or([1.0; 3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.phase_offsets().len(), 5);
        assert_eq!(config.grid().unwrap(), GridSize { slices: 80, stacks: 40 });
    }

    #[test]
    fn test_phase_offsets_are_spaced() {
        let config = SceneConfig::default();
        let offsets = config.phase_offsets();
        for (i, pair) in offsets.windows(2).enumerate() {
            assert!((pair[1] - pair[0] - 0.3).abs() < 1e-12, "gap {i}");
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SceneConfig =
            serde_json::from_str(r#"{ "material": "lit", "orbiter_count": 3 }"#).unwrap();
        assert_eq!(config.material, MaterialKind::Lit);
        assert_eq!(config.orbiter_count, 3);
        assert_eq!(config.tone_mapping, ToneMapping::Aces);
        assert_eq!(config.slices, DEFAULT_SLICES);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = SceneConfig::default();
        config.slices = 0;
        assert!(matches!(config.validate(), Err(ConfigError::EmptyGrid { .. })));

        let mut config = SceneConfig::default();
        config.exposure = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::Exposure(0.0)));

        let mut config = SceneConfig::default();
        config.orbit_step = -0.1;
        assert!(matches!(config.validate(), Err(ConfigError::OrbitStep(_))));

        let mut config = SceneConfig::default();
        config.orbiter_count = MAX_ORBITERS + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooManyOrbiters { .. })
        ));

        let mut config = SceneConfig::default();
        config.orbiter_palette.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyPalette));
    }

    #[test]
    fn test_validation_rejects_bad_lighting() {
        let mut config = SceneConfig::default();
        config.ambient_intensity = -0.5;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Intensity {
                name: "ambient_intensity",
                value: -0.5
            })
        );

        let mut config = SceneConfig::default();
        config.light_intensity = f32::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Intensity {
                name: "light_intensity",
                ..
            })
        ));

        let mut config = SceneConfig::default();
        config.rotation_speed = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::RotationSpeed(_))));

        let mut config = SceneConfig::default();
        config.ambient_intensity = 0.0;
        config.light_intensity = 0.0;
        config.rotation_speed = -0.01;
        assert!(config.validate().is_ok());
    }

    fn write_config(dir: &Path, name: &str, config: &SceneConfig) -> String {
        let path = dir.join(name);
        config.save(&path).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_resolve_prefers_cli_path() {
        let dir = tempdir().unwrap();
        let mut cli = SceneConfig::default();
        cli.material = MaterialKind::Flat;
        let mut env = SceneConfig::default();
        env.material = MaterialKind::Lit;
        let cli_path = write_config(dir.path(), "cli.json", &cli);
        let env_path = write_config(dir.path(), "env.json", &env);

        let resolved = SceneConfig::resolve_from(Some(&cli_path), Some(env_path)).unwrap();
        assert_eq!(resolved, cli);
    }

    #[test]
    fn test_resolve_uses_env_without_cli() {
        let dir = tempdir().unwrap();
        let mut env = SceneConfig::default();
        env.tone_mapping = ToneMapping::Reinhard;
        let env_path = write_config(dir.path(), "env.json", &env);

        let resolved = SceneConfig::resolve_from(None, Some(env_path)).unwrap();
        assert_eq!(resolved, env);
    }

    #[test]
    fn test_resolve_defaults_when_unset() {
        let resolved = SceneConfig::resolve_from(None, None).unwrap();
        assert_eq!(resolved, SceneConfig::default());
    }

    #[test]
    fn test_resolve_bad_env_path_is_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json").to_string_lossy().into_owned();
        assert!(SceneConfig::resolve_from(None, Some(missing)).is_err());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        let bad = bad.to_string_lossy().into_owned();
        assert!(SceneConfig::resolve_from(None, Some(bad)).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scene.json");

        let mut config = SceneConfig::default();
        config.material = MaterialKind::Flat;
        config.tone_mapping = ToneMapping::Reinhard;
        config.save(&path).unwrap();

        let loaded = SceneConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "stacks": 0 }"#).unwrap();
        assert!(SceneConfig::load(&path).is_err());

        std::fs::write(&path, "not json").unwrap();
        assert!(SceneConfig::load(&path).is_err());

        assert!(SceneConfig::load(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_toggles_cycle() {
        let mut m = MaterialKind::Normal;
        for _ in 0..3 {
            m = m.next();
        }
        assert_eq!(m, MaterialKind::Normal);

        let mut t = ToneMapping::None;
        for _ in 0..4 {
            t = t.next();
        }
        assert_eq!(t, ToneMapping::None);
    }

    #[test]
    fn test_palette_wraps() {
        let config = SceneConfig::default();
        assert_eq!(config.orbiter_color(5), config.orbiter_color(0));
    }
}
