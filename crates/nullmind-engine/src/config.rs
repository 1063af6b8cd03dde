//! Engine configuration.
//!
//! [`EngineConfig`] is plain serde data, usually loaded from a JSON file:
//!
//! ```
//! use nullmind_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "seed": 7, "max_frames": 600 }"#).unwrap();
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.screen_width, 1280); // omitted fields take defaults
//! ```

use std::path::Path;

use nullmind_core::collision::MAX_COLLIDABLES;
use nullmind_core::time::DEFAULT_MAX_DELTA_SECONDS;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Procedural map parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Width and height of the chunk grid.
    pub size_chunks: usize,
    /// Number of random-walk iterations of the main path.
    pub branch_steps: u32,
    /// Normal rooms are `2 * RandInt(min_room_half, max_room_half)` tiles
    /// on a side.
    pub min_room_half: i32,
    pub max_room_half: i32,
    /// Enemy budget range for each normal room.
    pub enemies_min: i32,
    pub enemies_max: i32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            size_chunks: crate::map::MAP_SIZE_CHUNK,
            branch_steps: 2,
            min_room_half: 10,
            max_room_half: 15,
            enemies_min: 10,
            enemies_max: 20,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window_title: String,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Raw frame delta used by [`App::run`](crate::app::App::run) and
    /// [`App::run_frames`](crate::app::App::run_frames). Must be positive and
    /// finite.
    pub fixed_dt: f32,
    /// Upper bound on the simulation delta of a single frame.
    pub max_delta_seconds: f32,
    pub collider_capacity: usize,
    /// Seed for the game RNG.
    pub seed: u64,
    /// Stop [`App::run`](crate::app::App::run) after this many frames.
    pub max_frames: Option<u64>,
    pub map: MapConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_title: "Operation Null Mind".to_owned(),
            screen_width: 1280,
            screen_height: 720,
            fixed_dt: 1.0 / 60.0,
            max_delta_seconds: DEFAULT_MAX_DELTA_SECONDS,
            collider_capacity: MAX_COLLIDABLES,
            seed: 0,
            max_frames: None,
            map: MapConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration. Missing fields take their
    /// default values.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.fixed_dt > 0.0 && self.fixed_dt.is_finite()) {
            return Err(EngineError::InvalidConfig(format!(
                "fixed_dt must be positive and finite, got {}",
                self.fixed_dt
            )));
        }
        if !(self.max_delta_seconds > 0.0 && self.max_delta_seconds.is_finite()) {
            return Err(EngineError::InvalidConfig(format!(
                "max_delta_seconds must be positive and finite, got {}",
                self.max_delta_seconds
            )));
        }
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "screen size must be non-zero, got {}x{}",
                self.screen_width, self.screen_height
            )));
        }
        if self.collider_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "collider_capacity must be non-zero".to_owned(),
            ));
        }
        self.map.validate()
    }
}

impl MapConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        // The end room needs a quadrant of its own past the centre.
        if self.size_chunks < 3 {
            return Err(EngineError::InvalidConfig(format!(
                "map size_chunks must be at least 3, got {}",
                self.size_chunks
            )));
        }
        let max_half = (crate::map::CHUNK_SIZE_TILE as i32 - 6) / 2;
        if self.min_room_half < 3
            || self.min_room_half > self.max_room_half
            || self.max_room_half > max_half
        {
            return Err(EngineError::InvalidConfig(format!(
                "room half size range {}..={} must lie within 3..={max_half}",
                self.min_room_half, self.max_room_half
            )));
        }
        if self.enemies_min < 0 || self.enemies_min > self.enemies_max {
            return Err(EngineError::InvalidConfig(format!(
                "enemy range {}..={} is invalid",
                self.enemies_min, self.enemies_max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.collider_capacity, MAX_COLLIDABLES);
        assert_eq!(config.map.size_chunks, 5);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{ "seed": 99, "map": { "branch_steps": 4 } }"#).unwrap();
        assert_eq!(config.seed, 99);
        assert_eq!(config.map.branch_steps, 4);
        assert_eq!(config.map.min_room_half, 10);
        assert_eq!(config.screen_height, 720);
    }

    #[test]
    fn zero_dt_is_rejected() {
        let err = EngineConfig::from_json_str(r#"{ "fixed_dt": 0.0 }"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
        assert!(err.to_string().contains("fixed_dt"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = EngineConfig {
            collider_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_rooms_are_rejected() {
        let mut config = EngineConfig::default();
        config.map.max_room_half = 40;
        assert!(config.validate().is_err());
    }

    #[test]
    fn tiny_map_is_rejected() {
        let err = EngineConfig::from_json_str(r#"{ "map": { "size_chunks": 2 } }"#).unwrap_err();
        assert!(err.to_string().contains("size_chunks"));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, EngineError::ConfigParse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::load("/nonexistent/nullmind.json").unwrap_err();
        assert!(matches!(err, EngineError::ConfigIo { .. }));
    }
}
