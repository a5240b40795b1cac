//! Configuration for clustering, cluster queries and viewport tracking.
//!
//! Every field has a serde default, so partial JSON/TOML documents are
//! accepted and an empty document yields [`Config::default`].

use crate::error::{Result, ShopMapError};
use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Largest `max_zoom` the cluster id encoding supports comfortably.
pub const MAX_CLUSTER_ZOOM: u8 = 24;

/// Parameters of the point clustering index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Cluster radius in pixels of a tile of `extent` size
    #[serde(default = "ClusterConfig::default_radius")]
    pub radius: f64,

    /// Tile extent the radius is measured against
    #[serde(default = "ClusterConfig::default_extent")]
    pub extent: f64,

    /// Lowest zoom that gets its own cluster level
    #[serde(default)]
    pub min_zoom: u8,

    /// Highest zoom at which points are still clustered
    #[serde(default = "ClusterConfig::default_max_zoom")]
    pub max_zoom: u8,

    /// Minimum number of points that form a cluster
    #[serde(default = "ClusterConfig::default_min_points")]
    pub min_points: usize,
}

impl ClusterConfig {
    const fn default_radius() -> f64 {
        220.0
    }

    const fn default_extent() -> f64 {
        512.0
    }

    const fn default_max_zoom() -> u8 {
        15
    }

    const fn default_min_points() -> usize {
        5
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err("Cluster radius must be a positive finite number".to_string());
        }
        if !self.extent.is_finite() || self.extent <= 0.0 {
            return Err("Tile extent must be a positive finite number".to_string());
        }
        if self.min_zoom > self.max_zoom {
            return Err(format!(
                "min_zoom ({}) must not exceed max_zoom ({})",
                self.min_zoom, self.max_zoom
            ));
        }
        if self.max_zoom > MAX_CLUSTER_ZOOM {
            return Err(format!("max_zoom must be at most {}", MAX_CLUSTER_ZOOM));
        }
        if self.min_points < 2 {
            return Err("min_points must be at least 2".to_string());
        }
        Ok(())
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius: Self::default_radius(),
            extent: Self::default_extent(),
            min_zoom: 0,
            max_zoom: Self::default_max_zoom(),
            min_points: Self::default_min_points(),
        }
    }
}

/// Limits applied when answering cluster queries and expansion clicks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Maximum number of features returned below `cap_below_zoom`
    #[serde(default = "QueryConfig::default_feature_cap")]
    pub feature_cap: usize,

    #[serde(default = "QueryConfig::default_cap_below_zoom")]
    pub cap_below_zoom: u8,

    /// Upper bound for the zoom a cluster click may jump to
    #[serde(default = "QueryConfig::default_max_expansion_zoom")]
    pub max_expansion_zoom: u8,

    /// Zoom increment used when a cluster id cannot be resolved
    #[serde(default = "QueryConfig::default_fallback_zoom_step")]
    pub fallback_zoom_step: u8,
}

impl QueryConfig {
    const fn default_feature_cap() -> usize {
        1000
    }

    const fn default_cap_below_zoom() -> u8 {
        8
    }

    const fn default_max_expansion_zoom() -> u8 {
        17
    }

    const fn default_fallback_zoom_step() -> u8 {
        2
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.feature_cap == 0 {
            return Err("feature_cap must be greater than zero".to_string());
        }
        if self.max_expansion_zoom == 0 {
            return Err("max_expansion_zoom must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            feature_cap: Self::default_feature_cap(),
            cap_below_zoom: Self::default_cap_below_zoom(),
            max_expansion_zoom: Self::default_max_expansion_zoom(),
            fallback_zoom_step: Self::default_fallback_zoom_step(),
        }
    }
}

/// Debounce and refetch thresholds of the viewport tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Quiet period after the last qualifying move before a fetch fires
    #[serde(default = "TrackerConfig::default_debounce_ms")]
    pub debounce_ms: u64,

    /// Center movement (degrees, either axis) that counts as a move
    #[serde(default = "TrackerConfig::default_move_threshold")]
    pub move_threshold_deg: f64,

    /// Below this zoom no shop data is requested
    #[serde(default = "TrackerConfig::default_min_fetch_zoom")]
    pub min_fetch_zoom: u8,
}

impl TrackerConfig {
    const fn default_debounce_ms() -> u64 {
        500
    }

    const fn default_move_threshold() -> f64 {
        0.001
    }

    const fn default_min_fetch_zoom() -> u8 {
        7
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = debounce.as_millis() as u64;
        self
    }

    pub fn with_min_fetch_zoom(mut self, zoom: u8) -> Self {
        self.min_fetch_zoom = zoom;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.move_threshold_deg.is_finite() || self.move_threshold_deg < 0.0 {
            return Err("move_threshold_deg must be a non-negative finite number".to_string());
        }
        Ok(())
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: Self::default_debounce_ms(),
            move_threshold_deg: Self::default_move_threshold(),
            min_fetch_zoom: Self::default_min_fetch_zoom(),
        }
    }
}

/// Complete configuration of a map session.
///
/// # Example
///
/// ```rust
/// use shopmap::Config;
///
/// let json = r#"{
///     "cluster": { "radius": 120, "min_points": 3 },
///     "tracker": { "debounce_ms": 250 }
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.cluster.min_points, 3);
/// assert_eq!(config.cluster.max_zoom, 15);
/// assert_eq!(config.query.feature_cap, 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
}

impl Config {
    pub fn with_cluster(mut self, cluster: ClusterConfig) -> Self {
        self.cluster = cluster;
        self
    }

    pub fn with_query(mut self, query: QueryConfig) -> Self {
        self.query = query;
        self
    }

    pub fn with_tracker(mut self, tracker: TrackerConfig) -> Self {
        self.tracker = tracker;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.cluster.validate()?;
        self.query.validate()?;
        self.tracker.validate()
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Read a configuration file, picking the format from its extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            #[cfg(feature = "toml")]
            Some("toml") => {
                Self::from_toml(&contents).map_err(|e| ShopMapError::Config(e.to_string()))
            }
            #[cfg(not(feature = "toml"))]
            Some("toml") => Err(ShopMapError::Config(
                "TOML configuration requires the `toml` feature".to_string(),
            )),
            _ => Self::from_json(&contents).map_err(|e| ShopMapError::Config(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_map_tuning() {
        let config = Config::default();
        assert_eq!(config.cluster.radius, 220.0);
        assert_eq!(config.cluster.max_zoom, 15);
        assert_eq!(config.cluster.min_zoom, 0);
        assert_eq!(config.cluster.min_points, 5);
        assert_eq!(config.cluster.extent, 512.0);
        assert_eq!(config.query.feature_cap, 1000);
        assert_eq!(config.query.cap_below_zoom, 8);
        assert_eq!(config.query.max_expansion_zoom, 17);
        assert_eq!(config.tracker.debounce(), Duration::from_millis(500));
        assert_eq!(config.tracker.min_fetch_zoom, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_json_is_default() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_json(r#"{"cluster": {"min_points": 1}}"#).is_err());
        assert!(Config::from_json(r#"{"cluster": {"min_zoom": 10, "max_zoom": 5}}"#).is_err());
        assert!(Config::from_json(r#"{"cluster": {"radius": -3}}"#).is_err());
        assert!(Config::from_json(r#"{"query": {"feature_cap": 0}}"#).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = Config::default()
            .with_tracker(TrackerConfig::default().with_debounce(Duration::from_millis(300)));
        let json = config.to_json().unwrap();
        let loaded = Config::from_json(&json).unwrap();
        assert_eq!(loaded.tracker.debounce_ms, 300);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"query": {{"max_expansion_zoom": 18}}}}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.query.max_expansion_zoom, 18);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Config::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ShopMapError::Io(_)));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_roundtrip() {
        let toml_str = "[cluster]\nradius = 80.0\n\n[tracker]\nmin_fetch_zoom = 9\n";
        let config = Config::from_toml(toml_str).unwrap();
        assert_eq!(config.cluster.radius, 80.0);
        assert_eq!(config.tracker.min_fetch_zoom, 9);

        let back = Config::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
