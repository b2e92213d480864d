//! Bridge configuration.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::parameters::ParameterTable;

/// Renderer handle handed to hosts until real renderers exist.
pub const DEFAULT_RENDERER_SENTINEL: usize = 0x8765_4321;

/// Configuration for the bridge. Every field has a default so hosts can pass
/// partial JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Value returned by `create_renderer`; must be non-zero.
    pub renderer_sentinel: usize,

    /// Parse `*.model3.json`, check referenced files and load the moc on `load_model`.
    /// Off by default: paths are accepted as-is.
    pub validate_manifests: bool,

    pub allocator: AllocatorCfg,
    pub motion: MotionCfg,

    /// Known parameter ids and their clamp ranges.
    pub parameters: ParameterTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            renderer_sentinel: DEFAULT_RENDERER_SENTINEL,
            validate_manifests: false,
            allocator: AllocatorCfg::default(),
            motion: MotionCfg::default(),
            parameters: ParameterTable::standard(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorCfg {
    /// Block bookkeeping entries reserved up front when the allocator is created.
    pub initial_capacity: usize,
    /// Upper bound on live bytes; `None` means unbounded.
    pub max_bytes: Option<usize>,
}

impl Default for AllocatorCfg {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            max_bytes: None,
        }
    }
}

/// Motion timing used while no real motion data is loaded.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionCfg {
    /// Exact group-name durations in seconds.
    pub durations: HashMap<String, f32>,
    /// Fallback for groups without an exact or pattern match.
    pub default_duration: f32,
    /// Idle groups (`idle*`) restart instead of finishing.
    pub loop_idle: bool,
}

impl Default for MotionCfg {
    fn default() -> Self {
        let mut durations = HashMap::new();
        durations.insert("idle".to_string(), 3.0);
        durations.insert("idle_02".to_string(), 4.0);
        Self {
            durations,
            default_duration: 2.0,
            loop_idle: true,
        }
    }
}

impl MotionCfg {
    /// Duration in seconds for a motion group.
    pub fn duration_for(&self, group: &str) -> f32 {
        if let Some(d) = self.durations.get(group) {
            return *d;
        }
        if group.contains("tap") {
            2.0
        } else if group.contains("flick") {
            1.5
        } else {
            self.default_duration
        }
    }

    pub fn loops(&self, group: &str) -> bool {
        self.loop_idle && group.to_ascii_lowercase().starts_with("idle")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "validate_manifests": true }"#).unwrap();
        assert!(cfg.validate_manifests);
        assert_eq!(cfg.renderer_sentinel, DEFAULT_RENDERER_SENTINEL);
        assert_eq!(cfg.allocator.initial_capacity, 64);
        assert!(cfg.parameters.get("ParamAngleX").is_some());
    }

    #[test]
    fn motion_durations() {
        let m = MotionCfg::default();
        assert_eq!(m.duration_for("idle"), 3.0);
        assert_eq!(m.duration_for("idle_02"), 4.0);
        assert_eq!(m.duration_for("tap_body"), 2.0);
        assert_eq!(m.duration_for("flick_head"), 1.5);
        assert_eq!(m.duration_for("greeting"), 2.0);
        assert!(m.loops("Idle"));
        assert!(!m.loops("tap_body"));
    }
}
