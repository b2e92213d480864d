//! Bridge: lifecycle state and the operations a host drives a character with.
//!
//! Methods:
//! - create_allocator, initialize, dispose (lifecycle)
//! - load_model, create_renderer, update_model, render_model
//! - play_motion, set_expression, set_parameter (per-model requests)
//! - is_model_loaded, model_data, parameter (queries)
//!
//! State machine: UNINITIALIZED → INITIALIZED (initialize) → UNINITIALIZED (dispose).
//! At most one model is live; loading another releases the previous one and its
//! handle goes stale.

use std::fmt;
use std::fs;
use std::path::Path;

use log::{debug, info, trace, warn};

use crate::allocator::{AlignedBlock, AllocatorStats, BridgeAllocator, MOC_ALIGNMENT};
use crate::config::{Config, DEFAULT_RENDERER_SENTINEL};
use crate::core_sdk::CubismCore;
use crate::error::{BridgeError, ManifestError, Result};
use crate::ids::{AllocatorId, DeviceHandle, IdAllocator, ModelId, RendererId};
use crate::manifest::ModelManifest;
use crate::model::{ActiveMotion, ModelSnapshot, ModelState};
use crate::table::ModelTable;
use crate::version::CoreVersion;

const MOC_MAGIC: &[u8; 4] = b"MOC3";

pub struct Bridge {
    cfg: Config,
    core: Box<dyn CubismCore>,
    ids: IdAllocator,
    allocator: Option<(AllocatorId, BridgeAllocator)>,
    initialized: bool,
    version: Option<CoreVersion>,
    models: ModelTable<ModelState>,
    current: Option<ModelId>,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("initialized", &self.initialized)
            .field("version", &self.version)
            .field("allocator", &self.allocator.as_ref().map(|(id, _)| *id))
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

fn sanitize(mut cfg: Config) -> Config {
    if cfg.renderer_sentinel == 0 {
        warn!("renderer_sentinel must be non-zero; using default");
        cfg.renderer_sentinel = DEFAULT_RENDERER_SENTINEL;
    }
    cfg
}

fn require_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BridgeError::invalid(format!("{kind} must not be empty")));
    }
    Ok(())
}

/// Check the moc3 header: `MOC3` magic followed by the format version byte.
fn check_moc(bytes: &[u8], latest: u32) -> Result<()> {
    if bytes.len() < 5 || &bytes[..4] != MOC_MAGIC {
        return Err(BridgeError::InvalidMoc("missing MOC3 header".into()));
    }
    let version = bytes[4] as u32;
    if version == 0 || version > latest {
        return Err(BridgeError::InvalidMoc(format!(
            "moc version {version} unsupported (core supports up to {latest})"
        )));
    }
    Ok(())
}

impl Bridge {
    pub fn new(cfg: Config, core: Box<dyn CubismCore>) -> Self {
        Self {
            cfg: sanitize(cfg),
            core,
            ids: IdAllocator::new(),
            allocator: None,
            initialized: false,
            version: None,
            models: ModelTable::new(),
            current: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Replace the configuration. Only allowed while not initialized.
    pub fn set_config(&mut self, cfg: Config) -> Result<()> {
        if self.initialized {
            return Err(BridgeError::AlreadyInitialized);
        }
        if cfg.renderer_sentinel == 0 {
            return Err(BridgeError::invalid("renderer_sentinel must be non-zero"));
        }
        self.cfg = cfg;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Core version recorded by the last successful initialize.
    pub fn version(&self) -> Option<CoreVersion> {
        self.version
    }

    pub fn allocator_id(&self) -> Option<AllocatorId> {
        self.allocator.as_ref().map(|(id, _)| *id)
    }

    pub fn allocator_stats(&self) -> Option<AllocatorStats> {
        self.allocator.as_ref().map(|(_, a)| a.stats())
    }

    pub fn current_model(&self) -> Option<ModelId> {
        self.current
    }

    /// Create the bridge allocator. A previous allocator is released and its
    /// handle stops being accepted by `initialize`.
    pub fn create_allocator(&mut self) -> Result<AllocatorId> {
        let allocator = BridgeAllocator::new(&self.cfg.allocator)?;
        let id = self.ids.alloc_allocator();
        if let Some((old, _)) = self.allocator.replace((id, allocator)) {
            warn!("allocator {:?} replaced by {:?}", old, id);
        }
        info!("allocator {:?} created", id);
        Ok(id)
    }

    /// Query the core version and open the gate for model operations.
    /// Calling it again while initialized is rejected without touching the core.
    pub fn initialize(&mut self, allocator: Option<AllocatorId>) -> Result<CoreVersion> {
        let Some(allocator) = allocator else {
            return Err(BridgeError::invalid("allocator handle is null"));
        };
        if self.initialized {
            return Err(BridgeError::AlreadyInitialized);
        }
        if self.allocator_id() != Some(allocator) {
            return Err(BridgeError::invalid(format!(
                "allocator {allocator:?} is not the current allocator"
            )));
        }

        let version = CoreVersion::from_raw(self.core.version());
        info!("Cubism Core version {version}");
        self.version = Some(version);
        self.initialized = true;
        info!("framework initialized");
        Ok(version)
    }

    /// Tear everything down. Returns false (and does nothing) when not initialized.
    pub fn dispose(&mut self) -> bool {
        if !self.initialized {
            return false;
        }
        self.models.clear();
        self.current = None;
        // models (and their moc blocks) go first so the allocator sees no live blocks
        self.allocator = None;
        self.initialized = false;
        info!("framework disposed");
        true
    }

    /// Load a model. The previous model, if any, is released first.
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> Result<ModelId> {
        if !self.initialized {
            return Err(BridgeError::NotInitialized);
        }
        let path = path.as_ref();
        info!("loading model {}", path.display());

        let mut state = ModelState::new(path.to_path_buf(), &self.cfg.parameters);
        if self.cfg.validate_manifests {
            let (manifest, moc) = self.read_model_files(path)?;
            state.manifest = Some(manifest);
            state.moc = Some(moc);
        }

        if let Some(prev) = self.current.take() {
            self.models.remove(prev);
            debug!("released previous model {:?}", prev);
        }
        let id = self.models.insert(state);
        self.current = Some(id);
        info!("model loaded {} as {:?}", path.display(), id);
        Ok(id)
    }

    fn read_model_files(&self, path: &Path) -> Result<(ModelManifest, AlignedBlock)> {
        let manifest = ModelManifest::from_file(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let missing = manifest.missing_files(base);
        if !missing.is_empty() {
            return Err(BridgeError::MissingFiles(missing));
        }

        let moc_path = manifest.moc_path(base);
        let bytes = fs::read(&moc_path).map_err(|source| ManifestError::Io {
            path: moc_path.clone(),
            source,
        })?;
        check_moc(&bytes, self.core.latest_moc_version())?;

        let (_, allocator) = self
            .allocator
            .as_ref()
            .ok_or_else(|| BridgeError::AllocationFailed("no allocator".into()))?;
        let mut block = allocator.allocate_aligned(bytes.len(), MOC_ALIGNMENT)?;
        block.as_mut_slice().copy_from_slice(&bytes);
        debug!("moc {} loaded ({} bytes)", moc_path.display(), bytes.len());
        Ok((manifest, block))
    }

    /// Always the configured sentinel; the device is not inspected.
    pub fn create_renderer(&self, device: Option<DeviceHandle>) -> RendererId {
        debug!("renderer requested for device {:?}", device);
        RendererId(self.cfg.renderer_sentinel)
    }

    fn live_model(&self, model: ModelId) -> Result<&ModelState> {
        if !self.initialized {
            return Err(BridgeError::NotInitialized);
        }
        self.models.get(model).ok_or(BridgeError::StaleHandle)
    }

    fn live_model_mut(&mut self, model: ModelId) -> Result<&mut ModelState> {
        if !self.initialized {
            return Err(BridgeError::NotInitialized);
        }
        self.models.get_mut(model).ok_or(BridgeError::StaleHandle)
    }

    /// Advance the model clock and active motion by `dt` seconds.
    pub fn update_model(&mut self, model: ModelId, dt: f32) -> Result<()> {
        let state = self.live_model_mut(model)?;
        if !dt.is_finite() || dt < 0.0 {
            return Err(BridgeError::invalid(format!("delta time {dt} must be finite and >= 0")));
        }
        state.advance(dt);
        trace!("model {:?} advanced to t={}", model, state.time);
        Ok(())
    }

    pub fn render_model(&mut self, renderer: RendererId, model: ModelId) -> Result<()> {
        let sentinel = self.cfg.renderer_sentinel;
        let state = self.live_model_mut(model)?;
        if renderer.0 != sentinel {
            return Err(BridgeError::invalid(format!("unknown renderer {:#x}", renderer.0)));
        }
        state.frames_rendered += 1;
        trace!("model {:?} render requested (frame {})", model, state.frames_rendered);
        Ok(())
    }

    /// Start motion `index` of `group`. With a manifest, the group and index must exist.
    pub fn play_motion(&mut self, model: ModelId, group: &str, index: i32) -> Result<()> {
        require_name("motion group", group)?;
        let index = u32::try_from(index)
            .map_err(|_| BridgeError::invalid(format!("motion index {index} is negative")))?;
        let duration = self.cfg.motion.duration_for(group);
        let looping = self.cfg.motion.loops(group);

        let state = self.live_model_mut(model)?;
        if let Some(manifest) = &state.manifest {
            if manifest.motion(group, index as usize).is_none() {
                return Err(BridgeError::invalid(format!("no motion {group}[{index}]")));
            }
        }
        debug!("playing motion {group}[{index}] ({duration}s)");
        state.motion = Some(ActiveMotion {
            group: group.to_string(),
            index,
            elapsed: 0.0,
            duration,
            looping,
        });
        Ok(())
    }

    pub fn set_expression(&mut self, model: ModelId, name: &str) -> Result<()> {
        require_name("expression name", name)?;
        let state = self.live_model_mut(model)?;
        if let Some(manifest) = &state.manifest {
            if !manifest.has_expression(name) {
                return Err(BridgeError::invalid(format!("no expression {name}")));
            }
        }
        debug!("setting expression {name}");
        state.expression = Some(name.to_string());
        Ok(())
    }

    /// Store a parameter value, clamped when the id has a configured range.
    pub fn set_parameter(&mut self, model: ModelId, name: &str, value: f32) -> Result<()> {
        require_name("parameter name", name)?;
        if !value.is_finite() {
            return Err(BridgeError::invalid(format!("parameter {name} value {value} is not finite")));
        }
        let applied = self.cfg.parameters.apply(name, value);
        let state = self.live_model_mut(model)?;
        debug!("setting parameter {name} = {applied}");
        state.parameters.insert(name.to_string(), applied);
        Ok(())
    }

    pub fn parameter(&self, model: ModelId, name: &str) -> Option<f32> {
        self.live_model(model)
            .ok()
            .and_then(|s| s.parameters.get(name).copied())
    }

    pub fn is_model_loaded(&self, model: ModelId) -> bool {
        self.live_model(model).is_ok()
    }

    pub fn model_data(&self, model: ModelId) -> Option<ModelSnapshot> {
        self.live_model(model).ok().map(ModelState::snapshot)
    }

    /// Manifest the model was loaded with, if manifests are validated.
    pub fn manifest(&self, model: ModelId) -> Option<&ModelManifest> {
        self.live_model(model).ok().and_then(|s| s.manifest.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_sdk::moc_version;

    #[test]
    fn moc_header_checks() {
        let mut moc = b"MOC3".to_vec();
        moc.push(moc_version::V40 as u8);
        moc.extend_from_slice(&[0; 59]);
        assert!(check_moc(&moc, moc_version::V42).is_ok());
        assert!(matches!(
            check_moc(&moc, moc_version::V33),
            Err(BridgeError::InvalidMoc(_))
        ));
        assert!(matches!(
            check_moc(b"PNG\0\x01", moc_version::V50),
            Err(BridgeError::InvalidMoc(_))
        ));
        assert!(matches!(
            check_moc(b"MOC", moc_version::V50),
            Err(BridgeError::InvalidMoc(_))
        ));
    }

    #[test]
    fn zero_sentinel_falls_back_to_default() {
        let cfg = Config {
            renderer_sentinel: 0,
            ..Config::default()
        };
        let bridge = Bridge::new(cfg, Box::new(crate::FixedCore::default()));
        assert_eq!(
            bridge.create_renderer(None),
            RendererId(DEFAULT_RENDERER_SENTINEL)
        );
    }
}
