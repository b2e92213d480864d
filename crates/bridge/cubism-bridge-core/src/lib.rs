//! Cubism Bridge Core (host-agnostic)
//!
//! Owns the lifecycle state that sits between a host UI layer and the Live2D
//! Cubism Core SDK: the allocator, the initialization gate, and the current
//! model. All state lives in an explicit [`Bridge`] context; handles are typed
//! per resource kind and model handles are generation-checked.

pub mod allocator;
pub mod bridge;
pub mod config;
pub mod core_sdk;
pub mod error;
pub mod ids;
pub mod manifest;
pub mod model;
pub mod parameters;
pub mod table;
pub mod version;

// Re-exports for consumers (adapters)
pub use allocator::{AlignedBlock, AllocatorStats, BridgeAllocator, MOC_ALIGNMENT};
pub use bridge::Bridge;
pub use config::{AllocatorCfg, Config, MotionCfg};
pub use core_sdk::{CubismCore, FixedCore};
#[cfg(feature = "link-core")]
pub use core_sdk::LinkedCore;
pub use error::{BridgeError, ManifestError, Result};
pub use ids::{AllocatorId, DeviceHandle, ModelId, RendererId};
pub use manifest::ModelManifest;
pub use model::{ActiveMotion, ModelSnapshot};
pub use parameters::{ParameterRange, ParameterTable};
pub use version::CoreVersion;
