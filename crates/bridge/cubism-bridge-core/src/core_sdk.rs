//! Seam to the Live2D Cubism Core SDK.
//!
//! Only the version queries are forwarded today. `LinkedCore` calls the native
//! library (feature `link-core`); `FixedCore` reports constants and backs default
//! builds and tests.

/// Moc file format versions as reported by `csmGetLatestMocVersion`.
pub mod moc_version {
    pub const V30: u32 = 1;
    pub const V33: u32 = 2;
    pub const V40: u32 = 3;
    pub const V42: u32 = 4;
    pub const V50: u32 = 5;
}

/// Queries forwarded to the vendor SDK.
pub trait CubismCore: Send {
    /// Packed core version (see [`crate::CoreVersion`]).
    fn version(&self) -> u32;

    /// Newest moc3 format version the core can load.
    fn latest_moc_version(&self) -> u32;
}

/// Core stand-in that reports fixed values.
#[derive(Clone, Copy, Debug)]
pub struct FixedCore {
    pub version: u32,
    pub latest_moc_version: u32,
}

impl Default for FixedCore {
    fn default() -> Self {
        Self {
            version: 0x0402_0001,
            latest_moc_version: moc_version::V42,
        }
    }
}

impl CubismCore for FixedCore {
    fn version(&self) -> u32 {
        self.version
    }

    fn latest_moc_version(&self) -> u32 {
        self.latest_moc_version
    }
}

#[cfg(feature = "link-core")]
mod linked {
    use super::CubismCore;

    #[link(name = "Live2DCubismCore")]
    extern "C" {
        fn csmGetVersion() -> u32;
        fn csmGetLatestMocVersion() -> u32;
    }

    /// Calls straight into the native Cubism Core library.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct LinkedCore;

    impl CubismCore for LinkedCore {
        fn version(&self) -> u32 {
            // SAFETY: argument-less query with no preconditions.
            unsafe { csmGetVersion() }
        }

        fn latest_moc_version(&self) -> u32 {
            // SAFETY: argument-less query with no preconditions.
            unsafe { csmGetLatestMocVersion() }
        }
    }
}

#[cfg(feature = "link-core")]
pub use linked::LinkedCore;
