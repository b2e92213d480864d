//! Process-wide bridge instance behind the C surface.
//!
//! Every exported function goes through [`with_state`]: it serializes access
//! with a mutex, keeps panics from unwinding into the host, and turns errors
//! into the caller's null/zero fallback plus a log line.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

use cubism_bridge_core::{Bridge, BridgeError, Config, CubismCore};
use log::{debug, error, warn};
use once_cell::sync::Lazy;

use crate::transfer::Live2DModelData;

pub(crate) struct FfiState {
    pub bridge: Bridge,
    /// Storage behind the pointer returned by `getLive2DModelData`. Boxed so
    /// the address stays put for the life of the process.
    pub model_data: Box<Live2DModelData>,
}

static STATE: Lazy<Mutex<FfiState>> = Lazy::new(|| {
    init_logging();
    Mutex::new(FfiState {
        bridge: Bridge::new(Config::default(), default_core()),
        model_data: Box::default(),
    })
});

fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("warn");
    // The host may already have installed a logger.
    let _ = env_logger::Builder::from_env(env).try_init();
}

#[cfg(feature = "link-core")]
fn default_core() -> Box<dyn CubismCore> {
    Box::new(cubism_bridge_core::LinkedCore)
}

#[cfg(not(feature = "link-core"))]
fn default_core() -> Box<dyn CubismCore> {
    Box::new(cubism_bridge_core::FixedCore::default())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

fn report(op: &str, err: &BridgeError) {
    match err {
        // Expected while the host is still starting up or after a model swap.
        BridgeError::NotInitialized
        | BridgeError::AlreadyInitialized
        | BridgeError::StaleHandle
        | BridgeError::InvalidArgument(_) => debug!("{op}: {err}"),
        _ => warn!("{op}: {err}"),
    }
}

pub(crate) fn with_state<R>(
    op: &str,
    fallback: R,
    f: impl FnOnce(&mut FfiState) -> Result<R, BridgeError>,
) -> R {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut guard = STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut *guard)
    }));
    match outcome {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            report(op, &err);
            fallback
        }
        Err(payload) => {
            error!("{op}: panic: {}", panic_message(payload.as_ref()));
            fallback
        }
    }
}
