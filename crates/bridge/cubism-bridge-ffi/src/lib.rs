//! C ABI for the Cubism bridge.
//!
//! Symbol names and signatures match the host's existing bridging header
//! (`include/cubism_bridge.h`). Handles are opaque addresses: the allocator
//! handle is the allocator id, the model handle packs a generation-checked id,
//! the renderer handle is a fixed sentinel. Failures never cross the boundary;
//! they come back as null/zero and a log line (`RUST_LOG` controls verbosity).
//!
//! All calls are serialized on one process-wide bridge, so the surface may be
//! called from any thread.

// exported names follow the host header
#![allow(non_snake_case)]

mod handles;
mod state;
mod transfer;

use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

use cubism_bridge_core::{BridgeError, Config};
use log::{debug, info};

use handles::{
    allocator_from_ptr, allocator_to_ptr, cstr_arg, device_from_ptr, model_from_ptr, model_to_ptr,
    renderer_from_ptr, renderer_to_ptr,
};
use state::with_state;
pub use transfer::Live2DModelData;

/// Numeric ABI version for compatibility checks by the host.
#[no_mangle]
pub extern "C" fn live2DBridgeAbiVersion() -> u32 {
    1
}

/// Create the bridge allocator. Returns null on allocation failure.
#[no_mangle]
pub extern "C" fn createLive2DAllocator() -> *mut c_void {
    with_state("createLive2DAllocator", ptr::null_mut(), |s| {
        s.bridge.create_allocator().map(allocator_to_ptr)
    })
}

/// Initialize the framework with the handle from `createLive2DAllocator`.
/// No-op for a null handle or when already initialized.
#[no_mangle]
pub extern "C" fn initializeLive2DFramework(allocator: *mut c_void) {
    with_state("initializeLive2DFramework", (), |s| {
        let id = allocator_from_ptr(allocator)?;
        s.bridge.initialize(id).map(|_| ())
    })
}

/// Drop the model and allocator. Safe to call repeatedly or before initialize.
#[no_mangle]
pub extern "C" fn disposeLive2DFramework() {
    with_state("disposeLive2DFramework", (), |s| {
        if s.bridge.dispose() {
            s.model_data.reset();
        }
        Ok(())
    })
}

/// Load a model; returns its handle or null.
///
/// # Safety
/// `model_path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn loadLive2DModel(model_path: *const c_char) -> *mut c_void {
    let path = cstr_arg(model_path, "model path");
    with_state("loadLive2DModel", ptr::null_mut(), |s| {
        let id = s.bridge.load_model(path?)?;
        model_to_ptr(id)
    })
}

/// Always returns the renderer sentinel; `device` may be null.
#[no_mangle]
pub extern "C" fn createLive2DRenderer(device: *mut c_void) -> *mut c_void {
    with_state("createLive2DRenderer", ptr::null_mut(), |s| {
        let renderer = s.bridge.create_renderer(device_from_ptr(device));
        Ok(renderer_to_ptr(renderer))
    })
}

#[no_mangle]
pub extern "C" fn updateLive2DModel(model: *mut c_void, delta_time: f32) {
    with_state("updateLive2DModel", (), |s| {
        let id = model_from_ptr(model)?;
        s.bridge.update_model(id, delta_time)
    })
}

#[no_mangle]
pub extern "C" fn renderLive2DModel(renderer: *mut c_void, model: *mut c_void) {
    with_state("renderLive2DModel", (), |s| {
        let renderer = renderer_from_ptr(renderer)?;
        let id = model_from_ptr(model)?;
        s.bridge.render_model(renderer, id)
    })
}

/// # Safety
/// `group_name` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn playLive2DMotion(
    model: *mut c_void,
    group_name: *const c_char,
    motion_index: c_int,
) {
    let group = cstr_arg(group_name, "motion group");
    with_state("playLive2DMotion", (), |s| {
        let id = model_from_ptr(model)?;
        s.bridge.play_motion(id, group?, motion_index)
    })
}

/// # Safety
/// `expression_name` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn setLive2DExpression(model: *mut c_void, expression_name: *const c_char) {
    let name = cstr_arg(expression_name, "expression name");
    with_state("setLive2DExpression", (), |s| {
        let id = model_from_ptr(model)?;
        s.bridge.set_expression(id, name?)
    })
}

/// # Safety
/// `param_name` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn setLive2DParameter(
    model: *mut c_void,
    param_name: *const c_char,
    value: f32,
) {
    let name = cstr_arg(param_name, "parameter name");
    with_state("setLive2DParameter", (), |s| {
        let id = model_from_ptr(model)?;
        s.bridge.set_parameter(id, name?, value)
    })
}

/// 1 if `model` is the live model, else 0.
#[no_mangle]
pub extern "C" fn isLive2DModelLoaded(model: *mut c_void) -> c_int {
    with_state("isLive2DModelLoaded", 0, |s| {
        let id = model_from_ptr(model)?;
        Ok(c_int::from(s.bridge.is_model_loaded(id)))
    })
}

/// Snapshot of the model in bridge-owned storage, or null if `model` is not live.
/// The pointer stays valid until the next call to this function or
/// `disposeLive2DFramework`; the host must not free it.
#[no_mangle]
pub extern "C" fn getLive2DModelData(model: *mut c_void) -> *mut Live2DModelData {
    with_state("getLive2DModelData", ptr::null_mut(), |s| {
        let id = model_from_ptr(model)?;
        let snapshot = s.bridge.model_data(id).ok_or(BridgeError::StaleHandle)?;
        s.model_data.fill(model, &snapshot);
        Ok(&mut *s.model_data as *mut Live2DModelData)
    })
}

/// Textures are created and owned by the host renderer; nothing to hand back yet.
#[no_mangle]
pub extern "C" fn getLive2DTexture() -> *mut c_void {
    debug!("getLive2DTexture: no bridge-owned texture");
    ptr::null_mut()
}

/// Replace the bridge configuration from JSON (partial objects allowed).
/// Only accepted while not initialized. Returns 1 on success, 0 otherwise.
///
/// # Safety
/// `config_json` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn configureLive2DBridge(config_json: *const c_char) -> c_int {
    let text = cstr_arg(config_json, "config json");
    with_state("configureLive2DBridge", 0, |s| {
        let cfg: Config = serde_json::from_str(text?)
            .map_err(|e| BridgeError::InvalidArgument(format!("config error: {e}")))?;
        s.bridge.set_config(cfg)?;
        info!("bridge configuration replaced");
        Ok(1)
    })
}
