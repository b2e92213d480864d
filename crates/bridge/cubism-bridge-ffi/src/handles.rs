//! Conversions between opaque C handles / strings and typed bridge values.

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};

use cubism_bridge_core::{AllocatorId, BridgeError, DeviceHandle, ModelId, RendererId};

type Result<T> = std::result::Result<T, BridgeError>;

fn invalid(msg: &str) -> BridgeError {
    BridgeError::InvalidArgument(msg.to_string())
}

pub(crate) fn allocator_to_ptr(id: AllocatorId) -> *mut c_void {
    id.0 as usize as *mut c_void
}

/// Null maps to `None`; anything else must be an id this bridge could have issued.
pub(crate) fn allocator_from_ptr(p: *mut c_void) -> Result<Option<AllocatorId>> {
    if p.is_null() {
        return Ok(None);
    }
    u32::try_from(p as usize)
        .map(|raw| Some(AllocatorId(raw)))
        .map_err(|_| invalid("allocator handle out of range"))
}

pub(crate) fn model_to_ptr(id: ModelId) -> Result<*mut c_void> {
    usize::try_from(id.to_raw())
        .map(|raw| raw as *mut c_void)
        .map_err(|_| invalid("model handle does not fit in a pointer"))
}

pub(crate) fn model_from_ptr(p: *mut c_void) -> Result<ModelId> {
    if p.is_null() {
        return Err(invalid("model handle is null"));
    }
    ModelId::from_raw(p as usize as u64).ok_or_else(|| invalid("malformed model handle"))
}

pub(crate) fn renderer_to_ptr(id: RendererId) -> *mut c_void {
    id.0 as *mut c_void
}

pub(crate) fn renderer_from_ptr(p: *mut c_void) -> Result<RendererId> {
    if p.is_null() {
        return Err(invalid("renderer handle is null"));
    }
    Ok(RendererId(p as usize))
}

pub(crate) fn device_from_ptr(p: *mut c_void) -> Option<DeviceHandle> {
    (!p.is_null()).then(|| DeviceHandle(p as usize))
}

/// Borrow a NUL-terminated UTF-8 string argument.
///
/// # Safety
/// `p` must be null or point to a NUL-terminated string that stays valid for `'a`.
pub(crate) unsafe fn cstr_arg<'a>(p: *const c_char, what: &str) -> Result<&'a str> {
    if p.is_null() {
        return Err(BridgeError::InvalidArgument(format!("{what} is null")));
    }
    CStr::from_ptr(p)
        .to_str()
        .map_err(|_| BridgeError::InvalidArgument(format!("{what} is not valid UTF-8")))
}
