use std::os::raw::{c_int, c_void};
use std::ptr;

use cubism_bridge_core::ModelSnapshot;

/// Host-facing model data, laid out like the host's `Live2DModelData`.
///
/// Vertex, index and texture fields stay empty until real mesh data flows
/// through the bridge.
#[repr(C)]
#[derive(Debug)]
pub struct Live2DModelData {
    pub model_pointer: *mut c_void,
    pub is_loaded: bool,
    pub vertices: *mut f32,
    pub vertex_count: c_int,
    pub indices: *mut u16,
    pub index_count: c_int,
    pub texture: *mut c_void,
    pub current_time: f32,
    pub is_animating: bool,
}

// SAFETY: every pointer field is either null or an opaque handle value; the
// bridge never dereferences them.
unsafe impl Send for Live2DModelData {}

impl Default for Live2DModelData {
    fn default() -> Self {
        Self {
            model_pointer: ptr::null_mut(),
            is_loaded: false,
            vertices: ptr::null_mut(),
            vertex_count: 0,
            indices: ptr::null_mut(),
            index_count: 0,
            texture: ptr::null_mut(),
            current_time: 0.0,
            is_animating: false,
        }
    }
}

impl Live2DModelData {
    pub(crate) fn fill(&mut self, model: *mut c_void, snapshot: &ModelSnapshot) {
        *self = Self {
            model_pointer: model,
            is_loaded: snapshot.loaded,
            current_time: snapshot.current_time,
            is_animating: snapshot.animating,
            ..Self::default()
        };
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
