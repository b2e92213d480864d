use std::ffi::CString;
use std::os::raw::c_void;
use std::ptr;
use std::sync::{Mutex, MutexGuard};

use cubism_bridge_ffi::*;
use cubism_test_fixtures::models;

// The exported functions share one process-wide bridge; run tests one at a time.
static SERIAL: Mutex<()> = Mutex::new(());

fn fresh() -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock().unwrap_or_else(|p| p.into_inner());
    disposeLive2DFramework();
    let defaults = CString::new("{}").unwrap();
    assert_eq!(unsafe { configureLive2DBridge(defaults.as_ptr()) }, 1);
    guard
}

fn c(s: &str) -> CString {
    CString::new(s).unwrap()
}

fn init() {
    let alloc = createLive2DAllocator();
    assert!(!alloc.is_null());
    initializeLive2DFramework(alloc);
}

fn load(path: &str) -> *mut c_void {
    let path = c(path);
    unsafe { loadLive2DModel(path.as_ptr()) }
}

#[test]
fn everything_is_a_no_op_before_initialize() {
    let _g = fresh();
    assert!(load("character_female.model3.json").is_null());

    let fake = 1usize as *mut c_void;
    let renderer = createLive2DRenderer(ptr::null_mut());
    updateLive2DModel(fake, 0.016);
    renderLive2DModel(renderer, fake);
    let group = c("idle");
    unsafe { playLive2DMotion(fake, group.as_ptr(), 0) };
    assert_eq!(isLive2DModelLoaded(fake), 0);
    assert!(getLive2DModelData(fake).is_null());
}

#[test]
fn null_allocator_does_not_initialize() {
    let _g = fresh();
    initializeLive2DFramework(ptr::null_mut());
    assert!(load("x").is_null());
}

#[test]
fn initialize_twice_is_harmless() {
    let _g = fresh();
    let alloc = createLive2DAllocator();
    initializeLive2DFramework(alloc);
    initializeLive2DFramework(alloc);
    let model = load("x");
    assert!(!model.is_null());
    assert_eq!(isLive2DModelLoaded(model), 1);
}

#[test]
fn dispose_without_initialize_is_safe() {
    let _g = fresh();
    disposeLive2DFramework();
    disposeLive2DFramework();
}

#[test]
fn renderer_sentinel_ignores_device() {
    let _g = fresh();
    let a = createLive2DRenderer(ptr::null_mut());
    let b = createLive2DRenderer(0x1234usize as *mut c_void);
    assert_eq!(a, b);
    assert_eq!(a as usize, 0x8765_4321);
}

#[test]
fn lifecycle_sequence() {
    let _g = fresh();
    init();
    let model = load("character_female.model3.json");
    assert!(!model.is_null());
    assert_eq!(isLive2DModelLoaded(model), 1);

    let renderer = createLive2DRenderer(ptr::null_mut());
    for _ in 0..30 {
        updateLive2DModel(model, 1.0 / 60.0);
        renderLive2DModel(renderer, model);
    }
    let group = c("idle");
    let expr = c("happy");
    let param = c("ParamAngleX");
    unsafe {
        playLive2DMotion(model, group.as_ptr(), 0);
        setLive2DExpression(model, expr.as_ptr());
        setLive2DParameter(model, param.as_ptr(), 15.0);
    }

    let data = getLive2DModelData(model);
    assert!(!data.is_null());
    let data = unsafe { &*data };
    assert!(data.is_loaded);
    assert!(data.is_animating);
    assert_eq!(data.model_pointer, model);
    assert!((data.current_time - 0.5).abs() < 1e-3);
    assert!(data.vertices.is_null());
    assert_eq!(data.vertex_count, 0);
    assert!(getLive2DTexture().is_null());

    disposeLive2DFramework();

    updateLive2DModel(model, 1.0);
    renderLive2DModel(renderer, model);
    unsafe { playLive2DMotion(model, group.as_ptr(), 0) };
    assert_eq!(isLive2DModelLoaded(model), 0);
    assert!(getLive2DModelData(model).is_null());
}

#[test]
fn null_arguments_are_ignored() {
    let _g = fresh();
    init();
    let model = load("x");
    unsafe {
        playLive2DMotion(model, ptr::null(), 0);
        setLive2DExpression(model, ptr::null());
        setLive2DParameter(model, ptr::null(), 1.0);
        assert!(loadLive2DModel(ptr::null()).is_null());
    }
    updateLive2DModel(ptr::null_mut(), 0.1);
    renderLive2DModel(ptr::null_mut(), model);
    assert_eq!(isLive2DModelLoaded(ptr::null_mut()), 0);

    let data = unsafe { &*getLive2DModelData(model) };
    assert!(!data.is_animating);
    assert_eq!(data.current_time, 0.0);
}

#[test]
fn reload_makes_old_handle_stale() {
    let _g = fresh();
    init();
    let first = load("a.model3.json");
    let second = load("b.model3.json");
    assert_ne!(first, second);
    assert_eq!(isLive2DModelLoaded(first), 0);
    assert_eq!(isLive2DModelLoaded(second), 1);
}

#[test]
fn configuration_is_locked_while_initialized() {
    let _g = fresh();
    let bad = c("{ not json");
    assert_eq!(unsafe { configureLive2DBridge(bad.as_ptr()) }, 0);
    assert_eq!(unsafe { configureLive2DBridge(ptr::null()) }, 0);

    let cfg = c(r#"{ "renderer_sentinel": 4096 }"#);
    assert_eq!(unsafe { configureLive2DBridge(cfg.as_ptr()) }, 1);
    assert_eq!(createLive2DRenderer(ptr::null_mut()) as usize, 4096);

    init();
    assert_eq!(unsafe { configureLive2DBridge(cfg.as_ptr()) }, 0);
}

#[test]
fn validated_loads_use_fixture_files() {
    let _g = fresh();
    let cfg = c(r#"{ "validate_manifests": true }"#);
    assert_eq!(unsafe { configureLive2DBridge(cfg.as_ptr()) }, 1);
    init();

    let haru = models::path("haru").unwrap();
    let model = load(haru.to_str().unwrap());
    assert!(!model.is_null());

    let broken = models::path("missing-texture").unwrap();
    assert!(load(broken.to_str().unwrap()).is_null());
    // failed load leaves the previous model in place
    assert_eq!(isLive2DModelLoaded(model), 1);

    let group = c("TapBody");
    unsafe { playLive2DMotion(model, group.as_ptr(), 0) };
    assert!(unsafe { &*getLive2DModelData(model) }.is_animating);
}

#[test]
fn abi_version_is_1() {
    assert_eq!(live2DBridgeAbiVersion(), 1);
}
