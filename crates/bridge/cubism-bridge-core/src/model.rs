//! Per-model state tracked by the bridge.

use std::path::PathBuf;

use hashbrown::HashMap;
use serde::Serialize;

use crate::allocator::AlignedBlock;
use crate::manifest::ModelManifest;
use crate::parameters::ParameterTable;

/// The motion currently playing on a model.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActiveMotion {
    pub group: String,
    pub index: u32,
    pub elapsed: f32,
    pub duration: f32,
    pub looping: bool,
}

#[derive(Debug)]
pub(crate) struct ModelState {
    pub path: PathBuf,
    pub manifest: Option<ModelManifest>,
    /// Moc bytes in 64-byte aligned memory from the bridge allocator.
    pub moc: Option<AlignedBlock>,
    pub time: f32,
    pub frames_rendered: u64,
    pub motion: Option<ActiveMotion>,
    pub expression: Option<String>,
    pub parameters: HashMap<String, f32>,
}

impl ModelState {
    pub fn new(path: PathBuf, table: &ParameterTable) -> Self {
        Self {
            path,
            manifest: None,
            moc: None,
            time: 0.0,
            frames_rendered: 0,
            motion: None,
            expression: None,
            parameters: table
                .defaults()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }

    /// Advance the model clock and the active motion by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.time += dt;
        let finished = match self.motion.as_mut() {
            Some(m) => {
                m.elapsed += dt;
                if m.elapsed >= m.duration {
                    if m.looping && m.duration > 0.0 {
                        m.elapsed %= m.duration;
                        false
                    } else {
                        true
                    }
                } else {
                    false
                }
            }
            None => false,
        };
        if finished {
            self.motion = None;
        }
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            path: self.path.clone(),
            loaded: true,
            current_time: self.time,
            animating: self.motion.is_some(),
            frames_rendered: self.frames_rendered,
            motion: self.motion.clone(),
            expression: self.expression.clone(),
            moc_bytes: self.moc.as_ref().map_or(0, |b| b.len()),
        }
    }
}

/// Read-only view of a loaded model, the source for the host transfer struct.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelSnapshot {
    pub path: PathBuf,
    pub loaded: bool,
    pub current_time: f32,
    pub animating: bool,
    pub frames_rendered: u64,
    pub motion: Option<ActiveMotion>,
    pub expression: Option<String>,
    pub moc_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ModelState {
        ModelState::new(PathBuf::from("m.model3.json"), &ParameterTable::standard())
    }

    fn motion(duration: f32, looping: bool) -> ActiveMotion {
        ActiveMotion {
            group: "g".into(),
            index: 0,
            elapsed: 0.0,
            duration,
            looping,
        }
    }

    #[test]
    fn one_shot_motion_finishes() {
        let mut s = state();
        s.motion = Some(motion(1.0, false));
        s.advance(0.6);
        assert!(s.snapshot().animating);
        s.advance(0.6);
        assert!(!s.snapshot().animating);
        assert!((s.time - 1.2).abs() < 1e-6);
    }

    #[test]
    fn looping_motion_wraps() {
        let mut s = state();
        s.motion = Some(motion(1.0, true));
        s.advance(2.5);
        let m = s.motion.as_ref().unwrap();
        assert!((m.elapsed - 0.5).abs() < 1e-5);
    }

    #[test]
    fn parameters_start_at_defaults() {
        let s = state();
        assert_eq!(s.parameters["ParamEyeROpen"], 1.0);
        assert_eq!(s.parameters["ParamAngleX"], 0.0);
    }
}
