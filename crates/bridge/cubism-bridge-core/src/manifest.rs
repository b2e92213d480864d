//! `*.model3.json` manifest reader.
//!
//! Only the file references are interpreted; everything else is preserved for
//! hosts that want to inspect it.

use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ModelManifest {
    pub version: u32,
    pub file_references: FileReferences,
    #[serde(default)]
    pub groups: Vec<ParameterGroup>,
    #[serde(default)]
    pub hit_areas: Vec<HitArea>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct FileReferences {
    pub moc: String,
    #[serde(default)]
    pub textures: Vec<String>,
    #[serde(default)]
    pub physics: Option<String>,
    #[serde(default)]
    pub pose: Option<String>,
    #[serde(default)]
    pub display_info: Option<String>,
    #[serde(default)]
    pub expressions: Vec<ExpressionRef>,
    /// Motion group name → motions in playback-index order.
    #[serde(default)]
    pub motions: HashMap<String, Vec<MotionRef>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ExpressionRef {
    pub name: String,
    pub file: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct MotionRef {
    pub file: String,
    #[serde(default)]
    pub fade_in_time: Option<f32>,
    #[serde(default)]
    pub fade_out_time: Option<f32>,
    #[serde(default)]
    pub sound: Option<String>,
}

/// e.g. `{ "Target": "Parameter", "Name": "EyeBlink", "Ids": [...] }`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterGroup {
    pub target: String,
    pub name: String,
    #[serde(default)]
    pub ids: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct HitArea {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl ModelManifest {
    pub fn from_json(s: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn moc_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.file_references.moc)
    }

    /// Required files (moc, textures, expressions, motions) that do not exist
    /// under `base_dir`. A missing physics or pose file is only logged.
    pub fn missing_files(&self, base_dir: &Path) -> Vec<String> {
        let refs = &self.file_references;
        let required = std::iter::once(&refs.moc)
            .chain(refs.textures.iter())
            .chain(refs.expressions.iter().map(|e| &e.file))
            .chain(refs.motions.values().flatten().map(|m| &m.file));

        let mut missing = Vec::new();
        for rel in required {
            if base_dir.join(rel).is_file() {
                debug!("model file present: {rel}");
            } else {
                missing.push(rel.clone());
            }
        }
        for rel in refs.physics.iter().chain(refs.pose.iter()) {
            if !base_dir.join(rel).is_file() {
                warn!("optional model file missing: {rel}");
            }
        }
        missing
    }

    pub fn motion(&self, group: &str, index: usize) -> Option<&MotionRef> {
        self.file_references.motions.get(group)?.get(index)
    }

    pub fn has_motion_group(&self, group: &str) -> bool {
        self.file_references.motions.contains_key(group)
    }

    pub fn has_expression(&self, name: &str) -> bool {
        self.file_references
            .expressions
            .iter()
            .any(|e| e.name == name)
    }
}
