//! Parameter ranges for the standard Live2D parameter ids.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParameterRange {
    pub const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.max(self.min).min(self.max)
    }
}

const STANDARD: &[(&str, ParameterRange)] = &[
    // face angle
    ("ParamAngleX", ParameterRange::new(-30.0, 30.0, 0.0)),
    ("ParamAngleY", ParameterRange::new(-30.0, 30.0, 0.0)),
    ("ParamAngleZ", ParameterRange::new(-30.0, 30.0, 0.0)),
    // eyes
    ("ParamEyeLOpen", ParameterRange::new(0.0, 1.0, 1.0)),
    ("ParamEyeROpen", ParameterRange::new(0.0, 1.0, 1.0)),
    ("ParamEyeBallX", ParameterRange::new(-1.0, 1.0, 0.0)),
    ("ParamEyeBallY", ParameterRange::new(-1.0, 1.0, 0.0)),
    // brows
    ("ParamBrowLY", ParameterRange::new(-1.0, 1.0, 0.0)),
    ("ParamBrowRY", ParameterRange::new(-1.0, 1.0, 0.0)),
    ("ParamBrowLX", ParameterRange::new(-1.0, 1.0, 0.0)),
    ("ParamBrowRX", ParameterRange::new(-1.0, 1.0, 0.0)),
    // mouth
    ("ParamMouthOpenY", ParameterRange::new(0.0, 1.0, 0.0)),
    ("ParamMouthForm", ParameterRange::new(-1.0, 1.0, 0.0)),
    // body
    ("ParamBodyAngleX", ParameterRange::new(-10.0, 10.0, 0.0)),
    ("ParamBodyAngleY", ParameterRange::new(-10.0, 10.0, 0.0)),
    ("ParamBodyAngleZ", ParameterRange::new(-10.0, 10.0, 0.0)),
    // hair
    ("ParamHairFront", ParameterRange::new(-1.0, 1.0, 0.0)),
    ("ParamHairSide", ParameterRange::new(-1.0, 1.0, 0.0)),
    ("ParamHairBack", ParameterRange::new(-1.0, 1.0, 0.0)),
    ("ParamBreath", ParameterRange::new(0.0, 1.0, 0.0)),
    // custom expression blends
    ("ParamHappy", ParameterRange::new(0.0, 1.0, 0.0)),
    ("ParamSad", ParameterRange::new(0.0, 1.0, 0.0)),
    ("ParamAngry", ParameterRange::new(0.0, 1.0, 0.0)),
    ("ParamSurprised", ParameterRange::new(0.0, 1.0, 0.0)),
];

/// Parameter id → range. Ids missing from the table are passed through unclamped.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterTable {
    ranges: HashMap<String, ParameterRange>,
}

impl ParameterTable {
    pub fn standard() -> Self {
        Self {
            ranges: STANDARD
                .iter()
                .map(|(name, range)| (name.to_string(), *range))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParameterRange> {
        self.ranges.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, range: ParameterRange) {
        self.ranges.insert(name.into(), range);
    }

    /// Clamp `value` into the range for `name`, or return it unchanged if unknown.
    pub fn apply(&self, name: &str, value: f32) -> f32 {
        match self.ranges.get(name) {
            Some(range) => range.clamp(value),
            None => value,
        }
    }

    /// Default values for every known id.
    pub fn defaults(&self) -> impl Iterator<Item = (&str, f32)> {
        self.ranges.iter().map(|(k, r)| (k.as_str(), r.default))
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
