// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Settings read by the terrain renderer on every draw.

use crate::renderer::error::RenderError;
use serde::{Deserialize, Serialize};

/// A collection of settings that affect how terrain zones are drawn.
///
/// The settings are plain data: they are passed to each draw explicitly and
/// can be round-tripped through RON for config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainRenderSettings {
    /// If `true`, zones are drawn as flat-colored wireframes instead of shaded.
    pub show_wireframe: bool,
    /// If `true`, zones whose bounds fall outside the view frustum are skipped.
    pub frustum_culling: bool,
    /// If `true`, each drawn zone also draws its bounding box.
    pub show_bounding_boxes: bool,
    /// Beyond this viewer distance, two-material parts are drawn with the
    /// single-material program using their primary material. `None` disables it.
    pub blend_fade_distance: Option<f32>,
    /// The flat color of the wireframe path.
    pub wireframe_color: [f32; 4],
    /// The color of the bounding box overlay.
    pub bounding_box_color: [f32; 4],
}

impl Default for TerrainRenderSettings {
    fn default() -> Self {
        Self {
            show_wireframe: false,
            frustum_culling: true,
            show_bounding_boxes: false,
            blend_fade_distance: None,
            wireframe_color: [1.0, 1.0, 1.0, 1.0],
            bounding_box_color: [1.0, 0.0, 0.0, 1.0],
        }
    }
}

impl TerrainRenderSettings {
    /// Parses settings from RON text. Missing fields take their default value.
    pub fn from_ron_str(text: &str) -> Result<Self, RenderError> {
        ron::from_str(text).map_err(|e| RenderError::InvalidSettings(e.to_string()))
    }

    /// Serializes the settings to human-readable RON.
    pub fn to_ron_string(&self) -> Result<String, RenderError> {
        let pretty_config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty_config)
            .map_err(|e| RenderError::InvalidSettings(e.to_string()))
    }
}
