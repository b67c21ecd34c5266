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

//! Draw submission for committed zone geometry.

use super::geometry::CommittedGeometry;
use super::parts::PartMaterials;
use crate::resource::ResourceRef;
use strata_core::renderer::{
    CullMode, IndexFormat, PolygonMode, PrimitiveTopology, RenderPass, ShaderProgramId,
    TerrainRenderSettings,
};

/// Slot, sampler and uniform locations shared with the terrain shaders.
pub mod bindings {
    /// Vertex buffer slot of the positions.
    pub const POSITION_SLOT: u32 = 0;
    /// Vertex buffer slot of the per-vertex blend weights.
    pub const BLEND_ATTRIBUTE_SLOT: u32 = 1;
    /// Vertex buffer slot of the texture coordinates.
    pub const TEXCOORD_SLOT: u32 = 2;
    /// Sampler slots of a part's materials, in binding order.
    pub const MATERIAL_TEXTURE_SLOTS: [u32; 2] = [0, 1];
    /// Sampler slot of the colormap.
    pub const COLORMAP_TEXTURE_SLOT: u32 = 2;
    /// Sampler slot of the lightmap.
    pub const LIGHTMAP_TEXTURE_SLOT: u32 = 3;
    /// Uniform locations of the materials' unique ids, which index the
    /// per-pixel blend-weight table.
    pub const MATERIAL_ID_UNIFORMS: [u32; 2] = [0, 1];
    /// Uniform location of the flat color used by the wireframe and
    /// bounding-box programs.
    pub const COLOR_UNIFORM: u32 = 2;
}

/// Shader program handles used to draw zones. Compiled elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneShaders {
    /// Program for one-material parts.
    pub single_material: ShaderProgramId,
    /// Program for two-material blend parts.
    pub blended_material: ShaderProgramId,
    /// Flat color program for the wireframe path.
    pub wireframe: ShaderProgramId,
    /// Flat color program for the bounding-box overlay.
    pub bounding_box: ShaderProgramId,
}

/// Everything `draw` reads from outside the zone, passed explicitly each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneDrawConfig {
    /// Render flags and thresholds.
    pub settings: TerrainRenderSettings,
    /// Program handles.
    pub shaders: ZoneShaders,
}

impl ZoneDrawConfig {
    /// Creates a config with default settings.
    pub fn new(shaders: ZoneShaders) -> Self {
        Self {
            settings: TerrainRenderSettings::default(),
            shaders,
        }
    }
}

/// Records the draw calls for `geometry`. Returns how many were recorded.
///
/// # Panics
///
/// Panics if the geometry's colormap or lightmap is not generated. Callers
/// gate on readiness first.
pub(crate) fn record(
    geometry: &CommittedGeometry,
    pass: &mut dyn RenderPass,
    config: &ZoneDrawConfig,
    fade_blends: bool,
) -> u32 {
    assert!(
        geometry.textures_ready(),
        "draw recorded for a zone whose textures are not generated"
    );

    let mut calls = if config.settings.show_wireframe {
        record_wireframe(geometry, pass, config)
    } else {
        record_shaded(geometry, pass, config, fade_blends)
    };
    if config.settings.show_bounding_boxes {
        calls += record_bounds(geometry, pass, config);
    }
    calls
}

fn bind_geometry(geometry: &CommittedGeometry, pass: &mut dyn RenderPass) {
    let buffers = &geometry.buffers;
    pass.set_vertex_buffer(bindings::POSITION_SLOT, buffers.positions.buffer, 0);
    pass.set_vertex_buffer(bindings::BLEND_ATTRIBUTE_SLOT, buffers.attributes.buffer, 0);
    if let Some(texcoords) = buffers.texcoords {
        pass.set_vertex_buffer(bindings::TEXCOORD_SLOT, texcoords.buffer, 0);
    }
    pass.set_index_buffer(buffers.indices.buffer, 0, IndexFormat::Uint32);
}

fn bind_map(pass: &mut dyn RenderPass, slot: u32, map: Option<&ResourceRef>) {
    if let Some(texture) = map.and_then(|m| m.device_texture()) {
        pass.set_texture(slot, texture);
    }
}

fn record_shaded(
    geometry: &CommittedGeometry,
    pass: &mut dyn RenderPass,
    config: &ZoneDrawConfig,
    fade_blends: bool,
) -> u32 {
    let shaders = &config.shaders;
    pass.set_polygon_mode(PolygonMode::Fill);
    pass.set_cull_mode(CullMode::Back);
    pass.set_topology(PrimitiveTopology::TriangleList);
    bind_geometry(geometry, pass);

    let mut bound_program = None;
    let mut calls = 0;
    for part in geometry.parts.iter() {
        // Past the fade distance a blend collapses to its primary material.
        let materials: Vec<&ResourceRef> = match &part.materials {
            PartMaterials::Blend(..) if fade_blends => vec![part.materials.primary()],
            materials => materials.iter().collect(),
        };
        let program = if materials.len() == 2 {
            shaders.blended_material
        } else {
            shaders.single_material
        };

        if bound_program != Some(program) {
            pass.set_program(program);
            bind_map(pass, bindings::COLORMAP_TEXTURE_SLOT, geometry.colormap.as_ref());
            bind_map(pass, bindings::LIGHTMAP_TEXTURE_SLOT, geometry.lightmap.as_ref());
            bound_program = Some(program);
        }

        for (i, material) in materials.into_iter().enumerate() {
            if let Some(texture) = material.device_texture() {
                pass.set_texture(bindings::MATERIAL_TEXTURE_SLOTS[i], texture);
            }
            pass.set_uniform_u32(bindings::MATERIAL_ID_UNIFORMS[i], material.unique_id());
        }

        pass.draw_indexed(part.indices.clone(), 0, 0..1);
        calls += 1;
    }
    calls
}

fn record_wireframe(
    geometry: &CommittedGeometry,
    pass: &mut dyn RenderPass,
    config: &ZoneDrawConfig,
) -> u32 {
    pass.set_program(config.shaders.wireframe);
    pass.set_uniform_color(bindings::COLOR_UNIFORM, config.settings.wireframe_color);
    pass.set_polygon_mode(PolygonMode::Line);
    pass.set_cull_mode(CullMode::None);
    pass.set_topology(PrimitiveTopology::TriangleList);
    bind_geometry(geometry, pass);

    pass.draw_indexed(0..geometry.buffers.indices.len, 0, 0..1);

    pass.set_polygon_mode(PolygonMode::Fill);
    pass.set_cull_mode(CullMode::Back);
    1
}

fn record_bounds(
    geometry: &CommittedGeometry,
    pass: &mut dyn RenderPass,
    config: &ZoneDrawConfig,
) -> u32 {
    let lines = geometry.buffers.bounds_lines;
    pass.set_program(config.shaders.bounding_box);
    pass.set_uniform_color(bindings::COLOR_UNIFORM, config.settings.bounding_box_color);
    pass.set_topology(PrimitiveTopology::LineList);
    pass.set_vertex_buffer(bindings::POSITION_SLOT, lines.buffer, 0);

    pass.draw(0..lines.len, 0..1);

    pass.set_topology(PrimitiveTopology::TriangleList);
    1
}
