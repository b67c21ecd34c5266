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

//! The two versions of a zone's geometry: staged (CPU, producer-owned) and
//! committed (device-resident, render-thread-owned).

use super::parts::{RenderingPart, RenderingPartTable};
use crate::resource::ResourceRef;
use strata_core::math::{Aabb, Vec2, Vec3};
use strata_core::renderer::{BufferId, GraphicsDevice};

/// New data for a zone, as computed by the terrain producer.
///
/// Every field is optional. A field left as `None` leaves the corresponding
/// staged value untouched, so a producer can, for instance, only swap the
/// rendering-part table or only reassign the lightmap.
///
/// Shared resources are held as counted [`ResourceRef`]s from the moment they
/// are added, so a texture obtained from a cache stays referenced until the
/// zone releases it.
#[derive(Debug, Default, Clone)]
pub struct ZoneData {
    /// Vertex positions, relative to the zone's world position.
    pub vertices: Option<Vec<Vec3>>,
    /// Triangle list indices into `vertices`.
    pub indices: Option<Vec<u32>>,
    /// One blend weight per vertex, used by two-material parts.
    pub attributes: Option<Vec<f32>>,
    /// One texture coordinate per vertex.
    pub texcoords: Option<Vec<Vec2>>,
    /// The rendering-part table. An empty list is ignored.
    pub rendering_parts: Option<Vec<RenderingPart>>,
    /// The zone's colormap.
    pub colormap: Option<ResourceRef>,
    /// The zone's lightmap.
    pub lightmap: Option<ResourceRef>,
}

impl ZoneData {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the vertex positions.
    pub fn with_vertices(mut self, vertices: Vec<Vec3>) -> Self {
        self.vertices = Some(vertices);
        self
    }

    /// Sets the triangle indices.
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Sets the per-vertex blend weights.
    pub fn with_attributes(mut self, attributes: Vec<f32>) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Sets the texture coordinates.
    pub fn with_texcoords(mut self, texcoords: Vec<Vec2>) -> Self {
        self.texcoords = Some(texcoords);
        self
    }

    /// Sets the rendering-part table.
    pub fn with_parts(mut self, parts: Vec<RenderingPart>) -> Self {
        self.rendering_parts = Some(parts);
        self
    }

    /// Sets the colormap.
    pub fn with_colormap(mut self, colormap: impl Into<ResourceRef>) -> Self {
        self.colormap = Some(colormap.into());
        self
    }

    /// Sets the lightmap.
    pub fn with_lightmap(mut self, lightmap: impl Into<ResourceRef>) -> Self {
        self.lightmap = Some(lightmap.into());
        self
    }
}

/// A CPU snapshot waiting for the render thread.
#[derive(Debug, Default)]
pub(crate) struct StagedGeometry {
    pub generation: u64,
    pub vertices: Option<Vec<Vec3>>,
    pub indices: Option<Vec<u32>>,
    pub attributes: Option<Vec<f32>>,
    pub texcoords: Option<Vec<Vec2>>,
    pub parts: Option<RenderingPartTable>,
    pub colormap: Option<ResourceRef>,
    pub lightmap: Option<ResourceRef>,
}

impl StagedGeometry {
    /// Folds `data` into the snapshot, field by field.
    pub fn apply(&mut self, data: ZoneData, generation: u64) {
        self.generation = generation;

        if let Some(vertices) = data.vertices {
            self.vertices = Some(vertices);
        }
        if let Some(indices) = data.indices {
            self.indices = Some(indices);
        }
        if let Some(attributes) = data.attributes {
            self.attributes = Some(attributes);
        }
        if let Some(texcoords) = data.texcoords {
            self.texcoords = Some(texcoords);
        }

        match data.rendering_parts {
            Some(parts) if parts.is_empty() => {
                log::debug!("Ignoring empty rendering-part list for generation {generation}");
            }
            Some(parts) => {
                // The incoming references move in. The outgoing table is released.
                self.parts = Some(RenderingPartTable::new(parts));
            }
            None => {}
        }

        if data.colormap.is_some() {
            self.colormap = data.colormap;
        }
        if data.lightmap.is_some() {
            self.lightmap = data.lightmap;
        }
    }
}

/// A device buffer and the number of elements it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GpuArray {
    pub buffer: BufferId,
    pub len: u32,
}

/// The device buffers of one committed generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GpuBuffers {
    pub positions: GpuArray,
    pub indices: GpuArray,
    pub attributes: GpuArray,
    pub texcoords: Option<GpuArray>,
    /// The local bounding box as a 24-point line list, for the debug overlay.
    pub bounds_lines: GpuArray,
}

impl GpuBuffers {
    pub fn ids(&self) -> impl Iterator<Item = BufferId> {
        [
            Some(self.positions),
            Some(self.indices),
            Some(self.attributes),
            self.texcoords,
            Some(self.bounds_lines),
        ]
        .into_iter()
        .flatten()
        .map(|array| array.buffer)
    }
}

/// The device-resident geometry the render thread draws from.
///
/// Only ever built by a successful commit, so a `CommittedGeometry` always
/// passed validation.
#[derive(Debug)]
pub(crate) struct CommittedGeometry {
    pub generation: u64,
    pub buffers: GpuBuffers,
    pub max_index: u32,
    pub local_bounds: Aabb,
    pub parts: RenderingPartTable,
    pub colormap: Option<ResourceRef>,
    pub lightmap: Option<ResourceRef>,
}

impl CommittedGeometry {
    /// Both shared textures are assigned and their content is generated.
    pub fn textures_ready(&self) -> bool {
        let generated = |map: &Option<ResourceRef>| map.as_ref().is_some_and(|m| m.is_generated());
        generated(&self.colormap) && generated(&self.lightmap)
    }

    /// Frees every device buffer. Returns the number of buffers destroyed.
    pub fn destroy_buffers(&self, device: &dyn GraphicsDevice) -> usize {
        let mut destroyed = 0;
        for id in self.buffers.ids() {
            match device.destroy_buffer(id) {
                Ok(()) => destroyed += 1,
                Err(e) => log::error!("Failed to destroy zone buffer {id:?}: {e}"),
            }
        }
        destroyed
    }
}
