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

use crate::renderer::api::*;
use std::ops::Range;

/// A trait representing an active render pass, used for recording drawing commands.
///
/// State set on the pass (program, buffers, raster modes) persists until it is
/// set again, so callers that change a raster mode are expected to restore it.
pub trait RenderPass {
    /// Sets the active shader program for subsequent draw calls.
    fn set_program(&mut self, program: ShaderProgramId);

    /// Binds a texture to a sampler slot of the active program.
    fn set_texture(&mut self, slot: u32, texture: TextureId);

    /// Sets an unsigned integer uniform of the active program.
    fn set_uniform_u32(&mut self, location: u32, value: u32);

    /// Sets a color uniform of the active program.
    fn set_uniform_color(&mut self, location: u32, rgba: [f32; 4]);

    /// Switches between filled and line rasterization.
    fn set_polygon_mode(&mut self, mode: PolygonMode);

    /// Sets which faces are culled.
    fn set_cull_mode(&mut self, mode: CullMode);

    /// Sets how vertices are assembled into primitives.
    fn set_topology(&mut self, topology: PrimitiveTopology);

    /// Binds a vertex buffer to a specific slot.
    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64);

    /// Binds an index buffer for indexed drawing.
    fn set_index_buffer(&mut self, buffer: BufferId, offset: u64, index_format: IndexFormat);

    /// Records a non-indexed draw call.
    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);

    /// Records an indexed draw call.
    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>);
}
