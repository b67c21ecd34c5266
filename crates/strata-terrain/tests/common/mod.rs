//! Shared fixtures for the zone integration tests: a device that records
//! every allocation, a render pass that records every command, and small
//! geometry builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::ops::Range;
use std::sync::{Arc, Mutex};
use strata_core::culling::{FrustumTest, Visibility};
use strata_core::math::{Aabb, Vec2, Vec3};
use strata_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, CullMode, GraphicsDevice, IndexFormat, PolygonMode,
    PrimitiveTopology, RenderPass, ResourceError, ShaderProgramId, TextureDescriptor, TextureId,
};
use strata_terrain::{
    RenderingPart, ResourceKind, TerrainTexture, TextureData, ZoneData, ZoneDrawConfig,
    ZoneShaders,
};

#[derive(Debug, Default)]
struct DeviceState {
    next_id: usize,
    buffers: HashMap<BufferId, (String, BufferUsage, Vec<u8>)>,
    textures: HashMap<TextureId, Vec<u8>>,
    buffers_created: usize,
    buffers_destroyed: usize,
    textures_created: usize,
    textures_destroyed: usize,
    invalid_destroys: usize,
    fail_buffers_after: Option<usize>,
}

/// A `GraphicsDevice` that keeps buffer and texture contents in memory.
#[derive(Debug, Default)]
pub struct MockGraphicsDevice {
    state: Mutex<DeviceState>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets `successes` more buffer creations through, then fails every one.
    pub fn fail_buffers_after(&self, successes: usize) {
        self.state.lock().unwrap().fail_buffers_after = Some(successes);
    }

    pub fn stop_failing(&self) {
        self.state.lock().unwrap().fail_buffers_after = None;
    }

    pub fn buffers_created(&self) -> usize {
        self.state.lock().unwrap().buffers_created
    }

    pub fn buffers_destroyed(&self) -> usize {
        self.state.lock().unwrap().buffers_destroyed
    }

    pub fn live_buffers(&self) -> usize {
        self.state.lock().unwrap().buffers.len()
    }

    pub fn textures_created(&self) -> usize {
        self.state.lock().unwrap().textures_created
    }

    pub fn live_textures(&self) -> usize {
        self.state.lock().unwrap().textures.len()
    }

    /// Destroy calls on ids that were never created or already destroyed.
    pub fn invalid_destroys(&self) -> usize {
        self.state.lock().unwrap().invalid_destroys
    }

    /// The contents of the live buffer with the given label.
    pub fn buffer_data(&self, label: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        let mut matches = state.buffers.values().filter(|(l, _, _)| l == label);
        let found = matches.next().map(|(_, _, data)| data.clone());
        assert!(matches.next().is_none(), "more than one live buffer labelled {label}");
        found
    }

    /// The usage flags of the live buffer with the given label.
    pub fn buffer_usage(&self, label: &str) -> Option<BufferUsage> {
        let state = self.state.lock().unwrap();
        let found = state
            .buffers
            .values()
            .find(|(l, _, _)| l == label)
            .map(|(_, usage, _)| *usage);
        found
    }

    pub fn buffer_ids(&self) -> Vec<BufferId> {
        self.state.lock().unwrap().buffers.keys().copied().collect()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer_with_data(
        &self,
        desc: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let mut state = self.state.lock().unwrap();
        if let Some(remaining) = state.fail_buffers_after.as_mut() {
            if *remaining == 0 {
                return Err(ResourceError::BackendError("out of memory".to_string()));
            }
            *remaining -= 1;
        }
        assert_eq!(desc.size, data.len() as u64);
        state.next_id += 1;
        let id = BufferId(state.next_id);
        let label = desc.label.as_deref().unwrap_or_default().to_string();
        state.buffers.insert(id, (label, desc.usage, data.to_vec()));
        state.buffers_created += 1;
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let mut state = self.state.lock().unwrap();
        if state.buffers.remove(&id).is_none() {
            state.invalid_destroys += 1;
            return Err(ResourceError::InvalidHandle);
        }
        state.buffers_destroyed += 1;
        Ok(())
    }

    fn create_texture_with_data(
        &self,
        desc: &TextureDescriptor,
        data: &[u8],
    ) -> Result<TextureId, ResourceError> {
        let mut state = self.state.lock().unwrap();
        assert_eq!(desc.byte_size(), data.len());
        state.next_id += 1;
        let id = TextureId(state.next_id);
        state.textures.insert(id, data.to_vec());
        state.textures_created += 1;
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut state = self.state.lock().unwrap();
        if state.textures.remove(&id).is_none() {
            state.invalid_destroys += 1;
            return Err(ResourceError::InvalidHandle);
        }
        state.textures_destroyed += 1;
        Ok(())
    }
}

/// One recorded `RenderPass` call.
#[derive(Debug, Clone, PartialEq)]
pub enum PassCommand {
    SetProgram(ShaderProgramId),
    SetTexture(u32, TextureId),
    SetUniformU32(u32, u32),
    SetUniformColor(u32, [f32; 4]),
    SetPolygonMode(PolygonMode),
    SetCullMode(CullMode),
    SetTopology(PrimitiveTopology),
    SetVertexBuffer(u32, BufferId),
    SetIndexBuffer(BufferId, IndexFormat),
    Draw(Range<u32>),
    DrawIndexed(Range<u32>),
}

/// A `RenderPass` that records every command in order.
#[derive(Debug, Default)]
pub struct RecordingPass {
    pub commands: Vec<PassCommand>,
}

impl RecordingPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PassCommand::Draw(_) | PassCommand::DrawIndexed(_)))
            .count()
    }

    pub fn indexed_ranges(&self) -> Vec<Range<u32>> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                PassCommand::DrawIndexed(range) => Some(range.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn programs(&self) -> Vec<ShaderProgramId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                PassCommand::SetProgram(program) => Some(*program),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, command: &PassCommand) -> bool {
        self.commands.contains(command)
    }
}

impl RenderPass for RecordingPass {
    fn set_program(&mut self, program: ShaderProgramId) {
        self.commands.push(PassCommand::SetProgram(program));
    }

    fn set_texture(&mut self, slot: u32, texture: TextureId) {
        self.commands.push(PassCommand::SetTexture(slot, texture));
    }

    fn set_uniform_u32(&mut self, location: u32, value: u32) {
        self.commands.push(PassCommand::SetUniformU32(location, value));
    }

    fn set_uniform_color(&mut self, location: u32, rgba: [f32; 4]) {
        self.commands.push(PassCommand::SetUniformColor(location, rgba));
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.commands.push(PassCommand::SetPolygonMode(mode));
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.commands.push(PassCommand::SetCullMode(mode));
    }

    fn set_topology(&mut self, topology: PrimitiveTopology) {
        self.commands.push(PassCommand::SetTopology(topology));
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, _offset: u64) {
        self.commands.push(PassCommand::SetVertexBuffer(slot, buffer));
    }

    fn set_index_buffer(&mut self, buffer: BufferId, _offset: u64, index_format: IndexFormat) {
        self.commands.push(PassCommand::SetIndexBuffer(buffer, index_format));
    }

    fn draw(&mut self, vertices: Range<u32>, _instances: Range<u32>) {
        self.commands.push(PassCommand::Draw(vertices));
    }

    fn draw_indexed(&mut self, indices: Range<u32>, _base_vertex: i32, _instances: Range<u32>) {
        self.commands.push(PassCommand::DrawIndexed(indices));
    }
}

/// A frustum with a fixed answer and an optional eye position.
#[derive(Debug, Clone, Copy)]
pub struct FixedFrustum {
    pub visibility: Visibility,
    pub eye: Option<Vec3>,
}

impl FixedFrustum {
    pub fn inside() -> Self {
        Self {
            visibility: Visibility::Inside,
            eye: None,
        }
    }

    pub fn outside() -> Self {
        Self {
            visibility: Visibility::Outside,
            eye: None,
        }
    }

    pub fn inside_at(eye: Vec3) -> Self {
        Self {
            visibility: Visibility::Inside,
            eye: Some(eye),
        }
    }
}

impl FrustumTest for FixedFrustum {
    fn test_box(&self, _aabb: &Aabb) -> Visibility {
        self.visibility
    }

    fn eye_position(&self) -> Option<Vec3> {
        self.eye
    }
}

pub const SINGLE: ShaderProgramId = ShaderProgramId(1);
pub const BLENDED: ShaderProgramId = ShaderProgramId(2);
pub const WIREFRAME: ShaderProgramId = ShaderProgramId(3);
pub const BOUNDING_BOX: ShaderProgramId = ShaderProgramId(4);

pub fn draw_config() -> ZoneDrawConfig {
    ZoneDrawConfig::new(ZoneShaders {
        single_material: SINGLE,
        blended_material: BLENDED,
        wireframe: WIREFRAME,
        bounding_box: BOUNDING_BOX,
    })
}

pub fn material(id: u64) -> Arc<TerrainTexture> {
    Arc::new(TerrainTexture::material(id, TextureData::solid_rgba([id as u8, 0, 0, 255])))
}

/// A colormap and a lightmap that are already generated.
pub fn generated_maps() -> (Arc<TerrainTexture>, Arc<TerrainTexture>) {
    let (colormap, lightmap) = pending_maps();
    colormap.mark_generated(TextureData::solid_rgba([0, 255, 0, 255]));
    lightmap.mark_generated(TextureData::solid_rgba([255, 255, 255, 255]));
    (colormap, lightmap)
}

pub fn pending_maps() -> (Arc<TerrainTexture>, Arc<TerrainTexture>) {
    (
        Arc::new(TerrainTexture::pending(ResourceKind::Colormap, 1)),
        Arc::new(TerrainTexture::pending(ResourceKind::Lightmap, 1)),
    )
}

/// `triangles` disjoint triangles along the x axis, with blend weights and
/// texture coordinates, and no rendering parts.
pub fn triangle_soup(triangles: u32) -> ZoneData {
    let vertex_count = triangles * 3;
    let vertices = (0..vertex_count)
        .map(|i| Vec3::new(i as f32, (i % 3) as f32, 0.0))
        .collect();
    let texcoords = (0..vertex_count)
        .map(|i| Vec2::new(i as f32 / vertex_count as f32, 0.0))
        .collect();
    ZoneData::new()
        .with_vertices(vertices)
        .with_indices((0..vertex_count).collect())
        .with_attributes(vec![0.5; vertex_count as usize])
        .with_texcoords(texcoords)
}

/// A complete, drawable zone payload: geometry, one single-material part
/// over every index, and both maps.
pub fn full_zone(
    triangles: u32,
    material: &Arc<TerrainTexture>,
    colormap: &Arc<TerrainTexture>,
    lightmap: &Arc<TerrainTexture>,
) -> ZoneData {
    triangle_soup(triangles)
        .with_parts(vec![RenderingPart::single(0..triangles * 3, material.clone())])
        .with_colormap(colormap.clone())
        .with_lightmap(lightmap.clone())
}
