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

// Strata Sandbox
// Streams a ring of terrain zones from producer threads while a render loop
// commits and draws them through a headless logging device.

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use strata_core::culling::{FrustumTest, Visibility};
use strata_core::math::{Aabb, Vec2, Vec3};
use strata_core::renderer::{
    BufferDescriptor, BufferId, CullMode, GraphicsDevice, IndexFormat, PolygonMode,
    PrimitiveTopology, RenderPass, ResourceError, ShaderProgramId, TerrainRenderSettings,
    TextureDescriptor, TextureId,
};
use strata_terrain::{
    DrawOutcome, RenderingPart, ResourceKey, ResourceKind, ResourceRef, TerrainTexture,
    TextureCache, TextureData, ZoneData, ZoneDrawConfig, ZoneRenderer, ZoneShaders,
};

const ZONE_SIZE: f32 = 64.0;
const ZONES_PER_SIDE: u64 = 4;
const LOD_LEVELS: u32 = 4;
const FRAMES: usize = 120;

/// A device that only counts allocations.
#[derive(Debug, Default)]
struct HeadlessDevice {
    next_id: AtomicUsize,
    live_buffers: AtomicUsize,
    live_textures: AtomicUsize,
    uploaded_bytes: AtomicUsize,
}

impl GraphicsDevice for HeadlessDevice {
    fn create_buffer_with_data(
        &self,
        desc: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.live_buffers.fetch_add(1, Ordering::Relaxed);
        self.uploaded_bytes.fetch_add(data.len(), Ordering::Relaxed);
        log::trace!("create buffer {:?} {:?} ({} bytes)", id, desc.label, data.len());
        Ok(id)
    }

    fn destroy_buffer(&self, _id: BufferId) -> Result<(), ResourceError> {
        self.live_buffers.fetch_sub(1, Ordering::Relaxed);
        Ok(())
    }

    fn create_texture_with_data(
        &self,
        desc: &TextureDescriptor,
        data: &[u8],
    ) -> Result<TextureId, ResourceError> {
        let id = TextureId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.live_textures.fetch_add(1, Ordering::Relaxed);
        self.uploaded_bytes.fetch_add(data.len(), Ordering::Relaxed);
        log::trace!("create texture {:?} {}x{}", id, desc.width, desc.height);
        Ok(id)
    }

    fn destroy_texture(&self, _id: TextureId) -> Result<(), ResourceError> {
        self.live_textures.fetch_sub(1, Ordering::Relaxed);
        Ok(())
    }
}

/// A render pass that counts the draw calls and triangles it receives.
#[derive(Debug, Default)]
struct CountingPass {
    draw_calls: usize,
    triangles: usize,
}

impl RenderPass for CountingPass {
    fn set_program(&mut self, _program: ShaderProgramId) {}
    fn set_texture(&mut self, _slot: u32, _texture: TextureId) {}
    fn set_uniform_u32(&mut self, _location: u32, _value: u32) {}
    fn set_uniform_color(&mut self, _location: u32, _rgba: [f32; 4]) {}
    fn set_polygon_mode(&mut self, _mode: PolygonMode) {}
    fn set_cull_mode(&mut self, _mode: CullMode) {}
    fn set_topology(&mut self, _topology: PrimitiveTopology) {}
    fn set_vertex_buffer(&mut self, _slot: u32, _buffer: BufferId, _offset: u64) {}
    fn set_index_buffer(&mut self, _buffer: BufferId, _offset: u64, _format: IndexFormat) {}

    fn draw(&mut self, _vertices: Range<u32>, _instances: Range<u32>) {
        self.draw_calls += 1;
    }

    fn draw_indexed(&mut self, indices: Range<u32>, _base_vertex: i32, _instances: Range<u32>) {
        self.draw_calls += 1;
        self.triangles += indices.len() / 3;
    }
}

/// A camera sliding along the x axis that sees a fixed-width window.
struct SlidingCamera {
    eye: Vec3,
    half_width: f32,
}

impl FrustumTest for SlidingCamera {
    fn test_box(&self, aabb: &Aabb) -> Visibility {
        let view = Aabb::from_min_max(
            Vec3::new(self.eye.x - self.half_width, -1000.0, -1000.0),
            Vec3::new(self.eye.x + self.half_width, 1000.0, 1000.0),
        );
        if view.contains_aabb(aabb) {
            Visibility::Inside
        } else if view.intersects_aabb(aabb) {
            Visibility::Intersecting
        } else {
            Visibility::Outside
        }
    }

    fn eye_position(&self) -> Option<Vec3> {
        Some(self.eye)
    }
}

/// A heightfield grid for one zone at a level of detail; lod 0 is the coarsest.
fn zone_mesh(zone_id: u64, lod: u32, materials: &[ResourceRef]) -> ZoneData {
    let cells = 4u32 << lod;
    let step = ZONE_SIZE / cells as f32;
    let side = cells + 1;

    let mut vertices = Vec::with_capacity((side * side) as usize);
    let mut texcoords = Vec::with_capacity(vertices.capacity());
    let mut attributes = Vec::with_capacity(vertices.capacity());
    for z in 0..side {
        for x in 0..side {
            let (fx, fz) = (x as f32 * step, z as f32 * step);
            let height = (fx * 0.1 + zone_id as f32).sin() * (fz * 0.07).cos() * 4.0;
            vertices.push(Vec3::new(fx, height, fz));
            texcoords.push(Vec2::new(x as f32 / cells as f32, z as f32 / cells as f32));
            attributes.push((height / 8.0 + 0.5).clamp(0.0, 1.0));
        }
    }

    let mut indices = Vec::with_capacity((cells * cells * 6) as usize);
    for z in 0..cells {
        for x in 0..cells {
            let i = z * side + x;
            indices.extend_from_slice(&[i, i + side, i + 1, i + 1, i + side, i + side + 1]);
        }
    }

    // Lower rows are grass, upper rows blend dirt into rock.
    let split = (cells / 2) * cells * 6;
    let total = indices.len() as u32;
    let grass = materials[zone_id as usize % materials.len()].clone();
    let parts = vec![
        RenderingPart::single(0..split, grass),
        RenderingPart::blend(split..total, materials[1].clone(), materials[2].clone()),
    ];

    ZoneData::new()
        .with_vertices(vertices)
        .with_indices(indices)
        .with_attributes(attributes)
        .with_texcoords(texcoords)
        .with_parts(parts)
}

fn load_settings() -> Result<TerrainRenderSettings> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading render settings from {path}"))?;
            let settings = TerrainRenderSettings::from_ron_str(&text)
                .with_context(|| format!("parsing render settings in {path}"))?;
            log::info!("Loaded render settings from {path}");
            Ok(settings)
        }
        None => {
            let settings = TerrainRenderSettings {
                blend_fade_distance: Some(ZONE_SIZE * 2.0),
                ..Default::default()
            };
            log::info!("Using default render settings:\n{}", settings.to_ron_string()?);
            Ok(settings)
        }
    }
}

/// Acquires a zone map from the cache, along with the handle its generator fills in.
fn acquire_map(
    cache: &TextureCache,
    kind: ResourceKind,
    zone_id: u64,
) -> Result<(ResourceRef, Arc<TerrainTexture>)> {
    let key = ResourceKey::new(kind, zone_id);
    let counted = cache.acquire(key, || TerrainTexture::pending(kind, zone_id));
    let generator = cache
        .get(&key)
        .with_context(|| format!("{key:?} left the cache while referenced"))?;
    Ok((counted, generator))
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = ZoneDrawConfig {
        settings: load_settings()?,
        shaders: ZoneShaders {
            single_material: ShaderProgramId(1),
            blended_material: ShaderProgramId(2),
            wireframe: ShaderProgramId(3),
            bounding_box: ShaderProgramId(4),
        },
    };

    let device = HeadlessDevice::default();
    let cache = TextureCache::new();
    let materials: Vec<ResourceRef> = (0..3u64)
        .map(|id| {
            cache.acquire(ResourceKey::new(ResourceKind::Material, id), || {
                TerrainTexture::material(id, TextureData::solid_rgba([40 * id as u8, 120, 60, 255]))
            })
        })
        .collect();

    let zones: Vec<Arc<ZoneRenderer>> = (0..ZONES_PER_SIDE * ZONES_PER_SIDE)
        .map(|id| {
            let (x, z) = (id % ZONES_PER_SIDE, id / ZONES_PER_SIDE);
            Arc::new(ZoneRenderer::new(
                id,
                Vec3::new(x as f32 * ZONE_SIZE, 0.0, z as f32 * ZONE_SIZE),
            ))
        })
        .collect();

    // One producer per row refines its zones one level of detail at a time.
    // Maps are generated after the first geometry, so zones start out waiting.
    let producers = zones
        .chunks(ZONES_PER_SIDE as usize)
        .map(|row| -> Result<_> {
            let row: Vec<Arc<ZoneRenderer>> = row.to_vec();
            let materials = materials.clone();
            let maps = row
                .iter()
                .map(|zone| -> Result<_> {
                    let id = zone.zone_id();
                    Ok((
                        acquire_map(&cache, ResourceKind::Colormap, id)?,
                        acquire_map(&cache, ResourceKind::Lightmap, id)?,
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(thread::spawn(move || {
                for lod in 0..LOD_LEVELS {
                    for (zone, (colormap, lightmap)) in row.iter().zip(&maps) {
                        let mut data = zone_mesh(zone.zone_id(), lod, &materials);
                        if lod == 0 {
                            data = data
                                .with_colormap(colormap.0.clone())
                                .with_lightmap(lightmap.0.clone());
                        }
                        zone.set_data(data);
                        if lod == 1 {
                            let tint = (zone.zone_id() * 16) as u8;
                            colormap.1.mark_generated(TextureData::solid_rgba([tint, 160, 80, 255]));
                            lightmap.1.mark_generated(TextureData::solid_rgba([255, 255, 255, 255]));
                        }
                    }
                    thread::sleep(Duration::from_millis(15));
                }
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    let world_width = ZONE_SIZE * ZONES_PER_SIDE as f32;
    for frame in 0..FRAMES {
        let camera = SlidingCamera {
            eye: Vec3::new(world_width * frame as f32 / FRAMES as f32, 30.0, world_width / 2.0),
            half_width: ZONE_SIZE * 1.5,
        };
        let mut pass = CountingPass::default();
        let (mut drawn, mut culled, mut waiting) = (0, 0, 0);
        for zone in &zones {
            match zone.draw(&device, &mut pass, &camera, &config) {
                DrawOutcome::Drawn { .. } => drawn += 1,
                DrawOutcome::Culled => culled += 1,
                DrawOutcome::NotReady => waiting += 1,
            }
        }
        if frame % 20 == 0 {
            log::info!(
                "frame {frame}: {drawn} drawn, {culled} culled, {waiting} waiting, {} calls, {} triangles",
                pass.draw_calls,
                pass.triangles
            );
        }
        thread::sleep(Duration::from_millis(2));
    }

    for producer in producers {
        producer
            .join()
            .map_err(|_| anyhow::anyhow!("a zone producer thread panicked"))?;
    }

    for zone in &zones {
        let stats = zone.stats();
        log::info!(
            "zone {} ({:?}, generation {:?}): {} commits, {} rejections, {} buffers, {} draw calls",
            zone.zone_id(),
            zone.state(),
            zone.committed_generation(),
            stats.commits,
            stats.rejections,
            stats.buffer_uploads,
            stats.draw_calls
        );
        zone.clean(&device);
    }

    drop(materials);
    let evicted = cache.collect_unused(&device);
    log::info!(
        "Shutdown: evicted {evicted} textures, {} buffers and {} textures still live, {} bytes uploaded",
        device.live_buffers.load(Ordering::Relaxed),
        device.live_textures.load(Ordering::Relaxed),
        device.uploaded_bytes.load(Ordering::Relaxed)
    );
    Ok(())
}
