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

//! Promotion of a staged snapshot to device-resident geometry.
//!
//! A commit validates the *effective* geometry (staged fields where present,
//! previously committed ones otherwise), uploads whatever changed, and only
//! then replaces the committed slot. Any failure leaves the slot untouched and
//! frees the buffers created along the way.

use super::geometry::{CommittedGeometry, GpuArray, GpuBuffers, StagedGeometry};
use crate::error::CommitError;
use bytemuck::Pod;
use strata_core::math::Aabb;
use strata_core::renderer::{BufferDescriptor, BufferId, BufferUsage, GraphicsDevice, ResourceError};

/// What a successful commit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CommitSummary {
    pub generation: u64,
    pub buffers_uploaded: usize,
    pub buffers_destroyed: usize,
}

/// Commits `staged` into `slot`.
///
/// On error `slot` is left exactly as it was and `staged` is dropped, which
/// releases every resource reference it held.
pub(crate) fn commit(
    slot: &mut Option<CommittedGeometry>,
    staged: StagedGeometry,
    device: &dyn GraphicsDevice,
) -> Result<CommitSummary, CommitError> {
    validate(slot.as_ref(), &staged)?;

    let mut uploader = Uploader::new(device);
    let prepared = match prepare(&mut uploader, slot.as_ref(), &staged) {
        Ok(prepared) => prepared,
        Err(e) => {
            uploader.discard();
            return Err(e);
        }
    };
    let buffers_uploaded = uploader.created.len();

    let (geometry, buffers_destroyed) = install(slot.take(), staged, prepared, device);
    let generation = geometry.generation;
    log::trace!(
        "Installed generation {generation} with {} rendering parts",
        geometry.parts.len()
    );
    *slot = Some(geometry);

    Ok(CommitSummary {
        generation,
        buffers_uploaded,
        buffers_destroyed,
    })
}

/// Checks the geometry that would be committed, in a fixed order so the
/// reported error is deterministic.
fn validate(
    previous: Option<&CommittedGeometry>,
    staged: &StagedGeometry,
) -> Result<(), CommitError> {
    let committed_len = |pick: fn(&GpuBuffers) -> Option<GpuArray>| {
        previous
            .and_then(|g| pick(&g.buffers))
            .map_or(0, |array| array.len as usize)
    };

    let vertices = staged
        .vertices
        .as_ref()
        .map_or_else(|| committed_len(|b| Some(b.positions)), Vec::len);
    let indices = staged
        .indices
        .as_ref()
        .map_or_else(|| committed_len(|b| Some(b.indices)), Vec::len);
    let attributes = staged
        .attributes
        .as_ref()
        .map_or_else(|| committed_len(|b| Some(b.attributes)), Vec::len);
    let texcoords = match &staged.texcoords {
        Some(texcoords) => Some(texcoords.len()),
        None => previous
            .and_then(|g| g.buffers.texcoords)
            .map(|array| array.len as usize),
    };

    if vertices == 0 {
        return Err(CommitError::EmptyVertices);
    }
    if indices == 0 {
        return Err(CommitError::EmptyIndices);
    }
    if indices % 3 != 0 {
        return Err(CommitError::IndexCountNotTriangles { indices });
    }
    if attributes < vertices {
        return Err(CommitError::AttributesTooShort {
            attributes,
            vertices,
        });
    }
    if let Some(texcoords) = texcoords.filter(|&len| len < vertices) {
        return Err(CommitError::TexcoordsTooShort {
            texcoords,
            vertices,
        });
    }

    let max_index = effective_max_index(previous, staged);
    if max_index as usize >= vertices {
        return Err(CommitError::IndexOutOfRange {
            index: max_index,
            vertices,
        });
    }

    match staged.parts.as_ref().or(previous.map(|g| &g.parts)) {
        Some(parts) => parts.validate(indices),
        None => Err(CommitError::EmptyPartTable),
    }
}

fn effective_max_index(previous: Option<&CommittedGeometry>, staged: &StagedGeometry) -> u32 {
    match &staged.indices {
        Some(indices) => indices.iter().copied().max().unwrap_or(0),
        None => previous.map_or(0, |g| g.max_index),
    }
}

/// Device work done before the committed slot is touched.
struct Prepared {
    buffers: GpuBuffers,
    max_index: u32,
    local_bounds: Aabb,
}

fn prepare(
    uploader: &mut Uploader<'_>,
    previous: Option<&CommittedGeometry>,
    staged: &StagedGeometry,
) -> Result<Prepared, CommitError> {
    let kept = previous.map(|g| g.buffers);
    let vertex_usage = BufferUsage::VERTEX;
    let index_usage = BufferUsage::INDEX;

    let positions = match (&staged.vertices, kept) {
        (Some(vertices), _) => uploader.upload("Zone Positions", vertex_usage, vertices)?,
        (None, Some(kept)) => kept.positions,
        (None, None) => return Err(CommitError::EmptyVertices),
    };
    let indices = match (&staged.indices, kept) {
        (Some(indices), _) => uploader.upload("Zone Indices", index_usage, indices)?,
        (None, Some(kept)) => kept.indices,
        (None, None) => return Err(CommitError::EmptyIndices),
    };
    let attributes = match (&staged.attributes, kept) {
        (Some(attributes), _) => uploader.upload("Zone Blend Attributes", vertex_usage, attributes)?,
        (None, Some(kept)) => kept.attributes,
        (None, None) => {
            return Err(CommitError::AttributesTooShort {
                attributes: 0,
                vertices: positions.len as usize,
            })
        }
    };
    let texcoords = match (&staged.texcoords, kept) {
        (Some(texcoords), _) => Some(uploader.upload("Zone Texcoords", vertex_usage, texcoords)?),
        (None, kept) => kept.and_then(|kept| kept.texcoords),
    };

    let (local_bounds, bounds_lines) = match (&staged.vertices, previous) {
        (Some(vertices), _) => {
            let bounds = Aabb::from_points(vertices).ok_or(CommitError::EmptyVertices)?;
            let lines = uploader.upload("Zone Bounds", vertex_usage, &bounds.edge_lines())?;
            (bounds, lines)
        }
        (None, Some(previous)) => (previous.local_bounds, previous.buffers.bounds_lines),
        (None, None) => return Err(CommitError::EmptyVertices),
    };

    // Materials of an incoming table, and newly assigned maps, are uploaded
    // before anything is installed. Maps still pending generation are skipped
    // and picked up lazily by draw.
    if let Some(parts) = &staged.parts {
        parts.upload_materials(uploader.device)?;
    }
    for map in [&staged.colormap, &staged.lightmap].into_iter().flatten() {
        map.upload_to_device(uploader.device)?;
    }

    Ok(Prepared {
        buffers: GpuBuffers {
            positions,
            indices,
            attributes,
            texcoords,
            bounds_lines,
        },
        max_index: effective_max_index(previous, staged),
        local_bounds,
    })
}

/// Builds the new committed geometry and retires what it supersedes.
fn install(
    previous: Option<CommittedGeometry>,
    staged: StagedGeometry,
    prepared: Prepared,
    device: &dyn GraphicsDevice,
) -> (CommittedGeometry, usize) {
    let StagedGeometry {
        generation,
        parts,
        colormap,
        lightmap,
        ..
    } = staged;

    let mut destroyed = 0;
    let (old_parts, old_colormap, old_lightmap) = match previous {
        Some(old) => {
            let fresh: Vec<BufferId> = prepared.buffers.ids().collect();
            for id in old.buffers.ids().filter(|id| !fresh.contains(id)) {
                match device.destroy_buffer(id) {
                    Ok(()) => destroyed += 1,
                    Err(e) => log::error!("Failed to destroy superseded zone buffer {id:?}: {e}"),
                }
            }
            (Some(old.parts), old.colormap, old.lightmap)
        }
        None => (None, None, None),
    };

    // Replaced references drop here, releasing anything only the outgoing
    // commit was holding.
    let geometry = CommittedGeometry {
        generation,
        buffers: prepared.buffers,
        max_index: prepared.max_index,
        local_bounds: prepared.local_bounds,
        parts: parts.or(old_parts).unwrap_or_default(),
        colormap: colormap.or(old_colormap),
        lightmap: lightmap.or(old_lightmap),
    };
    (geometry, destroyed)
}

/// Creates buffers and remembers them so a failed commit can free them.
struct Uploader<'d> {
    device: &'d dyn GraphicsDevice,
    created: Vec<BufferId>,
}

impl<'d> Uploader<'d> {
    fn new(device: &'d dyn GraphicsDevice) -> Self {
        Self {
            device,
            created: Vec::new(),
        }
    }

    fn upload<T: Pod>(
        &mut self,
        label: &'static str,
        usage: BufferUsage,
        data: &[T],
    ) -> Result<GpuArray, CommitError> {
        let len = u32::try_from(data.len()).map_err(|_| ResourceError::OutOfBounds)?;
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let descriptor = BufferDescriptor {
            label: Some(label.into()),
            size: bytes.len() as u64,
            usage,
        };
        let buffer = self.device.create_buffer_with_data(&descriptor, bytes)?;
        self.created.push(buffer);
        Ok(GpuArray { buffer, len })
    }

    fn discard(self) {
        for id in self.created {
            if let Err(e) = self.device.destroy_buffer(id) {
                log::error!("Failed to free buffer {id:?} of a rejected commit: {e}");
            }
        }
    }
}
