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

use super::shared::{ResourceKey, ResourceKind, SharedResource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use strata_core::renderer::{
    GraphicsDevice, ResourceError, TextureDescriptor, TextureFormat, TextureId,
};

/// Tightly packed texel data for a [`TerrainTexture`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    width: u32,
    height: u32,
    format: TextureFormat,
    texels: Vec<u8>,
}

impl TextureData {
    /// Wraps texel data, checking that its length matches the dimensions.
    pub fn new(
        width: u32,
        height: u32,
        format: TextureFormat,
        texels: Vec<u8>,
    ) -> Result<Self, ResourceError> {
        let expected = width as usize * height as usize * format.bytes_per_texel() as usize;
        if texels.len() != expected {
            return Err(ResourceError::OutOfBounds);
        }
        Ok(Self {
            width,
            height,
            format,
            texels,
        })
    }

    /// A single texel of the given color.
    pub fn solid_rgba(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8Unorm,
            texels: rgba.to_vec(),
        }
    }

    fn descriptor(&self) -> TextureDescriptor<'static> {
        TextureDescriptor {
            label: None,
            width: self.width,
            height: self.height,
            format: self.format,
        }
    }
}

#[derive(Debug, Default)]
struct TextureState {
    ref_count: usize,
    data: Option<TextureData>,
    gpu: Option<TextureId>,
    // Set when new content arrives after an upload; the next upload replaces `gpu`.
    stale: bool,
}

/// The texture-backed [`SharedResource`] used for materials, colormaps and lightmaps.
///
/// Materials are created with their content. Colormaps and lightmaps start
/// out pending and become generated when their external generator calls
/// [`TerrainTexture::mark_generated`].
#[derive(Debug)]
pub struct TerrainTexture {
    key: ResourceKey,
    material_id: Option<u32>,
    generated: AtomicBool,
    state: Mutex<TextureState>,
}

/// Hands out small material ids and takes back those of dropped materials.
#[derive(Debug)]
struct MaterialIdPool {
    next: u32,
    free: Vec<u32>,
}

impl MaterialIdPool {
    const fn new() -> Self {
        Self {
            next: 0,
            free: Vec::new(),
        }
    }

    fn alloc(&mut self) -> u32 {
        self.free.pop().unwrap_or_else(|| {
            let id = self.next;
            self.next += 1;
            id
        })
    }

    fn release(&mut self, id: u32) {
        debug_assert!(id < self.next && !self.free.contains(&id));
        self.free.push(id);
    }
}

static MATERIAL_IDS: Mutex<MaterialIdPool> = Mutex::new(MaterialIdPool::new());

fn material_ids() -> MutexGuard<'static, MaterialIdPool> {
    MATERIAL_IDS.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TerrainTexture {
    /// Creates a generated material texture.
    pub fn material(id: u64, data: TextureData) -> Self {
        Self::with_data(ResourceKey::new(ResourceKind::Material, id), Some(data))
    }

    /// Creates a texture whose content has not been produced yet.
    pub fn pending(kind: ResourceKind, id: u64) -> Self {
        Self::with_data(ResourceKey::new(kind, id), None)
    }

    fn with_data(key: ResourceKey, data: Option<TextureData>) -> Self {
        Self {
            key,
            material_id: (key.kind == ResourceKind::Material).then(|| material_ids().alloc()),
            generated: AtomicBool::new(data.is_some()),
            state: Mutex::new(TextureState {
                data,
                ..Default::default()
            }),
        }
    }

    /// Supplies the content produced by an external generator.
    ///
    /// If older content was already uploaded, the next
    /// [`upload_to_device`](SharedResource::upload_to_device) replaces it.
    pub fn mark_generated(&self, data: TextureData) {
        let mut state = self.lock();
        state.stale = state.gpu.is_some();
        state.data = Some(data);
        self.generated.store(true, Ordering::Release);
        log::trace!("{:?} generated", self.key);
    }

    /// Destroys the device texture, keeping the CPU content.
    ///
    /// Called by the owning cache on eviction.
    pub fn release_device(&self, device: &dyn GraphicsDevice) -> Result<(), ResourceError> {
        let mut state = self.lock();
        state.stale = false;
        match state.gpu.take() {
            Some(id) => device.destroy_texture(id),
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TextureState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SharedResource for TerrainTexture {
    fn key(&self) -> ResourceKey {
        self.key
    }

    fn unique_id(&self) -> u32 {
        self.material_id.unwrap_or(u32::MAX)
    }

    fn acquire(&self) -> usize {
        let mut state = self.lock();
        state.ref_count += 1;
        state.ref_count
    }

    fn release(&self) -> usize {
        let mut state = self.lock();
        if state.ref_count == 0 {
            drop(state);
            panic!("release() on {:?} with no outstanding references", self.key);
        }
        state.ref_count -= 1;
        state.ref_count
    }

    fn ref_count(&self) -> usize {
        self.lock().ref_count
    }

    fn is_generated(&self) -> bool {
        self.generated.load(Ordering::Acquire)
    }

    fn is_uploaded(&self) -> bool {
        let state = self.lock();
        state.gpu.is_some() && !state.stale
    }

    fn upload_to_device(&self, device: &dyn GraphicsDevice) -> Result<(), ResourceError> {
        let mut state = self.lock();
        if state.gpu.is_some() && !state.stale {
            return Ok(());
        }
        let Some(data) = state.data.as_ref() else {
            return Ok(());
        };

        let id = device.create_texture_with_data(&data.descriptor(), &data.texels)?;
        if let Some(old) = state.gpu.replace(id) {
            if let Err(e) = device.destroy_texture(old) {
                log::warn!("Failed to destroy superseded texture for {:?}: {e}", self.key);
            }
        }
        state.stale = false;
        log::debug!("Uploaded {:?} as {:?}", self.key, id);
        Ok(())
    }

    fn device_texture(&self) -> Option<TextureId> {
        self.lock().gpu
    }
}

impl Drop for TerrainTexture {
    fn drop(&mut self) {
        if let Some(id) = self.material_id {
            material_ids().release(id);
        }
    }
}
