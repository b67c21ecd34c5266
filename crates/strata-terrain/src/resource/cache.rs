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

use super::shared::{ResourceKey, ResourceRef, SharedResource};
use super::texture::TerrainTexture;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use strata_core::renderer::GraphicsDevice;

/// A central cache of shared terrain textures, keyed by content identity.
///
/// The cache is the only owner allowed to destroy a texture: zones acquire
/// references through [`TextureCache::acquire`] and the render thread
/// periodically calls [`TextureCache::collect_unused`] to evict whatever is no
/// longer referenced.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: RwLock<HashMap<ResourceKey, Arc<TerrainTexture>>>,
}

impl TextureCache {
    /// Creates a new, empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a texture without creating it.
    ///
    /// The returned handle is not counted. Hold a reference from
    /// [`TextureCache::acquire`] for as long as the texture must stay cached.
    pub fn get(&self, key: &ResourceKey) -> Option<Arc<TerrainTexture>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Returns a counted reference to the texture for `key`, creating it on a miss.
    ///
    /// The reference is acquired while the cache lock is held, so a concurrent
    /// [`TextureCache::collect_unused`] cannot evict it in between.
    pub fn acquire<F>(&self, key: ResourceKey, create: F) -> ResourceRef
    where
        F: FnOnce() -> TerrainTexture,
    {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(texture) = entries.get(&key) {
                return ResourceRef::new(texture.clone());
            }
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let texture = entries
            .entry(key)
            .or_insert_with(|| {
                log::debug!("Creating shared texture {key:?}");
                Arc::new(create())
            })
            .clone();
        ResourceRef::new(texture)
    }

    /// The number of cached textures.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if the cache holds no texture.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evicts every texture whose reference count is zero and destroys its
    /// device texture. Returns the number of evicted textures.
    pub fn collect_unused(&self, device: &dyn GraphicsDevice) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let unused: Vec<ResourceKey> = entries
            .iter()
            .filter(|(_, texture)| texture.ref_count() == 0)
            .map(|(key, _)| *key)
            .collect();

        for key in &unused {
            if let Some(texture) = entries.remove(key) {
                if let Err(e) = texture.release_device(device) {
                    log::error!("Failed to destroy device texture of {key:?}: {e}");
                }
            }
        }

        if !unused.is_empty() {
            log::debug!("Evicted {} unused shared textures", unused.len());
        }
        unused.len()
    }
}
