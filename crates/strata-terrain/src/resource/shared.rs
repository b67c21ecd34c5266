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

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use strata_core::renderer::{GraphicsDevice, ResourceError, TextureId};

/// The role a shared texture plays for the zones referencing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A surface material blended by rendering parts.
    Material,
    /// A per-zone color map, produced by an external generator.
    Colormap,
    /// A per-zone light map, produced by an external generator.
    Lightmap,
}

/// The content identity of a shared resource.
///
/// Two zones asking for the same key share one device resource. For
/// colormaps and lightmaps the id is typically the zone id; for materials it
/// is the material's catalogue id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    /// The role of the resource.
    pub kind: ResourceKind,
    /// The content id within that role.
    pub id: u64,
}

impl ResourceKey {
    /// Creates a new key.
    pub const fn new(kind: ResourceKind, id: u64) -> Self {
        Self { kind, id }
    }
}

/// An externally owned, reference-counted, lazily uploaded GPU resource.
///
/// Implementations synchronize their own state: the same resource may be
/// acquired and released by many zones from many threads. Destruction is
/// never triggered by the resource itself; the owning cache evicts it once
/// the count is back to zero.
pub trait SharedResource: Send + Sync + fmt::Debug {
    /// The content identity of this resource.
    fn key(&self) -> ResourceKey;

    /// A small id, unique among live materials, used by the blend shaders to
    /// index their per-pixel blend-weight table.
    ///
    /// Ids of dropped materials are reused. Textures that are not materials
    /// return `u32::MAX`.
    fn unique_id(&self) -> u32;

    /// Increments the reference count and returns the new count.
    fn acquire(&self) -> usize;

    /// Decrements the reference count and returns the new count.
    ///
    /// # Panics
    ///
    /// Panics if the count is already zero. This is a caller bug and is never
    /// recovered from.
    fn release(&self) -> usize;

    /// The current reference count.
    fn ref_count(&self) -> usize;

    /// Whether the resource content has been produced.
    fn is_generated(&self) -> bool;

    /// Whether the current content is resident on the device.
    fn is_uploaded(&self) -> bool;

    /// Uploads the content to the device if it is generated and not yet
    /// resident. Idempotent: later calls do nothing.
    fn upload_to_device(&self, device: &dyn GraphicsDevice) -> Result<(), ResourceError>;

    /// The device texture holding the content, once uploaded.
    fn device_texture(&self) -> Option<TextureId>;
}

/// One counted reference to a [`SharedResource`].
///
/// Creating a `ResourceRef` calls [`SharedResource::acquire`], cloning it
/// acquires again, and dropping it calls [`SharedResource::release`]. Moving a
/// `ResourceRef` transfers the reference without touching the count.
pub struct ResourceRef {
    resource: Arc<dyn SharedResource>,
}

impl ResourceRef {
    /// Acquires a new reference to `resource`.
    pub fn new(resource: Arc<dyn SharedResource>) -> Self {
        resource.acquire();
        Self { resource }
    }

    /// Returns the underlying shared resource.
    pub fn resource(&self) -> &Arc<dyn SharedResource> {
        &self.resource
    }

    /// Returns `true` if both references point at the same resource.
    pub fn same_resource(&self, other: &ResourceRef) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }
}

impl<T: SharedResource + 'static> From<Arc<T>> for ResourceRef {
    fn from(resource: Arc<T>) -> Self {
        Self::new(resource)
    }
}

impl Clone for ResourceRef {
    fn clone(&self) -> Self {
        Self::new(self.resource.clone())
    }
}

impl Drop for ResourceRef {
    fn drop(&mut self) {
        self.resource.release();
    }
}

impl Deref for ResourceRef {
    type Target = dyn SharedResource;

    fn deref(&self) -> &Self::Target {
        self.resource.as_ref()
    }
}

impl fmt::Debug for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRef")
            .field("key", &self.resource.key())
            .field("ref_count", &self.resource.ref_count())
            .finish()
    }
}
