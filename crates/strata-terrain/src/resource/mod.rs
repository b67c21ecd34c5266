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

//! Reference-counted shared textures and the cache that owns them.
//!
//! Resources are created and evicted by a [`TextureCache`]; zones only ever
//! acquire, release and upload them. A [`ResourceRef`] is one counted
//! reference: creating or cloning it acquires, dropping it releases.

mod cache;
mod shared;
mod texture;

pub use cache::TextureCache;
pub use shared::{ResourceKey, ResourceKind, ResourceRef, SharedResource};
pub use texture::{TerrainTexture, TextureData};
