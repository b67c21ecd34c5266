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

//! # Strata Terrain
//!
//! The terrain zone streaming and commit pipeline.
//!
//! A background producer computes zone geometry at some level of detail and
//! hands it to a [`ZoneRenderer`](zone::ZoneRenderer) through `set_data`. The
//! render thread later promotes that staged snapshot to device-resident form,
//! exactly once per generation, and only ever draws from a fully committed
//! snapshot whose shared textures are ready.
//!
//! Shared textures (materials, colormaps, lightmaps) are reference counted
//! explicitly through [`SharedResource`](resource::SharedResource). Zones hold
//! strong references to resources and resources never point back at zones, so
//! no ownership cycle can form.

#![warn(missing_docs)]

pub mod error;
pub mod resource;
pub mod zone;

pub use error::CommitError;
pub use resource::{
    ResourceKey, ResourceKind, ResourceRef, SharedResource, TerrainTexture, TextureCache,
    TextureData,
};
pub use zone::{
    CommitOutcome, DrawOutcome, PartMaterials, RenderingPart, ZoneData, ZoneDrawConfig,
    ZoneRenderer, ZoneShaders, ZoneState, ZoneStatsSnapshot,
};
