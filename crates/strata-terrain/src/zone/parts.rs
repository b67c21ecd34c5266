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

//! The rendering-part table: which index ranges are drawn with which materials.

use crate::error::CommitError;
use crate::resource::ResourceRef;
use std::ops::Range;
use strata_core::renderer::{GraphicsDevice, ResourceError};

/// The one or two materials a rendering part blends.
#[derive(Debug, Clone, PartialEq)]
pub enum PartMaterials<T> {
    /// Drawn with the single-material program.
    Single(T),
    /// Drawn with the two-material blend program, weighted by the per-vertex
    /// blend attribute.
    Blend(T, T),
}

impl<T> PartMaterials<T> {
    /// The first material.
    pub fn primary(&self) -> &T {
        match self {
            PartMaterials::Single(a) | PartMaterials::Blend(a, _) => a,
        }
    }

    /// The second material of a blend.
    pub fn secondary(&self) -> Option<&T> {
        match self {
            PartMaterials::Single(_) => None,
            PartMaterials::Blend(_, b) => Some(b),
        }
    }

    /// Iterates the materials in binding order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        std::iter::once(self.primary()).chain(self.secondary())
    }

    /// Converts every material, keeping binding order.
    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> PartMaterials<U> {
        match self {
            PartMaterials::Single(a) => PartMaterials::Single(f(a)),
            PartMaterials::Blend(a, b) => {
                let a = f(a);
                PartMaterials::Blend(a, f(b))
            }
        }
    }
}

/// A contiguous range of the index buffer drawn with one or two materials.
///
/// A part holds one counted reference per material from the moment it is
/// built. Staging moves those references into the zone without recounting.
#[derive(Debug, Clone)]
pub struct RenderingPart {
    /// The range of the index buffer covered by this part.
    pub indices: Range<u32>,
    /// The materials blended over that range.
    pub materials: PartMaterials<ResourceRef>,
}

impl RenderingPart {
    /// A part drawn with a single material.
    pub fn single(indices: Range<u32>, material: impl Into<ResourceRef>) -> Self {
        Self {
            indices,
            materials: PartMaterials::Single(material.into()),
        }
    }

    /// A part blending two materials.
    pub fn blend(
        indices: Range<u32>,
        first: impl Into<ResourceRef>,
        second: impl Into<ResourceRef>,
    ) -> Self {
        Self {
            indices,
            materials: PartMaterials::Blend(first.into(), second.into()),
        }
    }
}

/// A rendering-part table that owns its material references.
///
/// Dropping the table releases every material it references, exactly once.
#[derive(Debug, Default)]
pub(crate) struct RenderingPartTable {
    parts: Vec<RenderingPart>,
}

impl RenderingPartTable {
    pub fn new(parts: Vec<RenderingPart>) -> Self {
        Self { parts }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderingPart> {
        self.parts.iter()
    }

    /// Checks that the table is non-empty and every part fits `index_count`.
    pub fn validate(&self, index_count: usize) -> Result<(), CommitError> {
        if self.is_empty() {
            return Err(CommitError::EmptyPartTable);
        }
        for (i, part) in self.parts.iter().enumerate() {
            let range = &part.indices;
            if range.start > range.end || range.end as usize > index_count {
                return Err(CommitError::PartOutOfRange {
                    part: i,
                    range: range.clone(),
                    indices: index_count,
                });
            }
        }
        Ok(())
    }

    /// Uploads every referenced material that is not resident yet.
    pub fn upload_materials(&self, device: &dyn GraphicsDevice) -> Result<(), ResourceError> {
        for part in &self.parts {
            for material in part.materials.iter() {
                material.upload_to_device(device)?;
            }
        }
        Ok(())
    }
}
