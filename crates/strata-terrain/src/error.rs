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

//! Errors reported when a staged zone snapshot cannot be committed.

use std::fmt;
use std::ops::Range;
use strata_core::renderer::ResourceError;

/// Why a staged snapshot was rejected at commit time.
///
/// All variants are recoverable: the snapshot is discarded, its resource
/// references released, and the zone keeps drawing its previous commit.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitError {
    /// The zone has no vertices.
    EmptyVertices,
    /// The zone has no indices.
    EmptyIndices,
    /// The index count does not describe whole triangles.
    IndexCountNotTriangles {
        /// The number of indices.
        indices: usize,
    },
    /// There are fewer blend attributes than vertices.
    AttributesTooShort {
        /// The number of blend attributes.
        attributes: usize,
        /// The number of vertices.
        vertices: usize,
    },
    /// There are texture coordinates, but fewer than vertices.
    TexcoordsTooShort {
        /// The number of texture coordinates.
        texcoords: usize,
        /// The number of vertices.
        vertices: usize,
    },
    /// An index refers past the end of the vertex array.
    IndexOutOfRange {
        /// The largest index found.
        index: u32,
        /// The number of vertices.
        vertices: usize,
    },
    /// The rendering-part table is empty.
    EmptyPartTable,
    /// A rendering part covers indices past the end of the index array.
    PartOutOfRange {
        /// The position of the part in its table.
        part: usize,
        /// The index range of the part.
        range: Range<u32>,
        /// The number of indices.
        indices: usize,
    },
    /// The device failed to create a buffer or upload a material.
    Device(ResourceError),
}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitError::EmptyVertices => write!(f, "zone has no vertices"),
            CommitError::EmptyIndices => write!(f, "zone has no indices"),
            CommitError::IndexCountNotTriangles { indices } => {
                write!(f, "index count {indices} is not a multiple of 3")
            }
            CommitError::AttributesTooShort {
                attributes,
                vertices,
            } => write!(
                f,
                "{attributes} blend attributes for {vertices} vertices"
            ),
            CommitError::TexcoordsTooShort {
                texcoords,
                vertices,
            } => write!(f, "{texcoords} texture coordinates for {vertices} vertices"),
            CommitError::IndexOutOfRange { index, vertices } => {
                write!(f, "index {index} out of range for {vertices} vertices")
            }
            CommitError::EmptyPartTable => write!(f, "rendering-part table is empty"),
            CommitError::PartOutOfRange {
                part,
                range,
                indices,
            } => write!(
                f,
                "rendering part {part} covers {range:?} but only {indices} indices exist"
            ),
            CommitError::Device(err) => write!(f, "device upload failed: {err}"),
        }
    }
}

impl std::error::Error for CommitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommitError::Device(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for CommitError {
    fn from(err: ResourceError) -> Self {
        CommitError::Device(err)
    }
}
