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

//! The visibility contract between the scene and anything it draws.
//!
//! Frustum math itself lives with the scene's camera; drawables only see the
//! [`FrustumTest`] trait and the classification it returns.

use crate::math::{Aabb, Vec3};

/// The classification of a bounding volume against a view frustum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// The volume is entirely inside the frustum.
    Inside,
    /// The volume straddles at least one frustum plane.
    Intersecting,
    /// The volume is entirely outside the frustum and must not be drawn.
    Outside,
}

impl Visibility {
    /// Returns `true` unless the volume is entirely outside.
    #[inline]
    pub fn is_visible(self) -> bool {
        !matches!(self, Visibility::Outside)
    }
}

/// A view frustum supplied by the scene for a single frame.
pub trait FrustumTest {
    /// Classifies a world-space bounding box against the frustum.
    fn test_box(&self, aabb: &Aabb) -> Visibility;

    /// The world-space position of the viewer, if known.
    ///
    /// Used for distance-based quality decisions. Returning `None` disables them.
    fn eye_position(&self) -> Option<Vec3> {
        None
    }
}

impl<F> FrustumTest for F
where
    F: Fn(&Aabb) -> Visibility,
{
    fn test_box(&self, aabb: &Aabb) -> Visibility {
        self(aabb)
    }
}
