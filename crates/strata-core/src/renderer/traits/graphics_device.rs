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

use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// Resource creation and destruction on the GPU.
///
/// Implementations must be usable from the render thread while other threads
/// hold references to it, hence the `Send + Sync` bound. Command recording is
/// done separately through a [`RenderPass`](crate::renderer::RenderPass).
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a new GPU buffer and initializes it with the provided data.
    /// ## Arguments
    /// * `descriptor` - A reference to a `BufferDescriptor` containing the buffer configuration.
    /// * `data` - A slice of bytes containing the initial data for the buffer.
    /// ## Returns
    /// A `Result` containing the ID of the created buffer or an error if the creation fails.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Destroys a GPU buffer.
    /// ## Arguments
    /// * `id` - The ID of the buffer to be destroyed.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Creates a new GPU texture and uploads its texels.
    /// ## Arguments
    /// * `descriptor` - Size and format of the texture.
    /// * `data` - Tightly packed texel data, `descriptor.byte_size()` bytes long.
    /// ## Returns
    /// A `Result` containing the ID of the created texture or an error if the creation fails.
    fn create_texture_with_data(
        &self,
        descriptor: &TextureDescriptor,
        data: &[u8],
    ) -> Result<TextureId, ResourceError>;

    /// Destroys a GPU texture.
    /// ## Arguments
    /// * `id` - The ID of the texture to be destroyed.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;
}
