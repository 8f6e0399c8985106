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


use crate::renderer::error::GpuError;
use std::fmt::Debug;

/// The rotating set of images consumed by the display.
///
/// The owner of the window drives the swapchain: it calls
/// [`prepare_next_frame`](Self::prepare_next_frame) before recording a frame and
/// [`resize`](Self::resize) when the surface changes.
pub trait Swapchain: Send + Debug + 'static {
    /// Acquires the next presentable image and returns its index.
    ///
    /// ## Errors
    /// * `GpuError::SwapchainOutOfDate` - If the surface changed and `resize` must be called.
    fn prepare_next_frame(&mut self) -> Result<u32, GpuError>;

    /// Recreates the images for a new surface size.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), GpuError>;

    /// The index of the image the current frame renders into.
    fn current_image_index(&self) -> u32;

    /// The number of images in the swapchain.
    fn image_count(&self) -> u32;

    /// The current `(width, height)` of the images.
    fn extent(&self) -> (u32, u32);
}
