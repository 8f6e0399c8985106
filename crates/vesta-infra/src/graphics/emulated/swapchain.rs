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


use vesta_core::renderer::{GpuError, Swapchain};

/// A ring of presentable images with no surface behind it.
#[derive(Debug)]
pub struct EmulatedSwapchain {
    extent: (u32, u32),
    image_count: u32,
    index: u32,
    acquired: bool,
    out_of_date: bool,
}

impl EmulatedSwapchain {
    pub(crate) fn new(width: u32, height: u32, image_count: u32) -> Self {
        Self {
            extent: (width, height),
            image_count: image_count.max(2),
            index: 0,
            acquired: false,
            out_of_date: false,
        }
    }

    /// Marks the swapchain as no longer matching its surface, as a window
    /// resize would. Cleared by [`resize`](Swapchain::resize).
    pub fn invalidate(&mut self) {
        self.out_of_date = true;
    }

    /// Returns `true` if `prepare_next_frame` acquired an image that has not
    /// been presented yet.
    pub fn is_image_acquired(&self) -> bool {
        self.acquired
    }

    /// Returns `true` if the swapchain must be resized before further use.
    pub fn is_out_of_date(&self) -> bool {
        self.out_of_date
    }

    /// Hands the current image to the display and moves to the next one.
    pub(crate) fn advance(&mut self) {
        self.index = (self.index + 1) % self.image_count;
        self.acquired = false;
    }
}

impl Swapchain for EmulatedSwapchain {
    fn prepare_next_frame(&mut self) -> Result<u32, GpuError> {
        if self.out_of_date {
            return Err(GpuError::SwapchainOutOfDate);
        }
        self.acquired = true;
        Ok(self.index)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), GpuError> {
        if width == 0 || height == 0 {
            log::warn!("Ignoring swapchain resize to zero dimensions: {width}x{height}");
            return Ok(());
        }
        log::debug!("Resizing emulated swapchain to {width}x{height}");
        self.extent = (width, height);
        self.index = 0;
        self.acquired = false;
        self.out_of_date = false;
        Ok(())
    }

    fn current_image_index(&self) -> u32 {
        self.index
    }

    fn image_count(&self) -> u32 {
        self.image_count
    }

    fn extent(&self) -> (u32, u32) {
        self.extent
    }
}
