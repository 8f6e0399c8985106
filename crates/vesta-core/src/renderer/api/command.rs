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


//! Small enums describing queues, command buffers and presentation.

use serde::{Deserialize, Serialize};

/// The kind of hardware queue a [`Queue`](crate::renderer::Queue) wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QueueType {
    /// Graphics, compute and transfer capable queue.
    #[default]
    Direct,
    /// Compute and transfer only.
    Compute,
    /// Transfer only.
    Copy,
}

/// The lifecycle state of a command buffer.
///
/// ```text
/// Initial --begin--> Recording --end--> Executable --submit--> Pending
///    ^                                      |                     |
///    +-------------------reset--------------+---------------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandBufferState {
    /// Freshly created or reset; may begin recording.
    #[default]
    Initial,
    /// Between `begin()` and `end()`.
    Recording,
    /// Closed and ready for submission.
    Executable,
    /// Submitted; the GPU may still be reading its commands.
    Pending,
}

/// The outcome of a present operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    /// The image was queued for display.
    Presented,
    /// The surface changed underneath the swapchain; the frame was dropped and
    /// the owner should call `resize()`.
    OutOfDate,
}
