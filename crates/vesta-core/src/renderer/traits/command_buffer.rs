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


use crate::renderer::api::CommandBufferState;
use crate::renderer::error::GpuError;

/// CPU-side memory that backs recorded GPU commands and can be recycled once
/// the GPU is done reading it.
///
/// A recording context is owned by exactly one party at a time: the async
/// compute worker while it records into it, or a
/// [`RecordingContextPool`](crate::renderer::RecordingContextPool) while the GPU
/// may still execute its commands.
pub trait RecordingContext: Send + 'static {
    /// Discards everything recorded so far and makes the memory reusable.
    ///
    /// Must only be called once the GPU has finished executing the commands
    /// that were recorded into this context.
    fn reset(&mut self) -> Result<(), GpuError>;
}

/// A recording context that records a single command list.
///
/// The lifecycle is `Initial -> Recording -> Executable -> Pending`, and back to
/// `Initial` through [`RecordingContext::reset`]. See [`CommandBufferState`].
pub trait CommandBuffer: RecordingContext {
    /// Opens the command list for recording.
    ///
    /// Allowed from `Initial` and `Executable` (a closed but unsubmitted list is
    /// discarded and recording restarts).
    ///
    /// ## Errors
    /// * `GpuError::Internal` - If the buffer is already recording or still pending.
    fn begin(&mut self) -> Result<(), GpuError>;

    /// Closes the command list, making it executable.
    ///
    /// ## Errors
    /// * `GpuError::Internal` - If the buffer is not recording.
    fn end(&mut self) -> Result<(), GpuError>;

    /// Returns the current lifecycle state.
    fn state(&self) -> CommandBufferState;

    /// Returns the debug label given at creation, if any.
    fn label(&self) -> Option<&str>;
}
