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


use crate::renderer::api::{SyncPoint, WaitStatus};
use crate::renderer::error::GpuError;
use std::fmt::Debug;
use std::time::Duration;

/// A monotonically increasing GPU timeline backed by a native fence or
/// timeline semaphore.
///
/// The counter tracks two values:
/// - the *sync point*: the value the most recent submission asked the GPU to
///   signal, advanced on the CPU by [`signal`](Self::signal);
/// - the *completion value*: the last value the GPU actually signaled.
///
/// Implementations must keep the completion value non-decreasing (a late or
/// out-of-order native notification never moves it backwards), so once a sync
/// point is reached it stays reached.
pub trait CompletionCounter: Send + Sync + Debug + 'static {
    /// Queries the last value the GPU has signaled. Never blocks.
    fn completion_value(&self) -> SyncPoint;

    /// Returns the most recently issued sync point.
    fn sync_point(&self) -> SyncPoint;

    /// Advances the sync point the next submission will signal and returns it.
    ///
    /// This only reserves the value on the CPU; the queue that performs the
    /// submission is responsible for making the GPU signal it.
    fn signal(&self) -> SyncPoint;

    /// Blocks until the completion value reaches `value` or `timeout` elapses.
    ///
    /// ## Errors
    /// * `GpuError::DeviceLost` - If the device was lost while waiting. A lost
    ///   device is reported, never silently retried.
    fn wait_for(&self, value: SyncPoint, timeout: Duration) -> Result<WaitStatus, GpuError>;

    /// Blocks until the completion value reaches the latest issued sync point.
    fn wait(&self, timeout: Duration) -> Result<WaitStatus, GpuError> {
        self.wait_for(self.sync_point(), timeout)
    }

    /// Returns `true` if the GPU has reached `value`.
    fn is_completed(&self, value: SyncPoint) -> bool {
        value.is_reached_by(self.completion_value())
    }
}
