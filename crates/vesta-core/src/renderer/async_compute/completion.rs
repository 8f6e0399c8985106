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


use crate::renderer::api::SyncPoint;
use crate::renderer::async_compute::CompletionCallback;
use std::collections::VecDeque;

/// Client callbacks waiting for the GPU to reach a sync point.
///
/// Callbacks fire strictly in the order they were enqueued. A drain stops at
/// the first callback whose sync point is not reached yet, even when a later
/// one is already complete: client code relies on completions being observed
/// in submission order.
#[derive(Default)]
pub struct CompletionQueue {
    entries: VecDeque<(SyncPoint, CompletionCallback)>,
}

impl CompletionQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `callback` to run once `sync_point` is reached.
    pub fn push(&mut self, sync_point: SyncPoint, callback: CompletionCallback) {
        self.entries.push_back((sync_point, callback));
    }

    /// Runs every leading callback whose sync point is reached by `completed`.
    /// Returns the number of callbacks invoked.
    pub fn drain(&mut self, completed: SyncPoint) -> usize {
        let mut fired = 0;
        while let Some((sync_point, _)) = self.entries.front() {
            if !sync_point.is_reached_by(completed) {
                break;
            }
            if let Some((_, callback)) = self.entries.pop_front() {
                callback();
                fired += 1;
            }
        }
        fired
    }

    /// Drops every remaining callback without running it. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    /// The number of callbacks still waiting.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no callback is waiting.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for CompletionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(sync_point, _)| sync_point))
            .finish()
    }
}
