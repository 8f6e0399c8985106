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


//! Positions on the GPU execution timeline.

use std::fmt;

/// A position on a monotonically increasing GPU execution timeline.
///
/// A completion counter "has reached" a sync point once its completion value is
/// greater than or equal to it. `SyncPoint(0)` is the initial, always-reached
/// value of every counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SyncPoint(pub u64);

impl SyncPoint {
    /// The initial value of every timeline; reached before any submission.
    pub const ZERO: SyncPoint = SyncPoint(0);

    /// Returns the raw timeline value.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the sync point that directly follows this one.
    pub const fn next(self) -> SyncPoint {
        SyncPoint(self.0 + 1)
    }

    /// Returns `true` if a counter whose completion value is `completed` has
    /// reached this sync point.
    pub fn is_reached_by(self, completed: SyncPoint) -> bool {
        completed >= self
    }
}

impl From<u64> for SyncPoint {
    fn from(value: u64) -> Self {
        SyncPoint(value)
    }
}

impl fmt::Display for SyncPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The outcome of a bounded blocking wait on a completion counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// The awaited value was reached.
    Complete,
    /// The timeout elapsed first.
    TimedOut,
}

impl WaitStatus {
    /// Returns `true` for [`WaitStatus::Complete`].
    pub fn is_complete(self) -> bool {
        matches!(self, WaitStatus::Complete)
    }
}
