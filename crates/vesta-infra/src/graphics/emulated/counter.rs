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


use super::timeline::CounterState;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vesta_core::renderer::{CompletionCounter, GpuError, SyncPoint, WaitStatus};

/// A fence or timeline semaphore of the emulated backend.
#[derive(Debug)]
pub struct EmulatedCounter {
    label: Option<String>,
    sync_point: AtomicU64,
    state: Arc<CounterState>,
}

impl EmulatedCounter {
    pub(crate) fn new(label: Option<&str>, lost: Arc<AtomicBool>) -> Self {
        Self {
            label: label.map(str::to_string),
            sync_point: AtomicU64::new(0),
            state: Arc::new(CounterState::new(lost)),
        }
    }

    /// The debug label given at creation.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn state(&self) -> &Arc<CounterState> {
        &self.state
    }
}

impl CompletionCounter for EmulatedCounter {
    fn completion_value(&self) -> SyncPoint {
        SyncPoint(self.state.completed())
    }

    fn sync_point(&self) -> SyncPoint {
        SyncPoint(self.sync_point.load(Ordering::SeqCst))
    }

    fn signal(&self) -> SyncPoint {
        SyncPoint(self.sync_point.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn wait_for(&self, value: SyncPoint, timeout: Duration) -> Result<WaitStatus, GpuError> {
        self.state.wait_for(value.value(), timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_reserves_values_the_gpu_completes_later() {
        let counter = EmulatedCounter::new(Some("Fence"), Arc::new(AtomicBool::new(false)));
        assert_eq!(counter.signal(), SyncPoint(1));
        assert_eq!(counter.signal(), SyncPoint(2));
        assert_eq!(counter.sync_point(), SyncPoint(2));
        assert_eq!(counter.completion_value(), SyncPoint::ZERO);
        assert!(counter.is_completed(SyncPoint::ZERO));

        counter.state().complete(2);
        assert!(counter.is_completed(SyncPoint(1)));
        assert_eq!(counter.wait(Duration::ZERO).unwrap(), WaitStatus::Complete);
    }
}
