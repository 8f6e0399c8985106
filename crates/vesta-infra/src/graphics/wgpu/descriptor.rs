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


use vesta_core::renderer::{
    DescriptorEntry, DescriptorHeap, DescriptorHeapDescriptor, DescriptorHeapKind, GpuError,
};

/// A CPU-side descriptor table.
///
/// `wgpu` has no descriptor heaps: bind groups are built from resource
/// entries. The table records what was written so a bind group can be
/// assembled from any range of it.
#[derive(Debug)]
pub struct WgpuDescriptorHeap {
    kind: DescriptorHeapKind,
    shader_visible: bool,
    entries: Vec<Option<DescriptorEntry>>,
}

impl WgpuDescriptorHeap {
    pub(crate) fn new(descriptor: &DescriptorHeapDescriptor) -> Result<Self, GpuError> {
        if descriptor.capacity == 0 {
            return Err(GpuError::AllocationFailed(
                "descriptor heaps need at least one slot".to_string(),
            ));
        }
        log::trace!(
            "Creating {:?} descriptor table {:?} ({} slots)",
            descriptor.kind,
            descriptor.label,
            descriptor.capacity
        );
        Ok(Self {
            kind: descriptor.kind,
            shader_visible: descriptor.shader_visible && descriptor.kind.supports_shader_visibility(),
            entries: vec![None; descriptor.capacity as usize],
        })
    }

    /// The descriptors written in `first..first + count`.
    pub fn entries(&self, first: u32, count: u32) -> &[Option<DescriptorEntry>] {
        let start = (first as usize).min(self.entries.len());
        let end = (start + count as usize).min(self.entries.len());
        &self.entries[start..end]
    }
}

impl DescriptorHeap for WgpuDescriptorHeap {
    fn kind(&self) -> DescriptorHeapKind {
        self.kind
    }

    fn capacity(&self) -> u32 {
        self.entries.len() as u32
    }

    fn is_shader_visible(&self) -> bool {
        self.shader_visible
    }

    fn write(&mut self, index: u32, entry: DescriptorEntry) -> Result<(), GpuError> {
        if !self.kind.accepts(&entry) {
            return Err(GpuError::Backend(format!(
                "{entry:?} cannot be stored in a {:?} table",
                self.kind
            )));
        }
        let slot = self.entries.get_mut(index as usize).ok_or_else(|| {
            GpuError::Backend(format!("descriptor slot {index} is out of range"))
        })?;
        *slot = Some(entry);
        Ok(())
    }
}
