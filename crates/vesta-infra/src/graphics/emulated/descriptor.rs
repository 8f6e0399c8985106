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

/// A descriptor heap of the emulated backend: a table of typed slots.
#[derive(Debug)]
pub struct EmulatedDescriptorHeap {
    label: Option<String>,
    kind: DescriptorHeapKind,
    shader_visible: bool,
    entries: Vec<Option<DescriptorEntry>>,
}

impl EmulatedDescriptorHeap {
    pub(crate) fn new(descriptor: &DescriptorHeapDescriptor) -> Result<Self, GpuError> {
        if descriptor.capacity == 0 {
            return Err(GpuError::AllocationFailed(
                "descriptor heaps need at least one slot".to_string(),
            ));
        }
        if descriptor.shader_visible && !descriptor.kind.supports_shader_visibility() {
            return Err(GpuError::AllocationFailed(format!(
                "{:?} heaps cannot be shader visible",
                descriptor.kind
            )));
        }
        Ok(Self {
            label: descriptor.label.as_ref().map(|label| label.to_string()),
            kind: descriptor.kind,
            shader_visible: descriptor.shader_visible,
            entries: vec![None; descriptor.capacity as usize],
        })
    }

    /// The debug label given at creation.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The descriptor last written at `index`.
    pub fn entry(&self, index: u32) -> Option<&DescriptorEntry> {
        self.entries.get(index as usize)?.as_ref()
    }
}

impl DescriptorHeap for EmulatedDescriptorHeap {
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
                "{entry:?} cannot be stored in a {:?} heap",
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

#[cfg(test)]
mod tests {
    use super::*;
    use vesta_core::renderer::{SamplerId, TextureViewId};

    fn descriptor(kind: DescriptorHeapKind, shader_visible: bool) -> DescriptorHeapDescriptor<'static> {
        DescriptorHeapDescriptor {
            label: Some("Heap".into()),
            kind,
            capacity: 4,
            shader_visible,
        }
    }

    #[test]
    fn writes_are_typed_and_bounded() {
        let mut heap =
            EmulatedDescriptorHeap::new(&descriptor(DescriptorHeapKind::Sampler, true)).unwrap();

        heap.write(1, DescriptorEntry::Sampler(SamplerId(7))).unwrap();
        assert_eq!(heap.entry(1), Some(&DescriptorEntry::Sampler(SamplerId(7))));
        assert_eq!(heap.entry(0), None);

        assert!(heap
            .write(2, DescriptorEntry::Texture(TextureViewId(1)))
            .is_err());
        assert!(heap.write(4, DescriptorEntry::Sampler(SamplerId(0))).is_err());
    }

    #[test]
    fn render_target_heaps_are_never_shader_visible() {
        assert!(EmulatedDescriptorHeap::new(&descriptor(DescriptorHeapKind::RenderTarget, true)).is_err());
        let heap =
            EmulatedDescriptorHeap::new(&descriptor(DescriptorHeapKind::RenderTarget, false)).unwrap();
        assert!(!heap.is_shader_visible());
        assert_eq!(heap.capacity(), 4);
    }
}
