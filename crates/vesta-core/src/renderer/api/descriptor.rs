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


//! Defines data structures for shader-binding-table (descriptor) memory.

use super::handle::Handle;
use std::borrow::Cow;

/// An opaque handle to a GPU buffer resource owned by an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// An opaque handle to a texture view owned by an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureViewId(pub usize);

/// An opaque handle to a sampler owned by an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerId(pub usize);

/// The kind of descriptors a heap stores.
///
/// Native APIs keep samplers and render-target views in separate heaps from
/// shader resource views, so a heap only ever accepts one family of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum DescriptorHeapKind {
    /// Constant buffer, shader resource and unordered access views.
    #[default]
    ResourceView,
    /// Sampler states.
    Sampler,
    /// Render target views.
    RenderTarget,
    /// Depth-stencil views.
    DepthStencil,
}

impl DescriptorHeapKind {
    /// Returns `true` if an entry of this shape may be written into a heap of this kind.
    pub fn accepts(&self, entry: &DescriptorEntry) -> bool {
        match (self, entry) {
            (DescriptorHeapKind::ResourceView, DescriptorEntry::Buffer { .. })
            | (DescriptorHeapKind::ResourceView, DescriptorEntry::Texture(_)) => true,
            (DescriptorHeapKind::Sampler, DescriptorEntry::Sampler(_)) => true,
            (DescriptorHeapKind::RenderTarget, DescriptorEntry::Texture(_))
            | (DescriptorHeapKind::DepthStencil, DescriptorEntry::Texture(_)) => true,
            _ => false,
        }
    }

    /// Whether heaps of this kind can be made visible to shaders at all.
    pub fn supports_shader_visibility(&self) -> bool {
        matches!(
            self,
            DescriptorHeapKind::ResourceView | DescriptorHeapKind::Sampler
        )
    }
}

/// A single resource-binding-table entry consumed by shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorEntry {
    /// A (sub-range of a) buffer.
    Buffer {
        /// The buffer being referenced.
        buffer: BufferId,
        /// Byte offset into the buffer.
        offset: u64,
        /// Byte size of the view, or `None` for the rest of the buffer.
        size: Option<u64>,
    },
    /// A texture view.
    Texture(TextureViewId),
    /// A sampler.
    Sampler(SamplerId),
}

/// A descriptor used to create a [`DescriptorHeap`](crate::renderer::DescriptorHeap).
#[derive(Debug, Clone)]
pub struct DescriptorHeapDescriptor<'a> {
    /// An optional debug label for the heap.
    pub label: Option<Cow<'a, str>>,
    /// Which family of descriptors the heap stores.
    pub kind: DescriptorHeapKind,
    /// The number of descriptor slots in the heap.
    pub capacity: u32,
    /// Whether shaders read directly from this heap.
    pub shader_visible: bool,
}

/// Type tag for handles to the fixed-size blocks of a descriptor pool.
#[derive(Debug)]
pub enum DescriptorBlock {}

/// A contiguous run of descriptor slots handed out by a
/// [`DescriptorPool`](crate::renderer::DescriptorPool).
///
/// The range is only valid until the block it lives in is recycled; writes
/// through a stale range are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorRange {
    /// The generation-checked handle of the block backing this range.
    pub block: Handle<DescriptorBlock>,
    /// The first slot of the range inside the block.
    pub first: u32,
    /// The number of slots in the range.
    pub count: u32,
}

impl DescriptorRange {
    /// The slot index, inside the block, of the `offset`-th descriptor of this range.
    pub fn slot(&self, offset: u32) -> Option<u32> {
        (offset < self.count).then(|| self.first + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_kind_accepts_only_matching_entries() {
        let sampler = DescriptorEntry::Sampler(SamplerId(0));
        let texture = DescriptorEntry::Texture(TextureViewId(1));
        let buffer = DescriptorEntry::Buffer {
            buffer: BufferId(2),
            offset: 0,
            size: None,
        };

        assert!(DescriptorHeapKind::ResourceView.accepts(&buffer));
        assert!(DescriptorHeapKind::ResourceView.accepts(&texture));
        assert!(!DescriptorHeapKind::ResourceView.accepts(&sampler));
        assert!(DescriptorHeapKind::Sampler.accepts(&sampler));
        assert!(!DescriptorHeapKind::Sampler.accepts(&buffer));
        assert!(!DescriptorHeapKind::RenderTarget.supports_shader_visibility());
    }

    #[test]
    fn range_slot_is_bounded() {
        let range = DescriptorRange {
            block: Handle::new(0, 0),
            first: 10,
            count: 4,
        };
        assert_eq!(range.slot(0), Some(10));
        assert_eq!(range.slot(3), Some(13));
        assert_eq!(range.slot(4), None);
    }
}
