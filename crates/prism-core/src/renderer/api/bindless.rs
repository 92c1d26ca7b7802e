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

//! Bindless descriptor slot ranges.
//!
//! Shaders reference images and storage buffers by an integer slot into one
//! persistently bound descriptor table. Build tasks reserve a contiguous run
//! of slots up front and rebase their local indices onto the returned start.

use crate::renderer::error::ResourceError;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// The two descriptor tables handed out by [`BindlessSlots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindlessKind {
    /// Sampled images.
    Image,
    /// Storage buffers.
    Buffer,
}

impl fmt::Display for BindlessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindlessKind::Image => write!(f, "image"),
            BindlessKind::Buffer => write!(f, "buffer"),
        }
    }
}

#[derive(Debug)]
struct SlotRange {
    kind: BindlessKind,
    capacity: u32,
    next: AtomicU32,
}

impl SlotRange {
    fn reserve(&self, count: u32) -> Result<u32, ResourceError> {
        let capacity = self.capacity;
        self.next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |next| {
                next.checked_add(count).filter(|end| *end <= capacity)
            })
            .map_err(|next| ResourceError::BindlessSlotsExhausted {
                kind: self.kind,
                requested: count,
                available: capacity.saturating_sub(next),
            })
    }
}

/// Atomic allocator for bindless image and buffer slots.
#[derive(Debug)]
pub struct BindlessSlots {
    images: SlotRange,
    buffers: SlotRange,
}

impl BindlessSlots {
    /// Creates the allocator with the size of both descriptor tables.
    pub fn new(image_capacity: u32, buffer_capacity: u32) -> Self {
        Self {
            images: SlotRange {
                kind: BindlessKind::Image,
                capacity: image_capacity,
                next: AtomicU32::new(0),
            },
            buffers: SlotRange {
                kind: BindlessKind::Buffer,
                capacity: buffer_capacity,
                next: AtomicU32::new(0),
            },
        }
    }

    /// Reserves `count` contiguous image slots and returns the first one.
    pub fn reserve_images(&self, count: u32) -> Result<u32, ResourceError> {
        self.images.reserve(count)
    }

    /// Reserves `count` contiguous buffer slots and returns the first one.
    pub fn reserve_buffers(&self, count: u32) -> Result<u32, ResourceError> {
        self.buffers.reserve(count)
    }

    /// Number of image slots handed out so far.
    pub fn images_in_use(&self) -> u32 {
        self.images.next.load(Ordering::Acquire)
    }

    /// Number of buffer slots handed out so far.
    pub fn buffers_in_use(&self) -> u32 {
        self.buffers.next.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_contiguous_per_kind() {
        let slots = BindlessSlots::new(8, 4);
        assert_eq!(slots.reserve_images(3).unwrap(), 0);
        assert_eq!(slots.reserve_images(2).unwrap(), 3);
        assert_eq!(slots.reserve_buffers(2).unwrap(), 0);
        assert_eq!(slots.images_in_use(), 5);
        assert_eq!(slots.buffers_in_use(), 2);
    }

    #[test]
    fn exhaustion_is_reported() {
        let slots = BindlessSlots::new(4, 1);
        slots.reserve_images(3).unwrap();
        let err = slots.reserve_images(2).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::BindlessSlotsExhausted {
                kind: BindlessKind::Image,
                requested: 2,
                available: 1
            }
        ));
        assert_eq!(slots.images_in_use(), 3);
    }
}
