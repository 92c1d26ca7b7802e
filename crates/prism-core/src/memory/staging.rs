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

//! A thread-safe bump allocator over one pre-sized host-visible staging area.
//!
//! Build tasks running concurrently on the pool each [`reserve`] a disjoint byte
//! range, write their payload into it through [`write`] or [`with_mapped`], and
//! then record copies out of the staging buffer. Ranges are never handed out
//! twice until the owner of the allocator calls [`reset`].
//!
//! [`reserve`]: StagingAllocator::reserve
//! [`write`]: StagingAllocator::write
//! [`with_mapped`]: StagingAllocator::with_mapped
//! [`reset`]: StagingAllocator::reset

use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Rounds `value` up to the next multiple of `alignment` (a power of two).
pub const fn align_up(value: u64, alignment: u64) -> u64 {
    (value + alignment - 1) & !(alignment - 1)
}

/// Like [`align_up`], but returns `None` when the rounded value does not fit in a `u64`.
pub const fn checked_align_up(value: u64, alignment: u64) -> Option<u64> {
    match value.checked_add(alignment - 1) {
        Some(bumped) => Some(bumped & !(alignment - 1)),
        None => None,
    }
}

/// A byte range inside the staging buffer owned by one producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingReservation {
    /// Offset of the first byte, always a multiple of the allocator alignment.
    pub offset: u64,
    /// Number of bytes requested by the producer.
    pub size: u64,
}

impl StagingReservation {
    /// The absolute byte range covered by this reservation.
    pub fn range(&self) -> Range<u64> {
        self.offset..self.offset.saturating_add(self.size)
    }

    /// Returns `true` if the two reservations share at least one byte.
    pub fn overlaps(&self, other: &StagingReservation) -> bool {
        self.size != 0
            && other.size != 0
            && self.offset < other.offset.saturating_add(other.size)
            && other.offset < self.offset.saturating_add(self.size)
    }
}

/// An error raised by the staging allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagingError {
    /// The request does not fit in the space left in the staging buffer.
    OutOfStagingSpace {
        /// Bytes requested.
        requested: u64,
        /// Bytes still available when the request was made.
        available: u64,
        /// Total capacity of the staging buffer.
        capacity: u64,
    },
    /// A write fell outside the reservation it targeted.
    OutOfBounds {
        /// The reservation that was written to.
        reservation: StagingReservation,
        /// Offset of the write, relative to the reservation.
        offset: u64,
        /// Length of the write.
        len: u64,
    },
}

impl fmt::Display for StagingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StagingError::OutOfStagingSpace {
                requested,
                available,
                capacity,
            } => write!(
                f,
                "Out of staging space: requested {requested} bytes, {available} of {capacity} available"
            ),
            StagingError::OutOfBounds {
                reservation,
                offset,
                len,
            } => write!(
                f,
                "Staging write of {len} bytes at +{offset} exceeds reservation {:?}",
                reservation.range()
            ),
        }
    }
}

impl std::error::Error for StagingError {}

/// The staging area: a capacity, an atomic bump cursor and the host memory.
pub struct StagingAllocator {
    capacity: u64,
    alignment: u64,
    cursor: AtomicU64,
    memory: Mutex<Vec<u8>>,
}

impl std::fmt::Debug for StagingAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingAllocator")
            .field("capacity", &self.capacity)
            .field("alignment", &self.alignment)
            .field("used", &self.used())
            .finish()
    }
}

impl StagingAllocator {
    /// Creates an allocator over `capacity` bytes of zeroed host memory.
    ///
    /// `alignment` is rounded up to a power of two; every reservation starts on
    /// a multiple of it.
    pub fn new(capacity: u64, alignment: u64) -> Self {
        Self {
            capacity,
            alignment: alignment.max(1).next_power_of_two(),
            cursor: AtomicU64::new(0),
            memory: Mutex::new(vec![0; capacity as usize]),
        }
    }

    /// Total size of the staging buffer in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Alignment applied to every reservation offset.
    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    /// Bytes handed out so far, including alignment padding.
    pub fn used(&self) -> u64 {
        self.cursor.load(Ordering::Acquire)
    }

    /// Reserves `bytes` bytes and returns the range owned by the caller.
    ///
    /// The cursor only advances when the whole aligned request fits, so a
    /// failed request leaves the allocator untouched.
    ///
    /// # Errors
    /// [`StagingError::OutOfStagingSpace`] if the request exceeds the space left.
    pub fn reserve(&self, bytes: u64) -> Result<StagingReservation, StagingError> {
        let capacity = self.capacity;
        let out_of_space = |cursor: u64| StagingError::OutOfStagingSpace {
            requested: bytes,
            available: capacity.saturating_sub(cursor),
            capacity,
        };
        let padded = match checked_align_up(bytes, self.alignment) {
            Some(padded) if bytes <= capacity => padded,
            _ => return Err(out_of_space(self.used())),
        };
        self.cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cursor| {
                cursor
                    .checked_add(padded)
                    .filter(|end| *end <= capacity)
            })
            .map(|offset| {
                log::trace!("StagingAllocator: reserved {bytes} bytes at {offset}");
                StagingReservation {
                    offset,
                    size: bytes,
                }
            })
            .map_err(out_of_space)
    }

    /// Copies `bytes` into `reservation`, starting `offset` bytes into it.
    pub fn write(
        &self,
        reservation: &StagingReservation,
        offset: u64,
        bytes: &[u8],
    ) -> Result<(), StagingError> {
        let len = bytes.len() as u64;
        if offset.checked_add(len).is_none_or(|end| end > reservation.size) {
            return Err(StagingError::OutOfBounds {
                reservation: *reservation,
                offset,
                len,
            });
        }
        let start = (reservation.offset + offset) as usize;
        let mut memory = self.memory.lock().unwrap();
        memory[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Gives `f` mutable access to the host memory behind `reservation`.
    pub fn with_mapped<R>(
        &self,
        reservation: &StagingReservation,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> R {
        let range = reservation.range();
        let mut memory = self.memory.lock().unwrap();
        f(&mut memory[range.start as usize..range.end as usize])
    }

    /// Gives `f` read access to an arbitrary range of the staging memory.
    ///
    /// Backends use this to push staged bytes to the device right before a
    /// submission. Returns `None` if the range lies outside the buffer.
    pub fn with_range<R>(&self, range: Range<u64>, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        if range.start > range.end || range.end > self.capacity {
            return None;
        }
        let memory = self.memory.lock().unwrap();
        Some(f(&memory[range.start as usize..range.end as usize]))
    }

    /// Rewinds the cursor to the start of the buffer.
    ///
    /// Only valid once every submission reading from the staging buffer has
    /// been waited on.
    pub fn reset(&self) {
        log::debug!(
            "StagingAllocator: reset after {} of {} bytes",
            self.used(),
            self.capacity
        );
        self.cursor.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn align_up_rounds_to_power_of_two() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(1, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 4), 260);
    }

    #[test]
    fn checked_align_up_reports_overflow() {
        assert_eq!(checked_align_up(257, 4), Some(260));
        assert_eq!(checked_align_up(u64::MAX - 1, 4), None);
        assert_eq!(checked_align_up(u64::MAX, 1), Some(u64::MAX));
    }

    #[test]
    fn huge_requests_are_out_of_space() {
        let staging = StagingAllocator::new(64, 4);
        staging.reserve(8).unwrap();
        for bytes in [u64::MAX - 1, u64::MAX, 65] {
            assert_eq!(
                staging.reserve(bytes),
                Err(StagingError::OutOfStagingSpace {
                    requested: bytes,
                    available: 56,
                    capacity: 64
                })
            );
        }
        assert_eq!(staging.used(), 8);
    }

    #[test]
    fn write_bounds_check_does_not_wrap() {
        let staging = StagingAllocator::new(64, 4);
        let reservation = staging.reserve(16).unwrap();
        assert!(matches!(
            staging.write(&reservation, u64::MAX, &[1]),
            Err(StagingError::OutOfBounds { .. })
        ));
        let huge = StagingReservation {
            offset: u64::MAX - 4,
            size: 16,
        };
        assert_eq!(huge.range().end, u64::MAX);
        assert!(huge.overlaps(&StagingReservation {
            offset: u64::MAX - 1,
            size: 8
        }));
    }

    #[test]
    fn reservations_are_sequential_and_aligned() {
        let staging = StagingAllocator::new(1024, 16);
        let a = staging.reserve(10).unwrap();
        let b = staging.reserve(20).unwrap();
        assert_eq!(a, StagingReservation { offset: 0, size: 10 });
        assert_eq!(b, StagingReservation { offset: 16, size: 20 });
        assert_eq!(staging.used(), 48);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn exceeding_capacity_fails_without_moving_cursor() {
        let staging = StagingAllocator::new(64, 4);
        staging.reserve(40).unwrap();
        let err = staging.reserve(32).unwrap_err();
        assert_eq!(
            err,
            StagingError::OutOfStagingSpace {
                requested: 32,
                available: 24,
                capacity: 64
            }
        );
        assert_eq!(staging.used(), 40);
        // The remaining space is still usable.
        assert!(staging.reserve(24).is_ok());
        assert!(staging.reserve(1).is_err());
    }

    #[test]
    fn concurrent_reservations_never_overlap() {
        let staging = Arc::new(StagingAllocator::new(1 << 20, 64));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let staging = Arc::clone(&staging);
                thread::spawn(move || {
                    (0..200)
                        .filter_map(|i| staging.reserve(((t * 31 + i * 7) % 300 + 1) as u64).ok())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<StagingReservation> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert!(!all.is_empty());
        all.sort_by_key(|r| r.offset);
        for pair in all.windows(2) {
            assert!(
                pair[0].offset + pair[0].size <= pair[1].offset,
                "{:?} overlaps {:?}",
                pair[0],
                pair[1]
            );
        }
        assert!(all.iter().all(|r| r.offset + r.size <= staging.capacity()));
    }

    #[test]
    fn concurrent_overflow_is_reported_not_overrun() {
        let staging = Arc::new(StagingAllocator::new(4096, 1));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let staging = Arc::clone(&staging);
                thread::spawn(move || (0..100).filter(|_| staging.reserve(32).is_ok()).count())
            })
            .collect();
        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, 4096 / 32);
        assert_eq!(staging.used(), 4096);
    }

    #[test]
    fn writes_are_confined_to_their_reservation() {
        let staging = StagingAllocator::new(64, 8);
        let _first = staging.reserve(8).unwrap();
        let second = staging.reserve(8).unwrap();
        staging.write(&second, 4, &[1, 2, 3, 4]).unwrap();
        assert!(matches!(
            staging.write(&second, 6, &[0; 4]),
            Err(StagingError::OutOfBounds { .. })
        ));

        let bytes = staging.with_range(8..16, |b| b.to_vec()).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0, 1, 2, 3, 4]);
        staging.with_mapped(&second, |window| window[0] = 9);
        assert_eq!(staging.with_range(8..9, |b| b[0]), Some(9));
        assert!(staging.with_range(60..72, |_| ()).is_none());
    }

    #[test]
    fn reset_rewinds_the_cursor() {
        let staging = StagingAllocator::new(32, 4);
        staging.reserve(32).unwrap();
        assert!(staging.reserve(4).is_err());
        staging.reset();
        assert_eq!(staging.reserve(4).unwrap().offset, 0);
    }
}
