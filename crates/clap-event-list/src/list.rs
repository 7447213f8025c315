//! Bump-allocated event arena with an insertion-ordered index.

use core::fmt;
use core::iter::FusedIterator;

use tracing::{debug, trace};

use crate::error::{EventListError, Result};
use crate::record::{read_header, write_header, Record, HEADER_LEN};

/// Limits a list was built with, reported at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub slots: usize,
    pub max_event_size: usize,
    pub bytes: usize,
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} slots x {} bytes ({} bytes)",
            self.slots, self.max_event_size, self.bytes
        )
    }
}

/// Fill state of a list over one processing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    Empty,
    Filling,
    Full,
}

/// Fixed-capacity list of variable-length events.
///
/// Holds at most `SLOTS` events of at most `MAX_EVENT_SIZE` bytes each. The
/// arena (`SLOTS * MAX_EVENT_SIZE` bytes, or a smaller budget given to
/// [`with_capacity_bytes`]) is allocated once at construction and never
/// grows; after that no operation touches the allocator.
///
/// Events are bump-allocated: each one takes exactly its own size from the
/// arena, so the byte budget can run out before the slots do. Nothing is
/// reclaimed until [`clear`].
///
/// [`with_capacity_bytes`]: FixedSizeEventList::with_capacity_bytes
/// [`clear`]: FixedSizeEventList::clear
pub struct FixedSizeEventList<const SLOTS: usize, const MAX_EVENT_SIZE: usize> {
    // u64 words keep the arena base 8-byte aligned for CLAP event structs.
    arena: Box<[u64]>,
    index: heapless::Vec<u32, SLOTS>,
    cursor: usize,
    capacity_bytes: usize,
}

impl<const SLOTS: usize, const MAX_EVENT_SIZE: usize> FixedSizeEventList<SLOTS, MAX_EVENT_SIZE> {
    /// Arena size in bytes when built with [`new`](Self::new).
    pub const CAPACITY_BYTES: usize = SLOTS * MAX_EVENT_SIZE;

    const LAYOUT_OK: () = {
        assert!(SLOTS > 0, "event list needs at least one slot");
        assert!(
            MAX_EVENT_SIZE >= HEADER_LEN,
            "max event size must fit the length header"
        );
        assert!(
            SLOTS * MAX_EVENT_SIZE <= u32::MAX as usize,
            "event arena must be addressable with 32-bit offsets"
        );
    };

    pub fn new() -> Self {
        Self::with_capacity_bytes(Self::CAPACITY_BYTES)
    }

    /// Builds a list whose arena holds only `bytes` bytes, so the byte
    /// budget can run out before the slots do. Budgets above
    /// [`CAPACITY_BYTES`](Self::CAPACITY_BYTES) are clamped to it.
    pub fn with_capacity_bytes(bytes: usize) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::LAYOUT_OK;

        let capacity_bytes = bytes.min(Self::CAPACITY_BYTES);
        let words = capacity_bytes.div_ceil(core::mem::size_of::<u64>());
        let list = Self {
            arena: vec![0u64; words].into_boxed_slice(),
            index: heapless::Vec::new(),
            cursor: 0,
            capacity_bytes,
        };
        debug!(capacity = %list.capacity_info(), "event list created");
        list
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.arena)[..self.capacity_bytes]
    }

    #[inline]
    fn bytes_mut(&mut self) -> &mut [u8] {
        let capacity_bytes = self.capacity_bytes;
        &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.arena)[..capacity_bytes]
    }

    fn check_allocation(&self, size: usize) -> Result<()> {
        if size > MAX_EVENT_SIZE {
            return Err(EventListError::TooLarge {
                size,
                max: MAX_EVENT_SIZE,
            });
        }
        if size < HEADER_LEN {
            return Err(EventListError::TooSmall { size });
        }
        if self.index.is_full() {
            return Err(EventListError::SlotsExhausted { slots: SLOTS });
        }
        let remaining = self.bytes_remaining();
        if size > remaining {
            return Err(EventListError::BytesExhausted {
                requested: size,
                remaining,
            });
        }
        Ok(())
    }

    /// Reserves `size` bytes for a new event and returns them for in-place
    /// construction.
    ///
    /// The region is zeroed and its header already holds `size`; only the
    /// payload is writable. On error the list is left unmodified.
    pub fn try_allocate(&mut self, size: usize) -> Result<&mut Record> {
        if let Err(err) = self.check_allocation(size) {
            trace!(?err, "event allocation rejected");
            return Err(err);
        }

        let offset = self.cursor;
        // Offsets fit in u32, see LAYOUT_OK.
        self.index
            .push(offset as u32)
            .map_err(|_| EventListError::SlotsExhausted { slots: SLOTS })?;
        self.cursor += size;

        let region = &mut self.bytes_mut()[offset..offset + size];
        region.fill(0);
        write_header(region, size as u32);

        #[cfg(feature = "rt_debug")]
        assert!(self.check_invariants(), "event list invariants violated");

        let region = &mut self.bytes_mut()[offset..offset + size];
        Ok(Record::from_bytes_mut_unchecked(region))
    }

    /// Copies `record` into the list. On error the list is left unmodified.
    pub fn try_push(&mut self, record: &Record) -> Result<()> {
        let slot = self.try_allocate(record.len())?;
        slot.payload_mut().copy_from_slice(record.payload());
        Ok(())
    }

    /// Validates `bytes` as a record, then pushes it.
    pub fn try_push_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let record = Record::from_bytes(bytes)?;
        self.try_push(record)
    }

    #[inline]
    fn extent(&self, index: usize) -> Option<(usize, usize)> {
        let start = *self.index.get(index)? as usize;
        let end = self
            .index
            .get(index + 1)
            .map_or(self.cursor, |&next| next as usize);
        Some((start, end))
    }

    /// Returns the event at `index` in insertion order.
    ///
    /// An out-of-range index is reported as
    /// [`EventListError::IndexOutOfRange`] rather than trapping, so a bad
    /// lookup from protocol code cannot take down the processing step.
    pub fn get(&self, index: usize) -> Result<&Record> {
        let (start, end) = self.extent(index).ok_or(EventListError::IndexOutOfRange {
            index,
            len: self.len(),
        })?;
        Ok(Record::from_bytes_unchecked(&self.bytes()[start..end]))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// True once no further event can be stored, either because every slot
    /// is taken or because the arena cannot fit even a bare header.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.index.is_full() || self.bytes_remaining() < HEADER_LEN
    }

    pub fn state(&self) -> ListState {
        if self.is_empty() {
            ListState::Empty
        } else if self.is_full() {
            ListState::Full
        } else {
            ListState::Filling
        }
    }

    /// Drops every event and rewinds the arena. References handed out
    /// earlier are invalidated, which the `&mut self` borrow enforces.
    pub fn clear(&mut self) {
        self.index.iter_mut().for_each(|offset| *offset = 0);
        self.index.clear();
        self.cursor = 0;
    }

    /// Maximum number of events.
    #[inline]
    pub const fn capacity(&self) -> usize {
        SLOTS
    }

    #[inline]
    pub const fn max_event_size(&self) -> usize {
        MAX_EVENT_SIZE
    }

    #[inline]
    pub const fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    pub fn capacity_info(&self) -> Capacity {
        Capacity {
            slots: SLOTS,
            max_event_size: MAX_EVENT_SIZE,
            bytes: self.capacity_bytes,
        }
    }

    #[inline]
    pub fn bytes_used(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn bytes_remaining(&self) -> usize {
        self.capacity_bytes - self.cursor
    }

    /// Events in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            bytes: self.bytes(),
            offsets: &self.index,
            end: self.cursor,
            pos: 0,
        }
    }

    /// Walks the whole layout and reports whether the arena and index agree:
    /// offsets start at zero and increase by each event's header size, every
    /// event fits the slot limit, and the last one ends at the cursor.
    pub fn check_invariants(&self) -> bool {
        if self.cursor > self.capacity_bytes {
            return false;
        }
        let bytes = self.bytes();
        let mut expected = 0usize;
        for &offset in self.index.iter() {
            let offset = offset as usize;
            if offset != expected || offset + HEADER_LEN > self.cursor {
                return false;
            }
            let size = read_header(&bytes[offset..]) as usize;
            if !(HEADER_LEN..=MAX_EVENT_SIZE).contains(&size) {
                return false;
            }
            expected = offset + size;
        }
        expected == self.cursor
    }
}

impl<const SLOTS: usize, const MAX_EVENT_SIZE: usize> Default
    for FixedSizeEventList<SLOTS, MAX_EVENT_SIZE>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const SLOTS: usize, const MAX_EVENT_SIZE: usize> fmt::Debug
    for FixedSizeEventList<SLOTS, MAX_EVENT_SIZE>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedSizeEventList")
            .field("capacity", &self.capacity_info())
            .field("len", &self.len())
            .field("bytes_used", &self.bytes_used())
            .finish()
    }
}

impl<'a, const SLOTS: usize, const MAX_EVENT_SIZE: usize> IntoIterator
    for &'a FixedSizeEventList<SLOTS, MAX_EVENT_SIZE>
{
    type Item = &'a Record;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the events of a [`FixedSizeEventList`].
pub struct Iter<'a> {
    bytes: &'a [u8],
    offsets: &'a [u32],
    end: usize,
    pos: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        let start = *self.offsets.get(self.pos)? as usize;
        self.pos += 1;
        let end = self
            .offsets
            .get(self.pos)
            .map_or(self.end, |&next| next as usize);
        Some(Record::from_bytes_unchecked(&self.bytes[start..end]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.offsets.len() - self.pos;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    type SmallList = FixedSizeEventList<4, 32>;

    fn event(size: usize, fill: u8) -> Vec<u8> {
        let mut buf = vec![fill; size];
        Record::init(&mut buf).unwrap();
        buf
    }

    #[test]
    fn allocate_presets_header_and_advances_cursor() {
        let mut list = SmallList::new();
        let slot = list.try_allocate(12).unwrap();
        assert_eq!(slot.len(), 12);
        assert_eq!(slot.declared_len(), 12);
        assert!(slot.payload().iter().all(|&b| b == 0));
        slot.payload_mut()[0] = 0x42;

        assert_eq!(list.len(), 1);
        assert_eq!(list.bytes_used(), 12);
        assert_eq!(list.get(0).unwrap().payload()[0], 0x42);
        assert!(list.check_invariants());
    }

    #[test]
    fn rejects_oversized_without_mutation() {
        let mut list = SmallList::new();
        list.try_push_bytes(&event(8, 1)).unwrap();
        let err = list.try_allocate(33).unwrap_err();
        assert_eq!(err, EventListError::TooLarge { size: 33, max: 32 });
        assert!(err.is_capacity());
        assert_eq!(list.len(), 1);
        assert_eq!(list.bytes_used(), 8);
    }

    #[test]
    fn rejects_records_smaller_than_header() {
        let mut list = SmallList::new();
        assert_eq!(
            list.try_allocate(0).unwrap_err(),
            EventListError::TooSmall { size: 0 }
        );
        assert_eq!(
            list.try_allocate(HEADER_LEN - 1).unwrap_err(),
            EventListError::TooSmall {
                size: HEADER_LEN - 1
            }
        );
        assert!(list.is_empty());
    }

    #[test]
    fn slot_exhaustion_comes_before_byte_exhaustion() {
        let mut list = SmallList::new();
        for fill in 0..4 {
            list.try_push_bytes(&event(4, fill)).unwrap();
        }
        assert_eq!(list.bytes_remaining(), 112);
        assert_eq!(
            list.try_allocate(4).unwrap_err(),
            EventListError::SlotsExhausted { slots: 4 }
        );
        assert_eq!(list.state(), ListState::Full);
    }

    #[test]
    fn byte_exhaustion_reports_remaining() {
        let mut list = SmallList::with_capacity_bytes(48);
        list.try_push_bytes(&event(32, 1)).unwrap();
        list.try_push_bytes(&event(10, 2)).unwrap();
        assert_eq!(
            list.try_allocate(8).unwrap_err(),
            EventListError::BytesExhausted {
                requested: 8,
                remaining: 6,
            }
        );
        assert_eq!(list.len(), 2);
        list.try_allocate(6).unwrap();
        assert_eq!(list.bytes_remaining(), 0);
        assert_eq!(list.state(), ListState::Full);
    }

    #[test]
    fn byte_budget_is_clamped_to_slot_capacity() {
        let list = SmallList::with_capacity_bytes(1 << 20);
        assert_eq!(list.capacity_bytes(), SmallList::CAPACITY_BYTES);
    }

    #[test]
    fn malformed_bytes_are_rejected() {
        let mut list = SmallList::new();
        let mut bytes = event(8, 0);
        bytes.truncate(6);
        assert!(matches!(
            list.try_push_bytes(&bytes),
            Err(EventListError::Malformed(_))
        ));
        assert!(list.is_empty());
    }

    #[test]
    fn get_out_of_range_is_an_error() {
        let mut list = SmallList::new();
        assert_eq!(
            list.get(0).unwrap_err(),
            EventListError::IndexOutOfRange { index: 0, len: 0 }
        );
        list.try_push_bytes(&event(10, 5)).unwrap();
        assert!(list.get(0).is_ok());
        assert_eq!(
            list.get(1).unwrap_err(),
            EventListError::IndexOutOfRange { index: 1, len: 1 }
        );
        assert!(list.get(usize::MAX).is_err());
    }

    #[test]
    fn state_transitions() {
        let mut list = SmallList::new();
        assert_eq!(list.state(), ListState::Empty);
        list.try_push_bytes(&event(16, 1)).unwrap();
        assert_eq!(list.state(), ListState::Filling);
        list.try_push_bytes(&event(32, 1)).unwrap();
        list.try_push_bytes(&event(32, 1)).unwrap();
        list.try_push_bytes(&event(32, 1)).unwrap();
        assert_eq!(list.state(), ListState::Full);
        list.clear();
        assert_eq!(list.state(), ListState::Empty);
        assert_eq!(list.bytes_used(), 0);
    }

    #[test]
    fn arena_full_when_header_no_longer_fits() {
        let mut list = FixedSizeEventList::<3, 10>::new();
        list.try_push_bytes(&event(10, 1)).unwrap();
        list.try_push_bytes(&event(10, 2)).unwrap();
        list.try_push_bytes(&event(7, 3)).unwrap();
        assert!(list.is_full());

        let mut list = FixedSizeEventList::<3, 10>::new();
        list.try_push_bytes(&event(10, 1)).unwrap();
        list.try_push_bytes(&event(10, 2)).unwrap();
        assert!(!list.is_full());
        assert_eq!(list.state(), ListState::Filling);
    }

    #[test]
    fn iter_follows_insertion_order() {
        let mut list = SmallList::new();
        list.try_push_bytes(&event(6, 1)).unwrap();
        list.try_push_bytes(&event(9, 2)).unwrap();
        list.try_push_bytes(&event(5, 3)).unwrap();

        let iter = list.iter();
        assert_eq!(iter.len(), 3);
        let sizes: Vec<usize> = iter.map(Record::len).collect();
        assert_eq!(sizes, vec![6, 9, 5]);
        let fills: Vec<u8> = (&list).into_iter().map(|r| r.payload()[0]).collect();
        assert_eq!(fills, vec![1, 2, 3]);
    }

    #[test]
    fn capacity_reporting() {
        let list = SmallList::new();
        assert_eq!(list.capacity(), 4);
        assert_eq!(list.max_event_size(), 32);
        assert_eq!(list.capacity_bytes(), 128);
        assert_eq!(list.capacity_info().to_string(), "4 slots x 32 bytes (128 bytes)");
    }

    #[test]
    fn odd_sized_arena_is_not_rounded_up() {
        let mut list = FixedSizeEventList::<3, 5>::new();
        assert_eq!(list.capacity_bytes(), 15);
        list.try_push_bytes(&event(5, 1)).unwrap();
        list.try_push_bytes(&event(5, 2)).unwrap();
        list.try_push_bytes(&event(5, 3)).unwrap();
        assert_eq!(list.bytes_remaining(), 0);
        assert!(list.check_invariants());
    }
}
