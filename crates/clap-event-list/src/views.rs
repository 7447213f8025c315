//! Source and sink views over a [`FixedSizeEventList`].
//!
//! Protocol code on either side of the processing boundary is written
//! against [`EventSource`] or [`EventSink`] and never sees the list's
//! capacity parameters or layout.

use crate::list::FixedSizeEventList;
use crate::record::Record;

/// Read side: a consumer pulling events out in order.
pub trait EventSource {
    fn count(&self) -> usize;

    /// Event at `index`, or `None` when `index >= count()`.
    fn at(&self, index: usize) -> Option<&Record>;
}

/// Write side: a producer pushing events in.
pub trait EventSink {
    /// Copies `record` in. Returns `false` when there is no room for it.
    fn push(&mut self, record: &Record) -> bool;
}

impl<S: EventSource + ?Sized> EventSource for &S {
    fn count(&self) -> usize {
        (**self).count()
    }

    fn at(&self, index: usize) -> Option<&Record> {
        (**self).at(index)
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn push(&mut self, record: &Record) -> bool {
        (**self).push(record)
    }
}

/// Read-only view bound to one list.
pub struct InputEvents<'a, const SLOTS: usize, const MAX_EVENT_SIZE: usize> {
    list: &'a FixedSizeEventList<SLOTS, MAX_EVENT_SIZE>,
}

impl<'a, const SLOTS: usize, const MAX_EVENT_SIZE: usize> InputEvents<'a, SLOTS, MAX_EVENT_SIZE> {
    /// Like [`EventSource::at`] but borrowed for the full view lifetime.
    pub fn get(&self, index: usize) -> Option<&'a Record> {
        self.list.get(index).ok()
    }
}

impl<const SLOTS: usize, const MAX_EVENT_SIZE: usize> Clone
    for InputEvents<'_, SLOTS, MAX_EVENT_SIZE>
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<const SLOTS: usize, const MAX_EVENT_SIZE: usize> Copy
    for InputEvents<'_, SLOTS, MAX_EVENT_SIZE>
{
}

impl<const SLOTS: usize, const MAX_EVENT_SIZE: usize> EventSource
    for InputEvents<'_, SLOTS, MAX_EVENT_SIZE>
{
    #[inline]
    fn count(&self) -> usize {
        self.list.len()
    }

    #[inline]
    fn at(&self, index: usize) -> Option<&Record> {
        self.get(index)
    }
}

/// Write-only view bound to one list.
pub struct OutputEvents<'a, const SLOTS: usize, const MAX_EVENT_SIZE: usize> {
    list: &'a mut FixedSizeEventList<SLOTS, MAX_EVENT_SIZE>,
}

impl<const SLOTS: usize, const MAX_EVENT_SIZE: usize> EventSink
    for OutputEvents<'_, SLOTS, MAX_EVENT_SIZE>
{
    #[inline]
    fn push(&mut self, record: &Record) -> bool {
        self.list.try_push(record).is_ok()
    }
}

impl<const SLOTS: usize, const MAX_EVENT_SIZE: usize> FixedSizeEventList<SLOTS, MAX_EVENT_SIZE> {
    /// Source view for a consumer of this list.
    pub fn input_events(&self) -> InputEvents<'_, SLOTS, MAX_EVENT_SIZE> {
        InputEvents { list: self }
    }

    /// Sink view for a producer filling this list.
    pub fn output_events(&mut self) -> OutputEvents<'_, SLOTS, MAX_EVENT_SIZE> {
        OutputEvents { list: self }
    }
}

/// Copies events from `source` into `sink` in order, stopping at the first
/// one the sink rejects. Returns how many were copied.
pub fn forward<S, K>(source: &S, sink: &mut K) -> usize
where
    S: EventSource + ?Sized,
    K: EventSink + ?Sized,
{
    let mut forwarded = 0;
    while let Some(record) = source.at(forwarded) {
        if !sink.push(record) {
            break;
        }
        forwarded += 1;
    }
    forwarded
}
