//! CLAP ABI dispatch tables over a [`FixedSizeEventList`].
//!
//! The tables hand the plug-in (or host) a `ctx` pointer to the list. Each
//! view borrows the list for its whole lifetime, so the list can neither move
//! nor be cleared while the raw table is reachable through the view.
//!
//! Records are packed back to back, so an event pointer returned from `get`
//! is only 8-byte aligned when every preceding event's size is a multiple of
//! 8. `clap_event_param_gesture` (20 bytes) and `clap_event_midi2` (36
//! bytes) break that for whatever follows them, so readers should copy
//! events out with `ptr::read_unaligned`.

use core::ffi::c_void;
use core::marker::PhantomData;
use core::ptr;

use clap_sys::events::{
    clap_event_header, clap_event_midi, clap_event_midi2, clap_event_midi_sysex,
    clap_event_note, clap_event_note_expression, clap_event_param_gesture,
    clap_event_param_mod, clap_event_param_value, clap_event_transport, clap_input_events,
    clap_output_events,
};
use tracing::trace;

use crate::error::{EventListError, RecordError, Result};
use crate::list::FixedSizeEventList;
use crate::record::HEADER_LEN;

/// CLAP event structs that start with a `clap_event_header`.
///
/// # Safety
/// Implementors must be `#[repr(C)]` with a `clap_event_header` as their
/// first field.
pub unsafe trait ClapEvent {
    fn header(&self) -> &clap_event_header;
}

macro_rules! clap_events {
    ($($ty:ty),* $(,)?) => {
        $(
            unsafe impl ClapEvent for $ty {
                #[inline]
                fn header(&self) -> &clap_event_header {
                    &self.header
                }
            }
        )*
    };
}

clap_events!(
    clap_event_note,
    clap_event_note_expression,
    clap_event_param_value,
    clap_event_param_mod,
    clap_event_param_gesture,
    clap_event_transport,
    clap_event_midi,
    clap_event_midi_sysex,
    clap_event_midi2,
);

impl<const SLOTS: usize, const MAX_EVENT_SIZE: usize> FixedSizeEventList<SLOTS, MAX_EVENT_SIZE> {
    /// Copies a raw CLAP event, trusting `header.size` for its length.
    ///
    /// # Safety
    /// `event` must be null or point to `(*event).size` readable bytes, all
    /// of them initialized (padding included).
    pub unsafe fn try_push_clap(&mut self, event: *const clap_event_header) -> Result<()> {
        if event.is_null() {
            return Err(RecordError::Truncated { len: 0 }.into());
        }
        let size = (*event).size as usize;
        if size < HEADER_LEN {
            return Err(RecordError::Truncated { len: size }.into());
        }
        let slot = self.try_allocate(size)?;
        ptr::copy_nonoverlapping(event.cast::<u8>(), slot.as_mut_ptr(), size);
        Ok(())
    }

    /// Pushes a typed CLAP event. Fails if its header claims more bytes than
    /// the struct holds.
    ///
    /// # Safety
    /// The first `event.header().size` bytes of `event` must be initialized,
    /// padding included. Most CLAP event structs have padding, so build them
    /// from `mem::zeroed()` and assign the fields afterwards.
    pub unsafe fn push_clap_event<E: ClapEvent>(&mut self, event: &E) -> Result<()> {
        let declared = event.header().size;
        if declared as usize > core::mem::size_of::<E>() {
            return Err(EventListError::Malformed(RecordError::LengthMismatch {
                declared,
                actual: core::mem::size_of::<E>(),
            }));
        }
        // Safety: `E` starts with its header and holds `declared` bytes,
        // which the caller guarantees are initialized.
        self.try_push_clap((event as *const E).cast())
    }

    /// `clap_input_events` table reading from this list.
    pub fn clap_input_events(&self) -> ClapInputEvents<'_, SLOTS, MAX_EVENT_SIZE> {
        ClapInputEvents {
            raw: clap_input_events {
                ctx: self as *const Self as *mut c_void,
                size: Some(input_size::<SLOTS, MAX_EVENT_SIZE>),
                get: Some(input_get::<SLOTS, MAX_EVENT_SIZE>),
            },
            _list: PhantomData,
        }
    }

    /// `clap_output_events` table appending to this list.
    pub fn clap_output_events(&mut self) -> ClapOutputEvents<'_, SLOTS, MAX_EVENT_SIZE> {
        ClapOutputEvents {
            raw: clap_output_events {
                ctx: self as *mut Self as *mut c_void,
                try_push: Some(output_try_push::<SLOTS, MAX_EVENT_SIZE>),
            },
            _list: PhantomData,
        }
    }
}

/// Owned `clap_input_events` bound to a shared borrow of a list.
pub struct ClapInputEvents<'a, const SLOTS: usize, const MAX_EVENT_SIZE: usize> {
    raw: clap_input_events,
    _list: PhantomData<&'a FixedSizeEventList<SLOTS, MAX_EVENT_SIZE>>,
}

impl<const SLOTS: usize, const MAX_EVENT_SIZE: usize> ClapInputEvents<'_, SLOTS, MAX_EVENT_SIZE> {
    /// Pointer to pass across the ABI. Valid while `self` is neither moved
    /// nor dropped.
    pub fn as_raw(&self) -> *const clap_input_events {
        &self.raw
    }
}

/// Owned `clap_output_events` bound to an exclusive borrow of a list.
pub struct ClapOutputEvents<'a, const SLOTS: usize, const MAX_EVENT_SIZE: usize> {
    raw: clap_output_events,
    _list: PhantomData<&'a mut FixedSizeEventList<SLOTS, MAX_EVENT_SIZE>>,
}

impl<const SLOTS: usize, const MAX_EVENT_SIZE: usize> ClapOutputEvents<'_, SLOTS, MAX_EVENT_SIZE> {
    /// Pointer to pass across the ABI. Valid while `self` is neither moved
    /// nor dropped.
    pub fn as_raw(&self) -> *const clap_output_events {
        &self.raw
    }
}

unsafe extern "C" fn input_size<const SLOTS: usize, const MAX_EVENT_SIZE: usize>(
    list: *const clap_input_events,
) -> u32 {
    if list.is_null() || (*list).ctx.is_null() {
        return 0;
    }
    let events = &*((*list).ctx as *const FixedSizeEventList<SLOTS, MAX_EVENT_SIZE>);
    events.len() as u32
}

unsafe extern "C" fn input_get<const SLOTS: usize, const MAX_EVENT_SIZE: usize>(
    list: *const clap_input_events,
    index: u32,
) -> *const clap_event_header {
    if list.is_null() || (*list).ctx.is_null() {
        return ptr::null();
    }
    let events = &*((*list).ctx as *const FixedSizeEventList<SLOTS, MAX_EVENT_SIZE>);
    match events.get(index as usize) {
        Ok(record) => record.as_ptr().cast(),
        Err(err) => {
            trace!(?err, "clap input event lookup failed");
            ptr::null()
        }
    }
}

unsafe extern "C" fn output_try_push<const SLOTS: usize, const MAX_EVENT_SIZE: usize>(
    list: *const clap_output_events,
    event: *const clap_event_header,
) -> bool {
    if list.is_null() || (*list).ctx.is_null() {
        return false;
    }
    let events = &mut *((*list).ctx as *mut FixedSizeEventList<SLOTS, MAX_EVENT_SIZE>);
    events.try_push_clap(event).is_ok()
}
