//! Fixed-capacity, allocation-free event list for real-time processing.
//!
//! A [`FixedSizeEventList`] is filled, read and cleared once per processing
//! block. Events are variable-length [`Record`]s bump-allocated into an arena
//! sized at construction; nothing allocates afterwards. Producers and
//! consumers see the list only through the [`EventSink`] and [`EventSource`]
//! views, or, with the `clap` feature, through CLAP's
//! `clap_output_events` / `clap_input_events` tables.

#[cfg(feature = "clap")]
pub mod clap;
mod error;
mod list;
mod record;
mod views;

#[cfg(feature = "clap")]
pub use clap::{ClapEvent, ClapInputEvents, ClapOutputEvents};
pub use error::{EventListError, RecordError, Result};
pub use list::{Capacity, FixedSizeEventList, Iter, ListState};
pub use record::{Record, HEADER_LEN};
pub use views::{forward, EventSink, EventSource, InputEvents, OutputEvents};

/// Re-export the raw bindings used by the `clap` views.
#[cfg(feature = "clap")]
pub use clap_sys as ffi;
