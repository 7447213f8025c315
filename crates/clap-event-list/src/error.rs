use thiserror::Error;

use crate::record::HEADER_LEN;

/// Reasons a byte slice cannot be viewed as a [`Record`](crate::Record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record of {len} bytes is shorter than its {}-byte header", HEADER_LEN)]
    Truncated { len: usize },
    #[error("record header declares {declared} bytes but {actual} are present")]
    LengthMismatch { declared: u32, actual: usize },
    #[error("record of {len} bytes does not fit a 32-bit length header")]
    TooLong { len: usize },
}

/// Errors returned by [`FixedSizeEventList`](crate::FixedSizeEventList).
///
/// Every capacity error leaves the list untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EventListError {
    #[error("event of {size} bytes exceeds the {max}-byte slot limit")]
    TooLarge { size: usize, max: usize },
    #[error("event of {size} bytes cannot hold the {}-byte header", HEADER_LEN)]
    TooSmall { size: usize },
    #[error("all {slots} event slots are in use")]
    SlotsExhausted { slots: usize },
    #[error("event of {requested} bytes exceeds the {remaining} bytes left in the arena")]
    BytesExhausted { requested: usize, remaining: usize },
    #[error("event index {index} out of range for list of {len} events")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("malformed event: {0}")]
    Malformed(#[from] RecordError),
}

impl EventListError {
    /// True for the errors that mean "the list has no room for this event".
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            EventListError::TooLarge { .. }
                | EventListError::SlotsExhausted { .. }
                | EventListError::BytesExhausted { .. }
        )
    }
}

pub type Result<T, E = EventListError> = core::result::Result<T, E>;
