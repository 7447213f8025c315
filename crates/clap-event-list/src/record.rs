//! Self-describing event records.
//!
//! A record is an opaque byte blob whose first [`HEADER_LEN`] bytes hold its
//! total length as a native-endian `u32`. This matches the leading `size`
//! field of `clap_event_header`, so every CLAP event is a valid record.

use core::fmt;

use crate::error::RecordError;

/// Width of the length header at the start of every record.
pub const HEADER_LEN: usize = core::mem::size_of::<u32>();

#[inline]
pub(crate) fn read_header(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; HEADER_LEN];
    raw.copy_from_slice(&bytes[..HEADER_LEN]);
    u32::from_ne_bytes(raw)
}

#[inline]
pub(crate) fn write_header(bytes: &mut [u8], len: u32) {
    bytes[..HEADER_LEN].copy_from_slice(&len.to_ne_bytes());
}

/// Borrowed view of one encoded event.
///
/// `Record` is unsized, like `str`: it is only ever handled behind a
/// reference. A `&Record` always satisfies `header == len() >= HEADER_LEN`.
#[repr(transparent)]
pub struct Record {
    bytes: [u8],
}

#[allow(clippy::len_without_is_empty)]
impl Record {
    /// Views `bytes` as a record after checking its header.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Record, RecordError> {
        if bytes.len() < HEADER_LEN {
            return Err(RecordError::Truncated { len: bytes.len() });
        }
        let declared = read_header(bytes);
        if declared as usize != bytes.len() {
            return Err(RecordError::LengthMismatch {
                declared,
                actual: bytes.len(),
            });
        }
        Ok(Self::from_bytes_unchecked(bytes))
    }

    /// Stamps the header of `buf` with `buf.len()` and returns it as a record.
    ///
    /// This is the way producers build events on the stack before pushing
    /// them into a list.
    pub fn init(buf: &mut [u8]) -> Result<&mut Record, RecordError> {
        if buf.len() < HEADER_LEN {
            return Err(RecordError::Truncated { len: buf.len() });
        }
        let len = u32::try_from(buf.len()).map_err(|_| RecordError::TooLong { len: buf.len() })?;
        write_header(buf, len);
        Ok(Self::from_bytes_mut_unchecked(buf))
    }

    // Callers guarantee the header matches the slice length.
    #[inline]
    pub(crate) fn from_bytes_unchecked(bytes: &[u8]) -> &Record {
        debug_assert!(bytes.len() >= HEADER_LEN);
        debug_assert_eq!(read_header(bytes) as usize, bytes.len());
        // Safety: `Record` is a transparent wrapper around `[u8]`.
        unsafe { &*(bytes as *const [u8] as *const Record) }
    }

    #[inline]
    pub(crate) fn from_bytes_mut_unchecked(bytes: &mut [u8]) -> &mut Record {
        debug_assert!(bytes.len() >= HEADER_LEN);
        debug_assert_eq!(read_header(bytes) as usize, bytes.len());
        // Safety: `Record` is a transparent wrapper around `[u8]`.
        unsafe { &mut *(bytes as *mut [u8] as *mut Record) }
    }

    /// Total length in bytes, header included.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Length as encoded in the header.
    #[inline]
    pub fn declared_len(&self) -> u32 {
        read_header(&self.bytes)
    }

    /// All bytes of the record, header included.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes following the length header.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..]
    }

    /// Mutable bytes following the length header. The header itself stays
    /// read-only so the record cannot lie about its size.
    #[inline]
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[HEADER_LEN..]
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }

    #[inline]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        self.bytes.as_mut_ptr()
    }
}

impl AsRef<[u8]> for Record {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Record {}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("len", &self.len())
            .field("payload", &self.payload())
            .finish()
    }
}
