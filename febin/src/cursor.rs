//! This module implements the bounds-checked cursor everything else reads
//! binary data through.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{FebinError, Result};
use crate::flavour::Endianness;

/// Generates the fixed-width read methods.
macro_rules! gen_reads {
  (
    $(($fname:ident, $ty:ty, $width:literal),)*
  ) => {
    $(
      #[doc = concat!(
        "Reads a `", stringify!($ty), "`. Fails if fewer than ",
        stringify!($width), " bytes remain."
      )]
      pub fn $fname(&mut self) -> Result<$ty> {
        let bytes = self.take($width)?;
        return Ok(match self.endianness {
          Endianness::Little => LittleEndian::$fname(bytes),
          Endianness::Big => BigEndian::$fname(bytes),
        });
      }
    )*
  };
}

/// A read position over a borrowed byte buffer. Failed reads never move the
/// position.
#[derive(Clone, Debug)]
pub struct Cursor<'b> {
  /// The bytes we read from.
  buf: &'b [u8],
  /// The current position within `buf`.
  pos: usize,
  /// Byte order for multi-byte values.
  endianness: Endianness,
  /// Absolute file offset of `buf[0]`, for error reporting.
  base: u64
}

impl<'b> Cursor<'b> {
  /// Creates a cursor at the start of a buffer.
  pub fn new(buf: &'b [u8], endianness: Endianness) -> Self {
    return Self::with_base(buf, endianness, 0);
  }

  /// Creates a cursor over a slice that starts at `base` within its file.
  pub(crate) fn with_base(
    buf: &'b [u8],
    endianness: Endianness,
    base: u64
  ) -> Self {
    return Self { buf, pos: 0, endianness, base };
  }

  /// Returns the current position, relative to the start of the buffer.
  pub fn position(&self) -> usize {
    return self.pos;
  }

  /// Returns the absolute file offset of the current position.
  pub fn offset(&self) -> u64 {
    return self.base + self.pos as u64;
  }

  /// Returns the number of bytes left to read.
  pub fn remaining(&self) -> usize {
    return self.buf.len() - self.pos;
  }

  /// Returns the byte order in use.
  pub fn endianness(&self) -> Endianness {
    return self.endianness;
  }

  /// Moves to an absolute position within the buffer. The end of the buffer
  /// is a valid position.
  pub fn seek(&mut self, pos: usize) -> Result<()> {
    if pos > self.buf.len() {
      return Err(FebinError::OutOfBounds {
        offset: self.offset(),
        requested: (pos - self.pos) as u64,
        available: self.remaining() as u64
      });
    }
    self.pos = pos;
    return Ok(());
  }

  /// Skips over some bytes.
  pub fn skip(&mut self, n: usize) -> Result<()> {
    return self.take(n).map(|_| ());
  }

  /// Reads a raw block of bytes.
  pub fn read_bytes(&mut self, n: usize) -> Result<&'b [u8]> {
    return self.take(n);
  }

  /// Takes the next `n` bytes, or fails without moving.
  fn take(&mut self, n: usize) -> Result<&'b [u8]> {
    let available = self.remaining();
    if n > available {
      return Err(FebinError::OutOfBounds {
        offset: self.offset(),
        requested: n as u64,
        available: available as u64
      });
    }
    let bytes = &self.buf[self.pos..self.pos + n];
    self.pos += n;
    return Ok(bytes);
  }

  gen_reads!(
    (read_i32, i32, 4),
    (read_u32, u32, 4),
    (read_i64, i64, 8),
    (read_u64, u64, 8),
    (read_f32, f32, 4),
    (read_f64, f64, 8),
  );
}
