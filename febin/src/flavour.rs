//! This module implements the differences between flavours of binary files:
//! the format version they were written with (which fixes the byte order) and
//! the kind of data they carry.

use std::fmt::Display;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use clap::ValueEnum;
use serde::{Serialize, Deserialize};

use crate::error::{FebinError, Result};

/// Byte order of every multi-byte value in a file.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Endianness {
  /// Least significant byte first.
  Little,
  /// Most significant byte first.
  Big
}

/// The known format versions.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ValueEnum
)]
#[non_exhaustive]
pub enum FormatVersion {
  /// Version 1, written by the solver in its native little-endian layout.
  V1,
  /// Version 2, the portable big-endian layout.
  V2
}

impl FormatVersion {
  /// Returns the byte order this version is written in.
  pub const fn endianness(&self) -> Endianness {
    return match self {
      Self::V1 => Endianness::Little,
      Self::V2 => Endianness::Big,
    };
  }

  /// Returns the version number as stored in the header.
  pub const fn number(&self) -> u32 {
    return match self {
      Self::V1 => 1,
      Self::V2 => 2,
    };
  }

  /// Returns the four header bytes that stamp this version.
  pub fn stamp(&self) -> [u8; 4] {
    let mut word = [0u8; 4];
    match self.endianness() {
      Endianness::Little => LittleEndian::write_u32(&mut word, self.number()),
      Endianness::Big => BigEndian::write_u32(&mut word, self.number()),
    };
    return word;
  }

  /// Detects the version from the raw version word. Unstamped files (an
  /// all-zero word) fall back to the hint; without one they're rejected.
  pub fn detect(word: &[u8], hint: Option<Self>) -> Result<Self> {
    let le = LittleEndian::read_u32(word);
    let be = BigEndian::read_u32(word);
    return match (le, be) {
      (1, _) => Ok(Self::V1),
      (_, 2) => Ok(Self::V2),
      (0, _) => hint.ok_or(FebinError::UnsupportedVersion(0)),
      _ => Err(FebinError::UnsupportedVersion(le))
    };
  }
}

impl Display for FormatVersion {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "v{}", self.number());
  }
}

/// What a file holds. Doubles as the output kind selector for callers.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ValueEnum
)]
pub enum FileKind {
  /// Node and element definitions.
  Archive,
  /// Solution summary and field results.
  Result,
  /// Sparse system matrices.
  Matrix
}

impl FileKind {
  /// Returns the lowercase name of the kind.
  pub const fn name(&self) -> &'static str {
    return match self {
      Self::Archive => "archive",
      Self::Result => "result",
      Self::Matrix => "matrix",
    };
  }

  /// Returns the header code of the kind.
  pub const fn code(&self) -> u32 {
    return match self {
      Self::Archive => 1,
      Self::Result => 2,
      Self::Matrix => 3,
    };
  }
}

impl TryFrom<u32> for FileKind {
  type Error = FebinError;

  fn try_from(code: u32) -> Result<Self> {
    return match code {
      1 => Ok(Self::Archive),
      2 => Ok(Self::Result),
      3 => Ok(Self::Matrix),
      _ => Err(FebinError::UnknownFileKind(code))
    };
  }
}

impl Display for FileKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.name());
  }
}

/// Options for opening a file.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadOptions {
  /// Version to assume when the header isn't stamped with one.
  pub version_hint: Option<FormatVersion>
}

impl ReadOptions {
  /// Hints the reader about the version.
  pub fn with_version_hint(mut self, version: FormatVersion) -> Self {
    self.version_hint = Some(version);
    return self;
  }
}
