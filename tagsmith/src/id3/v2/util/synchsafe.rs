//! Synchsafe integers and unsynchronisation
//!
//! ID3v2 keeps its content from ever looking like an MPEG frame sync (`0xFF` followed by 3 set
//! bits). Sizes use only the low 7 bits of each byte, and unsynchronised content has a `0x00`
//! stuffed after every `0xFF`.

use crate::error::Result;
use crate::macros::err;

/// Conversion between plain and synchsafe integers
pub trait SynchsafeInteger: Sized {
	/// Spread the value over the low 7 bits of each byte
	///
	/// # Errors
	///
	/// The value needs more than 28 bits
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::id3::v2::util::synchsafe::SynchsafeInteger;
	///
	/// # fn main() -> tagsmith::error::Result<()> {
	/// assert_eq!(1000_u32.synch()?, 0x0768);
	/// assert!(0x1000_0000_u32.synch().is_err());
	/// # Ok(()) }
	/// ```
	fn synch(self) -> Result<Self>;

	/// Read back a synchsafe value, ignoring the high bit of each byte
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::id3::v2::util::synchsafe::SynchsafeInteger;
	///
	/// assert_eq!(0x0768_u32.unsynch(), 1000);
	/// ```
	fn unsynch(self) -> Self;
}

impl SynchsafeInteger for u32 {
	fn synch(self) -> Result<Self> {
		if self >> 28 != 0 {
			err!(TooMuchData);
		}

		Ok((0..4_u32).fold(0, |out, group| out | ((self >> (group * 7)) & 0x7F) << (group * 8)))
	}

	fn unsynch(self) -> Self {
		(0..4_u32).fold(0, |out, group| out | ((self >> (group * 8)) & 0x7F) << (group * 7))
	}
}

/// Undo unsynchronisation, dropping each `0x00` that directly follows an `0xFF`
///
/// # Examples
///
/// ```rust
/// use tagsmith::id3::v2::util::synchsafe::resynchronise;
///
/// assert_eq!(resynchronise(&[0xFF, 0x00, 0xE2, 0xFF, 0x00]), [0xFF, 0xE2, 0xFF]);
/// ```
pub fn resynchronise(content: &[u8]) -> Vec<u8> {
	let mut out = Vec::with_capacity(content.len());

	for (index, &byte) in content.iter().enumerate() {
		let stuffed = byte == 0 && index > 0 && content[index - 1] == 0xFF;
		if !stuffed {
			out.push(byte);
		}
	}

	out
}

/// Apply unsynchronisation, stuffing a `0x00` after every `0xFF`
///
/// The output never holds a false frame sync, and [`resynchronise`] restores `content` exactly.
///
/// # Examples
///
/// ```rust
/// use tagsmith::id3::v2::util::synchsafe::{resynchronise, unsynchronise};
///
/// let content = [0x12, 0xFF, 0xF3];
/// assert_eq!(unsynchronise(&content), [0x12, 0xFF, 0x00, 0xF3]);
/// assert_eq!(resynchronise(&unsynchronise(&content)), content);
/// ```
pub fn unsynchronise(content: &[u8]) -> Vec<u8> {
	let stuffed = content.iter().filter(|b| **b == 0xFF).count();

	let mut out = Vec::with_capacity(content.len() + stuffed);
	for &byte in content {
		out.push(byte);
		if byte == 0xFF {
			out.push(0);
		}
	}

	out
}
