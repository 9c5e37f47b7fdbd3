//! A bounds checked reader over a byte region
//!
//! Every codec reads its metadata region into memory and walks it with a [`ByteCursor`].
//! The cursor never reads past the end of its region, any attempt to do so produces an
//! [`OutOfBounds`], which converts into a decoding error at the codec boundary.

use crate::error::Result;
use crate::id3::v2::util::synchsafe::SynchsafeInteger;
use crate::util::text::{TextEncoding, decode_text, find_terminator};

use std::fmt::{Display, Formatter};

use byteorder::ByteOrder;

/// An attempt to read past the end of a byte region
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OutOfBounds {
	position: usize,
	requested: usize,
	remaining: usize,
}

impl OutOfBounds {
	/// The position within the region at which the read was attempted
	pub fn position(&self) -> usize {
		self.position
	}

	/// The number of bytes the read needed
	pub fn requested(&self) -> usize {
		self.requested
	}

	/// The number of bytes that were actually left
	pub fn remaining(&self) -> usize {
		self.remaining
	}
}

impl Display for OutOfBounds {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"requested {} bytes at offset {}, only {} remain",
			self.requested, self.position, self.remaining
		)
	}
}

impl std::error::Error for OutOfBounds {}

type CursorResult<T> = std::result::Result<T, OutOfBounds>;

#[derive(Clone, Debug)]
pub(crate) struct ByteCursor<'a> {
	data: &'a [u8],
	pos: usize,
}

impl<'a> ByteCursor<'a> {
	pub(crate) fn new(data: &'a [u8]) -> Self {
		Self { data, pos: 0 }
	}

	pub(crate) fn position(&self) -> usize {
		self.pos
	}

	pub(crate) fn remaining(&self) -> usize {
		self.data.len() - self.pos
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.remaining() == 0
	}

	fn overrun(&self, requested: usize) -> OutOfBounds {
		OutOfBounds {
			position: self.pos,
			requested,
			remaining: self.remaining(),
		}
	}

	pub(crate) fn seek(&mut self, pos: usize) -> CursorResult<()> {
		if pos > self.data.len() {
			return Err(OutOfBounds {
				position: self.pos,
				requested: pos.saturating_sub(self.pos),
				remaining: self.remaining(),
			});
		}

		self.pos = pos;
		Ok(())
	}

	pub(crate) fn skip(&mut self, n: usize) -> CursorResult<()> {
		self.read_bytes(n).map(|_| ())
	}

	pub(crate) fn peek_bytes(&self, n: usize) -> CursorResult<&'a [u8]> {
		if n > self.remaining() {
			return Err(self.overrun(n));
		}

		Ok(&self.data[self.pos..self.pos + n])
	}

	pub(crate) fn peek_u8(&self) -> CursorResult<u8> {
		self.peek_bytes(1).map(|b| b[0])
	}

	pub(crate) fn read_bytes(&mut self, n: usize) -> CursorResult<&'a [u8]> {
		let bytes = self.peek_bytes(n)?;
		self.pos += n;
		Ok(bytes)
	}

	pub(crate) fn read_array<const N: usize>(&mut self) -> CursorResult<[u8; N]> {
		let mut array = [0; N];
		array.copy_from_slice(self.read_bytes(N)?);
		Ok(array)
	}

	/// Consume everything left in the region
	pub(crate) fn read_rest(&mut self) -> &'a [u8] {
		let rest = &self.data[self.pos..];
		self.pos = self.data.len();
		rest
	}

	pub(crate) fn read_u8(&mut self) -> CursorResult<u8> {
		self.read_bytes(1).map(|b| b[0])
	}

	pub(crate) fn read_u16<B: ByteOrder>(&mut self) -> CursorResult<u16> {
		self.read_bytes(2).map(B::read_u16)
	}

	pub(crate) fn read_u24<B: ByteOrder>(&mut self) -> CursorResult<u32> {
		self.read_bytes(3).map(B::read_u24)
	}

	pub(crate) fn read_u32<B: ByteOrder>(&mut self) -> CursorResult<u32> {
		self.read_bytes(4).map(B::read_u32)
	}

	pub(crate) fn read_u64<B: ByteOrder>(&mut self) -> CursorResult<u64> {
		self.read_bytes(8).map(B::read_u64)
	}

	/// Read a big endian synchsafe integer (7 usable bits per byte)
	pub(crate) fn read_synchsafe_u32(&mut self) -> CursorResult<u32> {
		self.read_u32::<byteorder::BigEndian>()
			.map(SynchsafeInteger::unsynch)
	}

	/// Read a null terminated string
	///
	/// A missing terminator is tolerated, in which case the rest of the region is the string.
	pub(crate) fn read_terminated_string(&mut self, encoding: TextEncoding) -> Result<String> {
		let bytes = self.read_terminated_bytes(encoding);
		decode_text(bytes, encoding)
	}

	/// Read the raw bytes of a null terminated string, without the terminator
	pub(crate) fn read_terminated_bytes(&mut self, encoding: TextEncoding) -> &'a [u8] {
		let rest = &self.data[self.pos..];
		match find_terminator(rest, encoding) {
			Some(end) => {
				self.pos += end + encoding.terminator_len();
				&rest[..end]
			},
			None => self.read_rest(),
		}
	}
}
