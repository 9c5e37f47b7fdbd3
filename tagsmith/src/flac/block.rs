use crate::error::Result;
use crate::macros::{decode_err, err};
use crate::util::alloc::read_to_vec;

use std::io::Read;

use byteorder::{BigEndian, ReadBytesExt};

pub(in crate::flac) const BLOCK_ID_STREAMINFO: u8 = 0;
pub(in crate::flac) const BLOCK_ID_PADDING: u8 = 1;
pub(in crate::flac) const BLOCK_ID_VORBIS_COMMENTS: u8 = 4;
pub(in crate::flac) const BLOCK_ID_PICTURE: u8 = 6;

// Block sizes are 24 bits
const MAX_BLOCK_SIZE: usize = 0xFF_FFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(in crate::flac) struct Block {
	pub(in crate::flac) ty: u8,
	pub(in crate::flac) last: bool,
	pub(in crate::flac) content: Vec<u8>,
}

impl Block {
	pub(in crate::flac) fn new(ty: u8, content: Vec<u8>) -> Self {
		Self {
			ty,
			last: false,
			content,
		}
	}

	pub(in crate::flac) fn new_padding(len: usize) -> Self {
		Self::new(BLOCK_ID_PADDING, vec![0; len])
	}

	/// Read a block header, and its content if it fits in `remaining` bytes
	pub(in crate::flac) fn read<R>(data: &mut R, remaining: u64) -> Result<Self>
	where
		R: Read + ?Sized,
	{
		let byte = data.read_u8()?;
		let last = (byte & 0x80) != 0;
		let ty = byte & 0x7F;

		let size = data.read_u24::<BigEndian>()?;
		log::trace!("Reading FLAC block, type: {ty}, size: {size}");

		if u64::from(size) + 4 > remaining {
			decode_err!(@BAIL Flac, "Block size exceeds the stream length");
		}

		Ok(Self {
			ty,
			last,
			content: read_to_vec(data, u64::from(size))?,
		})
	}

	/// The size of the block, including its header
	pub(in crate::flac) fn len(&self) -> u64 {
		4 + self.content.len() as u64
	}

	pub(in crate::flac) fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
		if self.content.len() > MAX_BLOCK_SIZE {
			err!(TooMuchData);
		}

		let mut byte = self.ty;
		if self.last {
			byte |= 0x80;
		}

		out.push(byte);
		out.extend(&(self.content.len() as u32).to_be_bytes()[1..]);
		out.extend(&self.content);

		log::trace!(
			"Wrote a block (ty: {}, size: {})",
			self.ty,
			self.content.len()
		);
		Ok(())
	}
}
