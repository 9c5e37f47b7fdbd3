/// How tags are laid out when written
///
/// Most options only concern one format, and are ignored by the others.
///
/// | Option                    | Default      |
/// |---------------------------|--------------|
/// | `preferred_padding`       | 1024 bytes   |
/// | `use_id3v23`              | `false`      |
/// | `id3v2_unsynchronisation` | `false`      |
/// | `lossy_text_encoding`     | `true`       |
/// | `update_id3v1`            | `true`       |
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct WriteOptions {
	pub(crate) preferred_padding: Option<u32>,
	pub(crate) use_id3v23: bool,
	pub(crate) id3v2_unsynchronisation: bool,
	pub(crate) lossy_text_encoding: bool,
	pub(crate) update_id3v1: bool,
}

impl WriteOptions {
	/// Padding added to a tag that outgrew its old space, unless set
	pub const DEFAULT_PREFERRED_PADDING: u32 = 1024;

	/// The default options, usable in `const` contexts
	#[must_use]
	pub const fn new() -> Self {
		Self {
			preferred_padding: Some(Self::DEFAULT_PREFERRED_PADDING),
			use_id3v23: false,
			id3v2_unsynchronisation: false,
			lossy_text_encoding: true,
			update_id3v1: true,
		}
	}

	/// Padding to reserve when a tag no longer fits in its old space
	///
	/// Padding lets later writes grow the tag without moving the audio. It is used by ID3v2,
	/// FLAC and ASF. A new tag that fits in the old space always reuses it, whatever this is set
	/// to. `0` disables padding.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::config::WriteOptions;
	///
	/// // Room for a large cover later on
	/// let options = WriteOptions::new().preferred_padding(64 * 1024);
	///
	/// // The smallest possible files
	/// let options = WriteOptions::new().preferred_padding(0);
	/// ```
	pub fn preferred_padding(mut self, preferred_padding: u32) -> Self {
		self.preferred_padding = (preferred_padding > 0).then_some(preferred_padding);
		self
	}

	/// Write ID3v2.3 instead of ID3v2.4
	///
	/// ID3v2.3 can't store UTF-8, so non Latin-1 text is written as UTF-16. Dates are split
	/// back into the ID3v2.3 frames (`TYER`, `TORY`).
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::config::WriteOptions;
	///
	/// // For players that never learned ID3v2.4
	/// let options = WriteOptions::new().use_id3v23(true);
	/// ```
	pub fn use_id3v23(mut self, use_id3v23: bool) -> Self {
		self.use_id3v23 = use_id3v23;
		self
	}

	/// Unsynchronise ID3v2 tags, so no false MPEG frame syncs appear in them
	///
	/// ID3v2.4 unsynchronises each frame, ID3v2.3 the whole tag body. The header flag is set in
	/// both cases.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::config::WriteOptions;
	///
	/// let options = WriteOptions::new().id3v2_unsynchronisation(true);
	/// ```
	pub fn id3v2_unsynchronisation(mut self, id3v2_unsynchronisation: bool) -> Self {
		self.id3v2_unsynchronisation = id3v2_unsynchronisation;
		self
	}

	/// Replace characters a Latin-1 field can't hold with `?`
	///
	/// Only ID3v1, and ID3v2 frames that must be Latin-1, are affected. Disabled, such text
	/// fails the write.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::config::WriteOptions;
	///
	/// let options = WriteOptions::new().lossy_text_encoding(false);
	/// ```
	pub fn lossy_text_encoding(mut self, lossy_text_encoding: bool) -> Self {
		self.lossy_text_encoding = lossy_text_encoding;
		self
	}

	/// Rewrite an existing ID3v1 tag along with the ID3v2 tag of an MPEG file
	///
	/// The ID3v1 tag is rebuilt from the same [`Tag`](crate::tag::Tag). Files without an ID3v1
	/// tag never gain one.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::config::WriteOptions;
	///
	/// // Leave the ID3v1 tag as it is
	/// let options = WriteOptions::new().update_id3v1(false);
	/// ```
	pub fn update_id3v1(mut self, update_id3v1: bool) -> Self {
		self.update_id3v1 = update_id3v1;
		self
	}
}

impl Default for WriteOptions {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::WriteOptions;

	#[test_log::test]
	fn zero_padding_disables_it() {
		assert_eq!(WriteOptions::new().preferred_padding, Some(1024));
		assert_eq!(WriteOptions::new().preferred_padding(0).preferred_padding, None);
		assert_eq!(WriteOptions::new().preferred_padding(8).preferred_padding, Some(8));
	}
}
