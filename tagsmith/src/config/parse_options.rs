/// How strictly, and how much, to decode
///
/// Every field has a builder method. The defaults suit most libraries of real world files.
///
/// | Option                   | Default                     |
/// |--------------------------|-----------------------------|
/// | `parsing_mode`           | [`ParsingMode::BestAttempt`]|
/// | `max_junk_bytes`         | 1024                        |
/// | `read_cover_art`         | `true`                      |
/// | `implicit_conversions`   | `true`                      |
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct ParseOptions {
	pub(crate) parsing_mode: ParsingMode,
	pub(crate) max_junk_bytes: usize,
	pub(crate) read_cover_art: bool,
	pub(crate) implicit_conversions: bool,
}

impl Default for ParseOptions {
	fn default() -> Self {
		Self::new()
	}
}

impl ParseOptions {
	/// The parsing mode used unless one is set
	pub const DEFAULT_PARSING_MODE: ParsingMode = ParsingMode::BestAttempt;

	/// How far the sniffer searches for an MPEG frame after a leading ID3v2 tag, unless set
	pub const DEFAULT_MAX_JUNK_BYTES: usize = 1024;

	/// The default options, usable in `const` contexts
	#[must_use]
	pub const fn new() -> Self {
		Self {
			parsing_mode: Self::DEFAULT_PARSING_MODE,
			max_junk_bytes: Self::DEFAULT_MAX_JUNK_BYTES,
			read_cover_art: true,
			implicit_conversions: true,
		}
	}

	/// How to react to malformed data, see [`ParsingMode`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::config::{ParseOptions, ParsingMode};
	///
	/// // Reject anything suspicious
	/// let options = ParseOptions::new().parsing_mode(ParsingMode::Strict);
	/// ```
	pub fn parsing_mode(&mut self, parsing_mode: ParsingMode) -> Self {
		self.parsing_mode = parsing_mode;
		*self
	}

	/// How many bytes of garbage to skip while looking for the first MPEG frame
	///
	/// Taggers sometimes leave stale padding or partial frames after an ID3v2 tag. The sniffer
	/// only searches this far before giving up on the content.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::config::ParseOptions;
	///
	/// let options = ParseOptions::new().max_junk_bytes(4096);
	/// ```
	pub fn max_junk_bytes(&mut self, max_junk_bytes: usize) -> Self {
		self.max_junk_bytes = max_junk_bytes;
		*self
	}

	/// Whether to decode artwork into [`Picture`](crate::picture::Picture)s
	///
	/// Disabled, artwork stays an undecoded native item. It is skipped by
	/// [`Tag::pictures`](crate::tag::Tag::pictures), but still written back untouched.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::config::ParseOptions;
	///
	/// // Only the text is needed
	/// let options = ParseOptions::new().read_cover_art(false);
	/// ```
	pub fn read_cover_art(&mut self, read_cover_art: bool) -> Self {
		self.read_cover_art = read_cover_art;
		*self
	}

	/// Whether to normalize combined values while decoding
	///
	/// Enabled, tagsmith:
	///
	/// * splits `number/total` pairs (ID3v2 `TRCK`/`TPOS`, Vorbis `TRACKNUMBER`, ASF
	///   `WM/PartOfSet`)
	/// * resolves numeric genre references (ID3v2 `(17)`, MP4 `gnre`)
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::config::ParseOptions;
	///
	/// // Keep values exactly as stored
	/// let options = ParseOptions::new().implicit_conversions(false);
	/// ```
	pub fn implicit_conversions(&mut self, implicit_conversions: bool) -> Self {
		self.implicit_conversions = implicit_conversions;
		*self
	}
}

/// How to react to malformed data
///
/// Unrecoverable damage, such as a missing container header, is an error in every mode.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[non_exhaustive]
pub enum ParsingMode {
	/// Fail on the first defect
	///
	/// A frame, atom or descriptor with a bad size, undecodable text, or an unknown picture type
	/// rejects the whole tag.
	Strict,
	/// Skip defective items, keep everything that decoded
	///
	/// A size that runs past its parent stops reading at that point. Text that doesn't decode
	/// is kept as an opaque native item.
	#[default]
	BestAttempt,
	/// Like [`ParsingMode::BestAttempt`], and also keeps items with invalid identifiers
	///
	/// Frame IDs and comment keys outside of their allowed character sets are kept as native
	/// items instead of being dropped.
	Relaxed,
}
