use crate::picture::Picture;
use crate::tag::TagType;

use std::borrow::Cow;
use std::collections::HashMap;

macro_rules! first_key {
	($key:tt $(| $remaining:expr)*) => {
		$key
	};
}

// This is used to create the key/ItemKey maps
//
// First comes the name of the map.
// Ex:
//
// VORBIS_MAP;
//
// This is followed by the key value pairs separated by `=>`, with the key being the
// format-specific key and the value being the appropriate ItemKey variant.
// Ex. "ARTIST" => TrackArtist
//
// Some formats have multiple keys that map to the same ItemKey variant, which can be added with '|'.
// The standard key(s) **must** come before any popular non-standard keys, the first one is the
// key that gets written.
macro_rules! gen_map {
	(
		$(#[$meta:meta])?
		$NAME:ident;

		$(
			$($key:literal)|+ => $variant:ident
		),+ $(,)?
	) => {
		paste::paste! {
			$(#[$meta])?
			#[allow(non_camel_case_types)]
			struct $NAME;

			$(#[$meta])?
			impl $NAME {
				pub(crate) fn get_item_key(&self, key: &str) -> Option<ItemKey> {
					static INSTANCE: std::sync::OnceLock<HashMap<&'static str, ItemKey>> = std::sync::OnceLock::new();
					INSTANCE.get_or_init(|| {
						let mut map = HashMap::new();
						$(
							$(
								map.insert($key, ItemKey::$variant);
							)+
						)+
						map
					}).iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v.clone())
				}

				pub(crate) fn get_key(&self, item_key: &ItemKey) -> Option<&'static str> {
					match item_key {
						$(
							ItemKey::$variant => Some(first_key!($($key)|*)),
						)+
						_ => None
					}
				}
			}
		}
	}
}

gen_map!(
	ID3V2_MAP;

	"TIT2"        => TrackTitle,
	"TPE1"        => TrackArtist,
	"TALB"        => AlbumTitle,
	"TPE2"        => AlbumArtist,
	"TRCK"        => TrackNumber,
	"TPOS"        => DiscNumber,
	"TDRC"        => Year,
	"TCON"        => Genre,
	"COMM"        => Comment,
	"TCOM"        => Composer,
	"TEXT"        => Lyricist,
	"TPE3"        => Conductor,
	"USLT"        => Lyrics,
	"TCOP"        => CopyrightMessage,
	"TPUB"        => Publisher,
	"TENC"        => EncodedBy,
	"TSSE"        => EncoderSoftware,
	"TBPM"        => Bpm,
	"TIT1"        => Grouping,
	"TIT3"        => Subtitle,
	"TSRC"        => Isrc,
	"TMOO"        => Mood,
	"TLAN"        => Language,
	"TCMP"        => Compilation,
	"TSOT"        => TrackTitleSortOrder,
	"TSOP"        => TrackArtistSortOrder,
	"TSOA"        => AlbumTitleSortOrder
);

gen_map!(
	VORBIS_MAP;

	"TITLE"                       => TrackTitle,
	"ARTIST"                      => TrackArtist,
	"ALBUM"                       => AlbumTitle,
	"ALBUMARTIST"                 => AlbumArtist,
	"TRACKNUMBER"                 => TrackNumber,
	"TRACKTOTAL" | "TOTALTRACKS"  => TrackTotal,
	"DISCNUMBER"                  => DiscNumber,
	"DISCTOTAL" | "TOTALDISCS"    => DiscTotal,
	"DATE" | "YEAR"               => Year,
	"GENRE"                       => Genre,
	"COMMENT" | "DESCRIPTION"     => Comment,
	"COMPOSER"                    => Composer,
	"LYRICIST"                    => Lyricist,
	"CONDUCTOR"                   => Conductor,
	"LYRICS" | "UNSYNCEDLYRICS"   => Lyrics,
	"COPYRIGHT"                   => CopyrightMessage,
	"LABEL" | "ORGANIZATION"      => Publisher,
	"ENCODEDBY" | "ENCODED-BY"    => EncodedBy,
	"ENCODER"                     => EncoderSoftware,
	"BPM"                         => Bpm,
	"GROUPING"                    => Grouping,
	"SUBTITLE"                    => Subtitle,
	"ISRC"                        => Isrc,
	"MOOD"                        => Mood,
	"LANGUAGE"                    => Language,
	"COMPILATION"                 => Compilation,
	"TITLESORT"                   => TrackTitleSortOrder,
	"ARTISTSORT"                  => TrackArtistSortOrder,
	"ALBUMSORT"                   => AlbumTitleSortOrder
);

gen_map!(
	ILST_MAP;

	"\u{a9}nam"                          => TrackTitle,
	"\u{a9}ART"                          => TrackArtist,
	"\u{a9}alb"                          => AlbumTitle,
	"aART"                               => AlbumArtist,
	"\u{a9}day"                          => Year,
	"\u{a9}gen"                          => Genre,
	"\u{a9}cmt"                          => Comment,
	"\u{a9}wrt"                          => Composer,
	"\u{a9}lyr"                          => Lyrics,
	"cprt"                               => CopyrightMessage,
	"\u{a9}enc"                          => EncodedBy,
	"\u{a9}too"                          => EncoderSoftware,
	"\u{a9}grp"                          => Grouping,
	"sonm"                               => TrackTitleSortOrder,
	"soar"                               => TrackArtistSortOrder,
	"soal"                               => AlbumTitleSortOrder,
	"----:com.apple.iTunes:ISRC"         => Isrc,
	"----:com.apple.iTunes:LABEL"        => Publisher,
	"----:com.apple.iTunes:CONDUCTOR"    => Conductor,
	"----:com.apple.iTunes:LYRICIST"     => Lyricist,
	"----:com.apple.iTunes:MOOD"         => Mood,
	"----:com.apple.iTunes:LANGUAGE"     => Language,
	"----:com.apple.iTunes:SUBTITLE"     => Subtitle
);

gen_map!(
	ASF_MAP;

	"Title"                         => TrackTitle,
	"Author"                        => TrackArtist,
	"Copyright"                     => CopyrightMessage,
	"Description"                   => Comment,
	"WM/AlbumTitle"                 => AlbumTitle,
	"WM/AlbumArtist"                => AlbumArtist,
	"WM/TrackNumber"                => TrackNumber,
	"WM/PartOfSet"                  => DiscNumber,
	"WM/Year"                       => Year,
	"WM/Genre"                      => Genre,
	"WM/Composer"                   => Composer,
	"WM/Writer"                     => Lyricist,
	"WM/Conductor"                  => Conductor,
	"WM/Lyrics"                     => Lyrics,
	"WM/Publisher"                  => Publisher,
	"WM/EncodedBy"                  => EncodedBy,
	"WM/ToolName"                   => EncoderSoftware,
	"WM/BeatsPerMinute"             => Bpm,
	"WM/ContentGroupDescription"    => Grouping,
	"WM/SubTitle"                   => Subtitle,
	"WM/ISRC"                       => Isrc,
	"WM/Mood"                       => Mood,
	"WM/Language"                   => Language,
	"WM/TitleSortOrder"             => TrackTitleSortOrder,
	"WM/ArtistSortOrder"            => TrackArtistSortOrder,
	"WM/AlbumSortOrder"             => AlbumTitleSortOrder
);

/// A key that only has meaning in one tag format
///
/// Anything a codec does not understand is kept under its native key, so it can be written back
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NativeKey {
	tag_type: TagType,
	key: String,
}

impl NativeKey {
	/// Create a new `NativeKey`
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::tag::{NativeKey, TagType};
	///
	/// let key = NativeKey::new(TagType::Id3v2, "TXXX");
	/// assert_eq!(key.key(), "TXXX");
	/// ```
	pub fn new(tag_type: TagType, key: impl Into<String>) -> Self {
		Self {
			tag_type,
			key: key.into(),
		}
	}

	/// The tag format this key belongs to
	pub fn tag_type(&self) -> TagType {
		self.tag_type
	}

	/// The key, exactly as it appears in the tag
	pub fn key(&self) -> &str {
		&self.key
	}
}

/// A generic representation of a tag's key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
#[non_exhaustive]
pub enum ItemKey {
	// Titles
	TrackTitle,
	AlbumTitle,
	Subtitle,
	Grouping,

	// People & Organizations
	TrackArtist,
	AlbumArtist,
	Composer,
	Lyricist,
	Conductor,
	Publisher,
	EncodedBy,

	// Sorting
	TrackTitleSortOrder,
	TrackArtistSortOrder,
	AlbumTitleSortOrder,

	// Numbering
	TrackNumber,
	TrackTotal,
	DiscNumber,
	DiscTotal,
	Year,

	// Style
	Genre,
	Mood,
	Bpm,

	// Misc
	Comment,
	Lyrics,
	CopyrightMessage,
	EncoderSoftware,
	Isrc,
	Language,
	Compilation,

	/// Embedded artwork, always paired with [`ItemValue::Picture`]
	Artwork,

	/// A key only one tag format understands
	Native(NativeKey),
}

impl ItemKey {
	/// Map a format specific key to an `ItemKey`
	///
	/// NOTE: If used with ID3v1, this will always return [`ItemKey::Native`], since ID3v1 has
	/// no keys.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::tag::{ItemKey, TagType};
	///
	/// assert_eq!(ItemKey::from_key(TagType::VorbisComments, "artist"), ItemKey::TrackArtist);
	/// assert!(matches!(
	/// 	ItemKey::from_key(TagType::VorbisComments, "MY_KEY"),
	/// 	ItemKey::Native(_)
	/// ));
	/// ```
	pub fn from_key(tag_type: TagType, key: &str) -> Self {
		let known = match tag_type {
			TagType::Id3v2 => ID3V2_MAP.get_item_key(key),
			TagType::VorbisComments => VORBIS_MAP.get_item_key(key),
			TagType::Mp4Ilst => ILST_MAP.get_item_key(key),
			TagType::Asf => ASF_MAP.get_item_key(key),
			TagType::Id3v1 => None,
		};

		known.unwrap_or_else(|| ItemKey::Native(NativeKey::new(tag_type, key)))
	}

	/// Maps the variant to a format-specific key
	///
	/// A [`ItemKey::Native`] key only maps to its own format.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::tag::{ItemKey, TagType};
	///
	/// assert_eq!(ItemKey::TrackTitle.map_key(TagType::Id3v2), Some("TIT2"));
	/// assert_eq!(ItemKey::TrackTitle.map_key(TagType::Mp4Ilst), Some("\u{a9}nam"));
	/// ```
	pub fn map_key(&self, tag_type: TagType) -> Option<&str> {
		if let ItemKey::Native(native) = self {
			return (native.tag_type == tag_type).then_some(native.key());
		}

		match tag_type {
			TagType::Id3v2 => ID3V2_MAP.get_key(self),
			TagType::VorbisComments => VORBIS_MAP.get_key(self),
			TagType::Mp4Ilst => ILST_MAP.get_key(self),
			TagType::Asf => ASF_MAP.get_key(self),
			TagType::Id3v1 => None,
		}
	}

	/// Whether values for this key are stored as [`ItemValue::Integer`] when possible
	pub fn is_numeric(&self) -> bool {
		matches!(
			self,
			ItemKey::TrackNumber
				| ItemKey::TrackTotal
				| ItemKey::DiscNumber
				| ItemKey::DiscTotal
				| ItemKey::Year
				| ItemKey::Bpm
				| ItemKey::Compilation
		)
	}

	/// Returns the [`NativeKey`] if this is a format specific key
	pub fn native(&self) -> Option<&NativeKey> {
		match self {
			ItemKey::Native(native) => Some(native),
			_ => None,
		}
	}
}

/// Represents a tag item's value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemValue {
	/// Any UTF-8 encoded text
	Text(String),
	/// A number
	///
	/// Numeric fields (track and disc numbers, years, BPM) decode to this variant whenever the
	/// stored text is exactly the number.
	Integer(u32),
	/// Raw bytes, as they appear in the tag
	///
	/// For [`ItemKey::Native`] items, this is the undecoded payload of the field.
	Binary(Vec<u8>),
	/// Embedded artwork
	Picture(Picture),
}

impl ItemValue {
	/// Returns the value as text, if it is [`ItemValue::Text`] or [`ItemValue::Integer`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::tag::ItemValue;
	///
	/// assert_eq!(ItemValue::Integer(7).text().as_deref(), Some("7"));
	/// assert_eq!(ItemValue::Binary(vec![7]).text(), None);
	/// ```
	pub fn text(&self) -> Option<Cow<'_, str>> {
		match self {
			ItemValue::Text(text) => Some(Cow::Borrowed(text)),
			ItemValue::Integer(int) => Some(Cow::Owned(int.to_string())),
			_ => None,
		}
	}

	/// Returns the value as an integer, parsing text if necessary
	pub fn integer(&self) -> Option<u32> {
		match self {
			ItemValue::Integer(int) => Some(*int),
			ItemValue::Text(text) => text.trim().parse().ok(),
			_ => None,
		}
	}

	/// Returns the picture, if this is [`ItemValue::Picture`]
	pub fn picture(&self) -> Option<&Picture> {
		match self {
			ItemValue::Picture(picture) => Some(picture),
			_ => None,
		}
	}

	/// Returns the raw bytes, if this is [`ItemValue::Binary`]
	pub fn binary(&self) -> Option<&[u8]> {
		match self {
			ItemValue::Binary(bin) => Some(bin),
			_ => None,
		}
	}

	/// Build the value for decoded text under `key`
	///
	/// Numeric keys only become [`ItemValue::Integer`] if the text is the canonical spelling of
	/// the number, so that `"07"` survives a round trip.
	pub(crate) fn from_text(key: &ItemKey, text: String) -> Self {
		if key.is_numeric() {
			if let Ok(int) = text.parse::<u32>() {
				if int.to_string() == text {
					return ItemValue::Integer(int);
				}
			}
		}

		ItemValue::Text(text)
	}

	pub(crate) fn is_empty(&self) -> bool {
		match self {
			ItemValue::Text(text) => text.is_empty(),
			ItemValue::Binary(bin) => bin.is_empty(),
			ItemValue::Integer(_) | ItemValue::Picture(_) => false,
		}
	}
}

/// Represents a tag item (key/value)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TagItem {
	pub(crate) key: ItemKey,
	pub(crate) value: ItemValue,
}

impl TagItem {
	/// Create a new [`TagItem`]
	///
	/// NOTE: This will not verify that the key and value agree, see
	/// [`Tag::insert`](crate::tag::Tag::insert).
	#[must_use]
	pub const fn new(key: ItemKey, value: ItemValue) -> Self {
		Self { key, value }
	}

	/// Create a text item for `key`, see [`ItemValue::Integer`] for numeric keys
	pub(crate) fn from_text(key: ItemKey, text: String) -> Self {
		let value = ItemValue::from_text(&key, text);
		Self { key, value }
	}

	/// Returns a reference to the [`ItemKey`]
	pub fn key(&self) -> &ItemKey {
		&self.key
	}

	/// Consumes the `TagItem`, returning its [`ItemKey`]
	pub fn into_key(self) -> ItemKey {
		self.key
	}

	/// Returns a reference to the [`ItemValue`]
	pub fn value(&self) -> &ItemValue {
		&self.value
	}

	/// Consumes the `TagItem`, returning its [`ItemValue`]
	pub fn into_value(self) -> ItemValue {
		self.value
	}

	/// Consumes the `TagItem`, returning its [`ItemKey`] and [`ItemValue`]
	pub fn consume(self) -> (ItemKey, ItemValue) {
		(self.key, self.value)
	}

	/// Whether the key and value agree with each other
	///
	/// Artwork keys need picture values, and pictures can only be stored under artwork keys.
	pub(crate) fn is_consistent(&self) -> bool {
		matches!(self.key, ItemKey::Artwork) == matches!(self.value, ItemValue::Picture(_))
	}
}
