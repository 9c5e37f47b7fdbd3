//! The codec contract and the registry mapping containers to codecs
//!
//! A [`TagCodec`] translates one tag format between a container's bytes and a [`Tag`]. Codecs
//! are stateless, they are handed the reader and the [`Container`] the sniffer produced, and
//! describe any change as a list of [`Splice`]s for the [`rewrite`](crate::rewrite) module to
//! apply.
//!
//! There is no global registry. A [`CodecRegistry`] is built by the caller, usually through
//! [`CodecRegistry::with_defaults`], and handed to a [`TagEngine`](crate::engine::TagEngine).

use crate::asf::AsfCodec;
use crate::config::{ParseOptions, WriteOptions};
use crate::error::Result;
use crate::file::FileType;
use crate::flac::FlacCodec;
use crate::id3::v1::Id3v1Codec;
use crate::id3::v2::Id3v2Codec;
use crate::mp4::Mp4Codec;
use crate::ogg::OggCodec;
use crate::probe::Container;
use crate::rewrite::{MetadataRegion, Splice};
use crate::tag::{Tag, TagType};
use crate::util::io::SeekRead;

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// The result of decoding one tag format
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
	/// The decoded tag, `None` if the file has no tag of this format
	pub tag: Option<Tag>,
	/// Where the tag lives, or where it would be inserted
	pub region: MetadataRegion,
}

impl Decoded {
	pub(crate) fn tagged(tag: Tag, region: MetadataRegion) -> Self {
		Self {
			tag: Some(tag),
			region,
		}
	}

	pub(crate) fn untagged(region: MetadataRegion) -> Self {
		Self { tag: None, region }
	}
}

/// A tag format reader/writer for one or more containers
///
/// Implementors must not write to the reader's underlying storage, all changes are returned as
/// [`Splice`]s sorted by position.
pub trait TagCodec: Send + Sync {
	/// The tag format this codec handles
	fn tag_type(&self) -> TagType;

	/// Decode the tag from `reader`
	///
	/// # Errors
	///
	/// * The tag is malformed, depending on [`ParseOptions::parsing_mode`]
	/// * `reader` fails
	fn decode(
		&self,
		reader: &mut dyn SeekRead,
		container: &Container,
		options: ParseOptions,
	) -> Result<Decoded>;

	/// Encode `tag`, describing the file changes needed to store it
	///
	/// An empty `tag` removes the tag from the file.
	///
	/// # Errors
	///
	/// * The existing file structure is malformed
	/// * `tag` holds values the format cannot store
	/// * `reader` fails
	fn encode(
		&self,
		reader: &mut dyn SeekRead,
		container: &Container,
		tag: &Tag,
		options: WriteOptions,
	) -> Result<Vec<Splice>>;

	/// Describe the file changes needed to remove the tag entirely
	///
	/// # Errors
	///
	/// * The existing file structure is malformed
	/// * `reader` fails
	fn strip(&self, reader: &mut dyn SeekRead, container: &Container) -> Result<Vec<Splice>> {
		self.encode(reader, container, &Tag::new(), WriteOptions::default())
	}

	/// Changes to make when this codec is not the one being written
	///
	/// This allows a secondary format to stay in sync with the authoritative one. By default,
	/// nothing is changed.
	///
	/// # Errors
	///
	/// See [`TagCodec::encode`]
	fn encode_companion(
		&self,
		_reader: &mut dyn SeekRead,
		_container: &Container,
		_tag: &Tag,
		_options: WriteOptions,
	) -> Result<Vec<Splice>> {
		Ok(Vec::new())
	}
}

/// Maps a [`FileType`] to the codecs able to handle it
///
/// For every file type, the first codec registered is authoritative: it is the one written to,
/// and is tried first on read. The codecs after it are read fallbacks and companions.
///
/// # Examples
///
/// ```rust
/// use tagsmith::codec::CodecRegistry;
/// use tagsmith::file::FileType;
/// use tagsmith::tag::TagType;
///
/// let registry = CodecRegistry::with_defaults();
///
/// let mpeg = registry.codecs_for(FileType::Mpeg);
/// assert_eq!(mpeg[0].tag_type(), TagType::Id3v2);
/// assert_eq!(mpeg[1].tag_type(), TagType::Id3v1);
/// ```
#[derive(Clone, Default)]
pub struct CodecRegistry {
	codecs: HashMap<FileType, Vec<Arc<dyn TagCodec>>>,
}

impl CodecRegistry {
	/// Create an empty registry
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a registry with every codec in this crate
	///
	/// | [`FileType`]       | Codecs           |
	/// |--------------------|------------------|
	/// | `Mpeg`             | ID3v2, ID3v1     |
	/// | `Flac`             | Vorbis Comments  |
	/// | `Vorbis`, `Opus`   | Vorbis Comments  |
	/// | `Mp4`              | MP4 ilst         |
	/// | `Asf`              | ASF              |
	pub fn with_defaults() -> Self {
		let ogg: Arc<dyn TagCodec> = Arc::new(OggCodec);

		let mut registry = Self::new();
		registry
			.register(FileType::Mpeg, Arc::new(Id3v2Codec))
			.register(FileType::Mpeg, Arc::new(Id3v1Codec))
			.register(FileType::Flac, Arc::new(FlacCodec))
			.register(FileType::Vorbis, Arc::clone(&ogg))
			.register(FileType::Opus, ogg)
			.register(FileType::Mp4, Arc::new(Mp4Codec))
			.register(FileType::Asf, Arc::new(AsfCodec));

		registry
	}

	/// Append a codec to the list for `file_type`
	pub fn register(&mut self, file_type: FileType, codec: Arc<dyn TagCodec>) -> &mut Self {
		self.codecs.entry(file_type).or_default().push(codec);
		self
	}

	/// The codecs registered for `file_type`, authoritative first
	pub fn codecs_for(&self, file_type: FileType) -> &[Arc<dyn TagCodec>] {
		self.codecs.get(&file_type).map_or(&[], Vec::as_slice)
	}

	/// The codec written to for `file_type`
	pub fn authoritative(&self, file_type: FileType) -> Option<&Arc<dyn TagCodec>> {
		self.codecs_for(file_type).first()
	}
}

impl Debug for CodecRegistry {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let mut map = f.debug_map();
		for (file_type, codecs) in &self.codecs {
			map.entry(
				file_type,
				&codecs.iter().map(|c| c.tag_type()).collect::<Vec<_>>(),
			);
		}

		map.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::{CodecRegistry, Decoded, TagCodec};
	use crate::config::{ParseOptions, WriteOptions};
	use crate::error::Result;
	use crate::file::FileType;
	use crate::probe::Container;
	use crate::rewrite::{MetadataRegion, Splice};
	use crate::tag::{Tag, TagType};
	use crate::util::io::SeekRead;

	use std::sync::Arc;

	struct NullCodec;

	impl TagCodec for NullCodec {
		fn tag_type(&self) -> TagType {
			TagType::Id3v1
		}

		fn decode(
			&self,
			_reader: &mut dyn SeekRead,
			_container: &Container,
			_options: ParseOptions,
		) -> Result<Decoded> {
			Ok(Decoded::untagged(MetadataRegion::empty_at(0)))
		}

		fn encode(
			&self,
			_reader: &mut dyn SeekRead,
			_container: &Container,
			_tag: &Tag,
			_options: WriteOptions,
		) -> Result<Vec<Splice>> {
			Ok(Vec::new())
		}
	}

	#[test_log::test]
	fn registration_order_is_kept() {
		let mut registry = CodecRegistry::new();
		assert!(registry.authoritative(FileType::Mpeg).is_none());
		assert!(registry.codecs_for(FileType::Mpeg).is_empty());

		registry.register(FileType::Mpeg, Arc::new(NullCodec));
		registry.register(FileType::Mpeg, Arc::new(crate::id3::v2::Id3v2Codec));

		let codecs = registry.codecs_for(FileType::Mpeg);
		assert_eq!(codecs.len(), 2);
		assert_eq!(codecs[0].tag_type(), TagType::Id3v1);
		assert_eq!(
			registry.authoritative(FileType::Mpeg).unwrap().tag_type(),
			TagType::Id3v1
		);
	}

	#[test_log::test]
	fn defaults_cover_every_file_type() {
		let registry = CodecRegistry::with_defaults();
		for file_type in [
			FileType::Asf,
			FileType::Flac,
			FileType::Mp4,
			FileType::Mpeg,
			FileType::Opus,
			FileType::Vorbis,
		] {
			let codec = registry.authoritative(file_type).unwrap();
			assert_eq!(codec.tag_type(), file_type.primary_tag_type());
		}
	}
}
