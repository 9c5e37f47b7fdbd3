//! The entry point for reading and writing tags
//!
//! A [`TagEngine`] sniffs a file, picks the codecs registered for its container, and either
//! decodes a [`Tag`] or turns one into [`Splice`]s for the [`rewrite`](crate::rewrite) module.
//!
//! # Examples
//!
//! ```rust,no_run
//! # fn main() -> tagsmith::error::Result<()> {
//! use tagsmith::codec::CodecRegistry;
//! use tagsmith::engine::{ReadOutcome, TagEngine};
//! use tagsmith::tag::{Accessor, Tag};
//!
//! let engine = TagEngine::new(CodecRegistry::with_defaults());
//!
//! let mut tag = match engine.read_tag("song.mp3")? {
//! 	ReadOutcome::Tagged { tag, .. } => tag,
//! 	ReadOutcome::NotTagged { .. } => Tag::new(),
//! };
//!
//! tag.set_title(String::from("New title"));
//! engine.write_tag("song.mp3", &tag)?;
//! # Ok(()) }
//! ```

use crate::codec::{CodecRegistry, TagCodec};
use crate::config::{ParseOptions, WriteOptions};
use crate::error::{ErrorKind, Result, TagError};
use crate::file::FileType;
use crate::macros::err;
use crate::probe::{self, Container};
use crate::rewrite::{self, Splice};
use crate::tag::{Tag, TagType};
use crate::util::io::SeekRead;

use std::fmt::{Debug, Formatter};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use std::sync::Arc;

/// The result of reading a file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
	/// A tag was found
	Tagged {
		/// The classified container
		container: Container,
		/// The format the tag was read from
		tag_type: TagType,
		/// The decoded tag
		tag: Tag,
	},
	/// The container is supported, but has no tag
	NotTagged {
		/// The classified container
		container: Container,
	},
}

impl ReadOutcome {
	/// The classified container
	pub fn container(&self) -> &Container {
		match self {
			Self::Tagged { container, .. } | Self::NotTagged { container } => container,
		}
	}

	/// The decoded tag, if any
	pub fn tag(&self) -> Option<&Tag> {
		match self {
			Self::Tagged { tag, .. } => Some(tag),
			Self::NotTagged { .. } => None,
		}
	}

	/// Consume the outcome, returning the tag
	pub fn into_tag(self) -> Option<Tag> {
		match self {
			Self::Tagged { tag, .. } => Some(tag),
			Self::NotTagged { .. } => None,
		}
	}
}

/// Observes the files a [`TagEngine`] rewrites
///
/// Listeners are only notified of writes to paths, in-memory buffers are not observed.
pub trait ModificationListener: Send + Sync {
	/// Called before `path` is replaced
	///
	/// Returning an `Err` cancels the write, which fails with [`ErrorKind::Vetoed`].
	///
	/// # Errors
	///
	/// The listener refuses the modification
	fn will_modify(&self, _path: &Path) -> std::result::Result<(), String> {
		Ok(())
	}

	/// Called after `path` was replaced
	fn modified(&self, _path: &Path) {}
}

/// Reads and writes tags using a [`CodecRegistry`]
///
/// The engine is immutable once built, and can be shared between threads. Calls on the same
/// file must be serialized by the caller.
#[derive(Clone)]
pub struct TagEngine {
	registry: CodecRegistry,
	parse_options: ParseOptions,
	write_options: WriteOptions,
	listeners: Vec<Arc<dyn ModificationListener>>,
}

impl Debug for TagEngine {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TagEngine")
			.field("registry", &self.registry)
			.field("parse_options", &self.parse_options)
			.field("write_options", &self.write_options)
			.field("listeners", &self.listeners.len())
			.finish()
	}
}

impl TagEngine {
	/// Create a `TagEngine` with default [`ParseOptions`] and [`WriteOptions`]
	pub fn new(registry: CodecRegistry) -> Self {
		Self {
			registry,
			parse_options: ParseOptions::new(),
			write_options: WriteOptions::new(),
			listeners: Vec::new(),
		}
	}

	/// Set the [`ParseOptions`] used for every read
	pub fn parse_options(mut self, parse_options: ParseOptions) -> Self {
		self.parse_options = parse_options;
		self
	}

	/// Set the [`WriteOptions`] used for every write
	pub fn write_options(mut self, write_options: WriteOptions) -> Self {
		self.write_options = write_options;
		self
	}

	/// Add a [`ModificationListener`], listeners are called in the order they are added
	pub fn listener(mut self, listener: Arc<dyn ModificationListener>) -> Self {
		self.listeners.push(listener);
		self
	}

	/// The registry this engine dispatches to
	pub fn registry(&self) -> &CodecRegistry {
		&self.registry
	}

	/// Classify the container at `path` without decoding any tags
	///
	/// The content is checked first, the extension is only used when the content is
	/// inconclusive.
	///
	/// # Errors
	///
	/// * `path` can't be read
	/// * [`ErrorKind::UnsupportedFormat`]: The container isn't recognized
	pub fn probe(&self, path: impl AsRef<Path>) -> Result<Container> {
		let path = path.as_ref();
		let mut reader = BufReader::new(File::open(path)?);
		probe::sniff(&mut reader, FileType::from_path(path), self.parse_options)
	}

	/// Read the tag at `path`
	///
	/// Codecs are tried in registration order, the first one to find a tag wins.
	///
	/// # Errors
	///
	/// * `path` can't be read
	/// * [`ErrorKind::UnsupportedFormat`]: The container isn't recognized, or has no codecs
	/// * The tag is malformed, see [`TagError::is_malformed`]
	pub fn read_tag(&self, path: impl AsRef<Path>) -> Result<ReadOutcome> {
		let path = path.as_ref();
		let mut reader = BufReader::new(File::open(path)?);
		let container = probe::sniff(&mut reader, FileType::from_path(path), self.parse_options)?;

		self.read_container(&mut reader, container)
	}

	/// Read the tag at `path`, treating it as `file_type` regardless of its content
	///
	/// # Errors
	///
	/// See [`TagEngine::read_tag`]
	pub fn read_tag_as(&self, path: impl AsRef<Path>, file_type: FileType) -> Result<ReadOutcome> {
		let mut reader = BufReader::new(File::open(path.as_ref())?);
		let container = probe::forced(&mut reader, file_type)?;

		self.read_container(&mut reader, container)
	}

	/// Read the tag at `path`, ignoring its extension
	///
	/// # Errors
	///
	/// See [`TagEngine::read_tag`]
	pub fn read_tag_magic(&self, path: impl AsRef<Path>) -> Result<ReadOutcome> {
		let mut reader = BufReader::new(File::open(path.as_ref())?);
		let Some(container) = probe::sniff_content(&mut reader, self.parse_options)? else {
			err!(UnsupportedFormat);
		};

		self.read_container(&mut reader, container)
	}

	/// Read the tag from an in-memory file
	///
	/// # Errors
	///
	/// See [`TagEngine::read_tag`]
	pub fn read_tag_from(&self, bytes: &[u8]) -> Result<ReadOutcome> {
		let mut reader = Cursor::new(bytes);
		let container = probe::sniff(&mut reader, None, self.parse_options)?;

		self.read_container(&mut reader, container)
	}

	fn read_container(&self, reader: &mut dyn SeekRead, container: Container) -> Result<ReadOutcome> {
		let codecs = self.codecs(container.file_type())?;

		for codec in codecs {
			let decoded = codec.decode(reader, &container, self.parse_options)?;
			if let Some(tag) = decoded.tag {
				log::debug!("Found a {} tag", codec.tag_type());
				return Ok(ReadOutcome::Tagged {
					container,
					tag_type: codec.tag_type(),
					tag,
				});
			}
		}

		Ok(ReadOutcome::NotTagged { container })
	}

	/// Write `tag` to `path`
	///
	/// The tag is written in the container's authoritative format. Companion formats that are
	/// already present may be refreshed as well (see [`WriteOptions::update_id3v1`]).
	///
	/// An empty `tag` removes the authoritative tag.
	///
	/// # Errors
	///
	/// * `path` can't be read or replaced
	/// * [`ErrorKind::UnsupportedFormat`]: The container isn't recognized, or has no codecs
	/// * [`ErrorKind::Vetoed`]: A [`ModificationListener`] refused the write
	/// * The existing file is malformed, or `tag` can't be stored
	///
	/// On error, the file at `path` is untouched.
	pub fn write_tag(&self, path: impl AsRef<Path>, tag: &Tag) -> Result<()> {
		let path = path.as_ref();
		self.write_with_hint(path, FileType::from_path(path), tag)
	}

	/// Copy `source` to `target`, then write `tag` to `target`
	///
	/// `source` is never modified. The container is classified with `source`'s extension.
	///
	/// # Errors
	///
	/// See [`TagEngine::write_tag`]
	pub fn write_tag_as(
		&self,
		source: impl AsRef<Path>,
		target: impl AsRef<Path>,
		tag: &Tag,
	) -> Result<()> {
		let source = source.as_ref();
		let target = target.as_ref();

		// Check the source before creating the target
		let hint = FileType::from_path(source);
		{
			let mut reader = BufReader::new(File::open(source)?);
			probe::sniff(&mut reader, hint, self.parse_options)?;
		}

		log::debug!("Copying {} to {}", source.display(), target.display());
		std::fs::copy(source, target)?;

		self.write_with_hint(target, hint, tag)
	}

	fn write_with_hint(&self, path: &Path, hint: Option<FileType>, tag: &Tag) -> Result<()> {
		let splices = {
			let mut reader = BufReader::new(File::open(path)?);
			let container = probe::sniff(&mut reader, hint, self.parse_options)?;
			self.write_splices(&mut reader, &container, tag)?
		};

		self.commit(path, &splices)
	}

	/// Write `tag` to an in-memory file
	///
	/// # Errors
	///
	/// See [`TagEngine::write_tag`]. `buf` is untouched on error.
	pub fn write_tag_to_vec(&self, buf: &mut Vec<u8>, tag: &Tag) -> Result<()> {
		let splices = {
			let mut reader = Cursor::new(&buf[..]);
			let container = probe::sniff(&mut reader, None, self.parse_options)?;
			self.write_splices(&mut reader, &container, tag)?
		};

		rewrite::apply_to_vec(buf, &splices)
	}

	/// Remove every tag the registry knows about for the container at `path`
	///
	/// # Errors
	///
	/// See [`TagEngine::write_tag`]
	pub fn remove_tag(&self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();

		let splices = {
			let mut reader = BufReader::new(File::open(path)?);
			let container = probe::sniff(&mut reader, FileType::from_path(path), self.parse_options)?;

			let mut splices = Vec::new();
			for codec in self.codecs(container.file_type())? {
				log::debug!("Stripping {} tags", codec.tag_type());
				splices.extend(codec.strip(&mut reader, &container)?);
			}

			splices.sort_by_key(|s| s.region().start());
			splices
		};

		self.commit(path, &splices)
	}

	fn codecs(&self, file_type: FileType) -> Result<&[Arc<dyn TagCodec>]> {
		let codecs = self.registry.codecs_for(file_type);
		if codecs.is_empty() {
			log::debug!("No codecs registered for {file_type:?}");
			err!(UnsupportedFormat);
		}

		Ok(codecs)
	}

	fn write_splices(
		&self,
		reader: &mut dyn SeekRead,
		container: &Container,
		tag: &Tag,
	) -> Result<Vec<Splice>> {
		let codecs = self.codecs(container.file_type())?;

		let (authoritative, companions) = codecs.split_at(1);
		let mut splices =
			authoritative[0].encode(reader, container, tag, self.write_options)?;

		for companion in companions {
			splices.extend(companion.encode_companion(reader, container, tag, self.write_options)?);
		}

		splices.sort_by_key(|s| s.region().start());
		Ok(splices)
	}

	fn commit(&self, path: &Path, splices: &[Splice]) -> Result<()> {
		if splices.iter().all(Splice::is_noop) {
			log::debug!("No changes to write to {}", path.display());
			return Ok(());
		}

		for listener in &self.listeners {
			if let Err(reason) = listener.will_modify(path) {
				log::debug!("Write to {} was vetoed: {reason}", path.display());
				return Err(TagError::new(ErrorKind::Vetoed(reason)));
			}
		}

		rewrite::apply(path, splices)?;

		for listener in &self.listeners {
			listener.modified(path);
		}

		Ok(())
	}
}
