//! Read, convert, and write audio metadata.
//!
//! # Supported Formats
//!
//! | Container         | Tag formats                                          |
//! |-------------------|------------------------------------------------------|
//! | MPEG audio (MP3)  | ID3v2 (authoritative), ID3v1                         |
//! | FLAC              | Vorbis Comments, `PICTURE` blocks                    |
//! | Ogg Vorbis / Opus | Vorbis Comments                                      |
//! | MP4 / M4A         | `ilst` atoms                                         |
//! | WMA / ASF         | Content Description, Extended Content Description    |
//!
//! Every format is decoded into the same [`Tag`](tag::Tag), so values can be moved between
//! formats freely. Items a format can't map to a common [`ItemKey`](tag::ItemKey) are kept under
//! a native key, and written back untouched.
//!
//! # Examples
//!
//! ## Reading and writing a file
//!
//! ```rust,no_run
//! # fn main() -> tagsmith::error::Result<()> {
//! use tagsmith::codec::CodecRegistry;
//! use tagsmith::engine::TagEngine;
//! use tagsmith::tag::{Accessor, Tag};
//!
//! let engine = TagEngine::new(CodecRegistry::with_defaults());
//!
//! let outcome = engine.read_tag("song.flac")?;
//! let mut tag = outcome.into_tag().unwrap_or_default();
//!
//! println!("Title: {:?}", tag.title());
//!
//! tag.set_artist(String::from("Someone else"));
//! engine.write_tag("song.flac", &tag)?;
//! # Ok(()) }
//! ```
//!
//! ## Using a custom registry
//!
//! Only the codecs in the registry are used. Here, MP3 files are only read and written as ID3v1.
//!
//! ```rust
//! use std::sync::Arc;
//! use tagsmith::codec::CodecRegistry;
//! use tagsmith::engine::TagEngine;
//! use tagsmith::file::FileType;
//! use tagsmith::id3::v1::Id3v1Codec;
//!
//! let mut registry = CodecRegistry::new();
//! registry.register(FileType::Mpeg, Arc::new(Id3v1Codec));
//!
//! let engine = TagEngine::new(registry);
//! ```
//!
//! # Writing
//!
//! Files are never modified in place. Every write builds the new file next to the original,
//! and renames it over the original once it is complete. See [`rewrite`].

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod file;
pub(crate) mod macros;
pub mod picture;
pub mod probe;
pub mod rewrite;
pub mod tag;
mod util;

pub mod asf;
pub mod flac;
pub mod id3;
pub mod mp4;
pub mod ogg;

pub use util::text::TextEncoding;

pub use util::io;
