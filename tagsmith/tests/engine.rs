#![allow(missing_docs)]

use tagsmith::codec::CodecRegistry;
use tagsmith::engine::{ModificationListener, ReadOutcome, TagEngine};
use tagsmith::error::ErrorKind;
use tagsmith::file::FileType;
use tagsmith::tag::{Accessor, Tag, TagType};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const AUDIO: &[u8] = b"FLAC FRAMES";

fn flac() -> Vec<u8> {
	let mut file = b"fLaC".to_vec();
	file.extend([0x80, 0, 0, 34]);
	file.extend([0x10; 34]);
	file.extend(AUDIO);
	file
}

fn engine() -> TagEngine {
	TagEngine::new(CodecRegistry::with_defaults())
}

fn titled(title: &str) -> Tag {
	let mut tag = Tag::new();
	tag.set_title(String::from(title));
	tag
}

fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
	let path = dir.join(name);
	std::fs::write(&path, content).unwrap();
	path
}

#[test_log::test]
fn content_wins_over_extension() {
	let dir = tempfile::tempdir().unwrap();
	let path = write_file(dir.path(), "mislabeled.mp3", &flac());

	let engine = engine();
	engine.write_tag(&path, &titled("Title")).unwrap();

	let outcome = engine.read_tag(&path).unwrap();
	assert_eq!(outcome.container().file_type(), FileType::Flac);

	let outcome = engine.read_tag_magic(&path).unwrap();
	let ReadOutcome::Tagged { tag_type, tag, .. } = outcome else {
		panic!("Expected a tag");
	};
	assert_eq!(tag_type, TagType::VorbisComments);
	assert_eq!(tag.title().as_deref(), Some("Title"));

	assert_eq!(engine.probe(&path).unwrap().file_type(), FileType::Flac);
}

#[test_log::test]
fn forced_file_type() {
	let dir = tempfile::tempdir().unwrap();
	let path = write_file(dir.path(), "song.bin", &flac());

	let engine = engine();
	let outcome = engine.read_tag_as(&path, FileType::Flac).unwrap();
	assert_eq!(outcome.container().file_type(), FileType::Flac);

	// Not an MP4 file, but it's read as one
	let err = engine.read_tag_as(&path, FileType::Mp4).unwrap_err();
	assert!(err.is_malformed());
}

#[test_log::test]
fn extension_is_only_a_hint() {
	let dir = tempfile::tempdir().unwrap();
	let path = write_file(dir.path(), "song.flac", b"not really a FLAC file");

	let engine = engine();

	// The extension is trusted when the content says nothing
	let err = engine.read_tag(&path).unwrap_err();
	assert!(err.is_malformed());

	let err = engine.read_tag_magic(&path).unwrap_err();
	assert!(err.is_unsupported_format());
}

#[test_log::test]
fn unsupported_files() {
	let dir = tempfile::tempdir().unwrap();
	let path = write_file(dir.path(), "notes.txt", b"Just some text");

	let engine = engine();
	assert!(engine.read_tag(&path).unwrap_err().is_unsupported_format());
	assert!(
		engine
			.write_tag(&path, &titled("Title"))
			.unwrap_err()
			.is_unsupported_format()
	);
	assert_eq!(std::fs::read(&path).unwrap(), b"Just some text");

	let err = engine.read_tag(dir.path().join("missing.flac")).unwrap_err();
	assert!(err.is_io());
}

#[test_log::test]
fn write_to_a_copy() {
	let dir = tempfile::tempdir().unwrap();
	let source = write_file(dir.path(), "source.flac", &flac());
	let target = dir.path().join("target.flac");

	let engine = engine();
	engine.write_tag_as(&source, &target, &titled("Copy")).unwrap();

	assert_eq!(std::fs::read(&source).unwrap(), flac());
	assert!(matches!(
		engine.read_tag(&source).unwrap(),
		ReadOutcome::NotTagged { .. }
	));

	let tag = engine.read_tag(&target).unwrap().into_tag().unwrap();
	assert_eq!(tag.title().as_deref(), Some("Copy"));
}

#[test_log::test]
fn write_to_a_copy_checks_the_source() {
	let dir = tempfile::tempdir().unwrap();
	let source = write_file(dir.path(), "source.txt", b"Just some text");
	let target = dir.path().join("target.flac");

	let err = engine()
		.write_tag_as(&source, &target, &titled("Copy"))
		.unwrap_err();
	assert!(err.is_unsupported_format());
	assert!(!target.exists());
}

struct Veto(AtomicUsize);

impl ModificationListener for Veto {
	fn will_modify(&self, _path: &Path) -> Result<(), String> {
		self.0.fetch_add(1, Ordering::SeqCst);
		Err(String::from("read only library"))
	}

	fn modified(&self, _path: &Path) {
		panic!("A vetoed write was applied");
	}
}

#[test_log::test]
fn vetoed_writes() {
	let dir = tempfile::tempdir().unwrap();
	let path = write_file(dir.path(), "song.flac", &flac());

	let veto = Arc::new(Veto(AtomicUsize::new(0)));
	let engine = engine().listener(veto.clone());

	let err = engine.write_tag(&path, &titled("Title")).unwrap_err();
	assert!(matches!(err.kind(), ErrorKind::Vetoed(reason) if reason == "read only library"));
	assert_eq!(std::fs::read(&path).unwrap(), flac());

	// Nothing to change, so nothing to veto
	engine.remove_tag(&path).unwrap();
	assert_eq!(veto.0.load(Ordering::SeqCst), 1);

	// In-memory writes never notify listeners
	let mut file = flac();
	engine.write_tag_to_vec(&mut file, &titled("Title")).unwrap();
	assert_ne!(file, flac());
}

#[test_log::test]
fn custom_registry() {
	// FLAC is the only known container
	let mut registry = CodecRegistry::new();
	registry.register(FileType::Flac, Arc::new(tagsmith::flac::FlacCodec));
	let engine = TagEngine::new(registry);

	let mut file = flac();
	engine.write_tag_to_vec(&mut file, &titled("Title")).unwrap();
	assert!(engine.read_tag_from(&file).unwrap().tag().is_some());

	let mut mpeg = vec![0xFF, 0xFB, 0x90, 0x64];
	mpeg.extend([0; 413]);
	assert!(engine.read_tag_from(&mpeg).unwrap_err().is_unsupported_format());
	assert!(
		engine
			.write_tag_to_vec(&mut mpeg, &titled("Title"))
			.unwrap_err()
			.is_unsupported_format()
	);
}
