#![allow(missing_docs)]

use tagsmith::codec::CodecRegistry;
use tagsmith::config::WriteOptions;
use tagsmith::engine::TagEngine;
use tagsmith::tag::{Accessor, Tag};

use structopt::StructOpt;

use std::path::PathBuf;
use std::process::ExitCode;

/// Set common fields on an audio file
#[derive(Debug, StructOpt)]
#[structopt(name = "tag_writer")]
struct Opt {
	/// Track title
	#[structopt(short, long)]
	title: Option<String>,

	/// Track artist
	#[structopt(short, long)]
	artist: Option<String>,

	/// Album title
	#[structopt(short = "A", long)]
	album: Option<String>,

	/// Track number
	#[structopt(short = "n", long)]
	track: Option<u32>,

	/// Write ID3v2.3 instead of ID3v2.4 to MP3 files
	#[structopt(long)]
	id3v23: bool,

	/// Leave the input alone and write the result here
	#[structopt(short, long, parse(from_os_str))]
	output: Option<PathBuf>,

	#[structopt(parse(from_os_str))]
	path: PathBuf,
}

impl Opt {
	// Whether anything was changed
	fn apply(&mut self, tag: &mut Tag) -> bool {
		let mut changed = false;

		let text_fields: [(Option<String>, fn(&mut Tag, String)); 3] = [
			(self.title.take(), Tag::set_title),
			(self.artist.take(), Tag::set_artist),
			(self.album.take(), Tag::set_album),
		];
		for (value, set) in text_fields {
			if let Some(value) = value {
				set(tag, value);
				changed = true;
			}
		}

		if let Some(track) = self.track {
			tag.set_track(track);
			changed = true;
		}

		changed
	}
}

fn main() -> ExitCode {
	let mut opt = Opt::from_args();

	let engine = TagEngine::new(CodecRegistry::with_defaults())
		.write_options(WriteOptions::new().use_id3v23(opt.id3v23));

	let mut tag = match engine.read_tag(&opt.path) {
		Ok(outcome) => outcome.into_tag().unwrap_or_default(),
		Err(e) => {
			eprintln!("{}: {e}", opt.path.display());
			return ExitCode::FAILURE;
		},
	};

	if !opt.apply(&mut tag) {
		eprintln!("Nothing to set, see --help");
		return ExitCode::FAILURE;
	}

	let result = match &opt.output {
		Some(output) => engine.write_tag_as(&opt.path, output, &tag),
		None => engine.write_tag(&opt.path, &tag),
	};

	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("Writing failed: {e}");
			ExitCode::FAILURE
		},
	}
}
