#![allow(missing_docs)]

use tagsmith::rewrite::{MetadataRegion, Splice, apply, apply_to_vec};

use std::path::Path;

const ORIGINAL: &[u8] = b"HEAD[old tag]AUDIO DATA[trailer]";

fn leftovers(dir: &Path) -> Vec<String> {
	std::fs::read_dir(dir)
		.unwrap()
		.map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
		.filter(|name| name.ends_with(".tmp"))
		.collect()
}

#[test_log::test]
fn multiple_splices() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("file.bin");
	std::fs::write(&path, ORIGINAL).unwrap();

	let splices = [
		// Insert at the very start
		Splice::new(MetadataRegion::empty_at(0), b"ID3".to_vec()),
		// Grow the tag
		Splice::new(MetadataRegion::new(4, 9), b"[a much longer tag]".to_vec()),
		// Drop the trailer
		Splice::remove(MetadataRegion::new(23, 9)),
	];

	let expected = b"ID3HEAD[a much longer tag]AUDIO DATA";
	let delta = splices.iter().map(Splice::delta).sum::<i64>();
	assert_eq!(ORIGINAL.len() as i64 + delta, expected.len() as i64);

	apply(&path, &splices).unwrap();
	assert_eq!(std::fs::read(&path).unwrap(), expected);

	let mut buf = ORIGINAL.to_vec();
	apply_to_vec(&mut buf, &splices).unwrap();
	assert_eq!(buf, expected);

	assert!(leftovers(dir.path()).is_empty());
}

#[test_log::test]
fn invalid_splices_change_nothing() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("file.bin");
	std::fs::write(&path, ORIGINAL).unwrap();

	let overlapping = [
		Splice::new(MetadataRegion::new(4, 9), b"A".to_vec()),
		Splice::new(MetadataRegion::new(8, 2), b"B".to_vec()),
	];
	let out_of_bounds = [Splice::remove(MetadataRegion::new(30, 10))];
	let unsorted = [
		Splice::remove(MetadataRegion::new(23, 9)),
		Splice::remove(MetadataRegion::new(4, 9)),
	];

	for splices in [&overlapping[..], &out_of_bounds[..], &unsorted[..]] {
		let err = apply(&path, splices).unwrap_err();
		assert!(err.is_malformed(), "{err:?}");
		assert_eq!(std::fs::read(&path).unwrap(), ORIGINAL);

		let mut buf = ORIGINAL.to_vec();
		assert!(apply_to_vec(&mut buf, splices).is_err());
		assert_eq!(buf, ORIGINAL);
	}

	assert!(leftovers(dir.path()).is_empty());
}

#[test_log::test]
fn empty_splices() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("file.bin");
	std::fs::write(&path, ORIGINAL).unwrap();
	let modified = std::fs::metadata(&path).unwrap().modified().unwrap();

	apply(&path, &[]).unwrap();
	apply(&path, &[Splice::new(MetadataRegion::empty_at(4), Vec::new())]).unwrap();

	assert_eq!(std::fs::read(&path).unwrap(), ORIGINAL);
	assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), modified);
}

#[test_log::test]
fn missing_file() {
	let dir = tempfile::tempdir().unwrap();
	let err = apply(dir.path().join("missing.bin"), &[]).unwrap_err();
	assert!(err.is_io());
}
