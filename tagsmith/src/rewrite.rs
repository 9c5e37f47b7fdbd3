//! Rebuilding files around changed metadata
//!
//! Codecs never touch the file they are writing to. Instead, they describe their changes as a
//! list of [`Splice`]s, which replace a [`MetadataRegion`] of the original with new bytes. The
//! rewriter then builds the new file next to the original and renames it into place, so a
//! failure at any point leaves the original untouched.

use crate::error::Result;
use crate::macros::err;

use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// A byte range of a file holding metadata
///
/// When a file has no tag of a format, the region is empty and sits at the position the tag
/// would be inserted at.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct MetadataRegion {
	start: u64,
	len: u64,
}

impl MetadataRegion {
	/// Create a new `MetadataRegion`
	pub const fn new(start: u64, len: u64) -> Self {
		Self { start, len }
	}

	/// An empty region at `pos`, used when there is nothing to replace
	pub const fn empty_at(pos: u64) -> Self {
		Self { start: pos, len: 0 }
	}

	/// The offset of the first byte
	pub fn start(&self) -> u64 {
		self.start
	}

	/// The length in bytes
	pub fn len(&self) -> u64 {
		self.len
	}

	/// The offset one past the last byte
	pub fn end(&self) -> u64 {
		self.start + self.len
	}

	/// Whether the region covers no bytes
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}
}

/// A replacement of one [`MetadataRegion`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Splice {
	region: MetadataRegion,
	replacement: Vec<u8>,
}

impl Splice {
	/// Replace `region` with `replacement`
	pub fn new(region: MetadataRegion, replacement: Vec<u8>) -> Self {
		Self {
			region,
			replacement,
		}
	}

	/// Remove the bytes of `region`
	pub fn remove(region: MetadataRegion) -> Self {
		Self::new(region, Vec::new())
	}

	/// The region being replaced
	pub fn region(&self) -> MetadataRegion {
		self.region
	}

	/// The new content of the region
	pub fn replacement(&self) -> &[u8] {
		&self.replacement
	}

	/// How much the file grows (or shrinks) by
	pub fn delta(&self) -> i64 {
		self.replacement.len() as i64 - self.region.len as i64
	}

	/// Whether applying this splice changes nothing
	pub(crate) fn is_noop(&self) -> bool {
		self.region.is_empty() && self.replacement.is_empty()
	}
}

/// Verify splices are sorted, non-overlapping, and inside a file of `file_len` bytes
pub(crate) fn validate(splices: &[Splice], file_len: u64) -> Result<()> {
	let mut last_end = 0;
	for splice in splices {
		let region = splice.region;
		if region.start < last_end {
			log::error!(
				"Splices overlap or are out of order (region at {} starts before {})",
				region.start,
				last_end
			);
			err!(SizeMismatch);
		}

		if region.end() > file_len {
			log::error!(
				"Splice region {}..{} is outside of the file ({file_len} bytes)",
				region.start,
				region.end()
			);
			err!(SizeMismatch);
		}

		last_end = region.end();
	}

	Ok(())
}

/// The last step of [`apply`], moving the finished file over the original
pub(crate) trait ReplaceStep {
	fn replace(&self, finished: NamedTempFile, target: &Path) -> Result<()>;
}

/// Atomically renames the finished file over the original
pub(crate) struct PersistReplace;

impl ReplaceStep for PersistReplace {
	fn replace(&self, finished: NamedTempFile, target: &Path) -> Result<()> {
		// On failure the `PersistError` hands the temporary file back, dropping it removes it
		finished.persist(target).map_err(|e| e.error)?;
		Ok(())
	}
}

/// Apply `splices` to the file at `path`
///
/// The new file is written to a temporary file in the same directory, with the permissions of
/// the original, flushed to disk, and atomically renamed over the original.
///
/// # Errors
///
/// * The splices overlap, are out of order, or reach past the end of the file
/// * Any I/O error, in which case the original file is left untouched
///
/// # Examples
///
/// ```rust
/// use tagsmith::rewrite::{MetadataRegion, Splice, apply};
///
/// # fn main() -> tagsmith::error::Result<()> {
/// # let dir = tempfile::tempdir()?;
/// # let path = dir.path().join("file.bin");
/// std::fs::write(&path, b"header OLD audio")?;
///
/// apply(
/// 	&path,
/// 	&[Splice::new(MetadataRegion::new(7, 3), b"NEW TAG".to_vec())],
/// )?;
///
/// assert_eq!(std::fs::read(&path)?, b"header NEW TAG audio");
/// # Ok(()) }
/// ```
pub fn apply(path: impl AsRef<Path>, splices: &[Splice]) -> Result<()> {
	apply_with(path.as_ref(), splices, &PersistReplace)
}

pub(crate) fn apply_with(path: &Path, splices: &[Splice], step: &dyn ReplaceStep) -> Result<()> {
	let mut original = File::open(path)?;
	let metadata = original.metadata()?;
	let file_len = metadata.len();

	validate(splices, file_len)?;

	if splices.iter().all(Splice::is_noop) {
		log::debug!("Nothing to rewrite in {}", path.display());
		return Ok(());
	}

	let dir = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};

	let mut finished = tempfile::Builder::new()
		.prefix(".tagsmith-")
		.suffix(".tmp")
		.tempfile_in(dir)?;

	log::debug!(
		"Rewriting {} through {}",
		path.display(),
		finished.path().display()
	);

	{
		let mut writer = BufWriter::new(finished.as_file_mut());
		copy_spliced(&mut original, &mut writer, splices, file_len)?;
		writer.flush()?;
	}

	finished.as_file().set_permissions(metadata.permissions())?;
	finished.as_file().sync_all()?;

	drop(original);
	step.replace(finished, path)
}

/// Apply `splices` to an in-memory file
///
/// # Errors
///
/// The splices overlap, are out of order, or reach past the end of `buf`. `buf` is untouched
/// on error.
pub fn apply_to_vec(buf: &mut Vec<u8>, splices: &[Splice]) -> Result<()> {
	let file_len = buf.len() as u64;
	validate(splices, file_len)?;

	if splices.iter().all(Splice::is_noop) {
		return Ok(());
	}

	let new_len = splices
		.iter()
		.fold(file_len as i64, |len, splice| len + splice.delta());

	let mut out = Vec::new();
	out.try_reserve_exact(new_len.max(0) as usize)?;

	copy_spliced(&mut std::io::Cursor::new(&buf[..]), &mut out, splices, file_len)?;

	*buf = out;
	Ok(())
}

fn copy_spliced<R, W>(reader: &mut R, writer: &mut W, splices: &[Splice], file_len: u64) -> Result<()>
where
	R: Read + Seek,
	W: Write,
{
	reader.seek(SeekFrom::Start(0))?;

	let mut pos = 0;
	for splice in splices {
		let region = splice.region;

		log::trace!(
			"Splicing {} bytes over {}..{}",
			splice.replacement.len(),
			region.start,
			region.end()
		);

		copy_exact(reader, writer, region.start - pos)?;
		writer.write_all(&splice.replacement)?;

		reader.seek(SeekFrom::Start(region.end()))?;
		pos = region.end();
	}

	copy_exact(reader, writer, file_len - pos)?;
	Ok(())
}

fn copy_exact<R, W>(reader: &mut R, writer: &mut W, len: u64) -> Result<()>
where
	R: Read,
	W: Write,
{
	let copied = std::io::copy(&mut reader.by_ref().take(len), writer)?;
	if copied != len {
		return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
	}

	Ok(())
}
