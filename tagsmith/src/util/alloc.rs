use crate::error::Result;
use crate::macros::{err, try_vec};

use std::io::Read;

/// Upper bound for any buffer sized from a length field in a file
pub(crate) const ALLOCATION_LIMIT: usize = 64 * 1024 * 1024;

/// Backs `try_vec!`
pub(crate) fn fallible_vec_from_element<T>(element: T, len: usize) -> Result<Vec<T>>
where
	T: Clone,
{
	if len > ALLOCATION_LIMIT {
		err!(TooMuchData);
	}

	let mut vec = Vec::new();
	vec.try_reserve_exact(len)?;
	vec.resize(len, element);

	Ok(vec)
}

/// Read `len` bytes, as claimed by a size field, into a new buffer
pub(crate) fn read_to_vec<R>(reader: &mut R, len: u64) -> Result<Vec<u8>>
where
	R: Read + ?Sized,
{
	let Ok(len) = usize::try_from(len) else {
		err!(TooMuchData);
	};

	let mut content = try_vec![0; len];
	reader.read_exact(&mut content)?;

	Ok(content)
}

#[cfg(test)]
mod tests {
	use super::{ALLOCATION_LIMIT, fallible_vec_from_element, read_to_vec};
	use crate::error::ErrorKind;

	#[test_log::test]
	fn filled_with_the_element() {
		let vec = fallible_vec_from_element(7u8, 20).unwrap();
		assert_eq!(vec, [7; 20]);
	}

	#[test_log::test]
	fn allocation_limit_is_enforced() {
		let err = fallible_vec_from_element(0u8, ALLOCATION_LIMIT + 1).unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::TooMuchData));
	}

	#[test_log::test]
	fn read_to_vec_short_input() {
		let mut reader = &[1u8, 2, 3][..];
		let err = read_to_vec(&mut reader, 4).unwrap_err();
		assert!(err.is_io());
	}
}
