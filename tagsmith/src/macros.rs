// `try_vec![elem; len]`, a `vec!` that reports allocation failure through `?`
macro_rules! try_vec {
	($elem:expr; $size:expr) => {{ $crate::util::alloc::fallible_vec_from_element($elem, $size)? }};
}

// `err!(Kind)` or `err!(Kind("detail"))` returns early with a `TagError` of that `ErrorKind`
macro_rules! err {
	($variant:ident) => {
		return Err(crate::error::TagError::new(crate::error::ErrorKind::$variant))
	};
	($variant:ident($reason:literal)) => {
		return Err(crate::error::TagError::new(crate::error::ErrorKind::$variant(
			$reason,
		)))
	};
}

// Builds a `TagError` from a `FileDecodingError`/`FileEncodingError`, optionally scoped to a
// `FileType`. Shared by `decode_err!` and `encode_err!`.
macro_rules! file_err {
	($error:ident, $file_ty:ident, $reason:literal) => {
		crate::error::TagError::from(crate::error::$error::new(
			crate::file::FileType::$file_ty,
			$reason,
		))
	};
	($error:ident, $reason:literal) => {
		crate::error::TagError::from(crate::error::$error::from_description($reason))
	};
}

// `decode_err!([FileType,] "message")` builds the error, `decode_err!(@BAIL ...)` returns it
macro_rules! decode_err {
	(@BAIL $($file_ty:ident,)? $reason:literal) => {
		return Err($crate::macros::decode_err!($($file_ty,)? $reason))
	};
	($($file_ty:ident,)? $reason:literal) => {
		$crate::macros::file_err!(FileDecodingError, $($file_ty,)? $reason)
	};
}

// Same as `decode_err!`, for writing
macro_rules! encode_err {
	(@BAIL $($file_ty:ident,)? $reason:literal) => {
		return Err($crate::macros::encode_err!($($file_ty,)? $reason))
	};
	($($file_ty:ident,)? $reason:literal) => {
		$crate::macros::file_err!(FileEncodingError, $($file_ty,)? $reason)
	};
}

// Branches on a `ParsingMode`:
//
// parse_mode_choice!(
//     mode,
//     STRICT: expr,
//     BESTATTEMPT: expr,
//     RELAXED: expr,
//     DEFAULT: expr,
// )
//
// Every arm is optional. Modes without an arm run `DEFAULT`, or nothing if it is missing too.
macro_rules! parse_mode_choice {
	(
		$parse_mode:ident,
		$(STRICT: $strict:expr,)?
		$(BESTATTEMPT: $best_attempt:expr,)?
		$(RELAXED: $relaxed:expr,)?
		DEFAULT: $default:expr $(,)?
	) => {
		match $parse_mode {
			$(crate::config::ParsingMode::Strict => $strict,)?
			$(crate::config::ParsingMode::BestAttempt => $best_attempt,)?
			$(crate::config::ParsingMode::Relaxed => $relaxed,)?
			#[allow(unreachable_patterns)]
			_ => $default,
		}
	};
	(
		$parse_mode:ident,
		$(STRICT: $strict:expr,)?
		$(BESTATTEMPT: $best_attempt:expr,)?
		$(RELAXED: $relaxed:expr $(,)?)?
	) => {
		$crate::macros::parse_mode_choice!(
			$parse_mode,
			$(STRICT: $strict,)?
			$(BESTATTEMPT: $best_attempt,)?
			$(RELAXED: $relaxed,)?
			DEFAULT: {}
		)
	};
}

pub(crate) use {decode_err, encode_err, err, file_err, parse_mode_choice, try_vec};
