pub(crate) mod alloc;
pub(crate) mod cursor;
pub mod io;
pub(crate) mod text;
