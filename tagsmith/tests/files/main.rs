#![allow(missing_docs)]

mod asf;
mod flac;
mod mp4;
mod mpeg;
mod ogg;
mod round_trip;
pub(crate) mod util;
