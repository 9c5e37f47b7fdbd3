use std::borrow::Cow;

#[cfg(doc)]
use crate::tag::Tag;

// Expands to a getter, setter and remover for each field. Text fields are read as
// `Cow<str>` and set from a `String`, numeric fields are `u32` both ways.
macro_rules! accessors {
	(
		text: [$($text:ident),+ $(,)?],
		numeric: [$($num:ident),+ $(,)?] $(,)?
	) => {
		/// Getters and setters for the items nearly every format can hold
		///
		/// A setter replaces **all** values of its item. Use [`Tag::push()`] to add another
		/// value instead.
		pub trait Accessor {
			$(accessors!(@field $text, Cow<'_, str>, String, "text");)+
			$(accessors!(@field $num, u32, u32, "number");)+
		}
	};
	(@field $name:ident, $get:ty, $set:ty, $what:literal) => {
		paste::paste! {
			#[doc = "The first " $what " stored as `" $name "`, if any"]
			///
			/// See [`Tag::get_all()`] for the remaining values.
			fn $name(&self) -> Option<$get> {
				None
			}

			#[doc = "Replaces every `" $name "` value with `value`"]
			fn [<set_ $name>](&mut self, _value: $set) {}

			#[doc = "Drops every `" $name "` value"]
			fn [<remove_ $name>](&mut self) {}
		}
	};
}

accessors! {
	text: [artist, title, album, genre, comment],
	numeric: [track, track_total, disk, disk_total, year],
}
