//! Utilities for generic tag handling

mod accessor;
mod item;
mod tag_type;

use crate::picture::{Picture, PictureType};

use std::borrow::Cow;

// Exports
pub use accessor::Accessor;
pub use item::{ItemKey, ItemValue, NativeKey, TagItem};
pub use tag_type::TagType;

// Getter, setter and remover for items that map onto a single `ItemKey`
macro_rules! impl_accessor {
	($($item_key:ident => $name:ident: $ty:ident),+ $(,)?) => {
		paste::paste! {
			$(
				fn $name(&self) -> Option<impl_accessor!(@get $ty)> {
					impl_accessor!(@read self, $item_key, $ty)
				}

				fn [<set_ $name>](&mut self, value: $ty) {
					self.insert(TagItem::new(ItemKey::$item_key, impl_accessor!(@value value, $ty)));
				}

				fn [<remove_ $name>](&mut self) {
					self.remove_key(&ItemKey::$item_key)
				}
			)+
		}
	};
	(@value $value:ident, String) => { ItemValue::Text($value) };
	(@value $value:ident, u32) => { ItemValue::Integer($value) };
	(@get String) => { Cow<'_, str> };
	(@get u32) => { u32 };
	(@read $tag:ident, $item_key:ident, String) => {
		$tag.get(&ItemKey::$item_key).and_then(|item| item.value().text())
	};
	(@read $tag:ident, $item_key:ident, u32) => {
		$tag.get_integer(&ItemKey::$item_key)
	};
}

/// A decoded tag, independent of its format
///
/// Items are stored under [`ItemKey`]s rather than frame IDs or atom names. Items a codec has
/// no common key for use [`ItemKey::Native`], and are written back unchanged to their own
/// format.
///
/// Items keep the order they were decoded in, and a key may appear multiple times.
///
/// ## Usage
///
/// Accessing common items
///
/// ```rust
/// use tagsmith::tag::{Accessor, Tag};
///
/// let tag = Tag::new();
///
/// // There are multiple quick getter methods for common items
///
/// let title = tag.title();
/// let artist = tag.artist();
/// let album = tag.album();
/// let genre = tag.genre();
/// ```
///
/// Multiple values
///
/// ```rust
/// use tagsmith::tag::{ItemKey, ItemValue, Tag, TagItem};
///
/// let mut tag = Tag::new();
/// tag.push(TagItem::new(ItemKey::TrackArtist, ItemValue::Text(String::from("Foo"))));
/// tag.push(TagItem::new(ItemKey::TrackArtist, ItemValue::Text(String::from("Bar"))));
///
/// assert_eq!(tag.get_strings(&ItemKey::TrackArtist).collect::<Vec<_>>(), ["Foo", "Bar"]);
///
/// // Inserting replaces every value
/// tag.insert_text(ItemKey::TrackArtist, String::from("Baz"));
/// assert_eq!(tag.get_strings(&ItemKey::TrackArtist).collect::<Vec<_>>(), ["Baz"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tag {
	pub(crate) items: Vec<TagItem>,
}

impl Accessor for Tag {
	impl_accessor!(
		TrackArtist => artist: String,
		TrackTitle  => title: String,
		AlbumTitle  => album: String,
		Genre       => genre: String,
		Comment     => comment: String,
		TrackNumber => track: u32,
		TrackTotal  => track_total: u32,
		DiscNumber  => disk: u32,
		DiscTotal   => disk_total: u32,
	);

	fn year(&self) -> Option<u32> {
		match self.get(&ItemKey::Year)?.value() {
			ItemValue::Integer(year) => Some(*year),
			// Full dates, such as "2024-03-01"
			ItemValue::Text(text) => text.get(..4).and_then(|year| year.parse().ok()),
			_ => None,
		}
	}

	fn set_year(&mut self, value: u32) {
		self.insert(TagItem::new(ItemKey::Year, ItemValue::Integer(value)));
	}

	fn remove_year(&mut self) {
		self.remove_key(&ItemKey::Year);
	}
}

impl Tag {
	/// An empty tag
	#[must_use]
	pub const fn new() -> Self {
		Self { items: Vec::new() }
	}

	/// Item count, pictures included
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Whether the tag has no items
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Every item, in decode order
	pub fn items(&self) -> impl ExactSizeIterator<Item = &TagItem> + Clone {
		self.items.iter()
	}

	/// Whether any item is stored under an [`ItemKey::Native`] key
	pub fn has_native_items(&self) -> bool {
		self.items.iter().any(|i| i.key.native().is_some())
	}

	/// The first item stored under `item_key`
	pub fn get(&self, item_key: &ItemKey) -> Option<&TagItem> {
		self.items.iter().find(|i| &i.key == item_key)
	}

	/// Every item stored under `key`, in order
	pub fn get_all<'a>(&'a self, key: &'a ItemKey) -> impl Iterator<Item = &'a TagItem> + Clone {
		self.items.iter().filter(move |i| &i.key == key)
	}

	/// The first value of `item_key`, if it is [`ItemValue::Text`]
	///
	/// Integers are not formatted, see [`ItemValue::text`] for that.
	pub fn get_string(&self, item_key: &ItemKey) -> Option<&str> {
		match self.get(item_key)?.value() {
			ItemValue::Text(text) => Some(text),
			_ => None,
		}
	}

	/// The first value of `item_key` as a number, parsing text when needed
	pub fn get_integer(&self, item_key: &ItemKey) -> Option<u32> {
		self.get(item_key).and_then(|item| item.value().integer())
	}

	/// Every [`ItemValue::Text`] value of `key`, in order
	pub fn get_strings<'a>(&'a self, key: &'a ItemKey) -> impl Iterator<Item = &'a str> + Clone {
		self.items.iter().filter_map(move |i| match &i.value {
			ItemValue::Text(text) if &i.key == key => Some(text.as_str()),
			_ => None,
		})
	}

	/// Store `item`, replacing **every** value of its key
	///
	/// `item` lands where the first replaced value was, other items keep their order.
	///
	/// Returns `false`, changing nothing, when the value doesn't suit the key. A [`Picture`]
	/// only belongs under [`ItemKey::Artwork`], for example.
	pub fn insert(&mut self, item: TagItem) -> bool {
		if !item.is_consistent() {
			return false;
		}

		match self.items.iter().position(|i| i.key == item.key) {
			Some(pos) => {
				let mut idx = 0;
				self.items.retain(|i| {
					let keep = idx <= pos || i.key != item.key;
					idx += 1;
					keep
				});
				self.items[pos] = item;
			},
			None => self.items.push(item),
		}

		true
	}

	/// [`Tag::insert`] for a text value
	///
	/// Text under a numeric key that is a plain number is stored as [`ItemValue::Integer`].
	pub fn insert_text(&mut self, item_key: ItemKey, text: String) -> bool {
		self.insert(TagItem::from_text(item_key, text))
	}

	/// Add `item` after every existing value of its key
	///
	/// Formats that allow a single value per key only write the first one.
	///
	/// Returns `false` under the same conditions as [`Tag::insert`].
	pub fn push(&mut self, item: TagItem) -> bool {
		if !item.is_consistent() {
			return false;
		}

		self.items.push(item);
		true
	}

	pub(crate) fn push_unchecked(&mut self, item: TagItem) {
		self.items.push(item);
	}

	/// Remove and return every item stored under `key`
	pub fn take(&mut self, key: &ItemKey) -> Vec<TagItem> {
		let (taken, kept) = std::mem::take(&mut self.items)
			.into_iter()
			.partition(|i| &i.key == key);
		self.items = kept;
		taken
	}

	/// Drop every item stored under `key`
	pub fn remove_key(&mut self, key: &ItemKey) {
		self.items.retain(|i| &i.key != key)
	}

	/// Remove the `index`th value of `key`
	///
	/// Only values of `key` are counted.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsmith::tag::{ItemKey, ItemValue, Tag, TagItem};
	///
	/// let mut tag = Tag::new();
	/// tag.push(TagItem::new(ItemKey::Genre, ItemValue::Text(String::from("Rock"))));
	/// tag.push(TagItem::new(ItemKey::Genre, ItemValue::Text(String::from("Jazz"))));
	///
	/// let removed = tag.remove_value(&ItemKey::Genre, 0).unwrap();
	/// assert_eq!(removed.value(), &ItemValue::Text(String::from("Rock")));
	/// assert_eq!(tag.get_string(&ItemKey::Genre), Some("Jazz"));
	/// ```
	pub fn remove_value(&mut self, key: &ItemKey, index: usize) -> Option<TagItem> {
		let pos = self
			.items
			.iter()
			.enumerate()
			.filter(|(_, i)| &i.key == key)
			.nth(index)
			.map(|(pos, _)| pos)?;

		Some(self.items.remove(pos))
	}

	/// Keep only the items `f` accepts
	pub fn retain<F>(&mut self, f: F)
	where
		F: FnMut(&TagItem) -> bool,
	{
		self.items.retain(f)
	}

	/// Drop items whose value is empty
	pub fn remove_empty(&mut self) {
		self.items.retain(|item| !item.value().is_empty());
	}

	/// Drop every item
	pub fn clear(&mut self) {
		self.items.clear();
	}

	/// Every decoded picture, in order
	pub fn pictures(&self) -> impl Iterator<Item = &Picture> + Clone {
		self.items.iter().filter_map(|i| i.value.picture())
	}

	/// The first picture of `picture_type`
	pub fn get_picture_type(&self, picture_type: PictureType) -> Option<&Picture> {
		self.pictures()
			.find(|picture| picture.pic_type() == picture_type)
	}

	/// Add a picture after the existing ones
	pub fn push_picture(&mut self, picture: Picture) {
		self.items
			.push(TagItem::new(ItemKey::Artwork, ItemValue::Picture(picture)));
	}

	/// Drop every picture of `picture_type`
	pub fn remove_picture_type(&mut self, picture_type: PictureType) {
		self.items.retain(|i| match &i.value {
			ItemValue::Picture(picture) => picture.pic_type() != picture_type,
			_ => true,
		})
	}
}

impl IntoIterator for Tag {
	type Item = TagItem;
	type IntoIter = std::vec::IntoIter<TagItem>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.into_iter()
	}
}

impl Extend<TagItem> for Tag {
	/// [`Tag::push`] for each item, inconsistent items are skipped
	fn extend<T: IntoIterator<Item = TagItem>>(&mut self, iter: T) {
		for item in iter {
			self.push(item);
		}
	}
}

impl FromIterator<TagItem> for Tag {
	fn from_iter<T: IntoIterator<Item = TagItem>>(iter: T) -> Self {
		let mut tag = Tag::new();
		tag.extend(iter);
		tag
	}
}
