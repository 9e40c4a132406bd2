mod ids;
mod item;
mod tag;
mod trash_item;

pub use ids::{ItemId, TagId};
pub use item::{Item, ItemBuilder};
pub use tag::Tag;
pub use trash_item::TrashItem;
