pub mod catalog;
pub mod entity;

pub use catalog::Catalog;
pub use entity::EntityCache;
