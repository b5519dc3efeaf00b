pub mod summary;

pub use summary::{ItemResult, Summary};
