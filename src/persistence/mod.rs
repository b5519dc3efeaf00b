pub mod file;
pub mod memory;
pub mod traits;

pub use file::JsonFileStore;
pub use memory::MemoryLedgerStore;
pub use traits::{LedgerSnapshot, LedgerStore};
