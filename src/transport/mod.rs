pub mod retry;

pub use retry::RetryingTransport;
