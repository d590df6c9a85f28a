pub mod constants;
pub mod error;
pub mod observer;
pub mod retry;
pub mod utility;

pub use error::{Error, Result};
pub use observer::{CaptureObserver, LogObserver, Observer};
pub use retry::retry;
