#![forbid(unsafe_code)]

pub mod cursor;
pub mod model;
pub mod selector;
pub mod time;

pub use cursor::SessionCursor;
pub use selector::{ReviewFilter, TopicFilter, select};
pub use time::Clock;
