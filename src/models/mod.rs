pub mod event;

pub use event::{slugify, Event, EventMode, NewEvent};
