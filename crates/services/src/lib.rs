pub mod discussion_log;
pub mod host;
pub mod notes_store;
pub mod notify;
pub mod roster;
pub mod store;
pub mod tags;
pub mod tracker;
