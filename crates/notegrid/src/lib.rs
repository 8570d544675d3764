//! Headless core of the NoteGrid add-on. A single controller owns the
//! application state and is driven by a closed intent set; every screen
//! renders as a pure projection of that state.

pub mod config;
pub mod layout;
pub mod mention;
pub mod messages;
pub mod navigation;
pub mod state;
pub mod types;
pub mod view;
