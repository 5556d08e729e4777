//! CCA Finder Terminal User Interface (TUI)
//!
//! A terminal rendition of the address form: type an address, press Enter,
//! and browse the eligible programs.

pub mod app;
pub mod events;
pub mod ui;

pub use app::{run_tui, App};
pub use events::AppEvent;
