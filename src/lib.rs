//! Havenbrowser — a self-healing minimal browser shell.
//!
//! The supervisory core keeps a browsing session alive across failures: a
//! watchdog process restarts the UI process within a bounded retry budget,
//! a snapshot store persists and restores open tabs across restarts, and
//! the session controller recovers individual page surfaces after renderer
//! failures without touching the rest of the session.
//!
//! This library crate exposes all modules for use by the binaries and
//! integration tests.

pub mod app;
pub mod managers;
pub mod platform;
pub mod services;
pub mod types;

#[cfg(feature = "gui")]
pub mod ui;
