//! Utility helpers for tests.
//!
//! [`fixtures`] builds simulator-shaped JSON; [`scene_sync`] sets up a
//! headless scene app and captures its error events.

pub mod fixtures;
pub mod scene_sync;
