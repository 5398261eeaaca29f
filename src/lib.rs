//! Authoring core for embeddable chat widgets.
//!
//! A widget carries two block trees, one for the launcher button and one for
//! the chat window, plus a flat bag of settings. The [`tree`] functions edit
//! those trees without mutating their input, [`history`] keeps whole-widget
//! snapshots for undo, and [`render`] interprets a tree into visual nodes for
//! whatever toolkit paints them.

pub mod block;
pub mod config;
pub mod editor;
pub mod history;
pub mod render;
pub mod store;
pub mod style;
pub mod tree;
pub mod widget;
