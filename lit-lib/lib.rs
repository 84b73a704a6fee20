//! Cursor sync between a literate source file and its rendered document.
//!
//! The building blocks, from the bottom up:
//!
//! - [`approx`]: approximate substring search with a bounded edit count.
//! - [`locate`]: map a position through a window of surrounding text.
//! - [`fragment`]: pick that window from a view's own segmentation.
//! - [`sync`]: mirror cursor moves between two views without feedback loops.
//! - [`comment`]: line comment markers per source language.

use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod approx;
pub mod comment;
pub mod config;
pub mod document;
pub mod fragment;
pub mod locate;
pub mod selection;
pub mod sync;

pub type Tendril = SmartString<LazyCompact>;
