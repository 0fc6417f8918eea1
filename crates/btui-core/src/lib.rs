#![forbid(unsafe_code)]

//! Core: key events, escape-sequence decoding, and screen geometry.

pub mod ansi;
pub mod decoder;
pub mod event;
pub mod geometry;
pub mod style;
