#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Exact cover solving over a dancing-links sparse matrix.

pub mod column_selection;
pub mod matrix;
pub mod search;
pub mod sink;
