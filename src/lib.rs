//! Pannable, zoomable terminal map with a tile planner and a route overlay.
//!
//! The core (`map`, `input`, `schedule`) has no terminal dependencies:
//! pointer input mutates a [`map::Transform`], every change yields an
//! immutable [`map::Viewport`], and the tile planner and route renderer each
//! consume that snapshot independently.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod input;
pub mod map;
pub mod schedule;
pub mod ui;
