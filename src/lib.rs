#![warn(clippy::all, rust_2018_idioms)]

pub mod corrections;
pub mod cutter;
pub mod error;
pub mod files;
pub mod filler;
pub mod histoer;
pub mod plots;
pub mod regions;
pub mod significance;
pub mod weights;
