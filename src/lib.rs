//! tapevm: a byte-coded stack machine running on a flat byte tape.
//!
//! The workspace crates are re-exported so embedders need one dependency:
//! [`engine`] executes images, [`console`] connects them to the outside world
//! and [`assembler`] produces them.

pub use assembler;
pub use console;
pub use engine;

pub mod demo;
