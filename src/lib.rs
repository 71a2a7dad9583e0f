//! Capture Android GUI screens and their view hierarchies, normalize the
//! hierarchies into canonical element trees, and record the taps and swipes
//! that move an app from screen to screen.

pub mod cli;
pub mod device;
pub mod element;
pub mod error;
pub mod hierarchy;
pub mod recorder;
pub mod trace;

pub use error::TraceError;
