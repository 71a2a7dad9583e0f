pub mod capture;
pub mod gesture;
pub mod recorder;
pub mod surface;
pub mod terminal;
