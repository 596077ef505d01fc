mod moment_handler;

pub use moment_handler::*;
