mod moment_dto;

pub use moment_dto::*;
