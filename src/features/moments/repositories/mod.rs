mod moment_repository;

pub use moment_repository::{MomentRepository, MomentTransaction, PgMomentRepository};
