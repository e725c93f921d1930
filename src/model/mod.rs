//! Pure data: the [`Solver`] primary resource and the objects it owns.

pub mod cluster_object;
pub mod message_address;
pub mod solver;

pub use cluster_object::*;
pub use message_address::*;
pub use solver::*;
