pub mod partition;
pub mod statement;

pub use partition::{partition, BatchRange, PARAMETER_LIMIT};
pub use statement::{InsertBuilder, Statement};
