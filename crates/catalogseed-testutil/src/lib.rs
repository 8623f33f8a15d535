pub mod fixtures;
pub mod memory;

pub use memory::MemoryStore;
