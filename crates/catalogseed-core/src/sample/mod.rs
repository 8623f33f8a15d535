pub mod category;
pub mod weighted;

pub use category::CategorySampler;
pub use weighted::WeightTable;
