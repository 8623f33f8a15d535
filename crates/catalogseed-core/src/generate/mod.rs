pub mod records;
pub mod value;

pub use records::{DownloadRecord, ProductRecord, PromoRecord, SubcategoryRecord};
pub use value::Value;
