pub mod prediction;
pub mod result;
