pub mod aggregate;
pub mod format;
pub mod run;
pub mod score;
