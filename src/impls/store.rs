pub mod archive;
pub mod json;
