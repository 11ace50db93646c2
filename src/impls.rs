pub mod export;
pub mod store;
pub mod tokener;
