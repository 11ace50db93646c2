pub mod chart;
pub mod pdf;
pub mod xlsx;
