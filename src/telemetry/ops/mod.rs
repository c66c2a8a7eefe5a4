pub mod collect;
pub mod detail;
pub mod report;
