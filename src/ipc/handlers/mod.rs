pub mod core;
pub mod reports;
pub mod students;
pub mod subjects;
