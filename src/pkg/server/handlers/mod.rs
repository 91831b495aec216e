pub mod auth;
pub mod classes;
pub mod probes;
pub mod resumes;
pub mod ui;
