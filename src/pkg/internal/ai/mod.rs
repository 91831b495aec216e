pub mod client;
pub mod feedback;
pub mod generate;
pub mod read;
