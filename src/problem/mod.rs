pub mod client;
pub mod problem_data;

pub use client::Client;
pub use problem_data::ProblemData;
