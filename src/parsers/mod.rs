pub mod vrptw;

pub use vrptw::{parse, read_instance, Instance};
