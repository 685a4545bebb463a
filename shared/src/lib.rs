pub mod duration;
pub mod protocol;
pub mod types;
