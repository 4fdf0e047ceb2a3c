pub mod fixtures;
pub mod strategies;
