pub mod cli;
pub mod config;
pub mod generator;
pub mod node;
pub mod parser;
pub mod rules;
pub mod transform;

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
