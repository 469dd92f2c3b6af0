pub mod ids;
pub mod parse;
pub mod path;
pub mod types;
