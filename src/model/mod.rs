pub mod job;
pub mod language;
pub mod token_file;
