pub mod ai;
pub mod ai_types;
pub mod cancel;
pub mod controller;
pub mod encoding;
pub mod events;
pub mod output;
pub mod pipeline;
pub mod settings;
pub mod summary;
