//! Translates Steam achievement localization files (`*_loc_<language>.vdf`)
//! into other Steam languages through a chat-completion API.

pub mod error;
pub mod model;
pub mod parsers;
pub mod protocol;
pub mod services;

pub use error::{
    ControllerError, FilenameFormatError, FormatError, LanguageError, RunError, SettingsError,
    TranslationError, ValidationError,
};
pub use model::job::{JobState, LanguageJob};
pub use model::language::{SteamLanguage, LANGUAGES};
pub use model::token_file::TokenFile;
pub use services::ai::{AiConfig, ChatTranslator, Translator};
pub use services::cancel::CancelToken;
pub use services::controller::RunController;
pub use services::events::{EventSink, RunEvent};
pub use services::pipeline::RunRequest;
pub use services::summary::RunSummary;
