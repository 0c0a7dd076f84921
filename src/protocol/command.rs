#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    Languages,
    RunStart,
    RunCancel,
    RunStatus,
    RunSummary,
    SettingsGet,
    SettingsSave,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "languages" => Command::Languages,
            "run.start" => Command::RunStart,
            "run.cancel" => Command::RunCancel,
            "run.status" => Command::RunStatus,
            "run.summary" => Command::RunSummary,
            "settings.get" => Command::SettingsGet,
            "settings.save" => Command::SettingsSave,
            _ => Command::Unknown,
        }
    }
}
