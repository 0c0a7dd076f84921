//! JSON-lines front end. Each input line is a request
//! `{"id": .., "cmd": .., "payload": {..}}`; each gets exactly one response
//! line. Run events are interleaved as `{"event": ..}` lines.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

use serde_json::{json, Value};

use crate::error::TranslationError;
use crate::model::language::{self, LANGUAGES};
use crate::services::ai::{AiConfig, ChatTranslator, Translator};
use crate::services::controller::RunController;
use crate::services::events::{EventSink, RunEvent};
use crate::services::pipeline::RunRequest;
use crate::services::settings;

mod command;
pub use command::Command;

pub type TranslatorFactory =
    Box<dyn Fn(&AiConfig) -> Result<Arc<dyn Translator>, TranslationError> + Send + Sync>;

pub fn chat_translator_factory() -> TranslatorFactory {
    Box::new(|cfg| Ok(Arc::new(ChatTranslator::new(cfg)?) as Arc<dyn Translator>))
}

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload(req: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn get_str<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "message": message.into()
    })
    .to_string()
}

/// State behind one protocol connection.
pub struct Session {
    controller: RunController,
    settings_path: PathBuf,
    events: Sender<RunEvent>,
    make_translator: TranslatorFactory,
}

impl Session {
    pub fn new(
        settings_path: PathBuf,
        events: Sender<RunEvent>,
        make_translator: TranslatorFactory,
    ) -> Self {
        Self {
            controller: RunController::new(),
            settings_path,
            events,
            make_translator,
        }
    }

    pub fn controller(&self) -> &RunController {
        &self.controller
    }

    pub fn handle(&self, input: &str) -> String {
        let req: Value = match serde_json::from_str(input) {
            Ok(v) => v,
            Err(_) => {
                return json!({
                    "status": "error",
                    "message": "invalid json"
                })
                .to_string();
            }
        };

        let id = get_id(&req);
        let payload = get_payload(&req);

        match Command::from(get_cmd(&req)) {
            Command::Ping => ok(id, json!({ "message": "vdf-translator alive" })),

            Command::Languages => ok(id, json!({ "languages": &LANGUAGES[..] })),

            Command::RunStart => match self.start(payload) {
                Ok(started) => ok(id, started),
                Err(e) => err(id, e),
            },

            Command::RunCancel => ok(id, json!({ "cancelled": self.controller.cancel_run() })),

            Command::RunStatus => ok(
                id,
                json!({
                    "running": self.controller.is_running(),
                    "summary": self.controller.summary(),
                    "error": self.controller.last_error(),
                }),
            ),

            Command::RunSummary => match self.controller.summary() {
                Some(summary) => ok(id, json!({ "summary": summary })),
                None => err(id, "no finished run"),
            },

            Command::SettingsGet => match settings::load(&self.settings_path) {
                Ok(s) => ok(id, json!({ "settings": s.redacted() })),
                Err(e) => err(id, e.to_string()),
            },

            Command::SettingsSave => match self.save_settings(payload) {
                Ok(s) => ok(id, json!({ "settings": s.redacted() })),
                Err(e) => err(id, e),
            },

            Command::Unknown => err(id, "unknown command"),
        }
    }

    fn start(&self, payload: &Value) -> Result<Value, String> {
        let source = get_str(payload, "source").ok_or("payload.source is required")?;
        let output_dir = get_str(payload, "output_dir").ok_or("payload.output_dir is required")?;

        let ids: Vec<&str> = payload
            .get("languages")
            .and_then(|v| v.as_array())
            .ok_or("payload.languages must be an array")?
            .iter()
            .map(|v| v.as_str().ok_or("payload.languages must contain only strings"))
            .collect::<Result<_, _>>()?;
        let languages = language::parse_list(&ids).map_err(|e| e.to_string())?;

        // An explicit key makes the settings file optional.
        let explicit = get_str(payload, "api_key").filter(|k| !k.trim().is_empty());
        let stored = match settings::load(&self.settings_path) {
            Ok(s) => s,
            Err(e) if explicit.is_some() => {
                tracing::warn!(error = %e, "ignoring unreadable settings");
                settings::Settings::default()
            }
            Err(e) => return Err(e.to_string()),
        };

        let mut cfg = stored.ai_config();
        cfg.api_key = settings::resolve_api_key(explicit, &stored).unwrap_or_default();
        if let Some(provider) = get_str(payload, "provider") {
            cfg.provider = provider.to_string();
        }
        if let Some(model) = get_str(payload, "model") {
            cfg.model = model.to_string();
        }
        if let Some(endpoint) = get_str(payload, "endpoint") {
            cfg.endpoint = Some(endpoint.to_string());
        }

        let req = RunRequest {
            source: PathBuf::from(source),
            languages,
            output_dir: PathBuf::from(output_dir),
            credential: cfg.api_key.clone(),
        };

        if self.controller.is_running() {
            return Err(crate::error::ControllerError::RunInProgress.to_string());
        }
        let translator = (self.make_translator)(&cfg).map_err(|e| e.to_string())?;

        let count = req.languages.len();
        self.controller
            .start_run(req, translator, EventSink::new(self.events.clone()))
            .map_err(|e| e.to_string())?;

        Ok(json!({ "started": true, "languages": count }))
    }

    fn save_settings(&self, payload: &Value) -> Result<settings::Settings, String> {
        let mut s = settings::load(&self.settings_path).map_err(|e| e.to_string())?;

        if let Some(key) = get_str(payload, "api_key") {
            if key.starts_with('*') {
                return Err("enter the real API key, not the masked value".into());
            }
            s.api_key = key.to_string();
        }
        if let Some(provider) = get_str(payload, "provider") {
            s.provider = provider.to_string();
        }
        if let Some(model) = get_str(payload, "model") {
            s.model = model.to_string();
        }
        if let Some(endpoint) = payload.get("endpoint") {
            s.endpoint = endpoint.as_str().map(str::to_string);
        }
        if let Some(timeout) = payload.get("timeout_secs").and_then(|v| v.as_u64()) {
            s.timeout_secs = timeout;
        }

        settings::save(&self.settings_path, &s).map_err(|e| e.to_string())?;
        Ok(s)
    }
}

/// Reads requests until EOF, then lets an active run finish before
/// returning. Output lines (responses and events) go through one writer
/// thread so they never interleave mid-line.
pub fn serve<R, W>(
    input: R,
    output: W,
    settings_path: PathBuf,
    make_translator: TranslatorFactory,
) -> std::io::Result<()>
where
    R: BufRead,
    W: Write + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::channel::<String>();
    let (event_tx, event_rx) = mpsc::channel::<RunEvent>();

    let writer = thread::spawn(move || -> std::io::Result<()> {
        let mut output = output;
        for line in out_rx {
            writeln!(output, "{line}")?;
            output.flush()?;
        }
        Ok(())
    });

    let forward_tx = out_tx.clone();
    let forwarder = thread::spawn(move || {
        for event in event_rx {
            match serde_json::to_string(&event) {
                Ok(line) => {
                    if forward_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "failed to serialize event"),
            }
        }
    });

    let session = Session::new(settings_path, event_tx, make_translator);

    for line in input.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };

        if line.trim().is_empty() {
            continue;
        }

        let result =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| session.handle(&line)));

        let response = match result {
            Ok(resp) => resp,
            Err(_) => json!({
                "status": "error",
                "message": "internal error"
            })
            .to_string(),
        };

        if out_tx.send(response).is_err() {
            break;
        }
    }

    session.controller().wait();
    drop(session);
    let _ = forwarder.join();
    drop(out_tx);

    match writer.join() {
        Ok(result) => result,
        Err(_) => Err(std::io::Error::other("output writer panicked")),
    }
}
