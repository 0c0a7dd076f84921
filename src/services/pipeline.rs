use std::path::PathBuf;

use indexmap::IndexMap;

use crate::error::{LanguageError, RunError, ValidationError};
use crate::model::job::LanguageJob;
use crate::model::language::SteamLanguage;
use crate::model::token_file::TokenFile;
use crate::parsers::vdf;
use crate::services::ai::{self, Translator};
use crate::services::cancel::CancelToken;
use crate::services::events::{EventSink, RunEvent};
use crate::services::summary::RunSummary;
use crate::services::{encoding, output};

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub source: PathBuf,
    pub languages: Vec<&'static SteamLanguage>,
    pub output_dir: PathBuf,
    pub credential: String,
}

pub fn validate(req: &RunRequest) -> Result<(), ValidationError> {
    if !req.source.is_file() {
        return Err(ValidationError::MissingSource(req.source.clone()));
    }
    if req.languages.is_empty() {
        return Err(ValidationError::NoLanguages);
    }
    if !req.output_dir.is_dir() {
        return Err(ValidationError::MissingOutputDir(req.output_dir.clone()));
    }
    if req.credential.trim().is_empty() {
        return Err(ValidationError::MissingCredential);
    }
    Ok(())
}

enum LanguageOutcome {
    Written(PathBuf),
    Cancelled,
}

/// Runs the whole batch on the calling thread: one language at a time, one
/// token at a time. Only validation, read and decode failures abort; every
/// per-language failure is recorded on its job.
pub fn run(
    req: &RunRequest,
    translator: &dyn Translator,
    cancel: &CancelToken,
    events: &EventSink,
) -> Result<RunSummary, RunError> {
    validate(req)?;

    let source = encoding::read_source(&req.source).map_err(|source| RunError::Read {
        path: req.source.clone(),
        source,
    })?;
    if source.had_errors {
        tracing::warn!(encoding = source.encoding, "source contained undecodable bytes");
        events.warn(format!(
            "Source file is not clean {}; some characters were replaced",
            source.encoding
        ));
    }

    let file = vdf::decode(&source.text)?;
    events.info(format!(
        "Source language: {}",
        file.language.as_deref().unwrap_or("unknown")
    ));
    events.info(format!("Found {} tokens", file.tokens.len()));
    tracing::info!(
        source = %req.source.display(),
        tokens = file.tokens.len(),
        languages = req.languages.len(),
        "starting run"
    );

    let total = req.languages.len();
    let mut jobs: Vec<LanguageJob> = req.languages.iter().map(|&l| LanguageJob::new(l)).collect();
    let mut finished = 0usize;
    let mut cancelled_run = false;

    for (index, job) in jobs.iter_mut().enumerate() {
        let lang = job.language;

        if cancel.is_cancelled() {
            job.cancel();
            cancelled_run = true;
        } else {
            job.start();
            events.emit(RunEvent::LanguageStarted {
                language: lang.id.to_string(),
                index: index + 1,
                total,
            });
            events.info(format!(
                "Translating into {} ({}/{})...",
                lang.name,
                index + 1,
                total
            ));

            match translate_language(&file, req, job, translator, cancel, events) {
                Ok(LanguageOutcome::Written(path)) => {
                    events.info(format!("Done! File saved to: {}", path.display()));
                    tracing::info!(language = lang.id, output = %path.display(), "language completed");
                    job.complete(path);
                }
                Ok(LanguageOutcome::Cancelled) => {
                    job.cancel();
                    cancelled_run = true;
                }
                Err(e) => {
                    events.error(format!("Translating into {} failed: {e}", lang.name));
                    tracing::error!(language = lang.id, error = %e, "language failed");
                    job.fail(e.to_string());
                }
            }
        }

        finished += 1;
        events.emit(RunEvent::LanguageFinished {
            language: lang.id.to_string(),
            state: job.state,
            output: job.output.clone(),
            error: job.error.clone(),
        });
        events.emit(RunEvent::Progress {
            completed: finished,
            total,
            fraction: finished as f64 / total as f64,
        });

        if cancelled_run {
            events.info("Translation cancelled");
            tracing::info!(language = lang.id, "run cancelled");
            break;
        }
    }

    let summary = RunSummary::from_jobs(&jobs, cancelled_run);
    for line in summary.render() {
        events.info(line);
    }
    events.emit(RunEvent::Finished {
        summary: summary.clone(),
    });

    Ok(summary)
}

fn translate_language(
    file: &TokenFile,
    req: &RunRequest,
    job: &mut LanguageJob,
    translator: &dyn Translator,
    cancel: &CancelToken,
    events: &EventSink,
) -> Result<LanguageOutcome, LanguageError> {
    let lang = job.language;

    // Checked up front so a bad source name costs no API calls.
    let path = output::output_path(&req.source, lang, &req.output_dir)?;

    let total = file.translatable_count();
    let mut current = 0usize;
    let mut tokens: IndexMap<String, String> = IndexMap::with_capacity(file.tokens.len());

    for (key, value) in &file.tokens {
        if cancel.is_cancelled() {
            return Ok(LanguageOutcome::Cancelled);
        }

        if value.trim().is_empty() {
            tokens.insert(key.clone(), value.clone());
            continue;
        }

        current += 1;
        events.emit(RunEvent::TokenProgress {
            language: lang.id.to_string(),
            current,
            total,
            key: key.clone(),
        });
        tracing::debug!(language = lang.id, key = %key, "{current}/{total}");

        let result = ai::translate_or_passthrough(translator, value, lang, cancel, events)?;
        if result.ok {
            job.translated += 1;
        } else {
            job.passthrough += 1;
        }
        tokens.insert(key.clone(), result.text);
    }

    let translated = TokenFile::new(Some(lang.id.to_string()), tokens);
    let content = vdf::encode(lang.id, &translated.tokens);

    if cancel.is_cancelled() {
        return Ok(LanguageOutcome::Cancelled);
    }

    output::write_atomic(&path, content.as_bytes()).map_err(|source| LanguageError::Write {
        path: path.clone(),
        source,
    })?;

    Ok(LanguageOutcome::Written(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranslationError;
    use crate::model::job::JobState;
    use crate::model::language::lookup;
    use std::fs;
    use std::sync::mpsc;

    struct Tagging;

    impl Translator for Tagging {
        fn translate(&self, text: &str, target: &SteamLanguage) -> Result<String, TranslationError> {
            Ok(format!("{}:{}", target.id, text))
        }
    }

    const SOURCE: &str = "\"lang\"\n{\n\t\"Language\"\t\"schinese\"\n\t\"Tokens\"\n\t{\n\
                          \t\t\"NEW_ACHIEVEMENT_1_NAME\"\t\"胜利\"\n\
                          \t\t\"NEW_ACHIEVEMENT_1_DESC\"\t\"\"\n\t}\n}";

    fn request(dir: &tempfile::TempDir, name: &str, langs: &[&str]) -> RunRequest {
        let source = dir.path().join(name);
        fs::write(&source, SOURCE).unwrap();
        RunRequest {
            source,
            languages: langs.iter().map(|l| lookup(l).unwrap()).collect(),
            output_dir: dir.path().to_path_buf(),
            credential: "sk-test".into(),
        }
    }

    #[test]
    fn validation_order_and_variants() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(&dir, "1_loc_schinese.vdf", &["english"]);
        assert_eq!(validate(&req), Ok(()));

        req.credential = " ".into();
        assert_eq!(validate(&req), Err(ValidationError::MissingCredential));

        req.output_dir = dir.path().join("missing");
        assert!(matches!(validate(&req), Err(ValidationError::MissingOutputDir(_))));

        req.languages.clear();
        assert_eq!(validate(&req), Err(ValidationError::NoLanguages));

        req.source = dir.path().to_path_buf();
        assert!(matches!(validate(&req), Err(ValidationError::MissingSource(_))));
    }

    #[test]
    fn writes_one_file_per_language_and_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(&dir, "1_loc_schinese.vdf", &["english", "french"]);
        let (tx, rx) = mpsc::channel();

        let summary = run(&req, &Tagging, &CancelToken::new(), &EventSink::new(tx)).unwrap();

        assert_eq!(summary.completed.len(), 2);
        assert!(!summary.cancelled_run);
        let fr = fs::read_to_string(dir.path().join("1_loc_french.vdf")).unwrap();
        assert!(fr.contains("\t\"Language\"\t\"french\"\n"));
        assert!(fr.contains("\"NEW_ACHIEVEMENT_1_NAME\"\t\"french:胜利\""));
        assert!(fr.contains("\"NEW_ACHIEVEMENT_1_DESC\"\t\"\""));

        let fractions: Vec<f64> = rx
            .try_iter()
            .filter_map(|e| match e {
                RunEvent::Progress { fraction, .. } => Some(fraction),
                _ => None,
            })
            .collect();
        assert_eq!(fractions, vec![0.5, 1.0]);
    }

    #[test]
    fn unparseable_source_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(&dir, "1_loc_schinese.vdf", &["english"]);
        fs::write(&req.source, "garbage").unwrap();

        let err = run(&req, &Tagging, &CancelToken::new(), &EventSink::disabled()).unwrap_err();
        assert!(matches!(err, RunError::Format(_)));
    }

    #[test]
    fn cancelled_before_start_cancels_first_language_only() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(&dir, "1_loc_schinese.vdf", &["english", "french"]);
        let cancel = CancelToken::new();
        cancel.cancel();

        let summary = run(&req, &Tagging, &cancel, &EventSink::disabled()).unwrap();

        assert!(summary.cancelled_run);
        assert_eq!(summary.state_of("english"), Some(JobState::Cancelled));
        assert_eq!(summary.state_of("french"), None);
        assert!(!dir.path().join("1_loc_english.vdf").exists());
    }
}
