//! Transcript preprocessor.
//!
//! Reads every `*.txt` file from the fixed `transcripts/` input directory,
//! computes per-file and aggregate text statistics, and writes one JSON
//! document to `transcripts/aggregate.json`. A file that cannot be read is
//! logged and skipped; the run continues.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;

const INPUT_DIR: &str = "transcripts";
const OUTPUT_PATH: &str = "transcripts/aggregate.json";
const TOP_WORDS_PER_FILE: usize = 25;
const TOP_WORDS_OVERALL: usize = 50;

/// Single-token filler words tallied per transcript.
const FILLER_WORDS: &[&str] = &["um", "uh", "like", "so", "actually", "basically", "literally"];

#[derive(Clone, Debug, Serialize)]
struct WordCount {
    word: String,
    count: u64,
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    words: u64,
    unique_words: u64,
    sentences: u64,
    filler_counts: BTreeMap<String, u64>,
    top_words: Vec<WordCount>,
}

#[derive(Debug, Serialize)]
struct Aggregate {
    total_files: usize,
    skipped_files: usize,
    total_words: u64,
    total_sentences: u64,
    top_words: Vec<WordCount>,
    files: Vec<FileReport>,
}

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logger() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

fn main() -> ExitCode {
    init_logger();

    let entries = match std::fs::read_dir(INPUT_DIR) {
        Ok(entries) => entries,
        Err(e) => {
            log::error!("cannot read input directory {}: {}", INPUT_DIR, e);
            return ExitCode::FAILURE;
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
        })
        .collect();
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    let mut skipped_files = 0usize;
    let mut overall_frequency: BTreeMap<String, u64> = BTreeMap::new();
    let mut total_words = 0u64;
    let mut total_sentences = 0u64;

    for path in &paths {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("skipping {}: {}", path.display(), e);
                skipped_files += 1;
                continue;
            }
        };
        let report = analyze_transcript(path, &text, &mut overall_frequency);
        total_words += report.words;
        total_sentences += report.sentences;
        files.push(report);
    }

    let aggregate = Aggregate {
        total_files: files.len(),
        skipped_files,
        total_words,
        total_sentences,
        top_words: top_words(&overall_frequency, TOP_WORDS_OVERALL),
        files,
    };

    let json = match serde_json::to_string_pretty(&aggregate) {
        Ok(json) => json,
        Err(e) => {
            log::error!("cannot serialize aggregate: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = std::fs::write(OUTPUT_PATH, json) {
        log::error!("cannot write {}: {}", OUTPUT_PATH, e);
        return ExitCode::FAILURE;
    }

    log::info!(
        "aggregated {} transcript(s) ({} skipped), {} words -> {}",
        aggregate.total_files,
        aggregate.skipped_files,
        aggregate.total_words,
        OUTPUT_PATH
    );
    ExitCode::SUCCESS
}

fn analyze_transcript(
    path: &std::path::Path,
    text: &str,
    overall_frequency: &mut BTreeMap<String, u64>,
) -> FileReport {
    let mut frequency: BTreeMap<String, u64> = BTreeMap::new();
    let mut filler_counts: BTreeMap<String, u64> = FILLER_WORDS
        .iter()
        .map(|w| (w.to_string(), 0u64))
        .collect();
    filler_counts.insert("you know".to_string(), 0);

    let mut words = 0u64;
    let mut previous: Option<String> = None;
    for token in tokenize(text) {
        words += 1;
        if let Some(count) = filler_counts.get_mut(&token) {
            *count += 1;
        }
        if previous.as_deref() == Some("you") && token == "know" {
            if let Some(count) = filler_counts.get_mut("you know") {
                *count += 1;
            }
        }
        *frequency.entry(token.clone()).or_insert(0) += 1;
        *overall_frequency.entry(token.clone()).or_insert(0) += 1;
        previous = Some(token);
    }

    FileReport {
        file: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        words,
        unique_words: frequency.len() as u64,
        sentences: count_sentences(text),
        filler_counts,
        top_words: top_words(&frequency, TOP_WORDS_PER_FILE),
    }
}

/// Lowercased word tokens; apostrophes survive inside contractions.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|token| token.trim_matches('\'').to_lowercase())
        .filter(|token| !token.is_empty())
}

/// Count sentence-terminator runs (`...` is one sentence end, not three).
fn count_sentences(text: &str) -> u64 {
    let mut sentences = 0u64;
    let mut in_terminator = false;
    for c in text.chars() {
        let is_terminator = matches!(c, '.' | '!' | '?');
        if is_terminator && !in_terminator {
            sentences += 1;
        }
        in_terminator = is_terminator;
    }
    sentences
}

fn top_words(frequency: &BTreeMap<String, u64>, limit: usize) -> Vec<WordCount> {
    let mut ranked: Vec<WordCount> = frequency
        .iter()
        .map(|(word, &count)| WordCount {
            word: word.clone(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    ranked.truncate(limit);
    ranked
}
