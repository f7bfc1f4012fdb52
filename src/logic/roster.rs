//! Roster import: one name per line, or the first column of CSV rows. Deduplicated case-insensitively.

use crate::models::{is_reserved_name, lookup_key, PlayerId, Session, SessionError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How pasted roster text is split into names.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterFormat {
    /// Every non-blank line is one full name, commas included ("Doe, John").
    #[default]
    Lines,
    /// CSV rows; the first column is the name, the rest is ignored.
    Csv,
}

/// Outcome of a lenient import.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ImportReport {
    pub added: Vec<String>,
    pub skipped_duplicates: Vec<String>,
    pub skipped_reserved: Vec<String>,
}

/// Parse names from text. Names are trimmed and blank ones are dropped.
pub fn parse_roster_names(text: &str, format: RosterFormat) -> Vec<String> {
    match format {
        RosterFormat::Lines => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        RosterFormat::Csv => parse_csv_names(text),
    }
}

fn parse_csv_names(text: &str) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut names = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => {
                if let Some(name) = record.get(0).filter(|n| !n.is_empty()) {
                    names.push(name.to_string());
                }
            }
            Err(e) => log::warn!("Skipping unreadable roster line: {}", e),
        }
    }
    names
}

/// Add every new name, skipping duplicates (against the roster and within the batch) and reserved words.
pub fn import_roster(session: &mut Session, text: &str, format: RosterFormat) -> ImportReport {
    let mut report = ImportReport::default();
    for name in parse_roster_names(text, format) {
        match session.add_player(name.as_str()) {
            Ok(_) => report.added.push(name),
            Err(SessionError::ReservedName(_)) => report.skipped_reserved.push(name),
            Err(_) => {
                log::info!("Duplicate name {}", name);
                report.skipped_duplicates.push(name);
            }
        }
    }
    log::info!(
        "Imported {} players ({} duplicates, {} reserved skipped)",
        report.added.len(),
        report.skipped_duplicates.len(),
        report.skipped_reserved.len()
    );
    report
}

/// All-or-nothing import: any duplicate or reserved name aborts without adding anyone.
pub fn import_roster_strict(
    session: &mut Session,
    text: &str,
    format: RosterFormat,
) -> Result<Vec<PlayerId>, SessionError> {
    let names = parse_roster_names(text, format);
    let mut seen: HashSet<String> = session.players.iter().map(|p| p.lookup_key()).collect();
    for name in &names {
        if is_reserved_name(name) {
            return Err(SessionError::ReservedName(name.clone()));
        }
        if !seen.insert(lookup_key(name)) {
            return Err(SessionError::DuplicatePlayer(name.clone()));
        }
    }
    names.into_iter().map(|name| session.add_player(name)).collect()
}
