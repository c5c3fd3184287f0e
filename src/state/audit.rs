//! Cross-checks a declared bingo against the ledger.

use serde::Serialize;

use crate::state::phrase::Phrase;

/// Corroboration figures for one selected phrase of a board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Master phrase.
    pub phrase: Phrase,
    /// Distinct players with the phrase selected on the ledger.
    pub count: usize,
    /// Boards in the game.
    pub total: usize,
    /// Whether the phrase sits on one of the board's completed lines.
    pub on_winning_line: bool,
}

impl Report {
    /// Share of boards whose player selected the phrase.
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.count as f32 / self.total as f32
    }

    /// Nobody but the declaring player selected the phrase.
    pub fn is_uncorroborated(&self) -> bool {
        self.count <= 1
    }
}

/// Reports for every selected phrase of one board.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Reports(Vec<Report>);

impl Reports {
    /// Collect reports.
    pub fn new(reports: Vec<Report>) -> Self {
        Self(reports)
    }

    /// A bingo is dubious when a phrase on its winning line has a count of at most one.
    pub fn is_dubious(&self) -> bool {
        self.winning_line().any(Report::is_uncorroborated)
    }

    /// Reports on a completed line.
    pub fn winning_line(&self) -> impl Iterator<Item = &Report> {
        self.0.iter().filter(|report| report.on_winning_line)
    }

    /// Iterate over the entries.
    pub fn iter(&self) -> impl Iterator<Item = &Report> {
        self.0.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: &str, count: usize, on_winning_line: bool) -> Report {
        Report {
            phrase: Phrase::new(id, id),
            count,
            total: 4,
            on_winning_line,
        }
    }

    #[test]
    fn single_selector_on_winning_line_is_dubious() {
        let reports = Reports::new(vec![report("a", 3, true), report("b", 1, true)]);
        assert!(reports.is_dubious());
    }

    #[test]
    fn corroborated_line_is_not_dubious() {
        let reports = Reports::new(vec![
            report("a", 2, true),
            report("b", 4, true),
            report("c", 1, false),
        ]);
        assert!(!reports.is_dubious());
    }

    #[test]
    fn percent_guards_against_empty_games() {
        let mut empty = report("a", 0, true);
        empty.total = 0;
        assert_eq!(empty.percent(), 0.0);
        assert_eq!(report("b", 2, true).percent(), 0.5);
    }
}
