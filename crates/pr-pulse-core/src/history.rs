//! Daily time-series store for the open pull request count.
//!
//! The backing file is a plain CSV table with columns `date,count`, one row
//! per calendar day, human-inspectable and rewritten in full on every
//! upsert. Internally the table is a keyed map from date to count, so at
//! most one row per day can ever exist regardless of how the file was
//! ordered on disk.
//!
//! Writes go through a temp file in the same directory followed by a rename,
//! so the backing file never reflects a partially written table even if the
//! process is interrupted mid-run.

use crate::error::{PulseError, Result};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// One persisted observation: the open-PR count seen on a calendar day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeriesRow {
    /// Calendar day, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Open pull request count observed that day.
    pub count: u64,
}

impl SeriesRow {
    /// Canonical display form of the row's date.
    pub fn display_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Append-or-update store, exclusively owning the backing CSV file for the
/// duration of one run.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Create a store over the given backing file. The file does not need to
    /// exist yet; the first upsert creates it (and any parent directories).
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        HistoryStore { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record `count` for `today`, overwriting any count already stored for
    /// that date (last write wins), and persist the full table back to disk.
    ///
    /// Returns the updated table in chronological order.
    pub fn upsert(&self, today: NaiveDate, count: u64) -> Result<Vec<SeriesRow>> {
        let mut table = self.load()?;
        let replaced = table.insert(today, count).is_some();
        self.persist(&table)?;

        info!(
            date = %today,
            count,
            replaced,
            rows = table.len(),
            "upserted daily open pull request count"
        );
        Ok(to_rows(&table))
    }

    /// Rows within the last `days` days inclusive of today, chronologically
    /// ordered. Rows outside the window are excluded from the read, never
    /// deleted from the backing table.
    pub fn windowed_read(&self, days: u32) -> Result<Vec<SeriesRow>> {
        let table = self.load()?;
        Ok(window(&table, Utc::now().date_naive(), days))
    }

    /// Load the backing table, or an empty table when the file is absent.
    ///
    /// A present-but-malformed file is a fatal [`PulseError::HistoryParse`]:
    /// the run must abort rather than overwrite history with a fresh table.
    fn load(&self) -> Result<BTreeMap<NaiveDate, u64>> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no history file yet, starting empty");
                return Ok(BTreeMap::new());
            }
            Err(e) => {
                return Err(PulseError::HistoryRead {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let mut table = BTreeMap::new();
        let mut reader = csv::Reader::from_reader(raw.as_slice());
        for record in reader.deserialize::<SeriesRow>() {
            let row = record.map_err(|e| PulseError::HistoryParse {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
            table.insert(row.date, row.count);
        }
        Ok(table)
    }

    /// Write the full table atomically: temp file in the target directory,
    /// then rename over the backing file.
    fn persist(&self, table: &BTreeMap<NaiveDate, u64>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                std::fs::create_dir_all(parent)?;
                parent
            }
            _ => Path::new("."),
        };

        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file());
            for (date, count) in table {
                writer.serialize(SeriesRow {
                    date: *date,
                    count: *count,
                })?;
            }
            writer.flush()?;
        }
        tmp.persist(&self.path).map_err(|e| PulseError::Io(e.error))?;
        Ok(())
    }
}

fn to_rows(table: &BTreeMap<NaiveDate, u64>) -> Vec<SeriesRow> {
    table
        .iter()
        .map(|(date, count)| SeriesRow {
            date: *date,
            count: *count,
        })
        .collect()
}

/// Rows of `table` within the last `days` days inclusive of `today`, in
/// chronological order.
fn window(table: &BTreeMap<NaiveDate, u64>, today: NaiveDate, days: u32) -> Vec<SeriesRow> {
    if days == 0 {
        return Vec::new();
    }
    let cutoff = today - Duration::days(i64::from(days) - 1);
    table
        .range(cutoff..=today)
        .map(|(date, count)| SeriesRow {
            date: *date,
            count: *count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    #[test]
    fn test_first_upsert_creates_file_with_one_row() {
        let dir = tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path().join("history.csv"));

        let rows = store.upsert(date("2026-08-07"), 12).expect("upsert");

        assert_eq!(rows, vec![SeriesRow { date: date("2026-08-07"), count: 12 }]);
        let raw = std::fs::read_to_string(store.path()).expect("read back");
        assert_eq!(raw, "date,count\n2026-08-07,12\n");
    }

    #[test]
    fn test_upsert_same_date_twice_keeps_one_row_second_count_wins() {
        let dir = tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path().join("history.csv"));

        store.upsert(date("2026-08-07"), 12).expect("first upsert");
        let rows = store.upsert(date("2026-08-07"), 9).expect("second upsert");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 9);
    }

    #[test]
    fn test_upsert_appends_new_dates_in_chronological_order() {
        let dir = tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path().join("history.csv"));

        // Insert out of order; the table comes back sorted
        store.upsert(date("2026-08-05"), 7).expect("upsert");
        store.upsert(date("2026-08-03"), 4).expect("upsert");
        let rows = store.upsert(date("2026-08-04"), 5).expect("upsert");

        let dates: Vec<String> = rows.iter().map(|r| r.display_date()).collect();
        assert_eq!(dates, vec!["2026-08-03", "2026-08-04", "2026-08-05"]);
    }

    #[test]
    fn test_window_filters_to_last_n_days_inclusive() {
        let mut table = BTreeMap::new();
        for offset in 0..30 {
            let day = date("2026-08-07") - Duration::days(offset);
            table.insert(day, offset as u64);
        }

        let rows = window(&table, date("2026-08-07"), 15);

        assert_eq!(rows.len(), 15);
        assert_eq!(rows.first().map(|r| r.date), Some(date("2026-07-24")));
        assert_eq!(rows.last().map(|r| r.date), Some(date("2026-08-07")));
        // Chronological order
        for pair in rows.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn test_window_excludes_rows_without_deleting_them() {
        let dir = tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path().join("history.csv"));

        let old = Utc::now().date_naive() - Duration::days(100);
        store.upsert(old, 3).expect("upsert old");
        store.upsert(Utc::now().date_naive(), 8).expect("upsert today");

        let rows = store.windowed_read(15).expect("windowed read");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 8);

        // The excluded row is still in the backing file
        let raw = std::fs::read_to_string(store.path()).expect("read back");
        assert!(raw.contains(&old.format("%Y-%m-%d").to_string()));
    }

    #[test]
    fn test_malformed_history_file_aborts_without_rewrite() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("history.csv");
        std::fs::write(&path, "date,count\n2026-08-07,not-a-number\n").expect("write");
        let store = HistoryStore::new(&path);

        let err = store
            .upsert(date("2026-08-07"), 5)
            .expect_err("should refuse to overwrite");
        match err {
            PulseError::HistoryParse { .. } => {}
            other => panic!("expected HistoryParse, got {:?}", other),
        }

        // The malformed file is untouched
        let raw = std::fs::read_to_string(&path).expect("read back");
        assert!(raw.contains("not-a-number"));
    }

    #[test]
    fn test_missing_file_reads_as_empty_window() {
        let dir = tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path().join("absent.csv"));
        let rows = store.windowed_read(15).expect("windowed read");
        assert!(rows.is_empty());
    }
}
