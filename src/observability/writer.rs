//! Daily-rotating log file writer.
//!
//! Records are appended to `<dir>/<YYYY-MM-DD>.log` for the current UTC date. The
//! first write after midnight opens the next day's file and removes dated files that
//! fell out of the retention window. Files whose names are not dates are never touched.

use chrono::{Duration, NaiveDate, Utc};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How long dated log files are kept
pub const RETENTION_DAYS: i64 = 10;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Thread-safe writer that switches files on calendar-date change
pub struct DailyFileWriter {
    dir: PathBuf,
    retention: Duration,
    inner: Mutex<WriterState>,
}

struct WriterState {
    writer: BufWriter<File>,
    current_date: NaiveDate,
}

impl DailyFileWriter {
    /// Create the directory if needed and open today's file
    pub fn new<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        Self::open_at(dir, Utc::now().date_naive())
    }

    pub(crate) fn open_at<P: AsRef<Path>>(dir: P, today: NaiveDate) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let file = open_append(&dated_path(&dir, today))?;
        info!(dir = %dir.display(), "Log file writer opened");

        let writer = Self {
            dir,
            retention: Duration::days(RETENTION_DAYS),
            inner: Mutex::new(WriterState {
                writer: BufWriter::new(file),
                current_date: today,
            }),
        };

        if let Err(e) = writer.prune(today) {
            warn!(error = %e, "Failed to prune old log files");
        }

        Ok(writer)
    }

    /// Directory holding the dated files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file used for `date`
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        dated_path(&self.dir, date)
    }

    /// Append one line, rotating first if the date changed
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        self.write_line_at(line, Utc::now().date_naive())
    }

    pub(crate) fn write_line_at(&self, line: &str, today: NaiveDate) -> io::Result<()> {
        let mut state = self.inner.lock();

        if today != state.current_date {
            state.writer.flush()?;
            state.writer = BufWriter::new(open_append(&self.path_for(today))?);
            debug!(from = %state.current_date, to = %today, "Rotated log file");
            state.current_date = today;

            if let Err(e) = self.prune(today) {
                warn!(error = %e, "Failed to prune old log files");
            }
        }

        state.writer.write_all(line.as_bytes())?;
        state.writer.write_all(b"\n")?;
        state.writer.flush()
    }

    /// Remove dated files older than the retention window, returning how many were removed
    fn prune(&self, today: NaiveDate) -> io::Result<usize> {
        let mut removed = 0;

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let Some(date) = file_date(&path) else {
                continue;
            };

            if today - date >= self.retention {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, dir = %self.dir.display(), "Pruned expired log files");
        }
        Ok(removed)
    }
}

fn dated_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.log", date.format(DATE_FORMAT)))
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Date encoded in a `<YYYY-MM-DD>.log` file name
fn file_date(path: &Path) -> Option<NaiveDate> {
    if path.extension()? != "log" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    NaiveDate::parse_from_str(stem, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_creates_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("log");

        let writer = DailyFileWriter::open_at(&dir, date("2024-03-01")).unwrap();
        writer.write_line_at("hello", date("2024-03-01")).unwrap();

        let content = fs::read_to_string(dir.join("2024-03-01.log")).unwrap();
        assert_eq!(content, "hello\n");
    }

    #[test]
    fn test_rotates_on_date_change() {
        let tmp = TempDir::new().unwrap();
        let writer = DailyFileWriter::open_at(tmp.path(), date("2024-03-01")).unwrap();

        writer.write_line_at("day one", date("2024-03-01")).unwrap();
        writer.write_line_at("day two", date("2024-03-02")).unwrap();

        assert_eq!(
            fs::read_to_string(writer.path_for(date("2024-03-01"))).unwrap(),
            "day one\n"
        );
        assert_eq!(
            fs::read_to_string(writer.path_for(date("2024-03-02"))).unwrap(),
            "day two\n"
        );
    }

    #[test]
    fn test_prunes_files_outside_retention() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("2024-02-15.log"), "old\n").unwrap();
        fs::write(tmp.path().join("2024-02-21.log"), "edge\n").unwrap();
        fs::write(tmp.path().join("2024-02-22.log"), "recent\n").unwrap();
        fs::write(tmp.path().join("notes.log"), "keep\n").unwrap();

        let _writer = DailyFileWriter::open_at(tmp.path(), date("2024-03-02")).unwrap();

        assert!(!tmp.path().join("2024-02-15.log").exists());
        assert!(!tmp.path().join("2024-02-21.log").exists());
        assert!(tmp.path().join("2024-02-22.log").exists());
        assert!(tmp.path().join("notes.log").exists());
        assert!(tmp.path().join("2024-03-02.log").exists());
    }

    #[test]
    fn test_appends_to_existing_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("2024-03-01.log"), "earlier\n").unwrap();

        let writer = DailyFileWriter::open_at(tmp.path(), date("2024-03-01")).unwrap();
        writer.write_line_at("later", date("2024-03-01")).unwrap();

        assert_eq!(
            fs::read_to_string(tmp.path().join("2024-03-01.log")).unwrap(),
            "earlier\nlater\n"
        );
    }
}
