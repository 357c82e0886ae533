//! Rotating text file log sink implementation.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use parking_lot::Mutex;

use crate::sink::LogSink;
use crate::{CommSyncError, FileLogConfig};

/// Directory under the local data dir that holds the log.
const APP_DIR_NAME: &str = "AudioSync";

/// Log file name.
const LOG_FILE_NAME: &str = "log.txt";

/// Lines end the way local text editors expect.
const LINE_ENDING: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Returns `<local data dir>/AudioSync/log.txt`, if the platform has a local data dir.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_DIR_NAME).join(LOG_FILE_NAME))
}

/// A sink that appends timestamped lines to a text file.
///
/// Each line is written as `[YYYY-MM-DD HH:MM:SS] message` in local time.
/// The file is opened per line and never held open. At most once per
/// [`FileLogConfig::rotate_check_interval`] the size is checked, and a file
/// larger than [`FileLogConfig::max_size`] is moved to `<file>.old`,
/// replacing any previous one.
///
/// # Example
///
/// ```no_run
/// use comm_sync::{default_log_path, FileLogSink};
///
/// if let Some(path) = default_log_path() {
///     let sink = FileLogSink::open(path)?;
///     // Use with SyncService builder...
/// }
/// # Ok::<(), comm_sync::CommSyncError>(())
/// ```
pub struct FileLogSink {
    name: String,
    path: PathBuf,
    config: FileLogConfig,
    last_rotate_check: Mutex<Option<Instant>>,
}

impl FileLogSink {
    /// Opens a log at `path`, creating its parent directory.
    ///
    /// # Errors
    ///
    /// Returns `LogFile` if the parent directory cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CommSyncError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CommSyncError::log_file(parent, e))?;
        }
        Ok(Self {
            name: format!("file:{}", path.display()),
            path,
            config: FileLogConfig::default(),
            last_rotate_check: Mutex::new(None),
        })
    }

    /// Sets the rotation settings.
    #[must_use]
    pub fn with_config(mut self, config: FileLogConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the path of the live log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path the log is rotated to.
    pub fn rotated_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".old");
        PathBuf::from(name)
    }

    fn rotate_if_due(&self) {
        let now = Instant::now();
        {
            let mut last = self.last_rotate_check.lock();
            if let Some(previous) = *last {
                if now.duration_since(previous) < self.config.rotate_check_interval {
                    return;
                }
            }
            *last = Some(now);
        }

        if let Err(e) = self.rotate() {
            tracing::warn!(path = %self.path.display(), error = %e, "log rotation failed");
        }
    }

    fn rotate(&self) -> std::io::Result<()> {
        let size = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        if size <= self.config.max_size {
            return Ok(());
        }

        let old = self.rotated_path();
        if old.exists() {
            fs::remove_file(&old)?;
        }
        fs::rename(&self.path, &old)
    }

    fn append(&self, message: &str) -> std::io::Result<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write!(file, "[{timestamp}] {message}{LINE_ENDING}")
    }
}

impl LogSink for FileLogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn log(&self, message: &str) {
        self.rotate_if_due();
        if let Err(e) = self.append(message) {
            tracing::warn!(path = %self.path.display(), error = %e, "log write failed");
        }
    }
}
