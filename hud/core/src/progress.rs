//! Texture pack download status.
//!
//! The host's downloader is polled once per frame through
//! [`ProgressSource`]; the reserved second status row shows the result.
//! [`FetchStatus`] remembers the last value so the row only re-rasterises
//! when the number actually moves.

/// State of the texture pack download, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Asking the server whether the pack changed.
    Checking,
    /// Transfer running, size not yet known.
    Fetching,
    /// Transfer running with a known completion percentage.
    Percent(u8),
}

/// A pollable view of the host's downloader. `None` means no transfer
/// is active and the status row should clear.
pub trait ProgressSource {
    /// Latest state, or `None` when idle.
    fn poll(&mut self) -> Option<Progress>;
}

/// Formats one status row for a download state.
pub fn format_progress(progress: Progress) -> String {
    match progress {
        Progress::Checking => "&eRetrieving texture pack..".to_string(),
        Progress::Fetching => "&eDownloading texture pack".to_string(),
        Progress::Percent(percent) => {
            format!("&eDownloading texture pack (&7{percent}&e%)")
        }
    }
}

/// Dedupe tracker for the download row.
#[derive(Debug, Default)]
pub struct FetchStatus {
    last: Option<Progress>,
    active: bool,
}

impl FetchStatus {
    /// Creates a tracker with no download seen yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one poll result. Returns the new row text when it changed:
    /// `Some(text)` to display, `Some("")` to clear, `None` to leave the
    /// row alone.
    pub fn row_update(&mut self, polled: Option<Progress>) -> Option<String> {
        match polled {
            Some(progress) => {
                if self.active && self.last == Some(progress) {
                    return None;
                }
                self.active = true;
                self.last = Some(progress);
                Some(format_progress(progress))
            }
            None => {
                if !self.active {
                    return None;
                }
                self.active = false;
                self.last = None;
                Some(String::new())
            }
        }
    }

    /// The row text to restore after a context recreation, if a
    /// download is mid-flight.
    pub fn current_row(&self) -> Option<String> {
        self.last.map(format_progress)
    }
}
