/// Phase definitions for the crawl loop
///
/// The coordinator moves through these phases in a fixed pattern; any other
/// move is a bug and is rejected.
use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Reading the resume cursor and opening a run
    Bootstrapping,

    /// Requesting the next listing page
    FetchingPage,

    /// Fetching and storing the accounts of the current page
    ProcessingRecord,

    /// Moving the cursor past the page just processed
    Advancing,

    // ===== Terminal Phases =====
    /// Ceiling reached or listing exhausted
    Done,

    /// Stopped on an unrecoverable error
    Failed,
}

impl CrawlPhase {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Checks whether moving from `self` to `next` is a legal step
    ///
    /// Any active phase may fail. `ProcessingRecord` repeats once per
    /// username of the page.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        if next == Failed {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Bootstrapping, FetchingPage)
                | (FetchingPage, ProcessingRecord)
                | (FetchingPage, Done)
                | (ProcessingRecord, ProcessingRecord)
                | (ProcessingRecord, Advancing)
                | (Advancing, FetchingPage)
                | (Advancing, Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bootstrapping => "bootstrapping",
            Self::FetchingPage => "fetching_page",
            Self::ProcessingRecord => "processing_record",
            Self::Advancing => "advancing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            CrawlPhase::Bootstrapping,
            CrawlPhase::FetchingPage,
            CrawlPhase::ProcessingRecord,
            CrawlPhase::ProcessingRecord,
            CrawlPhase::Advancing,
            CrawlPhase::FetchingPage,
            CrawlPhase::Done,
        ];

        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!CrawlPhase::Bootstrapping.can_transition_to(CrawlPhase::ProcessingRecord));
        assert!(!CrawlPhase::FetchingPage.can_transition_to(CrawlPhase::Advancing));
        assert!(!CrawlPhase::Advancing.can_transition_to(CrawlPhase::ProcessingRecord));
        assert!(!CrawlPhase::Done.can_transition_to(CrawlPhase::FetchingPage));
    }

    #[test]
    fn test_failure_only_from_active_phases() {
        assert!(CrawlPhase::Bootstrapping.can_transition_to(CrawlPhase::Failed));
        assert!(CrawlPhase::ProcessingRecord.can_transition_to(CrawlPhase::Failed));
        assert!(!CrawlPhase::Done.can_transition_to(CrawlPhase::Failed));
        assert!(!CrawlPhase::Failed.can_transition_to(CrawlPhase::Failed));
    }

    #[test]
    fn test_terminal_phases() {
        assert!(CrawlPhase::Done.is_terminal());
        assert!(CrawlPhase::Failed.is_terminal());
        assert!(!CrawlPhase::Advancing.is_terminal());
    }
}
