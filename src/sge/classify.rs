//! Boolean job state signals derived from raw scheduler state codes.

/// The scheduler's canonical marker for a running job. Matching is exact and
/// case-sensitive; partial matches would misread codes like "Rr".
const RUNNING_MARKER: &str = "running";

/// Derives the running/errored signals from a job's raw state code.
///
/// Scheduler state codes are multi-character flag strings, and the presence
/// of an error flag anywhere in the code signals an error ("Eqw" is a queued
/// job that failed). The flag alphabet differs between scheduler families,
/// so the set is configuration, not a constant. The two signals are
/// independent: a job can be neither, either, or both.
#[derive(Debug, Clone)]
pub struct JobClassifier {
    error_flags: Vec<char>,
}

impl JobClassifier {
    pub fn new(error_flags: &str) -> Self {
        Self {
            error_flags: error_flags.chars().collect(),
        }
    }

    /// True iff the state code is exactly the running marker.
    pub fn is_running(&self, state: &str) -> bool {
        state == RUNNING_MARKER
    }

    /// True iff the state code carries any configured error flag.
    pub fn is_errored(&self, state: &str) -> bool {
        state.chars().any(|c| self.error_flags.contains(&c))
    }
}

impl Default for JobClassifier {
    fn default() -> Self {
        Self::new("E")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_state_is_running_and_clean() {
        let classifier = JobClassifier::default();
        assert!(classifier.is_running("running"));
        assert!(!classifier.is_errored("running"));
    }

    #[test]
    fn queued_waiting_is_neither() {
        let classifier = JobClassifier::default();
        assert!(!classifier.is_running("qw"));
        assert!(!classifier.is_errored("qw"));
    }

    #[test]
    fn error_flag_anywhere_marks_errored() {
        let classifier = JobClassifier::default();
        assert!(classifier.is_errored("Eqw"));
        assert!(classifier.is_errored("qwE"));
        assert!(!classifier.is_running("Eqw"));
    }

    #[test]
    fn running_match_is_exact() {
        let classifier = JobClassifier::default();
        assert!(!classifier.is_running("Running"));
        assert!(!classifier.is_running("running "));
        assert!(!classifier.is_running("run"));
    }

    #[test]
    fn flag_set_is_configurable() {
        let classifier = JobClassifier::new("Ea");
        assert!(classifier.is_errored("qa"));
        assert!(!JobClassifier::default().is_errored("qa"));
    }

    #[test]
    fn signals_are_independent() {
        // Nothing enforces mutual exclusion; a hypothetical errored running
        // marker would report both.
        let classifier = JobClassifier::new("g");
        assert!(classifier.is_running("running"));
        assert!(classifier.is_errored("running"));
    }
}
