/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    /// Answered share in whole percent, saturating at 100.
    #[must_use]
    pub fn percent_answered(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let percent = self.answered * 100 / self.total;
        u8::try_from(percent.min(100)).unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_zero_for_empty_progress() {
        let progress = SessionProgress {
            total: 0,
            answered: 0,
            remaining: 0,
            is_complete: false,
        };
        assert_eq!(progress.percent_answered(), 0);
    }

    #[test]
    fn percent_rounds_down() {
        let progress = SessionProgress {
            total: 3,
            answered: 1,
            remaining: 2,
            is_complete: false,
        };
        assert_eq!(progress.percent_answered(), 33);
    }
}
