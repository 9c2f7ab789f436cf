use std::fmt;

/// The three kinds of task a participant goes through, in order.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TaskPhase {
    #[default]
    Practice,
    Main,
    Descriptor,
}

impl TaskPhase {
    /// Odd-one-out phases show a triple and expect a selection index.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Practice | Self::Main)
    }

    /// Practice responses never reach the data file.
    pub fn is_logged(&self) -> bool {
        !matches!(self, Self::Practice)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Main => "main",
            Self::Descriptor => "descriptor",
        }
    }
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_data_file() {
        assert_eq!(TaskPhase::Practice.to_string(), "practice");
        assert_eq!(TaskPhase::Main.to_string(), "main");
        assert_eq!(TaskPhase::Descriptor.as_str(), "descriptor");
    }

    #[test]
    fn only_practice_is_unlogged() {
        assert!(!TaskPhase::Practice.is_logged());
        assert!(TaskPhase::Main.is_logged());
        assert!(TaskPhase::Descriptor.is_logged());
        assert!(!TaskPhase::Descriptor.is_choice());
    }
}
