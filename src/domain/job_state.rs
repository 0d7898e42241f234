use std::fmt;
use std::str::FromStr;

/// Pipeline phase of a voice note. States only ever advance; `Failed` is
/// reachable from every state except `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Pending,
    Transcribed,
    AwaitingLanguageChoice,
    LanguageSelected,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Transcribed => "transcribed",
            JobState::AwaitingLanguageChoice => "awaiting_language_choice",
            JobState::LanguageSelected => "language_selected",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            JobState::Pending => 0,
            JobState::Transcribed => 1,
            JobState::AwaitingLanguageChoice => 2,
            JobState::LanguageSelected => 3,
            JobState::Completed => 4,
            JobState::Failed => 5,
        }
    }

    /// Whether moving to `next` respects the monotonic transition graph.
    pub fn can_advance_to(&self, next: JobState) -> bool {
        match (self, next) {
            (JobState::Completed, _) => false,
            (JobState::Failed, _) => false,
            (_, JobState::Failed) => true,
            (current, next) => next.rank() > current.rank(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobState::Pending),
            "transcribed" => Ok(JobState::Transcribed),
            "awaiting_language_choice" => Ok(JobState::AwaitingLanguageChoice),
            "language_selected" => Ok(JobState::LanguageSelected),
            "completed" => Ok(JobState::Completed),
            "failed" => Ok(JobState::Failed),
            _ => Err(format!("Invalid job state: {}", s)),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
