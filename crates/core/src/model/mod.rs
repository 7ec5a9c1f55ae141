mod ids;
mod progress;
mod question;

pub use ids::{ParseIdError, QuestionId};
pub use progress::{
    ProgressEntry, ProgressStats, SELF_REPORT_CORRECT, SELF_REPORT_INCORRECT,
};
pub use question::{
    DEFAULT_TOPIC, QUIZ_OPTION_COUNT, Question, QuestionDraft, QuestionKind,
    QuestionValidationError, ValidatedQuestion,
};
