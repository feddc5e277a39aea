//! The single-active-question dialog model.
//!
//! A [`DialogState`] holds exactly one pending [`Question`]. Callers build it
//! up with [`DialogState::ask`] and [`DialogState::add_answer`], or replace it
//! with a terminal statement via [`DialogState::say`], then render it with
//! [`DialogState::end_dialog`]. One state belongs to one conversation turn;
//! it is never shared between requests.

pub mod post;
pub mod render;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub use post::AnswerPost;
pub use render::{DialogRenderer, PlatformJson, QuestionSerializer};

use crate::consts::INITIAL_QUESTION_ID;

/// How the platform should treat a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Terminal statement. No answers.
    Comment,
    /// Pick one of a finite set of answers.
    Closed,
    /// Hand off to another resource.
    Referral,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Closed => "closed",
            Self::Referral => "referral",
        }
    }

    /// Only closed questions carry answer choices.
    pub fn takes_answers(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One answer choice, pointing at the next step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub identifier: Option<String>,
    pub text: Option<String>,
    /// Absolute or relative URL of the next question.
    pub target: String,
}

impl Answer {
    pub fn new(text: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            identifier: None,
            text: Some(text.into()),
            target: target.into(),
        }
    }

    /// An answer with neither text nor identifier, used for "continue" flows.
    pub fn unlabeled(target: impl Into<String>) -> Self {
        Self {
            identifier: None,
            text: None,
            target: target.into(),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

/// The pending question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub identifier: String,
    pub text: String,
    /// `None` while the dialog is idle (nothing asked yet).
    pub kind: Option<QuestionKind>,
    pub answers: Vec<Answer>,
    /// Referral target; only set for [`QuestionKind::Referral`].
    pub url: Option<String>,
}

impl Question {
    fn placeholder() -> Self {
        Self {
            identifier: INITIAL_QUESTION_ID.to_string(),
            text: String::new(),
            kind: None,
            answers: Vec::new(),
            url: None,
        }
    }

    /// A terminal statement with a freshly generated identifier.
    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            identifier: Uuid::new_v4().to_string(),
            text: text.into(),
            kind: Some(QuestionKind::Comment),
            answers: Vec::new(),
            url: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.kind.is_some()
    }
}

/// Coarse classification callers map to transport statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request cannot be honoured in the current state (HTTP 406).
    NotAcceptable,
    /// Rendering failed (HTTP 500).
    Internal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DialogError {
    #[error("no question is pending")]
    NoPendingQuestion,

    #[error("{0} questions do not take answers")]
    AnswersNotAccepted(QuestionKind),

    #[error("an answer needs a target")]
    MissingTarget,

    #[error("no answer matches `{0}`")]
    NoSuchAnswer(String),

    #[error("closed question `{0}` has no answers")]
    NoAnswers(String),

    #[error("failed to serialize question: {0}")]
    Serialization(String),
}

impl DialogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoPendingQuestion
            | Self::AnswersNotAccepted(_)
            | Self::MissingTarget
            | Self::NoSuchAnswer(_) => ErrorKind::NotAcceptable,
            Self::NoAnswers(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }
}

/// Owns the pending question of one dialog turn.
pub struct DialogState {
    question: Question,
    base_url: String,
    renderer: DialogRenderer,
}

impl DialogState {
    /// Start an idle dialog rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_renderer(base_url, DialogRenderer::default())
    }

    pub fn with_renderer(base_url: impl Into<String>, renderer: DialogRenderer) -> Self {
        Self {
            question: Question::placeholder(),
            base_url: base_url.into(),
            renderer,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    /// Turn the pending question into a closed question with `prompt`.
    ///
    /// Prior answers are dropped. With `next`, the question gets a single
    /// unlabeled answer leading there, for flows that do not branch.
    pub fn ask(&mut self, prompt: impl Into<String>, next: Option<&str>) {
        self.question.text = prompt.into();
        self.question.kind = Some(QuestionKind::Closed);
        self.question.url = None;
        self.question.answers = next.map(Answer::unlabeled).into_iter().collect();
    }

    /// Turn the pending question into a referral to `url`.
    pub fn refer(&mut self, text: impl Into<String>, url: impl Into<String>) {
        self.question.text = text.into();
        self.question.kind = Some(QuestionKind::Referral);
        self.question.url = Some(url.into());
        self.question.answers.clear();
    }

    /// Append an answer to the pending question and return all answers so far.
    pub fn add_answer(
        &mut self,
        text: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<&[Answer], DialogError> {
        self.push_answer(Answer::new(text, target))
    }

    /// Like [`add_answer`](Self::add_answer), with an identifier the answer
    /// can later be looked up by.
    pub fn add_answer_with_id(
        &mut self,
        identifier: impl Into<String>,
        text: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<&[Answer], DialogError> {
        self.push_answer(Answer::new(text, target).with_identifier(identifier))
    }

    fn push_answer(&mut self, answer: Answer) -> Result<&[Answer], DialogError> {
        let kind = self.question.kind.ok_or(DialogError::NoPendingQuestion)?;
        if !kind.takes_answers() {
            return Err(DialogError::AnswersNotAccepted(kind));
        }
        if answer.target.trim().is_empty() {
            return Err(DialogError::MissingTarget);
        }
        self.question.answers.push(answer);
        Ok(&self.question.answers)
    }

    /// Replace the pending question with a terminal statement and render it.
    pub fn say(&mut self, text: impl Into<String>) -> Result<String, DialogError> {
        self.question = Question::comment(text);
        self.end_dialog()
    }

    /// Hand the caller off to `url`. Leaves the pending question untouched.
    pub fn redirect(&self, url: &str) -> String {
        DialogRenderer::redirect(url)
    }

    /// Render the pending question.
    pub fn end_dialog(&self) -> Result<String, DialogError> {
        self.renderer.end_dialog(&self.question, &self.base_url)
    }

    /// Text of the first answer whose identifier is `identifier`.
    pub fn lookup_answer_text(&self, identifier: &str) -> Result<&str, DialogError> {
        self.lookup_answer_by_id(identifier)
            .and_then(|answer| answer.text.as_deref())
            .ok_or_else(|| DialogError::NoSuchAnswer(identifier.to_string()))
    }

    /// First answer whose text is exactly `text`.
    pub fn lookup_answer_by_text(&self, text: &str) -> Option<&Answer> {
        self.question
            .answers
            .iter()
            .find(|answer| answer.text.as_deref() == Some(text))
    }

    fn lookup_answer_by_id(&self, identifier: &str) -> Option<&Answer> {
        self.question
            .answers
            .iter()
            .find(|answer| answer.identifier.as_deref() == Some(identifier))
    }

    /// Resolve a reply to one of the pending answers.
    ///
    /// The identifier wins when given; free text is only consulted without one.
    pub fn resolve_answer(
        &self,
        identifier: Option<&str>,
        text: Option<&str>,
    ) -> Result<&Answer, DialogError> {
        match (identifier, text) {
            (Some(id), _) => self
                .lookup_answer_by_id(id)
                .ok_or_else(|| DialogError::NoSuchAnswer(id.to_string())),
            (None, Some(text)) => self
                .lookup_answer_by_text(text)
                .ok_or_else(|| DialogError::NoSuchAnswer(text.to_string())),
            (None, None) => Err(DialogError::NoSuchAnswer(String::new())),
        }
    }
}
