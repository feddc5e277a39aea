//! Rendering questions into the dialog platform's wire format.

use serde::Serialize;
use url::Url;

use super::{DialogError, Question, QuestionKind};
use crate::consts::TEXT_SCHEME;

/// Turns a question into the payload the platform consumes.
///
/// `base_url` is the root that relative answer targets resolve against.
pub trait QuestionSerializer: Send + Sync {
    fn serialize(&self, question: &Question, base_url: &str) -> Result<String, DialogError>;
}

/// The platform's canonical JSON question format.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformJson;

#[derive(Serialize)]
struct WireQuestion<'a> {
    question_id: &'a str,
    question_text: String,
    #[serde(rename = "type")]
    kind: QuestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    answers: Vec<WireAnswer<'a>>,
}

#[derive(Serialize)]
struct WireAnswer<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    answer_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer_text: Option<String>,
    callback: String,
}

impl QuestionSerializer for PlatformJson {
    fn serialize(&self, question: &Question, base_url: &str) -> Result<String, DialogError> {
        let kind = question.kind.ok_or(DialogError::NoPendingQuestion)?;
        let answers = question
            .answers
            .iter()
            .map(|answer| WireAnswer {
                answer_id: answer.identifier.as_deref(),
                answer_text: answer.text.as_deref().map(text_url),
                callback: resolve_url(base_url, &answer.target),
            })
            .collect();

        let wire = WireQuestion {
            question_id: &question.identifier,
            question_text: text_url(&question.text),
            kind,
            url: question.url.as_deref().map(|url| resolve_url(base_url, url)),
            answers,
        };

        serde_json::to_string(&wire).map_err(|e| DialogError::Serialization(e.to_string()))
    }
}

/// Renders questions through a [`QuestionSerializer`].
pub struct DialogRenderer {
    serializer: Box<dyn QuestionSerializer>,
}

impl Default for DialogRenderer {
    fn default() -> Self {
        Self::new(PlatformJson)
    }
}

impl DialogRenderer {
    pub fn new(serializer: impl QuestionSerializer + 'static) -> Self {
        Self {
            serializer: Box::new(serializer),
        }
    }

    /// Render `question`. Serializer failures are passed through as-is.
    pub fn end_dialog(&self, question: &Question, base_url: &str) -> Result<String, DialogError> {
        match question.kind {
            None => return Err(DialogError::NoPendingQuestion),
            Some(QuestionKind::Closed) if question.answers.is_empty() => {
                return Err(DialogError::NoAnswers(question.identifier.clone()));
            }
            Some(_) => {}
        }
        self.serializer.serialize(question, base_url)
    }

    /// Referral payload handing the caller off to `url`.
    pub fn redirect(url: &str) -> String {
        serde_json::json!({
            "type": QuestionKind::Referral,
            "url": url,
        })
        .to_string()
    }
}

/// Resolve `target` against `base_url`, treating the base as a directory.
///
/// Absolute targets, and anything that cannot be resolved, come back unchanged.
pub fn resolve_url(base_url: &str, target: &str) -> String {
    if Url::parse(target).is_ok() {
        return target.to_string();
    }
    let Ok(mut base) = Url::parse(base_url) else {
        return target.to_string();
    };
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(target)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| target.to_string())
}

/// Inline text goes over the wire as `text://...`; links are passed as-is.
fn text_url(text: &str) -> String {
    const LINKED: [&str; 3] = ["http://", "https://", TEXT_SCHEME];
    if LINKED.iter().any(|prefix| text.starts_with(prefix)) {
        text.to_string()
    } else {
        format!("{TEXT_SCHEME}{text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::Answer;

    fn closed(answers: Vec<Answer>) -> Question {
        Question {
            identifier: "1".to_string(),
            text: "Coming?".to_string(),
            kind: Some(QuestionKind::Closed),
            answers,
            url: None,
        }
    }

    fn render(question: &Question) -> serde_json::Value {
        let payload = DialogRenderer::default()
            .end_dialog(question, "https://x/y")
            .unwrap();
        serde_json::from_str(&payload).unwrap()
    }

    #[test]
    fn closed_question_lists_answers_in_order() {
        let json = render(&closed(vec![
            Answer::new("Yup", "questions/10").with_identifier("10"),
            Answer::new("Nope", "questions/11"),
        ]));

        assert_eq!(json["question_id"], "1");
        assert_eq!(json["question_text"], "text://Coming?");
        assert_eq!(json["type"], "closed");
        assert_eq!(json["answers"][0]["answer_id"], "10");
        assert_eq!(json["answers"][0]["answer_text"], "text://Yup");
        assert_eq!(json["answers"][0]["callback"], "https://x/y/questions/10");
        assert!(json["answers"][1].get("answer_id").is_none());
        assert_eq!(json["answers"][1]["callback"], "https://x/y/questions/11");
    }

    #[test]
    fn unlabeled_answer_has_no_text() {
        let json = render(&closed(vec![Answer::unlabeled("https://a/next")]));
        assert!(json["answers"][0].get("answer_text").is_none());
        assert_eq!(json["answers"][0]["callback"], "https://a/next");
    }

    #[test]
    fn comment_has_empty_answers() {
        let json = render(&Question::comment("Bye"));
        assert_eq!(json["type"], "comment");
        assert_eq!(json["answers"], serde_json::json!([]));
        assert!(json.get("url").is_none());
    }

    #[test]
    fn referral_question_carries_url() {
        let question = Question {
            kind: Some(QuestionKind::Referral),
            url: Some("/questionanswer".to_string()),
            ..closed(Vec::new())
        };
        let json = render(&question);
        assert_eq!(json["type"], "referral");
        assert_eq!(json["url"], "https://x/questionanswer");
    }

    #[test]
    fn closed_without_answers_is_rejected() {
        let err = DialogRenderer::default()
            .end_dialog(&closed(Vec::new()), "https://x/y")
            .unwrap_err();
        assert_eq!(err, DialogError::NoAnswers("1".to_string()));
    }

    #[test]
    fn serializer_errors_propagate() {
        struct Failing;
        impl QuestionSerializer for Failing {
            fn serialize(&self, _: &Question, _: &str) -> Result<String, DialogError> {
                Err(DialogError::Serialization("boom".to_string()))
            }
        }

        let err = DialogRenderer::new(Failing)
            .end_dialog(&Question::comment("Bye"), "https://x/y")
            .unwrap_err();
        assert_eq!(err, DialogError::Serialization("boom".to_string()));
    }

    #[test]
    fn custom_serializer_receives_base_url() {
        struct Echo;
        impl QuestionSerializer for Echo {
            fn serialize(&self, question: &Question, base_url: &str) -> Result<String, DialogError> {
                Ok(format!("{base_url}#{}", question.text))
            }
        }

        let payload = DialogRenderer::new(Echo)
            .end_dialog(&Question::comment("Bye"), "https://x/y")
            .unwrap();
        assert_eq!(payload, "https://x/y#Bye");
    }

    // The platform matches question types by their lowercase names, the
    // same vocabulary as "closed" and "comment". Do not capitalize.
    #[test]
    fn redirect_type_is_platform_referral_name() {
        let json: serde_json::Value =
            serde_json::from_str(&DialogRenderer::redirect("https://x/y")).unwrap();
        assert_eq!(json["type"], "referral");
        assert_eq!(json["type"], QuestionKind::Referral.as_str());
    }

    #[test]
    fn redirect_is_two_key_referral() {
        let payload = DialogRenderer::redirect("https://x/questionanswer");
        assert_eq!(
            payload,
            r#"{"type":"referral","url":"https://x/questionanswer"}"#
        );
        assert_eq!(payload, DialogRenderer::redirect("https://x/questionanswer"));
    }

    #[test]
    fn resolve_url_keeps_absolute_targets() {
        assert_eq!(
            resolve_url("https://x/y", "http://other/q?a=1"),
            "http://other/q?a=1"
        );
    }

    #[test]
    fn resolve_url_treats_base_as_directory() {
        assert_eq!(resolve_url("https://x/y", "questions/10"), "https://x/y/questions/10");
        assert_eq!(resolve_url("https://x/y/", "questions/10"), "https://x/y/questions/10");
    }

    #[test]
    fn resolve_url_rooted_target_replaces_path() {
        assert_eq!(resolve_url("https://x/y", "/questionanswer"), "https://x/questionanswer");
    }

    #[test]
    fn resolve_url_with_unparsable_base_returns_target() {
        assert_eq!(resolve_url("not a url", "questions/10"), "questions/10");
    }

    #[test]
    fn text_url_leaves_links_alone() {
        assert_eq!(text_url("http://audio/1.wav"), "http://audio/1.wav");
        assert_eq!(text_url("text://already"), "text://already");
        assert_eq!(text_url("Note: hi"), "text://Note: hi");
    }
}
