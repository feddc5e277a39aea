//! Dialog scripts.
//!
//! A script is data: a table of steps keyed by step identifier, each with
//! exactly one [`StepAction`]. Requests are dispatched on the step named in
//! the URL, and every dispatch builds its reply through a fresh
//! [`DialogState`].

mod registry;

pub use registry::ScriptRegistry;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::dialog::render::resolve_url;
use crate::dialog::{AnswerPost, DialogError, DialogState};

/// Path segment answer targets use to point at another step of the script.
const QUESTIONS_SEGMENT: &str = "questions/";

const PARTY: &str = include_str!("party.json");

/// One answer choice of an `ask` step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Lookup identifier; defaults to `next`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    /// Step the choice leads to, or an absolute URL outside the script.
    pub next: String,
}

/// What a step does when it is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepAction {
    Ask {
        prompt: String,
        #[serde(default)]
        choices: Vec<Choice>,
        /// Unconditional next step, for prompts that do not branch.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<String>,
    },
    Say {
        text: String,
    },
    /// Hand the caller off to `url`. With `announce`, a plain visit says
    /// the announcement and only a posted reply is redirected.
    Redirect {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        announce: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogScript {
    pub name: String,
    /// Step served when the dialog starts.
    pub entry: String,
    /// Statement served for steps the script does not know.
    pub fallback: String,
    pub steps: BTreeMap<String, StepAction>,
}

impl DialogScript {
    pub fn from_json(json: &str) -> Result<Self> {
        let script: Self = serde_json::from_str(json).context("invalid dialog script")?;
        script.validate()?;
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("failed to load {}", path.display()))
    }

    /// The built-in birthday-party sample.
    pub fn party() -> Result<Self> {
        Self::from_json(PARTY)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("script has no name");
        }
        if !self.steps.contains_key(&self.entry) {
            bail!("{}: entry step `{}` is not defined", self.name, self.entry);
        }
        for (id, action) in &self.steps {
            match action {
                StepAction::Ask { choices, next, .. } if choices.is_empty() && next.is_none() => {
                    bail!("{}: ask step `{id}` has no choices and no next step", self.name);
                }
                StepAction::Ask { choices, .. } => {
                    if let Some(choice) = choices.iter().find(|c| c.next.trim().is_empty()) {
                        bail!("{}: choice `{}` of step `{id}` has no next step", self.name, choice.text);
                    }
                }
                StepAction::Redirect { url, .. } if url.trim().is_empty() => {
                    bail!("{}: redirect step `{id}` has no url", self.name);
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn step(&self, id: &str) -> Option<&StepAction> {
        self.steps.get(id)
    }

    /// Render the entry step.
    pub fn start(&self, state: &mut DialogState) -> Result<String, DialogError> {
        self.run(&self.entry, state)
    }

    /// Render step `id`, or the fallback statement when there is no such step.
    pub fn run(&self, id: &str, state: &mut DialogState) -> Result<String, DialogError> {
        match self.steps.get(id) {
            Some(action) => {
                debug!(script = %self.name, step = id, "running step");
                self.perform(action, state)
            }
            None => {
                warn!(script = %self.name, step = id, "unknown step");
                state.say(self.fallback.as_str())
            }
        }
    }

    /// Handle a reply posted to step `id`.
    ///
    /// When `id` is an ask step and the post names an answer, the answer is
    /// resolved against that step's question and its target is served.
    /// Otherwise step `id` is served as a reply, which differs from
    /// [`run`](Self::run) only for announced redirects.
    pub fn answer(
        &self,
        id: &str,
        post: &AnswerPost,
        state: &mut DialogState,
    ) -> Result<String, DialogError> {
        let Some(StepAction::Ask {
            prompt,
            choices,
            next,
        }) = self.steps.get(id)
        else {
            return self.follow(id, state);
        };
        if !post.is_answer() {
            return self.follow(id, state);
        }

        pose(prompt, choices, next.as_deref(), state)?;
        let target = match state.resolve_answer(post.answer_id.as_deref(), post.answer_text.as_deref())
        {
            Ok(answer) => answer.target.clone(),
            Err(e) => match next {
                Some(next) => target_for(next),
                None => return Err(e),
            },
        };
        debug!(script = %self.name, step = id, %target, "answer resolved");

        match step_for_target(state.base_url(), &target) {
            Some(step) => self.follow(step, state),
            None => Ok(state.redirect(&resolve_url(state.base_url(), &target))),
        }
    }

    /// Text of answer `answer_id` of the entry question.
    pub fn answer_text(&self, answer_id: &str, state: &mut DialogState) -> Result<String, DialogError> {
        if let Some(StepAction::Ask {
            prompt,
            choices,
            next,
        }) = self.steps.get(&self.entry)
        {
            pose(prompt, choices, next.as_deref(), state)?;
        }
        state.lookup_answer_text(answer_id).map(str::to_string)
    }

    /// Serve step `id` in reply to a post: redirects always redirect.
    fn follow(&self, id: &str, state: &mut DialogState) -> Result<String, DialogError> {
        match self.steps.get(id) {
            Some(StepAction::Redirect { url, .. }) => {
                debug!(script = %self.name, step = id, "following redirect");
                Ok(state.redirect(&resolve_url(state.base_url(), url)))
            }
            _ => self.run(id, state),
        }
    }

    fn perform(&self, action: &StepAction, state: &mut DialogState) -> Result<String, DialogError> {
        match action {
            StepAction::Ask {
                prompt,
                choices,
                next,
            } => {
                pose(prompt, choices, next.as_deref(), state)?;
                state.end_dialog()
            }
            StepAction::Say { text } => state.say(text.as_str()),
            StepAction::Redirect {
                announce: Some(text),
                ..
            } => state.say(text.as_str()),
            StepAction::Redirect { url, .. } => {
                Ok(state.redirect(&resolve_url(state.base_url(), url)))
            }
        }
    }
}

/// Build an ask step's question in `state` without rendering it.
fn pose(
    prompt: &str,
    choices: &[Choice],
    next: Option<&str>,
    state: &mut DialogState,
) -> Result<(), DialogError> {
    let next = next.map(target_for);
    state.ask(prompt, next.as_deref());
    for choice in choices {
        let id = choice.id.as_deref().unwrap_or(&choice.next);
        state.add_answer_with_id(id, choice.text.as_str(), target_for(&choice.next))?;
    }
    Ok(())
}

/// Answer target for `next`: absolute URLs are kept, anything else names a step.
fn target_for(next: &str) -> String {
    if next.starts_with("http://") || next.starts_with("https://") {
        next.to_string()
    } else {
        format!("{QUESTIONS_SEGMENT}{next}")
    }
}

/// Step a target points at, if it points inside this script.
fn step_for_target<'t>(base_url: &str, target: &'t str) -> Option<&'t str> {
    let relative = target
        .strip_prefix(base_url)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(target);
    relative
        .strip_prefix(QUESTIONS_SEGMENT)
        .filter(|step| !step.is_empty())
}
