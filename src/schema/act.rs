use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::slot::ValueId;

/// Meta slot the system requests to open a dialogue ("What can I do for you?").
pub const NEED_SLOT: &str = "need";
/// Meta slot the system requests to close one ("Anything else?").
pub const HAPPY_SLOT: &str = "happy";

/// Acts the simulated system can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemActKind {
    Greet,
    Goodbye,
    AskRepeat,
    AskRephrase,
    Clarify,
    Restart,
    Request,
    ExplicitConfirm,
    ImplicitConfirm,
    Inform,
    Query,
}

impl SystemActKind {
    pub const ALL: [SystemActKind; 11] = [
        Self::Greet,
        Self::Goodbye,
        Self::AskRepeat,
        Self::AskRephrase,
        Self::Clarify,
        Self::Restart,
        Self::Request,
        Self::ExplicitConfirm,
        Self::ImplicitConfirm,
        Self::Inform,
        Self::Query,
    ];

    /// Returns the wire tag for this act (e.g., "explicit_confirm").
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Greet => "greet",
            Self::Goodbye => "goodbye",
            Self::AskRepeat => "ask_repeat",
            Self::AskRephrase => "ask_rephrase",
            Self::Clarify => "clarify",
            Self::Restart => "restart",
            Self::Request => "request",
            Self::ExplicitConfirm => "explicit_confirm",
            Self::ImplicitConfirm => "implicit_confirm",
            Self::Inform => "inform",
            Self::Query => "query",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

/// Acts the simulated user can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserActKind {
    Greet,
    Goodbye,
    Request,
    Inform,
    Chat,
    YnQuestion,
    Confirm,
    Disconfirm,
    Satisfy,
    MoreRequest,
    NewSearch,
    Restart,
    KbReturn,
}

impl UserActKind {
    pub const ALL: [UserActKind; 13] = [
        Self::Greet,
        Self::Goodbye,
        Self::Request,
        Self::Inform,
        Self::Chat,
        Self::YnQuestion,
        Self::Confirm,
        Self::Disconfirm,
        Self::Satisfy,
        Self::MoreRequest,
        Self::NewSearch,
        Self::Restart,
        Self::KbReturn,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Greet => "greet",
            Self::Goodbye => "goodbye",
            Self::Request => "request",
            Self::Inform => "inform",
            Self::Chat => "chat",
            Self::YnQuestion => "yn_question",
            Self::Confirm => "confirm",
            Self::Disconfirm => "disconfirm",
            Self::Satisfy => "satisfy",
            Self::MoreRequest => "more_request",
            Self::NewSearch => "new_search",
            Self::Restart => "restart",
            Self::KbReturn => "kb_return",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

/// One goal value reported back to the user, with the value the user
/// expected when they asked a yes/no question about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalValue {
    pub slot: String,
    pub value: ValueId,
    #[serde(default)]
    pub expected: Option<ValueId>,
}

/// A positional act parameter. Which shapes appear at which position
/// depends on the act kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActParameter {
    /// A slot and its value; `None` means "don't care" or "not yet known".
    Slot { slot: String, value: Option<ValueId> },
    /// Query constraints over searchable slots.
    Constraints(Vec<(String, Option<ValueId>)>),
    /// Requested goal slots.
    Goals(Vec<String>),
    /// Goal slots with their values.
    GoalValues(Vec<GoalValue>),
    /// Marks a user inform that first states a wrong value, then corrects it.
    SelfCorrect,
}

/// A dialogue act as produced by the simulated agents: a kind tag plus
/// positional parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueAct {
    pub act: String,
    #[serde(default)]
    pub parameters: Vec<ActParameter>,
}

impl DialogueAct {
    pub fn new(act: impl Into<String>) -> Self {
        Self {
            act: act.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: ActParameter) -> Self {
        self.parameters.push(param);
        self
    }

    /// Shorthand for an act whose first parameter is a slot/value pair.
    pub fn slot(act: impl Into<String>, slot: impl Into<String>, value: Option<ValueId>) -> Self {
        Self::new(act).with_param(ActParameter::Slot {
            slot: slot.into(),
            value,
        })
    }

    pub fn system(kind: SystemActKind) -> Self {
        Self::new(kind.tag())
    }

    pub fn user(kind: UserActKind) -> Self {
        Self::new(kind.tag())
    }
}

/// A parameter with value ids replaced by their lexical values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LexicalParameter {
    Slot { slot: String, value: Option<String> },
    /// Query constraints; unconstrained slots read `"dont_care"`.
    Search(BTreeMap<String, String>),
    Goals(Vec<String>),
    GoalValues(BTreeMap<String, String>),
    SelfCorrect,
}

/// A deep copy of a rendered act with its parameters lexicalized, kept for
/// downstream logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexicalizedAct {
    pub act: String,
    pub parameters: Vec<LexicalParameter>,
}
