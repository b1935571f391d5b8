/// Action renderer: dialogue acts to literal strings.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::vocab::{SlotVocabulary, VocabError};
use crate::schema::act::{
    ActParameter, DialogueAct, GoalValue, LexicalParameter, LexicalizedAct, SystemActKind, UserActKind,
    HAPPY_SLOT, NEED_SLOT,
};
use crate::schema::domain::DomainSpec;
use crate::schema::slot::{SlotSpec, ValueId, VALUE_PLACEHOLDER};

/// Lexical stand-in for an unconstrained value.
pub const DONT_CARE: &str = "dont_care";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unsupported act: {0}")]
    UnsupportedAct(String),
    #[error("malformed parameters for act '{act}': {reason}")]
    MalformedParameters { act: String, reason: String },
    #[error("unknown slot: {0}")]
    UnknownSlot(String),
    #[error("no phrases available for {0}")]
    EmptyPhraseSet(String),
    #[error("vocabulary error: {0}")]
    Vocab(#[from] VocabError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Fixed phrase sets for the system side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemPhrases {
    pub greet: Vec<String>,
    pub goodbye: Vec<String>,
    pub ask_repeat: Vec<String>,
    pub ask_rephrase: Vec<String>,
    pub clarify: Vec<String>,
    pub restart: Vec<String>,
    pub request_need: Vec<String>,
    pub request_happy: Vec<String>,
    /// `{value}` is the value being confirmed.
    pub explicit_confirm: Vec<String>,
    pub implicit_confirm: Vec<String>,
    pub explicit_confirm_dont_care: Vec<String>,
    pub implicit_confirm_dont_care: Vec<String>,
}

impl Default for SystemPhrases {
    fn default() -> Self {
        Self {
            greet: strings(&["Hello.", "Hi.", "Greetings.", "How are you doing?"]),
            goodbye: strings(&["Goodbye.", "See you next time."]),
            ask_repeat: strings(&["Can you please repeat that?", "What did you say?"]),
            ask_rephrase: strings(&[
                "Can you please rephrase that?",
                "Can you say it in another way?",
            ]),
            clarify: strings(&["I didn't catch you."]),
            restart: strings(&["We do not have any matches for you."]),
            request_need: strings(&["What can I do for you?", "What do you need?", "How can I help?"]),
            request_happy: strings(&[
                "What else can I do?",
                "Are you happy about my answer?",
                "Anything else?",
            ]),
            explicit_confirm: strings(&["Do you mean {value}?"]),
            implicit_confirm: strings(&["I believe you said {value}."]),
            explicit_confirm_dont_care: strings(&["Okay, you dont_care, do you?", "You dont_care, right?"]),
            implicit_confirm_dont_care: strings(&["Okay, you dont_care.", "Alright, dont_care."]),
        }
    }
}

/// Fixed phrase sets for the user side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPhrases {
    pub greet: Vec<String>,
    pub goodbye: Vec<String>,
    pub dont_care: Vec<String>,
    pub self_correct: Vec<String>,
    pub chat: Vec<String>,
    pub confirm: Vec<String>,
    pub disconfirm: Vec<String>,
    pub satisfy: Vec<String>,
    pub more_request: Vec<String>,
    pub new_search: Vec<String>,
    pub restart: Vec<String>,
}

impl Default for UserPhrases {
    fn default() -> Self {
        Self {
            greet: strings(&["Hi.", "Hello robot.", "What's up?"]),
            goodbye: strings(&["That's all.", "Thank you.", "See you."]),
            dont_care: strings(&["Anything is fine.", "I don't care.", "Whatever is good."]),
            self_correct: strings(&["Oh no,", "Uhm sorry,", "Oh sorry,"]),
            chat: strings(&["What's your name?", "Where are you from?"]),
            confirm: strings(&["Yes.", "Yep.", "Yeah.", "That's correct.", "Uh-huh."]),
            disconfirm: strings(&["No.", "Nope.", "Wrong.", "That's wrong.", "Nay."]),
            satisfy: strings(&["No more questions.", "I have all I need.", "All good."]),
            more_request: strings(&["I have more requests.", "One more thing.", "Not done yet."]),
            new_search: strings(&["I want to search a new one.", "New request.", "A new search."]),
            restart: strings(&[
                "No match found. Would you like to another?",
                "There is no restaurant matching your constraint. Please change your constraint and try again.",
            ]),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonPhrases {
    pub system: SystemPhrases,
    pub user: UserPhrases,
}

impl CommonPhrases {
    pub fn parse_ron(input: &str) -> Result<CommonPhrases, ron::error::SpannedError> {
        ron::from_str(input)
    }
}

/// Literal strings for one system turn, before advice is appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedActs {
    pub strings: Vec<String>,
    pub lexicalized: Vec<LexicalizedAct>,
    /// Searchable slot the system asked for in this turn, if any.
    pub requested: Option<String>,
}

pub struct ActionRenderer<'a> {
    domain: &'a DomainSpec,
    vocab: &'a SlotVocabulary,
    phrases: &'a CommonPhrases,
}

impl<'a> ActionRenderer<'a> {
    pub fn new(domain: &'a DomainSpec, vocab: &'a SlotVocabulary, phrases: &'a CommonPhrases) -> Self {
        Self {
            domain,
            vocab,
            phrases,
        }
    }

    pub fn render_system<R: Rng + ?Sized>(
        &self,
        acts: &[DialogueAct],
        rng: &mut R,
    ) -> Result<RenderedActs, RenderError> {
        let sys = &self.phrases.system;
        let mut rendered = RenderedActs::default();

        for act in acts {
            let kind = SystemActKind::from_tag(&act.act)
                .ok_or_else(|| RenderError::UnsupportedAct(act.act.clone()))?;
            let mut lexical = self.lexicalize(act)?;

            let text = match kind {
                SystemActKind::Greet => match &self.domain.greet {
                    Some(greet) => greet.clone(),
                    None => sample(rng, &sys.greet, "greet")?.to_string(),
                },
                SystemActKind::Goodbye => sample(rng, &sys.goodbye, "goodbye")?.to_string(),
                SystemActKind::AskRepeat => sample(rng, &sys.ask_repeat, "ask_repeat")?.to_string(),
                SystemActKind::AskRephrase => {
                    sample(rng, &sys.ask_rephrase, "ask_rephrase")?.to_string()
                }
                SystemActKind::Clarify => sample(rng, &sys.clarify, "clarify")?.to_string(),
                SystemActKind::Restart => sample(rng, &sys.restart, "restart")?.to_string(),
                SystemActKind::Query => {
                    let search = self.search_map(act, 0)?;
                    let goals = goals_param(act, 1)?;
                    serde_json::to_string(&serde_json::json!({
                        "QUERY": search,
                        "GOALS": goals,
                    }))?
                }
                SystemActKind::Inform => {
                    let goals = goal_values_param(act, 1)?;
                    let mut informs = Vec::with_capacity(goals.len());
                    for goal in goals {
                        let slot = self.sys_slot(&goal.slot)?;
                        let value = self.vocab.get_value(&goal.slot, goal.value)?;
                        let prefix = match goal.expected {
                            Some(expected) if expected == goal.value => "Yes, ",
                            Some(_) => "No, ",
                            None => "",
                        };
                        let phrase = slot
                            .sample_inform(rng)
                            .ok_or_else(|| RenderError::EmptyPhraseSet(format!("{} inform", goal.slot)))?;
                        informs.push(format!("{}{}", prefix, fill_value(phrase, value)));
                    }
                    lexical.parameters = vec![LexicalParameter::GoalValues(self.goal_map(goals)?)];
                    informs.join(" ")
                }
                SystemActKind::Request => {
                    let (slot, _) = slot_param(act, 0)?;
                    match slot {
                        NEED_SLOT => sample(rng, &sys.request_need, "request need")?.to_string(),
                        HAPPY_SLOT => sample(rng, &sys.request_happy, "request happy")?.to_string(),
                        _ => {
                            let target = self.usr_slot(slot)?;
                            rendered.requested = Some(slot.to_string());
                            target
                                .sample_request(rng)
                                .ok_or_else(|| RenderError::EmptyPhraseSet(format!("{} request", slot)))?
                                .to_string()
                        }
                    }
                }
                SystemActKind::ExplicitConfirm | SystemActKind::ImplicitConfirm => {
                    let explicit = kind == SystemActKind::ExplicitConfirm;
                    let (slot, value) = slot_param(act, 0)?;
                    let (text, lexical_value) = match value {
                        None => {
                            let set = if explicit {
                                &sys.explicit_confirm_dont_care
                            } else {
                                &sys.implicit_confirm_dont_care
                            };
                            (sample(rng, set, act.act.as_str())?.to_string(), DONT_CARE.to_string())
                        }
                        Some(id) => {
                            let set = if explicit {
                                &sys.explicit_confirm
                            } else {
                                &sys.implicit_confirm
                            };
                            let word = self.vocab.get_value(slot, id)?;
                            (fill_value(sample(rng, set, act.act.as_str())?, word), word.to_string())
                        }
                    };
                    lexical.parameters[0] = LexicalParameter::Slot {
                        slot: slot.to_string(),
                        value: Some(lexical_value),
                    };
                    text
                }
            };

            rendered.strings.push(text);
            rendered.lexicalized.push(lexical);
        }

        Ok(rendered)
    }

    pub fn render_user<R: Rng + ?Sized>(
        &self,
        acts: &[DialogueAct],
        rng: &mut R,
    ) -> Result<String, RenderError> {
        let usr = &self.phrases.user;
        let mut out = Vec::with_capacity(acts.len());

        for act in acts {
            let kind = UserActKind::from_tag(&act.act)
                .ok_or_else(|| RenderError::UnsupportedAct(act.act.clone()))?;

            let text = match kind {
                UserActKind::Greet => sample(rng, &usr.greet, "greet")?.to_string(),
                UserActKind::Goodbye => sample(rng, &usr.goodbye, "goodbye")?.to_string(),
                UserActKind::Chat => sample(rng, &usr.chat, "chat")?.to_string(),
                UserActKind::Confirm => sample(rng, &usr.confirm, "confirm")?.to_string(),
                UserActKind::Disconfirm => sample(rng, &usr.disconfirm, "disconfirm")?.to_string(),
                UserActKind::Satisfy => sample(rng, &usr.satisfy, "satisfy")?.to_string(),
                UserActKind::MoreRequest => sample(rng, &usr.more_request, "more_request")?.to_string(),
                UserActKind::NewSearch => sample(rng, &usr.new_search, "new_search")?.to_string(),
                UserActKind::KbReturn => {
                    let goals = goal_values_param(act, 1)?;
                    serde_json::to_string(&serde_json::json!({ "RET": self.goal_map(goals)? }))?
                }
                UserActKind::Restart => {
                    let notice = sample(rng, &usr.restart, "restart")?;
                    serde_json::to_string(&serde_json::json!({ "RET": notice }))?
                }
                UserActKind::Request => {
                    let (slot, _) = slot_param(act, 0)?;
                    self.sys_slot(slot)?
                        .sample_request(rng)
                        .ok_or_else(|| RenderError::EmptyPhraseSet(format!("{} request", slot)))?
                        .to_string()
                }
                UserActKind::Inform => {
                    let (slot, value) = slot_param(act, 0)?;
                    let target = self.usr_slot(slot)?;
                    let self_correct =
                        act.parameters.len() > 1 && act.parameters.last() == Some(&ActParameter::SelfCorrect);
                    if self_correct {
                        let wrong = target.sample_different(rng, value);
                        let wrong_utt = self.user_inform(target, wrong, rng)?;
                        let connector = sample(rng, &usr.self_correct, "self_correct")?.to_string();
                        let right_utt = self.user_inform(target, value, rng)?;
                        format!("{} {} {}", wrong_utt, connector, right_utt)
                    } else {
                        self.user_inform(target, value, rng)?
                    }
                }
                UserActKind::YnQuestion => {
                    let (slot, value) = slot_param(act, 0)?;
                    let id = value.ok_or_else(|| RenderError::MalformedParameters {
                        act: act.act.clone(),
                        reason: "yes/no question needs an expected value".to_string(),
                    })?;
                    let expected = self.vocab.get_value(slot, id)?;
                    self.sys_slot(slot)?.sample_yn_question(rng, expected)
                }
            };
            out.push(text);
        }

        Ok(out.join(" "))
    }

    fn user_inform<R: Rng + ?Sized>(
        &self,
        slot: &SlotSpec,
        value: Option<ValueId>,
        rng: &mut R,
    ) -> Result<String, RenderError> {
        match value {
            None => Ok(sample(rng, &self.phrases.user.dont_care, "dont_care")?.to_string()),
            Some(id) => {
                let word = self.vocab.get_value(&slot.name, id)?;
                let phrase = slot
                    .sample_inform(rng)
                    .ok_or_else(|| RenderError::EmptyPhraseSet(format!("{} inform", slot.name)))?;
                Ok(fill_value(phrase, word))
            }
        }
    }

    fn usr_slot(&self, name: &str) -> Result<&'a SlotSpec, RenderError> {
        self.domain
            .usr_slot(name)
            .ok_or_else(|| RenderError::UnknownSlot(name.to_string()))
    }

    fn sys_slot(&self, name: &str) -> Result<&'a SlotSpec, RenderError> {
        self.domain
            .sys_slot(name)
            .ok_or_else(|| RenderError::UnknownSlot(name.to_string()))
    }

    fn search_map(&self, act: &DialogueAct, index: usize) -> Result<BTreeMap<String, String>, RenderError> {
        match act.parameters.get(index) {
            Some(ActParameter::Constraints(constraints)) => self.lexical_constraints(constraints),
            _ => Err(malformed(act, index, "constraints")),
        }
    }

    fn lexical_constraints(
        &self,
        constraints: &[(String, Option<ValueId>)],
    ) -> Result<BTreeMap<String, String>, RenderError> {
        constraints
            .iter()
            .map(|(slot, value)| {
                let word = match value {
                    Some(id) => self.vocab.get_value(slot, *id)?.to_string(),
                    None => DONT_CARE.to_string(),
                };
                Ok((slot.clone(), word))
            })
            .collect()
    }

    fn goal_map(&self, goals: &[GoalValue]) -> Result<BTreeMap<String, String>, RenderError> {
        goals
            .iter()
            .map(|g| Ok((g.slot.clone(), self.vocab.get_value(&g.slot, g.value)?.to_string())))
            .collect()
    }

    /// Deep copy of `act` with ids replaced by lexical values.
    fn lexicalize(&self, act: &DialogueAct) -> Result<LexicalizedAct, RenderError> {
        let parameters = act
            .parameters
            .iter()
            .map(|param| {
                Ok(match param {
                    ActParameter::Slot { slot, value } => LexicalParameter::Slot {
                        slot: slot.clone(),
                        value: match value {
                            Some(id) => Some(self.vocab.get_value(slot, *id)?.to_string()),
                            None => None,
                        },
                    },
                    ActParameter::Constraints(c) => LexicalParameter::Search(self.lexical_constraints(c)?),
                    ActParameter::Goals(goals) => LexicalParameter::Goals(goals.clone()),
                    ActParameter::GoalValues(goals) => LexicalParameter::GoalValues(self.goal_map(goals)?),
                    ActParameter::SelfCorrect => LexicalParameter::SelfCorrect,
                })
            })
            .collect::<Result<Vec<_>, RenderError>>()?;

        Ok(LexicalizedAct {
            act: act.act.clone(),
            parameters,
        })
    }
}

fn sample<'p, R: Rng + ?Sized>(rng: &mut R, set: &'p [String], what: &str) -> Result<&'p str, RenderError> {
    set.choose(rng)
        .map(String::as_str)
        .ok_or_else(|| RenderError::EmptyPhraseSet(what.to_string()))
}

fn fill_value(phrase: &str, value: &str) -> String {
    phrase.replace(VALUE_PLACEHOLDER, value)
}

fn malformed(act: &DialogueAct, index: usize, expected: &str) -> RenderError {
    RenderError::MalformedParameters {
        act: act.act.clone(),
        reason: format!("expected {} at position {}", expected, index),
    }
}

fn slot_param(act: &DialogueAct, index: usize) -> Result<(&str, Option<ValueId>), RenderError> {
    match act.parameters.get(index) {
        Some(ActParameter::Slot { slot, value }) => Ok((slot.as_str(), *value)),
        _ => Err(malformed(act, index, "a slot/value pair")),
    }
}

fn goals_param(act: &DialogueAct, index: usize) -> Result<&[String], RenderError> {
    match act.parameters.get(index) {
        Some(ActParameter::Goals(goals)) => Ok(goals),
        _ => Err(malformed(act, index, "goal slots")),
    }
}

fn goal_values_param(
    act: &DialogueAct,
    index: usize,
) -> Result<&[GoalValue], RenderError> {
    match act.parameters.get(index) {
        Some(ActParameter::GoalValues(goals)) => Ok(goals),
        _ => Err(malformed(act, index, "goal values")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::slot::SlotPhrases;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn slot(name: &str, values: &[&str], inform: &[&str], request: &[&str]) -> SlotSpec {
        SlotSpec {
            name: name.to_string(),
            description: String::new(),
            vocabulary: strings(values),
            dirichlet_prior: Vec::new(),
            phrases: SlotPhrases {
                inform: strings(inform),
                request: strings(request),
                yn_question: HashMap::new(),
            },
        }
    }

    fn domain() -> DomainSpec {
        let mut open = slot("open", &["open", "closed"], &["It is {value} right now."], &["Is it open?"]);
        open.phrases
            .yn_question
            .insert("open".to_string(), strings(&["Is the restaurant open?"]));
        DomainSpec {
            name: "restaurant".to_string(),
            greet: None,
            usr_slots: vec![
                slot("food", &["italian", "thai"], &["I like {value} food."], &["What kind of food?"]),
                slot("area", &["centre", "north"], &["In {value}."], &["Which place?"]),
            ],
            sys_slots: vec![open],
            db_size: 10,
        }
    }

    fn setup() -> (DomainSpec, SlotVocabulary, CommonPhrases) {
        let domain = domain();
        let vocab = SlotVocabulary::from_slots(domain.usr_slots.iter().chain(&domain.sys_slots));
        (domain, vocab, CommonPhrases::default())
    }

    #[test]
    fn greet_prefers_domain_greeting() {
        let (mut domain, vocab, phrases) = setup();
        let mut rng = StdRng::seed_from_u64(1);
        let acts = [DialogueAct::system(SystemActKind::Greet)];
        let plain = ActionRenderer::new(&domain, &vocab, &phrases)
            .render_system(&acts, &mut rng)
            .unwrap();
        assert!(phrases.system.greet.contains(&plain.strings[0]));

        domain.greet = Some("Welcome to restaurant recommendation system.".to_string());
        let custom = ActionRenderer::new(&domain, &vocab, &phrases)
            .render_system(&acts, &mut rng)
            .unwrap();
        assert_eq!(custom.strings[0], "Welcome to restaurant recommendation system.");
    }

    #[test]
    fn request_marks_requested_slot() {
        let (domain, vocab, phrases) = setup();
        let renderer = ActionRenderer::new(&domain, &vocab, &phrases);
        let mut rng = StdRng::seed_from_u64(2);
        let out = renderer
            .render_system(&[DialogueAct::slot("request", "area", None)], &mut rng)
            .unwrap();
        assert_eq!(out.strings, vec!["Which place?".to_string()]);
        assert_eq!(out.requested.as_deref(), Some("area"));

        let need = renderer
            .render_system(&[DialogueAct::slot("request", NEED_SLOT, None)], &mut rng)
            .unwrap();
        assert!(phrases.system.request_need.contains(&need.strings[0]));
        assert_eq!(need.requested, None);
    }

    #[test]
    fn confirm_lexicalizes_value() {
        let (domain, vocab, phrases) = setup();
        let renderer = ActionRenderer::new(&domain, &vocab, &phrases);
        let mut rng = StdRng::seed_from_u64(3);
        let out = renderer
            .render_system(
                &[
                    DialogueAct::slot("explicit_confirm", "food", Some(ValueId(1))),
                    DialogueAct::slot("implicit_confirm", "area", None),
                ],
                &mut rng,
            )
            .unwrap();
        assert_eq!(out.strings[0], "Do you mean thai?");
        assert!(phrases.system.implicit_confirm_dont_care.contains(&out.strings[1]));
        assert_eq!(
            out.lexicalized[0].parameters[0],
            LexicalParameter::Slot {
                slot: "food".to_string(),
                value: Some("thai".to_string())
            }
        );
        assert_eq!(
            out.lexicalized[1].parameters[0],
            LexicalParameter::Slot {
                slot: "area".to_string(),
                value: Some(DONT_CARE.to_string())
            }
        );
    }

    #[test]
    fn query_renders_json() {
        let (domain, vocab, phrases) = setup();
        let act = DialogueAct::system(SystemActKind::Query)
            .with_param(ActParameter::Constraints(vec![
                ("food".to_string(), Some(ValueId(0))),
                ("area".to_string(), None),
            ]))
            .with_param(ActParameter::Goals(vec!["open".to_string()]));
        let mut rng = StdRng::seed_from_u64(4);
        let out = ActionRenderer::new(&domain, &vocab, &phrases)
            .render_system(&[act], &mut rng)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out.strings[0]).unwrap();
        assert_eq!(parsed["QUERY"]["food"], "italian");
        assert_eq!(parsed["QUERY"]["area"], DONT_CARE);
        assert_eq!(parsed["GOALS"][0], "open");
        assert!(matches!(
            out.lexicalized[0].parameters[0],
            LexicalParameter::Search(_)
        ));
    }

    #[test]
    fn inform_prefixes_expectation() {
        let (domain, vocab, phrases) = setup();
        let act = DialogueAct::system(SystemActKind::Inform)
            .with_param(ActParameter::Constraints(Vec::new()))
            .with_param(ActParameter::GoalValues(vec![GoalValue {
                slot: "open".to_string(),
                value: ValueId(1),
                expected: Some(ValueId(0)),
            }]));
        let mut rng = StdRng::seed_from_u64(5);
        let out = ActionRenderer::new(&domain, &vocab, &phrases)
            .render_system(&[act], &mut rng)
            .unwrap();
        assert_eq!(out.strings[0], "No, It is closed right now.");
        assert_eq!(out.lexicalized[0].parameters.len(), 1);
    }

    #[test]
    fn unknown_act_is_unsupported() {
        let (domain, vocab, phrases) = setup();
        let renderer = ActionRenderer::new(&domain, &vocab, &phrases);
        let mut rng = StdRng::seed_from_u64(6);
        assert!(matches!(
            renderer.render_system(&[DialogueAct::new("chat")], &mut rng),
            Err(RenderError::UnsupportedAct(_))
        ));
        assert!(matches!(
            renderer.render_user(&[DialogueAct::new("query")], &mut rng),
            Err(RenderError::UnsupportedAct(_))
        ));
    }

    #[test]
    fn malformed_parameters_rejected() {
        let (domain, vocab, phrases) = setup();
        let renderer = ActionRenderer::new(&domain, &vocab, &phrases);
        let mut rng = StdRng::seed_from_u64(6);
        assert!(matches!(
            renderer.render_system(&[DialogueAct::new("request")], &mut rng),
            Err(RenderError::MalformedParameters { .. })
        ));
    }

    #[test]
    fn user_inform_and_self_correct() {
        let (domain, vocab, phrases) = setup();
        let renderer = ActionRenderer::new(&domain, &vocab, &phrases);
        let mut rng = StdRng::seed_from_u64(7);
        let plain = renderer
            .render_user(&[DialogueAct::slot("inform", "food", Some(ValueId(0)))], &mut rng)
            .unwrap();
        assert_eq!(plain, "I like italian food.");

        let corrected = renderer
            .render_user(
                &[DialogueAct::slot("inform", "food", Some(ValueId(0))).with_param(ActParameter::SelfCorrect)],
                &mut rng,
            )
            .unwrap();
        assert!(corrected.starts_with("I like thai food. "));
        assert!(corrected.ends_with(" I like italian food."));

        let dont_care = renderer
            .render_user(&[DialogueAct::slot("inform", "area", None)], &mut rng)
            .unwrap();
        assert!(phrases.user.dont_care.contains(&dont_care));
    }

    #[test]
    fn user_yn_question_and_returns() {
        let (domain, vocab, phrases) = setup();
        let renderer = ActionRenderer::new(&domain, &vocab, &phrases);
        let mut rng = StdRng::seed_from_u64(8);
        let question = renderer
            .render_user(&[DialogueAct::slot("yn_question", "open", Some(ValueId(0)))], &mut rng)
            .unwrap();
        assert_eq!(question, "Is the restaurant open?");

        let ret = DialogueAct::user(UserActKind::KbReturn)
            .with_param(ActParameter::Constraints(Vec::new()))
            .with_param(ActParameter::GoalValues(vec![GoalValue {
                slot: "open".to_string(),
                value: ValueId(1),
                expected: None,
            }]));
        let out = renderer.render_user(&[ret], &mut rng).unwrap();
        assert_eq!(out, r#"{"RET":{"open":"closed"}}"#);

        let restart = renderer
            .render_user(&[DialogueAct::user(UserActKind::Restart)], &mut rng)
            .unwrap();
        assert!(restart.starts_with(r#"{"RET":""#));
    }

    #[test]
    fn user_acts_join_with_spaces() {
        let (domain, vocab, phrases) = setup();
        let renderer = ActionRenderer::new(&domain, &vocab, &phrases);
        let mut rng = StdRng::seed_from_u64(9);
        let out = renderer
            .render_user(
                &[
                    DialogueAct::user(UserActKind::Confirm),
                    DialogueAct::slot("request", "open", None),
                ],
                &mut rng,
            )
            .unwrap();
        assert!(out.ends_with(" Is it open?"));
    }

    #[test]
    fn phrases_override_from_ron() {
        let phrases = CommonPhrases::parse_ron(r#"(system: (greet: ["Howdy."]))"#).unwrap();
        assert_eq!(phrases.system.greet, vec!["Howdy.".to_string()]);
        assert!(!phrases.system.goodbye.is_empty());
        assert!(!phrases.user.confirm.is_empty());
    }
}
