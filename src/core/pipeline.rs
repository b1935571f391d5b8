/// The dialogue NLG pipeline: acts and belief state in, utterance out.
///
/// Owns the domain, vocabulary, database and template table, and wires the
/// action renderer to advice ranking and template selection.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::advice::{AdviceEngine, DEFAULT_ADVICE_LIMIT};
use crate::core::advice_nlg::{AdviceClause, AdviceTemplateSelector};
use crate::core::database::{DatabaseError, RelationRecord, Selection, SyntheticDatabase};
use crate::core::render::{ActionRenderer, CommonPhrases, RenderError};
use crate::core::stats::StatRow;
use crate::core::templates::{TemplateError, TemplateTable};
use crate::core::vocab::SlotVocabulary;
use crate::schema::act::{DialogueAct, LexicalizedAct};
use crate::schema::belief::BeliefState;
use crate::schema::domain::{DomainError, DomainSpec};
use crate::schema::slot::ValueId;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("no domain configured")]
    MissingDomain,
    #[error("belief has {got} slots, domain has {expected}")]
    BeliefArity { expected: usize, got: usize },
}

/// One rendered system turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemUtterance {
    pub text: String,
    pub lexicalized: Vec<LexicalizedAct>,
    pub advice: AdviceClause,
}

/// The top-level engine. Built via `DialogueNlg::builder()`.
pub struct DialogueNlg {
    domain: DomainSpec,
    vocab: SlotVocabulary,
    database: SyntheticDatabase,
    templates: TemplateTable,
    phrases: CommonPhrases,
    advice_enabled: bool,
    advice_limit: usize,
    rng: StdRng,
}

pub struct DialogueNlgBuilder {
    seed: u64,
    domain_path: Option<PathBuf>,
    domain: Option<DomainSpec>,
    templates_paths: Vec<PathBuf>,
    templates: Option<TemplateTable>,
    phrases_path: Option<PathBuf>,
    phrases: Option<CommonPhrases>,
    relation_path: Option<PathBuf>,
    relation: Option<Vec<RelationRecord>>,
    num_rows: Option<usize>,
    advice_enabled: bool,
    advice_limit: usize,
}

impl DialogueNlg {
    pub fn builder() -> DialogueNlgBuilder {
        DialogueNlgBuilder {
            seed: 0,
            domain_path: None,
            domain: None,
            templates_paths: Vec::new(),
            templates: None,
            phrases_path: None,
            phrases: None,
            relation_path: None,
            relation: None,
            num_rows: None,
            advice_enabled: true,
            advice_limit: DEFAULT_ADVICE_LIMIT,
        }
    }

    pub fn domain(&self) -> &DomainSpec {
        &self.domain
    }

    pub fn vocab(&self) -> &SlotVocabulary {
        &self.vocab
    }

    pub fn database(&self) -> &SyntheticDatabase {
        &self.database
    }

    pub fn templates(&self) -> &TemplateTable {
        &self.templates
    }

    /// Ranked attribute combinations consistent with `belief`.
    pub fn advise(&self, belief: &BeliefState) -> Result<Vec<StatRow>, PipelineError> {
        self.check_belief(belief)?;
        Ok(AdviceEngine::new(self.database.stats())
            .with_limit(self.advice_limit)
            .get_advice(belief))
    }

    /// Exact-match lookup over the searchable table.
    pub fn select(&self, query: &[Option<ValueId>]) -> Result<Selection, PipelineError> {
        Ok(self.database.select(query)?)
    }

    /// A distinct searchable row, for goal sampling.
    pub fn sample_goal(&mut self) -> Option<Vec<ValueId>> {
        self.database.sample_unique_row(&mut self.rng)
    }

    /// Render system acts and append advice for the current belief state.
    pub fn system_turn(
        &mut self,
        acts: &[DialogueAct],
        belief: &BeliefState,
    ) -> Result<SystemUtterance, PipelineError> {
        let advice = self.advise(belief)?;

        let renderer = ActionRenderer::new(&self.domain, &self.vocab, &self.phrases);
        let rendered = renderer.render_system(acts, &mut self.rng)?;

        let requested = rendered
            .requested
            .as_deref()
            .and_then(|slot| self.domain.usr_slot_index(slot));
        let clause = AdviceTemplateSelector::new(&self.templates, &self.vocab)
            .enabled(self.advice_enabled)
            .select(belief, &advice, requested)?;

        let mut text = rendered.strings.join(" ");
        if !clause.is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&clause.text);
        }

        Ok(SystemUtterance {
            text,
            lexicalized: rendered.lexicalized,
            advice: clause,
        })
    }

    pub fn user_turn(&mut self, acts: &[DialogueAct]) -> Result<String, PipelineError> {
        let renderer = ActionRenderer::new(&self.domain, &self.vocab, &self.phrases);
        Ok(renderer.render_user(acts, &mut self.rng)?)
    }

    fn check_belief(&self, belief: &BeliefState) -> Result<(), PipelineError> {
        let expected = self.domain.usr_slots.len();
        if belief.len() != expected {
            return Err(PipelineError::BeliefArity {
                expected,
                got: belief.len(),
            });
        }
        Ok(())
    }
}

impl DialogueNlgBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn domain_path(mut self, path: impl AsRef<Path>) -> Self {
        self.domain_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Provide the domain directly (for testing without files).
    pub fn with_domain(mut self, domain: DomainSpec) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Add a template file. Later files override earlier ones key by key.
    pub fn templates_path(mut self, path: impl AsRef<Path>) -> Self {
        self.templates_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Provide templates directly; these override any loaded from files.
    pub fn with_templates(mut self, templates: TemplateTable) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn phrases_path(mut self, path: impl AsRef<Path>) -> Self {
        self.phrases_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_phrases(mut self, phrases: CommonPhrases) -> Self {
        self.phrases = Some(phrases);
        self
    }

    /// Load the searchable table from a JSON relation instead of sampling it.
    pub fn relation_path(mut self, path: impl AsRef<Path>) -> Self {
        self.relation_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_relation(mut self, records: Vec<RelationRecord>) -> Self {
        self.relation = Some(records);
        self
    }

    /// Rows to sample; defaults to the domain's `db_size`.
    pub fn num_rows(mut self, rows: usize) -> Self {
        self.num_rows = Some(rows);
        self
    }

    pub fn advice_enabled(mut self, enabled: bool) -> Self {
        self.advice_enabled = enabled;
        self
    }

    pub fn advice_limit(mut self, limit: usize) -> Self {
        self.advice_limit = limit;
        self
    }

    pub fn build(self) -> Result<DialogueNlg, PipelineError> {
        let domain = match (self.domain, &self.domain_path) {
            (Some(domain), _) => {
                domain.validate()?;
                domain
            }
            (None, Some(path)) => DomainSpec::load_from_ron(path)?,
            (None, None) => return Err(PipelineError::MissingDomain),
        };
        let slot_names = domain.usr_slot_names();

        let mut templates = TemplateTable::new(slot_names.clone());
        for path in &self.templates_paths {
            templates.merge(TemplateTable::load_from_ron(path, &slot_names)?);
        }
        if let Some(provided) = self.templates {
            templates.merge(provided);
        }

        let phrases = match (self.phrases, &self.phrases_path) {
            (Some(phrases), _) => phrases,
            (None, Some(path)) => {
                let contents = std::fs::read_to_string(path)?;
                CommonPhrases::parse_ron(&contents)?
            }
            (None, None) => CommonPhrases::default(),
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut vocab = SlotVocabulary::from_slots(domain.usr_slots.iter());

        let relation = match (self.relation, &self.relation_path) {
            (Some(records), _) => Some(records),
            (None, Some(path)) => Some(SyntheticDatabase::load_relation(path)?),
            (None, None) => None,
        };
        let database = match relation {
            Some(records) => SyntheticDatabase::from_relation(&domain, &mut vocab, &records, &mut rng)?,
            None => {
                let rows = self.num_rows.unwrap_or(domain.db_size);
                SyntheticDatabase::generate(&domain, &mut vocab, rows, &mut rng)?
            }
        };

        if self.advice_enabled {
            let missing = templates.missing();
            if !missing.is_empty() {
                tracing::warn!(
                    missing = missing.len(),
                    domain = %domain.name,
                    "advice template table is incomplete"
                );
            }
        }

        tracing::info!(
            domain = %domain.name,
            seed = self.seed,
            templates = templates.len(),
            advice = self.advice_enabled,
            "dialogue NLG ready"
        );

        Ok(DialogueNlg {
            domain,
            vocab,
            database,
            templates,
            phrases,
            advice_enabled: self.advice_enabled,
            advice_limit: self.advice_limit,
            rng,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::act::{SystemActKind, NEED_SLOT};

    const DOMAIN: &str = r#"(
        name: "restaurant",
        greet: Some("Welcome."),
        usr_slots: [
            (name: "food", description: "food type", vocabulary: ["italian", "thai"],
             phrases: (inform: ["I like {value} food."], request: ["What kind of food?"])),
            (name: "area", description: "location", vocabulary: ["centre", "north"],
             phrases: (inform: ["In the {value}."], request: ["Which place?"])),
        ],
        sys_slots: [
            (name: "open", description: "opening", vocabulary: ["open", "closed"],
             phrases: (inform: ["It is {value}."], request: ["Is it open?"])),
        ],
        db_size: 20,
    )"#;

    const TEMPLATES: &str = r#"{
        ":area": ["Most places are in the <AREA>.", "Most places are in the <AREA> or <AREA>."],
        ":food_area": ["Lots of <FOOD> places in the <AREA>.", "Many <FOOD> places are in the <AREA>."],
    }"#;

    fn record(food: &str, area: &str) -> RelationRecord {
        let mut map = RelationRecord::new();
        map.insert("food".to_string(), food.into());
        map.insert("area".to_string(), area.into());
        map
    }

    fn relation() -> Vec<RelationRecord> {
        vec![
            record("italian", "centre"),
            record("italian", "centre"),
            record("italian", "north"),
            record("thai", "north"),
        ]
    }

    fn build(seed: u64) -> DialogueNlg {
        let domain = DomainSpec::parse_ron(DOMAIN).unwrap();
        let templates = TemplateTable::parse_ron(TEMPLATES, &domain.usr_slot_names()).unwrap();
        DialogueNlg::builder()
            .seed(seed)
            .with_domain(domain)
            .with_templates(templates)
            .with_relation(relation())
            .build()
            .unwrap()
    }

    #[test]
    fn builder_requires_domain() {
        assert!(matches!(
            DialogueNlg::builder().build(),
            Err(PipelineError::MissingDomain)
        ));
    }

    #[test]
    fn greet_then_leading_advice() {
        let mut nlg = build(1);
        let belief = BeliefState::unconstrained(2);
        let turn = nlg
            .system_turn(&[DialogueAct::system(SystemActKind::Greet)], &belief)
            .unwrap();
        // italian (3) outranks the centre (2): two attributes, so variant 1 by precedence.
        assert_eq!(turn.text, "Welcome. Many italian places are in the centre.");
        assert_eq!(turn.advice.variant, Some(1));
        assert_eq!(turn.advice.suggestion.get("food"), Some(&ValueId(0)));
        assert_eq!(turn.lexicalized.len(), 1);
    }

    #[test]
    fn request_narrows_advice_to_requested_slot() {
        let mut nlg = build(2);
        let belief = BeliefState::unconstrained(2);
        let turn = nlg
            .system_turn(&[DialogueAct::slot("request", "area", None)], &belief)
            .unwrap();
        assert_eq!(turn.text, "Which place? Most places are in the centre.");
        assert_eq!(turn.advice.variant, Some(0));
    }

    #[test]
    fn advice_can_be_disabled() {
        let domain = DomainSpec::parse_ron(DOMAIN).unwrap();
        let mut nlg = DialogueNlg::builder()
            .with_domain(domain)
            .with_relation(relation())
            .advice_enabled(false)
            .build()
            .unwrap();
        let turn = nlg
            .system_turn(
                &[DialogueAct::slot("request", NEED_SLOT, None)],
                &BeliefState::unconstrained(2),
            )
            .unwrap();
        assert!(turn.advice.is_empty());
        assert!(!turn.text.is_empty());
    }

    #[test]
    fn belief_arity_checked() {
        let mut nlg = build(3);
        assert!(matches!(
            nlg.system_turn(&[], &BeliefState::unconstrained(3)),
            Err(PipelineError::BeliefArity { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn same_seed_same_output() {
        let acts = [
            DialogueAct::slot("request", NEED_SLOT, None),
            DialogueAct::slot("implicit_confirm", "food", Some(ValueId(1))),
        ];
        let belief = BeliefState::unconstrained(2);
        let mut a = build(42);
        let mut b = build(42);
        for _ in 0..5 {
            assert_eq!(
                a.system_turn(&acts, &belief).unwrap(),
                b.system_turn(&acts, &belief).unwrap()
            );
        }
        assert_eq!(a.sample_goal(), b.sample_goal());
    }

    #[test]
    fn sampled_database_uses_db_size() {
        let domain = DomainSpec::parse_ron(DOMAIN).unwrap();
        let nlg = DialogueNlg::builder().seed(7).with_domain(domain).build().unwrap();
        assert_eq!(nlg.database().num_rows(), 20);
        let sel = nlg.select(&[None, None]).unwrap();
        assert_eq!(sel.len(), 20);
    }

    #[test]
    fn user_turn_renders() {
        let mut nlg = build(4);
        let text = nlg
            .user_turn(&[DialogueAct::slot("inform", "food", Some(ValueId(1)))])
            .unwrap();
        assert_eq!(text, "I like thai food.");
    }
}
