//! Per-topic learning statistics.
//!
//! The aggregator runs two passes over a discipline's topic tree:
//!
//! 1. Post-order: question counts, answer roll-ups and the weighted
//!    difficulty sums, each node folding in its already-finished children.
//! 2. Pre-order: frequencies, once the discipline-wide maximum and the
//!    per-cohort question totals are known.
//!
//! Empty denominators are not errors. Frequencies fall back to `0`, grades to
//! `None` and difficulty to [`BASELINE_DIFFICULTY`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::discipline::Discipline;
use crate::error::{LearningError, Result};
use crate::learning::LearningView;
use crate::ledger::{AnswerLedger, Scope, TopicTally};
use crate::model::QuizAnswer;
use crate::questions::QuestionIndex;

/// Difficulty of a topic nobody has answered yet.
pub const BASELINE_DIFFICULTY: f64 = 50.0;

/// Decimal places for ratio fields (`frequency_in_discipline`).
pub const RATIO_PRECISION: u32 = 4;

/// Decimal places for percentage and grade-like fields.
pub const PERCENT_PRECISION: u32 = 2;

/// Which topics a topic's question mass is compared against for
/// `frequency_in_depth`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyReference {
    /// Every topic at the same depth across the discipline.
    #[default]
    Depth,
    /// Topics sharing the same parent; roots are siblings of each other.
    Siblings,
}

impl std::str::FromStr for FrequencyReference {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "depth" | "level" => Ok(FrequencyReference::Depth),
            "siblings" | "parent" => Ok(FrequencyReference::Siblings),
            other => Err(format!("unknown frequency reference: {other}")),
        }
    }
}

/// Every metric computed for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicStatistics {
    pub topic_id: String,
    pub discipline_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub root_id: String,
    pub is_active: bool,
    pub is_topic_classify: bool,

    // Tree shape
    pub depth: u32,
    pub max_depth: u32,
    pub qty_children: usize,
    pub qty_children_recursive: usize,

    // Question volume
    pub qty_questions: usize,
    pub qty_questions_recursive: usize,
    pub qty_all_questions_depth: usize,
    /// Largest subtree question total among the discipline's roots.
    pub max_qty_all_questions_root_recursive: usize,
    /// Subtree question share of the largest root, in `[0, 1]`.
    pub frequency_in_discipline: f64,
    /// Subtree question share of the topic's cohort, in percent.
    pub frequency_in_depth: f64,

    // Learner answers
    pub qty_questions_answered: usize,
    pub qty_questions_correct_answered: usize,
    pub qty_questions_answered_recursive: usize,
    pub qty_questions_correct_answered_recursive: usize,
    pub avg_grade: Option<f64>,
    pub collective_avg_grade: Option<f64>,

    // Difficulty, 0 (easy) to 100 (hard)
    pub difficulty: f64,
    pub difficulty_recursive: f64,
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Difficulty from a collective tally.
///
/// Graded answers win: `100 - mean grade`. Without grades, the share of
/// wrong scored answers is used. With neither, the baseline applies.
pub fn difficulty_of(collective: &TopicTally) -> f64 {
    if let Some(avg) = collective.avg_grade() {
        100.0 - avg
    } else if let Some(rate) = collective.error_rate() {
        100.0 * rate
    } else {
        BASELINE_DIFFICULTY
    }
}

/// Bottom-up accumulators for one topic.
#[derive(Debug, Clone, Copy, Default)]
struct Rollup {
    own_questions: usize,
    recursive_questions: usize,
    learner: TopicTally,
    difficulty: f64,
    /// Σ difficulty × own questions over the subtree.
    weighted_difficulty: f64,
    /// Σ own questions over the subtree.
    weight: usize,
}

impl Rollup {
    fn all_questions(&self) -> usize {
        self.own_questions + self.recursive_questions
    }
}

/// Combines a discipline's tree and question index with answer ledgers.
#[derive(Debug, Clone, Copy)]
pub struct StatisticsAggregator<'a> {
    discipline: &'a Discipline,
    questions: &'a QuestionIndex,
    reference: FrequencyReference,
}

impl<'a> StatisticsAggregator<'a> {
    pub fn new(discipline: &'a Discipline, questions: &'a QuestionIndex) -> Self {
        Self {
            discipline,
            questions,
            reference: FrequencyReference::default(),
        }
    }

    pub fn with_frequency_reference(mut self, reference: FrequencyReference) -> Self {
        self.reference = reference;
        self
    }

    /// Compute the learning view of `user_id` from every user's answers.
    pub fn compute(&self, answers: &[QuizAnswer], user_id: &str) -> Result<LearningView> {
        if user_id.is_empty() {
            return Err(LearningError::MissingArgument("user_id"));
        }
        let learner = AnswerLedger::build(answers, Scope::user(user_id));
        let collective = AnswerLedger::build(answers, Scope::Collective);
        Ok(self.compute_with(&learner, &collective))
    }

    /// Compute from prebuilt ledgers. `learner` supplies the per-user
    /// fields, `collective` the collective grade and difficulty.
    pub fn compute_with(&self, learner: &AnswerLedger, collective: &AnswerLedger) -> LearningView {
        let tree = self.discipline.tree();
        let mut rollups = vec![Rollup::default(); tree.len()];

        for i in tree.post_order() {
            let id = &tree.node(i).id;
            let own_questions = self.questions.qty_questions(id);
            let difficulty = difficulty_of(&collective.tally(id));
            let mut rollup = Rollup {
                own_questions,
                recursive_questions: 0,
                learner: learner.tally(id),
                difficulty,
                weighted_difficulty: difficulty * own_questions as f64,
                weight: own_questions,
            };
            for &c in tree.children_indices(i) {
                let child = &rollups[c];
                rollup.recursive_questions += child.all_questions();
                rollup.learner.merge(&child.learner);
                rollup.weighted_difficulty += child.weighted_difficulty;
                rollup.weight += child.weight;
            }
            rollups[i] = rollup;
        }

        let max_root = tree
            .root_indices()
            .iter()
            .map(|&r| rollups[r].all_questions())
            .max()
            .unwrap_or(0);
        let cohort_totals = self.cohort_totals(&rollups);

        let mut topics = BTreeMap::new();
        for i in tree.pre_order() {
            let topic = tree.node(i);
            let rollup = &rollups[i];
            let all = rollup.all_questions();
            let own = learner.tally(&topic.id);

            let frequency_in_discipline = ratio(all, max_root);
            let frequency_in_depth = 100.0 * ratio(all, cohort_totals[i]);
            let difficulty_recursive = if rollup.weight == 0 {
                rollup.difficulty
            } else {
                rollup.weighted_difficulty / rollup.weight as f64
            };

            let stats = TopicStatistics {
                topic_id: topic.id.clone(),
                discipline_id: topic.discipline_id.clone(),
                name: topic.name.clone(),
                parent_id: topic.parent_id.clone(),
                root_id: topic.root_id.clone(),
                is_active: topic.is_active,
                is_topic_classify: topic.is_topic_classify,
                depth: topic.depth,
                max_depth: tree.subtree_max_depth(i),
                qty_children: tree.children_indices(i).len(),
                qty_children_recursive: tree.descendant_count(i),
                qty_questions: rollup.own_questions,
                qty_questions_recursive: rollup.recursive_questions,
                qty_all_questions_depth: all,
                max_qty_all_questions_root_recursive: max_root,
                frequency_in_discipline: round_to(frequency_in_discipline, RATIO_PRECISION),
                frequency_in_depth: round_to(frequency_in_depth, PERCENT_PRECISION),
                qty_questions_answered: own.answered,
                qty_questions_correct_answered: own.correct,
                qty_questions_answered_recursive: rollup.learner.answered,
                qty_questions_correct_answered_recursive: rollup.learner.correct,
                avg_grade: own.avg_grade().map(|g| round_to(g, PERCENT_PRECISION)),
                collective_avg_grade: collective
                    .avg_grade(&topic.id)
                    .map(|g| round_to(g, PERCENT_PRECISION)),
                difficulty: round_to(rollup.difficulty, PERCENT_PRECISION),
                difficulty_recursive: round_to(difficulty_recursive, PERCENT_PRECISION),
            };
            topics.insert(stats.topic_id.clone(), stats);
        }

        tracing::debug!(
            discipline = self.discipline.id(),
            scope = %learner.scope(),
            topics = topics.len(),
            max_root,
            "learning statistics computed"
        );

        let user_id = match learner.scope() {
            Scope::User(id) => id.clone(),
            Scope::Collective => String::new(),
        };
        LearningView::new(
            user_id,
            self.discipline.id().to_string(),
            self.discipline.max_topics_depth(),
            topics,
        )
    }

    /// Question total of each topic's reference cohort.
    fn cohort_totals(&self, rollups: &[Rollup]) -> Vec<usize> {
        let tree = self.discipline.tree();
        match self.reference {
            FrequencyReference::Depth => {
                let mut per_depth: HashMap<u32, usize> = HashMap::new();
                for i in tree.pre_order() {
                    *per_depth.entry(tree.node(i).depth).or_default() += rollups[i].all_questions();
                }
                (0..tree.len())
                    .map(|i| per_depth[&tree.node(i).depth])
                    .collect()
            }
            FrequencyReference::Siblings => {
                let roots_total: usize = tree
                    .root_indices()
                    .iter()
                    .map(|&r| rollups[r].all_questions())
                    .sum();
                (0..tree.len())
                    .map(|i| match tree.parent_index(i) {
                        None => roots_total,
                        Some(p) => tree
                            .children_indices(p)
                            .iter()
                            .map(|&c| rollups[c].all_questions())
                            .sum(),
                    })
                    .collect()
            }
        }
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
