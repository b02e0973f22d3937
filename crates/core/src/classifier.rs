//! Classification Scorer
//!
//! Nearest-neighbour ranking of the twelve archetypes under L1 distance over
//! six profiling questions answered on a 1-5 scale.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::archetypes::{archetype, ArchetypeId};

pub const NEUTRAL_ANSWER: f64 = 3.0;
pub const MIN_ANSWER: f64 = 1.0;
pub const MAX_ANSWER: f64 = 5.0;
pub const DIMENSIONS: usize = 6;
pub const MAX_SCORE: f64 = MAX_ANSWER * DIMENSIONS as f64;
pub const TOP_MATCHES: usize = 3;

/// Profiling answers; any question left unanswered counts as neutral.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileAnswers {
    pub document_volume: Option<f64>,
    pub customer_interaction: Option<f64>,
    pub regulatory_intensity: Option<f64>,
    pub numerical_analysis: Option<f64>,
    pub content_creation: Option<f64>,
    pub technical_complexity: Option<f64>,
}

impl ProfileAnswers {
    pub fn new(values: [f64; DIMENSIONS]) -> Self {
        let [document, customer, regulatory, numerical, content, technical] = values.map(Some);
        Self {
            document_volume: document,
            customer_interaction: customer,
            regulatory_intensity: regulatory,
            numerical_analysis: numerical,
            content_creation: content,
            technical_complexity: technical,
        }
    }

    /// Answers in dimension order, defaulted and clamped to the answer scale.
    pub fn vector(&self) -> [f64; DIMENSIONS] {
        [
            self.document_volume,
            self.customer_interaction,
            self.regulatory_intensity,
            self.numerical_analysis,
            self.content_creation,
            self.technical_complexity,
        ]
        .map(normalize_answer)
    }
}

fn normalize_answer(answer: Option<f64>) -> f64 {
    match answer {
        Some(value) if value.is_finite() => value.clamp(MIN_ANSWER, MAX_ANSWER),
        _ => NEUTRAL_ANSWER,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeMatch {
    pub archetype_id: ArchetypeId,
    pub name: String,
    pub score: f64,
    pub match_percent: f64,
}

/// Static coordinates of each archetype, in registry declaration order.
pub const PROFILES: [(ArchetypeId, [f64; DIMENSIONS]); 12] = [
    (ArchetypeId::DocumentProcessing, [5.0, 2.0, 3.0, 2.0, 1.0, 2.0]),
    (ArchetypeId::CustomerSupport, [2.0, 5.0, 2.0, 1.0, 2.0, 2.0]),
    (ArchetypeId::FinancialClose, [3.0, 1.0, 4.0, 5.0, 1.0, 2.0]),
    (ArchetypeId::SalesOperations, [2.0, 4.0, 1.0, 3.0, 3.0, 2.0]),
    (ArchetypeId::HrRecruiting, [3.0, 4.0, 3.0, 1.0, 2.0, 1.0]),
    (ArchetypeId::SoftwareEngineering, [2.0, 1.0, 2.0, 3.0, 2.0, 5.0]),
    (ArchetypeId::ComplianceMonitoring, [4.0, 1.0, 5.0, 3.0, 1.0, 3.0]),
    (ArchetypeId::SupplyChainPlanning, [2.0, 1.0, 2.0, 5.0, 1.0, 4.0]),
    (ArchetypeId::MarketingContent, [2.0, 3.0, 1.0, 2.0, 5.0, 2.0]),
    (ArchetypeId::ItServiceDesk, [2.0, 4.0, 2.0, 1.0, 1.0, 4.0]),
    (ArchetypeId::ClaimsProcessing, [5.0, 3.0, 4.0, 3.0, 1.0, 2.0]),
    (ArchetypeId::KnowledgeManagement, [4.0, 2.0, 2.0, 1.0, 4.0, 3.0]),
];

pub fn similarity(answers: &[f64; DIMENSIONS], profile: &[f64; DIMENSIONS]) -> f64 {
    answers
        .iter()
        .zip(profile)
        .map(|(answer, coordinate)| MAX_ANSWER - (answer - coordinate).abs())
        .sum()
}

/// Top three archetypes by similarity. Ties keep declaration order.
pub fn classify_archetype(answers: &ProfileAnswers) -> Vec<ArchetypeMatch> {
    let vector = answers.vector();

    let mut ranked: Vec<ArchetypeMatch> = PROFILES
        .iter()
        .map(|(id, profile)| {
            let score = similarity(&vector, profile);
            ArchetypeMatch {
                archetype_id: *id,
                name: archetype(id.as_str())
                    .map(|schema| schema.name.to_owned())
                    .unwrap_or_else(|| id.to_string()),
                score,
                match_percent: score / MAX_SCORE * 100.0,
            }
        })
        .collect();

    // `sort_by` is stable, which is what keeps tie order deterministic.
    ranked.sort_by(|left, right| right.score.total_cmp(&left.score));
    ranked.truncate(TOP_MATCHES);

    debug!(
        event_name = "classifier.ranked",
        top = %ranked.first().map(|best| best.archetype_id.as_str()).unwrap_or_default(),
        score = ranked.first().map(|best| best.score).unwrap_or_default(),
        "archetypes ranked"
    );
    ranked
}

#[cfg(test)]
mod tests {
    use super::{classify_archetype, ProfileAnswers, MAX_SCORE, PROFILES};
    use crate::archetypes::ArchetypeId;

    #[test]
    fn own_coordinates_rank_first_with_maximum_score() {
        for (id, profile) in PROFILES {
            let ranked = classify_archetype(&ProfileAnswers::new(profile));
            assert_eq!(ranked.len(), 3);
            assert_eq!(ranked[0].archetype_id, id);
            assert_eq!(ranked[0].score, MAX_SCORE);
            assert_eq!(ranked[0].match_percent, 100.0);
        }
    }

    #[test]
    fn profile_order_matches_registry_declaration_order() {
        let ids: Vec<ArchetypeId> = PROFILES.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, ArchetypeId::ALL.to_vec());
    }

    #[test]
    fn missing_answers_default_to_neutral() {
        let explicit = classify_archetype(&ProfileAnswers::new([3.0; 6]));
        let empty = classify_archetype(&ProfileAnswers::default());
        assert_eq!(explicit, empty);
    }

    #[test]
    fn out_of_range_answers_are_clamped() {
        let wild = ProfileAnswers::new([40.0, -3.0, 3.0, 2.0, 1.0, 2.0]);
        let clamped = ProfileAnswers::new([5.0, 1.0, 3.0, 2.0, 1.0, 2.0]);
        assert_eq!(classify_archetype(&wild), classify_archetype(&clamped));
    }

    #[test]
    fn results_are_sorted_descending() {
        let ranked = classify_archetype(&ProfileAnswers::new([4.0, 2.0, 4.0, 4.0, 1.0, 3.0]));
        assert!(ranked.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }

    #[test]
    fn ties_keep_declaration_order() {
        let ranked = classify_archetype(&ProfileAnswers::default());
        let position = |id: ArchetypeId| PROFILES.iter().position(|(candidate, _)| *candidate == id);
        for pair in ranked.windows(2) {
            if pair[0].score == pair[1].score {
                assert!(position(pair[0].archetype_id) < position(pair[1].archetype_id));
            }
        }
    }

    #[test]
    fn answers_deserialize_from_partial_camel_case_json() {
        let answers: ProfileAnswers =
            serde_json::from_str(r#"{"documentVolume": 5, "regulatoryIntensity": 4}"#).expect("parses");
        assert_eq!(answers.vector(), [5.0, 3.0, 4.0, 3.0, 3.0, 3.0]);
    }
}
