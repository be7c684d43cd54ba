//! Linear intent classifier.
//!
//! Every intent has a bias and a non-negative weight per feature (a
//! lower-cased word).  An utterance's logit for an intent is the bias plus
//! the weights of the distinct features it contains; the "no intent" entry
//! has the constant logit `none_bias`.  Logits are softmax-normalised into
//! confidence scores.
//!
//! Because weights are non-negative, adding matched features never lowers an
//! intent's logit, so its score relative to the "no intent" entry can only
//! grow.  When no feature of any intent matches (including on empty input)
//! the result is the single entry `{intent_name: None, confidence: 1.0}`.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use nlu_bundle::ModelBundle;
use nlu_ontology::IntentResult;

use crate::tokenizer::tokenize;

struct IntentScorer {
    name: String,
    bias: f32,
    weights: HashMap<String, f32>,
}

/// Scores utterances against the intents of one bundle.
pub struct IntentClassifier {
    none_bias: f32,
    /// Sorted by intent name.
    intents: Vec<IntentScorer>,
}

impl IntentClassifier {
    /// Build the scorer from a bundle's classifier weights.
    ///
    /// Feature keys are lower-cased; if two keys collide the larger weight
    /// is kept.
    pub fn from_bundle(bundle: &ModelBundle) -> Self {
        let model = bundle.classifier();
        let intents = model
            .intents
            .iter()
            .map(|(name, w)| {
                let mut weights: HashMap<String, f32> = HashMap::with_capacity(w.weights.len());
                for (feature, &weight) in &w.weights {
                    let slot = weights.entry(feature.to_lowercase()).or_insert(weight);
                    *slot = slot.max(weight);
                }
                IntentScorer {
                    name: name.clone(),
                    bias: w.bias,
                    weights,
                }
            })
            .collect();

        Self {
            none_bias: model.none_bias,
            intents,
        }
    }

    /// Rank all intents for `utterance`, most confident first.
    ///
    /// Never empty.  Ties are broken by intent name, with the "no intent"
    /// entry after named intents.
    pub fn get_intents(&self, utterance: &str) -> Vec<IntentResult> {
        let features: BTreeSet<String> = tokenize(utterance)
            .into_iter()
            .map(|t| t.normalized)
            .collect();

        let mut any_match = false;
        let logits: Vec<f64> = self
            .intents
            .iter()
            .map(|intent| {
                let mut logit = f64::from(intent.bias);
                for feature in &features {
                    if let Some(&w) = intent.weights.get(feature) {
                        any_match = true;
                        logit += f64::from(w);
                    }
                }
                logit
            })
            .collect();

        if !any_match {
            tracing::trace!(features = features.len(), "no intent feature matched");
            return vec![IntentResult::none(1.0)];
        }

        let none_logit = f64::from(self.none_bias);
        let max = logits.iter().copied().fold(none_logit, f64::max);
        let none_exp = (none_logit - max).exp();
        let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total = none_exp + exps.iter().sum::<f64>();

        let mut results: Vec<IntentResult> = self
            .intents
            .iter()
            .zip(&exps)
            .map(|(intent, e)| IntentResult::new(intent.name.clone(), to_confidence(e / total)))
            .collect();
        results.push(IntentResult::none(to_confidence(none_exp / total)));

        results.sort_by(|a, b| {
            b.confidence_score
                .total_cmp(&a.confidence_score)
                .then_with(|| match (&a.intent_name, &b.intent_name) {
                    (Some(x), Some(y)) => x.cmp(y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                })
        });
        results
    }

    /// Intent names, sorted.
    pub fn intent_names(&self) -> impl Iterator<Item = &str> {
        self.intents.iter().map(|i| i.name.as_str())
    }
}

fn to_confidence(p: f64) -> f32 {
    (p as f32).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bundle_from_json;

    const CLASSIFIER: &str = r#"{
        "none_bias": 1.0,
        "intents": {
            "weather": {"weights": {"weather": 3.0, "forecast": 2.0, "Rain": 2.5}},
            "greet": {"weights": {"hello": 3.0, "hi": 3.0}},
            "book_flight": {"bias": 0.5, "weights": {"flight": 3.0, "fly": 2.0}}
        }
    }"#;

    fn classifier() -> IntentClassifier {
        let bundle = bundle_from_json(
            r#"{"weather": {}, "greet": {}, "book_flight": {}}"#,
            "{}",
            CLASSIFIER,
        );
        IntentClassifier::from_bundle(&bundle)
    }

    fn score_of(results: &[IntentResult], name: Option<&str>) -> f32 {
        results
            .iter()
            .find(|r| r.intent_name.as_deref() == name)
            .map(|r| r.confidence_score)
            .unwrap()
    }

    #[test]
    fn top_intent_matches_features() {
        let results = classifier().get_intents("will it rain tomorrow");
        assert_eq!(results[0].intent_name.as_deref(), Some("weather"));
        // Every intent plus the none entry.
        assert_eq!(results.len(), 4);
    }

    #[test]
    fn scores_are_sorted_and_bounded() {
        for text in ["hello there", "weather forecast", "fly me a flight", "hi rain"] {
            let results = classifier().get_intents(text);
            assert!(!results.is_empty());
            for pair in results.windows(2) {
                assert!(pair[0].confidence_score >= pair[1].confidence_score);
            }
            for r in &results {
                assert!((0.0..=1.0).contains(&r.confidence_score));
            }
            let sum: f32 = results.iter().map(|r| r.confidence_score).sum();
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn empty_input_is_single_none_entry() {
        assert_eq!(classifier().get_intents(""), vec![IntentResult::none(1.0)]);
    }

    #[test]
    fn unmatched_input_is_single_none_entry() {
        assert_eq!(
            classifier().get_intents("purple elephants dance"),
            vec![IntentResult::none(1.0)]
        );
    }

    #[test]
    fn features_match_case_insensitively() {
        let results = classifier().get_intents("RAIN");
        assert_eq!(results[0].intent_name.as_deref(), Some("weather"));
    }

    #[test]
    fn repeated_words_count_once() {
        let c = classifier();
        assert_eq!(c.get_intents("hello"), c.get_intents("hello hello hello"));
    }

    #[test]
    fn deterministic() {
        let c = classifier();
        let text = "weather for my flight";
        assert_eq!(c.get_intents(text), c.get_intents(text));
    }

    #[test]
    fn more_matching_features_never_lower_relative_score() {
        let c = classifier();
        let base = c.get_intents("weather");
        let more = c.get_intents("weather forecast rain");

        let ratio = |r: &[IntentResult]| {
            score_of(r, Some("weather")) / score_of(r, None).max(f32::MIN_POSITIVE)
        };
        assert!(ratio(&more) >= ratio(&base));

        let rank = |r: &[IntentResult]| {
            r.iter()
                .position(|x| x.intent_name.as_deref() == Some("weather"))
                .unwrap()
        };
        assert!(rank(&more) <= rank(&base));
    }

    #[test]
    fn ties_put_none_last() {
        let bundle = bundle_from_json(
            r#"{"a": {}, "b": {}}"#,
            "{}",
            r#"{"none_bias": 0.0, "intents": {
                "a": {"weights": {"x": 0.0}},
                "b": {"weights": {}}
            }}"#,
        );
        let results = IntentClassifier::from_bundle(&bundle).get_intents("x");
        let names: Vec<_> = results.iter().map(|r| r.intent_name.as_deref()).collect();
        assert_eq!(names, [Some("a"), Some("b"), None]);
    }
}
