use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{store::ModelError, Classifier};
use crate::domain::Label;

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaiveBayesModel {
    labels: Vec<Label>,
    class_log_prior: Vec<f64>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
}

impl NaiveBayesModel {
    pub fn new(
        labels: Vec<Label>,
        class_log_prior: Vec<f64>,
        vocabulary: HashMap<String, usize>,
        idf: Vec<f64>,
        feature_log_prob: Vec<Vec<f64>>,
    ) -> Result<Self, ModelError> {
        let model = Self {
            labels,
            class_log_prior,
            vocabulary,
            idf,
            feature_log_prob,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.labels.is_empty() {
            return Err(ModelError::Invalid("artifact declares no labels".into()));
        }
        if self.class_log_prior.len() != self.labels.len() {
            return Err(ModelError::Invalid(format!(
                "{} class priors for {} labels",
                self.class_log_prior.len(),
                self.labels.len()
            )));
        }
        if self.feature_log_prob.len() != self.labels.len() {
            return Err(ModelError::Invalid(format!(
                "{} feature rows for {} labels",
                self.feature_log_prob.len(),
                self.labels.len()
            )));
        }
        let features = self.idf.len();
        if let Some(row) = self.feature_log_prob.iter().find(|row| row.len() != features) {
            return Err(ModelError::Invalid(format!(
                "feature row has {} weights, expected {features}",
                row.len()
            )));
        }
        if let Some((token, idx)) = self.vocabulary.iter().find(|(_, idx)| **idx >= features) {
            return Err(ModelError::Invalid(format!(
                "token {token:?} maps to index {idx} beyond {features} features"
            )));
        }
        Ok(())
    }

    /// L2-normalised TF-IDF weights for the tokens of `text` present in the vocabulary,
    /// ordered by feature index so every sum over them is reproducible.
    fn features(&self, text: &str) -> Vec<(usize, f64)> {
        let lowered = text.to_lowercase();
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in TOKEN_PATTERN.find_iter(&lowered) {
            if let Some(&idx) = self.vocabulary.get(token.as_str()) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        let mut weights: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, count)| (idx, count * self.idf[idx]))
            .collect();
        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, weight) in weights.iter_mut() {
                *weight /= norm;
            }
        }
        weights
    }
}

impl Classifier for NaiveBayesModel {
    fn predict(&self, text: &str) -> Label {
        let features = self.features(text);
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (class, prior) in self.class_log_prior.iter().enumerate() {
            let row = &self.feature_log_prob[class];
            let score = prior
                + features
                    .iter()
                    .map(|(idx, weight)| weight * row[*idx])
                    .sum::<f64>();
            if score > best_score {
                best = class;
                best_score = score;
            }
        }
        self.labels[best]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_model() -> NaiveBayesModel {
        let vocabulary = [("free", 0), ("money", 1), ("meeting", 2), ("agenda", 3)]
            .into_iter()
            .map(|(t, i)| (t.to_string(), i))
            .collect();
        NaiveBayesModel::new(
            vec![Label(0), Label(1)],
            vec![(0.5f64).ln(), (0.5f64).ln()],
            vocabulary,
            vec![1.0, 1.0, 1.0, 1.0],
            vec![
                vec![(0.05f64).ln(), (0.05f64).ln(), (0.45f64).ln(), (0.45f64).ln()],
                vec![(0.45f64).ln(), (0.45f64).ln(), (0.05f64).ln(), (0.05f64).ln()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn predicts_spam_for_spammy_tokens() {
        let model = toy_model();
        assert_eq!(model.predict("deals.biz WIN FREE MONEY click now"), Label(1));
        assert_eq!(model.predict("corp.com Meeting agenda for Monday"), Label(0));
    }

    #[test]
    fn unknown_tokens_fall_back_to_prior_and_first_label_on_tie() {
        let model = toy_model();
        assert_eq!(model.predict("zzz qqq"), Label(0));
        assert_eq!(model.predict(""), Label(0));
    }

    #[test]
    fn single_character_tokens_are_ignored() {
        let mut vocabulary = HashMap::new();
        vocabulary.insert("a".to_string(), 0);
        let model = NaiveBayesModel::new(
            vec![Label(0), Label(1)],
            vec![(0.6f64).ln(), (0.4f64).ln()],
            vocabulary,
            vec![1.0],
            vec![vec![(0.01f64).ln()], vec![0.0]],
        )
        .unwrap();
        assert_eq!(model.predict("a a a a"), Label(0));
    }

    #[test]
    fn prediction_is_deterministic() {
        let model = toy_model();
        let text = "free agenda money meeting";
        let first = model.predict(text);
        for _ in 0..10 {
            assert_eq!(model.predict(text), first);
        }
    }

    #[test]
    fn json_round_trip_preserves_predictions() {
        let model = toy_model();
        let json = serde_json::to_string(&model).unwrap();
        let loaded = NaiveBayesModel::from_json(&json).unwrap();
        assert_eq!(loaded.labels(), &[Label(0), Label(1)]);
        assert_eq!(loaded.predict("free money"), Label(1));
    }

    #[test]
    fn rejects_inconsistent_artifacts() {
        let err = NaiveBayesModel::new(
            vec![Label(0), Label(1)],
            vec![0.0],
            HashMap::new(),
            vec![],
            vec![vec![], vec![]],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::Invalid(_)));

        let mut vocabulary = HashMap::new();
        vocabulary.insert("free".to_string(), 3);
        let err = NaiveBayesModel::new(
            vec![Label(1)],
            vec![0.0],
            vocabulary,
            vec![1.0],
            vec![vec![0.0]],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::Invalid(_)));
    }

    #[test]
    fn near_tie_resolves_the_same_way_on_every_call() {
        // Magnitudes chosen so the summed score depends on addition order.
        let row0 = vec![-1e16, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0];
        let vocabulary = (0..8).map(|i| (format!("t{i}"), i)).collect();
        let weight = 1.0 / 8f64.sqrt();
        let tie = row0.iter().map(|v| weight * v).sum::<f64>();
        let model = NaiveBayesModel::new(
            vec![Label(0), Label(1)],
            vec![0.0, tie],
            vocabulary,
            vec![1.0; 8],
            vec![row0, vec![0.0; 8]],
        )
        .unwrap();

        let text = "t0 t1 t2 t3 t4 t5 t6 t7";
        for _ in 0..500 {
            assert_eq!(model.predict(text), Label(0));
        }
    }
}
