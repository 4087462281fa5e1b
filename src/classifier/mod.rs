mod model;
mod store;

pub use model::NaiveBayesModel;
pub use store::{ArtifactProducer, CommandProducer, ModelError, ModelStore};

use crate::domain::Label;

pub const SPAM_LABEL: Label = Label(1);

/// Opaque pretrained text classifier. Must be deterministic for a fixed artifact and input.
pub trait Classifier: Send + Sync {
    fn predict(&self, text: &str) -> Label;
}

impl<F> Classifier for F
where
    F: Fn(&str) -> Label + Send + Sync,
{
    fn predict(&self, text: &str) -> Label {
        self(text)
    }
}
