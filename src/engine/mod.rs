mod verdict;

pub use verdict::{classifier_input, classify};
