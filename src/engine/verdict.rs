use crate::{
    classifier::{Classifier, SPAM_LABEL},
    domain::{NormalizedMessage, Verdict},
    rules::RuleTable,
};

pub fn classify(
    message: &NormalizedMessage,
    table: &RuleTable,
    classifier: &dyn Classifier,
) -> Verdict {
    if table.exempt(message) {
        tracing::debug!(
            target: "engine",
            sender = %message.sender,
            "override rule matched; classifier skipped"
        );
        return Verdict::NotSpam;
    }

    let label = classifier.predict(&classifier_input(message));
    if label == SPAM_LABEL {
        Verdict::Spam
    } else {
        Verdict::NotSpam
    }
}

/// `"<sender-domain> <subject> <body>"`
pub fn classifier_input(message: &NormalizedMessage) -> String {
    format!(
        "{} {} {}",
        message.sender_domain(),
        message.subject,
        message.body
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::{domain::Label, rules::OverrideRule};

    struct Recording {
        label: Label,
        calls: AtomicUsize,
        last_input: Mutex<Option<String>>,
    }

    impl Recording {
        fn answering(label: Label) -> Self {
            Self {
                label,
                calls: AtomicUsize::new(0),
                last_input: Mutex::new(None),
            }
        }
    }

    impl Classifier for Recording {
        fn predict(&self, text: &str) -> Label {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_input.lock() = Some(text.to_string());
            self.label
        }
    }

    #[test]
    fn sender_override_wins_without_consulting_classifier() {
        let msg = NormalizedMessage::new("alerts@bank.com", "Your statement", "see attached");
        let table = RuleTable::load([OverrideRule::sender("bank.com")]);
        let classifier = Recording::answering(SPAM_LABEL);

        assert_eq!(classify(&msg, &table, &classifier), Verdict::NotSpam);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn keyword_and_subject_overrides_beat_spam_label() {
        let classifier = Recording::answering(SPAM_LABEL);
        let msg = NormalizedMessage::new("promo@deals.biz", "WIN FREE MONEY", "from your Landlord");

        let keyword = RuleTable::load([OverrideRule::keyword("landlord")]);
        assert_eq!(classify(&msg, &keyword, &classifier), Verdict::NotSpam);

        let subject = RuleTable::load([OverrideRule::subject("free money")]);
        assert_eq!(classify(&msg, &subject, &classifier), Verdict::NotSpam);
    }

    #[test]
    fn unmatched_message_follows_classifier() {
        let msg = NormalizedMessage::new("promo@deals.biz", "WIN FREE MONEY", "click now");
        let table = RuleTable::empty();

        let spam = Recording::answering(Label(1));
        assert_eq!(classify(&msg, &table, &spam), Verdict::Spam);
        assert_eq!(
            spam.last_input.lock().as_deref(),
            Some("deals.biz WIN FREE MONEY click now")
        );

        assert_eq!(classify(&msg, &table, &Recording::answering(Label(0))), Verdict::NotSpam);
        assert_eq!(classify(&msg, &table, &Recording::answering(Label(2))), Verdict::NotSpam);
    }

    #[test]
    fn input_uses_whole_sender_without_at() {
        let msg = NormalizedMessage::new("postmaster", "hi", "");
        assert_eq!(classifier_input(&msg), "postmaster hi ");
    }

    #[test]
    fn closures_are_classifiers() {
        let msg = NormalizedMessage::new("a@b.c", "s", "b");
        let always_spam = |_: &str| Label(1);
        assert!(classify(&msg, &RuleTable::empty(), &always_spam).is_spam());
    }
}
