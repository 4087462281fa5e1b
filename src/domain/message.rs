use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedMessage {
    pub sender: String,
    pub subject: String,
    pub body: String,
}

impl NormalizedMessage {
    pub fn new(
        sender: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Portion of the sender after the last `@`, or the whole sender when there is none.
    pub fn sender_domain(&self) -> &str {
        match self.sender.rfind('@') {
            Some(idx) => &self.sender[idx + 1..],
            None => &self.sender,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpamHit {
    pub message_id: String,
    pub sender: String,
    pub subject: String,
    pub body: String,
}

impl SpamHit {
    pub fn new(message_id: impl Into<String>, message: NormalizedMessage) -> Self {
        let NormalizedMessage {
            sender,
            subject,
            body,
        } = message;
        Self {
            message_id: message_id.into(),
            sender,
            subject,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_domain_takes_text_after_last_at() {
        let msg = NormalizedMessage::new("\"a@b\" <promo@deals.biz>", "", "");
        assert_eq!(msg.sender_domain(), "deals.biz>");

        let msg = NormalizedMessage::new("alerts@bank.com", "", "");
        assert_eq!(msg.sender_domain(), "bank.com");
    }

    #[test]
    fn sender_domain_without_at_is_whole_sender() {
        let msg = NormalizedMessage::new("MAILER-DAEMON", "", "");
        assert_eq!(msg.sender_domain(), "MAILER-DAEMON");
    }
}
