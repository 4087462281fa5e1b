use crate::domain::SpamHit;

pub trait SpamSink {
    fn on_spam_hit(&mut self, hit: SpamHit);
}

impl SpamSink for Vec<SpamHit> {
    fn on_spam_hit(&mut self, hit: SpamHit) {
        self.push(hit);
    }
}

impl<F> SpamSink for F
where
    F: FnMut(SpamHit),
{
    fn on_spam_hit(&mut self, hit: SpamHit) {
        self(hit)
    }
}
