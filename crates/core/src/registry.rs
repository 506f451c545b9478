use bidsify_types::Label;
use std::collections::HashSet;

/// Distinct subjects seen during a run, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct SubjectRegistry {
    order: Vec<Label>,
    seen: HashSet<Label>,
}

impl SubjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `subject`, returning false if it was already known.
    pub fn register(&mut self, subject: &Label) -> bool {
        if !self.seen.insert(subject.clone()) {
            return false;
        }
        self.order.push(subject.clone());
        true
    }

    pub fn subjects(&self) -> &[Label] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_subjects(self) -> Vec<Label> {
        self.order
    }
}
