//! Modality normalization.
//!
//! Raw modality text taken from a path (`T1_MPRAGE`, `t2_tse`, `flair3d`, ...) is mapped
//! onto one of four canonical BIDS anatomical suffixes. Rules are always evaluated in the
//! fixed order T1w, T2w, FLAIR, PD and the first rule that matches wins.

/// A canonical anatomical modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modality {
    T1w,
    T2w,
    Flair,
    Pd,
}

impl Modality {
    /// All modalities in match precedence order.
    pub const ALL: [Modality; 4] = [Modality::T1w, Modality::T2w, Modality::Flair, Modality::Pd];

    /// The BIDS suffix written into file names.
    pub fn label(&self) -> &'static str {
        match self {
            Modality::T1w => "T1w",
            Modality::T2w => "T2w",
            Modality::Flair => "FLAIR",
            Modality::Pd => "PD",
        }
    }

    /// Token looked for when no accepted labels are configured.
    pub fn default_guess(&self) -> &'static str {
        match self {
            Modality::T1w => "T1",
            Modality::T2w => "T2",
            Modality::Flair => "FLAIR",
            Modality::Pd => "PD",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Upper-cases and drops underscores, so `t1_mprage` and `T1MPRAGE` compare equal.
fn fold(text: &str) -> String {
    text.replace('_', "").to_uppercase()
}

/// How one canonical modality is recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalityRule {
    modality: Modality,
    accepted: Vec<String>,
}

impl ModalityRule {
    /// A rule that falls back to the modality's default guess.
    pub fn new(modality: Modality) -> Self {
        Self {
            modality,
            accepted: Vec::new(),
        }
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    /// Accepted substrings, already folded.
    pub fn accepted(&self) -> &[String] {
        &self.accepted
    }

    /// Returns true if `raw` belongs to this rule.
    ///
    /// With accepted substrings configured, only they are consulted (compared folded).
    /// Otherwise `raw` must contain the default guess, ignoring case.
    pub fn matches(&self, raw: &str) -> bool {
        if self.accepted.is_empty() {
            return raw
                .to_uppercase()
                .contains(self.modality.default_guess());
        }

        let raw = fold(raw);
        self.accepted
            .iter()
            .any(|accepted| raw.contains(accepted.as_str()))
    }
}

/// The ordered rule list used to normalize every file of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalityRules {
    rules: Vec<ModalityRule>,
}

impl Default for ModalityRules {
    fn default() -> Self {
        Self {
            rules: Modality::ALL.into_iter().map(ModalityRule::new).collect(),
        }
    }
}

impl ModalityRules {
    /// Replaces the accepted substrings for `modality`.
    ///
    /// Entries that are empty once folded are dropped, since they would match anything.
    /// Passing no usable entries restores the default-guess behaviour.
    #[must_use]
    pub fn with_accepted<I, S>(mut self, modality: Modality, accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let accepted: Vec<String> = accepted
            .into_iter()
            .map(|label| fold(label.as_ref()))
            .filter(|label| !label.is_empty())
            .collect();

        if let Some(rule) = self
            .rules
            .iter_mut()
            .find(|rule| rule.modality == modality)
        {
            rule.accepted = accepted;
        }
        self
    }

    pub fn rules(&self) -> &[ModalityRule] {
        &self.rules
    }

    /// Maps raw modality text to its canonical modality, or `None` if no rule matches.
    pub fn normalize(&self, raw: &str) -> Option<Modality> {
        self.rules
            .iter()
            .find(|rule| rule.matches(raw))
            .map(ModalityRule::modality)
    }
}
