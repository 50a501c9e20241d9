use async_trait::async_trait;

use super::{ClassificationSuggestion, Suggester};
use crate::error::Result;
use crate::ticket::{Category, Priority};

// Checked in order; first matching category wins.
const CATEGORY_RULES: &[(Category, &[&str])] = &[
    (Category::Billing, &["money", "billing", "payment", "refund"]),
    (Category::Technical, &["bug", "error", "crash", "not working"]),
    (Category::Account, &["password", "login", "account"]),
];

const CRITICAL_KEYWORDS: &[&str] = &["urgent", "immediate", "emergency"];

// A critical keyword directly after one of these words does not count.
const NEGATIONS: &[&str] = &["not ", "no ", "non-", "non "];

/// Deterministic keyword classification. Total over any input text.
pub fn classify_keywords(description: &str) -> (Category, Priority) {
    let text = description.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| text.contains(w));

    let category = CATEGORY_RULES
        .iter()
        .find(|(_, words)| contains_any(words))
        .map(|(category, _)| *category)
        .unwrap_or(Category::General);

    let mut priority = match category {
        Category::Billing | Category::Technical => Priority::High,
        _ => Priority::Medium,
    };
    if CRITICAL_KEYWORDS.iter().any(|w| has_unnegated(&text, w)) {
        priority = Priority::Critical;
    }

    (category, priority)
}

/// True if `word` occurs in `text` at least once without a negation in front.
fn has_unnegated(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(idx, _)| {
        let before = &text[..idx];
        !NEGATIONS.iter().any(|neg| {
            before
                .strip_suffix(neg)
                .is_some_and(|rest| !rest.ends_with(|c: char| c.is_alphanumeric()))
        })
    })
}

/// Keyword-rule strategy, used as the classifier's fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordSuggester;

impl KeywordSuggester {
    pub fn suggest_now(&self, description: &str) -> ClassificationSuggestion {
        let (category, priority) = classify_keywords(description);
        ClassificationSuggestion::new(category, priority)
    }
}

#[async_trait(?Send)]
impl Suggester for KeywordSuggester {
    fn name(&self) -> &'static str {
        "keywords"
    }

    async fn suggest(&self, description: &str) -> Result<ClassificationSuggestion> {
        Ok(self.suggest_now(description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_with_urgent_override() {
        assert_eq!(
            classify_keywords("Urgent: payment failed and refund needed"),
            (Category::Billing, Priority::Critical)
        );
    }

    #[test]
    fn test_technical_checked_before_account() {
        assert_eq!(
            classify_keywords("App crashes on login, not urgent"),
            (Category::Technical, Priority::High)
        );
    }

    #[test]
    fn test_negated_then_plain_keyword_is_critical() {
        assert_eq!(
            classify_keywords("Not urgent yesterday, but now it is urgent: login broken"),
            (Category::Account, Priority::Critical)
        );
        assert_eq!(
            classify_keywords("no immediate action needed on my account"),
            (Category::Account, Priority::Medium)
        );
    }

    #[test]
    fn test_negation_must_start_a_word() {
        assert_eq!(
            classify_keywords("Casino emergency: payment terminal down"),
            (Category::Billing, Priority::Critical)
        );
        assert_eq!(
            classify_keywords("Our piano urgent refund request"),
            (Category::Billing, Priority::Critical)
        );
        assert_eq!(
            classify_keywords("Cannot login, this is urgent"),
            (Category::Account, Priority::Critical)
        );
        assert_eq!(
            classify_keywords("(not urgent) refund for last month"),
            (Category::Billing, Priority::High)
        );
    }

    #[test]
    fn test_no_rule_matches() {
        assert_eq!(
            classify_keywords("I like your product"),
            (Category::General, Priority::Medium)
        );
    }

    #[test]
    fn test_account_is_medium() {
        assert_eq!(
            classify_keywords("Please help me reset my PASSWORD"),
            (Category::Account, Priority::Medium)
        );
    }

    #[test]
    fn test_technical_is_high() {
        assert_eq!(
            classify_keywords("The export button is not working at all"),
            (Category::Technical, Priority::High)
        );
    }

    #[test]
    fn test_critical_overrides_general() {
        assert_eq!(
            classify_keywords("This is an emergency, call me back"),
            (Category::General, Priority::Critical)
        );
    }

    #[test]
    fn test_billing_beats_technical() {
        assert_eq!(
            classify_keywords("Error when processing my payment"),
            (Category::Billing, Priority::High)
        );
    }

    #[tokio::test]
    async fn test_suggester_always_complete() {
        let s = KeywordSuggester.suggest("whatever text").await.unwrap();
        assert_eq!(s.pair(), Some((Category::General, Priority::Medium)));
    }
}
