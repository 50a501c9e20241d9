pub mod keywords;

use async_trait::async_trait;
use serde::Serialize;

pub use keywords::{classify_keywords, KeywordSuggester};

use crate::error::Result;
use crate::ticket::{Category, Priority};

/// Descriptions shorter than this (in characters, after trimming) are not classified.
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// A proposed (category, priority) pair. Either both are present or neither is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationSuggestion {
    suggested_category: Option<Category>,
    suggested_priority: Option<Priority>,
}

impl ClassificationSuggestion {
    pub fn new(category: Category, priority: Priority) -> Self {
        Self {
            suggested_category: Some(category),
            suggested_priority: Some(priority),
        }
    }

    /// No suggestion.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn category(&self) -> Option<Category> {
        self.suggested_category
    }

    pub fn priority(&self) -> Option<Priority> {
        self.suggested_priority
    }

    pub fn pair(&self) -> Option<(Category, Priority)> {
        self.suggested_category.zip(self.suggested_priority)
    }

    pub fn is_none(&self) -> bool {
        self.pair().is_none()
    }
}

/// A strategy that can propose a category and priority for a description.
#[async_trait(?Send)]
pub trait Suggester {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    async fn suggest(&self, description: &str) -> Result<ClassificationSuggestion>;
}

/// Tries the primary strategy and falls back to keyword rules on any failure.
///
/// Never returns an error: a failed or malformed primary answer degrades to
/// [`KeywordSuggester`], and descriptions below [`MIN_DESCRIPTION_LEN`]
/// yield [`ClassificationSuggestion::none`] without consulting any strategy.
pub struct Classifier {
    primary: Option<Box<dyn Suggester>>,
    fallback: KeywordSuggester,
}

impl Classifier {
    pub fn new(primary: Box<dyn Suggester>) -> Self {
        Self {
            primary: Some(primary),
            fallback: KeywordSuggester,
        }
    }

    /// A classifier that only uses keyword rules.
    pub fn keywords_only() -> Self {
        Self {
            primary: None,
            fallback: KeywordSuggester,
        }
    }

    pub fn primary_name(&self) -> Option<&'static str> {
        self.primary.as_ref().map(|p| p.name())
    }

    pub async fn classify(&self, description: &str) -> ClassificationSuggestion {
        let description = description.trim();
        if description.chars().count() < MIN_DESCRIPTION_LEN {
            log::debug!(
                "Description too short to classify ({} chars)",
                description.chars().count()
            );
            return ClassificationSuggestion::none();
        }

        if let Some(primary) = &self.primary {
            match primary.suggest(description).await {
                Ok(s) if !s.is_none() => {
                    log::debug!("Classified via {}: {:?}", primary.name(), s.pair());
                    return s;
                }
                Ok(_) => {
                    log::warn!("{} returned no suggestion; using keyword rules", primary.name());
                }
                Err(e) => {
                    log::warn!("{} classification failed: {e}; using keyword rules", primary.name());
                }
            }
        }

        self.fallback.suggest_now(description)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::keywords_only()
    }
}
