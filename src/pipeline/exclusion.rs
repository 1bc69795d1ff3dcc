use crate::config::DEFAULT_EXCLUDED_TOKENS;
use crate::models::CatalogSingle;

/// Case-insensitive substring tokens that hide singles from every result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionList {
    tokens: Vec<String>,
}

impl ExclusionList {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn none() -> Self {
        Self { tokens: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.tokens.iter().any(|token| text.contains(token.as_str()))
    }

    /// Whether `single`'s group name or display name contains a token.
    pub fn excludes(&self, single: &CatalogSingle) -> bool {
        !self.is_empty() && (self.matches(&single.group_name) || self.matches(&single.display_name()))
    }
}

impl Default for ExclusionList {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_TOKENS)
    }
}
