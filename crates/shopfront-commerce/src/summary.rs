//! AI review summaries.
//!
//! The summarizer is an external, fallible collaborator. Failures never
//! surface as errors to the shopper: they collapse to an empty summary and
//! the shopper may ask again.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::catalog::Product;
use crate::ids::ProductId;
use crate::CommerceError;

/// Text-generation collaborator producing a short review digest.
#[async_trait]
pub trait ReviewSummarizer: Send + Sync {
    async fn summarize(&self, product: &Product) -> Result<String, CommerceError>;
}

/// Run the summarizer, swallowing failures and timeouts as an empty string.
pub async fn generate_summary(
    summarizer: &dyn ReviewSummarizer,
    product: &Product,
    timeout: Option<Duration>,
) -> String {
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, summarizer.summarize(product)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(CommerceError::SummaryUnavailable("timed out".to_string())),
        },
        None => summarizer.summarize(product).await,
    };

    match outcome {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            tracing::warn!(product_id = %product.id, error = %e, "review summary failed");
            String::new()
        }
    }
}

/// Summary status for one product.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SummaryState {
    #[default]
    Idle,
    Pending,
    /// Finished. Empty text means generation failed.
    Ready(String),
}

impl SummaryState {
    pub fn is_pending(&self) -> bool {
        matches!(self, SummaryState::Pending)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            SummaryState::Ready(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

/// Per-product summary states.
///
/// Split into `begin` and `finish` so callers need not hold the store
/// across the collaborator's await point.
#[derive(Debug, Clone, Default)]
pub struct ReviewSummaries {
    states: HashMap<ProductId, SummaryState>,
}

impl ReviewSummaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a product pending. Returns `false` if a request is already running.
    pub fn begin(&mut self, product_id: &ProductId) -> bool {
        let state = self.states.entry(product_id.clone()).or_default();
        if state.is_pending() {
            return false;
        }
        *state = SummaryState::Pending;
        true
    }

    /// Store the result of a request started with [`begin`](Self::begin).
    pub fn finish(&mut self, product_id: &ProductId, text: String) {
        self.states
            .insert(product_id.clone(), SummaryState::Ready(text));
    }

    pub fn state(&self, product_id: &ProductId) -> SummaryState {
        self.states.get(product_id).cloned().unwrap_or_default()
    }

    pub fn reset(&mut self, product_id: &ProductId) {
        self.states.remove(product_id);
    }
}

/// Offline summarizer that writes a digest from the rating and spec sheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSummarizer;

#[async_trait]
impl ReviewSummarizer for TemplateSummarizer {
    async fn summarize(&self, product: &Product) -> Result<String, CommerceError> {
        if product.review_count == 0 {
            return Err(CommerceError::SummaryUnavailable(format!(
                "{} has no reviews",
                product.id
            )));
        }
        let verdict = match product.rating {
            r if r >= 4.5 => "Shoppers love it",
            r if r >= 3.5 => "Mostly positive feedback",
            _ => "Mixed feedback",
        };
        let mut text = format!(
            "{verdict}: {:.1}/5 from {} reviews of the {} {}.",
            product.rating, product.review_count, product.brand, product.name
        );
        if let Some((key, value)) = product.specifications.iter().next() {
            text.push_str(&format!(" Often praised: {key} ({value})."));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Currency, Money};

    struct Failing;

    #[async_trait]
    impl ReviewSummarizer for Failing {
        async fn summarize(&self, _product: &Product) -> Result<String, CommerceError> {
            Err(CommerceError::SummaryUnavailable("quota exceeded".to_string()))
        }
    }

    struct Slow;

    #[async_trait]
    impl ReviewSummarizer for Slow {
        async fn summarize(&self, _product: &Product) -> Result<String, CommerceError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("late".to_string())
        }
    }

    fn product() -> Product {
        let mut product = Product::new("p1", "AirPods Pro", Money::from_major(75, Currency::KWD), 9)
            .with_brand("Apple");
        product.rating = 4.7;
        product.review_count = 310;
        product
    }

    #[tokio::test]
    async fn test_template_summary() {
        let text = generate_summary(&TemplateSummarizer, &product(), None).await;
        assert!(text.starts_with("Shoppers love it: 4.7/5 from 310 reviews"));
    }

    #[tokio::test]
    async fn test_failure_becomes_empty() {
        assert_eq!(generate_summary(&Failing, &product(), None).await, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_empty() {
        let text = generate_summary(&Slow, &product(), Some(Duration::from_secs(5))).await;
        assert_eq!(text, "");
    }

    #[test]
    fn test_begin_finish() {
        let mut summaries = ReviewSummaries::new();
        let id = ProductId::new("p1");
        assert_eq!(summaries.state(&id), SummaryState::Idle);

        assert!(summaries.begin(&id));
        assert!(!summaries.begin(&id));
        assert!(summaries.state(&id).is_pending());

        summaries.finish(&id, String::new());
        assert_eq!(summaries.state(&id).text(), None);

        // Retrying after a failure is allowed.
        assert!(summaries.begin(&id));
        summaries.finish(&id, "Great battery".to_string());
        assert_eq!(summaries.state(&id).text(), Some("Great battery"));
    }
}
