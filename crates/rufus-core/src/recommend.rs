//! Maps free-text model output onto catalog entries.
//!
//! The model is asked to answer with either a sentinel token or a
//! comma-separated list of product ids. This module turns that raw text into
//! an ordered list of resolved products plus a classification of what
//! happened.

use crate::catalog::{CatalogStore, Product};

/// The token the model is instructed to emit when nothing matches.
pub const NO_MATCH_SENTINEL: &str = "NOMATCH";

const NO_MATCH_FRAGMENT: &str =
    " I couldn't find specific products matching that description in our current selection...";
const EMPTY_RESPONSE_FRAGMENT: &str =
    " I wasn't able to pinpoint specific recommendations from the response received...";
const RESOLVED_FRAGMENT: &str = " here are some recommendations:";
const UNPROCESSED_DETAILS_FRAGMENT: &str =
    " I found some potential matches but couldn't fully process their details...";
const IDS_NOT_FOUND_FRAGMENT: &str =
    " I looked for those product IDs but couldn't find them in our records...";

/// Classification of one parse of model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// The model answered with the sentinel, or with nothing at all.
    NoMatch,
    /// At least one id resolved to a materialized product.
    Resolved,
    /// Ids were parsed but none produced a product.
    Partial,
    /// The text split into zero usable ids.
    EmptyResponse,
}

/// The transient result of resolving one model reply.
#[derive(Debug, Clone)]
pub struct RecommendationOutcome {
    /// Resolved products in the order the model named them. Repeated ids are
    /// kept repeated.
    pub products: Vec<Product>,
    pub kind: OutcomeKind,
    /// Fixed sentence fragment appended to the user-facing status message.
    pub status_fragment: &'static str,
}

impl RecommendationOutcome {
    fn new(products: Vec<Product>, kind: OutcomeKind, status_fragment: &'static str) -> Self {
        Self {
            products,
            kind,
            status_fragment,
        }
    }
}

/// Resolves raw model text against the catalog.
///
/// Pure function of its inputs: the same text and catalog always produce the
/// same outcome. Unknown ids and unmaterializable records are logged and
/// skipped, never raised. The number of ids is not capped here; whatever the
/// model returned gets resolved.
pub fn resolve(llm_text: &str, catalog: &CatalogStore) -> RecommendationOutcome {
    let trimmed = llm_text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NO_MATCH_SENTINEL) {
        return RecommendationOutcome::new(Vec::new(), OutcomeKind::NoMatch, NO_MATCH_FRAGMENT);
    }

    let ids: Vec<&str> = trimmed
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();
    if ids.is_empty() {
        return RecommendationOutcome::new(
            Vec::new(),
            OutcomeKind::EmptyResponse,
            EMPTY_RESPONSE_FRAGMENT,
        );
    }

    let mut products = Vec::new();
    let mut found_any = false;
    for id in ids {
        match catalog.lookup(id) {
            Some(record) => {
                found_any = true;
                match Product::from_record(record) {
                    Ok(product) => products.push(product),
                    Err(err) => tracing::warn!("Skipping recommended product '{}': {}", id, err),
                }
            }
            None => tracing::warn!("Recommended product id '{}' is not in the catalog", id),
        }
    }

    if !products.is_empty() {
        RecommendationOutcome::new(products, OutcomeKind::Resolved, RESOLVED_FRAGMENT)
    } else if found_any {
        RecommendationOutcome::new(Vec::new(), OutcomeKind::Partial, UNPROCESSED_DETAILS_FRAGMENT)
    } else {
        RecommendationOutcome::new(Vec::new(), OutcomeKind::Partial, IDS_NOT_FOUND_FRAGMENT)
    }
}
