//! Success-response envelopes.
//!
//! Every successful response is `{ success: true, data, timestamp }`.
//! List responses additionally carry pagination bookkeeping and the facet
//! metadata block inside `data`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use verdict_core::{decision::Decision, plan::Page, store::FilterMetadata};

/// The standard success envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub success:   bool,
  pub data:      T,
  pub timestamp: DateTime<Utc>,
}

impl<T> Envelope<T> {
  pub fn ok(data: T) -> Self {
    Self {
      success:   true,
      data,
      timestamp: Utc::now(),
    }
  }
}

/// `data` payload for `GET /decisions`.
#[derive(Debug, Serialize)]
pub struct DecisionList {
  pub decisions: Vec<Decision>,
  pub total:     usize,
  #[serde(rename = "hasMore")]
  pub has_more:  bool,
  pub limit:     usize,
  pub offset:    usize,
  pub metadata:  FilterMetadata,
}

impl DecisionList {
  pub fn from_parts(page: Page<Decision>, metadata: FilterMetadata) -> Self {
    let has_more = page.has_more();
    Self {
      decisions: page.items,
      total: page.total,
      has_more,
      limit: page.limit,
      offset: page.offset,
      metadata,
    }
  }
}
