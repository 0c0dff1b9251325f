//! Evidence items embedded in an argument.
//!
//! Evidence travels with its argument document. Each item gets an id at
//! submission time so later critiques can target a single item.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type tag applied when the submitter does not name one.
pub const DEFAULT_EVIDENCE_TYPE: &str = "other";

/// A persisted evidence item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
  pub evidence_id:   Uuid,
  pub url:           Option<String>,
  pub title:         Option<String>,
  pub quote:         Option<String>,
  /// Page, section, timecode or similar pointer into the source.
  pub locator:       Option<String>,
  pub evidence_type: String,
}

/// An evidence item as submitted by a client, before sanitisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvidence {
  pub url:           Option<String>,
  pub title:         Option<String>,
  pub quote:         Option<String>,
  pub locator:       Option<String>,
  pub evidence_type: Option<String>,
}

fn clean(field: Option<String>) -> Option<String> {
  field
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
}

impl NewEvidence {
  /// Trim every field and assign an id. Returns `None` when url, title and
  /// quote are all empty; a locator or type tag alone is not evidence.
  pub fn sanitize(self) -> Option<Evidence> {
    let url = clean(self.url);
    let title = clean(self.title);
    let quote = clean(self.quote);

    if url.is_none() && title.is_none() && quote.is_none() {
      return None;
    }

    let evidence_type = clean(self.evidence_type)
      .map(|t| t.to_lowercase())
      .unwrap_or_else(|| DEFAULT_EVIDENCE_TYPE.to_owned());

    Some(Evidence {
      evidence_id: Uuid::new_v4(),
      url,
      title,
      quote,
      locator: clean(self.locator),
      evidence_type,
    })
  }
}

/// Sanitise a submitted list, dropping fully-empty entries and keeping the
/// order of the rest.
pub fn sanitize_all(items: Vec<NewEvidence>) -> Vec<Evidence> {
  items.into_iter().filter_map(NewEvidence::sanitize).collect()
}

/// Decode an evidence payload leniently.
///
/// Accepts a JSON array or a string containing a JSON array (form posts
/// encode the list that way). Anything malformed yields no evidence rather
/// than an error.
pub fn parse_payload(payload: Option<&serde_json::Value>) -> Vec<NewEvidence> {
  match payload {
    Some(serde_json::Value::String(raw)) => {
      serde_json::from_str(raw).unwrap_or_default()
    }
    Some(value @ serde_json::Value::Array(_)) => {
      serde_json::from_value(value.clone()).unwrap_or_default()
    }
    _ => Vec::new(),
  }
}
