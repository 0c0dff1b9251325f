//! Independently configurable content policies.

use serde::Deserialize;

/// Deployment-wide switches that tighten argument creation and voting.
///
/// The two flags are independent. Requiring evidence at creation time does
/// not gate factuality votes, and gating factuality votes does not make
/// evidence mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Policy {
  /// New arguments must carry at least one well-formed evidence item.
  pub require_evidence:             bool,
  /// Factuality may only be rated on arguments that carry evidence.
  pub factuality_requires_evidence: bool,
}

impl Default for Policy {
  fn default() -> Self {
    Self {
      require_evidence:             true,
      factuality_requires_evidence: true,
    }
  }
}

impl Policy {
  /// Everything allowed; handy for tests and permissive deployments.
  pub fn permissive() -> Self {
    Self {
      require_evidence:             false,
      factuality_requires_evidence: false,
    }
  }
}
