//! Per-dimension toggle votes and their cached aggregates.
//!
//! A user holds at most one vote record per argument covering both
//! dimensions. Each dimension is an independent three-state machine
//! (`absent`, `+1`, `-1`): re-submitting the stored value toggles it off,
//! submitting the other value switches, and an explicit `null` clears.
//!
//! Everything in this module is pure. The store runs [`VoteRequest::resolve`]
//! inside its transaction and applies the resulting [`VoteDeltas`] as atomic
//! increments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Values ──────────────────────────────────────────────────────────────────

/// A signed unit vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteValue {
  Up,
  Down,
}

impl VoteValue {
  pub fn as_i64(self) -> i64 {
    match self {
      Self::Up => 1,
      Self::Down => -1,
    }
  }

  pub fn from_i64(n: i64) -> Option<Self> {
    match n {
      1 => Some(Self::Up),
      -1 => Some(Self::Down),
      _ => None,
    }
  }

  /// Accepts any JSON number equal to exactly `1` or `-1`, so `1.0` counts.
  pub fn from_json(v: &serde_json::Value) -> Option<Self> {
    let n = v.as_f64()?;
    if n == 1.0 {
      Some(Self::Up)
    } else if n == -1.0 {
      Some(Self::Down)
    } else {
      None
    }
  }
}

impl Serialize for VoteValue {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(self.as_i64())
  }
}

impl<'de> Deserialize<'de> for VoteValue {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let n = i64::deserialize(d)?;
    Self::from_i64(n).ok_or_else(|| {
      de::Error::invalid_value(de::Unexpected::Signed(n), &"1 or -1")
    })
  }
}

/// The two independently rated qualities of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
  Soundness,
  Factuality,
}

impl Dimension {
  pub const ALL: [Dimension; 2] = [Self::Soundness, Self::Factuality];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Soundness => "soundness",
      Self::Factuality => "factuality",
    }
  }
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// What a request asks for on one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DimensionUpdate {
  /// The dimension was not mentioned; keep the stored value.
  #[default]
  Unchanged,
  /// Set this value, or clear it if it is already the stored value.
  Toggle(VoteValue),
  /// An explicit `null`: clear regardless of the stored value.
  Clear,
}

impl DimensionUpdate {
  /// Transition function of the per-dimension state machine.
  pub fn apply(self, prev: Option<VoteValue>) -> Option<VoteValue> {
    match self {
      Self::Unchanged => prev,
      Self::Clear => None,
      Self::Toggle(v) if prev == Some(v) => None,
      Self::Toggle(v) => Some(v),
    }
  }

  pub fn is_unchanged(self) -> bool { matches!(self, Self::Unchanged) }
}

/// A validated partial vote submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteRequest {
  pub soundness:  DimensionUpdate,
  pub factuality: DimensionUpdate,
}

impl VoteRequest {
  pub fn new(soundness: DimensionUpdate, factuality: DimensionUpdate) -> Result<Self> {
    let req = Self { soundness, factuality };
    if req.soundness.is_unchanged() && req.factuality.is_unchanged() {
      return Err(Error::NoVoteProvided);
    }
    Ok(req)
  }

  /// Parse the wire form `{"soundness"?: 1|-1|null, "factuality"?: 1|-1|null}`.
  ///
  /// A missing key means "leave alone"; `null` means "clear". Unknown keys
  /// are ignored.
  pub fn from_json(body: &serde_json::Value) -> Result<Self> {
    let map = body.as_object().ok_or_else(|| {
      Error::InvalidVoteValue("expected a JSON object".to_owned())
    })?;

    let field = |dim: Dimension| -> Result<DimensionUpdate> {
      match map.get(dim.as_str()) {
        None => Ok(DimensionUpdate::Unchanged),
        Some(serde_json::Value::Null) => Ok(DimensionUpdate::Clear),
        Some(v) => VoteValue::from_json(v)
          .map(DimensionUpdate::Toggle)
          .ok_or_else(|| Error::InvalidVoteValue(format!("{}: {v}", dim.as_str()))),
      }
    };

    Self::new(field(Dimension::Soundness)?, field(Dimension::Factuality)?)
  }

  pub fn get(&self, dim: Dimension) -> DimensionUpdate {
    match dim {
      Dimension::Soundness => self.soundness,
      Dimension::Factuality => self.factuality,
    }
  }

  /// Compute the next state and the aggregate deltas from the stored state.
  pub fn resolve(&self, prev: MyVote) -> VoteTransition {
    let next = MyVote {
      soundness:  self.soundness.apply(prev.soundness),
      factuality: self.factuality.apply(prev.factuality),
    };
    VoteTransition {
      prev,
      next,
      deltas: VoteDeltas {
        soundness:  DimensionDelta::between(prev.soundness, next.soundness),
        factuality: DimensionDelta::between(prev.factuality, next.factuality),
      },
    }
  }
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// One user's current values on an argument. Both `None` means no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MyVote {
  pub soundness:  Option<VoteValue>,
  pub factuality: Option<VoteValue>,
}

impl MyVote {
  pub fn is_empty(&self) -> bool {
    self.soundness.is_none() && self.factuality.is_none()
  }

  pub fn get(&self, dim: Dimension) -> Option<VoteValue> {
    match dim {
      Dimension::Soundness => self.soundness,
      Dimension::Factuality => self.factuality,
    }
  }
}

/// Change to one dimension's `{sum, count}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DimensionDelta {
  pub sum:   i64,
  pub count: i64,
}

impl DimensionDelta {
  pub fn between(prev: Option<VoteValue>, next: Option<VoteValue>) -> Self {
    let numeric = |v: Option<VoteValue>| v.map_or(0, VoteValue::as_i64);
    let count = match (prev, next) {
      (None, Some(_)) => 1,
      (Some(_), None) => -1,
      _ => 0,
    };
    Self {
      sum: numeric(next) - numeric(prev),
      count,
    }
  }

  pub fn is_zero(&self) -> bool { self.sum == 0 && self.count == 0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteDeltas {
  pub soundness:  DimensionDelta,
  pub factuality: DimensionDelta,
}

impl VoteDeltas {
  pub fn get(&self, dim: Dimension) -> DimensionDelta {
    match dim {
      Dimension::Soundness => self.soundness,
      Dimension::Factuality => self.factuality,
    }
  }

  pub fn is_zero(&self) -> bool {
    self.soundness.is_zero() && self.factuality.is_zero()
  }
}

/// The write a transition requires against the vote record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordWrite {
  Insert,
  Update,
  Delete,
  Nothing,
}

/// Result of applying a request to the stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTransition {
  pub prev:   MyVote,
  pub next:   MyVote,
  pub deltas: VoteDeltas,
}

impl VoteTransition {
  /// Records with both dimensions absent are deleted, never stored.
  pub fn record_write(&self, record_exists: bool) -> RecordWrite {
    match (self.next.is_empty(), record_exists) {
      (true, true) => RecordWrite::Delete,
      (true, false) => RecordWrite::Nothing,
      (false, false) => RecordWrite::Insert,
      (false, true) => RecordWrite::Update,
    }
  }

  /// Whether this transition puts a (new) value on `dim`, as opposed to
  /// leaving or clearing it.
  pub fn sets(&self, dim: Dimension) -> bool {
    let next = self.next.get(dim);
    next.is_some() && next != self.prev.get(dim)
  }
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// Running `{sum, count}` for one dimension of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DimensionAggregate {
  pub sum:   i64,
  pub count: i64,
}

impl DimensionAggregate {
  /// Mean sentiment in `[-1, 1]`, or `None` with no votes.
  pub fn mean(&self) -> Option<f64> {
    (self.count > 0).then(|| self.sum as f64 / self.count as f64)
  }

  pub fn apply(&mut self, delta: DimensionDelta) {
    self.sum += delta.sum;
    self.count += delta.count;
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteAggregate {
  pub soundness:  DimensionAggregate,
  pub factuality: DimensionAggregate,
}

impl VoteAggregate {
  pub fn get(&self, dim: Dimension) -> DimensionAggregate {
    match dim {
      Dimension::Soundness => self.soundness,
      Dimension::Factuality => self.factuality,
    }
  }

  pub fn apply(&mut self, deltas: VoteDeltas) {
    self.soundness.apply(deltas.soundness);
    self.factuality.apply(deltas.factuality);
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A stored per-user vote record. At least one dimension is always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
  pub vote_id:     Uuid,
  pub argument_id: Uuid,
  /// Denormalised for analytics.
  pub debate_id:   Uuid,
  pub user_id:     Uuid,
  pub soundness:   Option<VoteValue>,
  pub factuality:  Option<VoteValue>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

impl Vote {
  pub fn values(&self) -> MyVote {
    MyVote {
      soundness:  self.soundness,
      factuality: self.factuality,
    }
  }
}

/// What a vote submission returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
  pub my_vote:        MyVote,
  pub vote_aggregate: VoteAggregate,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::{DimensionUpdate::*, VoteValue::*, *};

  #[test]
  fn state_machine_transitions() {
    let cases = [
      (None, Toggle(Up), Some(Up)),
      (None, Toggle(Down), Some(Down)),
      (Some(Up), Toggle(Up), None),
      (Some(Up), Toggle(Down), Some(Down)),
      (Some(Down), Toggle(Down), None),
      (Some(Down), Toggle(Up), Some(Up)),
      (None, Clear, None),
      (Some(Up), Clear, None),
      (Some(Down), Clear, None),
      (Some(Down), Unchanged, Some(Down)),
      (None, Unchanged, None),
    ];
    for (prev, update, expected) in cases {
      assert_eq!(update.apply(prev), expected, "{prev:?} + {update:?}");
    }
  }

  #[test]
  fn deltas_follow_presence_changes() {
    assert_eq!(DimensionDelta::between(None, Some(Up)), DimensionDelta { sum: 1, count: 1 });
    assert_eq!(DimensionDelta::between(Some(Up), None), DimensionDelta { sum: -1, count: -1 });
    assert_eq!(DimensionDelta::between(Some(Up), Some(Down)), DimensionDelta { sum: -2, count: 0 });
    assert_eq!(DimensionDelta::between(Some(Down), None), DimensionDelta { sum: 1, count: -1 });
    assert!(DimensionDelta::between(None, None).is_zero());
  }

  #[test]
  fn toggling_twice_returns_to_baseline() {
    let req = VoteRequest::new(Toggle(Up), Unchanged).unwrap();
    let mut agg = VoteAggregate::default();

    let first = req.resolve(MyVote::default());
    agg.apply(first.deltas);
    assert_eq!(agg.soundness, DimensionAggregate { sum: 1, count: 1 });

    let second = req.resolve(first.next);
    agg.apply(second.deltas);
    assert_eq!(second.next, MyVote::default());
    assert_eq!(agg, VoteAggregate::default());
    assert_eq!(second.record_write(true), RecordWrite::Delete);
  }

  #[test]
  fn untouched_dimension_keeps_value_and_aggregate() {
    let prev = MyVote { soundness: Some(Down), factuality: Some(Up) };
    let t = VoteRequest::new(Toggle(Up), Unchanged).unwrap().resolve(prev);
    assert_eq!(t.next.factuality, Some(Up));
    assert!(t.deltas.factuality.is_zero());
    assert_eq!(t.deltas.soundness, DimensionDelta { sum: 2, count: 0 });
  }

  #[test]
  fn record_write_decision() {
    let set = VoteRequest::new(Toggle(Up), Unchanged).unwrap();
    assert_eq!(set.resolve(MyVote::default()).record_write(false), RecordWrite::Insert);

    let prev = MyVote { soundness: Some(Up), factuality: None };
    assert_eq!(
      VoteRequest::new(Unchanged, Toggle(Down)).unwrap().resolve(prev).record_write(true),
      RecordWrite::Update
    );

    let clear = VoteRequest::new(Clear, Clear).unwrap();
    assert_eq!(clear.resolve(MyVote::default()).record_write(false), RecordWrite::Nothing);
  }

  #[test]
  fn sets_distinguishes_setting_from_clearing() {
    let prev = MyVote { soundness: None, factuality: Some(Up) };
    let off = VoteRequest::new(Unchanged, Toggle(Up)).unwrap().resolve(prev);
    assert!(!off.sets(Dimension::Factuality));

    let flip = VoteRequest::new(Unchanged, Toggle(Down)).unwrap().resolve(prev);
    assert!(flip.sets(Dimension::Factuality));
    assert!(!flip.sets(Dimension::Soundness));
  }

  #[test]
  fn conservation_over_many_users() {
    // Deterministic pseudo-random walk over 7 users.
    let mut state = [MyVote::default(); 7];
    let mut agg = VoteAggregate::default();
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;

    for _ in 0..500 {
      seed ^= seed << 13;
      seed ^= seed >> 7;
      seed ^= seed << 17;
      let user = (seed % 7) as usize;
      let update = match (seed >> 8) % 3 {
        0 => Toggle(Up),
        1 => Toggle(Down),
        _ => Clear,
      };
      let t = VoteRequest::new(update, Unchanged).unwrap().resolve(state[user]);
      state[user] = t.next;
      agg.apply(t.deltas);

      let holders = state.iter().filter(|v| v.soundness.is_some()).count() as i64;
      let sum: i64 = state.iter().filter_map(|v| v.soundness).map(VoteValue::as_i64).sum();
      assert_eq!(agg.soundness, DimensionAggregate { sum, count: holders });
      assert_eq!(agg.factuality, DimensionAggregate::default());
    }
  }

  #[test]
  fn from_json_distinguishes_absent_null_and_values() {
    let req = VoteRequest::from_json(&json!({ "soundness": 1 })).unwrap();
    assert_eq!(req, VoteRequest { soundness: Toggle(Up), factuality: Unchanged });

    let req = VoteRequest::from_json(&json!({ "factuality": null, "soundness": -1 })).unwrap();
    assert_eq!(req, VoteRequest { soundness: Toggle(Down), factuality: Clear });
  }

  #[test]
  fn from_json_accepts_integral_floats() {
    let req = VoteRequest::from_json(&json!({ "soundness": 1.0, "factuality": -1.0 })).unwrap();
    assert_eq!(req, VoteRequest { soundness: Toggle(Up), factuality: Toggle(Down) });
  }

  #[test]
  fn from_json_rejects_bad_input() {
    assert!(matches!(VoteRequest::from_json(&json!({})), Err(Error::NoVoteProvided)));
    assert!(matches!(
      VoteRequest::from_json(&json!({ "other": 1 })),
      Err(Error::NoVoteProvided)
    ));
    for bad in [
      json!({ "soundness": 2 }),
      json!({ "soundness": 0.5 }),
      json!({ "factuality": "1" }),
      json!([1]),
    ] {
      assert!(
        matches!(VoteRequest::from_json(&bad), Err(Error::InvalidVoteValue(_))),
        "{bad}"
      );
    }
  }

  #[test]
  fn vote_values_serialise_as_signed_integers() {
    let mine = MyVote { soundness: Some(Down), factuality: None };
    assert_eq!(serde_json::to_value(mine).unwrap(), json!({ "soundness": -1, "factuality": null }));
    let back: MyVote = serde_json::from_value(json!({ "soundness": 1, "factuality": null })).unwrap();
    assert_eq!(back.soundness, Some(Up));
  }

  #[test]
  fn mean_is_undefined_without_votes() {
    assert_eq!(DimensionAggregate::default().mean(), None);
    assert_eq!(DimensionAggregate { sum: -1, count: 3 }.mean(), Some(-1.0 / 3.0));
  }
}
