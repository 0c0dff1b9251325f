//! Read-side thread reconstruction.
//!
//! A thread is fetched flat (the root plus everything whose `root_id` is the
//! root) and rebuilt here into "indented comment" order: each reply is
//! immediately followed by its own replies, siblings in creation order.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use crate::argument::Argument;

/// A root argument together with its replies in pre-order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadView {
  pub root:    Argument,
  pub replies: Vec<Argument>,
}

/// Order the non-root records of one thread by a pre-order walk from
/// `root_id`.
///
/// `records` must be in creation order; that order is kept among siblings.
/// A record whose parent is not among `records` hangs off the root. The
/// root itself, if present, is not emitted. Every other record is emitted
/// exactly once, even if corrupt ancestry makes it unreachable from the
/// root; such records follow the root's subtree in input order.
pub fn reconstruct(root_id: Uuid, records: Vec<Argument>) -> Vec<Argument> {
  let present: HashSet<Uuid> = records.iter().map(|a| a.argument_id).collect();

  // Bucket each record under its effective parent, remembering input order.
  let mut order: Vec<Uuid> = Vec::with_capacity(records.len());
  let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
  let mut by_id: HashMap<Uuid, Argument> = HashMap::with_capacity(records.len());

  for arg in records {
    let id = arg.argument_id;
    if id == root_id || by_id.contains_key(&id) {
      continue;
    }
    let parent = arg
      .parent_id
      .filter(|p| *p != id && present.contains(p))
      .unwrap_or(root_id);
    children.entry(parent).or_default().push(id);
    order.push(id);
    by_id.insert(id, arg);
  }

  let mut out = Vec::with_capacity(by_id.len());
  walk(root_id, &children, &mut by_id, &mut out);

  // Anything left was not reachable from the root (a parent cycle).
  for id in order {
    if let Some(arg) = by_id.remove(&id) {
      out.push(arg);
      walk(id, &children, &mut by_id, &mut out);
    }
  }

  out
}

/// Iterative pre-order emission of the descendants of `from`.
fn walk(
  from: Uuid,
  children: &HashMap<Uuid, Vec<Uuid>>,
  remaining: &mut HashMap<Uuid, Argument>,
  out: &mut Vec<Argument>,
) {
  let mut stack: Vec<Uuid> = children
    .get(&from)
    .map(|c| c.iter().rev().copied().collect())
    .unwrap_or_default();

  while let Some(id) = stack.pop() {
    // Already emitted ids are skipped; this also terminates on cycles.
    let Some(arg) = remaining.remove(&id) else { continue };
    out.push(arg);
    if let Some(kids) = children.get(&id) {
      stack.extend(kids.iter().rev().copied());
    }
  }
}
