//! Pooled envelope payloads travelling with imported tracks.
//!
//! A track only references pools by id. When it is imported, the payload is
//! copied into the project. An id already used there by a different payload
//! gets a fresh id and the track's `POOLEDENVINST` lines are rewritten.

use std::collections::BTreeMap;

use rpp::token::{self, tokenize};
use rpp::{Chunk, Node, Session};
use tracing::debug;

use crate::host::TrackHost;

/// Payloads and id changes for one destination, applied only once the
/// destination's merged track was accepted.
#[derive(Debug, Default)]
pub struct PoolPlan {
    ids: Vec<((usize, u32), u32)>,
    payloads: Vec<(u32, Chunk)>,
}

impl PoolPlan {
    fn payload(&self, id: u32) -> Option<&Chunk> {
        self.payloads.iter().find(|(i, _)| *i == id).map(|(_, c)| c)
    }

    fn id(&self, key: (usize, u32)) -> Option<u32> {
        self.ids.iter().find(|(k, _)| *k == key).map(|(_, id)| *id)
    }
}

/// Ids given to each session's pools so far, across destinations.
#[derive(Debug, Default)]
pub struct PoolLedger {
    assigned: BTreeMap<(usize, u32), u32>,
}

impl PoolLedger {
    /// Bring the pools `track` uses into `plan` and rewrite its references.
    ///
    /// Returns the ids the session does not carry.
    pub fn attach(
        &self,
        plan: &mut PoolPlan,
        host: &impl TrackHost,
        session_index: usize,
        session: &Session,
        track: &mut Chunk,
        uses: impl IntoIterator<Item = u32>,
    ) -> Vec<u32> {
        let mut missing = Vec::new();
        let mut rename = BTreeMap::new();

        for id in uses {
            let key = (session_index, id);
            if let Some(new) = self.assigned.get(&key).copied().or_else(|| plan.id(key)) {
                rename.insert(id, new);
                continue;
            }
            let Some(pool) = session.pool(id) else {
                missing.push(id);
                continue;
            };

            let new = free_id(plan, host, id, &pool.chunk);
            if new != id {
                debug!(session = session_index, from = id, to = new, "renumbered pooled envelope");
            }
            if plan.payload(new).is_none() && host.pool(new).is_none() {
                let mut payload = pool.chunk.clone();
                payload.set_field("ID", &new.to_string());
                plan.payloads.push((new, payload));
            }
            plan.ids.push((key, new));
            rename.insert(id, new);
        }

        if rename.iter().any(|(old, new)| old != new) {
            rename_instances(track, &rename);
        }
        missing
    }

    /// Add the planned payloads to the host and remember the ids.
    pub fn commit(&mut self, plan: PoolPlan, host: &mut impl TrackHost) {
        for (_, payload) in plan.payloads {
            host.add_pool(payload);
        }
        self.assigned.extend(plan.ids);
    }
}

/// `id` when it is free or already holds the same payload, else the next
/// unused id.
fn free_id(plan: &PoolPlan, host: &impl TrackHost, id: u32, payload: &Chunk) -> u32 {
    let holds_same = |candidate: u32| -> Option<bool> {
        let existing = plan.payload(candidate).cloned().or_else(|| host.pool(candidate))?;
        let mut ours = payload.clone();
        ours.set_field("ID", &candidate.to_string());
        Some(existing == ours)
    };

    match holds_same(id) {
        None | Some(true) => id,
        Some(false) => {
            let highest = host
                .pool_ids()
                .into_iter()
                .chain(plan.payloads.iter().map(|(i, _)| *i))
                .max()
                .unwrap_or(id);
            highest.max(id) + 1
        }
    }
}

fn rename_instances(chunk: &mut Chunk, rename: &BTreeMap<u32, u32>) {
    for node in chunk.children.iter_mut() {
        match node {
            Node::Block(b) if !b.is("ITEM") => rename_instances(b, rename),
            Node::Line(line) if token::field_name(line) == Some("POOLEDENVINST") => {
                let toks = tokenize(line);
                let Some(old) = toks.get(1).and_then(|t| t.as_i64()) else {
                    continue;
                };
                if let Some(new) = rename.get(&(old.max(0) as u32)) {
                    let mut rendered: Vec<String> = toks.iter().map(|t| t.render()).collect();
                    rendered[1] = new.to_string();
                    *line = rendered.join(" ");
                }
            }
            _ => {}
        }
    }
}
