//! Feed messages waiting to be applied to the scene.

use bevy::prelude::*;

use crate::channel::{FeedMessage, LinkEvent, Subscription};
use crate::snapshot::{MapObjectRecord, Snapshot};
use crate::store::EntityClass;

/// Non-send resource holding the scene's channel subscription.
///
/// Dropping it (with the world) unregisters the scene from the channel.
pub struct FeedInbox {
    subscription: Subscription,
}

impl FeedInbox {
    /// Wraps a subscription.
    #[must_use]
    pub const fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    /// Every message received since the last call.
    pub fn drain(&self) -> impl Iterator<Item = FeedMessage> + '_ {
        self.subscription.drain()
    }
}

/// Connection state of the feed as last reported.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub enum LinkStatus {
    /// No link event seen yet.
    #[default]
    Waiting,
    /// The feed is connected.
    Up,
    /// The feed is down; the scene shows its last state.
    Down {
        /// Cause reported by the transport.
        reason: String,
    },
}

impl LinkStatus {
    /// Applies a link event, returning `true` if the status changed.
    pub fn apply(&mut self, event: LinkEvent) -> bool {
        let next = match event {
            LinkEvent::Available => Self::Up,
            LinkEvent::Lost { reason } => Self::Down { reason },
        };
        if *self == next {
            return false;
        }
        *self = next;
        true
    }
}

/// Snapshots received but not yet reconciled.
///
/// Successive snapshots coalesce: for each entity class the newest reported
/// map wins, while detections from every snapshot are kept so none is lost
/// between frames.
#[derive(Resource, Debug, Default)]
pub struct PendingSnapshot {
    latest: Option<Snapshot>,
    detections: Vec<MapObjectRecord>,
    coalesced: usize,
}

impl PendingSnapshot {
    /// Folds `snapshot` into the pending state.
    pub fn absorb(&mut self, mut snapshot: Snapshot) {
        self.detections.append(&mut snapshot.new_detections);
        self.latest = Some(match self.latest.take() {
            Some(older) => {
                self.coalesced += 1;
                coalesce(older, snapshot)
            }
            None => snapshot,
        });
    }

    /// Removes the merged snapshot, if any.
    pub fn take_latest(&mut self) -> Option<Snapshot> {
        self.latest.take()
    }

    /// Removes every queued detection, oldest first.
    pub fn drain_detections(&mut self) -> std::vec::Drain<'_, MapObjectRecord> {
        self.detections.drain(..)
    }

    /// Number of snapshots merged into an earlier one so far.
    #[must_use]
    pub const fn coalesced(&self) -> usize {
        self.coalesced
    }

    /// Returns `true` when nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.latest.is_none() && self.detections.is_empty()
    }
}

fn coalesce(mut older: Snapshot, newer: Snapshot) -> Snapshot {
    let Snapshot {
        agents,
        targets,
        obstacles,
        new_detections: _,
        agent_detections,
        retained,
        reported,
    } = newer;
    for class in EntityClass::ALL {
        if !reported.contains(&class) {
            continue;
        }
        match class {
            EntityClass::Agent => older.agents.clone_from(&agents),
            EntityClass::Target => older.targets.clone_from(&targets),
            EntityClass::Obstacle => older.obstacles.clone_from(&obstacles),
        }
        older.retained.retain(|(c, _)| *c != class);
        older
            .retained
            .extend(retained.iter().filter(|(c, _)| *c == class).cloned());
        if !older.reported.contains(&class) {
            older.reported.push(class);
        }
    }
    older.agent_detections.extend(agent_detections);
    older
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntityId;
    use rstest::rstest;

    fn snapshot(text: &str) -> Snapshot {
        Snapshot::parse(text).unwrap_or_else(|e| panic!("{e}"))
    }

    fn target_ids(s: &Snapshot) -> Vec<String> {
        s.targets.iter().map(|t| t.id.to_string()).collect()
    }

    #[rstest]
    fn newest_entity_maps_win() {
        let mut pending = PendingSnapshot::default();
        pending.absorb(snapshot(r#"{"targets": {"a": {"position": [0, 0], "radius": 1}}}"#));
        pending.absorb(snapshot(r#"{"targets": {"b": {"position": [0, 0], "radius": 1}}}"#));
        let merged = pending.take_latest().unwrap_or_default();
        assert_eq!(target_ids(&merged), ["b"]);
        assert_eq!(pending.coalesced(), 1);
        assert!(pending.is_empty());
    }

    #[rstest]
    fn unreported_classes_keep_the_older_map() {
        let mut pending = PendingSnapshot::default();
        pending.absorb(snapshot(r#"{"targets": {"a": {"position": [0, 0], "radius": 1}}}"#));
        pending.absorb(snapshot(r#"{"obstacles": {}}"#));
        let merged = pending.take_latest().unwrap_or_default();
        assert_eq!(target_ids(&merged), ["a"]);
        assert!(merged.reported.contains(&EntityClass::Target));
        assert!(merged.reported.contains(&EntityClass::Obstacle));
    }

    #[rstest]
    fn detections_from_every_snapshot_survive() {
        let detection = |name: &str| {
            format!(
                r#"{{"new_detections": [{{"name": "{name}", "position": [0, 0],
                    "boundingBox": [[0, 0], [1, 1]], "object_type": "person"}}]}}"#
            )
        };
        let mut pending = PendingSnapshot::default();
        pending.absorb(snapshot(&detection("first")));
        pending.absorb(snapshot(&detection("second")));
        let names: Vec<String> = pending.drain_detections().map(|d| d.name).collect();
        assert_eq!(names, ["first", "second"]);
        assert!(pending.take_latest().is_some_and(|s| s.new_detections.is_empty()));
    }

    #[rstest]
    fn agent_reports_accumulate_in_order() {
        let mut pending = PendingSnapshot::default();
        pending.absorb(snapshot(r#"{"agent_detections": {"a": "x"}}"#));
        pending.absorb(snapshot(r#"{"agent_detections": {"a": "y"}}"#));
        let merged = pending.take_latest().unwrap_or_default();
        assert_eq!(
            merged.agent_detections,
            vec![
                (EntityId::from("a"), "x".to_owned()),
                (EntityId::from("a"), "y".to_owned()),
            ]
        );
    }

    #[rstest]
    #[case(LinkStatus::Waiting, LinkEvent::Available, true)]
    #[case(LinkStatus::Up, LinkEvent::Available, false)]
    #[case(LinkStatus::Up, LinkEvent::Lost { reason: "eof".to_owned() }, true)]
    fn link_status_reports_changes(
        #[case] mut status: LinkStatus,
        #[case] event: LinkEvent,
        #[case] changed: bool,
    ) {
        assert_eq!(status.apply(event), changed);
    }
}
