// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replay state machine
//!
//! [`DestinationPool`] consumes decoded journal records in location order
//! and routes each one to a destination ledger or to the transaction
//! tracker. After the last record and a call to [`DestinationPool::gc`],
//! [`DestinationPool::live_locations`] names every record a compacted
//! journal must keep.

use crate::error::ApplyError;
use crate::ledger::{AckOutcome, DestinationLedger};
use crate::tracker::{BufferedOperation, OperationLocation, TransactionTracker};
use jo_core::{
    AddMessage, CommandKind, DestinationId, DestinationKind, JournalCommand, MessageId,
    RemoveMessage, Subscription, SubscriptionKey, TransactionId,
};
use jo_storage::Location;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Counters gathered during replay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub records: u64,
    pub by_kind: BTreeMap<&'static str, u64>,
    /// Records that referenced state the journal never established
    pub violations: u64,
}

impl ReplayStats {
    fn record(&mut self, kind: CommandKind) {
        self.records += 1;
        *self.by_kind.entry(kind.name()).or_default() += 1;
    }

    pub fn count(&self, kind: CommandKind) -> u64 {
        self.by_kind.get(kind.name()).copied().unwrap_or(0)
    }
}

/// Records a compacted journal must keep, each set sorted ascending
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveLocations {
    pub subscriptions: Vec<Location>,
    pub messages: Vec<Location>,
}

impl LiveLocations {
    pub fn len(&self) -> usize {
        self.subscriptions.len() + self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty() && self.messages.is_empty()
    }

    /// Both sets as one ascending, duplicate-free sequence
    pub fn merged(&self) -> Vec<Location> {
        let mut out = Vec::with_capacity(self.len());
        let mut subs = self.subscriptions.iter().copied().peekable();
        let mut msgs = self.messages.iter().copied().peekable();

        loop {
            let next = match (subs.peek(), msgs.peek()) {
                (Some(s), Some(m)) if s <= m => subs.next(),
                (Some(_), Some(_)) => msgs.next(),
                (Some(_), None) => subs.next(),
                (None, Some(_)) => msgs.next(),
                (None, None) => break,
            };
            if let Some(location) = next {
                if out.last() != Some(&location) {
                    out.push(location);
                }
            }
        }
        out
    }
}

/// Logical content of one destination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationSnapshot {
    pub messages: BTreeSet<MessageId>,
    pub subscriptions: BTreeSet<SubscriptionKey>,
}

/// Logical end state of a replay, independent of record locations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub destinations: BTreeMap<DestinationId, DestinationSnapshot>,
    pub prepared: BTreeSet<TransactionId>,
}

impl PoolSnapshot {
    pub fn message_count(&self) -> usize {
        self.destinations.values().map(|d| d.messages.len()).sum()
    }
}

enum RemoveOutcome {
    Destroyed,
    Acked,
    NotPending,
    UnknownMessage,
    MissingKey,
}

/// Single-pass interpreter over a journal
#[derive(Debug, Default)]
pub struct DestinationPool {
    ledgers: BTreeMap<DestinationId, DestinationLedger>,
    tracker: TransactionTracker,
    last_location: Option<Location>,
    stats: ReplayStats,
}

impl DestinationPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw record and apply it
    pub fn apply_record(&mut self, bytes: &[u8], location: Location) -> Result<(), ApplyError> {
        let command =
            jo_core::decode(bytes).map_err(|source| ApplyError::Decode { location, source })?;
        self.apply(command, location)
    }

    /// Apply one command; locations must strictly increase across calls
    pub fn apply(&mut self, command: JournalCommand, location: Location) -> Result<(), ApplyError> {
        if let Some(previous) = self.last_location {
            if location <= previous {
                return Err(ApplyError::OutOfOrder { location, previous });
            }
        }
        self.last_location = Some(location);
        self.stats.record(command.kind());

        match command {
            JournalCommand::AddMessage(add) => self.add_message(add, location),
            JournalCommand::UpdateMessage(add) => self.update_message(add, location),
            JournalCommand::RemoveMessage(remove) => self.remove_message(remove, location),
            JournalCommand::RemoveDestination(remove) => {
                self.remove_destination(&remove.destination)
            }
            JournalCommand::Subscription(sub) => self.subscription(sub, location),
            JournalCommand::Commit(marker) => self.commit(marker.transaction, location),
            JournalCommand::Prepare(marker) => self.prepare(marker.transaction, location),
            JournalCommand::Rollback(marker) => self.rollback(&marker.transaction),
            JournalCommand::Informational(info) => {
                tracing::trace!(%location, ?info, "skipping informational record");
            }
        }
        Ok(())
    }

    /// Drop transactions left unresolved at end of journal
    pub fn gc(&mut self) -> usize {
        let dropped = self.tracker.gc();
        if dropped > 0 {
            tracing::info!(dropped, "discarded unresolved transactions");
        }
        dropped
    }

    pub fn live_locations(&self) -> LiveLocations {
        let mut subscriptions: Vec<_> = self
            .ledgers
            .values()
            .flat_map(|ledger| ledger.subscription_locations())
            .collect();
        subscriptions.sort();
        subscriptions.dedup();

        let mut messages = BTreeSet::new();
        for ledger in self.ledgers.values() {
            messages.extend(ledger.message_locations());
        }
        self.tracker.live_locations(&mut messages);

        LiveLocations {
            subscriptions,
            messages: messages.into_iter().collect(),
        }
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let destinations = self
            .ledgers
            .iter()
            .map(|(id, ledger)| {
                let snapshot = DestinationSnapshot {
                    messages: ledger.messages().map(|m| m.message_id.clone()).collect(),
                    subscriptions: ledger.subscriptions().map(|s| s.key.clone()).collect(),
                };
                (id.clone(), snapshot)
            })
            .collect();
        let prepared = self.tracker.prepared().map(|(tx, _)| tx.clone()).collect();

        PoolSnapshot {
            destinations,
            prepared,
        }
    }

    /// No destinations and no transactions worth keeping
    pub fn is_empty(&self) -> bool {
        self.ledgers.is_empty()
            && self.tracker.prepared_count() == 0
            && self.tracker.committed_count() == 0
    }

    pub fn topic_count(&self) -> usize {
        self.count_kind(DestinationKind::Topic)
    }

    pub fn queue_count(&self) -> usize {
        self.count_kind(DestinationKind::Queue)
    }

    pub fn prepared_count(&self) -> usize {
        self.tracker.prepared_count()
    }

    pub fn committed_count(&self) -> usize {
        self.tracker.committed_count()
    }

    pub fn in_flight_count(&self) -> usize {
        self.tracker.in_flight_count()
    }

    pub fn ledger(&self, destination: &DestinationId) -> Option<&DestinationLedger> {
        self.ledgers.get(destination)
    }

    pub fn ledgers(&self) -> impl Iterator<Item = &DestinationLedger> {
        self.ledgers.values()
    }

    pub fn tracker(&self) -> &TransactionTracker {
        &self.tracker
    }

    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }

    fn count_kind(&self, kind: DestinationKind) -> usize {
        self.ledgers.keys().filter(|id| id.kind == kind).count()
    }

    fn add_message(&mut self, add: AddMessage, location: Location) {
        match add.transaction.clone() {
            Some(transaction) => self
                .tracker
                .buffer(transaction, OperationLocation::add(add, location)),
            None => self.apply_add(&add, location),
        }
    }

    fn apply_add(&mut self, add: &AddMessage, location: Location) {
        let ledger = self
            .ledgers
            .entry(add.destination.clone())
            .or_insert_with(|| DestinationLedger::new(add.destination.clone()));
        if !ledger.add_message(add.message_id.clone(), location) {
            tracing::debug!(
                destination = %add.destination,
                message_id = %add.message_id,
                %location,
                "duplicate add ignored"
            );
        }
    }

    fn update_message(&mut self, add: AddMessage, location: Location) {
        let moved = self
            .ledgers
            .get_mut(&add.destination)
            .is_some_and(|ledger| ledger.update_location(&add.message_id, location));
        if !moved {
            self.add_message(add, location);
        }
    }

    fn remove_message(&mut self, remove: RemoveMessage, location: Location) {
        match remove.transaction.clone() {
            Some(transaction) => self
                .tracker
                .buffer(transaction, OperationLocation::remove(remove, location)),
            None => self.apply_remove(&remove, location),
        }
    }

    fn apply_remove(&mut self, remove: &RemoveMessage, location: Location) {
        let destination = &remove.destination;
        let outcome = match self.ledgers.get_mut(destination) {
            None => RemoveOutcome::UnknownMessage,
            Some(ledger) if destination.is_topic() => match &remove.subscription_key {
                Some(key) => match ledger.ack_message(&remove.message_id, key, location) {
                    AckOutcome::Completed(_) => RemoveOutcome::Destroyed,
                    AckOutcome::Recorded => RemoveOutcome::Acked,
                    AckOutcome::NotPending => RemoveOutcome::NotPending,
                    AckOutcome::UnknownMessage => RemoveOutcome::UnknownMessage,
                },
                None => RemoveOutcome::MissingKey,
            },
            Some(ledger) => match ledger.remove_message(&remove.message_id) {
                Some(_) => RemoveOutcome::Destroyed,
                None => RemoveOutcome::UnknownMessage,
            },
        };

        match outcome {
            RemoveOutcome::Destroyed => {
                self.tracker.forget_message(destination, &remove.message_id);
                self.prune_if_empty(destination);
            }
            RemoveOutcome::Acked => {}
            RemoveOutcome::NotPending => {
                tracing::debug!(
                    %destination,
                    message_id = %remove.message_id,
                    %location,
                    "ack from subscription that owed nothing"
                );
            }
            RemoveOutcome::UnknownMessage => {
                self.violation(
                    location,
                    "remove of unknown message",
                    destination,
                    &remove.message_id,
                );
                self.tracker.forget_message(destination, &remove.message_id);
            }
            RemoveOutcome::MissingKey => {
                self.violation(
                    location,
                    "topic remove without subscription key",
                    destination,
                    &remove.message_id,
                );
            }
        }
    }

    fn remove_destination(&mut self, destination: &DestinationId) {
        if self.ledgers.remove(destination).is_some() {
            tracing::debug!(%destination, "destination removed");
        }
        self.tracker.forget_destination(destination);
    }

    fn subscription(&mut self, sub: Subscription, location: Location) {
        let destination = sub.destination;
        if !destination.is_topic() {
            tracing::debug!(%destination, %location, "subscription on queue ignored");
            return;
        }

        if sub.subscription_info.is_none() {
            let Some(ledger) = self.ledgers.get_mut(&destination) else {
                tracing::debug!(
                    %destination,
                    key = %sub.subscription_key,
                    "unsubscribe from unknown destination"
                );
                return;
            };
            let pruned = ledger.remove_subscription(&sub.subscription_key, location);
            for record in &pruned {
                self.tracker.forget_message(&destination, &record.message_id);
            }
            self.tracker.forget_acks(&destination, &sub.subscription_key);
            self.prune_if_empty(&destination);
            return;
        }

        let ledger = self
            .ledgers
            .entry(destination.clone())
            .or_insert_with(|| DestinationLedger::new(destination.clone()));
        let outcome = ledger.add_subscription(sub.subscription_key, location, sub.retroactive);
        tracing::trace!(%destination, %location, ?outcome, "subscription");
    }

    fn commit(&mut self, transaction: TransactionId, location: Location) {
        let Some(operations) = self.tracker.take_for_commit(&transaction) else {
            tracing::debug!(%transaction, %location, "commit of unknown transaction");
            return;
        };

        for operation in &operations {
            match &operation.operation {
                BufferedOperation::Add(add) => self.apply_add(add, operation.location),
                BufferedOperation::Remove(remove) => self.apply_remove(remove, operation.location),
            }
        }

        // Only the add that created a live record and the acks it still holds
        let still_needed = operations
            .into_iter()
            .filter(|op| self.still_needed(op))
            .collect();
        self.tracker.retain_committed(transaction, location, still_needed);
    }

    /// Whether replaying `op` is needed to rebuild a live record
    fn still_needed(&self, op: &OperationLocation) -> bool {
        let Some(record) = self
            .ledgers
            .get(op.destination())
            .and_then(|ledger| ledger.message(op.message_id()))
        else {
            return false;
        };
        match op.operation {
            BufferedOperation::Add(_) => record.added_at == op.location,
            BufferedOperation::Remove(_) => record.has_ack_at(op.location),
        }
    }

    fn prepare(&mut self, transaction: TransactionId, location: Location) {
        if !self.tracker.prepare(transaction.clone(), location) {
            tracing::debug!(%transaction, %location, "prepare without buffered operations");
        }
    }

    fn rollback(&mut self, transaction: &TransactionId) {
        if !self.tracker.rollback(transaction) {
            tracing::debug!(%transaction, "rollback of unknown transaction");
        }
    }

    fn prune_if_empty(&mut self, destination: &DestinationId) {
        if self.ledgers.get(destination).is_some_and(|l| l.is_empty()) {
            self.ledgers.remove(destination);
        }
    }

    fn violation(
        &mut self,
        location: Location,
        reason: &str,
        destination: &DestinationId,
        message_id: &MessageId,
    ) {
        self.stats.violations += 1;
        tracing::warn!(%location, %destination, %message_id, "{}", reason);
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
