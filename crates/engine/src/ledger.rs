// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-destination message and subscription liveness
//!
//! Messages are kept in insertion order under a monotonically increasing
//! sequence, with a hash index by message id. The highest sequence is the
//! most recently added live message.
//!
//! A removed subscription stays on record for as long as a live message was
//! once owed its ack. Replaying such a message needs the subscribe and
//! unsubscribe records that bracketed the obligation; without them an ack
//! from another subscriber could complete it early.

use jo_core::{DestinationId, MessageId, SubscriptionKey};
use jo_storage::Location;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A stored message and the acknowledgements it still waits for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub message_id: MessageId,
    /// Record that created this entry
    pub added_at: Location,
    /// Latest copy of the message; differs from `added_at` after an update
    pub location: Location,
    pending_acks: BTreeSet<SubscriptionKey>,
    acks: Vec<(SubscriptionKey, Location)>,
    ever_acked: bool,
    /// Creation records of every subscription ever owed an ack
    obligations: BTreeSet<Location>,
}

impl MessageRecord {
    fn new(message_id: MessageId, location: Location) -> Self {
        Self {
            message_id,
            added_at: location,
            location,
            pending_acks: BTreeSet::new(),
            acks: Vec::new(),
            ever_acked: false,
            obligations: BTreeSet::new(),
        }
    }

    /// Subscriptions that must still acknowledge this message
    pub fn pending_acks(&self) -> &BTreeSet<SubscriptionKey> {
        &self.pending_acks
    }

    /// Acknowledgements from live subscriptions, in arrival order
    pub fn acks(&self) -> &[(SubscriptionKey, Location)] {
        &self.acks
    }

    /// No subscription owes an ack and at least one ack arrived
    ///
    /// Acks from subscriptions that later went away still count.
    pub fn is_fully_acked(&self) -> bool {
        self.pending_acks.is_empty() && self.ever_acked
    }

    /// Creation locations of the subscriptions this message has owed acks to
    pub fn obligations(&self) -> &BTreeSet<Location> {
        &self.obligations
    }

    /// Whether the ack read from `location` is still on record
    pub fn has_ack_at(&self, location: Location) -> bool {
        self.acks.iter().any(|(_, at)| *at == location)
    }

    /// Add and update locations followed by ack locations
    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        let moved = (self.location != self.added_at).then_some(self.location);
        std::iter::once(self.added_at)
            .chain(moved)
            .chain(self.acks.iter().map(|(_, loc)| *loc))
    }

    fn owe(&mut self, subscription: &SubscriptionRecord) {
        self.pending_acks.insert(subscription.key.clone());
        self.obligations.insert(subscription.created_at);
    }

    fn record_ack(&mut self, key: &SubscriptionKey, location: Location) -> bool {
        if !self.pending_acks.remove(key) {
            return false;
        }
        self.acks.push((key.clone(), location));
        self.ever_acked = true;
        true
    }

    /// Forget everything tying this record to `key`
    fn release(&mut self, key: &SubscriptionKey) {
        self.pending_acks.remove(key);
        self.acks.retain(|(k, _)| k != key);
    }
}

/// A durable topic subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub key: SubscriptionKey,
    /// Record that created the subscription and fixed its obligations
    pub created_at: Location,
    /// Latest record carrying the subscription info
    pub location: Location,
    pub retroactive: bool,
}

impl SubscriptionRecord {
    /// Locations a replay needs to rebuild this subscription
    pub fn locations(&self) -> impl Iterator<Item = Location> {
        let moved = (self.location != self.created_at).then_some(self.location);
        std::iter::once(self.created_at).chain(moved)
    }
}

/// Outcome of recording an acknowledgement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckOutcome {
    /// No live record with that id
    UnknownMessage,
    /// The key owed nothing; the ack was ignored
    NotPending,
    /// Recorded; other subscriptions still owe acks
    Recorded,
    /// Recorded and the record was destroyed
    Completed(MessageRecord),
}

/// Outcome of registering a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Added,
    /// Existing key re-registered at a later location
    Moved,
    Unchanged,
}

/// Mutable state of one destination
#[derive(Debug, Clone)]
pub struct DestinationLedger {
    id: DestinationId,
    next_seq: u64,
    messages: BTreeMap<u64, MessageRecord>,
    index: HashMap<MessageId, u64>,
    subscriptions: BTreeMap<SubscriptionKey, SubscriptionRecord>,
    /// Removed subscriptions: creation location to unsubscribe location
    retired: BTreeMap<Location, Location>,
}

impl DestinationLedger {
    pub fn new(id: DestinationId) -> Self {
        Self {
            id,
            next_seq: 0,
            messages: BTreeMap::new(),
            index: HashMap::new(),
            subscriptions: BTreeMap::new(),
            retired: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &DestinationId {
        &self.id
    }

    pub fn has_messages(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn has_subscriptions(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Neither messages nor subscriptions remain
    pub fn is_empty(&self) -> bool {
        !self.has_messages() && !self.has_subscriptions()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Store a new message; returns false when the id is already live
    ///
    /// Every live subscription is owed an ack. Queues never have
    /// subscriptions, so their records start with nothing pending.
    pub fn add_message(&mut self, message_id: MessageId, location: Location) -> bool {
        if self.index.contains_key(&message_id) {
            return false;
        }

        let mut record = MessageRecord::new(message_id.clone(), location);
        for subscription in self.subscriptions.values() {
            record.owe(subscription);
        }
        let seq = self.next_seq;
        self.next_seq += 1;

        self.index.insert(message_id, seq);
        self.messages.insert(seq, record);
        true
    }

    pub fn message(&self, message_id: &MessageId) -> Option<&MessageRecord> {
        let seq = self.index.get(message_id)?;
        self.messages.get(seq)
    }

    /// Live messages, oldest first
    pub fn messages(&self) -> impl Iterator<Item = &MessageRecord> {
        self.messages.values()
    }

    /// Point an existing record at a newer copy of the message
    pub fn update_location(&mut self, message_id: &MessageId, location: Location) -> bool {
        match self.message_mut(message_id) {
            Some(record) => {
                record.location = location;
                true
            }
            None => false,
        }
    }

    pub fn remove_message(&mut self, message_id: &MessageId) -> Option<MessageRecord> {
        let seq = self.index.remove(message_id)?;
        self.messages.remove(&seq)
    }

    /// Record `key`'s acknowledgement of a topic message
    pub fn ack_message(
        &mut self,
        message_id: &MessageId,
        key: &SubscriptionKey,
        location: Location,
    ) -> AckOutcome {
        let Some(record) = self.message_mut(message_id) else {
            return AckOutcome::UnknownMessage;
        };
        if !record.record_ack(key, location) {
            return AckOutcome::NotPending;
        }
        if !record.is_fully_acked() {
            return AckOutcome::Recorded;
        }
        match self.remove_message(message_id) {
            Some(record) => AckOutcome::Completed(record),
            None => AckOutcome::UnknownMessage,
        }
    }

    pub fn subscription(&self, key: &SubscriptionKey) -> Option<&SubscriptionRecord> {
        self.subscriptions.get(key)
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = &SubscriptionRecord> {
        self.subscriptions.values()
    }

    /// Register a durable subscription
    ///
    /// A new retroactive subscription is owed an ack by every live message.
    /// A new non-retroactive one is owed an ack only by the most recently
    /// added live message: the broker treats that message as in flight when
    /// the subscriber attaches. Re-registering a known key never creates new
    /// obligations.
    pub fn add_subscription(
        &mut self,
        key: SubscriptionKey,
        location: Location,
        retroactive: bool,
    ) -> SubscribeOutcome {
        if let Some(existing) = self.subscriptions.get_mut(&key) {
            if existing.location == location {
                return SubscribeOutcome::Unchanged;
            }
            existing.location = location;
            return SubscribeOutcome::Moved;
        }

        let subscription = SubscriptionRecord {
            key: key.clone(),
            created_at: location,
            location,
            retroactive,
        };
        if retroactive {
            for record in self.messages.values_mut() {
                record.owe(&subscription);
            }
        } else if let Some(record) = self.messages.values_mut().next_back() {
            record.owe(&subscription);
        }

        self.subscriptions.insert(key, subscription);
        SubscribeOutcome::Added
    }

    /// Drop a subscription, unsubscribed at `location`, and release every
    /// message it held
    ///
    /// The key's own acks are dropped with it. Returns the records destroyed
    /// because `key` was their last pending ack.
    pub fn remove_subscription(
        &mut self,
        key: &SubscriptionKey,
        location: Location,
    ) -> Vec<MessageRecord> {
        if let Some(subscription) = self.subscriptions.remove(key) {
            self.retired.insert(subscription.created_at, location);
        }

        let mut released = Vec::new();
        for (seq, record) in self.messages.iter_mut() {
            let was_pending = record.pending_acks.contains(key);
            record.release(key);
            if was_pending && record.is_fully_acked() {
                released.push(*seq);
            }
        }

        let mut pruned = Vec::with_capacity(released.len());
        for seq in released {
            if let Some(record) = self.messages.remove(&seq) {
                self.index.remove(&record.message_id);
                pruned.push(record);
            }
        }
        if self.messages.is_empty() {
            self.retired.clear();
        }
        pruned
    }

    /// Subscribe and unsubscribe locations of a removed subscription that
    /// some live message was owed an ack by
    pub fn retired_locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.messages
            .values()
            .flat_map(|m| m.obligations.iter())
            .filter_map(|created_at| {
                self.retired
                    .get(created_at)
                    .map(|unsubscribed| [*created_at, *unsubscribed])
            })
            .flatten()
    }

    /// Subscription locations, live and retired, in no particular order
    /// and possibly repeated
    pub fn subscription_locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.subscriptions
            .values()
            .flat_map(|s| s.locations())
            .chain(self.retired_locations())
    }

    /// Message and ack locations, in no particular order
    pub fn message_locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.messages.values().flat_map(|m| m.locations())
    }

    fn message_mut(&mut self, message_id: &MessageId) -> Option<&mut MessageRecord> {
        let seq = self.index.get(message_id)?;
        self.messages.get_mut(seq)
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
