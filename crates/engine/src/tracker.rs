// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transaction buffering
//!
//! Operations tagged with a transaction are held here until the transaction
//! commits, prepares or rolls back. Committed transactions stay on record,
//! keyed by their commit location, for as long as any of their operations
//! still touches a live message: replaying a transactional add needs its
//! commit marker.

use jo_core::{
    AddMessage, DestinationId, MessageId, RemoveMessage, SubscriptionKey, TransactionId,
};
use jo_storage::Location;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A transactional add or remove waiting on its transaction's outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferedOperation {
    Add(AddMessage),
    Remove(RemoveMessage),
}

/// A buffered operation and the record it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationLocation {
    pub operation: BufferedOperation,
    pub location: Location,
}

impl OperationLocation {
    pub fn add(add: AddMessage, location: Location) -> Self {
        Self {
            operation: BufferedOperation::Add(add),
            location,
        }
    }

    pub fn remove(remove: RemoveMessage, location: Location) -> Self {
        Self {
            operation: BufferedOperation::Remove(remove),
            location,
        }
    }

    pub fn destination(&self) -> &DestinationId {
        match &self.operation {
            BufferedOperation::Add(add) => &add.destination,
            BufferedOperation::Remove(remove) => &remove.destination,
        }
    }

    pub fn message_id(&self) -> &MessageId {
        match &self.operation {
            BufferedOperation::Add(add) => &add.message_id,
            BufferedOperation::Remove(remove) => &remove.message_id,
        }
    }

    fn touches(&self, destination: &DestinationId, message_id: &MessageId) -> bool {
        self.destination() == destination && self.message_id() == message_id
    }

    fn is_ack_by(&self, destination: &DestinationId, key: &SubscriptionKey) -> bool {
        match &self.operation {
            BufferedOperation::Add(_) => false,
            BufferedOperation::Remove(remove) => {
                &remove.destination == destination && remove.subscription_key.as_ref() == Some(key)
            }
        }
    }
}

/// Operations staged by a two-phase prepare
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTransaction {
    pub prepare_location: Location,
    pub operations: Vec<OperationLocation>,
}

/// A committed transaction whose operations still matter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedTransaction {
    pub transaction: TransactionId,
    pub operations: Vec<OperationLocation>,
}

#[derive(Debug, Default)]
pub struct TransactionTracker {
    in_flight: HashMap<TransactionId, Vec<OperationLocation>>,
    prepared: HashMap<TransactionId, PreparedTransaction>,
    committed: BTreeMap<Location, CommittedTransaction>,
}

impl TransactionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold an operation until its transaction resolves
    ///
    /// Operations that arrive after a prepare join the prepared set.
    pub fn buffer(&mut self, transaction: TransactionId, operation: OperationLocation) {
        if let Some(prepared) = self.prepared.get_mut(&transaction) {
            tracing::warn!(%transaction, location = %operation.location, "operation after prepare");
            prepared.operations.push(operation);
            return;
        }
        self.in_flight.entry(transaction).or_default().push(operation);
    }

    /// Stage an in-flight transaction; false when it buffered nothing
    pub fn prepare(&mut self, transaction: TransactionId, location: Location) -> bool {
        match self.in_flight.remove(&transaction) {
            Some(operations) => {
                self.prepared.insert(
                    transaction,
                    PreparedTransaction {
                        prepare_location: location,
                        operations,
                    },
                );
                true
            }
            None => false,
        }
    }

    /// Take a transaction's operations for applying, in buffered order
    ///
    /// Looks in flight first, then among prepared transactions. `None` means
    /// the transaction started before this journal.
    pub fn take_for_commit(&mut self, transaction: &TransactionId) -> Option<Vec<OperationLocation>> {
        self.in_flight
            .remove(transaction)
            .or_else(|| self.prepared.remove(transaction).map(|p| p.operations))
    }

    /// Keep a committed transaction on record; empty ones are dropped
    pub fn retain_committed(
        &mut self,
        transaction: TransactionId,
        commit_location: Location,
        operations: Vec<OperationLocation>,
    ) {
        if operations.is_empty() {
            return;
        }
        self.committed.insert(
            commit_location,
            CommittedTransaction {
                transaction,
                operations,
            },
        );
    }

    /// Discard a transaction without applying it
    pub fn rollback(&mut self, transaction: &TransactionId) -> bool {
        self.in_flight.remove(transaction).is_some() || self.prepared.remove(transaction).is_some()
    }

    /// Drop transactions still unresolved at end of journal; returns how many
    pub fn gc(&mut self) -> usize {
        let dropped = self.in_flight.len();
        self.in_flight.clear();
        dropped
    }

    /// Stop retaining committed operations on a destroyed message
    pub fn forget_message(&mut self, destination: &DestinationId, message_id: &MessageId) {
        self.forget_committed(|op| op.touches(destination, message_id));
    }

    /// Stop retaining committed operations on a removed destination
    pub fn forget_destination(&mut self, destination: &DestinationId) {
        self.forget_committed(|op| op.destination() == destination);
    }

    /// Stop retaining committed acks from a subscription that went away
    pub fn forget_acks(&mut self, destination: &DestinationId, key: &SubscriptionKey) {
        self.forget_committed(|op| op.is_ack_by(destination, key));
    }

    fn forget_committed(&mut self, forget: impl Fn(&OperationLocation) -> bool) {
        self.committed.retain(|_, tx| {
            tx.operations.retain(|op| !forget(op));
            !tx.operations.is_empty()
        });
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn prepared_count(&self) -> usize {
        self.prepared.len()
    }

    pub fn committed_count(&self) -> usize {
        self.committed.len()
    }

    pub fn is_in_flight(&self, transaction: &TransactionId) -> bool {
        self.in_flight.contains_key(transaction)
    }

    pub fn prepared(&self) -> impl Iterator<Item = (&TransactionId, &PreparedTransaction)> {
        self.prepared.iter()
    }

    /// Retained committed transactions by commit location
    pub fn committed(&self) -> impl Iterator<Item = (&Location, &CommittedTransaction)> {
        self.committed.iter()
    }

    /// Commit and prepare markers plus every operation they still cover
    pub fn live_locations(&self, out: &mut BTreeSet<Location>) {
        for (commit_location, tx) in &self.committed {
            out.insert(*commit_location);
            out.extend(tx.operations.iter().map(|op| op.location));
        }
        for prepared in self.prepared.values() {
            out.insert(prepared.prepare_location);
            out.extend(prepared.operations.iter().map(|op| op.location));
        }
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
