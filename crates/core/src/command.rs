// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal command model
//!
//! Every journal record decodes to exactly one [`JournalCommand`]. The enum is
//! closed: consumers match on it exhaustively so that a new record kind cannot
//! be silently dropped.

use crate::id::{DestinationId, MessageId, SubscriptionKey, TransactionId};
use std::fmt;

/// Record kind tag, numbered as the broker numbers its journal entry types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandKind {
    Trace,
    AddMessage,
    RemoveMessage,
    Prepare,
    Commit,
    Rollback,
    RemoveDestination,
    Subscription,
    ProducerAudit,
    AckFileMap,
    UpdateMessage,
}

impl CommandKind {
    pub const ALL: [CommandKind; 11] = [
        CommandKind::Trace,
        CommandKind::AddMessage,
        CommandKind::RemoveMessage,
        CommandKind::Prepare,
        CommandKind::Commit,
        CommandKind::Rollback,
        CommandKind::RemoveDestination,
        CommandKind::Subscription,
        CommandKind::ProducerAudit,
        CommandKind::AckFileMap,
        CommandKind::UpdateMessage,
    ];

    /// Leading byte of an encoded record
    pub fn tag(self) -> u8 {
        match self {
            CommandKind::Trace => 0,
            CommandKind::AddMessage => 1,
            CommandKind::RemoveMessage => 2,
            CommandKind::Prepare => 3,
            CommandKind::Commit => 4,
            CommandKind::Rollback => 5,
            CommandKind::RemoveDestination => 6,
            CommandKind::Subscription => 7,
            CommandKind::ProducerAudit => 8,
            CommandKind::AckFileMap => 9,
            CommandKind::UpdateMessage => 10,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        CommandKind::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Trace => "trace",
            CommandKind::AddMessage => "add_message",
            CommandKind::RemoveMessage => "remove_message",
            CommandKind::Prepare => "prepare",
            CommandKind::Commit => "commit",
            CommandKind::Rollback => "rollback",
            CommandKind::RemoveDestination => "remove_destination",
            CommandKind::Subscription => "subscription",
            CommandKind::ProducerAudit => "producer_audit",
            CommandKind::AckFileMap => "ack_file_map",
            CommandKind::UpdateMessage => "update_message",
        }
    }

    /// Kinds that never affect liveness
    pub fn is_informational(self) -> bool {
        matches!(
            self,
            CommandKind::Trace | CommandKind::ProducerAudit | CommandKind::AckFileMap
        )
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A message was stored on a destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddMessage {
    pub destination: DestinationId,
    pub message_id: MessageId,
    pub transaction: Option<TransactionId>,
    /// Opaque marshalled message body
    pub message: Vec<u8>,
}

impl AddMessage {
    pub fn new(destination: DestinationId, message_id: impl Into<MessageId>) -> Self {
        Self {
            destination,
            message_id: message_id.into(),
            transaction: None,
            message: Vec::new(),
        }
    }

    pub fn with_transaction(mut self, transaction: TransactionId) -> Self {
        self.transaction = Some(transaction);
        self
    }

    pub fn with_body(mut self, message: impl Into<Vec<u8>>) -> Self {
        self.message = message.into();
        self
    }
}

/// A message was consumed: removed from a queue, or acknowledged by one
/// topic subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveMessage {
    pub destination: DestinationId,
    pub message_id: MessageId,
    pub transaction: Option<TransactionId>,
    pub subscription_key: Option<SubscriptionKey>,
}

impl RemoveMessage {
    pub fn new(destination: DestinationId, message_id: impl Into<MessageId>) -> Self {
        Self {
            destination,
            message_id: message_id.into(),
            transaction: None,
            subscription_key: None,
        }
    }

    pub fn acked_by(mut self, key: impl Into<SubscriptionKey>) -> Self {
        self.subscription_key = Some(key.into());
        self
    }

    pub fn with_transaction(mut self, transaction: TransactionId) -> Self {
        self.transaction = Some(transaction);
        self
    }
}

/// Every message and subscription of a destination was discarded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveDestination {
    pub destination: DestinationId,
}

/// A durable subscription was registered, or unregistered when
/// `subscription_info` is absent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub destination: DestinationId,
    pub subscription_key: SubscriptionKey,
    pub retroactive: bool,
    pub subscription_info: Option<Vec<u8>>,
}

impl Subscription {
    pub fn subscribe(
        destination: DestinationId,
        key: impl Into<SubscriptionKey>,
        retroactive: bool,
    ) -> Self {
        Self {
            destination,
            subscription_key: key.into(),
            retroactive,
            subscription_info: Some(Vec::new()),
        }
    }

    pub fn unsubscribe(destination: DestinationId, key: impl Into<SubscriptionKey>) -> Self {
        Self {
            destination,
            subscription_key: key.into(),
            retroactive: false,
            subscription_info: None,
        }
    }

    pub fn is_unsubscribe(&self) -> bool {
        self.subscription_info.is_none()
    }
}

/// Commit, prepare or rollback marker for one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionMarker {
    pub transaction: TransactionId,
}

impl TransactionMarker {
    pub fn new(transaction: TransactionId) -> Self {
        Self { transaction }
    }
}

/// Records the broker writes for its own bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Informational {
    Trace { message: String },
    ProducerAudit { audit: Vec<u8> },
    AckFileMap { map: Vec<u8> },
}

/// One decoded journal record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalCommand {
    AddMessage(AddMessage),
    /// Re-store of a message; carries the full add payload
    UpdateMessage(AddMessage),
    RemoveMessage(RemoveMessage),
    RemoveDestination(RemoveDestination),
    Subscription(Subscription),
    Commit(TransactionMarker),
    Prepare(TransactionMarker),
    Rollback(TransactionMarker),
    Informational(Informational),
}

impl JournalCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            JournalCommand::AddMessage(_) => CommandKind::AddMessage,
            JournalCommand::UpdateMessage(_) => CommandKind::UpdateMessage,
            JournalCommand::RemoveMessage(_) => CommandKind::RemoveMessage,
            JournalCommand::RemoveDestination(_) => CommandKind::RemoveDestination,
            JournalCommand::Subscription(_) => CommandKind::Subscription,
            JournalCommand::Commit(_) => CommandKind::Commit,
            JournalCommand::Prepare(_) => CommandKind::Prepare,
            JournalCommand::Rollback(_) => CommandKind::Rollback,
            JournalCommand::Informational(Informational::Trace { .. }) => CommandKind::Trace,
            JournalCommand::Informational(Informational::ProducerAudit { .. }) => {
                CommandKind::ProducerAudit
            }
            JournalCommand::Informational(Informational::AckFileMap { .. }) => {
                CommandKind::AckFileMap
            }
        }
    }

    pub fn commit(transaction: TransactionId) -> Self {
        JournalCommand::Commit(TransactionMarker::new(transaction))
    }

    pub fn prepare(transaction: TransactionId) -> Self {
        JournalCommand::Prepare(TransactionMarker::new(transaction))
    }

    pub fn rollback(transaction: TransactionId) -> Self {
        JournalCommand::Rollback(TransactionMarker::new(transaction))
    }

    pub fn trace(message: impl Into<String>) -> Self {
        JournalCommand::Informational(Informational::Trace {
            message: message.into(),
        })
    }
}

impl From<AddMessage> for JournalCommand {
    fn from(add: AddMessage) -> Self {
        JournalCommand::AddMessage(add)
    }
}

impl From<RemoveMessage> for JournalCommand {
    fn from(remove: RemoveMessage) -> Self {
        JournalCommand::RemoveMessage(remove)
    }
}

impl From<Subscription> for JournalCommand {
    fn from(subscription: Subscription) -> Self {
        JournalCommand::Subscription(subscription)
    }
}

impl From<RemoveDestination> for JournalCommand {
    fn from(remove: RemoveDestination) -> Self {
        JournalCommand::RemoveDestination(remove)
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
