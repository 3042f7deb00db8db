// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifiers carried by journal commands
//!
//! Destinations, messages, subscriptions and transactions are all keyed by
//! value. None of these types allocate identity on their own: they are
//! decoded from records and compared by equality.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery model of a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    /// Point-to-point: one consumer removes each message
    Queue,
    /// Publish/subscribe: every durable subscription acknowledges each message
    Topic,
}

impl DestinationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationKind::Queue => "queue",
            DestinationKind::Topic => "topic",
        }
    }
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique key of a destination within a journal
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DestinationId {
    pub kind: DestinationKind,
    pub name: String,
}

impl DestinationId {
    pub fn new(kind: DestinationKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn queue(name: impl Into<String>) -> Self {
        Self::new(DestinationKind::Queue, name)
    }

    pub fn topic(name: impl Into<String>) -> Self {
        Self::new(DestinationKind::Topic, name)
    }

    pub fn is_topic(&self) -> bool {
        self.kind == DestinationKind::Topic
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// Broker-assigned message identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        MessageId(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        MessageId(s.to_string())
    }
}

/// Durable subscription key (client id + subscription name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionKey(pub String);

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SubscriptionKey {
    fn from(s: String) -> Self {
        SubscriptionKey(s)
    }
}

impl From<&str> for SubscriptionKey {
    fn from(s: &str) -> Self {
        SubscriptionKey(s.to_string())
    }
}

/// Transaction identity, either connection-local or distributed (XA)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransactionId {
    Local {
        connection_id: String,
        value: u64,
    },
    Xa {
        format_id: i32,
        global_transaction_id: Vec<u8>,
        branch_qualifier: Vec<u8>,
    },
}

impl TransactionId {
    pub fn local(connection_id: impl Into<String>, value: u64) -> Self {
        TransactionId::Local {
            connection_id: connection_id.into(),
            value,
        }
    }

    pub fn xa(
        format_id: i32,
        global_transaction_id: impl Into<Vec<u8>>,
        branch_qualifier: impl Into<Vec<u8>>,
    ) -> Self {
        TransactionId::Xa {
            format_id,
            global_transaction_id: global_transaction_id.into(),
            branch_qualifier: branch_qualifier.into(),
        }
    }

    pub fn is_xa(&self) -> bool {
        matches!(self, TransactionId::Xa { .. })
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionId::Local {
                connection_id,
                value,
            } => write!(f, "local:{}:{}", connection_id, value),
            TransactionId::Xa {
                format_id,
                global_transaction_id,
                branch_qualifier,
            } => {
                write!(f, "xa:{}:", format_id)?;
                write_hex(f, global_transaction_id)?;
                f.write_str(":")?;
                write_hex(f, branch_qualifier)
            }
        }
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for byte in bytes {
        write!(f, "{:02x}", byte)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
