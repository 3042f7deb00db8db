// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jo-core: journal command model for the Journal Optimizer (jo)
//!
//! This crate provides:
//! - Value identifiers for destinations, messages, subscriptions and transactions
//! - The closed [`JournalCommand`] enum every journal record decodes to
//! - The binary record codec

pub mod codec;
pub mod command;
pub mod id;

pub use codec::{decode, encode, DecodeError, EncodeError};
pub use command::{
    AddMessage, CommandKind, Informational, JournalCommand, RemoveDestination, RemoveMessage,
    Subscription, TransactionMarker,
};
pub use id::{DestinationId, DestinationKind, MessageId, SubscriptionKey, TransactionId};
