// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binary record codec
//!
//! A record is a tag byte followed by little-endian fields. Strings and byte
//! blobs are length-prefixed with a `u32`, optional fields carry a presence
//! byte. Decoding consumes the whole buffer: leftover bytes are an error.

use crate::command::{
    AddMessage, CommandKind, Informational, JournalCommand, RemoveDestination, RemoveMessage,
    Subscription, TransactionMarker,
};
use crate::id::{DestinationId, DestinationKind, MessageId, SubscriptionKey, TransactionId};
use thiserror::Error;

/// Errors produced while decoding a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty record")]
    Empty,
    #[error("unknown command tag {0}")]
    UnknownTag(u8),
    #[error("truncated {field}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },
    #[error("invalid {field} discriminant {value}")]
    InvalidValue { field: &'static str, value: u8 },
    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },
    #[error("{0} trailing bytes after command")]
    TrailingBytes(usize),
}

/// Errors produced while encoding a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("{field} is {len} bytes, more than a u32 length prefix can hold")]
    TooLong { field: &'static str, len: usize },
}

/// `u32` length prefix for a field of `len` bytes
fn length_prefix(field: &'static str, len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::TooLong { field, len })
}

const QUEUE: u8 = 0;
const TOPIC: u8 = 1;
const LOCAL_TX: u8 = 0;
const XA_TX: u8 = 1;

/// Encode a command into its record payload
pub fn encode(command: &JournalCommand) -> Result<Vec<u8>, EncodeError> {
    let mut out = Encoder::default();
    out.u8(command.kind().tag());

    match command {
        JournalCommand::AddMessage(add) | JournalCommand::UpdateMessage(add) => {
            out.destination(&add.destination)?;
            out.string("message id", &add.message_id.0)?;
            out.transaction(add.transaction.as_ref())?;
            out.bytes("message body", &add.message)?;
        }
        JournalCommand::RemoveMessage(remove) => {
            out.destination(&remove.destination)?;
            out.string("message id", &remove.message_id.0)?;
            out.transaction(remove.transaction.as_ref())?;
            match &remove.subscription_key {
                Some(key) => {
                    out.u8(1);
                    out.string("subscription key", &key.0)?;
                }
                None => out.u8(0),
            }
        }
        JournalCommand::RemoveDestination(remove) => {
            out.destination(&remove.destination)?;
        }
        JournalCommand::Subscription(sub) => {
            out.destination(&sub.destination)?;
            out.string("subscription key", &sub.subscription_key.0)?;
            out.u8(u8::from(sub.retroactive));
            match &sub.subscription_info {
                Some(info) => {
                    out.u8(1);
                    out.bytes("subscription info", info)?;
                }
                None => out.u8(0),
            }
        }
        JournalCommand::Commit(marker)
        | JournalCommand::Prepare(marker)
        | JournalCommand::Rollback(marker) => {
            out.transaction_id(&marker.transaction)?;
        }
        JournalCommand::Informational(Informational::Trace { message }) => {
            out.string("trace message", message)?;
        }
        JournalCommand::Informational(Informational::ProducerAudit { audit }) => {
            out.bytes("producer audit", audit)?;
        }
        JournalCommand::Informational(Informational::AckFileMap { map }) => {
            out.bytes("ack file map", map)?;
        }
    }

    Ok(out.buf)
}

/// Decode a record payload into a command
pub fn decode(bytes: &[u8]) -> Result<JournalCommand, DecodeError> {
    let (&tag, rest) = bytes.split_first().ok_or(DecodeError::Empty)?;
    let kind = CommandKind::from_tag(tag).ok_or(DecodeError::UnknownTag(tag))?;
    let mut input = Decoder::new(rest);

    let command = match kind {
        CommandKind::AddMessage => JournalCommand::AddMessage(input.add_message()?),
        CommandKind::UpdateMessage => JournalCommand::UpdateMessage(input.add_message()?),
        CommandKind::RemoveMessage => {
            let destination = input.destination()?;
            let message_id = MessageId(input.string("message id")?);
            let transaction = input.transaction()?;
            let subscription_key = if input.flag("subscription key presence")? {
                Some(SubscriptionKey(input.string("subscription key")?))
            } else {
                None
            };
            JournalCommand::RemoveMessage(RemoveMessage {
                destination,
                message_id,
                transaction,
                subscription_key,
            })
        }
        CommandKind::RemoveDestination => JournalCommand::RemoveDestination(RemoveDestination {
            destination: input.destination()?,
        }),
        CommandKind::Subscription => {
            let destination = input.destination()?;
            let subscription_key = SubscriptionKey(input.string("subscription key")?);
            let retroactive = input.flag("retroactive")?;
            let subscription_info = if input.flag("subscription info presence")? {
                Some(input.bytes("subscription info")?)
            } else {
                None
            };
            JournalCommand::Subscription(Subscription {
                destination,
                subscription_key,
                retroactive,
                subscription_info,
            })
        }
        CommandKind::Commit => JournalCommand::Commit(input.marker()?),
        CommandKind::Prepare => JournalCommand::Prepare(input.marker()?),
        CommandKind::Rollback => JournalCommand::Rollback(input.marker()?),
        CommandKind::Trace => JournalCommand::Informational(Informational::Trace {
            message: input.string("trace message")?,
        }),
        CommandKind::ProducerAudit => JournalCommand::Informational(Informational::ProducerAudit {
            audit: input.bytes("producer audit")?,
        }),
        CommandKind::AckFileMap => JournalCommand::Informational(Informational::AckFileMap {
            map: input.bytes("ack file map")?,
        }),
    };

    input.finish()?;
    Ok(command)
}

#[derive(Default)]
struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn bytes(&mut self, field: &'static str, value: &[u8]) -> Result<(), EncodeError> {
        self.u32(length_prefix(field, value.len())?);
        self.buf.extend_from_slice(value);
        Ok(())
    }

    fn string(&mut self, field: &'static str, value: &str) -> Result<(), EncodeError> {
        self.bytes(field, value.as_bytes())
    }

    fn destination(&mut self, destination: &DestinationId) -> Result<(), EncodeError> {
        self.u8(match destination.kind {
            DestinationKind::Queue => QUEUE,
            DestinationKind::Topic => TOPIC,
        });
        self.string("destination name", &destination.name)
    }

    fn transaction(&mut self, transaction: Option<&TransactionId>) -> Result<(), EncodeError> {
        match transaction {
            Some(tx) => {
                self.u8(1);
                self.transaction_id(tx)
            }
            None => {
                self.u8(0);
                Ok(())
            }
        }
    }

    fn transaction_id(&mut self, transaction: &TransactionId) -> Result<(), EncodeError> {
        match transaction {
            TransactionId::Local {
                connection_id,
                value,
            } => {
                self.u8(LOCAL_TX);
                self.string("connection id", connection_id)?;
                self.buf.extend_from_slice(&value.to_le_bytes());
            }
            TransactionId::Xa {
                format_id,
                global_transaction_id,
                branch_qualifier,
            } => {
                self.u8(XA_TX);
                self.buf.extend_from_slice(&format_id.to_le_bytes());
                self.bytes("global transaction id", global_transaction_id)?;
                self.bytes("branch qualifier", branch_qualifier)?;
            }
        }
        Ok(())
    }
}

struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take(&mut self, field: &'static str, needed: usize) -> Result<&'a [u8], DecodeError> {
        if self.buf.len() < needed {
            return Err(DecodeError::Truncated {
                field,
                needed,
                remaining: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(needed);
        self.buf = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(field, N)?);
        Ok(out)
    }

    fn u8(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        Ok(self.array::<1>(field)?[0])
    }

    fn flag(&mut self, field: &'static str) -> Result<bool, DecodeError> {
        match self.u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::InvalidValue { field, value }),
        }
    }

    fn u32(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.array(field)?))
    }

    fn bytes(&mut self, field: &'static str) -> Result<Vec<u8>, DecodeError> {
        let len = self.u32(field)? as usize;
        Ok(self.take(field, len)?.to_vec())
    }

    fn string(&mut self, field: &'static str) -> Result<String, DecodeError> {
        String::from_utf8(self.bytes(field)?).map_err(|_| DecodeError::InvalidUtf8 { field })
    }

    fn destination(&mut self) -> Result<DestinationId, DecodeError> {
        let kind = match self.u8("destination kind")? {
            QUEUE => DestinationKind::Queue,
            TOPIC => DestinationKind::Topic,
            value => {
                return Err(DecodeError::InvalidValue {
                    field: "destination kind",
                    value,
                })
            }
        };
        let name = self.string("destination name")?;
        Ok(DestinationId { kind, name })
    }

    fn transaction(&mut self) -> Result<Option<TransactionId>, DecodeError> {
        if self.flag("transaction presence")? {
            Ok(Some(self.transaction_id()?))
        } else {
            Ok(None)
        }
    }

    fn transaction_id(&mut self) -> Result<TransactionId, DecodeError> {
        match self.u8("transaction kind")? {
            LOCAL_TX => {
                let connection_id = self.string("connection id")?;
                let value = u64::from_le_bytes(self.array("transaction value")?);
                Ok(TransactionId::Local {
                    connection_id,
                    value,
                })
            }
            XA_TX => {
                let format_id = i32::from_le_bytes(self.array("format id")?);
                let global_transaction_id = self.bytes("global transaction id")?;
                let branch_qualifier = self.bytes("branch qualifier")?;
                Ok(TransactionId::Xa {
                    format_id,
                    global_transaction_id,
                    branch_qualifier,
                })
            }
            value => Err(DecodeError::InvalidValue {
                field: "transaction kind",
                value,
            }),
        }
    }

    fn add_message(&mut self) -> Result<AddMessage, DecodeError> {
        let destination = self.destination()?;
        let message_id = MessageId(self.string("message id")?);
        let transaction = self.transaction()?;
        let message = self.bytes("message body")?;
        Ok(AddMessage {
            destination,
            message_id,
            transaction,
            message,
        })
    }

    fn marker(&mut self) -> Result<TransactionMarker, DecodeError> {
        Ok(TransactionMarker {
            transaction: self.transaction_id()?,
        })
    }

    fn finish(self) -> Result<(), DecodeError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::TrailingBytes(self.buf.len()))
        }
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
