// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn tags_are_unique_and_invertible() {
    for kind in CommandKind::ALL {
        assert_eq!(CommandKind::from_tag(kind.tag()), Some(kind));
    }
    assert_eq!(CommandKind::from_tag(11), None);
    assert_eq!(CommandKind::from_tag(255), None);
}

#[parameterized(
    trace = { CommandKind::Trace, true },
    producer_audit = { CommandKind::ProducerAudit, true },
    ack_file_map = { CommandKind::AckFileMap, true },
    add = { CommandKind::AddMessage, false },
    subscription = { CommandKind::Subscription, false },
    commit = { CommandKind::Commit, false },
)]
fn informational_kinds(kind: CommandKind, expected: bool) {
    assert_eq!(kind.is_informational(), expected);
}

#[test]
fn kind_matches_variant() {
    let queue = DestinationId::queue("q");
    let tx = TransactionId::local("c", 1);

    let cases: Vec<(JournalCommand, CommandKind)> = vec![
        (AddMessage::new(queue.clone(), "m").into(), CommandKind::AddMessage),
        (
            JournalCommand::UpdateMessage(AddMessage::new(queue.clone(), "m")),
            CommandKind::UpdateMessage,
        ),
        (RemoveMessage::new(queue.clone(), "m").into(), CommandKind::RemoveMessage),
        (
            RemoveDestination {
                destination: queue,
            }
            .into(),
            CommandKind::RemoveDestination,
        ),
        (JournalCommand::commit(tx.clone()), CommandKind::Commit),
        (JournalCommand::prepare(tx.clone()), CommandKind::Prepare),
        (JournalCommand::rollback(tx), CommandKind::Rollback),
        (JournalCommand::trace("hello"), CommandKind::Trace),
    ];

    for (command, kind) in cases {
        assert_eq!(command.kind(), kind);
    }
}

#[test]
fn unsubscribe_has_no_info() {
    let topic = DestinationId::topic("t");

    assert!(Subscription::unsubscribe(topic.clone(), "s1").is_unsubscribe());
    assert!(!Subscription::subscribe(topic, "s1", false).is_unsubscribe());
}

#[test]
fn builders_set_optional_fields() {
    let tx = TransactionId::local("c", 9);
    let remove = RemoveMessage::new(DestinationId::topic("t"), "m1")
        .acked_by("s1")
        .with_transaction(tx.clone());

    assert_eq!(remove.subscription_key, Some(SubscriptionKey::from("s1")));
    assert_eq!(remove.transaction, Some(tx));

    let add = AddMessage::new(DestinationId::queue("q"), "m1").with_body(b"body".to_vec());
    assert_eq!(add.message, b"body");
    assert_eq!(add.transaction, None);
}
