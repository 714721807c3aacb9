//! Service-level scenarios over an in-memory database

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use super::*;
use crate::application::events::Event;
use crate::domain::payment::PaymentPolicy;
use crate::domain::transaction::{
    PaymentStatus, ReceiptChannel, ReceiptStatus, TransactionFilter, TransactionStatus,
};
use crate::domain::{DomainError, SpaceStatus};
use crate::infrastructure::database::entities::parking;
use crate::shared::PageRequest;
use crate::test_support::{at, on, TestServices};

const OPERATOR: i32 = 7;

fn entry(plate: &str, space_id: i32) -> EntryCommand {
    EntryCommand {
        plate: plate.into(),
        document_type: "DNI".into(),
        document_number: "12345678".into(),
        zone_id: 1,
        space_id,
        operator_id: OPERATOR,
        customer_name: Some("Ana Torres".into()),
        email: Some("ana@mail.com".into()),
        ..Default::default()
    }
}

fn exit(document_number: &str) -> ExitCommand {
    ExitCommand {
        document_type: "DNI".into(),
        document_number: document_number.into(),
        operator_id: OPERATOR,
        ..Default::default()
    }
}

fn pay(transaction_id: i32, cents: i64) -> PaymentCommand {
    PaymentCommand {
        transaction_id,
        payment_type_id: 1,
        amount: Decimal::new(cents, 2),
        operator_id: OPERATOR,
        ..Default::default()
    }
}

/// A completed 90-minute stay (08:00–09:30) owing 3.00 PEN.
async fn completed_stay(s: &TestServices) -> i32 {
    let tx = s
        .lifecycle
        .record_entry_at(entry("abc-123", 10), at(8, 0))
        .await
        .unwrap();
    s.lifecycle
        .record_exit_at(tx.id, exit("12345678"), at(9, 30))
        .await
        .unwrap();
    tx.id
}

// ── Entry ──────────────────────────────────────────────────────

#[tokio::test]
async fn entry_occupies_space_and_announces_it() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let mut sub = s.events.subscribe();

    let tx = s
        .lifecycle
        .record_entry_at(entry(" abc-123 ", 10), at(8, 0))
        .await
        .unwrap();

    assert_eq!(tx.plate_number, "ABC-123");
    assert_eq!(tx.status, TransactionStatus::Active);
    assert_eq!(tx.payment_status, PaymentStatus::Unpaid);
    assert_eq!(tx.entry_operator_id, OPERATOR);
    assert_eq!(
        s.spaces.get_space(10).await.unwrap().status,
        SpaceStatus::Occupied
    );

    let msg = sub.try_recv().unwrap();
    assert!(matches!(msg.event, Event::VehicleEntered(ref e) if e.transaction_id == tx.id));
}

#[tokio::test]
async fn occupied_space_rejects_second_vehicle() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    s.lifecycle
        .record_entry_at(entry("ABC-123", 10), at(8, 0))
        .await
        .unwrap();

    let err = s
        .lifecycle
        .record_entry_at(entry("XYZ-987", 10), at(8, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::SpaceNotAvailable { space_id: 10, .. }));
}

#[tokio::test]
async fn vehicle_cannot_be_inside_twice() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let first = s
        .lifecycle
        .record_entry_at(entry("ABC-123", 10), at(8, 0))
        .await
        .unwrap();

    let err = s
        .lifecycle
        .record_entry_at(entry("abc-123", 11), at(8, 5))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::VehicleAlreadyInside { transaction_id: Some(id), .. } if id == first.id
    ));
    // The failed attempt must not leave space 11 occupied.
    assert_eq!(
        s.spaces.get_space(11).await.unwrap().status,
        SpaceStatus::Available
    );
}

#[tokio::test]
async fn closed_parking_rejects_entry() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let p = parking::Entity::find_by_id(1)
        .one(&s.db)
        .await
        .unwrap()
        .unwrap();
    let mut active: parking::ActiveModel = p.into();
    active.opens_at = Set(chrono::NaiveTime::from_hms_opt(6, 0, 0));
    active.closes_at = Set(chrono::NaiveTime::from_hms_opt(22, 0, 0));
    active.update(&s.db).await.unwrap();

    let err = s
        .lifecycle
        .record_entry_at(entry("ABC-123", 10), at(23, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ZoneNotOperational { zone_id: 1, .. }));
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_write() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let mut cmd = entry("AB", 10);
    assert!(matches!(
        s.lifecycle.record_entry_at(cmd.clone(), at(8, 0)).await,
        Err(DomainError::Validation(_))
    ));

    cmd.plate = "ABC-123".into();
    cmd.evidence.plate_confidence = Some(1.5);
    assert!(matches!(
        s.lifecycle.record_entry_at(cmd, at(8, 0)).await,
        Err(DomainError::Validation(_))
    ));
    assert!(s.spaces.get_space(10).await.unwrap().is_available());
}

#[tokio::test]
async fn space_in_maintenance_cannot_be_allocated() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    s.spaces
        .set_status(12, SpaceStatus::Maintenance, OPERATOR)
        .await
        .unwrap();

    let err = s
        .lifecycle
        .record_entry_at(entry("ABC-123", 12), at(8, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::SpaceNotAvailable { space_id: 12, .. }));
}

// ── Exit ───────────────────────────────────────────────────────

#[tokio::test]
async fn exit_prices_the_stay_and_frees_the_space() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let tx = s
        .lifecycle
        .record_entry_at(entry("ABC-123", 10), at(8, 0))
        .await
        .unwrap();

    let done = s
        .lifecycle
        .record_exit_at(tx.id, exit("12345678"), at(9, 30))
        .await
        .unwrap();

    assert_eq!(done.status, TransactionStatus::Completed);
    assert_eq!(done.payment_status, PaymentStatus::Unpaid);
    assert_eq!(done.duration_minutes, Some(90));
    assert_eq!(done.total_amount, Some(Decimal::new(300, 2)));
    assert_eq!(done.rate_ids, vec![1]);
    assert_eq!(done.exit_operator_id, Some(OPERATOR));
    assert!(s.spaces.get_space(10).await.unwrap().is_available());

    let stored = s.queries.get(tx.id).await.unwrap();
    assert_eq!(stored.total_amount, Some(Decimal::new(300, 2)));
    assert_eq!(stored.tariff_lines.len(), 1);
}

#[tokio::test]
async fn exit_by_plate_finds_the_active_stay() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let tx = s
        .lifecycle
        .record_entry_at(entry("ABC-123", 10), at(8, 0))
        .await
        .unwrap();

    let done = s
        .lifecycle
        .record_exit_by_plate("abc-123", exit("12345678"))
        .await
        .unwrap();
    assert_eq!(done.id, tx.id);
    assert!(matches!(
        s.lifecycle
            .record_exit_by_plate("ABC-123", exit("12345678"))
            .await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn document_mismatch_raises_alert_and_changes_nothing() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let tx = s
        .lifecycle
        .record_entry_at(entry("ABC-123", 10), at(8, 0))
        .await
        .unwrap();
    let mut sub = s.events.subscribe();

    let err = s
        .lifecycle
        .record_exit_at(tx.id, exit("87654321"), at(9, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::DocumentMismatch { transaction_id } if transaction_id == tx.id));

    let stored = s.queries.get(tx.id).await.unwrap();
    assert_eq!(stored.status, TransactionStatus::Active);
    assert!(stored.exit_time.is_none());
    assert_eq!(
        s.spaces.get_space(10).await.unwrap().status,
        SpaceStatus::Occupied
    );

    let msg = sub.try_recv().unwrap();
    match msg.event {
        Event::SecurityAlert(alert) => {
            assert_eq!(alert.transaction_id, tx.id);
            assert_eq!(alert.presented_document, "DNI/87654321");
        }
        other => panic!("unexpected event {:?}", other.event_type()),
    }
}

#[tokio::test]
async fn malformed_exit_document_raises_security_alert() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let tx = s
        .lifecycle
        .record_entry_at(entry("ABC-123", 10), at(8, 0))
        .await
        .unwrap();
    let mut sub = s.events.subscribe();

    for number in ["1234", "   "] {
        let err = s
            .lifecycle
            .record_exit_at(tx.id, exit(number), at(9, 0))
            .await
            .unwrap_err();
        assert!(
            matches!(err, DomainError::DocumentMismatch { transaction_id } if transaction_id == tx.id),
            "{:?}",
            err
        );
        let msg = sub.try_recv().unwrap();
        assert!(matches!(msg.event, Event::SecurityAlert(ref a) if a.transaction_id == tx.id));
    }

    assert_eq!(s.queries.get(tx.id).await.unwrap().status, TransactionStatus::Active);
    assert_eq!(
        s.spaces.get_space(10).await.unwrap().status,
        SpaceStatus::Occupied
    );
}

#[tokio::test]
async fn exit_document_is_compared_normalized() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let tx = s
        .lifecycle
        .record_entry_at(entry("ABC-123", 10), at(8, 0))
        .await
        .unwrap();
    let cmd = ExitCommand {
        document_type: " dni ".into(),
        ..exit(" 12345678 ")
    };
    let done = s.lifecycle.record_exit_at(tx.id, cmd, at(9, 0)).await.unwrap();
    assert_eq!(done.status, TransactionStatus::Completed);
    assert_eq!(done.exit_document.unwrap().to_string(), "DNI/12345678");
}

#[tokio::test]
async fn second_exit_is_rejected() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let id = completed_stay(&s).await;

    let err = s
        .lifecycle
        .record_exit_at(id, exit("12345678"), at(10, 0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::InvalidTransactionState { operation: "exit", .. }
    ));
}

// ── Cancellation ───────────────────────────────────────────────

#[tokio::test]
async fn cancel_releases_space_without_charge() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let tx = s
        .lifecycle
        .record_entry_at(entry("ABC-123", 10), at(8, 0))
        .await
        .unwrap();

    assert!(matches!(
        s.lifecycle.cancel_at(tx.id, OPERATOR, "  ", at(8, 10)).await,
        Err(DomainError::Validation(_))
    ));

    let cancelled = s
        .lifecycle
        .cancel_at(tx.id, OPERATOR, "wrong plate typed", at(8, 10))
        .await
        .unwrap();
    assert_eq!(cancelled.status, TransactionStatus::Cancelled);
    assert_eq!(cancelled.total_amount, Some(Decimal::ZERO));
    assert_eq!(cancelled.cancelled_by, Some(OPERATOR));
    assert_eq!(
        cancelled.cancellation_reason.as_deref(),
        Some("wrong plate typed")
    );
    assert!(s.spaces.get_space(10).await.unwrap().is_available());

    // Cancelled stays are final.
    assert!(s
        .lifecycle
        .record_exit_at(tx.id, exit("12345678"), at(9, 0))
        .await
        .is_err());
    assert!(matches!(
        s.payments.process_payment_at(pay(tx.id, 0), at(9, 0)).await,
        Err(DomainError::InvalidTransactionState { operation: "pay", .. })
    ));

    // The vehicle may come back in.
    s.lifecycle
        .record_entry_at(entry("ABC-123", 11), at(8, 20))
        .await
        .unwrap();
}

// ── Payments ───────────────────────────────────────────────────

#[tokio::test]
async fn active_stay_cannot_be_paid() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let tx = s
        .lifecycle
        .record_entry_at(entry("ABC-123", 10), at(8, 0))
        .await
        .unwrap();
    assert!(matches!(
        s.payments.process_payment_at(pay(tx.id, 500), at(9, 0)).await,
        Err(DomainError::InvalidTransactionState { .. })
    ));
}

#[tokio::test]
async fn minimum_policy_accepts_overpayment_once() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let id = completed_stay(&s).await;

    let short = s.payments.process_payment_at(pay(id, 299), at(9, 35)).await;
    assert!(matches!(short, Err(DomainError::PaymentRejected { policy: "minimum", .. })));

    let settled = s
        .payments
        .process_payment_at(pay(id, 500), at(9, 35))
        .await
        .unwrap();
    assert_eq!(settled.payment.amount, Decimal::new(500, 2));
    assert_eq!(settled.transaction.payment_status, PaymentStatus::Paid);
    assert!(settled.receipt_dispatch.is_none());

    let again = s.payments.process_payment_at(pay(id, 500), at(9, 40)).await;
    assert!(matches!(
        again,
        Err(DomainError::InvalidTransactionState { operation: "pay", .. })
    ));
}

#[tokio::test]
async fn exact_policy_requires_the_exact_total() {
    let s = TestServices::new(PaymentPolicy::Exact).await;
    let id = completed_stay(&s).await;

    assert!(matches!(
        s.payments.process_payment_at(pay(id, 500), at(9, 35)).await,
        Err(DomainError::PaymentRejected { policy: "exact", .. })
    ));
    s.payments
        .process_payment_at(pay(id, 300), at(9, 35))
        .await
        .unwrap();
}

#[tokio::test]
async fn refund_marks_payment_and_transaction() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let id = completed_stay(&s).await;
    let settled = s
        .payments
        .process_payment_at(pay(id, 300), at(9, 35))
        .await
        .unwrap();

    assert!(matches!(
        s.payments
            .refund_at(settled.payment.id, "", OPERATOR, at(10, 0))
            .await,
        Err(DomainError::Validation(_))
    ));

    let refunded = s
        .payments
        .refund_at(settled.payment.id, "charged twice", OPERATOR, at(10, 0))
        .await
        .unwrap();
    assert!(refunded.is_refunded());
    let details = refunded.refund.unwrap();
    assert_eq!(details.amount, Decimal::new(300, 2));
    assert_eq!(details.refunded_by, OPERATOR);

    let tx = s.queries.get(id).await.unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert_eq!(tx.payment_status, PaymentStatus::Refunded);

    assert!(s
        .payments
        .refund_at(settled.payment.id, "again", OPERATOR, at(10, 5))
        .await
        .is_err());
}

// ── Receipts ───────────────────────────────────────────────────

struct FailingSender {
    attempts: AtomicU32,
}

#[async_trait]
impl ReceiptSender for FailingSender {
    async fn send(&self, _: ReceiptChannel, _: &Receipt) -> Result<(), ReceiptError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ReceiptError::Delivery("gateway down".into()))
    }
}

#[tokio::test]
async fn receipts_are_recorded_per_channel() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let id = completed_stay(&s).await;

    let mut cmd = pay(id, 300);
    cmd.receipt_channels = vec![ReceiptChannel::Email, ReceiptChannel::Whatsapp];
    let settled = s.payments.process_payment_at(cmd, at(9, 35)).await.unwrap();
    assert_eq!(
        settled.transaction.receipt.status_of(ReceiptChannel::Email),
        Some(ReceiptStatus::Pending)
    );
    settled.receipt_dispatch.unwrap().await.unwrap();

    let tx = s.queries.get(id).await.unwrap();
    assert_eq!(tx.payment_status, PaymentStatus::Paid);
    assert!(tx.receipt.sent);
    assert_eq!(
        tx.receipt.status_of(ReceiptChannel::Email),
        Some(ReceiptStatus::Sent)
    );
    // No phone on file for this customer.
    assert_eq!(
        tx.receipt.status_of(ReceiptChannel::Whatsapp),
        Some(ReceiptStatus::Failed)
    );
}

#[tokio::test]
async fn failed_delivery_is_retried_and_never_undoes_payment() {
    let sender = Arc::new(FailingSender {
        attempts: AtomicU32::new(0),
    });
    let s = TestServices::with_sender(PaymentPolicy::Minimum, sender.clone()).await;
    let id = completed_stay(&s).await;

    let mut cmd = pay(id, 300);
    cmd.receipt_channels = vec![ReceiptChannel::Email];
    let settled = s.payments.process_payment_at(cmd, at(9, 35)).await.unwrap();
    settled.receipt_dispatch.unwrap().await.unwrap();

    assert_eq!(sender.attempts.load(Ordering::SeqCst), 3);
    let tx = s.queries.get(id).await.unwrap();
    assert_eq!(tx.payment_status, PaymentStatus::Paid);
    assert!(!tx.receipt.sent);
    assert_eq!(
        tx.receipt.status_of(ReceiptChannel::Email),
        Some(ReceiptStatus::Failed)
    );
}

// ── Queries and monitoring ─────────────────────────────────────

#[tokio::test]
async fn active_view_carries_live_estimate() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    s.lifecycle
        .record_entry_at(entry("ABC-123", 10), at(8, 0))
        .await
        .unwrap();

    let stays = s.queries.active_at(Some(1), at(9, 30)).await.unwrap();
    assert_eq!(stays.len(), 1);
    assert_eq!(stays[0].elapsed_minutes, 90);
    assert_eq!(stays[0].estimated_amount, Some(Decimal::new(300, 2)));
    assert!(!stays[0].overdue);

    assert!(s.queries.active_at(Some(2), at(9, 30)).await.unwrap().is_empty());
    assert!(s.queries.overdue_at(None, at(16, 0)).await.unwrap().is_empty());
    assert_eq!(s.queries.overdue_at(None, at(16, 1)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn listing_filters_and_paginates() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    completed_stay(&s).await;
    s.lifecycle
        .record_entry_at(entry("XYZ-987", 11), at(10, 0))
        .await
        .unwrap();

    let all = s
        .queries
        .list(&TransactionFilter::default(), PageRequest::new(1, 1))
        .await
        .unwrap();
    assert_eq!(all.total, 2);
    assert_eq!(all.items.len(), 1);
    // Newest entry first.
    assert_eq!(all.items[0].plate_number, "XYZ-987");

    let completed = s
        .queries
        .list(
            &TransactionFilter {
                status: Some(TransactionStatus::Completed),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(completed.total, 1);
    assert_eq!(completed.items[0].plate_number, "ABC-123");

    let by_plate = s.queries.active_by_plate("xyz-987").await.unwrap();
    assert!(by_plate.is_some());
    assert!(s.queries.active_by_plate("ABC-123").await.unwrap().is_none());
}

#[tokio::test]
async fn overstay_is_announced_once() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    let tx = s
        .lifecycle
        .record_entry_at(entry("ABC-123", 10), on(1, 8, 0))
        .await
        .unwrap();
    let mut sub = s.events.subscribe();

    assert!(s.overstay.scan_once(on(1, 15, 0)).await.unwrap().is_empty());
    assert_eq!(s.overstay.scan_once(on(1, 17, 0)).await.unwrap(), vec![tx.id]);
    assert!(s.overstay.scan_once(on(1, 18, 0)).await.unwrap().is_empty());

    let msg = sub.try_recv().unwrap();
    assert!(matches!(msg.event, Event::OverstayDetected(ref e) if e.limit_minutes == 480));
    assert!(sub.try_recv().is_none());

    s.lifecycle
        .record_exit_at(tx.id, exit("12345678"), on(1, 18, 30))
        .await
        .unwrap();
    s.overstay.scan_once(on(1, 19, 0)).await.unwrap();
    assert_eq!(s.overstay.flagged_count(), 0);
}

#[tokio::test]
async fn occupied_space_cannot_be_toggled() {
    let s = TestServices::new(PaymentPolicy::Minimum).await;
    s.lifecycle
        .record_entry_at(entry("ABC-123", 10), at(8, 0))
        .await
        .unwrap();

    assert!(matches!(
        s.spaces.set_status(10, SpaceStatus::Maintenance, OPERATOR).await,
        Err(DomainError::SpaceOccupied { space_id: 10 })
    ));
    assert!(matches!(
        s.spaces.set_status(11, SpaceStatus::Occupied, OPERATOR).await,
        Err(DomainError::InvalidTransition(_))
    ));

    let space = s
        .spaces
        .set_status(11, SpaceStatus::OutOfService, OPERATOR)
        .await
        .unwrap();
    assert_eq!(space.status, SpaceStatus::OutOfService);
    let space = s
        .spaces
        .set_status(11, SpaceStatus::Available, OPERATOR)
        .await
        .unwrap();
    assert!(space.is_available());
}
