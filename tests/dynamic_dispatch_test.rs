use chrono::Utc;
use paybridge::domain::payment::PaymentId;
use paybridge::domain::ports::{NotificationSinkBox, TransactionLogBox};
use paybridge::domain::transaction::{ProviderTransaction, TransactionType};
use paybridge::infrastructure::in_memory::{InMemoryNotificationSink, InMemoryTransactionLog};

#[tokio::test]
async fn test_ports_as_trait_objects() {
    let log: TransactionLogBox = Box::new(InMemoryTransactionLog::new());
    let sink = InMemoryNotificationSink::new();
    let sink_box: NotificationSinkBox = Box::new(sink.clone());

    let tx = ProviderTransaction::new(PaymentId::new(1, 1), TransactionType::GetPayment, Utc::now());

    // Verify Send + Sync by spawning tasks
    let log_handle = tokio::spawn(async move {
        log.append(tx).await.unwrap();
        log.latest(PaymentId::new(1, 1)).await.unwrap().unwrap()
    });

    let sink_handle = tokio::spawn(async move {
        let mut notification = paybridge::notification::constructor_for("2").unwrap()(
            &PaymentId::new(1, 1).encoded(),
            &paybridge::domain::payment::Payment::new(
                PaymentId::new(1, 1),
                rust_decimal::Decimal::ONE,
                "EUR",
            ),
        )
        .unwrap();
        notification.sign(Utc::now(), "k", b"secret").unwrap();
        let reader = notification.reader().unwrap();
        sink_box
            .deliver(notification.identification(), reader)
            .await
            .unwrap();
    });

    let latest = log_handle.await.unwrap();
    assert_eq!(latest.r#type, TransactionType::GetPayment);

    sink_handle.await.unwrap();
    assert_eq!(sink.delivered().await.len(), 1);
}

#[tokio::test]
async fn test_concurrent_appends_across_payments() {
    let log = InMemoryTransactionLog::new();

    let mut handles = Vec::new();
    for payment in 1..=50u64 {
        let log: TransactionLogBox = Box::new(log.clone());
        handles.push(tokio::spawn(async move {
            let id = PaymentId::new(1, payment);
            log.append(ProviderTransaction::new(id, TransactionType::CreatePayment, Utc::now()))
                .await
                .unwrap();
            log.append(
                ProviderTransaction::new(id, TransactionType::CreatePaymentResponse, Utc::now())
                    .with_state("created"),
            )
            .await
            .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let log: TransactionLogBox = Box::new(log);
    for payment in 1..=50u64 {
        let latest = log.latest(PaymentId::new(1, payment)).await.unwrap().unwrap();
        assert_eq!(latest.r#type, TransactionType::CreatePaymentResponse);
    }
}
