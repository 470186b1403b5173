//! Integration tests for the adaptor lifecycle and event forwarding.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use btserial_adaptor::mock::MockSerialPort;
use btserial_adaptor::{AdaptorError, ConnectionState, EventKind, SerialAdaptor, SerialEvent};

const ADDRESS: &str = "AA:BB:CC:DD:EE:FF";

async fn wait_for(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

#[tokio::test]
async fn open_succeeds_and_activates_forwarding() {
    let mock = MockSerialPort::new(5);
    let handle = mock.handle();
    let adaptor = SerialAdaptor::new(ADDRESS, Arc::new(mock));

    let opens = Arc::new(Mutex::new(0u32));
    let opens_cb = opens.clone();
    adaptor.on_event(EventKind::Open, move |_| *opens_cb.lock() += 1);

    adaptor.open().await.unwrap();
    assert_eq!(adaptor.state(), ConnectionState::Open);
    assert_eq!(*opens.lock(), 1);

    // Forwarding is live: injected link data reaches a reader.
    let received = Arc::new(Mutex::new(Vec::new()));
    let received_cb = received.clone();
    adaptor.on_read(move |bytes| received_cb.lock().push(bytes.to_vec()));

    handle.push_data(b"ping".to_vec()).await;
    assert!(wait_for(|| !received.lock().is_empty()).await);
    assert_eq!(received.lock()[0], b"ping");
}

#[tokio::test]
async fn data_reaches_all_readers_in_registration_order() {
    let mock = MockSerialPort::new(5);
    let handle = mock.handle();
    let adaptor = SerialAdaptor::new(ADDRESS, Arc::new(mock));
    adaptor.open().await.unwrap();

    let log: Arc<Mutex<Vec<(u8, Vec<u8>)>>> = Arc::new(Mutex::new(Vec::new()));
    for tag in [1u8, 2u8] {
        let log = log.clone();
        adaptor.on_read(move |bytes| log.lock().push((tag, bytes.to_vec())));
    }

    handle.push_data(b"payload".to_vec()).await;
    assert!(wait_for(|| log.lock().len() == 2).await);

    // Each listener fired once, in registration order, payload intact.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let log = log.lock();
    assert_eq!(*log, vec![(1, b"payload".to_vec()), (2, b"payload".to_vec())]);
}

#[tokio::test]
async fn write_forwards_utf8_bytes() {
    let mock = MockSerialPort::new(5);
    let handle = mock.handle();
    let adaptor = SerialAdaptor::new(ADDRESS, Arc::new(mock));
    adaptor.open().await.unwrap();

    adaptor.write("hello").await.unwrap();
    assert_eq!(handle.writes(), vec![b"hello".to_vec()]);
}

#[tokio::test]
async fn write_failure_surfaces_link_reason() {
    let mock = MockSerialPort::new(5).fail_writes("device gone");
    let adaptor = SerialAdaptor::new(ADDRESS, Arc::new(mock));
    adaptor.open().await.unwrap();

    match adaptor.write("hello").await {
        Err(AdaptorError::Write { reason }) => assert!(reason.contains("device gone")),
        other => panic!("expected write error, got {:?}", other),
    }
}

#[tokio::test]
async fn detached_write_failure_is_logged_not_raised() {
    let mock = MockSerialPort::new(5).fail_writes("device gone");
    let handle = mock.handle();
    let adaptor = SerialAdaptor::new(ADDRESS, Arc::new(mock));
    adaptor.open().await.unwrap();

    adaptor.clone().write_detached("hello");
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The failure went to the log sink only; nothing was written and the
    // adaptor is still usable.
    assert!(handle.writes().is_empty());
    assert_eq!(adaptor.state(), ConnectionState::Open);
}

#[tokio::test]
async fn detached_open_is_silent_on_discovery_failure() {
    let mock = MockSerialPort::new(5).fail_discovery("no serial service");
    let adaptor = SerialAdaptor::new(ADDRESS, Arc::new(mock));

    let opened = Arc::new(Mutex::new(false));
    let opened_cb = opened.clone();
    adaptor.on_event(EventKind::Open, move |_| *opened_cb.lock() = true);

    adaptor.clone().open_detached();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Legacy contract: no open event, no caller signal, handle back in Idle.
    assert!(!*opened.lock());
    assert_eq!(adaptor.state(), ConnectionState::Idle);
}

#[tokio::test]
async fn awaited_open_surfaces_discovery_failure() {
    let mock = MockSerialPort::new(5).fail_discovery("no serial service");
    let adaptor = SerialAdaptor::new(ADDRESS, Arc::new(mock));

    match adaptor.open().await {
        Err(AdaptorError::Discovery { address, reason }) => {
            assert_eq!(address, ADDRESS);
            assert!(reason.contains("no serial service"));
        }
        other => panic!("expected discovery error, got {:?}", other),
    }
    assert_eq!(adaptor.state(), ConnectionState::Idle);
}

#[tokio::test]
async fn awaited_open_surfaces_connect_failure() {
    let mock = MockSerialPort::new(7).fail_connect("connection refused");
    let adaptor = SerialAdaptor::new(ADDRESS, Arc::new(mock));

    match adaptor.open().await {
        Err(AdaptorError::Connect {
            address,
            channel,
            reason,
        }) => {
            assert_eq!(address, ADDRESS);
            assert_eq!(channel, 7);
            assert!(reason.contains("connection refused"));
        }
        other => panic!("expected connect error, got {:?}", other),
    }
    assert_eq!(adaptor.state(), ConnectionState::Idle);
}

#[tokio::test]
async fn close_delegates_to_link() {
    let mock = MockSerialPort::new(5);
    let handle = mock.handle();
    let adaptor = SerialAdaptor::new(ADDRESS, Arc::new(mock));
    adaptor.open().await.unwrap();

    adaptor.close().await.unwrap();
    assert!(handle.is_closed());
    assert_eq!(adaptor.state(), ConnectionState::Closed);

    // Closed is terminal: a second close is a state violation.
    match adaptor.close().await {
        Err(AdaptorError::InvalidState { operation, state }) => {
            assert_eq!(operation, "close");
            assert_eq!(state, ConnectionState::Closed);
        }
        other => panic!("expected invalid state, got {:?}", other),
    }
}

#[tokio::test]
async fn write_requires_open_connection() {
    let mock = MockSerialPort::new(5);
    let adaptor = SerialAdaptor::new(ADDRESS, Arc::new(mock));

    match adaptor.write("hello").await {
        Err(AdaptorError::InvalidState { operation, state }) => {
            assert_eq!(operation, "write");
            assert_eq!(state, ConnectionState::Idle);
        }
        other => panic!("expected invalid state, got {:?}", other),
    }
}

#[tokio::test]
async fn remote_close_is_forwarded_and_terminal() {
    let mock = MockSerialPort::new(5);
    let handle = mock.handle();
    let adaptor = SerialAdaptor::new(ADDRESS, Arc::new(mock));
    adaptor.open().await.unwrap();

    let closed = Arc::new(Mutex::new(false));
    let closed_cb = closed.clone();
    adaptor.on_event(EventKind::Closed, move |_| *closed_cb.lock() = true);

    handle.push_closed().await;
    assert!(wait_for(|| *closed.lock()).await);
    assert_eq!(adaptor.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn link_errors_are_forwarded_with_reason() {
    let mock = MockSerialPort::new(5);
    let handle = mock.handle();
    let adaptor = SerialAdaptor::new(ADDRESS, Arc::new(mock));
    adaptor.open().await.unwrap();

    let errors = Arc::new(Mutex::new(Vec::new()));
    let errors_cb = errors.clone();
    adaptor.on_event(EventKind::Error, move |event| {
        if let SerialEvent::Error(reason) = event {
            errors_cb.lock().push(reason.clone());
        }
    });

    handle.push_error("carrier lost").await;
    assert!(wait_for(|| !errors.lock().is_empty()).await);
    assert_eq!(errors.lock()[0], "carrier lost");
}

#[tokio::test]
async fn open_rejects_concurrent_and_repeated_calls() {
    let mock = MockSerialPort::new(5);
    let adaptor = SerialAdaptor::new(ADDRESS, Arc::new(mock));
    adaptor.open().await.unwrap();

    match adaptor.open().await {
        Err(AdaptorError::InvalidState { operation, state }) => {
            assert_eq!(operation, "open");
            assert_eq!(state, ConnectionState::Open);
        }
        other => panic!("expected invalid state, got {:?}", other),
    }
}
