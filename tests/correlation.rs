use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use tokio_util::sync::CancellationToken;

use mqtt_dispatch::{AckContext, Error, PacketIds};

fn waiter() -> Arc<AckContext<u8>> {
    // ---
    AckContext::new(CancellationToken::new()).0
}

#[test]
fn test_exhaustion_after_full_space() {
    // ---
    let ids = PacketIds::new();
    for _ in 0..u16::MAX {
        ids.request(waiter()).expect("space not yet exhausted");
    }
    assert_eq!(ids.in_flight(), usize::from(u16::MAX));

    // 65535 outstanding identifiers: the next request must fail without
    // allocating anything.
    assert!(matches!(
        ids.request(waiter()),
        Err(Error::PacketIdsExhausted)
    ));
    assert_eq!(ids.in_flight(), usize::from(u16::MAX));

    // Freeing a single slot makes allocation succeed again, reissuing
    // exactly the freed identifier.
    ids.free(40_000);
    assert_eq!(ids.request(waiter()).unwrap(), 40_000);
}

#[test]
fn test_allocation_wraps_past_max() {
    // ---
    let ids = PacketIds::new();
    for _ in 0..u16::MAX {
        ids.request(waiter()).unwrap();
    }

    // last issued is 65535; the probe restarts at 1 and walks forward to
    // the only free slot.
    ids.free(3);
    assert_eq!(ids.request(waiter()).unwrap(), 3);
}

#[test]
fn test_concurrent_requests_never_duplicate() {
    // ---
    const THREADS: usize = 8;
    const PER_THREAD: usize = 1000;

    let ids = Arc::new(PacketIds::new());
    let mut handles = Vec::new();
    for _ in 0..THREADS {
        let ids = ids.clone();
        handles.push(thread::spawn(move || {
            let mut issued = Vec::with_capacity(PER_THREAD);
            for _ in 0..PER_THREAD {
                issued.push(ids.request(waiter()).unwrap());
            }
            issued
        }));
    }

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }

    assert_eq!(all.len(), THREADS * PER_THREAD);
    assert!(all.iter().all(|&id| id != 0));

    let unique: HashSet<u16> = all.iter().copied().collect();
    assert_eq!(unique.len(), all.len(), "an identifier was issued twice");
}

#[tokio::test]
async fn test_ack_resolves_waiting_caller() {
    // ---
    let ids: Arc<PacketIds<&'static str>> = Arc::new(PacketIds::new());

    let (waiter, reply) = AckContext::new(CancellationToken::new());
    let id = ids.request(waiter).unwrap();

    // Caller side: wait for the acknowledgement, racing its own token.
    let ids_for_caller = ids.clone();
    let caller = tokio::spawn(async move {
        let cancel = ids_for_caller.get(id).unwrap().cancellation().clone();
        let outcome = tokio::select! {
            ack = reply => ack.ok(),
            _ = cancel.cancelled() => None,
        };
        ids_for_caller.free(id);
        outcome
    });

    // Receive-loop side: a decoded acknowledgement carrying `id` arrives.
    let waiter = ids.get(id).expect("exchange still in flight");
    assert!(waiter.complete("suback"));

    assert_eq!(caller.await.unwrap(), Some("suback"));
    assert!(ids.get(id).is_none());
}

#[tokio::test]
async fn test_abandoned_wait_is_freed_by_its_caller() {
    // ---
    let ids: PacketIds<&'static str> = PacketIds::new();

    let cancel = CancellationToken::new();
    let (waiter, reply) = AckContext::new(cancel.clone());
    let id = ids.request(waiter).unwrap();

    // The caller gives up: cancels its token, drops the receiver, and
    // frees its own identifier. The service never notifies anyone.
    cancel.cancel();
    drop(reply);
    ids.free(id);

    assert!(ids.get(id).is_none());
    assert_eq!(ids.in_flight(), 0);

    // A late acknowledgement for the abandoned exchange resolves to
    // absent, which is a normal outcome for the receive loop.
    assert!(ids.get(id).is_none());
}
