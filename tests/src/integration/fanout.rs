//! # Fan-out Integration Tests
//!
//! Hub delivery guarantees with many publishers and consumers running on
//! real threads and tasks.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use tempest_bus::{BoundedQueue, BroadcastHub, DeliveryPolicy};
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    // =============================================================================
    // RELIABLE DELIVERY
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_subscriber_sees_every_value_in_order() {
        const SUBSCRIBERS: usize = 8;
        const VALUES: u32 = 500;

        let hub: BroadcastHub<u32> = BroadcastHub::new("fanout");
        let subscriptions: Vec<_> = (0..SUBSCRIBERS).map(|_| hub.subscribe(4)).collect();

        let consumers: Vec<_> = subscriptions
            .into_iter()
            .map(|sub| tokio::spawn(async move { sub.collect::<Vec<u32>>().await }))
            .collect();

        let publisher = {
            let hub = hub.clone();
            tokio::task::spawn_blocking(move || {
                for v in 0..VALUES {
                    assert_eq!(hub.publish(v), SUBSCRIBERS);
                }
                hub.close();
            })
        };

        publisher.await.unwrap();
        let expected: Vec<u32> = (0..VALUES).collect();
        for consumer in consumers {
            let seen = timeout(Duration::from_secs(10), consumer)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(seen, expected);
        }
        assert_eq!(hub.published(), u64::from(VALUES));
        assert_eq!(hub.dropped(), 0);
    }

    #[test]
    fn test_concurrent_publishers_keep_per_publisher_order() {
        let hub: BroadcastHub<(u8, u32)> = BroadcastHub::new("multi-pub");
        let mut sub = hub.subscribe(16);

        let publishers: Vec<_> = (0..3u8)
            .map(|p| {
                let hub = hub.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        hub.publish((p, i));
                    }
                })
            })
            .collect();

        let mut last = [None::<u32>; 3];
        for _ in 0..600 {
            let (p, i) = sub.blocking_recv().unwrap();
            let slot = &mut last[usize::from(p)];
            assert!(slot.map_or(true, |prev| prev < i));
            *slot = Some(i);
        }
        for publisher in publishers {
            publisher.join().unwrap();
        }
    }

    // =============================================================================
    // CANCELLATION & CLOSE
    // =============================================================================

    #[test]
    fn test_cancel_from_other_thread_releases_publisher() {
        let hub: BroadcastHub<u32> = BroadcastHub::new("stuck");
        let stalled = hub.subscribe(1);
        let canceller = stalled.canceller();

        let publisher = {
            let hub = hub.clone();
            thread::spawn(move || {
                for v in 0..100 {
                    hub.publish(v);
                }
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!publisher.is_finished());

        canceller.cancel();
        publisher.join().unwrap();
        assert_eq!(hub.subscriber_count(), 0);
        drop(stalled);
    }

    #[test]
    fn test_close_races_with_subscribe_and_publish() {
        for _ in 0..20 {
            let hub: BroadcastHub<u32> = BroadcastHub::new("race");
            let subscriber = {
                let hub = hub.clone();
                thread::spawn(move || {
                    let mut subs: Vec<_> = (0..10).map(|_| hub.subscribe(2)).collect();
                    // Every handle terminates once the hub is closed.
                    for sub in &mut subs {
                        while sub.blocking_recv().is_some() {}
                    }
                })
            };
            let publisher = {
                let hub = hub.clone();
                thread::spawn(move || {
                    for v in 0..50 {
                        hub.publish(v);
                    }
                })
            };

            thread::sleep(Duration::from_millis(1));
            hub.close();
            publisher.join().unwrap();
            subscriber.join().unwrap();
            assert!(hub.is_closed());
            assert_eq!(hub.subscriber_count(), 0);
        }
    }

    // =============================================================================
    // LOSSY DELIVERY
    // =============================================================================

    #[test]
    fn test_lossy_slow_subscriber_does_not_hold_back_fast_one() {
        let hub: BroadcastHub<u32> = BroadcastHub::with_policy("lossy", DeliveryPolicy::Lossy);
        let _slow = hub.subscribe(1);
        let mut fast = hub.subscribe(1024);

        for v in 0..200 {
            hub.publish(v);
        }

        let mut seen = Vec::new();
        while seen.len() < 200 {
            match fast.blocking_recv() {
                Some(v) => seen.push(v),
                None => break,
            }
        }
        assert_eq!(seen, (0..200).collect::<Vec<_>>());
        assert!(hub.dropped() > 0);
    }

    // =============================================================================
    // QUEUE
    // =============================================================================

    #[test]
    fn test_queue_close_unblocks_many_waiters() {
        let queue = Arc::new(BoundedQueue::<u32>::new(1));
        assert!(queue.push(0));

        let pushers: Vec<_> = (0..4)
            .map(|i| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.push(i))
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        queue.close();

        for pusher in pushers {
            assert!(!pusher.join().unwrap());
        }
        assert_eq!(queue.pop(), None);
    }
}
