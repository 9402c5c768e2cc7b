//! Pose delivery channel.
//!
//! The detector publishes whole batches on the `"poses"` topic; each skeleton
//! tree holds its own subscription and drains it once per tick. Publishing
//! never waits on subscribers.

use std::sync::Arc;

use crate::pose::Pose;

/// Topic name the detector publishes on
pub const POSES_TOPIC: &str = "poses";

/// One detector result: poses indexed by pose id
pub type PoseBatch = Arc<[Pose]>;

/// Fan-out channel owned by the composition root.
#[derive(Debug, Default)]
pub struct PoseChannel {
    subscribers: Vec<flume::Sender<PoseBatch>>,
}

impl PoseChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new receiver; it sees every batch published from now on
    pub fn subscribe(&mut self) -> PoseSubscription {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        log::debug!(
            "New subscriber on '{}' ({} total)",
            POSES_TOPIC,
            self.subscribers.len()
        );
        PoseSubscription { rx }
    }

    /// Deliver a batch to every live subscriber.
    ///
    /// Subscriptions that have been dropped are pruned here.
    /// Returns the number of subscribers that received the batch.
    pub fn publish(&mut self, batch: impl Into<PoseBatch>) -> usize {
        let batch = batch.into();
        let before = self.subscribers.len();
        self.subscribers.retain(|tx| tx.send(batch.clone()).is_ok());

        let pruned = before - self.subscribers.len();
        if pruned > 0 {
            log::debug!("Pruned {} closed subscriptions on '{}'", pruned, POSES_TOPIC);
        }
        self.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Receiving end held by a single skeleton tree.
#[derive(Debug)]
pub struct PoseSubscription {
    rx: flume::Receiver<PoseBatch>,
}

impl PoseSubscription {
    /// Take every batch delivered since the last call, in publish order
    pub fn drain(&self) -> impl Iterator<Item = PoseBatch> + '_ {
        self.rx.try_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn batch(n: usize) -> Vec<Pose> {
        (0..n)
            .map(|i| Pose::from_keypoints([Vec3::ZERO, Vec3::splat(i as f32 + 1.0)]))
            .collect()
    }

    #[test]
    fn test_every_subscriber_receives() {
        let mut channel = PoseChannel::new();
        let a = channel.subscribe();
        let b = channel.subscribe();

        assert_eq!(channel.publish(batch(2)), 2);

        assert_eq!(a.drain().count(), 1);
        let received: Vec<PoseBatch> = b.drain().collect();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].len(), 2);
    }

    #[test]
    fn test_batches_arrive_in_order() {
        let mut channel = PoseChannel::new();
        let sub = channel.subscribe();

        channel.publish(batch(1));
        channel.publish(batch(3));
        channel.publish(batch(2));

        let sizes: Vec<usize> = sub.drain().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![1, 3, 2]);
        assert_eq!(sub.drain().count(), 0);
    }

    #[test]
    fn test_dropped_subscription_is_pruned() {
        let mut channel = PoseChannel::new();
        let keep = channel.subscribe();
        let gone = channel.subscribe();
        drop(gone);

        assert_eq!(channel.subscriber_count(), 2);
        assert_eq!(channel.publish(batch(1)), 1);
        assert_eq!(channel.subscriber_count(), 1);
        assert_eq!(keep.drain().count(), 1);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let mut channel = PoseChannel::new();
        assert_eq!(channel.publish(batch(1)), 0);
    }
}
