use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

/// Something changed in a query's result set. Subscribers re-fetch the full
/// result on every notification; the event itself carries no payload so the
/// database stays the single source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Changed;

const FEED_BUFFER: usize = 32;

/// In-process change-notification hub backing the WebSocket live feeds.
///
/// One broadcast channel per room (message inserts) and one per user
/// (room-list changes). Channels with no remaining subscribers are dropped
/// on the next publish to the same key.
#[derive(Clone, Default)]
pub struct FeedHub {
    rooms: Arc<Mutex<HashMap<String, broadcast::Sender<Changed>>>>,
    room_lists: Arc<Mutex<HashMap<String, broadcast::Sender<Changed>>>>,
}

impl FeedHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to message changes in one room. Dropping the receiver
    /// releases the subscription.
    pub fn subscribe_room(&self, room_id: &str) -> broadcast::Receiver<Changed> {
        subscribe(&self.rooms, room_id)
    }

    /// Subscribes to room-list changes for one owner.
    pub fn subscribe_room_list(&self, user_id: &str) -> broadcast::Receiver<Changed> {
        subscribe(&self.room_lists, user_id)
    }

    /// Notifies subscribers that a room's message set changed.
    pub fn publish_message_change(&self, room_id: &str) {
        publish(&self.rooms, room_id);
    }

    /// Notifies subscribers that an owner's room list changed.
    pub fn publish_room_list_change(&self, user_id: &str) {
        publish(&self.room_lists, user_id);
    }
}

fn subscribe(
    channels: &Mutex<HashMap<String, broadcast::Sender<Changed>>>,
    key: &str,
) -> broadcast::Receiver<Changed> {
    let mut channels = channels.lock().expect("feed hub lock poisoned");
    channels
        .entry(key.to_string())
        .or_insert_with(|| broadcast::channel(FEED_BUFFER).0)
        .subscribe()
}

fn publish(channels: &Mutex<HashMap<String, broadcast::Sender<Changed>>>, key: &str) {
    let mut channels = channels.lock().expect("feed hub lock poisoned");
    if let Some(tx) = channels.get(key) {
        // send() only fails when every receiver is gone; reclaim the slot.
        if tx.send(Changed).is_err() {
            channels.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn room_events_reach_only_that_rooms_subscribers() {
        let hub = FeedHub::new();
        let mut feed_a = hub.subscribe_room("room-a");
        let mut feed_b = hub.subscribe_room("room-b");

        hub.publish_message_change("room-a");

        assert_eq!(feed_a.recv().await.unwrap(), Changed);
        assert!(matches!(
            feed_b.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn dropping_a_receiver_releases_the_subscription() {
        let hub = FeedHub::new();
        let feed_a = hub.subscribe_room("room-a");
        drop(feed_a);

        // Publishing to a room with no subscribers must not panic, and a
        // later subscriber only sees events published after it subscribed.
        hub.publish_message_change("room-a");

        let mut feed_a2 = hub.subscribe_room("room-a");
        hub.publish_message_change("room-a");
        assert_eq!(feed_a2.recv().await.unwrap(), Changed);
        assert!(matches!(
            feed_a2.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn room_list_feed_is_scoped_per_owner() {
        let hub = FeedHub::new();
        let mut alice = hub.subscribe_room_list("alice");
        let mut bob = hub.subscribe_room_list("bob");

        hub.publish_room_list_change("alice");

        assert_eq!(alice.recv().await.unwrap(), Changed);
        assert!(matches!(
            bob.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
