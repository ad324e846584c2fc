use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::chat::ServerFrame;

/// Per-item chat rooms. Each room is a broadcast channel keyed by item id;
/// subscribers hold a receiver and the room is dropped once the last one leaves.
#[derive(Debug)]
pub struct ChatHub {
    rooms: Mutex<HashMap<Uuid, broadcast::Sender<ServerFrame>>>,
    capacity: usize,
}

impl ChatHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Subscribes to `room`, creating it on first use.
    pub fn join(&self, room: Uuid) -> broadcast::Receiver<ServerFrame> {
        let mut rooms = self.rooms();
        rooms
            .entry(room)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Sends `text` to everyone in `room`. Returns how many subscribers received it.
    pub fn broadcast(&self, room: Uuid, text: impl Into<String>) -> usize {
        let frame = ServerFrame::Message {
            room,
            text: text.into(),
            at: Utc::now(),
        };
        let sender = self.rooms().get(&room).cloned();
        match sender {
            Some(sender) => sender.send(frame).unwrap_or(0),
            None => 0,
        }
    }

    /// Drops `room` if nobody is subscribed anymore. Call after a receiver is dropped.
    pub fn prune(&self, room: Uuid) {
        let mut rooms = self.rooms();
        if rooms
            .get(&room)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            rooms.remove(&room);
            tracing::debug!(%room, "chat room closed");
        }
    }

    pub fn room_size(&self, room: Uuid) -> usize {
        self.rooms()
            .get(&room)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    pub fn room_count(&self) -> usize {
        self.rooms().len()
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<Uuid, broadcast::Sender<ServerFrame>>> {
        // The map holds no invariants a panicking holder could break.
        self.rooms.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn joined_text(name: &str) -> String {
    format!("{name} has joined the chat")
}

pub fn left_text(name: &str) -> String {
    format!("{name} left the chat")
}

pub fn message_text(name: &str, body: &str) -> String {
    format!("{name}: {body}")
}

pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Trims a chat line and caps its length. Blank lines are dropped.
pub fn clean_message(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_MESSAGE_CHARS).collect())
}
