/// FIFO matchmaking queue.
///
/// Entries are never reordered: the two longest-waiting players are always the
/// next pair.
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use rand::Rng;

use crate::game::types::Color;
use crate::server::connection::registry::ConnectionId;

/// A player waiting for an opponent.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub conn: ConnectionId,
    pub name: Option<String>,
    pub enqueued_at: Instant,
    seq: u64,
}

impl QueueEntry {
    /// Time spent in the queue as of `now`.
    pub fn waited(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.enqueued_at)
    }
}

/// Two entries taken off the front of the queue, already assigned colors.
#[derive(Debug, Clone)]
pub struct Pairing {
    pub white: QueueEntry,
    pub black: QueueEntry,
}

#[derive(Debug, Default)]
pub struct MatchmakingQueue {
    entries: VecDeque<QueueEntry>,
    next_seq: u64,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 1-based position of `conn`, if queued.
    pub fn position(&self, conn: ConnectionId) -> Option<usize> {
        self.entries.iter().position(|e| e.conn == conn).map(|idx| idx + 1)
    }

    /// Append `conn` and return its 1-based position. A connection already in
    /// the queue keeps its place (its name is refreshed).
    pub fn enqueue(&mut self, conn: ConnectionId, name: Option<String>) -> usize {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.conn == conn) {
            entry.name = name;
            return self.position(conn).unwrap_or(self.entries.len());
        }
        self.next_seq += 1;
        self.entries.push_back(QueueEntry {
            conn,
            name,
            enqueued_at: Instant::now(),
            seq: self.next_seq,
        });
        self.entries.len()
    }

    /// Remove `conn`. Returns false if it was not queued.
    pub fn cancel(&mut self, conn: ConnectionId) -> bool {
        match self.entries.iter().position(|e| e.conn == conn) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Pop the two longest-waiting entries if there are at least two. The
    /// first of them gets white or black with equal probability.
    pub fn try_match<R: Rng>(&mut self, rng: &mut R) -> Option<Pairing> {
        if self.entries.len() < 2 {
            return None;
        }
        let first = self.entries.pop_front()?;
        let second = self.entries.pop_front()?;
        let pairing = match first_player_color(rng) {
            Color::White => Pairing { white: first, black: second },
            Color::Black => Pairing { white: second, black: first },
        };
        Some(pairing)
    }

    /// Put a pairing that could not be seated back at the front, oldest first.
    pub fn restore(&mut self, pairing: Pairing) {
        let Pairing { white, black } = pairing;
        let (older, newer) = if white.seq < black.seq {
            (white, black)
        } else {
            (black, white)
        };
        self.entries.push_front(newer);
        self.entries.push_front(older);
    }

    /// Queued connections with their current 1-based positions.
    pub fn positions(&self) -> impl Iterator<Item = (ConnectionId, usize)> + '_ {
        self.entries.iter().enumerate().map(|(idx, e)| (e.conn, idx + 1))
    }
}

fn first_player_color<R: Rng>(rng: &mut R) -> Color {
    if rng.random_bool(0.5) { Color::White } else { Color::Black }
}
