//! Per-player simulation state: identity, status, territory/visibility/pov
//! and the move queue. One [`Player`] exists per connected user per room;
//! a reconnect under the same user id gets a fresh one (see the room
//! lifecycle notes on Player lifetimes).

use std::collections::VecDeque;

use kingdoms_map::{Cell, GameMap, Point, Territory, Visibility};
use kingdoms_protocol::{PlayerId, PlayerStatus};

/// Upper bound on queued moves. Not specified upstream; chosen small
/// enough that a client hammering the move endpoint faster than the
/// 0.7s tick cadence can't grow the queue unboundedly (see the
/// concurrency design's backpressure note).
const MAX_QUEUED_MOVES: usize = 16;

/// FIFO queue of `(previous, current)` move pairs plus the cursor state
/// `process_moves` advances each turn.
#[derive(Debug, Default, Clone)]
pub struct MoveQueue {
    queue: VecDeque<(Point, Point)>,
    cursor: Option<Point>,
    prev_cursor: Option<Point>,
}

impl MoveQueue {
    /// `move(prev, next)`: enqueues a pair when both sides are present,
    /// otherwise resets the queue and clears the cursors. A client that
    /// floods moves past `MAX_QUEUED_MOVES` gets the whole queue reset
    /// rather than a silent oldest-move eviction — the client is sending
    /// faster than the tick cadence can drain, so dropping back to empty
    /// is the simplest way to let it resynchronize.
    pub fn push(&mut self, previous: Option<Point>, current: Option<Point>) {
        match (previous, current) {
            (Some(p), Some(c)) => {
                if self.queue.len() >= MAX_QUEUED_MOVES {
                    self.reset();
                }
                self.queue.push_back((p, c));
            }
            _ => self.reset(),
        }
    }

    /// Clears the queue and both cursors. Called on an explicit
    /// null-sided move message, and on a failed/invalid move resolution.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.cursor = None;
        self.prev_cursor = None;
    }

    /// Non-blocking dequeue of the next move pair, or `None` if empty.
    pub fn pop(&mut self) -> Option<(Point, Point)> {
        self.queue.pop_front()
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    pub fn prev_cursor(&self) -> Option<Point> {
        self.prev_cursor
    }

    /// Advances the cursor pair: `prevCursor = cursor, cursor = next`.
    pub fn advance_cursor(&mut self, next: Point) {
        self.prev_cursor = self.cursor;
        self.cursor = Some(next);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// A connected user's state within one room. Lives for the duration of
/// one connection; a reconnect creates a new `Player`, not a reused one.
pub struct Player {
    pub id: PlayerId,
    pub nick: String,
    pub status: PlayerStatus,
    pub color: Option<usize>,
    pub init_point: Option<Point>,
    pub territory: Territory,
    pub visibility: Visibility,
    pub pov: GameMap,
    pub moves: MoveQueue,
}

impl Player {
    pub fn new(id: PlayerId, nick: String, height: usize, width: usize) -> Self {
        Self {
            id,
            nick,
            status: PlayerStatus::NotReady,
            color: None,
            init_point: None,
            territory: Territory::new(height, width),
            visibility: Visibility::new(height, width),
            pov: vec![vec![Cell::empty(); width]; height],
            moves: MoveQueue::default(),
        }
    }

    /// Sum of `power` across every cell this player currently owns on
    /// `map`, used for the `stat` field of an `update` message.
    pub fn total_power(&self, map: &GameMap) -> u64 {
        self.territory
            .points()
            .map(|p| map[p.row][p.col].power.unwrap_or(0) as u64)
            .sum()
    }
}
