//! Room state machine: authoritative map, connected players, and the
//! lifecycle phase governing which operations are currently valid.
//!
//! `GameRoom` itself is plain synchronous state — no locking, no I/O. The
//! concurrency story lives one layer up, in [`crate::runtime::RoomHandle`],
//! which wraps a `GameRoom` in a single async mutex so every mutation
//! (connect, disconnect, a queued move, a tick) happens as one atomic
//! step. See the concurrency notes there for why a lock was chosen over
//! the channel-actor most of this crate's sibling primitives favor.

use std::collections::HashMap;

use kingdoms_map::{Cell, CellType, GameMap, MapAndMeta, MapMeta, Point};
use kingdoms_protocol::{GameStat, OutMessage, PlayerData, PlayerId, PlayerStatus, WireIndex};

use crate::config::RoomConfig;
use crate::error::RoomError;
use crate::player::Player;

/// A room's position in the lifecycle described by the connection close-
/// code table: players can only join while `Waiting`, the tick loop only
/// runs while `InProgress`, and `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Waiting,
    InProgress,
    Finished,
}

/// A materialized room. One `GameRoom` exists per room key per replica,
/// built from the directory's [`MapAndMeta`] blob the first time a player
/// connects to it on this process.
pub struct GameRoom {
    pub room_key: String,
    pub config: RoomConfig,
    pub map: GameMap,
    pub meta: MapMeta,
    pub players: HashMap<PlayerId, Player>,
    pub turn: u64,
    pub phase: RoomPhase,
    slots: Vec<Point>,
    colors_taken: Vec<bool>,
}

impl GameRoom {
    pub fn new(room_key: String, config: RoomConfig, seed: MapAndMeta) -> Self {
        let slots = seed.meta.spawns().to_vec();
        let colors_taken = vec![false; config.colors_count];
        let map = Self::prepare_map(seed.map, config.default_castle_power);
        Self {
            room_key,
            map,
            meta: seed.meta,
            players: HashMap::new(),
            turn: 0,
            phase: RoomPhase::Waiting,
            slots,
            colors_taken,
            config,
        }
    }

    /// Stamps every `CASTLE` cell on a freshly-loaded map with the
    /// configured starting power — maps arrive from the directory with
    /// castle cells declared but unpowered, the same way the room that
    /// seeds them doesn't know the config in effect on whichever replica
    /// eventually hosts the game.
    fn prepare_map(mut map: GameMap, default_castle_power: u32) -> GameMap {
        for row in &mut map {
            for cell in row {
                if cell.cell_type == Some(CellType::Castle) {
                    cell.power = Some(default_castle_power);
                }
            }
        }
        map
    }

    fn height(&self) -> usize {
        self.map.len()
    }

    fn width(&self) -> usize {
        self.map.first().map(|row| row.len()).unwrap_or(0)
    }

    /// Number of spawn points the map started with — the room's seat
    /// count, used as the lobby's `max_players`.
    pub fn max_players(&self) -> usize {
        self.meta.spawns().len()
    }

    /// Reconnection is only meaningful while the room hasn't started —
    /// once `InProgress` or `Finished`, a dropped connection's territory
    /// stays put under its last owner rather than waiting for them back.
    pub fn allow_reconnect(&self) -> bool {
        matches!(self.phase, RoomPhase::Waiting)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn take_color(&mut self) -> Option<usize> {
        let idx = self.colors_taken.iter().position(|taken| !taken)?;
        self.colors_taken[idx] = true;
        Some(idx)
    }

    fn release_color(&mut self, color: usize) {
        if let Some(slot) = self.colors_taken.get_mut(color) {
            *slot = false;
        }
    }

    /// Claims a spawn slot for `id`, writes their KING cell onto the
    /// authoritative map, and registers a fresh [`Player`]. Only valid in
    /// `Waiting`; fails closed once the room has started or run out of
    /// slots.
    pub fn connect(&mut self, id: PlayerId, nick: String) -> Result<(), RoomError> {
        match self.phase {
            RoomPhase::InProgress => return Err(RoomError::InGame(self.room_key.clone())),
            RoomPhase::Finished => return Err(RoomError::NotReady(self.room_key.clone())),
            RoomPhase::Waiting => {}
        }

        let slot = self
            .slots
            .pop()
            .ok_or_else(|| RoomError::NoSlots(self.room_key.clone()))?;

        self.map[slot.row][slot.col] = Cell {
            cell_type: Some(CellType::King),
            player: Some(id.0),
            power: Some(self.config.default_king_power),
        };

        let mut player = Player::new(id, nick, self.height(), self.width());
        player.init_point = Some(slot);
        player.color = self.take_color();
        player.territory.add_point(slot);
        player.visibility.update([slot]);
        self.players.insert(id, player);
        Ok(())
    }

    /// Reassigns `id`'s color to `color` if it's in range and unclaimed.
    /// Out-of-range or already-taken requests are silently ignored — the
    /// client simply keeps its previous color.
    pub fn set_color(&mut self, id: PlayerId, color: usize) {
        if color >= self.config.colors_count || self.colors_taken[color] {
            return;
        }
        let Some(player) = self.players.get_mut(&id) else { return };
        let previous = player.color.replace(color);
        if let Some(previous) = previous {
            self.release_color(previous);
        }
        self.colors_taken[color] = true;
    }

    pub fn mark_ready(&mut self, id: PlayerId) {
        if let Some(player) = self.players.get_mut(&id) {
            player.status = PlayerStatus::Ready;
        }
    }

    /// The waiting-room barrier: at least two players present, all of
    /// them `Ready`.
    pub fn all_ready(&self) -> bool {
        self.players.len() > 1 && self.players.values().all(|p| p.status == PlayerStatus::Ready)
    }

    pub fn start(&mut self) {
        self.phase = RoomPhase::InProgress;
    }

    pub fn finish(&mut self) {
        self.phase = RoomPhase::Finished;
    }

    /// Removes `id` from the room. In `Waiting` this also frees their
    /// slot and color and resets their KING cell back to empty spawn
    /// ground; once the game has started, a disconnected player's
    /// territory is left exactly where it was; they can return to it.
    pub fn disconnect(&mut self, id: PlayerId) {
        let Some(player) = self.players.remove(&id) else { return };
        if !matches!(self.phase, RoomPhase::Waiting) {
            return;
        }
        if let Some(color) = player.color {
            self.release_color(color);
        }
        if let Some(init) = player.init_point {
            self.map[init.row][init.col] = Cell { cell_type: Some(CellType::Spawn), player: None, power: None };
            self.slots.push(init);
        }
    }

    pub fn queue_move(&mut self, id: PlayerId, previous: Option<WireIndex>, current: Option<WireIndex>) {
        if let Some(player) = self.players.get_mut(&id) {
            player.moves.push(previous.map(Point::from), current.map(Point::from));
        }
    }

    /// Roster snapshot for a `players` broadcast, sorted by id for a
    /// stable wire order.
    pub fn roster(&self) -> Vec<PlayerData> {
        let mut roster: Vec<PlayerData> = self
            .players
            .values()
            .map(|p| PlayerData {
                id: p.id.0,
                username: p.nick.clone(),
                color: p.color.unwrap_or(0),
                status: p.status,
            })
            .collect();
        roster.sort_by_key(|p| p.id);
        roster
    }

    /// Builds `id`'s next `update` message from their current POV —
    /// `None` if they're not in the room.
    pub fn update_message_for(&self, id: PlayerId) -> Option<OutMessage> {
        let player = self.players.get(&id)?;
        let data = PlayerData {
            id: player.id.0,
            username: player.nick.clone(),
            color: player.color.unwrap_or(0),
            status: player.status,
        };
        let stat = GameStat { fields: player.territory.count(), power: player.total_power(&self.map) };
        Some(OutMessage::Update {
            map: player.pov.clone(),
            turn: self.turn,
            stat: (data, stat),
            cursor: player.moves.cursor().map(WireIndex::from),
            prev_cursor: player.moves.prev_cursor().map(WireIndex::from),
        })
    }
}

#[cfg(test)]
impl GameRoom {
    pub fn join_for_test(&mut self, id: PlayerId, nick: String) -> Result<(), RoomError> {
        self.connect(id, nick)
    }

    pub fn mark_ready_for_test(&mut self, id: PlayerId) {
        self.mark_ready(id);
    }

    pub fn force_in_progress_for_test(&mut self) {
        self.phase = RoomPhase::InProgress;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kingdoms_map::CellType;
    use std::collections::HashMap as StdHashMap;

    fn two_spawn_map() -> MapAndMeta {
        let map = vec![vec![Cell::empty(); 4]; 4];
        let mut poi = StdHashMap::new();
        poi.insert(CellType::Spawn, vec![Point::new(0, 0), Point::new(3, 3)]);
        MapAndMeta { map, meta: MapMeta { version: 1, points_of_interest: poi } }
    }

    #[test]
    fn new_room_stamps_castle_cells_with_configured_power() {
        let mut seed = two_spawn_map();
        seed.map[1][1] = Cell { cell_type: Some(CellType::Castle), player: None, power: None };
        let room = GameRoom::new("ABCDE".into(), RoomConfig::default(), seed);
        assert_eq!(room.map[1][1].power, Some(RoomConfig::default().default_castle_power));
    }

    #[test]
    fn connect_claims_a_slot_and_assigns_a_color() {
        let mut room = GameRoom::new("ABCDE".into(), RoomConfig::default(), two_spawn_map());
        room.connect(PlayerId(1), "alice".into()).unwrap();
        let player = &room.players[&PlayerId(1)];
        assert_eq!(player.color, Some(0));
        let init = player.init_point.unwrap();
        assert_eq!(room.map[init.row][init.col].cell_type, Some(CellType::King));
    }

    #[test]
    fn connect_fails_once_slots_are_exhausted() {
        let mut room = GameRoom::new("ABCDE".into(), RoomConfig::default(), two_spawn_map());
        room.connect(PlayerId(1), "a".into()).unwrap();
        room.connect(PlayerId(2), "b".into()).unwrap();
        let err = room.connect(PlayerId(3), "c".into()).unwrap_err();
        assert_eq!(err.close_code(), 4010);
    }

    #[test]
    fn connect_fails_once_in_progress() {
        let mut room = GameRoom::new("ABCDE".into(), RoomConfig::default(), two_spawn_map());
        room.start();
        let err = room.connect(PlayerId(1), "a".into()).unwrap_err();
        assert_eq!(err.close_code(), 4020);
    }

    #[test]
    fn disconnect_while_waiting_frees_slot_and_color() {
        let mut room = GameRoom::new("ABCDE".into(), RoomConfig::default(), two_spawn_map());
        room.connect(PlayerId(1), "a".into()).unwrap();
        let init = room.players[&PlayerId(1)].init_point.unwrap();
        room.disconnect(PlayerId(1));
        assert!(room.is_empty());
        assert_eq!(room.map[init.row][init.col].cell_type, Some(CellType::Spawn));
        room.connect(PlayerId(2), "b".into()).unwrap();
        assert_eq!(room.players[&PlayerId(2)].color, Some(0));
    }

    #[test]
    fn disconnect_in_progress_leaves_territory_in_place() {
        let mut room = GameRoom::new("ABCDE".into(), RoomConfig::default(), two_spawn_map());
        room.connect(PlayerId(1), "a".into()).unwrap();
        let init = room.players[&PlayerId(1)].init_point.unwrap();
        room.start();
        room.disconnect(PlayerId(1));
        assert_eq!(room.map[init.row][init.col].cell_type, Some(CellType::King));
        assert_eq!(room.map[init.row][init.col].player, Some(1));
    }

    #[test]
    fn all_ready_requires_more_than_one_player() {
        let mut room = GameRoom::new("ABCDE".into(), RoomConfig::default(), two_spawn_map());
        room.connect(PlayerId(1), "a".into()).unwrap();
        room.mark_ready(PlayerId(1));
        assert!(!room.all_ready());
        room.connect(PlayerId(2), "b".into()).unwrap();
        assert!(!room.all_ready());
        room.mark_ready(PlayerId(2));
        assert!(room.all_ready());
    }

    #[test]
    fn set_color_ignores_taken_or_out_of_range_requests() {
        let mut room = GameRoom::new("ABCDE".into(), RoomConfig::default(), two_spawn_map());
        room.connect(PlayerId(1), "a".into()).unwrap();
        room.connect(PlayerId(2), "b".into()).unwrap();
        let p1_color = room.players[&PlayerId(1)].color;
        let p2_color = room.players[&PlayerId(2)].color.unwrap();

        room.set_color(PlayerId(1), p2_color);
        assert_eq!(room.players[&PlayerId(1)].color, p1_color, "taken color request is a no-op");

        room.set_color(PlayerId(1), 999);
        assert_eq!(room.players[&PlayerId(1)].color, p1_color, "out-of-range request is a no-op");

        let free = (0..room.config.colors_count).find(|c| *c != p1_color.unwrap() && *c != p2_color).unwrap();
        room.set_color(PlayerId(1), free);
        assert_eq!(room.players[&PlayerId(1)].color, Some(free));
    }
}
