//! The turn simulation: growth, move resolution, territory settlement
//! and per-player fog-of-war projection. Runs once per tick while a
//! room is `InProgress`; everything here is synchronous and owns no I/O,
//! which is what makes it straightforward to reason about and to test.

use std::collections::HashMap;

use kingdoms_map::{CellType, GameMap, Point};
use kingdoms_protocol::{PlayerId, PlayerStatus};

use crate::error::RoomError;
use crate::room::GameRoom;

/// Growth cadence for non-capital owned cells (every 15th turn).
const FIELD_GROWTH_PERIOD: u64 = 15;

/// Player ids in the turn-processing order spec.md §4.4 requires to be
/// fixed: ascending by id. Every step that iterates all players within a
/// turn (growth, moves, territory settlement, cursor sanity, POV) must use
/// this same order, or two players contesting the same cell in the same
/// tick would resolve to a non-reproducible winner depending on `HashMap`
/// iteration, which is randomized per process.
fn ordered_player_ids(room: &GameRoom) -> Vec<PlayerId> {
    let mut ids: Vec<PlayerId> = room.players.keys().copied().collect();
    ids.sort();
    ids
}

/// Runs one full turn: growth, moves, territory settlement, cursor
/// sanity and per-player POV projection. Returns `true` once exactly
/// one player remains `Ready` — the caller transitions the room to
/// `Finished` when this returns `true`. Returns [`RoomError::InvariantViolation`]
/// if a player's init point ends up owned by no one, which should never
/// happen and aborts the tick rather than silently continuing.
pub fn run_turn(room: &mut GameRoom) -> Result<bool, RoomError> {
    room.turn += 1;
    let turn = room.turn;

    update_map(room, turn);
    let diffs = process_moves(room);
    update_territory(room, diffs)?;
    sanity_check_cursors(room);

    let done = count_ready(room) <= 1;
    update_pov(room, done);
    if done {
        crown_winner(room);
    }
    Ok(done)
}

/// The last player still `Ready` once the game is done becomes `Winner`
/// so clients can render a winner banner; a room abandoned down to zero
/// `Ready` players (everyone disconnected) crowns no one.
fn crown_winner(room: &mut GameRoom) {
    let winner = room
        .players
        .values()
        .find(|p| p.status == PlayerStatus::Ready)
        .map(|p| p.id);
    if let Some(id) = winner {
        room.players.get_mut(&id).unwrap().status = PlayerStatus::Winner;
    }
}

fn count_ready(room: &GameRoom) -> usize {
    room.players.values().filter(|p| p.status == PlayerStatus::Ready).count()
}

/// KING and CASTLE cells owned by a player grow by one power every
/// turn; every other owned cell grows only on a turn that's a multiple
/// of [`FIELD_GROWTH_PERIOD`].
fn update_map(room: &mut GameRoom, turn: u64) {
    let player_ids = ordered_player_ids(room);
    for id in player_ids {
        let points: Vec<Point> = room.players[&id].territory.points().collect();
        for p in points {
            let cell = &mut room.map[p.row][p.col];
            match cell.cell_type {
                Some(CellType::King) | Some(CellType::Castle) => {
                    cell.power = Some(cell.power.unwrap_or(0) + 1);
                }
                _ => {
                    if turn % FIELD_GROWTH_PERIOD == 0 {
                        cell.power = Some(cell.power.unwrap_or(0) + 1);
                    }
                }
            }
        }
    }
}

/// Ownership change recorded while resolving moves, applied to
/// territory sets in [`update_territory`]. Keyed by the captured point.
type MapDiff = HashMap<Point, (Option<PlayerId>, Option<PlayerId>)>;

/// Consumes at most one queued move per player, in a fixed (ascending
/// player id) order, and resolves each against the authoritative map.
fn process_moves(room: &mut GameRoom) -> MapDiff {
    let mut diffs = MapDiff::new();
    let player_ids = ordered_player_ids(room);

    for id in player_ids {
        let popped = room.players.get_mut(&id).and_then(|p| p.moves.pop());
        let Some((src, dst)) = popped else { continue };

        room.players.get_mut(&id).unwrap().moves.advance_cursor(dst);

        if !in_bounds(&room.map, dst) {
            room.players.get_mut(&id).unwrap().moves.reset();
            continue;
        }

        let target_cell = room.map[dst.row][dst.col];
        if target_cell.cell_type == Some(CellType::Blocker) {
            room.players.get_mut(&id).unwrap().moves.reset();
            continue;
        }

        let src_cell = room.map[src.row][src.col];
        let src_power = src_cell.power.unwrap_or(0).saturating_sub(1);
        if src_cell.player != Some(id.0) || src_power < 1 {
            room.players.get_mut(&id).unwrap().moves.reset();
            continue;
        }

        if target_cell.player == Some(id.0) {
            room.map[src.row][src.col].power = Some(1);
            room.map[dst.row][dst.col].power = Some(target_cell.power.unwrap_or(0) + src_power);
            continue;
        }

        let target_power = target_cell.power.unwrap_or(0);
        let diff = src_power as i64 - target_power as i64;
        if diff < 0 {
            room.map[src.row][src.col].power = Some(1);
            room.map[dst.row][dst.col].power = Some((-diff) as u32);
            room.players.get_mut(&id).unwrap().moves.reset();
        } else {
            let old_owner = target_cell.player.map(PlayerId);
            room.map[dst.row][dst.col].player = Some(id.0);
            room.map[dst.row][dst.col].power = Some(diff as u32);
            room.map[src.row][src.col].power = Some(1);
            diffs.insert(dst, (old_owner, Some(id)));
        }
    }

    diffs
}

fn in_bounds(map: &GameMap, p: Point) -> bool {
    p.row < map.len() && map.first().map(|row| p.col < row.len()).unwrap_or(false)
}

/// Applies territory-set changes from `process_moves`, then checks
/// whether any player's capital has fallen — if so, the captor annexes
/// the entire fallen kingdom and the old owner is marked `Loser`.
///
/// A player's init point losing its owner entirely (no `player` set on
/// that cell) is an invariant violation, not a no-op: the capital cell
/// can only ever belong to its owner or whoever captured it. Returns
/// [`RoomError::InvariantViolation`] in that case so the caller can abort
/// the tick and tear the room down, matching the original's
/// `territory_manager.py` raising on the same condition.
fn update_territory(room: &mut GameRoom, diffs: MapDiff) -> Result<(), RoomError> {
    for (point, (old_owner, new_owner)) in diffs {
        if let Some(old) = old_owner {
            if let Some(p) = room.players.get_mut(&old) {
                p.territory.remove_point(point);
            }
        }
        if let Some(new) = new_owner {
            if let Some(p) = room.players.get_mut(&new) {
                p.territory.add_point(point);
            }
        }
    }

    let player_ids = ordered_player_ids(room);
    for id in player_ids {
        let player = &room.players[&id];
        if player.status == PlayerStatus::Loser {
            continue;
        }
        let Some(init_point) = player.init_point else { continue };
        let current_owner = room.map[init_point.row][init_point.col].player;
        if current_owner == Some(id.0) {
            continue;
        }
        let Some(current_owner) = current_owner else {
            tracing::error!(
                room_key = %room.room_key,
                player = id.0,
                "init point invariant violated: cell has no owner"
            );
            return Err(RoomError::InvariantViolation { room_key: room.room_key.clone(), player: id });
        };
        let captor = PlayerId(current_owner);
        annex_kingdom(room, id, captor);
    }
    Ok(())
}

fn annex_kingdom(room: &mut GameRoom, loser: PlayerId, captor: PlayerId) {
    let fallen_points: Vec<Point> = room
        .players
        .get(&loser)
        .map(|p| p.territory.points().collect())
        .unwrap_or_default();

    for point in &fallen_points {
        room.map[point.row][point.col].player = Some(captor.0);
    }

    if let Some(captor_player) = room.players.get_mut(&captor) {
        captor_player.territory.batch_add_points(fallen_points.iter().copied());
        captor_player.territory.apply_batch_updates();
    }
    if let Some(loser_player) = room.players.get_mut(&loser) {
        loser_player.territory.clear();
        loser_player.status = PlayerStatus::Loser;
        loser_player.moves.reset();
    }
}

/// If a player's cursor points outside their (possibly just-shrunk)
/// territory, drop their queued moves — the path they were building no
/// longer starts from ground they control.
fn sanity_check_cursors(room: &mut GameRoom) {
    let player_ids = ordered_player_ids(room);
    for id in player_ids {
        let player = room.players.get_mut(&id).unwrap();
        if let Some(cursor) = player.moves.cursor() {
            if !player.territory.contains(cursor) {
                player.moves.reset();
            }
        }
    }
}

/// Projects each player's point of view. A `Loser`, or any player once
/// the game is `done`, sees the full authoritative map; everyone else
/// sees only what's inside their current visibility mask, refreshed
/// every turn so in-view power changes stay current.
fn update_pov(room: &mut GameRoom, done: bool) {
    let player_ids = ordered_player_ids(room);
    for id in player_ids {
        let full_view = done || room.players[&id].status == PlayerStatus::Loser;

        if full_view {
            let map = room.map.clone();
            room.players.get_mut(&id).unwrap().pov = map;
            continue;
        }

        let territory_points: Vec<Point> = room.players[&id].territory.points().collect();
        let player = room.players.get_mut(&id).unwrap();
        let diff = player.visibility.update(territory_points);

        for p in diff {
            if !player.visibility.is_visible(p) {
                player.pov[p.row][p.col].clear();
            }
        }
        let visible: Vec<Point> = player.visibility.visible_points().collect();
        for p in visible {
            player.pov[p.row][p.col] = room.map[p.row][p.col];
        }
    }
}
