/// A single game table: two seats, observers, the move log and the current
/// canonical position.
///
/// Status is never stored independently of the seats: it is recomputed after
/// every seat change, so `active` holds exactly when both seats are filled.
use std::collections::BTreeSet;
use std::time::Instant;
use serde::{Serialize, Deserialize};

use crate::config::hub::ANONYMOUS_NAME;
use crate::game::position::{side_to_move, INITIAL_POSITION};
use crate::game::types::{Color, GameResult, MoveDescriptor, MoveRecord};
use crate::server::connection::registry::ConnectionId;
use crate::server::ws_error::HubError;

pub type RoomId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Active,
    Ended,
}

/// A player occupying one of the two seats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub conn: ConnectionId,
    pub name: Option<String>,
    pub color: Color,
}

/// Public view of a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatSummary {
    pub color: Color,
    pub name: String,
    pub occupied: bool,
}

/// Where a joining connection ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Seated(Color),
    Observer,
}

#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    position: String,
    status: RoomStatus,
    white: Option<Seat>,
    black: Option<Seat>,
    observers: BTreeSet<ConnectionId>,
    moves: Vec<MoveRecord>,
    result: Option<GameResult>,
    pub created_at: Instant,
    ended_at: Option<Instant>,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            position: INITIAL_POSITION.to_string(),
            status: RoomStatus::Waiting,
            white: None,
            black: None,
            observers: BTreeSet::new(),
            moves: Vec::new(),
            result: None,
            created_at: Instant::now(),
            ended_at: None,
        }
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    pub fn ended_at(&self) -> Option<Instant> {
        self.ended_at
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn seat(&self, color: Color) -> Option<&Seat> {
        match color {
            Color::White => self.white.as_ref(),
            Color::Black => self.black.as_ref(),
        }
    }

    fn seat_mut(&mut self, color: Color) -> &mut Option<Seat> {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Color of the seat held by `conn`, if any.
    pub fn seat_of(&self, conn: ConnectionId) -> Option<Color> {
        [&self.white, &self.black]
            .into_iter()
            .flatten()
            .find(|seat| seat.conn == conn)
            .map(|seat| seat.color)
    }

    pub fn is_observer(&self, conn: ConnectionId) -> bool {
        self.observers.contains(&conn)
    }

    pub fn is_member(&self, conn: ConnectionId) -> bool {
        self.seat_of(conn).is_some() || self.is_observer(conn)
    }

    /// Every connection entitled to this room's events: both seats, then observers.
    pub fn members(&self) -> Vec<ConnectionId> {
        [&self.white, &self.black]
            .into_iter()
            .flatten()
            .map(|seat| seat.conn)
            .chain(self.observers.iter().copied())
            .collect()
    }

    pub fn players(&self) -> Vec<SeatSummary> {
        [Color::White, Color::Black]
            .into_iter()
            .map(|color| match self.seat(color) {
                Some(seat) => SeatSummary {
                    color,
                    name: seat.name.clone().unwrap_or_else(|| ANONYMOUS_NAME.to_string()),
                    occupied: true,
                },
                None => SeatSummary {
                    color,
                    name: ANONYMOUS_NAME.to_string(),
                    occupied: false,
                },
            })
            .collect()
    }

    /// Seat `conn` in the preferred color if free, else in any free seat, else
    /// as an observer. Ended rooms only take observers. A connection already in
    /// the room keeps its place.
    pub fn join(&mut self, conn: ConnectionId, name: Option<String>, preferred: Option<Color>) -> JoinOutcome {
        if let Some(color) = self.seat_of(conn) {
            return JoinOutcome::Seated(color);
        }
        if self.status == RoomStatus::Ended {
            self.observers.insert(conn);
            return JoinOutcome::Observer;
        }
        let order = match preferred {
            Some(color) => [color, color.opponent()],
            None => [Color::White, Color::Black],
        };
        match order.into_iter().find(|color| self.seat(*color).is_none()) {
            Some(color) => {
                self.observers.remove(&conn);
                *self.seat_mut(color) = Some(Seat { conn, name, color });
                self.recompute_status();
                JoinOutcome::Seated(color)
            }
            None => {
                self.observers.insert(conn);
                JoinOutcome::Observer
            }
        }
    }

    /// Seat the creator of a fresh room in `color`, replacing anyone there.
    pub fn seat_creator(&mut self, conn: ConnectionId, name: Option<String>, color: Color) -> Color {
        self.observers.remove(&conn);
        *self.seat_mut(color) = Some(Seat { conn, name, color });
        self.recompute_status();
        color
    }

    /// Check and apply a move by `conn`. Nothing changes on error.
    pub fn apply_move(&mut self, conn: ConnectionId, descriptor: &MoveDescriptor) -> Result<MoveRecord, HubError> {
        if self.status == RoomStatus::Ended {
            return Err(HubError::GameEnded);
        }
        let mover = self.seat_of(conn).ok_or(HubError::NotInRoom)?;
        if side_to_move(&self.position) != Some(mover) {
            return Err(HubError::NotYourTurn);
        }
        let submitted = descriptor.position.as_deref().ok_or(HubError::MissingPosition)?;
        match side_to_move(submitted) {
            Some(next) if next == mover.opponent() => {}
            Some(_) => {
                return Err(HubError::InvalidPosition(
                    "the resulting position must give the move to the opponent".to_string(),
                ));
            }
            None => {
                return Err(HubError::InvalidPosition("missing side to move".to_string()));
            }
        }

        let record = MoveRecord {
            from: descriptor.from.clone(),
            to: descriptor.to.clone(),
            san: descriptor.san.clone(),
            promotion: descriptor.promotion.clone(),
            position: submitted.to_string(),
            color: mover,
        };
        self.position = record.position.clone();
        self.moves.push(record.clone());
        Ok(record)
    }

    /// Mark the room ended with `result`, on behalf of a seated `conn`.
    pub fn end(&mut self, conn: ConnectionId, result: GameResult) -> Result<(), HubError> {
        if self.seat_of(conn).is_none() {
            return Err(HubError::NotInRoom);
        }
        if self.status == RoomStatus::Ended {
            return Err(HubError::GameEnded);
        }
        self.status = RoomStatus::Ended;
        self.result = Some(result);
        self.ended_at = Some(Instant::now());
        Ok(())
    }

    /// Vacate the seat of `conn` or drop it from the observers. Returns whether
    /// `conn` was a member at all.
    pub fn leave(&mut self, conn: ConnectionId) -> bool {
        if let Some(color) = self.seat_of(conn) {
            *self.seat_mut(color) = None;
            self.recompute_status();
            return true;
        }
        self.observers.remove(&conn)
    }

    fn recompute_status(&mut self) {
        if self.status == RoomStatus::Ended {
            return;
        }
        self.status = if self.white.is_some() && self.black.is_some() {
            RoomStatus::Active
        } else {
            RoomStatus::Waiting
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
    const AFTER_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";

    fn mv(from: &str, to: &str, position: Option<&str>) -> MoveDescriptor {
        MoveDescriptor {
            from: from.to_string(),
            to: to.to_string(),
            san: None,
            promotion: None,
            position: position.map(str::to_string),
        }
    }

    fn full_room() -> (Room, ConnectionId, ConnectionId) {
        let mut room = Room::new("room0001".into());
        let white = Uuid::new_v4();
        let black = Uuid::new_v4();
        room.join(white, Some("Ada".into()), Some(Color::White));
        room.join(black, None, None);
        (room, white, black)
    }

    #[test]
    fn test_status_tracks_seats() {
        let mut room = Room::new("r".into());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        assert_eq!(room.status(), RoomStatus::Waiting);

        assert_eq!(room.join(a, None, Some(Color::Black)), JoinOutcome::Seated(Color::Black));
        assert_eq!(room.status(), RoomStatus::Waiting);

        // Preferred color taken: falls back to the free seat.
        assert_eq!(room.join(b, None, Some(Color::Black)), JoinOutcome::Seated(Color::White));
        assert_eq!(room.status(), RoomStatus::Active);

        assert_eq!(room.join(c, None, None), JoinOutcome::Observer);
        assert_eq!(room.status(), RoomStatus::Active);
        assert_eq!(room.members(), vec![b, a, c]);

        assert!(room.leave(a));
        assert_eq!(room.status(), RoomStatus::Waiting);
        assert!(room.leave(c));
        assert!(!room.leave(c));
    }

    #[test]
    fn test_rejoin_keeps_seat() {
        let (mut room, white, _) = full_room();
        assert_eq!(room.join(white, None, Some(Color::Black)), JoinOutcome::Seated(Color::White));
        assert_eq!(room.observer_count(), 0);
    }

    #[test]
    fn test_observer_takes_vacated_seat() {
        let (mut room, _, black) = full_room();
        let watcher = Uuid::new_v4();
        assert_eq!(room.join(watcher, None, None), JoinOutcome::Observer);
        room.leave(black);
        assert_eq!(room.join(watcher, None, None), JoinOutcome::Seated(Color::Black));
        assert!(!room.is_observer(watcher));
        assert_eq!(room.status(), RoomStatus::Active);
    }

    #[test]
    fn test_players_summary() {
        let mut room = Room::new("r".into());
        room.join(Uuid::new_v4(), Some("Ada".into()), Some(Color::Black));
        assert_eq!(
            room.players(),
            vec![
                SeatSummary { color: Color::White, name: "Anonymous".into(), occupied: false },
                SeatSummary { color: Color::Black, name: "Ada".into(), occupied: true },
            ]
        );
    }

    #[test]
    fn test_moves_alternate_by_position() {
        let (mut room, white, black) = full_room();

        assert_eq!(room.apply_move(black, &mv("e7", "e5", Some(AFTER_E5))), Err(HubError::NotYourTurn));

        let record = room.apply_move(white, &mv("e2", "e4", Some(AFTER_E4))).unwrap();
        assert_eq!(record.color, Color::White);
        assert_eq!(room.position(), AFTER_E4);

        assert_eq!(room.apply_move(white, &mv("d2", "d4", Some(AFTER_E5))), Err(HubError::NotYourTurn));
        assert_eq!(room.position(), AFTER_E4);

        room.apply_move(black, &mv("e7", "e5", Some(AFTER_E5))).unwrap();
        assert_eq!(room.position(), AFTER_E5);
        assert_eq!(room.moves().len(), 2);
        assert_eq!(room.moves()[1].position, AFTER_E5);
    }

    #[test]
    fn test_turn_is_checked_before_move_contents() {
        let (mut room, white, black) = full_room();
        assert_eq!(room.apply_move(black, &mv("e7", "e5", None)), Err(HubError::NotYourTurn));

        room.apply_move(white, &mv("e2", "e4", Some(AFTER_E4))).unwrap();
        assert_eq!(room.apply_move(white, &mv("d2", "d4", None)), Err(HubError::NotYourTurn));
        assert_eq!(room.apply_move(black, &mv("e7", "e5", None)), Err(HubError::MissingPosition));
        assert_eq!(room.position(), AFTER_E4);
    }

    #[test]
    fn test_seat_creator() {
        let mut room = Room::new("r".into());
        let creator = Uuid::new_v4();
        assert_eq!(room.seat_creator(creator, Some("Ada".into()), Color::Black), Color::Black);
        assert_eq!(room.seat_of(creator), Some(Color::Black));
        assert_eq!(room.status(), RoomStatus::Waiting);
        assert_eq!(room.join(Uuid::new_v4(), None, None), JoinOutcome::Seated(Color::White));
        assert_eq!(room.status(), RoomStatus::Active);
    }

    #[test]
    fn test_move_rejections_leave_room_untouched() {
        let (mut room, white, _) = full_room();
        let stranger = Uuid::new_v4();

        assert_eq!(room.apply_move(stranger, &mv("e2", "e4", Some(AFTER_E4))), Err(HubError::NotInRoom));
        assert_eq!(room.apply_move(white, &mv("e2", "e4", None)), Err(HubError::MissingPosition));
        assert!(matches!(
            room.apply_move(white, &mv("e2", "e4", Some("8/8/8/8/8/8/8/8"))),
            Err(HubError::InvalidPosition(_))
        ));
        assert!(matches!(
            room.apply_move(white, &mv("e2", "e4", Some(AFTER_E5))),
            Err(HubError::InvalidPosition(_))
        ));
        assert_eq!(room.position(), INITIAL_POSITION);
        assert!(room.moves().is_empty());
    }

    #[test]
    fn test_moving_requires_both_seats_only_through_turn() {
        // A lone seated player may still move when it is their turn.
        let mut room = Room::new("r".into());
        let white = Uuid::new_v4();
        room.join(white, None, Some(Color::White));
        assert!(room.apply_move(white, &mv("e2", "e4", Some(AFTER_E4))).is_ok());
    }

    #[test]
    fn test_ended_is_absorbing() {
        let (mut room, white, black) = full_room();
        let result = GameResult { kind: crate::game::types::ResultKind::Resignation, winner: Some(Color::Black) };

        assert_eq!(room.end(Uuid::new_v4(), result.clone()), Err(HubError::NotInRoom));
        room.end(white, result.clone()).unwrap();
        assert_eq!(room.status(), RoomStatus::Ended);
        assert_eq!(room.result(), Some(&result));
        assert!(room.ended_at().is_some());

        assert_eq!(room.apply_move(white, &mv("e2", "e4", Some(AFTER_E4))), Err(HubError::GameEnded));
        assert_eq!(room.end(black, GameResult::default()), Err(HubError::GameEnded));
        assert_eq!(room.result(), Some(&result));

        room.leave(black);
        assert_eq!(room.status(), RoomStatus::Ended);
        let newcomer = Uuid::new_v4();
        assert_eq!(room.join(newcomer, None, Some(Color::Black)), JoinOutcome::Observer);
        assert_eq!(room.status(), RoomStatus::Ended);
    }
}
