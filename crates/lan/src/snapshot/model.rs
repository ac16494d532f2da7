use glam::Vec2;

use super::slots::Slots;
use super::wire::wire_enum;

pub const FIELD_ROWS: usize = 56;
pub const FIELD_COLS: usize = 64;
pub const FIELD_CELLS: usize = FIELD_ROWS * FIELD_COLS;
pub const PLAYER_COUNT: usize = 2;
pub const MAX_TANKS: usize = 6;
pub const MAX_BULLETS: usize = 100;
pub const MAX_POWER_UPS: usize = 3;
pub const MAX_EXPLOSIONS: usize = 100;
pub const MAX_SCORE_POPUPS: usize = 100;
pub const TANK_TYPE_COUNT: usize = 6;

/// Upper bounds, in seconds, of every countdown carried in a snapshot.
pub mod timers {
    pub const SPAWNING: f32 = 0.7;
    pub const SHIELD: f32 = 15.0;
    pub const IMMOBILE: f32 = 5.0;
    pub const SLIDING: f32 = 0.6;
    pub const STAGE_CURTAIN: f32 = 2.0;
    pub const GAME_OVER: f32 = 3.0;
    pub const STAGE_END: f32 = 3.0;
    pub const FREEZE: f32 = 15.0;
    pub const SHOVEL: f32 = 15.0;
    pub const BULLET_EXPLOSION: f32 = 0.2;
    pub const BIG_EXPLOSION: f32 = 0.4;
    pub const SCORE_POPUP: f32 = 0.5;
}

wire_enum! {
    pub enum TankType (fallback = Basic) {
        Player1 = 0,
        Player2 = 1,
        Basic = 2,
        Fast = 3,
        Power = 4,
        Armor = 5,
    }
}

impl TankType {
    pub fn is_player(self) -> bool {
        matches!(self, TankType::Player1 | TankType::Player2)
    }
}

wire_enum! {
    /// Unknown statuses decode as `Dead` so a bad ordinal never draws a tank.
    pub enum TankStatus (fallback = Dead) {
        Pending = 0,
        Spawning = 1,
        Active = 2,
        Dead = 3,
    }
}

wire_enum! {
    pub enum Direction (fallback = Up) {
        Left = 0,
        Right = 1,
        Up = 2,
        Down = 3,
    }
}

impl Direction {
    pub fn unit(self) -> Vec2 {
        match self {
            Direction::Left => Vec2::NEG_X,
            Direction::Right => Vec2::X,
            Direction::Up => Vec2::NEG_Y,
            Direction::Down => Vec2::Y,
        }
    }
}

wire_enum! {
    pub enum CellType (fallback = Blank) {
        Border = 0,
        Blank = 1,
        Brick = 2,
        Concrete = 3,
        Forest = 4,
        River = 5,
        Ice = 6,
    }
}

wire_enum! {
    pub enum PowerUpType (fallback = Star) {
        Star = 0,
        Tank = 1,
        Grenade = 2,
        Timer = 3,
        Shield = 4,
        Shovel = 5,
    }
}

wire_enum! {
    /// Unknown states decode as `PickedUp`, which is never drawn.
    pub enum PowerUpState (fallback = PickedUp) {
        Pending = 0,
        Active = 1,
        PickedUp = 2,
    }
}

wire_enum! {
    pub enum ExplosionType (fallback = Bullet) {
        Bullet = 0,
        Big = 1,
    }
}

impl ExplosionType {
    pub fn max_ttl(self) -> f32 {
        match self {
            ExplosionType::Bullet => timers::BULLET_EXPLOSION,
            ExplosionType::Big => timers::BIG_EXPLOSION,
        }
    }
}

wire_enum! {
    pub enum Screen (fallback = Title) {
        Title = 0,
        Lan = 1,
        HostGame = 2,
        JoinGame = 3,
        Play = 4,
        PlayLan = 5,
        Score = 6,
        ScoreLan = 7,
        GameOver = 8,
        Congrats = 9,
        TimedOut = 10,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tank {
    pub kind: TankType,
    pub pos: Vec2,
    pub direction: Direction,
    pub status: TankStatus,
    pub tier: u8,
    pub armor: u8,
    pub is_moving: bool,
    pub carries_power_up: bool,
    pub spawning_time: f32,
    pub shield_time: f32,
    pub immobile_time: f32,
    pub sliding_time: f32,
}

impl Tank {
    pub fn new(kind: TankType, pos: Vec2, direction: Direction) -> Self {
        Self {
            kind,
            pos,
            direction,
            status: TankStatus::Active,
            ..Self::default()
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.status, TankStatus::Spawning | TankStatus::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bullet {
    pub pos: Vec2,
    pub direction: Direction,
    /// Tank slot that fired it.
    pub owner: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PowerUp {
    pub kind: PowerUpType,
    pub pos: Vec2,
    pub state: PowerUpState,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Explosion {
    pub kind: ExplosionType,
    pub pos: Vec2,
    pub ttl: f32,
    /// Score popup shown once the explosion ends.
    pub score_popup: Option<u8>,
}

impl Explosion {
    pub fn new(kind: ExplosionType, pos: Vec2) -> Self {
        Self {
            kind,
            pos,
            ttl: kind.max_ttl(),
            score_popup: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScorePopup {
    /// Index into the points table (100, 200, 300, 400, 500).
    pub points: u8,
    pub pos: Vec2,
    pub ttl: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerState {
    pub lives: u8,
    pub score: u32,
    pub kills: [u8; TANK_TYPE_COUNT],
}

/// Terrain grid, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    cells: Vec<CellType>,
}

impl Field {
    pub fn filled(cell: CellType) -> Self {
        Self {
            cells: vec![cell; FIELD_CELLS],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<CellType> {
        Self::index(row, col).map(|index| self.cells[index])
    }

    pub fn set(&mut self, row: usize, col: usize, cell: CellType) -> bool {
        match Self::index(row, col) {
            Some(index) => {
                self.cells[index] = cell;
                true
            }
            None => false,
        }
    }

    pub fn cells(&self) -> &[CellType] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [CellType] {
        &mut self.cells
    }

    fn index(row: usize, col: usize) -> Option<usize> {
        (row < FIELD_ROWS && col < FIELD_COLS).then_some(row * FIELD_COLS + col)
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::filled(CellType::Blank)
    }
}

/// Complete authoritative game state at one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tick: f64,
    pub tanks: [Tank; MAX_TANKS],
    pub bullets: Slots<Bullet, MAX_BULLETS>,
    pub field: Field,
    pub power_ups: [PowerUp; MAX_POWER_UPS],
    pub explosions: Slots<Explosion, MAX_EXPLOSIONS>,
    pub score_popups: Slots<ScorePopup, MAX_SCORE_POPUPS>,
    pub players: [PlayerState; PLAYER_COUNT],
    pub stage: u8,
    pub pending_enemies: u8,
    pub flag_destroyed: bool,
    pub is_paused: bool,
    pub screen: Screen,
    pub hi_score: u32,
    pub stage_curtain_time: f32,
    pub game_over_time: f32,
    pub stage_end_time: f32,
    pub freeze_time: f32,
    pub shovel_time: f32,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            tick: 0.0,
            tanks: [Tank::default(); MAX_TANKS],
            bullets: Slots::new(),
            field: Field::default(),
            power_ups: [PowerUp::default(); MAX_POWER_UPS],
            explosions: Slots::new(),
            score_popups: Slots::new(),
            players: [PlayerState::default(); PLAYER_COUNT],
            stage: 1,
            pending_enemies: 0,
            flag_destroyed: false,
            is_paused: false,
            screen: Screen::default(),
            hi_score: 0,
            stage_curtain_time: 0.0,
            game_over_time: 0.0,
            stage_end_time: 0.0,
            freeze_time: 0.0,
            shovel_time: 0.0,
        }
    }
}

impl Snapshot {
    pub fn player_tank(&self, player: usize) -> Option<&Tank> {
        self.tanks.get(player).filter(|tank| tank.kind.is_player())
    }

    pub fn active_tanks(&self) -> impl Iterator<Item = (usize, &Tank)> {
        self.tanks
            .iter()
            .enumerate()
            .filter(|(_, tank)| tank.is_alive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tables_are_dense_from_zero() {
        fn check(ordinals: impl Iterator<Item = u8>) {
            for (expected, ordinal) in ordinals.enumerate() {
                assert_eq!(ordinal as usize, expected);
            }
        }
        check(TankType::ALL.iter().map(|v| v.to_wire()));
        check(TankStatus::ALL.iter().map(|v| v.to_wire()));
        check(Direction::ALL.iter().map(|v| v.to_wire()));
        check(CellType::ALL.iter().map(|v| v.to_wire()));
        check(PowerUpType::ALL.iter().map(|v| v.to_wire()));
        check(PowerUpState::ALL.iter().map(|v| v.to_wire()));
        check(ExplosionType::ALL.iter().map(|v| v.to_wire()));
        check(Screen::ALL.iter().map(|v| v.to_wire()));
        assert_eq!(TankType::ALL.len(), TANK_TYPE_COUNT);
    }

    #[test]
    fn unknown_ordinals_use_fallbacks() {
        assert_eq!(TankStatus::from(200), TankStatus::Dead);
        assert_eq!(PowerUpState::from(9), PowerUpState::PickedUp);
        assert_eq!(CellType::from(7), CellType::Blank);
        assert_eq!(Screen::from(11), Screen::Title);
    }

    #[test]
    fn field_bounds() {
        let mut field = Field::default();
        assert!(field.set(55, 63, CellType::Brick));
        assert!(!field.set(56, 0, CellType::Brick));
        assert_eq!(field.get(55, 63), Some(CellType::Brick));
        assert_eq!(field.get(0, 64), None);
        assert_eq!(field.cells().len(), FIELD_CELLS);
    }

    #[test]
    fn default_snapshot_has_no_live_tanks() {
        let snapshot = Snapshot::default();
        assert_eq!(snapshot.active_tanks().count(), 0);
        assert!(snapshot.player_tank(0).is_none());
        assert_eq!(snapshot.bullets.capacity(), MAX_BULLETS);
    }
}
