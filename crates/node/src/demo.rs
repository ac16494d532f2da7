use bc4000::InputFlags;
use bc4000::snapshot::{
    Bullet, CellType, Direction, Explosion, ExplosionType, FIELD_COLS, FIELD_ROWS, PLAYER_COUNT,
    PlayerState, Screen, Snapshot, Tank, TankType, timers,
};
use glam::Vec2;

const CELL_SIZE: f32 = 16.0;
const TANK_SIZE: f32 = CELL_SIZE * 4.0;
const BORDER_CELLS: usize = 2;
const PLAYER_SPEED: f32 = 220.0;
const BULLET_SPEED: f32 = 450.0;
const PLAYER_STARTS: [Vec2; PLAYER_COUNT] = [
    Vec2::new(CELL_SIZE * 20.0, CELL_SIZE * 50.0),
    Vec2::new(CELL_SIZE * 36.0, CELL_SIZE * 50.0),
];

/// Stand-in for the real game: two player tanks driving around an empty
/// arena so the link has something to carry.
pub struct DemoWorld {
    state: Snapshot,
    fire_held: [bool; PLAYER_COUNT],
}

impl DemoWorld {
    pub fn new() -> Self {
        let mut state = Snapshot {
            screen: Screen::PlayLan,
            stage_curtain_time: timers::STAGE_CURTAIN,
            ..Snapshot::default()
        };

        for row in 0..FIELD_ROWS {
            for col in 0..FIELD_COLS {
                let edge = row < BORDER_CELLS
                    || col < BORDER_CELLS
                    || row >= FIELD_ROWS - BORDER_CELLS
                    || col >= FIELD_COLS - BORDER_CELLS;
                if edge {
                    state.field.set(row, col, CellType::Border);
                }
            }
        }
        for col in 12..52 {
            state.field.set(28, col, CellType::Brick);
        }

        let kinds = [TankType::Player1, TankType::Player2];
        for (player, kind) in kinds.into_iter().enumerate() {
            state.tanks[player] = Tank {
                spawning_time: timers::SPAWNING,
                ..Tank::new(kind, PLAYER_STARTS[player], Direction::Up)
            };
            state.players[player] = PlayerState {
                lives: 3,
                ..PlayerState::default()
            };
        }

        Self {
            state,
            fire_held: [false; PLAYER_COUNT],
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    /// Advances one fixed step. `inputs` are player 1 (host) and player 2
    /// (client) controls.
    pub fn step(&mut self, tick: f64, dt: f32, inputs: [InputFlags; PLAYER_COUNT]) {
        self.state.tick = tick;
        self.state.stage_curtain_time = (self.state.stage_curtain_time - dt).max(0.0);

        for (player, input) in inputs.into_iter().enumerate() {
            let tank = &mut self.state.tanks[player];
            tank.spawning_time = (tank.spawning_time - dt).max(0.0);
            drive(tank, input, dt);

            let fire = input.contains(InputFlags::FIRE);
            if fire && !self.fire_held[player] {
                let bullet = Bullet {
                    pos: tank.pos + Vec2::splat(TANK_SIZE / 2.0),
                    direction: tank.direction,
                    owner: Some(player as u8),
                };
                if self.state.bullets.insert(bullet).is_err() {
                    log::debug!("Bullet slots full, player {} shot dropped", player + 1);
                }
            }
            self.fire_held[player] = fire;
        }

        let mut spent = Vec::new();
        for (index, bullet) in self.state.bullets.slots_mut().iter_mut().enumerate() {
            if let Some(bullet) = bullet {
                bullet.pos += bullet.direction.unit() * BULLET_SPEED * dt;
                if !in_arena(bullet.pos, 0.0) {
                    spent.push(index);
                }
            }
        }
        for index in spent {
            if let Some(bullet) = self.state.bullets.remove(index) {
                let pos = clamp_to_arena(bullet.pos, 0.0);
                let burst = Explosion::new(ExplosionType::Bullet, pos);
                if self.state.explosions.insert(burst).is_err() {
                    log::debug!("Explosion slots full, burst at {} dropped", pos);
                }
            }
        }

        self.state.explosions.retain(|explosion| {
            explosion.ttl -= dt;
            explosion.ttl > 0.0
        });
    }
}

fn drive(tank: &mut Tank, input: InputFlags, dt: f32) {
    let direction = if input.contains(InputFlags::RIGHT) {
        Some(Direction::Right)
    } else if input.contains(InputFlags::LEFT) {
        Some(Direction::Left)
    } else if input.contains(InputFlags::UP) {
        Some(Direction::Up)
    } else if input.contains(InputFlags::DOWN) {
        Some(Direction::Down)
    } else {
        None
    };

    tank.is_moving = direction.is_some();
    if let Some(direction) = direction {
        tank.direction = direction;
        tank.pos = clamp_to_arena(tank.pos + direction.unit() * PLAYER_SPEED * dt, TANK_SIZE);
    }
}

fn arena_max(size: f32) -> Vec2 {
    let far = Vec2::new(
        ((FIELD_COLS - BORDER_CELLS) as f32) * CELL_SIZE,
        ((FIELD_ROWS - BORDER_CELLS) as f32) * CELL_SIZE,
    );
    far - Vec2::splat(size)
}

fn in_arena(pos: Vec2, size: f32) -> bool {
    let min = Vec2::splat(BORDER_CELLS as f32 * CELL_SIZE);
    pos.cmpge(min).all() && pos.cmple(arena_max(size)).all()
}

fn clamp_to_arena(pos: Vec2, size: f32) -> Vec2 {
    pos.clamp(Vec2::splat(BORDER_CELLS as f32 * CELL_SIZE), arena_max(size))
}

/// Controls for an unattended client: circle the arena, firing now and then.
pub fn scripted_input(step: u64) -> InputFlags {
    let heading = match (step / 60) % 4 {
        0 => InputFlags::UP,
        1 => InputFlags::RIGHT,
        2 => InputFlags::DOWN,
        _ => InputFlags::LEFT,
    };
    if step % 30 < 2 {
        heading | InputFlags::FIRE
    } else {
        heading
    }
}
