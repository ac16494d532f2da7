mod codec;
mod model;
mod quantize;
mod slots;
mod wire;

pub use codec::{SNAPSHOT_SIZE, decode, decode_into, encode};
pub use model::{
    Bullet, CellType, Direction, Explosion, ExplosionType, FIELD_CELLS, FIELD_COLS, FIELD_ROWS,
    Field, MAX_BULLETS, MAX_EXPLOSIONS, MAX_POWER_UPS, MAX_SCORE_POPUPS, MAX_TANKS, PLAYER_COUNT,
    PlayerState, PowerUp, PowerUpState, PowerUpType, ScorePopup, Screen, Snapshot,
    TANK_TYPE_COUNT, Tank, TankStatus, TankType, timers,
};
pub use quantize::{
    dequantize_coord, dequantize_position, dequantize_timer, quantize_coord, quantize_position,
    quantize_timer, timer_resolution,
};
pub use slots::Slots;
