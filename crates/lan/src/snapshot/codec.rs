use bytes::{Buf, BufMut};
use glam::Vec2;

use super::model::{
    Bullet, CellType, Direction, Explosion, ExplosionType, FIELD_CELLS, MAX_BULLETS,
    MAX_EXPLOSIONS, MAX_POWER_UPS, MAX_SCORE_POPUPS, MAX_TANKS, PLAYER_COUNT, PlayerState,
    PowerUp, PowerUpState, PowerUpType, ScorePopup, Screen, Snapshot, TANK_TYPE_COUNT, Tank,
    TankStatus, TankType, timers,
};
use super::quantize::{dequantize_position, dequantize_timer, quantize_position, quantize_timer};
use super::slots::Slots;
use crate::error::CodecError;

const TICK_SIZE: usize = 8;
const SCALARS_SIZE: usize = 14;
const PLAYER_SIZE: usize = 1 + 4 + TANK_TYPE_COUNT;
const TANK_SIZE: usize = 14;
const BULLET_SIZE: usize = 7;
const CELL_SIZE: usize = 1;
const POWER_UP_SIZE: usize = 6;
const EXPLOSION_SIZE: usize = 8;
const SCORE_POPUP_SIZE: usize = 7;

/// Length of every encoded snapshot.
pub const SNAPSHOT_SIZE: usize = TICK_SIZE
    + SCALARS_SIZE
    + PLAYER_COUNT * PLAYER_SIZE
    + MAX_TANKS * TANK_SIZE
    + MAX_BULLETS * BULLET_SIZE
    + FIELD_CELLS * CELL_SIZE
    + MAX_POWER_UPS * POWER_UP_SIZE
    + MAX_EXPLOSIONS * EXPLOSION_SIZE
    + MAX_SCORE_POPUPS * SCORE_POPUP_SIZE;

const NO_INDEX: u8 = u8::MAX;

const TANK_MOVING: u8 = 0b01;
const TANK_CARRIES_POWER_UP: u8 = 0b10;

// Every record below has a fixed width, so once `decode_into` has checked the
// total length no read can run past the end of the buffer.
type Reader<'a> = &'a [u8];

pub fn encode(snapshot: &Snapshot) -> Vec<u8> {
    let mut w = Vec::with_capacity(SNAPSHOT_SIZE);

    w.put_f64(snapshot.tick);
    put_scalars(&mut w, snapshot);
    for player in &snapshot.players {
        put_player(&mut w, player);
    }
    for tank in &snapshot.tanks {
        put_tank(&mut w, tank);
    }
    put_slots(&mut w, &snapshot.bullets, BULLET_SIZE, put_bullet);
    for cell in snapshot.field.cells() {
        w.put_u8(cell.to_wire());
    }
    for power_up in &snapshot.power_ups {
        put_power_up(&mut w, power_up);
    }
    put_slots(&mut w, &snapshot.explosions, EXPLOSION_SIZE, put_explosion);
    put_slots(&mut w, &snapshot.score_popups, SCORE_POPUP_SIZE, put_score_popup);

    debug_assert_eq!(w.len(), SNAPSHOT_SIZE);
    w
}

pub fn decode(bytes: &[u8]) -> Result<Snapshot, CodecError> {
    let mut snapshot = Snapshot::default();
    decode_into(bytes, &mut snapshot)?;
    Ok(snapshot)
}

/// Overwrites `snapshot` wholesale. On error it is left untouched.
pub fn decode_into(bytes: &[u8], snapshot: &mut Snapshot) -> Result<(), CodecError> {
    if bytes.len() != SNAPSHOT_SIZE {
        return Err(CodecError::Length {
            expected: SNAPSHOT_SIZE,
            actual: bytes.len(),
        });
    }

    let mut r: Reader<'_> = bytes;

    snapshot.tick = r.get_f64();
    get_scalars(&mut r, snapshot);
    for player in &mut snapshot.players {
        *player = get_player(&mut r);
    }
    for tank in &mut snapshot.tanks {
        *tank = get_tank(&mut r);
    }
    get_slots(&mut r, &mut snapshot.bullets, BULLET_SIZE, get_bullet);
    for cell in snapshot.field.cells_mut() {
        *cell = CellType::from(r.get_u8());
    }
    for power_up in &mut snapshot.power_ups {
        *power_up = get_power_up(&mut r);
    }
    get_slots(&mut r, &mut snapshot.explosions, EXPLOSION_SIZE, get_explosion);
    get_slots(
        &mut r,
        &mut snapshot.score_popups,
        SCORE_POPUP_SIZE,
        get_score_popup,
    );

    debug_assert!(!r.has_remaining());
    Ok(())
}

fn put_position(w: &mut Vec<u8>, pos: Vec2) {
    let [x, y] = quantize_position(pos);
    w.put_u16(x);
    w.put_u16(y);
}

fn get_position(r: &mut Reader<'_>) -> Vec2 {
    let x = r.get_u16();
    let y = r.get_u16();
    dequantize_position([x, y])
}

fn put_timer(w: &mut Vec<u8>, time: f32, max: f32) {
    w.put_u8(quantize_timer(time, max));
}

fn get_timer(r: &mut Reader<'_>, max: f32) -> f32 {
    dequantize_timer(r.get_u8(), max)
}

fn put_index(w: &mut Vec<u8>, index: Option<u8>) {
    w.put_u8(index.unwrap_or(NO_INDEX));
}

fn get_index(r: &mut Reader<'_>) -> Option<u8> {
    let byte = r.get_u8();
    (byte != NO_INDEX).then_some(byte)
}

/// Occupancy byte, then the record. Empty slots are zero-filled to the
/// same width.
fn put_slots<T, const N: usize>(
    w: &mut Vec<u8>,
    slots: &Slots<T, N>,
    record_size: usize,
    put: fn(&mut Vec<u8>, &T),
) {
    for slot in slots.slots() {
        match slot {
            Some(value) => {
                w.put_u8(1);
                put(w, value);
            }
            None => w.put_bytes(0, record_size),
        }
    }
}

fn get_slots<T, const N: usize>(
    r: &mut Reader<'_>,
    slots: &mut Slots<T, N>,
    record_size: usize,
    get: fn(&mut Reader<'_>) -> T,
) {
    for slot in slots.slots_mut() {
        *slot = if r.get_u8() != 0 {
            Some(get(r))
        } else {
            r.advance(record_size - 1);
            None
        };
    }
}

fn put_scalars(w: &mut Vec<u8>, s: &Snapshot) {
    w.put_u8(s.stage);
    w.put_u8(s.pending_enemies);
    w.put_u8(u8::from(s.flag_destroyed));
    w.put_u8(u8::from(s.is_paused));
    w.put_u8(s.screen.to_wire());
    w.put_u32(s.hi_score);
    put_timer(w, s.stage_curtain_time, timers::STAGE_CURTAIN);
    put_timer(w, s.game_over_time, timers::GAME_OVER);
    put_timer(w, s.stage_end_time, timers::STAGE_END);
    put_timer(w, s.freeze_time, timers::FREEZE);
    put_timer(w, s.shovel_time, timers::SHOVEL);
}

fn get_scalars(r: &mut Reader<'_>, s: &mut Snapshot) {
    s.stage = r.get_u8();
    s.pending_enemies = r.get_u8();
    s.flag_destroyed = r.get_u8() != 0;
    s.is_paused = r.get_u8() != 0;
    s.screen = Screen::from(r.get_u8());
    s.hi_score = r.get_u32();
    s.stage_curtain_time = get_timer(r, timers::STAGE_CURTAIN);
    s.game_over_time = get_timer(r, timers::GAME_OVER);
    s.stage_end_time = get_timer(r, timers::STAGE_END);
    s.freeze_time = get_timer(r, timers::FREEZE);
    s.shovel_time = get_timer(r, timers::SHOVEL);
}

fn put_player(w: &mut Vec<u8>, player: &PlayerState) {
    w.put_u8(player.lives);
    w.put_u32(player.score);
    w.put_slice(&player.kills);
}

fn get_player(r: &mut Reader<'_>) -> PlayerState {
    let mut player = PlayerState {
        lives: r.get_u8(),
        score: r.get_u32(),
        ..PlayerState::default()
    };
    r.copy_to_slice(&mut player.kills);
    player
}

fn put_tank(w: &mut Vec<u8>, tank: &Tank) {
    let mut flags = 0;
    if tank.is_moving {
        flags |= TANK_MOVING;
    }
    if tank.carries_power_up {
        flags |= TANK_CARRIES_POWER_UP;
    }

    w.put_u8(tank.kind.to_wire());
    put_position(w, tank.pos);
    w.put_u8(tank.direction.to_wire());
    w.put_u8(tank.status.to_wire());
    w.put_u8(tank.tier);
    w.put_u8(tank.armor);
    w.put_u8(flags);
    put_timer(w, tank.spawning_time, timers::SPAWNING);
    put_timer(w, tank.shield_time, timers::SHIELD);
    put_timer(w, tank.immobile_time, timers::IMMOBILE);
    put_timer(w, tank.sliding_time, timers::SLIDING);
}

fn get_tank(r: &mut Reader<'_>) -> Tank {
    let kind = TankType::from(r.get_u8());
    let pos = get_position(r);
    let direction = Direction::from(r.get_u8());
    let status = TankStatus::from(r.get_u8());
    let tier = r.get_u8();
    let armor = r.get_u8();
    let flags = r.get_u8();

    Tank {
        kind,
        pos,
        direction,
        status,
        tier,
        armor,
        is_moving: flags & TANK_MOVING != 0,
        carries_power_up: flags & TANK_CARRIES_POWER_UP != 0,
        spawning_time: get_timer(r, timers::SPAWNING),
        shield_time: get_timer(r, timers::SHIELD),
        immobile_time: get_timer(r, timers::IMMOBILE),
        sliding_time: get_timer(r, timers::SLIDING),
    }
}

fn put_bullet(w: &mut Vec<u8>, bullet: &Bullet) {
    put_position(w, bullet.pos);
    w.put_u8(bullet.direction.to_wire());
    put_index(w, bullet.owner);
}

fn get_bullet(r: &mut Reader<'_>) -> Bullet {
    Bullet {
        pos: get_position(r),
        direction: Direction::from(r.get_u8()),
        owner: get_index(r),
    }
}

fn put_power_up(w: &mut Vec<u8>, power_up: &PowerUp) {
    w.put_u8(power_up.kind.to_wire());
    put_position(w, power_up.pos);
    w.put_u8(power_up.state.to_wire());
}

fn get_power_up(r: &mut Reader<'_>) -> PowerUp {
    PowerUp {
        kind: PowerUpType::from(r.get_u8()),
        pos: get_position(r),
        state: PowerUpState::from(r.get_u8()),
    }
}

fn put_explosion(w: &mut Vec<u8>, explosion: &Explosion) {
    w.put_u8(explosion.kind.to_wire());
    put_position(w, explosion.pos);
    put_timer(w, explosion.ttl, explosion.kind.max_ttl());
    put_index(w, explosion.score_popup);
}

fn get_explosion(r: &mut Reader<'_>) -> Explosion {
    let kind = ExplosionType::from(r.get_u8());
    Explosion {
        kind,
        pos: get_position(r),
        ttl: get_timer(r, kind.max_ttl()),
        score_popup: get_index(r),
    }
}

fn put_score_popup(w: &mut Vec<u8>, popup: &ScorePopup) {
    w.put_u8(popup.points);
    put_position(w, popup.pos);
    put_timer(w, popup.ttl, timers::SCORE_POPUP);
}

fn get_score_popup(r: &mut Reader<'_>) -> ScorePopup {
    ScorePopup {
        points: r.get_u8(),
        pos: get_position(r),
        ttl: get_timer(r, timers::SCORE_POPUP),
    }
}
