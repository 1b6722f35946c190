//! The Room: owns the World and every system, runs the fixed-tick
//! accumulator loop, and is the only place `World` mutation happens.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use jelly_ecs::components::{flags, Config, Input, Physics, Pigment, Stats, Transform};
use jelly_ecs::dirty::DirtyTracker;
use jelly_ecs::handle::EntityHandle;
use jelly_ecs::world::{World, DEFAULT_N_MAX};
use jelly_sim::prelude::*;
use jelly_net::prelude::*;
use rand::Rng;
use rand_pcg::Pcg32;
use tracing::{debug, info, warn};

use crate::config::LevelConfig;
use crate::input::parse_and_validate;
use crate::session::Session;
use crate::RoomError;

pub type SessionId = u64;

const RESPAWN_DELAY_SECS: f32 = 1.5;
const PICKUP_RADIUS: f32 = 24.0;
const JOIN_SPAWN_FRACTION: f32 = 0.8;
const SEQ_WRAP: u32 = 0x7FFF_FFFF;
const PROJECTILE_SPEED: f32 = 300.0;
const PROJECTILE_RADIUS: f32 = 6.0;
const PROJECTILE_TTL_SECS: f32 = 2.0;

/// Bookkeeping for a client-owned auxiliary entity, so its owner's
/// `child_entity_count` can be released back once the entity is gone.
struct ProjectileOwner {
    session_id: SessionId,
    ttl: f32,
}

/// Validated, sanitized options for a new session joining the room.
#[derive(Debug, Clone)]
pub struct JoinOptions {
    pub name: String,
    pub shape_id: u8,
    pub pigment: (f32, f32, f32),
}

impl JoinOptions {
    fn validate(&self) -> Result<(), RoomError> {
        if self.name.is_empty() || self.name.chars().count() > 32 {
            return Err(RoomError::InvalidJoinOptions(
                "name must be 1-32 characters".into(),
            ));
        }
        let (r, g, b) = self.pigment;
        for c in [r, g, b] {
            if !(0.0..=1.0).contains(&c) {
                return Err(RoomError::InvalidJoinOptions(
                    "pigment components must be in [0, 1]".into(),
                ));
            }
        }
        Ok(())
    }
}

/// One match's authoritative state: the World, its systems, every session,
/// and the fixed-tick accumulator that drives them forward.
pub struct Room {
    world: World,
    dirty: DirtyTracker,
    events: EventRing,
    snapshot: SnapshotEncoder,

    movement: MovementSystem,
    physics: PhysicsSystem,
    skill: SkillSystem,
    ring: RingSystem,
    spawner: WaveSpawner,

    sessions: HashMap<SessionId, Session>,
    respawn_timers: HashMap<u16, f32>,
    /// Food entity slots in spawn order, oldest first, so the population cap
    /// can be enforced by FIFO eviction over the food id space.
    food_order: VecDeque<u16>,
    projectiles: HashMap<u16, ProjectileOwner>,

    config: LevelConfig,
    constants: SimConstants,
    thresholds: RingThresholds,
    placement_rng: Pcg32,
    target_pigment: (f32, f32, f32),

    accumulator: f32,
    tick_count: u64,
    game_time: f32,
    accepting_joins: bool,
}

impl Room {
    pub fn new(seed: u64, config: LevelConfig) -> Result<Self, RoomError> {
        config.validate()?;
        let constants = SimConstants::default();
        info!(friction_base = constants.friction_base, "room created");

        let thresholds = RingThresholds {
            t2: config.thresholds.ring2,
            t3: config.thresholds.ring3,
            ..RingThresholds::default()
        };

        let mut placement_rng = Pcg32::new(seed, 0xda3e39cb94b95bdb);
        let target_pigment = (
            placement_rng.gen_range(0.0..1.0),
            placement_rng.gen_range(0.0..1.0),
            placement_rng.gen_range(0.0..1.0),
        );

        Ok(Self {
            world: World::new(DEFAULT_N_MAX),
            dirty: DirtyTracker::new(),
            events: EventRing::new(256),
            snapshot: SnapshotEncoder::new(constants.snapshot_interval_ticks),
            movement: MovementSystem,
            physics: PhysicsSystem,
            skill: SkillSystem,
            ring: RingSystem,
            spawner: WaveSpawner::new(seed, &config.to_wave_config()),
            sessions: HashMap::new(),
            respawn_timers: HashMap::new(),
            food_order: VecDeque::new(),
            projectiles: HashMap::new(),
            target_pigment,
            placement_rng,
            thresholds,
            config,
            constants,
            accumulator: 0.0,
            tick_count: 0,
            game_time: 0.0,
            accepting_joins: true,
        })
    }

    /// Construct a room gated by a per-address creation rate limiter;
    /// refuses with `RoomError::CreationRateLimited` if `addr` has
    /// exhausted its window (`ROOM_CREATE_RATE`, e.g. 5/min/IP).
    pub fn new_for_addr(
        seed: u64,
        config: LevelConfig,
        limiter: &mut RoomCreateLimiter,
        addr: &str,
    ) -> Result<Self, RoomError> {
        if !limiter.try_admit(addr) {
            info!(addr, "room creation refused: rate limit exceeded for address");
            return Err(RoomError::CreationRateLimited);
        }
        Self::new(seed, config)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn game_time(&self) -> f32 {
        self.game_time
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    // -- join / leave ------------------------------------------------------

    pub fn join(&mut self, session_id: SessionId, options: JoinOptions) -> Result<EntityHandle, RoomError> {
        if !self.accepting_joins {
            return Err(RoomError::ShuttingDown);
        }
        options.validate()?;

        let handle = self.world.allocate().map_err(|_| {
            info!(session_id, "join refused: entity pool exhausted");
            RoomError::PoolExhausted
        })?;
        let idx = self.world.index_of(handle).expect("just-allocated handle is valid");

        let spawn_radius = self.constants.map_radius * JOIN_SPAWN_FRACTION;
        let (x, y) = self.random_point_in_disc(spawn_radius);
        let radius = 20.0;

        *self.world.transform_mut(idx) = Transform {
            x,
            y,
            ..Default::default()
        };
        *self.world.physics_mut(idx) = Physics {
            mass: std::f32::consts::PI * radius * radius,
            radius,
            ..Default::default()
        };
        let match_percent = self.compute_match_percent(options.pigment);
        *self.world.stats_mut(idx) = Stats {
            hp: 100.0,
            max_hp: 100.0,
            match_percent,
            damage_mult: 1.0,
            ..Default::default()
        };
        *self.world.config_mut(idx) = Config {
            max_speed: self.constants.max_speed_base,
            speed_mult: 1.0,
            ..Default::default()
        };
        *self.world.input_mut(idx) = Input {
            target_x: x,
            target_y: y,
            ..Default::default()
        };
        *self.world.pigment_mut(idx) = Pigment {
            r: options.pigment.0,
            g: options.pigment.1,
            b: options.pigment.2,
            match_percent,
        };
        self.world.skill_mut(idx).shape_id = options.shape_id as f32;

        self.world.activate(idx);
        self.world.set_flag(idx, flags::PLAYER);
        self.dirty.mark_dirty(idx, jelly_ecs::components::dirty_mask::ALL);

        self.sessions
            .insert(session_id, Session::new(handle, self.constants.rate_limit_max_per_sec));

        Ok(handle)
    }

    pub fn leave(&mut self, session_id: SessionId) {
        if let Some(session) = self.sessions.remove(&session_id) {
            self.world.release(session.handle);
        }

        let owned: Vec<u16> = self
            .projectiles
            .iter()
            .filter(|(_, info)| info.session_id == session_id)
            .map(|(&idx, _)| idx)
            .collect();
        for idx in owned {
            self.projectiles.remove(&idx);
            if let Some(h) = self.world.current_handle(idx) {
                self.world.release(h);
            }
        }
    }

    fn compute_match_percent(&self, pigment: (f32, f32, f32)) -> f32 {
        let (tr, tg, tb) = self.target_pigment;
        let dist = ((pigment.0 - tr).powi(2) + (pigment.1 - tg).powi(2) + (pigment.2 - tb).powi(2)).sqrt();
        let max_dist = 3f32.sqrt();
        (1.0 - dist / max_dist).clamp(0.0, 1.0)
    }

    fn random_point_in_disc(&mut self, radius: f32) -> (f32, f32) {
        let angle = self.placement_rng.gen_range(0.0..std::f32::consts::TAU);
        let r = radius * self.placement_rng.gen_range(0.0..1.0f32).sqrt();
        (r * angle.cos(), r * angle.sin())
    }

    // -- input ingestion -----------------------------------------------------

    /// Validate and stage one incoming `input` message for `session_id`.
    /// Drops (rather than errors) on a malformed message or an exhausted
    /// rate bucket, per the error taxonomy: bad input never aborts a tick.
    pub fn submit_input(&mut self, session_id: SessionId, bytes: &[u8]) {
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return;
        };

        if !session.rate_bucket.try_consume() {
            debug!(session_id, "input dropped: rate limited");
            return;
        }

        match parse_and_validate(bytes, self.constants.max_message_size, self.constants.map_radius) {
            Ok(input) => session.stage_input(input),
            Err(e) => debug!(session_id, error = %e, "input dropped: validation failed"),
        }
    }

    // -- tick loop ------------------------------------------------------------

    /// Advance the simulation by `dt_ms` milliseconds of wall-clock time,
    /// clamped against spiral-of-death and clock stalls, and run as many
    /// whole fixed ticks as the (capped) accumulator allows.
    pub fn update(&mut self, dt_ms: f32, mut on_frame: impl FnMut(SessionId, &[u8])) {
        let dt_sec = (dt_ms / 1000.0).min(self.constants.max_accumulator);
        self.accumulator += dt_sec;

        while self.accumulator >= self.constants.fixed_dt {
            self.tick_once(&mut on_frame);
            self.accumulator -= self.constants.fixed_dt;
        }
    }

    fn tick_once(&mut self, on_frame: &mut impl FnMut(SessionId, &[u8])) {
        let fixed_dt = self.constants.fixed_dt;

        self.ingest_pending_inputs();

        self.movement.update_all(&mut self.world, fixed_dt);
        let quarantined = self.physics.update(&mut self.world, fixed_dt, &self.constants);
        for idx in quarantined {
            warn!(slot = idx, "NaN/Inf detected in physics, quarantining entity");
            self.world.deactivate(idx);
        }
        self.skill.update(&mut self.world, fixed_dt, &mut self.events);
        self.resolve_skill_effects();
        self.ring
            .update(&mut self.world, &self.constants, &self.thresholds, &mut self.events);
        self.run_spawner(fixed_dt);
        self.run_lifecycle(fixed_dt);

        self.tick_count += 1;
        self.game_time = self.tick_count as f32 * fixed_dt;

        self.broadcast(on_frame);
        self.dirty.tick();
    }

    fn ingest_pending_inputs(&mut self) {
        let world = &mut self.world;
        for session in self.sessions.values_mut() {
            let idx = if world.is_valid(session.handle) {
                session.handle.index()
            } else {
                let stale_index = session.handle.index();
                if let Some(fresh) = world.current_handle(stale_index) {
                    debug!("handle updated");
                    session.handle = fresh;
                }
                session.take_input();
                continue;
            };

            let Some(input) = session.take_input() else {
                continue;
            };

            let seq = input.seq % SEQ_WRAP;
            let target_x = input.target_x.clamp(-self.constants.map_radius, self.constants.map_radius);
            let target_y = input.target_y.clamp(-self.constants.map_radius, self.constants.map_radius);

            let on_cooldown = world.skill(idx).cooldown > 0.0;
            let mut actions = input.actions;
            if actions & jelly_ecs::components::ACTION_PRIMARY != 0 && on_cooldown {
                actions &= !jelly_ecs::components::ACTION_PRIMARY;
            }

            let wi = world.input_mut(idx);
            wi.target_x = target_x;
            wi.target_y = target_y;
            wi.set_actions(actions);

            session.last_processed_input = seq;
        }
    }

    /// Drain this tick's `SkillFired` events into auxiliary-entity spawns;
    /// every other event kind is pushed back for whatever later drains it.
    fn resolve_skill_effects(&mut self) {
        for ev in self.events.drain() {
            if ev.kind == EventKind::SkillFired {
                self.try_spawn_projectile(ev.entity);
            } else {
                self.events.push(ev);
            }
        }
    }

    /// Spawn one owner-tracked projectile aimed at the firing entity's
    /// current input target, subject to the per-session entity-pool DoS cap
    /// (`MAX_ENTITIES_PER_CLIENT`). A session past its cap, or firing with
    /// no session at all (e.g. a bot), is refused quietly bar a WARN log.
    fn try_spawn_projectile(&mut self, owner_idx: u16) {
        let Some(session_id) = self
            .sessions
            .iter()
            .find(|(_, s)| s.handle.index() == owner_idx)
            .map(|(&id, _)| id)
        else {
            return;
        };

        if self.sessions[&session_id].child_entity_count >= self.constants.max_entities_per_client {
            warn!(session_id, owner = owner_idx, "auxiliary spawn refused: per-client entity cap reached");
            return;
        }

        let Ok(handle) = self.world.allocate() else {
            warn!(session_id, owner = owner_idx, "auxiliary spawn refused: entity pool exhausted");
            return;
        };
        let idx = self.world.index_of(handle).expect("just-allocated handle is valid");

        let (ox, oy) = {
            let t = self.world.transform(owner_idx);
            (t.x, t.y)
        };
        let (dx, dy) = {
            let i = self.world.input(owner_idx);
            (i.target_x - ox, i.target_y - oy)
        };
        let len = (dx * dx + dy * dy).sqrt().max(1.0);

        *self.world.transform_mut(idx) = Transform {
            x: ox,
            y: oy,
            ..Default::default()
        };
        *self.world.physics_mut(idx) = Physics {
            vx: dx / len * PROJECTILE_SPEED,
            vy: dy / len * PROJECTILE_SPEED,
            radius: PROJECTILE_RADIUS,
            ..Default::default()
        };
        self.world.activate(idx);
        self.world.set_flag(idx, flags::PROJECTILE);
        self.dirty.mark_dirty(idx, jelly_ecs::components::dirty_mask::ALL);

        self.sessions.get_mut(&session_id).unwrap().child_entity_count += 1;
        self.projectiles.insert(
            idx,
            ProjectileOwner {
                session_id,
                ttl: PROJECTILE_TTL_SECS,
            },
        );
    }

    fn run_spawner(&mut self, dt: f32) {
        let wave_config = self.config.to_wave_config();
        let mut spawned_ids = Vec::new();
        {
            let world = &mut self.world;
            let dirty = &mut self.dirty;
            self.spawner.update(dt, &wave_config, &self.constants, |spawn| {
                let Ok(handle) = world.allocate() else {
                    warn!("auxiliary spawn refused: entity pool exhausted");
                    return;
                };
                let idx = world.index_of(handle).expect("just-allocated handle is valid");
                *world.transform_mut(idx) = Transform {
                    x: spawn.x,
                    y: spawn.y,
                    ..Default::default()
                };
                world.physics_mut(idx).radius = 10.0;
                if let SpawnKind::Pigment(primary) = spawn.kind {
                    let pigment = world.pigment_mut(idx);
                    match primary {
                        PigmentPrimary::Red => pigment.r = 1.0,
                        PigmentPrimary::Green => pigment.g = 1.0,
                        PigmentPrimary::Blue => pigment.b = 1.0,
                    }
                }
                world.activate(idx);
                world.set_flag(idx, flags::FOOD);
                dirty.mark_dirty(idx, jelly_ecs::components::dirty_mask::ALL);
                spawned_ids.push(idx);
            });
        }

        self.food_order.extend(spawned_ids);
        self.evict_excess_food();
    }

    /// Enforce the pickup population cap: oldest spawn released first, over
    /// the FIFO recorded in `food_order`. Stale entries (already consumed)
    /// are skipped rather than double-released.
    fn evict_excess_food(&mut self) {
        while self.food_order.len() as u32 > self.constants.max_food_population {
            let Some(idx) = self.food_order.pop_front() else {
                break;
            };
            if self.world.is_active(idx) && self.world.has_flag(idx, flags::FOOD) {
                if let Some(h) = self.world.current_handle(idx) {
                    self.world.release(h);
                }
            }
        }
    }

    /// Pickup collection, buff/shield expiry, and the death/respawn sweep.
    /// Not a named system in the tick order table because it has no single
    /// deterministic algorithm of its own; it is the bookkeeping glue
    /// between the named systems and entity lifetime.
    fn run_lifecycle(&mut self, dt: f32) {
        let players: Vec<u16> = self
            .world
            .active_iter()
            .filter(|&i| self.world.has_flag(i, flags::PLAYER) && !self.world.has_flag(i, flags::DEAD))
            .collect();
        let foods: Vec<u16> = self
            .world
            .active_iter()
            .filter(|&i| self.world.has_flag(i, flags::FOOD))
            .collect();

        for &player in &players {
            let (px, py) = {
                let t = self.world.transform(player);
                (t.x, t.y)
            };
            for &food in &foods {
                if !self.world.is_active(food) {
                    continue;
                }
                let (fx, fy) = {
                    let t = self.world.transform(food);
                    (t.x, t.y)
                };
                let dist_sq = (px - fx).powi(2) + (py - fy).powi(2);
                if dist_sq <= PICKUP_RADIUS * PICKUP_RADIUS {
                    self.consume_pickup(player, food);
                }
            }
        }

        for idx in self.world.active_iter().collect::<Vec<_>>() {
            let config = self.world.config_mut(idx);
            if config.buff_timer > 0.0 {
                config.buff_timer = (config.buff_timer - dt).max(0.0);
                if config.buff_timer == 0.0 {
                    config.speed_mult = 1.0;
                }
            }
            let stats = self.world.stats_mut(idx);
            if stats.shield_timer > 0.0 {
                stats.shield_timer = (stats.shield_timer - dt).max(0.0);
            }
        }

        self.sweep_deaths(dt);
        self.sweep_projectiles(dt);
    }

    /// Age out owner-tracked projectiles, releasing the entity and crediting
    /// the slot back to the owner's entity-pool cap.
    fn sweep_projectiles(&mut self, dt: f32) {
        let mut expired = Vec::new();
        for (&idx, info) in self.projectiles.iter_mut() {
            info.ttl -= dt;
            if info.ttl <= 0.0 || !self.world.is_active(idx) {
                expired.push(idx);
            }
        }

        for idx in expired {
            let Some(info) = self.projectiles.remove(&idx) else {
                continue;
            };
            if let Some(session) = self.sessions.get_mut(&info.session_id) {
                session.child_entity_count = session.child_entity_count.saturating_sub(1);
            }
            if let Some(h) = self.world.current_handle(idx) {
                self.world.release(h);
            }
        }
    }

    fn consume_pickup(&mut self, player: u16, food: u16) {
        let food_pigment = *self.world.pigment(food);
        {
            let pigment = self.world.pigment_mut(player);
            pigment.r = (pigment.r + food_pigment.r).min(1.0);
            pigment.g = (pigment.g + food_pigment.g).min(1.0);
            pigment.b = (pigment.b + food_pigment.b).min(1.0);
        }
        let blended = {
            let p = self.world.pigment(player);
            (p.r, p.g, p.b)
        };
        let match_percent = self.compute_match_percent(blended);
        self.world.stats_mut(player).match_percent = match_percent;
        self.world.stats_mut(player).score += 10.0;
        self.world.pigment_mut(player).match_percent = match_percent;

        if let Some(h) = self.world.current_handle(food) {
            self.world.release(h);
        }
        self.food_order.retain(|&id| id != food);
        self.dirty
            .mark_dirty(player, jelly_ecs::components::dirty_mask::STATS | jelly_ecs::components::dirty_mask::PIGMENT);
    }

    fn sweep_deaths(&mut self, dt: f32) {
        let dying: Vec<u16> = self
            .world
            .active_iter()
            .filter(|&i| {
                self.world.has_flag(i, flags::PLAYER)
                    && !self.world.has_flag(i, flags::DEAD)
                    && self.world.stats(i).hp <= 0.0
            })
            .collect();
        for idx in dying {
            self.world.set_flag(idx, flags::DEAD);
            self.respawn_timers.insert(idx, RESPAWN_DELAY_SECS);
            self.events.push(EngineEvent::new(EventKind::EntityDeath, idx));
        }

        let mut respawned = Vec::new();
        for (idx, remaining) in self.respawn_timers.iter_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                respawned.push(*idx);
            }
        }
        for idx in respawned {
            self.respawn_timers.remove(&idx);
            let spawn_radius = self.constants.map_radius * JOIN_SPAWN_FRACTION;
            let (x, y) = self.random_point_in_disc(spawn_radius);
            *self.world.transform_mut(idx) = Transform {
                x,
                y,
                ..Default::default()
            };
            *self.world.physics_mut(idx) = Physics {
                radius: self.world.physics(idx).radius,
                mass: self.world.physics(idx).mass,
                ..Default::default()
            };
            let max_hp = self.world.stats(idx).max_hp;
            self.world.stats_mut(idx).hp = max_hp;
            self.world.clear_flag(idx, flags::DEAD);
            self.dirty.mark_dirty(idx, jelly_ecs::components::dirty_mask::ALL);
        }
    }

    fn broadcast(&mut self, on_frame: &mut impl FnMut(SessionId, &[u8])) {
        let body = self.snapshot.encode_tick(&self.world, &self.dirty, self.game_time);
        if !self.snapshot.is_full_snapshot_due() {
            self.dirty.clear_all();
        }

        for (session_id, session) in self.sessions.iter() {
            let framed = frame_with_ack(session.last_processed_input, &body);
            on_frame(*session_id, &framed);
        }
        self.snapshot.release(body);
    }

    /// Gracefully shut the room down: stop accepting joins, run one final
    /// tick, send an `ENTITY_DESTROY` frame for every active entity to every
    /// connected session, then close all sessions.
    pub fn shutdown(&mut self, mut on_frame: impl FnMut(SessionId, &[u8])) {
        self.accepting_joins = false;
        self.tick_once(&mut on_frame);

        let active: Vec<u16> = self.world.active_iter().collect();
        let sessions: Vec<(SessionId, u32)> = self
            .sessions
            .iter()
            .map(|(&id, s)| (id, s.last_processed_input))
            .collect();
        for idx in active {
            let mut body = Vec::new();
            encode(&Packet::EntityDestroy { id: idx }, &mut body);
            for &(session_id, last_processed_input) in &sessions {
                let framed = frame_with_ack(last_processed_input, &body);
                on_frame(session_id, &framed);
            }
        }

        self.sessions.clear();
    }
}

/// Guards room creation per client address (`ROOM_CREATE_RATE`, e.g.
/// 5/min/IP). Kept outside `Room` since it governs creation, not a living
/// room's per-tick behaviour.
pub struct RoomCreateLimiter {
    buckets: HashMap<String, (u32, Instant)>,
    max_per_window: u32,
    window_secs: f32,
    trust_proxy: bool,
}

impl RoomCreateLimiter {
    pub fn new(max_per_window: u32, window_secs: f32, trust_proxy: bool) -> Self {
        Self {
            buckets: HashMap::new(),
            max_per_window,
            window_secs,
            trust_proxy,
        }
    }

    pub fn trust_proxy(&self) -> bool {
        self.trust_proxy
    }

    /// Returns `true` if a new room may be created for `addr` right now.
    pub fn try_admit(&mut self, addr: &str) -> bool {
        let now = Instant::now();
        let entry = self.buckets.entry(addr.to_string()).or_insert((0, now));
        if now.duration_since(entry.1).as_secs_f32() >= self.window_secs {
            *entry = (0, now);
        }
        if entry.0 >= self.max_per_window {
            return false;
        }
        entry.0 += 1;
        true
    }
}
