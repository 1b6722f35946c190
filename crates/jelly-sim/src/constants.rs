//! Tunable engine constants.
//!
//! Grouped into one `Copy` struct so a `Room` can log the effective values
//! once at creation and so systems take it by value without touching a
//! global.

/// The three concentric ring radii gating match-percent progression.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RingRadii {
    pub r1: f32,
    pub r2: f32,
    pub r3: f32,
}

impl Default for RingRadii {
    fn default() -> Self {
        Self {
            r1: 1200.0,
            r2: 700.0,
            r3: 300.0,
        }
    }
}

/// Fixed, room-wide simulation constants.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimConstants {
    /// Ticks per second. Physics friction exponentiation and the ring
    /// membrane spring both assume this.
    pub tick_hz: f32,
    /// Seconds per fixed tick (`1 / tick_hz`).
    pub fixed_dt: f32,
    /// Maximum accumulated seconds per `Room::update` call, protecting
    /// against spiral-of-death and clock stalls.
    pub max_accumulator: f32,

    /// Physics-only map boundary, always >= `map_radius` so clients never
    /// observe pop-in at the visible edge.
    pub map_radius_phy: f32,
    /// Visible playfield radius.
    pub map_radius: f32,
    pub center_radius: f32,
    pub ring_radii: RingRadii,

    pub max_speed_base: f32,
    pub speed_validation_tolerance: f32,
    /// Per-second friction multiplier base; varies slightly between
    /// reference builds, so it's treated as configuration rather than a
    /// hardcoded literal.
    pub friction_base: f32,

    pub snapshot_interval_ticks: u32,
    pub rate_limit_max_per_sec: u32,
    pub max_entities_per_client: u32,
    /// Pickup population cap; once active food exceeds this, the oldest
    /// spawn is released to make room for the newest (FIFO over spawn order).
    pub max_food_population: u32,
    pub max_message_size: usize,
    pub room_create_rate_per_min: u32,
    pub trust_proxy: bool,
}

impl Default for SimConstants {
    fn default() -> Self {
        let tick_hz = 60.0;
        Self {
            tick_hz,
            fixed_dt: 1.0 / tick_hz,
            max_accumulator: 0.25,
            map_radius_phy: 1620.0,
            map_radius: 1500.0,
            center_radius: 60.0,
            ring_radii: RingRadii::default(),
            max_speed_base: 150.0,
            speed_validation_tolerance: 1.15,
            friction_base: 0.92,
            snapshot_interval_ticks: 60,
            rate_limit_max_per_sec: 60,
            max_entities_per_client: 5,
            max_food_population: 200,
            max_message_size: 256,
            room_create_rate_per_min: 5,
            trust_proxy: false,
        }
    }
}
