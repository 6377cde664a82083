// game.rs — minimal simulation driven by the fixed-timestep loop.
//
// The simulation exists to exercise the loop: a world-time counter and one
// entity orbiting the origin. Each tick snapshots the previous state, so
// rendering can blend between the last two ticks with the loop's alpha.

/// Radians the orbiter advances per simulation tick.
const ORBIT_STEP: f32 = std::f32::consts::TAU / 120.0;

const ORBIT_RADIUS: f32 = 4.0;

/// Interpolatable per-entity state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityState {
    pub position: [f32; 3],
    pub yaw: f32,
}

impl EntityState {
    fn at_angle(angle: f32) -> Self {
        Self {
            position: [
                ORBIT_RADIUS * angle.cos(),
                0.0,
                ORBIT_RADIUS * angle.sin(),
            ],
            yaw: wrap_angle(angle + std::f32::consts::FRAC_PI_2),
        }
    }
}

pub struct Simulation {
    tick: u64,
    angle: f32,
    prev: EntityState,
    curr: EntityState,
}

impl Simulation {
    pub fn new() -> Self {
        let initial = EntityState::at_angle(0.0);
        Self {
            tick: 0,
            angle: 0.0,
            prev: initial,
            curr: initial,
        }
    }

    /// Advance the world by exactly one fixed tick.
    pub fn tick(&mut self) {
        self.prev = self.curr;
        self.angle = wrap_angle(self.angle + ORBIT_STEP);
        self.curr = EntityState::at_angle(self.angle);
        self.tick += 1;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Blend previous and current state; `alpha` 0 is the previous tick,
    /// approaching 1 is the current one.
    pub fn snapshot(&self, alpha: f32) -> EntityState {
        if alpha <= 0.0 {
            return self.prev;
        }
        if alpha >= 1.0 {
            return self.curr;
        }
        EntityState {
            position: [
                lerp(self.prev.position[0], self.curr.position[0], alpha),
                lerp(self.prev.position[1], self.curr.position[1], alpha),
                lerp(self.prev.position[2], self.curr.position[2], alpha),
            ],
            yaw: lerp_angle(self.prev.yaw, self.curr.yaw, alpha),
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Angle interpolation along the shortest arc.
pub fn lerp_angle(a: f32, b: f32, t: f32) -> f32 {
    let mut delta = b - a;
    if delta > std::f32::consts::PI {
        delta -= std::f32::consts::TAU;
    } else if delta < -std::f32::consts::PI {
        delta += std::f32::consts::TAU;
    }
    wrap_angle(a + delta * t)
}

/// Wrap into (-PI, PI].
fn wrap_angle(mut angle: f32) -> f32 {
    while angle > std::f32::consts::PI {
        angle -= std::f32::consts::TAU;
    }
    while angle <= -std::f32::consts::PI {
        angle += std::f32::consts::TAU;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_advance_state() {
        let mut sim = Simulation::new();
        let before = sim.snapshot(1.0);
        sim.tick();
        assert_eq!(sim.tick_count(), 1);
        assert_ne!(sim.snapshot(1.0), before);
    }

    #[test]
    fn snapshot_endpoints() {
        let mut sim = Simulation::new();
        sim.tick();
        sim.tick();

        let prev = sim.prev;
        let curr = sim.curr;
        assert_eq!(sim.snapshot(0.0), prev);
        assert_eq!(sim.snapshot(1.0), curr);
    }

    #[test]
    fn snapshot_midpoint_positions() {
        let mut sim = Simulation::new();
        sim.tick();

        let mid = sim.snapshot(0.5);
        for i in 0..3 {
            let expected = (sim.prev.position[i] + sim.curr.position[i]) / 2.0;
            assert!((mid.position[i] - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn snapshot_clamps_alpha() {
        let mut sim = Simulation::new();
        sim.tick();
        assert_eq!(sim.snapshot(-1.0), sim.snapshot(0.0));
        assert_eq!(sim.snapshot(2.0), sim.snapshot(1.0));
    }

    #[test]
    fn angle_lerp_takes_shortest_arc() {
        let pi = std::f32::consts::PI;
        // From just below +PI to just above -PI is a short hop across the seam
        let a = pi - 0.1;
        let b = -pi + 0.1;
        let mid = lerp_angle(a, b, 0.5);
        assert!((mid.abs() - pi).abs() < 1e-4);

        // A plain lerp would sweep through zero instead
        assert!(mid.abs() > 1.0);
    }

    #[test]
    fn orbit_stays_on_radius() {
        let mut sim = Simulation::new();
        for _ in 0..50 {
            sim.tick();
        }
        let s = sim.snapshot(0.37);
        let r = (s.position[0] * s.position[0] + s.position[2] * s.position[2]).sqrt();
        // Chord interpolation cuts slightly inside the circle
        assert!(r > ORBIT_RADIUS * 0.99 && r <= ORBIT_RADIUS + 1e-4);
    }
}
