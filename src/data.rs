//! The body/state data model (§3) plus the initial-condition constructors
//! used by the end-to-end scenarios of §8.
//!
//! `NBodyData` owns the mass vector and the initial 6N state vector in the
//! `[rx|ry|rz|vx|vy|vz]` layout the rest of the crate assumes. It is the
//! thing an [`Engine`](crate::engine::Engine) is `init`-ed with; after
//! `init` the engine owns its own copy of the state inside its buffer
//! arena and `NBodyData` is no longer read.

use ndarray::Array1;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

use crate::types::{Coord, DEFAULT_G, DEFAULT_SOFTENING, Vec3};

/// Opaque per-body metadata. Never read by engine or solver code; carried
/// only for the boundary consumers the spec places out of scope (the
/// viewer, the recorder).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyMeta {
    pub color: [f32; 3],
    pub radius: f32,
}

/// A single body's initial condition, used only while assembling
/// [`NBodyData`] — the engine never sees a `Vec<Body>`, only the flattened
/// state vector.
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub mass: Coord,
    pub position: Vec3,
    pub velocity: Vec3,
    pub meta: BodyMeta,
}

/// Full initial-value problem: N bodies' masses and state vector, plus the
/// two physical constants (`g`, `softening`) every force kernel needs.
#[derive(Debug, Clone)]
pub struct NBodyData {
    count: usize,
    mass: Array1<Coord>,
    y0: Vec<Coord>,
    meta: Vec<BodyMeta>,
    g: Coord,
    softening: Coord,
}

impl NBodyData {
    /// Assemble from a list of bodies. Panics only on the programmer error
    /// of an empty or non-positive-mass input — this is a construction-time
    /// invariant check, not a runtime configuration error (§7 only
    /// classifies *engine primitive* and *factory* failures; building a
    /// scenario's physical setup is the caller's own code, same as the
    /// original's `nbody_data::make_universe`).
    pub fn from_bodies(bodies: &[Body], g: Coord, softening: Coord) -> Self {
        assert!(!bodies.is_empty(), "NBodyData requires at least one body");
        let count = bodies.len();
        let mut mass = Array1::<Coord>::zeros(count);
        let mut y0 = vec![0.0; 6 * count];
        let mut meta = Vec::with_capacity(count);

        for (i, b) in bodies.iter().enumerate() {
            assert!(b.mass > 0.0, "body {i} has non-positive mass");
            mass[i] = b.mass;
            y0[i] = b.position.x;
            y0[count + i] = b.position.y;
            y0[2 * count + i] = b.position.z;
            y0[3 * count + i] = b.velocity.x;
            y0[4 * count + i] = b.velocity.y;
            y0[5 * count + i] = b.velocity.z;
            meta.push(b.meta);
        }

        Self { count, mass, y0, meta, g, softening }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn problem_size(&self) -> usize {
        6 * self.count
    }

    #[inline]
    pub fn mass(&self) -> &Array1<Coord> {
        &self.mass
    }

    #[inline]
    pub fn y0(&self) -> &[Coord] {
        &self.y0
    }

    #[inline]
    pub fn g(&self) -> Coord {
        self.g
    }

    #[inline]
    pub fn softening(&self) -> Coord {
        self.softening
    }

    #[inline]
    pub fn meta(&self) -> &[BodyMeta] {
        &self.meta
    }

    /// Total energy `T + U` of a state vector in the `[rx|ry|rz|vx|vy|vz]`
    /// layout, used by the driver's diagnostics (§4.6) and by the energy
    /// conservation test (§8 property 9). Never mutates its input.
    pub fn total_energy(&self, y: &[Coord]) -> Coord {
        let n = self.count;
        let mut kinetic = 0.0;
        for i in 0..n {
            let vx = y[3 * n + i];
            let vy = y[4 * n + i];
            let vz = y[5 * n + i];
            kinetic += 0.5 * self.mass[i] * (vx * vx + vy * vy + vz * vz);
        }

        let mut potential = 0.0;
        for i in 0..n {
            let ri = Vec3::new(y[i], y[n + i], y[2 * n + i]);
            for j in (i + 1)..n {
                let rj = Vec3::new(y[j], y[n + j], y[2 * n + j]);
                let d = (rj - ri).norm_sqr() + self.softening * self.softening;
                potential -= self.g * self.mass[i] * self.mass[j] / d.sqrt();
            }
        }

        kinetic + potential
    }

    /// Total linear momentum, used by the cold-collapse scenario's
    /// momentum-invariance check (§8).
    pub fn total_momentum(&self, y: &[Coord]) -> Vec3 {
        let n = self.count;
        let mut p = Vec3::ZERO;
        for i in 0..n {
            let v = Vec3::new(y[3 * n + i], y[4 * n + i], y[5 * n + i]);
            p += v * self.mass[i];
        }
        p
    }
}

/// Uniform-in-a-cube "universe" of `count` equal-mass bodies at rest,
/// mirroring the original's `nbody_data::make_universe(box_size, box_size,
/// box_size)` smoke-test fixture (used by the engine-contract tests of
/// §8 properties 1-8, which only need *some* valid N-body configuration).
pub fn make_universe(count: usize, box_size: Coord, seed: u64) -> NBodyData {
    let mut rng = SmallRng::seed_from_u64(seed);
    let bodies: Vec<Body> = (0..count)
        .map(|_| Body {
            mass: 1.0,
            position: Vec3::new(
                rng.random_range(-box_size..box_size),
                rng.random_range(-box_size..box_size),
                rng.random_range(-box_size..box_size),
            ),
            velocity: Vec3::ZERO,
            meta: BodyMeta::default(),
        })
        .collect();
    NBodyData::from_bodies(&bodies, DEFAULT_G, DEFAULT_SOFTENING)
}

/// Two-body Kepler fixture (§8): `m1 = m2 = 1`, `G = 1`,
/// `r = (±0.5, 0, 0)`, `v = (0, ±0.5, 0)`.
pub fn two_body_kepler() -> NBodyData {
    let bodies = [
        Body {
            mass: 1.0,
            position: Vec3::new(0.5, 0.0, 0.0),
            velocity: Vec3::new(0.0, 0.5, 0.0),
            meta: BodyMeta::default(),
        },
        Body {
            mass: 1.0,
            position: Vec3::new(-0.5, 0.0, 0.0),
            velocity: Vec3::new(0.0, -0.5, 0.0),
            meta: BodyMeta::default(),
        },
    ];
    NBodyData::from_bodies(&bodies, 1.0, 0.0)
}

/// Semi-major axis of the two-body Kepler fixture's relative orbit, via
/// vis-viva (`1/a = 2/r - v_rel^2/mu`) on this fixture's actual separation
/// `r = 1.0` and relative speed `v_rel = 1.0`, and the analytic period
/// `T = 2π·a^{3/2}/√(m1+m2)` used to check the end-to-end scenario.
pub fn two_body_kepler_period() -> Coord {
    let r: Coord = 1.0;
    let v_rel: Coord = 1.0;
    let mu: Coord = 2.0;
    let a: Coord = 1.0 / (2.0 / r - v_rel * v_rel / mu);
    2.0 * std::f64::consts::PI * a.powf(1.5) / mu.sqrt()
}

/// Three-body figure-eight fixture (Chenciner-Montgomery), §8. Unit masses,
/// `G = 1`; initial conditions are the well-known numerically-refined
/// values for the periodic choreography orbit.
pub fn three_body_figure_eight() -> NBodyData {
    let x1 = 0.97000436;
    let y1 = -0.24308753;
    let vx3 = -0.93240737;
    let vy3 = -0.86473146;

    let bodies = [
        Body {
            mass: 1.0,
            position: Vec3::new(x1, y1, 0.0),
            velocity: Vec3::new(-vx3 / 2.0, -vy3 / 2.0, 0.0),
            meta: BodyMeta::default(),
        },
        Body {
            mass: 1.0,
            position: Vec3::new(-x1, -y1, 0.0),
            velocity: Vec3::new(-vx3 / 2.0, -vy3 / 2.0, 0.0),
            meta: BodyMeta::default(),
        },
        Body {
            mass: 1.0,
            position: Vec3::new(0.0, 0.0, 0.0),
            velocity: Vec3::new(vx3, vy3, 0.0),
            meta: BodyMeta::default(),
        },
    ];
    NBodyData::from_bodies(&bodies, 1.0, 0.0)
}

/// The figure-eight orbit's period, used to check it closes on itself after
/// one period (§8).
pub const FIGURE_EIGHT_PERIOD: Coord = 6.3259;

/// Equal-mass cold collapse, `N = 128` (§8): bodies at rest, uniformly
/// distributed in a sphere, collapsing under mutual gravity. Used to check
/// momentum invariance, which holds regardless of the (arbitrary) radius
/// or seed chosen.
pub fn equal_mass_cold_collapse(count: usize, radius: Coord, seed: u64) -> NBodyData {
    let mut rng = SmallRng::seed_from_u64(seed);
    let bodies: Vec<Body> = (0..count)
        .map(|_| Body {
            mass: 1.0 / count as Coord,
            position: sample_in_sphere(&mut rng, radius),
            velocity: Vec3::ZERO,
            meta: BodyMeta::default(),
        })
        .collect();
    NBodyData::from_bodies(&bodies, 1.0, 1e-3)
}

/// A Plummer sphere of `count` equal-mass bodies, used by the Barnes-Hut
/// accuracy sweep (§8): a standard test distribution for tree-code
/// accuracy because it has a smooth, analytically known density profile.
pub fn plummer_sphere(count: usize, scale_radius: Coord, seed: u64) -> NBodyData {
    let mut rng = SmallRng::seed_from_u64(seed);
    let bodies: Vec<Body> = (0..count)
        .map(|_| {
            // Inverse-CDF sampling of the Plummer radial density profile.
            let u: Coord = rng.random_range(1e-6..1.0);
            let r = scale_radius / (u.powf(-2.0 / 3.0) - 1.0).sqrt();
            let position = sample_on_sphere(&mut rng) * r;

            // Velocities drawn from a Gaussian with a scale tied to the
            // local escape speed; exact equilibrium sampling is not
            // required for an accuracy sweep (the comparison is against
            // the Simple engine's direct sum at the same instant).
            let sigma = (0.5 / (1.0 + r * r / (scale_radius * scale_radius)).sqrt()).sqrt();
            let vx: Coord = StandardNormal.sample(&mut rng);
            let vy: Coord = StandardNormal.sample(&mut rng);
            let vz: Coord = StandardNormal.sample(&mut rng);

            Body {
                mass: 1.0 / count as Coord,
                position,
                velocity: Vec3::new(vx, vy, vz) * sigma,
                meta: BodyMeta::default(),
            }
        })
        .collect();
    NBodyData::from_bodies(&bodies, 1.0, 1e-3)
}

fn sample_on_sphere(rng: &mut SmallRng) -> Vec3 {
    let z: Coord = rng.random_range(-1.0..1.0);
    let phi: Coord = rng.random_range(0.0..std::f64::consts::TAU);
    let r_xy = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r_xy * phi.cos(), r_xy * phi.sin(), z)
}

fn sample_in_sphere(rng: &mut SmallRng, radius: Coord) -> Vec3 {
    loop {
        let p = Vec3::new(
            rng.random_range(-radius..radius),
            rng.random_range(-radius..radius),
            rng.random_range(-radius..radius),
        );
        if p.norm_sqr() <= radius * radius {
            return p;
        }
    }
}
