use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::error::{LorenzError, Result};
use crate::plane::MAX_SIZE;

/// A single point in Lorenz phase space. Every integration step produces a fresh `State`; nothing
/// is ever updated in place.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
pub struct State {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

impl State {
    pub fn new(x: f64, y: f64, z: f64) -> State {
        State { x, y, z }
    }
}

/// The three physical constants of the Lorenz system.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
pub struct Params {
    pub rho: f64,
    pub sigma: f64,
    pub beta: f64,
}

impl Params {
    /// The time derivative at `s`, i.e. the right hand side of the Lorenz equations.
    pub fn derivative(&self, s: State) -> State {
        State {
            x: self.sigma * (s.y - s.x),
            y: s.x * (self.rho - s.z) - s.y,
            z: s.x * s.y - self.beta * s.z,
        }
    }
}

/// Advance `state` by one explicit Euler step of size `1 / precision`.
///
/// The derivative is divided by `precision` rather than multiplied by a step size so that the
/// arithmetic is exactly `x + dx / precision` on every axis.
pub fn next_state(params: &Params, precision: f64, state: State) -> State {
    let d = params.derivative(state);
    State {
        x: state.x + d.x / precision,
        y: state.y + d.y / precision,
        z: state.z + d.z / precision,
    }
}

/// Integrate `iterations` Euler steps starting from `initial`. The returned trajectory always holds
/// `iterations + 1` states, the first of which is `initial` itself.
///
/// Divergence is not detected: a `precision` that is too coarse just fills the tail of the
/// trajectory with huge or NaN coordinates, which the normalizer will later refuse.
pub fn integrate(params: &Params, initial: State, precision: f64, iterations: usize) -> Vec<State> {
    let mut trajectory = Vec::with_capacity(iterations + 1);
    trajectory.push(initial);
    let mut state = initial;
    for _ in 0..iterations {
        state = next_state(params, precision, state);
        trajectory.push(state);
    }
    trajectory
}

/// Everything a render needs, fixed for the lifetime of the run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Conf {
    pub output: String,
    /// Length in pixels of the longer side of the output image.
    pub size: f64,
    pub rho: f64,
    pub sigma: f64,
    pub beta: f64,
    pub x_init: f64,
    pub y_init: f64,
    pub z_init: f64,
    /// Each Euler step advances time by `1 / precision`.
    pub precision: f64,
    pub iterations: usize,
    /// Brightness added to a pixel every time the trajectory lands on it.
    pub step: u8,
    pub thread_count: usize,
}

impl Default for Conf {
    fn default() -> Conf {
        Conf {
            output: "lorenz.png".to_string(),
            size: 800.0,
            rho: 28.0,
            sigma: 10.0,
            // 8/3 in integer arithmetic. The classic attractor uses 8.0 / 3.0, but the images this
            // tool has always produced were rendered with 2, so that stays the default.
            beta: 2.0,
            x_init: 0.0,
            y_init: -4.0,
            z_init: 23.0,
            precision: 1000.0,
            iterations: 2_000_000,
            step: 8,
            thread_count: 1,
        }
    }
}

impl fmt::Display for Conf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Conf{{
    output: {},
    size: {},
    rho: {},
    sigma: {},
    beta: {},
    initial: {},
    precision: {},
    iterations: {},
    step: {},
    thread_count: {}
}}",
            self.output,
            self.size,
            self.rho,
            self.sigma,
            self.beta,
            self.initial_state(),
            self.precision,
            self.iterations,
            self.step,
            self.thread_count
        )
    }
}

impl Conf {
    /// Read a JSON configuration. Fields missing from the file keep their default values.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Conf> {
        let f = File::open(path)?;
        let conf: Conf = serde_json::from_reader(BufReader::new(f))?;
        Ok(conf)
    }

    pub fn params(&self) -> Params {
        Params {
            rho: self.rho,
            sigma: self.sigma,
            beta: self.beta,
        }
    }

    pub fn initial_state(&self) -> State {
        State::new(self.x_init, self.y_init, self.z_init)
    }

    /// Catch settings that can never produce an image. Physical parameters are deliberately left
    /// alone; odd values there just give odd pictures.
    pub fn validate(&self) -> Result<()> {
        if !(self.size.is_finite() && self.size > 0.0 && self.size <= MAX_SIZE) {
            return Err(LorenzError::InvalidSize(self.size));
        }
        if self.thread_count == 0 {
            return Err(LorenzError::InvalidConf(
                "thread_count must be at least 1".to_string(),
            ));
        }
        if self.step == 0 {
            return Err(LorenzError::InvalidConf(
                "step of 0 would leave the image black".to_string(),
            ));
        }
        if self.output.is_empty() {
            return Err(LorenzError::InvalidConf("output path is empty".to_string()));
        }
        Ok(())
    }
}
