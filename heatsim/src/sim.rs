/// Rectangular heat source, half-open cell ranges. A zero-area oven turns
/// the source off entirely.
#[derive(Debug, Clone, Copy)]
pub struct Oven {
    pub x0: usize,
    pub x1: usize,
    pub y0: usize,
    pub y1: usize,
    pub temperature: f64,
}

impl Oven {
    fn contains(&self, x: usize, y: usize) -> bool {
        (self.x0..self.x1).contains(&x) && (self.y0..self.y1).contains(&y)
    }
}

#[derive(Debug, Clone)]
pub struct SimParams {
    pub width: usize,
    pub height: usize,
    /// Thermal diffusivity k in `du/dt = k * laplacian(u)`. Forward Euler
    /// is only stable while `k * dt <= 0.25` on a unit grid.
    pub diffusivity: f64,
    pub ambient: f64,
    pub oven: Oven,
    /// Sim time at which the oven stops holding its temperature.
    pub oven_stop: f64,
    /// Damping applied to the oven cells' temperature change after the
    /// oven stops, so the residual heat drains slowly.
    pub oven_decay: f64,
    pub dt: f64,
}

/// Finite-difference state for the heated-room model: a room at ambient
/// temperature with an oven held hot in one corner.
pub struct HeatGrid {
    params: SimParams,
    temps: Vec<f64>,
    delta: Vec<f64>,
    time: f64,
}

impl HeatGrid {
    pub fn new(params: SimParams) -> Self {
        let mut temps = vec![params.ambient; params.width * params.height];
        for y in params.oven.y0..params.oven.y1 {
            for x in params.oven.x0..params.oven.x1 {
                temps[y * params.width + x] = params.oven.temperature;
            }
        }
        let delta = vec![0.0; temps.len()];

        Self {
            params,
            temps,
            delta,
            time: 0.0,
        }
    }

    pub fn width(&self) -> usize {
        self.params.width
    }

    pub fn height(&self) -> usize {
        self.params.height
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.params.width + x
    }

    pub fn temp(&self, x: usize, y: usize) -> f64 {
        self.temps[self.idx(x, y)]
    }

    pub fn set_temp(&mut self, x: usize, y: usize, value: f64) {
        let i = self.idx(x, y);
        self.temps[i] = value;
    }

    /// Advance one forward-Euler step of the heat equation.
    pub fn step(&mut self) {
        let w = self.params.width;
        let h = self.params.height;
        let scale = self.params.diffusivity * self.params.dt;

        // 5-point Laplacian on interior cells.
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let i = self.idx(x, y);
                let laplacian = self.temps[i - w] + self.temps[i + w] + self.temps[i - 1]
                    + self.temps[i + 1]
                    - 4.0 * self.temps[i];
                self.delta[i] = scale * laplacian;
            }
        }

        // Ghost points: edge cells change as much as their nearest inner
        // cells. Rows first, then columns so the corners pick up a value.
        for x in 1..w - 1 {
            self.delta[x] = self.delta[w + x];
            self.delta[(h - 1) * w + x] = self.delta[(h - 2) * w + x];
        }
        for y in 0..h {
            self.delta[y * w] = self.delta[y * w + 1];
            self.delta[y * w + (w - 1)] = self.delta[y * w + (w - 2)];
        }

        // The oven holds its temperature until it is switched off, then its
        // change is damped instead of clamped.
        let oven = self.params.oven;
        for y in oven.y0..oven.y1 {
            for x in oven.x0..oven.x1 {
                let i = self.idx(x, y);
                if self.time < self.params.oven_stop {
                    self.delta[i] = 0.0;
                } else {
                    self.delta[i] *= self.params.oven_decay;
                }
            }
        }

        for (temp, delta) in self.temps.iter_mut().zip(&self.delta) {
            *temp += delta;
        }
        self.time += self.params.dt;
    }

    pub fn min_max(&self) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &t in &self.temps {
            min = min.min(t);
            max = max.max(t);
        }
        (min, max)
    }
}
