mod sim;

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;

use sim::{HeatGrid, Oven, SimParams};

/// Standalone demo: heat from an oven spreading through a room of still
/// air, rendered as an animated terminal heatmap. Shares nothing with the
/// price-sync pipeline.
#[derive(Parser)]
#[command(name = "heatsim")]
#[command(about = "Animated 2D heat-diffusion demo")]
struct Args {
    /// Room width in cells.
    #[arg(long, default_value_t = 100)]
    width: usize,

    /// Room height in cells.
    #[arg(long, default_value_t = 100)]
    height: usize,

    /// Thermal diffusivity.
    #[arg(long, default_value_t = 0.025)]
    diffusivity: f64,

    /// Room temperature at t = 0.
    #[arg(long, default_value_t = 10.0)]
    ambient: f64,

    /// Oven temperature.
    #[arg(long, default_value_t = 80.0)]
    oven_temp: f64,

    /// Total simulated time. The oven switches off a third of the way in.
    #[arg(long, default_value_t = 100_000.0)]
    duration: f64,

    /// Integration step.
    #[arg(long, default_value_t = 5.0)]
    dt: f64,

    /// Simulation steps per rendered frame.
    #[arg(long, default_value_t = 25)]
    frame_every: usize,

    /// Delay between frames in milliseconds.
    #[arg(long, default_value_t = 30)]
    frame_ms: u64,
}

// Cold-to-hot ramp through the xterm-256 color cube.
const PALETTE: &[u8] = &[
    17, 18, 19, 20, 21, 26, 27, 32, 33, 38, 39, 44, 45, 50, 49, 48, 47, 46, 82, 118, 154, 190,
    226, 220, 214, 208, 202, 196,
];

fn color_index(temp: f64, lo: f64, hi: f64) -> u8 {
    let span = (hi - lo).max(f64::EPSILON);
    let normalized = ((temp - lo) / span).clamp(0.0, 1.0);
    let slot = (normalized * (PALETTE.len() - 1) as f64).round() as usize;
    PALETTE[slot]
}

/// Draw the grid with half-block characters, two grid rows per terminal
/// line, and the sim time underneath.
fn render(grid: &HeatGrid, lo: f64, hi: f64, out: &mut impl Write) -> io::Result<()> {
    let mut frame = String::from("\x1b[H");
    for y in (0..grid.height()).step_by(2) {
        for x in 0..grid.width() {
            let top = color_index(grid.temp(x, y), lo, hi);
            let bottom_y = (y + 1).min(grid.height() - 1);
            let bottom = color_index(grid.temp(x, bottom_y), lo, hi);
            frame.push_str(&format!("\x1b[38;5;{top}m\x1b[48;5;{bottom}m\u{2580}"));
        }
        frame.push_str("\x1b[0m\n");
    }
    frame.push_str(&format!("t: {:>10.1}\n", grid.time()));

    out.write_all(frame.as_bytes())?;
    out.flush()
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.width < 4 || args.height < 4 {
        bail!("room must be at least 4x4 cells");
    }
    if args.diffusivity * args.dt > 0.25 {
        bail!(
            "diffusivity * dt = {} is unstable, keep it at or below 0.25",
            args.diffusivity * args.dt
        );
    }

    // Oven in the upper-left quadrant, scaled with the room.
    let oven = Oven {
        x0: args.width / 5,
        x1: 2 * args.width / 5,
        y0: args.height / 10,
        y1: args.height / 5,
        temperature: args.oven_temp,
    };

    let mut grid = HeatGrid::new(SimParams {
        width: args.width,
        height: args.height,
        diffusivity: args.diffusivity,
        ambient: args.ambient,
        oven,
        oven_stop: args.duration / 3.0,
        oven_decay: 0.05,
        dt: args.dt,
    });

    // Fix the color scale to the initial extremes so the ramp does not
    // shift as the room evens out.
    let (lo, hi) = grid.min_max();

    let total_steps = (args.duration / args.dt) as usize;
    let mut stdout = io::stdout();

    // Clear screen and hide the cursor for the animation.
    stdout.write_all(b"\x1b[2J\x1b[?25l")?;
    let result = run(&mut grid, total_steps, &args, lo, hi, &mut stdout);
    stdout.write_all(b"\x1b[?25h")?;

    result
}

fn run(
    grid: &mut HeatGrid,
    total_steps: usize,
    args: &Args,
    lo: f64,
    hi: f64,
    out: &mut impl Write,
) -> Result<()> {
    for step in 0..total_steps {
        grid.step();
        if step % args.frame_every == 0 {
            render(grid, lo, hi, out)?;
            thread::sleep(Duration::from_millis(args.frame_ms));
        }
    }
    render(grid, lo, hi, out)?;

    Ok(())
}
