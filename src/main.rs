/*
 * Boid Flocking Viewer
 *
 * A thin nannou front end over the flocking kernel. Each frame it advances the
 * simulation one tick, draws every agent as a dot scaled to fit the window, and
 * shows tick diagnostics in an egui panel.
 *
 * Usage: flockgrid-viewer [dense|small] [seed]
 * Set RUST_LOG (e.g. RUST_LOG=flockgrid=debug) to see kernel logs.
 */

use flockgrid::{Simulation, SimulationParams};
use nannou::prelude::*;
use nannou_egui::{self, egui, Egui};
use tracing::error;
use tracing_subscriber::EnvFilter;

const BOID_SIZE: f32 = 2.5;

struct Model {
    simulation: Simulation,
    egui: Egui,
    paused: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    nannou::app(model).update(update).run();
}

fn params_from_args() -> SimulationParams {
    let mut args = std::env::args().skip(1);
    let params = match args.next().as_deref() {
        Some("small") => SimulationParams::small(),
        _ => SimulationParams::dense(),
    };
    match args.next().and_then(|seed| seed.parse().ok()) {
        Some(seed) => params.with_seed(seed),
        None => params,
    }
}

fn model(app: &App) -> Model {
    let window_id = app
        .new_window()
        .title("Boid Flocking Simulation")
        .size(1000, 1000)
        .view(view)
        .raw_event(raw_window_event)
        .build()
        .unwrap();
    let window = app.window(window_id).unwrap();
    let egui = Egui::from_window(&window);

    let simulation = match Simulation::new(params_from_args()) {
        Ok(simulation) => simulation,
        Err(err) => {
            error!(%err, "cannot start simulation");
            std::process::exit(1);
        }
    };

    Model {
        simulation,
        egui,
        paused: false,
    }
}

fn update(app: &App, model: &mut Model, update: Update) {
    if !model.paused {
        model.simulation.step(update.since_last.as_secs_f32());
    }

    let diagnostics = model.simulation.diagnostics();
    let last = diagnostics.last_tick;
    let metrics = model.simulation.flock_metrics();
    let agents = model.simulation.boids().len();
    let fps = app.fps();

    model.egui.set_elapsed_time(update.since_start);
    let ctx = model.egui.begin_frame();
    let paused = &mut model.paused;
    egui::Window::new("Diagnostics")
        .default_pos([10.0, 10.0])
        .show(&ctx, |ui| {
            ui.label(format!("FPS: {:.1}", fps));
            ui.label(format!("Agents: {}", agents));
            ui.label(format!("Tick: {}", diagnostics.ticks));
            ui.separator();
            ui.label(format!("Rebuild: {:.2} ms", last.rebuild_time.as_secs_f64() * 1000.0));
            ui.label(format!("Forces: {:.2} ms", last.force_time.as_secs_f64() * 1000.0));
            ui.label(format!("Integrate: {:.2} ms", last.integrate_time.as_secs_f64() * 1000.0));
            ui.label(format!(
                "Mean tick: {:.2} ms",
                diagnostics.mean_step_time().as_secs_f64() * 1000.0
            ));
            ui.label(format!("Chunk size: {}", last.chunk_size));
            ui.separator();
            ui.label(format!("Dropped this tick: {}", last.rebuild.dropped));
            ui.label(format!("Dropped total: {}", diagnostics.total_dropped));
            ui.label(format!("Peak cell occupancy: {}", diagnostics.peak_cell_occupancy));
            ui.separator();
            ui.label(format!("Order parameter: {:.3}", metrics.order_parameter));
            ui.label(format!("Mean speed: {:.2}", metrics.mean_speed));
            ui.checkbox(paused, "Pause Simulation");
        });
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    draw.background().color(BLACK);

    let window_rect = app.window_rect();
    let params = model.simulation.params();
    let scale = f32::min(
        window_rect.w() / params.world_width,
        window_rect.h() / params.world_height,
    );
    let half_world = vec2(params.world_width, params.world_height) / 2.0;

    // World boundary
    draw.rect()
        .x_y(0.0, 0.0)
        .w_h(params.world_width * scale, params.world_height * scale)
        .no_fill()
        .stroke_weight(1.0)
        .stroke(rgba(0.3, 0.3, 0.3, 1.0));

    for agent in model.simulation.agents_view() {
        let screen = (vec2(agent.position.x, agent.position.y) - half_world) * scale;
        draw.ellipse()
            .x_y(screen.x, screen.y)
            .radius(BOID_SIZE)
            .color(rgb(220u8, 220, 220));
    }

    draw.to_frame(app, &frame).unwrap();
    model.egui.draw_to_frame(&frame).unwrap();
}

// Handle raw window events for egui
fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}
