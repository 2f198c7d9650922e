//! craterkit - headless artillery simulation
//!
//! Builds a world from the configuration, drops a few characters onto it,
//! lobs a grenade, blows a crater where it lands and lets everything settle.

use craterkit::config::AppConfig;
use craterkit::scene::SceneBuilder;
use craterkit::systems::SimulationSystem;
use craterkit_core::{PhysicsBody, Vec2, World};
use craterkit_raster::shapes;

/// Radius of the crater blown where the grenade comes to rest
const CRATER_RADIUS: usize = 24;

fn build_world(config: &AppConfig) -> Option<World> {
    let builder = match SceneBuilder::from_config(&config.terrain) {
        Ok(builder) => builder,
        Err(e) => {
            log::error!("{}", e);
            return None;
        }
    };
    let width = builder.width() as f32;
    Some(
        builder
            .with_physics(config.physics.clone())
            .add_walker("worm_left", width * 0.25, 10.0)
            .add_walker("worm_right", width * 0.75, 10.0)
            .add_crawler("crawler", width * 0.5, 10.0, Vec2::new(20.0, 0.0))
            .add_grenade("grenade", width * 0.25, 5.0, Vec2::new(40.0, -30.0))
            .build(),
    )
}

fn log_positions(world: &World) {
    for (_, entity) in world.iter() {
        let position = entity.body.position();
        log::info!(
            "{:<12} {:>8} at ({:.1}, {:.1}){}",
            entity.name.as_deref().unwrap_or("<unnamed>"),
            entity.body.kind(),
            position.x,
            position.y,
            if entity.is_active() { "" } else { " asleep" }
        );
    }
}

fn main() {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()),
    )
    .init();
    log::info!("Starting craterkit");

    let Some(mut world) = build_world(&config) else {
        std::process::exit(1);
    };

    let mut sim = SimulationSystem::from_config(&config.simulation);
    let steps = config.simulation.steps();
    let half = steps / 2;

    sim.run(&mut world, half);
    log_positions(&world);

    if let Some((_, grenade)) = world.find_by_name("grenade") {
        let (x, y) = grenade.body.quantized();
        let r = CRATER_RADIUS as i32;
        log::info!("Boom at ({}, {})", x, y);
        world.carve(&shapes::circle(CRATER_RADIUS), x - r, y - r);
    }

    sim.run(&mut world, steps - half);
    log_positions(&world);

    let summary = sim.summary();
    log::info!(
        "{} steps ({:.2}s simulated), {} body ticks, {} impacts, hardest {:.1} px/s",
        summary.steps,
        summary.elapsed,
        summary.ticks,
        summary.impacts,
        summary.hardest_impact
    );

    if let Some(path) = &config.simulation.snapshot_path {
        if let Err(e) = world.snapshot().save(path) {
            log::error!("Failed to save snapshot: {}", e);
        }
    }
}
