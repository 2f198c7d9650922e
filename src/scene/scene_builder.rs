//! SceneBuilder - Declarative scene construction
//!
//! Provides a fluent API for building a terrain with bodies on it.

use std::path::Path;
use std::sync::Arc;

use craterkit_core::{Entity, Terrain, World};
use craterkit_physics::{BouncingBody, PhysicsBody, StaticBody, StickyBody, Vec2, WalkingBody};
use craterkit_raster::{shapes, BitRaster};

use crate::config::{PhysicsConfig, TerrainConfig};

/// Thickness of the side walls of generated terrain
const WALL_WIDTH: usize = 4;

/// Error building a scene
#[derive(Debug)]
pub enum SceneError {
    /// The terrain image could not be opened or decoded
    Image(image::ImageError),
}

impl From<image::ImageError> for SceneError {
    fn from(e: image::ImageError) -> Self {
        SceneError::Image(e)
    }
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::Image(e) => write!(f, "Terrain image error: {}", e),
        }
    }
}

impl std::error::Error for SceneError {}

/// Rolling ground with a wall on either side
///
/// The surface sits at roughly 60% of the height and undulates with two
/// full sine periods across the width.
pub fn generated_terrain(width: usize, height: usize) -> BitRaster {
    let w = width.max(1) as f32;
    let h = height as f32;
    BitRaster::from_fn(width, height, |x, y| {
        if x < WALL_WIDTH || x + WALL_WIDTH >= width {
            return true;
        }
        let phase = x as f32 / w * std::f32::consts::TAU * 2.0;
        let surface = h * 0.6 + phase.sin() * h * 0.08;
        y as f32 >= surface
    })
}

/// Load terrain from an image, solid where pixels are opaque
pub fn terrain_from_image<P: AsRef<Path>>(path: P) -> Result<BitRaster, SceneError> {
    let path = path.as_ref();
    let image = image::open(path)?.to_rgba8();
    log::info!(
        "Loaded {}x{} terrain from {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(BitRaster::from_alpha(&image))
}

/// Builder for constructing worlds
///
/// # Example
/// ```ignore
/// let world = SceneBuilder::generated(640, 360)
///     .with_physics(PhysicsConfig::default())
///     .add_walker("worm", 100.0, 50.0)
///     .add_grenade("grenade", 200.0, 40.0, Vec2::new(60.0, -20.0))
///     .build();
/// ```
pub struct SceneBuilder {
    world: World,
    physics: PhysicsConfig,
}

impl SceneBuilder {
    /// Create a scene builder around existing ground
    pub fn new(solid: BitRaster) -> Self {
        Self {
            world: World::new(Terrain::new(solid)),
            physics: PhysicsConfig::default(),
        }
    }

    /// Create a scene builder over [`generated_terrain`]
    pub fn generated(width: usize, height: usize) -> Self {
        Self::new(generated_terrain(width, height))
    }

    /// Create a scene builder from the terrain section of the config
    pub fn from_config(config: &TerrainConfig) -> Result<Self, SceneError> {
        match &config.image {
            Some(path) => Ok(Self::new(terrain_from_image(path)?)),
            None => Ok(Self::generated(config.width, config.height)),
        }
    }

    /// Width of the terrain in pixels
    pub fn width(&self) -> usize {
        self.world.terrain().width()
    }

    /// Use the given tuning for bodies added after this call
    pub fn with_physics(mut self, physics: PhysicsConfig) -> Self {
        self.physics = physics;
        self
    }

    /// Add a 6x8 walking character
    pub fn add_walker(mut self, name: &str, x: f32, y: f32) -> Self {
        let mut body = WalkingBody::with_config(
            Arc::new(shapes::ellipse(3, 4)),
            self.physics.walking.clone(),
        );
        body.move_to(x, y);
        self.world
            .add_entity(Entity::new(body).with_name(name).with_tag("walker"));
        self
    }

    /// Add a small bouncing projectile thrown with `velocity`
    ///
    /// Projectiles are ghosts so they fly through characters.
    pub fn add_grenade(mut self, name: &str, x: f32, y: f32, velocity: Vec2) -> Self {
        let mut body = BouncingBody::with_config(
            Arc::new(shapes::circle(2)),
            self.physics.bouncing.clone(),
        );
        body.move_to(x, y);
        body.add_velocity(velocity.x, velocity.y);
        self.world
            .add_entity(Entity::ghost(body).with_name(name).with_tag("projectile"));
        self
    }

    /// Add a crawler launched with `velocity`
    pub fn add_crawler(mut self, name: &str, x: f32, y: f32, velocity: Vec2) -> Self {
        let mut body = StickyBody::with_config(
            Arc::new(BitRaster::solid_rectangle(2, 2)),
            self.physics.sticky.clone(),
        );
        body.move_to(x, y);
        body.add_velocity(velocity.x, velocity.y);
        self.world
            .add_entity(Entity::new(body).with_name(name).with_tag("crawler"));
        self
    }

    /// Add an immovable block
    pub fn add_obstacle(mut self, name: &str, x: f32, y: f32, width: usize, height: usize) -> Self {
        let mut body = StaticBody::new(Arc::new(BitRaster::solid_rectangle(width, height)));
        body.move_to(x, y);
        self.world
            .add_entity(Entity::new(body).with_name(name).with_tag("obstacle"));
        self
    }

    /// Add a custom entity to the scene
    pub fn add_entity(mut self, entity: Entity) -> Self {
        self.world.add_entity(entity);
        self
    }

    /// Build the scene and return the configured World
    pub fn build(self) -> World {
        self.world
    }
}
