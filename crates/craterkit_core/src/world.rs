//! The simulation world
//!
//! The World owns the terrain and every entity. Bodies tick one after another
//! against the character layer. Before a body ticks its own footprint is
//! erased from that layer and afterwards it is stamped again at the new cell,
//! so a body never collides with itself while bodies ticked later in the same
//! step see where it ended up.

use craterkit_physics::{Body, Impact, PhysicsBody};
use craterkit_raster::BitRaster;
use slotmap::{new_key_type, SlotMap};

use crate::entity::Entity;
use crate::snapshot::{EntitySnapshot, WorldSnapshot};
use crate::terrain::{RasterLayers, Terrain, TerrainError};

// Define generational key type for entities
new_key_type! {
    /// Key to an entity in the world
    ///
    /// Uses generational indexing so a key to a despawned entity never
    /// resolves to a later entity reusing the slot.
    pub struct EntityKey;
}

/// What happened during one [`World::step`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Number of bodies that integrated
    pub ticked: usize,
    /// Impacts reported by bodies, in tick order
    pub impacts: Vec<(EntityKey, Impact)>,
}

/// Erase an entity's footprint from the character layer
fn lift(terrain: &mut Terrain, entity: &mut Entity) {
    if let Some((x, y)) = entity.footprint.take() {
        terrain.erase(entity.body.mask(), x, y);
    }
}

/// Stamp an entity's footprint at its quantized cell
///
/// Footprints that would overlap existing bits or hang off the top or left
/// edge are left out, so erasing a stamped footprint always restores the
/// layer exactly.
fn place(terrain: &mut Terrain, entity: &mut Entity) {
    // The footprint now reflects the current cell
    if let Some(obstacle) = entity.body.as_static_mut() {
        obstacle.take_moved();
    }
    if entity.ghost {
        return;
    }
    let (x, y) = entity.body.quantized();
    let mask = entity.body.mask();
    if x < 0 || y < 0 || terrain.collides(mask, x, y, RasterLayers::CHARACTERS) {
        log::trace!("footprint at ({}, {}) not stamped", x, y);
        return;
    }
    terrain.stamp(mask, x, y);
    entity.footprint = Some((x, y));
}

/// The simulation context: terrain plus entities
pub struct World {
    terrain: Terrain,
    entities: SlotMap<EntityKey, Entity>,
}

impl World {
    /// Create a world around existing terrain
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            entities: SlotMap::with_key(),
        }
    }

    /// Create a world with empty terrain
    pub fn empty(width: usize, height: usize) -> Self {
        Self::new(Terrain::empty(width, height))
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Add an entity, stamping its footprint at the body's current cell
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityKey {
        entity.footprint = None;
        place(&mut self.terrain, &mut entity);
        self.entities.insert(entity)
    }

    /// Add a body as an anonymous entity
    pub fn spawn(&mut self, body: impl Into<Body>) -> EntityKey {
        self.add_entity(Entity::new(body))
    }

    /// Add a body as a named entity
    pub fn spawn_named(&mut self, name: impl Into<String>, body: impl Into<Body>) -> EntityKey {
        self.add_entity(Entity::new(body).with_name(name))
    }

    /// Add a body that no other body collides with
    pub fn spawn_ghost(&mut self, body: impl Into<Body>) -> EntityKey {
        self.add_entity(Entity::ghost(body))
    }

    /// Remove an entity and its footprint
    pub fn despawn(&mut self, key: EntityKey) -> Option<Entity> {
        let mut entity = self.entities.remove(key)?;
        lift(&mut self.terrain, &mut entity);
        Some(entity)
    }

    /// Get an entity by key
    pub fn get(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    /// Get an entity mutably, to rename or retag it
    ///
    /// The footprint keeps the mask it was stamped with, so the body itself
    /// should be driven through [`World::body_mut`] and [`World::move_entity`].
    pub fn get_mut(&mut self, key: EntityKey) -> Option<&mut Entity> {
        self.entities.get_mut(key)
    }

    /// Get an entity's body for input such as walking or jumping
    ///
    /// Repositioning goes through [`World::move_entity`] so the footprint
    /// follows the body.
    pub fn body_mut(&mut self, key: EntityKey) -> Option<&mut Body> {
        self.entities.get_mut(key).map(|entity| &mut entity.body)
    }

    /// Find the first entity with `name`
    pub fn find_by_name(&self, name: &str) -> Option<(EntityKey, &Entity)> {
        self.entities
            .iter()
            .find(|(_, entity)| entity.name.as_deref() == Some(name))
    }

    /// Iterate over all entities with their keys
    pub fn iter(&self) -> impl Iterator<Item = (EntityKey, &Entity)> {
        self.entities.iter()
    }

    /// Get the number of entities
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the world has no entities
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Place an entity explicitly and re-stamp its footprint
    ///
    /// Static bodies keep their footprint when the move stays inside the same
    /// cell. Returns false when the key is stale.
    pub fn move_entity(&mut self, key: EntityKey, x: f32, y: f32) -> bool {
        let Some(entity) = self.entities.get_mut(key) else {
            return false;
        };
        entity.body.move_to(x, y);
        let restamp = match entity.body.as_static_mut() {
            Some(obstacle) => obstacle.take_moved(),
            None => true,
        };
        if restamp {
            lift(&mut self.terrain, entity);
            place(&mut self.terrain, entity);
        }
        true
    }

    /// Advance every active body by `dt` seconds
    pub fn step(&mut self, dt: f32) -> StepReport {
        let mut report = StepReport::default();
        let terrain = &mut self.terrain;
        for (key, entity) in self.entities.iter_mut() {
            if !entity.body.is_active() {
                continue;
            }
            lift(terrain, entity);
            if entity.body.tick(dt, terrain.characters()) {
                report.ticked += 1;
            }
            if let Some(impact) = entity.body.take_impact() {
                report.impacts.push((key, impact));
            }
            place(terrain, entity);
        }
        log::debug!(
            "step {:.4}s: {} ticked, {} impacts",
            dt,
            report.ticked,
            report.impacts.len()
        );
        report
    }

    /// Remove ground under `mask` and wake every body
    pub fn carve(&mut self, mask: &BitRaster, x: i32, y: i32) {
        self.edit_terrain(|terrain| terrain.carve(mask, x, y));
    }

    /// Add ground under `mask` and wake every body
    pub fn deposit(&mut self, mask: &BitRaster, x: i32, y: i32) {
        self.edit_terrain(|terrain| terrain.deposit(mask, x, y));
    }

    /// Edit terrain with all footprints lifted, then put them back
    fn edit_terrain(&mut self, edit: impl FnOnce(&mut Terrain)) {
        let terrain = &mut self.terrain;
        for entity in self.entities.values_mut() {
            lift(terrain, entity);
        }
        edit(terrain);
        for entity in self.entities.values_mut() {
            entity.body.wake();
            place(terrain, entity);
        }
    }

    /// Capture terrain and body states
    ///
    /// The captured character layer excludes footprints; they are stamped
    /// again from the body states on restore.
    pub fn snapshot(&self) -> WorldSnapshot {
        let mut terrain = self.terrain.clone();
        for entity in self.entities.values() {
            if let Some((x, y)) = entity.footprint {
                terrain.erase(entity.body.mask(), x, y);
            }
        }
        let entities = self
            .entities
            .iter()
            .map(|(key, entity)| EntitySnapshot {
                key,
                name: entity.name.clone(),
                state: entity.body.state(),
            })
            .collect();
        WorldSnapshot {
            terrain: terrain.to_data(),
            entities,
        }
    }

    /// Replace terrain and body states with a snapshot
    ///
    /// Entities are matched by key. Entries for entities this world does not
    /// have, or whose body kind differs, are skipped with a warning. Returns
    /// the number of bodies restored.
    pub fn restore(&mut self, snapshot: &WorldSnapshot) -> Result<usize, TerrainError> {
        self.terrain = Terrain::from_data(&snapshot.terrain)?;
        for entity in self.entities.values_mut() {
            entity.footprint = None;
        }

        let mut restored = 0;
        for saved in &snapshot.entities {
            match self.entities.get_mut(saved.key) {
                Some(entity) => match entity.body.apply_state(&saved.state) {
                    Ok(()) => restored += 1,
                    Err(e) => log::warn!("Skipping snapshot entry {:?}: {}", saved.key, e),
                },
                None => log::warn!(
                    "Snapshot names missing entity {:?} ({})",
                    saved.key,
                    saved.name.as_deref().unwrap_or("unnamed")
                ),
            }
        }

        let terrain = &mut self.terrain;
        for entity in self.entities.values_mut() {
            place(terrain, entity);
        }
        Ok(restored)
    }
}
