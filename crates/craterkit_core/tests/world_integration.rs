//! Integration tests for the simulation world
//!
//! These tests verify terrain, entities and bodies working together:
//! 1. Bodies collide with terrain and with each other's footprints
//! 2. Terrain edits reshape the world and wake sleeping bodies
//! 3. Footprint bookkeeping never leaks into the character layer
//! 4. Snapshots replicate a host world onto a follower

use std::sync::Arc;

use craterkit_core::{BitRaster, EntityKey, PhysicsBody, Terrain, World};
use craterkit_physics::{BouncingBody, StickDirection, StickyBody, WalkingBody};
use craterkit_raster::shapes;

const DT: f32 = 1.0 / 60.0;

/// 300x200 map walled on both sides: flat ground from row 150 with a round
/// hill in the middle
fn hill_terrain() -> Terrain {
    let ground = BitRaster::from_fn(300, 200, |x, y| {
        let dx = x as f32 - 150.0;
        let dy = y as f32 - 170.0;
        x < 5 || x >= 295 || y >= 150 || dx * dx + dy * dy <= 50.0 * 50.0
    });
    Terrain::new(ground)
}

fn worm(x: f32, y: f32) -> WalkingBody {
    let mut body = WalkingBody::new(Arc::new(shapes::ellipse(3, 4)));
    body.move_to(x, y);
    body
}

fn settle(world: &mut World, max_steps: usize) {
    for _ in 0..max_steps {
        if world.step(DT).ticked == 0 {
            return;
        }
    }
}

fn position(world: &World, key: EntityKey) -> (f32, f32) {
    let p = world.get(key).expect("entity should exist").body.position();
    (p.x, p.y)
}

// ==================== Bodies and Terrain ====================

/// Worms dropped on the map come to rest on the ground without overlapping it
#[test]
fn test_worms_settle_on_terrain() {
    let mut world = World::new(hill_terrain());
    let keys: Vec<EntityKey> = [30.0, 80.0, 150.0, 260.0]
        .iter()
        .map(|&x| world.spawn(worm(x, 5.0)))
        .collect();

    settle(&mut world, 2000);

    for key in keys {
        let entity = world.get(key).unwrap();
        assert!(!entity.is_active(), "worm {:?} should be asleep", key);
        let (x, y) = entity.body.quantized();
        assert!(
            !world.terrain().solid().collides_with(entity.body.mask(), x, y),
            "worm {:?} embedded at ({}, {})",
            key,
            x,
            y
        );
        assert!(
            world.terrain().solid().collides_with(entity.body.mask(), x, y + 1),
            "worm {:?} should rest on ground",
            key
        );
    }

    // The hilltop worm rests well above the flat ground
    assert!(position(&world, keys_top(&world)).1 < 130.0);
}

fn keys_top(world: &World) -> EntityKey {
    world
        .iter()
        .min_by(|a, b| a.1.body.position().y.total_cmp(&b.1.body.position().y))
        .map(|(key, _)| key)
        .expect("world should have entities")
}

/// A grenade thrown at the hill bounces and eventually comes to rest
#[test]
fn test_grenade_comes_to_rest() {
    let mut world = World::new(hill_terrain());
    let mut grenade = BouncingBody::new(Arc::new(shapes::circle(2)));
    grenade.config.friction = 0.8;
    grenade.move_to(20.0, 100.0);
    grenade.add_angular_velocity(60.0, -0.6);
    let key = world.spawn(grenade);

    let mut contacts = 0;
    for _ in 0..6000 {
        contacts += world.step(DT).impacts.len();
    }

    let entity = world.get(key).unwrap();
    assert!(contacts > 0, "grenade should hit terrain");
    assert!(!entity.is_active(), "grenade should settle");
    let (x, y) = entity.body.quantized();
    assert!(!world.terrain().solid().collides_with(entity.body.mask(), x, y));
}

// ==================== Terrain Edits ====================

/// Carving a crater under a resting worm drops it into the crater
#[test]
fn test_explosion_drops_worm_into_crater() {
    let mut world = World::new(hill_terrain());
    let key = world.spawn(worm(40.0, 120.0));
    settle(&mut world, 1000);
    let (_, resting_y) = position(&world, key);

    let crater = shapes::circle(15);
    world.carve(&crater, 28, 135);
    assert!(world.get(key).unwrap().is_active(), "carve should wake bodies");

    settle(&mut world, 1000);
    let (_, crater_y) = position(&world, key);
    assert!(
        crater_y > resting_y + 5.0,
        "worm should fall into the crater: {} -> {}",
        resting_y,
        crater_y
    );
}

/// Ground deposited under a worm is climbed out of rather than fallen through
#[test]
fn test_deposit_on_worm_unsticks_it() {
    let mut world = World::new(hill_terrain());
    let key = world.spawn(worm(40.0, 120.0));
    settle(&mut world, 1000);

    world.deposit(&BitRaster::solid_rectangle(20, 3), 30, 140);
    settle(&mut world, 1000);

    let entity = world.get(key).unwrap();
    let (x, y) = entity.body.quantized();
    assert!(!world.terrain().solid().collides_with(entity.body.mask(), x, y));
}

// ==================== Footprint Bookkeeping ====================

/// Without deposits the character layer is the solid layer plus footprints
#[test]
fn test_footprints_never_leak() {
    let mut world = World::new(hill_terrain());
    for i in 0..6 {
        world.spawn(worm(20.0 + 45.0 * i as f32, 10.0));
    }
    let mut crawler = StickyBody::new(Arc::new(BitRaster::solid_rectangle(2, 2)));
    crawler.move_to(150.0, 20.0);
    world.spawn(crawler);

    for step in 0..600 {
        world.step(DT);
        if step % 100 == 0 {
            world.carve(&shapes::circle(6), 60 + step as i32 / 10, 140);
        }
    }

    let snapshot = world.snapshot();
    assert_eq!(
        snapshot.terrain.solid, snapshot.terrain.characters,
        "footprints left stray bits in the character layer"
    );
}

/// A crawler walks across a static obstacle instead of through it
#[test]
fn test_crawler_climbs_over_obstacle() {
    let mut world = World::new(Terrain::new(BitRaster::from_fn(200, 100, |_, y| y >= 80)));
    let mut block = craterkit_physics::StaticBody::new(Arc::new(BitRaster::solid_rectangle(6, 6)));
    block.move_to(60.0, 74.0);
    world.spawn(block);

    let mut crawler = StickyBody::new(Arc::new(BitRaster::solid_rectangle(1, 1)));
    crawler.move_to(50.0, 70.0);
    let key = world.spawn(crawler);

    let mut saw_wall = false;
    for _ in 0..600 {
        world.step(DT);
        let sticky = world.get(key).unwrap().body.as_sticky().unwrap();
        saw_wall |= sticky.stick() == StickDirection::PosX;
    }
    assert!(saw_wall, "crawler should climb the block's side");
    assert!(position(&world, key).0 > 66.0, "crawler should pass the block");
}

// ==================== Replication ====================

fn replicated_world() -> (World, Vec<EntityKey>) {
    let mut world = World::new(hill_terrain());
    let mut keys = vec![world.spawn(worm(60.0, 40.0)), world.spawn(worm(140.0, 10.0))];
    let mut grenade = BouncingBody::new(Arc::new(shapes::circle(2)));
    grenade.move_to(200.0, 60.0);
    grenade.add_velocity(-30.0, -20.0);
    keys.push(world.spawn(grenade));
    (world, keys)
}

/// A follower restored from the host's snapshot stays in lockstep
#[test]
fn test_follower_tracks_host_after_restore() {
    let (mut host, keys) = replicated_world();
    let (mut follower, _) = replicated_world();

    for _ in 0..30 {
        host.step(DT);
    }
    host.carve(&shapes::circle(10), 50, 140);

    let restored = follower.restore(&host.snapshot()).expect("snapshot should apply");
    assert_eq!(restored, keys.len());
    assert_eq!(follower.terrain(), host.terrain());

    for step in 0..240 {
        host.step(DT);
        follower.step(DT);
        for &key in &keys {
            assert_eq!(
                host.get(key).unwrap().body.serialize(),
                follower.get(key).unwrap().body.serialize(),
                "entity {:?} diverged on step {}",
                key,
                step
            );
        }
    }
}
