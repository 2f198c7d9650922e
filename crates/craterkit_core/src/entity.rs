//! Entity types
//!
//! An entity pairs a physics body with the bookkeeping the world needs to keep
//! its footprint in the character layer in sync.

use std::collections::HashSet;

use craterkit_physics::{Body, PhysicsBody};

/// An object in the simulation world
///
/// Each entity has:
/// - An optional name (for lookup by name)
/// - Tags (for categorization and filtering)
/// - A physics body
/// - The cell its footprint is stamped at, if any
#[derive(Debug)]
pub struct Entity {
    /// Optional name for lookup
    pub name: Option<String>,
    /// Tags for categorization
    pub tags: HashSet<String>,
    /// The body driving this entity
    pub body: Body,
    /// Ghosts never stamp a footprint, so other bodies pass through them
    pub(crate) ghost: bool,
    pub(crate) footprint: Option<(i32, i32)>,
}

impl Entity {
    /// Create an entity that stamps its footprint
    pub fn new(body: impl Into<Body>) -> Self {
        Self {
            name: None,
            tags: HashSet::new(),
            body: body.into(),
            ghost: false,
            footprint: None,
        }
    }

    /// Create an entity that other bodies do not collide with
    pub fn ghost(body: impl Into<Body>) -> Self {
        Self {
            ghost: true,
            ..Self::new(body)
        }
    }

    /// Set the name of this entity
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a tag to this entity
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Check if this entity has a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn is_ghost(&self) -> bool {
        self.ghost
    }

    /// Cell the footprint is currently stamped at
    pub fn footprint(&self) -> Option<(i32, i32)> {
        self.footprint
    }

    /// Whether the body will integrate on the next step
    pub fn is_active(&self) -> bool {
        self.body.is_active()
    }
}
