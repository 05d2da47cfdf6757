//! Light groups
//!
//! A [`LightGroup`] is a node in the [`LightGraph`](crate::graph::LightGraph)
//! arena. It records its direct lights and child groups by id; the graph owns
//! the lights themselves and is the only place membership changes.
//!
//! Each group carries a generation counter. Any change that can alter the
//! categorized view of a subtree bumps the generation of the affected group
//! and of every ancestor, and a [`GroupCache`] is valid only while its
//! `built_at` matches the group's generation.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::id::{GroupId, LightId};
use crate::light::{Light, LightType};

/// Placement of a group relative to its parent
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupTransform {
    /// Translation
    pub position: Vec3,
    /// Rotation
    pub rotation: Quat,
    /// Scale
    pub scale: Vec3,
}

impl Default for GroupTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl GroupTransform {
    /// Translation only
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Local-to-parent matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Categorized view of a group's subtree
#[derive(Clone, Debug, Default)]
pub struct GroupCache {
    built_at: u64,
    by_type: [Vec<LightId>; LightType::COUNT],
    shadow_casters: Vec<LightId>,
}

impl GroupCache {
    pub(crate) fn push(&mut self, light: &Light) {
        self.by_type[light.light_type().index()].push(light.id());
        if light.casts_shadow() {
            self.shadow_casters.push(light.id());
        }
    }

    pub(crate) fn extend(&mut self, other: &GroupCache) {
        for (dst, src) in self.by_type.iter_mut().zip(other.by_type.iter()) {
            dst.extend_from_slice(src);
        }
        self.shadow_casters.extend_from_slice(&other.shadow_casters);
    }

    /// Lights of one type
    pub fn lights(&self, light_type: LightType) -> &[LightId] {
        &self.by_type[light_type.index()]
    }

    /// Shadow-casting lights
    pub fn shadow_casters(&self) -> &[LightId] {
        &self.shadow_casters
    }

    /// Number of visible lights in the subtree
    pub fn light_count(&self) -> usize {
        self.by_type.iter().map(Vec::len).sum()
    }

    /// Generation the cache was built at
    pub fn built_at(&self) -> u64 {
        self.built_at
    }
}

/// A node of the light hierarchy
#[derive(Debug)]
pub struct LightGroup {
    id: GroupId,
    name: String,
    transform: GroupTransform,
    pub(crate) enabled: bool,
    pub(crate) visible: bool,
    pub(crate) parent: Option<GroupId>,
    pub(crate) lights: Vec<LightId>,
    pub(crate) children: Vec<GroupId>,
    pub(crate) disposed: bool,
    pub(crate) generation: u64,
    pub(crate) cache: GroupCache,
    pub(crate) rebuild_count: u64,
}

impl LightGroup {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            id: GroupId::next(),
            name: name.into(),
            transform: GroupTransform::default(),
            enabled: true,
            visible: true,
            parent: None,
            lights: Vec::new(),
            children: Vec::new(),
            disposed: false,
            // Caches start at 0, so a fresh group is stale until first query
            generation: 1,
            cache: GroupCache::default(),
            rebuild_count: 0,
        }
    }

    /// Stable identifier
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Placement relative to the parent group
    pub fn transform(&self) -> &GroupTransform {
        &self.transform
    }

    pub(crate) fn set_transform(&mut self, transform: GroupTransform) {
        self.transform = transform;
    }

    /// Whether updates recurse into this group
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether this group's lights are rendered
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the group's lights reach its parent's view
    pub fn is_active(&self) -> bool {
        self.enabled && self.visible && !self.disposed
    }

    /// Owning group
    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    /// Directly owned lights in insertion order
    pub fn lights(&self) -> &[LightId] {
        &self.lights
    }

    /// Direct child groups in insertion order
    pub fn children(&self) -> &[GroupId] {
        &self.children
    }

    /// Whether `dispose` has been called
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Current generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the cached view matches the current generation
    pub fn is_cache_valid(&self) -> bool {
        self.cache.built_at == self.generation
    }

    /// Last built cache (may be stale, see [`is_cache_valid`](Self::is_cache_valid))
    pub fn cache(&self) -> &GroupCache {
        &self.cache
    }

    /// Number of cache rebuilds so far
    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }

    pub(crate) fn bump(&mut self) {
        self.generation += 1;
    }

    pub(crate) fn install_cache(&mut self, mut cache: GroupCache) {
        cache.built_at = self.generation;
        self.cache = cache;
        self.rebuild_count += 1;
    }
}
