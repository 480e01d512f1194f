use std::collections::{BTreeMap, HashMap};
use std::fmt;

use bevy::prelude::*;

use crate::constants::MARKER_BASE_SIZE;
use crate::surface::{RaycastHit, SurfaceAlignment};

/// Identifier of a placed marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

/// Interaction state of a marker, shown through its border color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MarkerState {
    #[default]
    Normal,
    Highlighted,
    /// Being sized by a drag
    Drawing,
    /// Held over the scene by a delete-drag
    DeleteArmed,
}

impl MarkerState {
    pub fn color(&self) -> Color {
        match self {
            MarkerState::Normal => Color::srgb(0.0, 1.0, 1.0),
            MarkerState::Highlighted | MarkerState::Drawing => Color::srgb(1.0, 1.0, 0.0),
            MarkerState::DeleteArmed => Color::srgb(1.0, 0.0, 0.0),
        }
    }
}

/// A placed marker. Owned by the registry, referenced elsewhere only by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub transform: Transform,
    /// Per-axis scale of the base footprint; Y is the thickness axis
    pub footprint_scale: Vec3,
    pub state: MarkerState,
    pub hidden: bool,
    /// Alignment of the surface the marker was placed on
    pub alignment: SurfaceAlignment,
}

impl Marker {
    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    /// Physical width and depth of the footprint
    pub fn footprint_size(&self) -> Vec2 {
        Vec2::new(self.footprint_scale.x, self.footprint_scale.z) * MARKER_BASE_SIZE
    }
}

/// Scene entities that render one marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerVisual {
    pub root: Entity,
    pub footprint: Entity,
    pub fill: Entity,
    pub borders: [Entity; 4],
}

impl MarkerVisual {
    /// Every entity of the visual, root first
    pub fn elements(&self) -> impl Iterator<Item = Entity> + '_ {
        [self.root, self.footprint, self.fill]
            .into_iter()
            .chain(self.borders.iter().copied())
    }
}

/// Pre-capture visibility of every marker
pub type VisibilitySnapshot = Vec<(MarkerId, bool)>;

/// Owner of all markers in the scene.
///
/// Every operation taking a `MarkerId` is a no-op when the id is absent.
/// Scene entities are tracked through a side table from visual element to
/// marker id, so `find_id` never walks the entity hierarchy.
#[derive(Resource, Default, Debug)]
pub struct MarkerRegistry {
    markers: BTreeMap<MarkerId, Marker>,
    visuals: HashMap<MarkerId, MarkerVisual>,
    owners: HashMap<Entity, MarkerId>,
    /// Visual roots whose marker is gone and that still need despawning
    orphaned: Vec<Entity>,
    next_id: u64,
}

impl MarkerRegistry {
    pub fn allocate_id(&mut self) -> MarkerId {
        self.next_id += 1;
        MarkerId(self.next_id)
    }

    /// Place a default-sized marker at the hit, replacing any marker with the same id
    pub fn place(&mut self, hit: &RaycastHit, id: MarkerId) {
        if self.markers.contains_key(&id) {
            self.remove(id);
        }

        self.markers.insert(
            id,
            Marker {
                id,
                transform: hit.world_transform.with_scale(Vec3::ONE),
                footprint_scale: Vec3::ONE,
                state: MarkerState::Normal,
                hidden: false,
                alignment: hit.alignment,
            },
        );
        debug!("Placed {} at {:?} ({:?})", id, hit.position(), hit.alignment);
    }

    /// Reposition, keeping footprint and state
    pub fn move_to(&mut self, id: MarkerId, transform: Transform) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.transform = transform.with_scale(Vec3::ONE);
        }
    }

    /// Multiply the footprint scale by `factor`
    pub fn scale(&mut self, id: MarkerId, factor: f32) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.footprint_scale *= factor;
        }
    }

    /// Set the footprint to an absolute physical width and depth
    pub fn resize_absolute(&mut self, id: MarkerId, width: f32, depth: f32) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.footprint_scale =
                Vec3::new(width / MARKER_BASE_SIZE, 1.0, depth / MARKER_BASE_SIZE);
        }
    }

    /// Remove a marker and schedule its visual for despawn. Returns whether it existed.
    pub fn remove(&mut self, id: MarkerId) -> bool {
        if let Some(visual) = self.visuals.remove(&id) {
            for element in visual.elements() {
                self.owners.remove(&element);
            }
            self.orphaned.push(visual.root);
        }

        let removed = self.markers.remove(&id).is_some();
        if removed {
            debug!("Removed {}", id);
        }
        removed
    }

    pub fn set_state(&mut self, id: MarkerId, state: MarkerState) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.state = state;
        }
    }

    /// Hide or show every marker except `except`
    pub fn set_hidden_except(&mut self, except: MarkerId, hidden: bool) {
        for marker in self.markers.values_mut() {
            if marker.id != except {
                marker.hidden = hidden;
            }
        }
    }

    /// Highlight one marker and return every other to normal
    pub fn highlight_exclusive(&mut self, id: MarkerId) {
        for marker in self.markers.values_mut() {
            marker.state = if marker.id == id {
                MarkerState::Highlighted
            } else {
                MarkerState::Normal
            };
        }
    }

    /// Marker owning a visual element
    pub fn find_id(&self, element: Entity) -> Option<MarkerId> {
        self.owners.get(&element).copied()
    }

    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.get(&id)
    }

    pub fn contains(&self, id: MarkerId) -> bool {
        self.markers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Markers in id order
    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    pub fn visibility_snapshot(&self) -> VisibilitySnapshot {
        self.markers
            .values()
            .map(|marker| (marker.id, marker.hidden))
            .collect()
    }

    /// Put back recorded visibility, skipping markers removed since the snapshot
    pub fn restore_visibility(&mut self, snapshot: &VisibilitySnapshot) {
        for (id, hidden) in snapshot {
            if let Some(marker) = self.markers.get_mut(id) {
                marker.hidden = *hidden;
            }
        }
    }

    /// Attach the spawned scene entities for a marker.
    ///
    /// If the marker was removed before its visual arrived, the visual is
    /// queued for despawn instead.
    pub fn bind_visual(&mut self, id: MarkerId, visual: MarkerVisual) {
        if !self.markers.contains_key(&id) {
            self.orphaned.push(visual.root);
            return;
        }

        if let Some(previous) = self.visuals.insert(id, visual) {
            for element in previous.elements() {
                self.owners.remove(&element);
            }
            self.orphaned.push(previous.root);
        }
        for element in visual.elements() {
            self.owners.insert(element, id);
        }
    }

    pub fn visual(&self, id: MarkerId) -> Option<&MarkerVisual> {
        self.visuals.get(&id)
    }

    pub fn markers_without_visual(&self) -> Vec<MarkerId> {
        self.markers
            .keys()
            .filter(|id| !self.visuals.contains_key(id))
            .copied()
            .collect()
    }

    /// Drain visual roots waiting to be despawned
    pub fn take_orphaned(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.orphaned)
    }

    pub fn has_orphaned(&self) -> bool {
        !self.orphaned.is_empty()
    }
}
