//! Ordered scene of drawables.

use crate::shapes::{Shape, ShapeId};
use kurbo::Point;
use std::collections::HashMap;

/// The ordered collection of all drawables.
///
/// `z_order` lists ids back to front; every id in it has exactly one entry in
/// `shapes` and vice versa.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    shapes: HashMap<ShapeId, Shape>,
    z_order: Vec<ShapeId>,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a drawable at the front.
    /// Returns false (and leaves the scene untouched) if the id is already present.
    pub fn add_shape(&mut self, shape: Shape) -> bool {
        let id = shape.id();
        if self.shapes.contains_key(&id) {
            return false;
        }
        self.z_order.push(id);
        self.shapes.insert(id, shape);
        true
    }

    /// Remove a drawable.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        let shape = self.shapes.remove(&id)?;
        self.z_order.retain(|&shape_id| shape_id != id);
        Some(shape)
    }

    /// Remove every drawable.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.z_order.clear();
    }

    /// Get a drawable by id.
    pub fn get_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    /// Get a mutable reference to a drawable by id.
    pub fn get_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    /// Check whether a drawable is in the scene.
    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(&id)
    }

    /// Ids in paint order (back to front).
    pub fn z_order(&self) -> &[ShapeId] {
        &self.z_order
    }

    /// Paint-order index of a drawable (0 = back).
    pub fn index_of(&self, id: ShapeId) -> Option<usize> {
        self.z_order.iter().position(|&shape_id| shape_id == id)
    }

    /// Drawables in paint order (back to front).
    pub fn shapes_ordered(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Bring a drawable to the front (topmost).
    /// Returns true if the drawable moved.
    pub fn bring_to_front(&mut self, id: ShapeId) -> bool {
        match self.index_of(id) {
            Some(pos) if pos + 1 < self.z_order.len() => {
                let id = self.z_order.remove(pos);
                self.z_order.push(id);
                true
            }
            _ => false,
        }
    }

    /// Send a drawable to the back (bottommost).
    /// Returns true if the drawable moved.
    pub fn send_to_back(&mut self, id: ShapeId) -> bool {
        match self.index_of(id) {
            Some(pos) if pos > 0 => {
                let id = self.z_order.remove(pos);
                self.z_order.insert(0, id);
                true
            }
            _ => false,
        }
    }

    /// Move a drawable one layer forward (towards front).
    /// Returns true if the drawable was moved, false if already at front.
    pub fn bring_forward(&mut self, id: ShapeId) -> bool {
        if let Some(pos) = self.index_of(id) {
            if pos + 1 < self.z_order.len() {
                self.z_order.swap(pos, pos + 1);
                return true;
            }
        }
        false
    }

    /// Move a drawable one layer backward (towards back).
    /// Returns true if the drawable was moved, false if already at back.
    pub fn send_backward(&mut self, id: ShapeId) -> bool {
        if let Some(pos) = self.index_of(id) {
            if pos > 0 {
                self.z_order.swap(pos, pos - 1);
                return true;
            }
        }
        false
    }

    /// Find drawables at a point, front to back.
    pub fn shapes_at_point(&self, point: Point, tolerance: f64) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .rev()
            .filter_map(|&id| {
                self.shapes
                    .get(&id)
                    .filter(|s| s.hit_test(point, tolerance))
                    .map(|_| id)
            })
            .collect()
    }

    /// Check if the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Get the number of drawables.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }
}
