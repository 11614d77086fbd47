//! Scene editor: owns the scene and selection and drives the rendering surface.

use crate::config::{EditorConfig, ShapeDefaults};
use crate::media::{self, DecodeError, DecodedImage, VideoSource};
use crate::scene::Scene;
use crate::selection::Selection;
use crate::shapes::{Image, SerializableColor, Shape, ShapeId, ShapeKind};
use crate::surface::{ExportError, ExportOptions, RenderSurface};
use kurbo::{Affine, Point, Vec2};

/// Tolerance in display pixels for pointer hit testing.
pub const HIT_TOLERANCE: f64 = 2.0;

/// Direction of a single-step reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderDirection {
    /// One slot towards the front.
    Forward,
    /// One slot towards the back.
    Backward,
}

/// Handle taken before an asynchronous add starts.
///
/// Records the clear epoch so a result that arrives after `clear_all` is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddTicket {
    epoch: u64,
}

/// Result of applying a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The image was appended and selected.
    Added(ShapeId),
    /// The scene was cleared after the ticket was taken; nothing was added.
    Discarded,
}

impl AddOutcome {
    pub fn id(&self) -> Option<ShapeId> {
        match self {
            AddOutcome::Added(id) => Some(*id),
            AddOutcome::Discarded => None,
        }
    }
}

/// The scene editor.
///
/// Every mutating operation applies atomically and then issues exactly one
/// `request_render` to the surface. Guarded operations return whether anything
/// changed; a no-op does not repaint.
pub struct SceneEditor<S: RenderSurface> {
    scene: Scene,
    selection: Selection,
    surface: S,
    config: EditorConfig,
    /// Bumped by `clear_all`.
    clear_epoch: u64,
}

impl<S: RenderSurface> SceneEditor<S> {
    /// Create an editor with an empty scene drawing into `surface`.
    pub fn new(config: EditorConfig, surface: S) -> Self {
        Self {
            scene: Scene::new(),
            selection: Selection::new(),
            surface,
            config,
            clear_epoch: 0,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    fn repaint(&mut self) {
        self.surface.request_render(&self.scene, &self.selection);
    }

    /// Append a drawable at the front and make it the only selection.
    fn insert(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        log::debug!("Adding {} {}", shape.kind_name(), id);
        self.surface.object_added(&shape);
        self.scene.add_shape(shape);
        self.selection.set_single(id);
        self.repaint();
        id
    }

    // --- Adding drawables ---

    /// Add a drawable of `kind` built from `defaults`.
    pub fn add_shape(&mut self, kind: ShapeKind, defaults: &ShapeDefaults) -> ShapeId {
        self.insert(defaults.build(kind))
    }

    /// Add a rectangle with the configured defaults.
    pub fn add_rectangle(&mut self) -> ShapeId {
        let shape = self.config.defaults.build(ShapeKind::Rectangle);
        self.insert(shape)
    }

    /// Add a circle with the configured defaults.
    pub fn add_circle(&mut self) -> ShapeId {
        let shape = self.config.defaults.build(ShapeKind::Circle);
        self.insert(shape)
    }

    /// Add a text with the configured defaults.
    pub fn add_text(&mut self) -> ShapeId {
        let shape = self.config.defaults.build(ShapeKind::Text);
        self.insert(shape)
    }

    /// Take a ticket for an add whose decode runs elsewhere.
    pub fn ticket(&self) -> AddTicket {
        AddTicket { epoch: self.clear_epoch }
    }

    /// Apply a decoded image taken under `ticket`.
    ///
    /// The image is shrunk to fit the configured share of the surface width and
    /// placed at the configured offset. Stale tickets (a `clear_all` happened since) are dropped.
    pub fn apply_decoded(&mut self, ticket: AddTicket, decoded: DecodedImage) -> AddOutcome {
        if ticket.epoch != self.clear_epoch {
            log::debug!(
                "Discarding {}x{} image decoded before the scene was cleared",
                decoded.width,
                decoded.height
            );
            return AddOutcome::Discarded;
        }
        let canvas_width = self.surface.canvas_size().width;
        let scale = Image::fit_scale(decoded.width, self.config.image.max_width(canvas_width));
        let image = Image::new(
            self.config.image.offset,
            decoded.pixels,
            decoded.width,
            decoded.height,
            decoded.format,
        )
        .with_scale(scale);
        AddOutcome::Added(self.insert(Shape::Image(image)))
    }

    /// Decode image bytes and add the result.
    /// A decode failure leaves the scene untouched and is returned to the caller.
    pub async fn add_image(&mut self, bytes: Vec<u8>) -> Result<AddOutcome, DecodeError> {
        let ticket = self.ticket();
        match media::decode_image(bytes).await {
            Ok(decoded) => Ok(self.apply_decoded(ticket, decoded)),
            Err(e) => {
                log::warn!("Failed to add image: {}", e);
                Err(e)
            }
        }
    }

    /// Capture the first frame of `source` and add it as an image.
    pub async fn add_video_frame(&mut self, source: &dyn VideoSource) -> Result<AddOutcome, DecodeError> {
        let ticket = self.ticket();
        let decoded = match media::capture_first_frame(source).await {
            Ok(png) => media::decode_image(png).await,
            Err(e) => Err(e),
        };
        match decoded {
            Ok(decoded) => Ok(self.apply_decoded(ticket, decoded)),
            Err(e) => {
                log::warn!("Failed to add video frame: {}", e);
                Err(e)
            }
        }
    }

    // --- Selection ---

    /// Select a single drawable. Returns false if the id is not in the scene.
    pub fn select(&mut self, id: ShapeId) -> bool {
        if !self.scene.contains(id) {
            return false;
        }
        self.selection.set_single(id);
        self.repaint();
        true
    }

    /// Add a drawable to the selection, making it active.
    pub fn add_to_selection(&mut self, id: ShapeId) -> bool {
        if !self.scene.contains(id) {
            return false;
        }
        self.selection.add(id);
        self.repaint();
        true
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.selection.clear();
        self.repaint();
        true
    }

    /// Select every drawable; the front-most becomes active.
    pub fn select_all(&mut self) -> bool {
        if self.scene.is_empty() {
            return false;
        }
        self.selection.clear();
        for &id in self.scene.z_order() {
            self.selection.add(id);
        }
        self.repaint();
        true
    }

    /// Pointer selection: select the topmost drawable under `point`, or clear
    /// the selection on a miss. Ignored when the surface disables selection.
    pub fn select_at(&mut self, point: Point) -> Option<ShapeId> {
        if !self.surface.config().selection_enabled {
            return None;
        }
        let hit = self.scene.shapes_at_point(point, HIT_TOLERANCE).first().copied();
        match hit {
            Some(id) => self.selection.set_single(id),
            None => self.selection.clear(),
        }
        self.repaint();
        hit
    }

    // --- Mutations ---

    /// Remove every selected drawable. Returns false on an empty selection.
    pub fn delete_selected(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        let ids: Vec<ShapeId> = self.selection.ids().to_vec();
        self.selection.clear();
        for id in ids {
            if self.scene.remove_shape(id).is_some() {
                self.surface.object_removed(id);
            }
        }
        log::debug!("Deleted selection, {} drawables remain", self.scene.len());
        self.repaint();
        true
    }

    /// Move the active drawable one slot forward or backward.
    /// No-op on an empty selection or when already at the extreme.
    pub fn reorder(&mut self, direction: ReorderDirection) -> bool {
        let Some(id) = self.selection.active() else {
            return false;
        };
        let moved = match direction {
            ReorderDirection::Forward => self.scene.bring_forward(id),
            ReorderDirection::Backward => self.scene.send_backward(id),
        };
        if moved {
            log::debug!("Moved {} {:?}", id, direction);
            self.repaint();
        }
        moved
    }

    /// Move the active drawable to the front.
    pub fn bring_to_front(&mut self) -> bool {
        let moved = self.selection.active().is_some_and(|id| self.scene.bring_to_front(id));
        if moved {
            self.repaint();
        }
        moved
    }

    /// Move the active drawable to the back.
    pub fn send_to_back(&mut self) -> bool {
        let moved = self.selection.active().is_some_and(|id| self.scene.send_to_back(id));
        if moved {
            self.repaint();
        }
        moved
    }

    /// Apply `update` to every selected drawable, then repaint once.
    fn update_selected(&mut self, mut update: impl FnMut(&mut Shape)) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        for &id in self.selection.ids() {
            if let Some(shape) = self.scene.get_shape_mut(id) {
                update(shape);
            }
        }
        self.repaint();
        true
    }

    /// Set the fill of every selected drawable.
    pub fn recolor(&mut self, color: SerializableColor) -> bool {
        log::debug!("Recolor selection to {}", color);
        self.update_selected(|shape| shape.style_mut().fill_color = color)
    }

    /// Move every selected drawable by (dx, dy).
    pub fn translate_selected(&mut self, dx: f64, dy: f64) -> bool {
        if !dx.is_finite() || !dy.is_finite() {
            return false;
        }
        let affine = Affine::translate(Vec2::new(dx, dy));
        self.update_selected(|shape| shape.transform(affine))
    }

    /// Uniformly resize every selected drawable around its top-left corner.
    pub fn scale_selected(&mut self, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        self.update_selected(|shape| {
            let origin = shape.position().to_vec2();
            let affine = Affine::translate(origin) * Affine::scale(factor) * Affine::translate(-origin);
            shape.transform(affine);
        })
    }

    /// Set the rotation (radians, around the bounds center) of every selected drawable.
    pub fn rotate_selected(&mut self, radians: f64) -> bool {
        if !radians.is_finite() {
            return false;
        }
        self.update_selected(|shape| shape.set_rotation(radians))
    }

    /// Set the opacity of every selected drawable, clamped to 0..=1.
    pub fn set_opacity(&mut self, opacity: f64) -> bool {
        if opacity.is_nan() {
            return false;
        }
        let opacity = opacity.clamp(0.0, 1.0);
        self.update_selected(|shape| shape.style_mut().opacity = opacity)
    }

    /// Replace the content of a text drawable. Returns false for other ids.
    pub fn edit_text(&mut self, id: ShapeId, content: impl Into<String>) -> bool {
        let Some(text) = self.scene.get_shape_mut(id).and_then(Shape::as_text_mut) else {
            return false;
        };
        text.set_content(content);
        self.repaint();
        true
    }

    /// Remove everything and invalidate pending asynchronous adds.
    pub fn clear_all(&mut self) {
        self.scene.clear();
        self.selection.clear();
        self.clear_epoch += 1;
        self.surface.cleared();
        log::debug!("Cleared scene (epoch {})", self.clear_epoch);
        self.repaint();
    }

    // --- Export ---

    /// Encode a snapshot of the full canvas. Never mutates the scene.
    pub fn export_raster(&mut self, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
        match self.surface.export(&self.scene, options) {
            Ok(bytes) => {
                log::info!(
                    "Exported {} drawables as {} ({} bytes)",
                    self.scene.len(),
                    options.format.mime_type(),
                    bytes.len()
                );
                Ok(bytes)
            }
            Err(e) => {
                log::warn!("Export failed: {}", e);
                Err(e)
            }
        }
    }
}
