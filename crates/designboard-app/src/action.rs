//! Host actions replayed against the editor.

use designboard_core::{RasterFormat, SerializableColor};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One user action, as a host toolbar would issue it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Add a rectangle with the configured defaults.
    AddRectangle,
    /// Add a circle with the configured defaults.
    AddCircle,
    /// Add a text, optionally replacing the default content.
    AddText {
        #[serde(default)]
        content: Option<String>,
    },
    /// Decode an image file and add it.
    AddImage { path: PathBuf },
    /// Add the first frame of an animated image or clip file.
    AddVideoFrame { path: PathBuf },
    /// Pointer selection at display coordinates.
    SelectAt { x: f64, y: f64 },
    SelectAll,
    ClearSelection,
    DeleteSelected,
    BringForward,
    SendBackward,
    BringToFront,
    SendToBack,
    /// Set the fill of the selection (CSS hex color).
    Recolor { color: SerializableColor },
    /// Move the selection.
    Move { dx: f64, dy: f64 },
    /// Resize the selection around each top-left corner.
    Scale { factor: f64 },
    /// Set the rotation of the selection in degrees.
    Rotate { degrees: f64 },
    SetOpacity { opacity: f64 },
    /// Replace the content of the active text.
    EditText { content: String },
    ClearAll,
    /// Export the canvas and write it to the output directory.
    Download {
        #[serde(default)]
        format: Option<RasterFormat>,
        #[serde(default)]
        multiplier: Option<f64>,
        #[serde(default)]
        quality: Option<f32>,
    },
}

impl Action {
    /// Short name used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddRectangle => "add_rectangle",
            Action::AddCircle => "add_circle",
            Action::AddText { .. } => "add_text",
            Action::AddImage { .. } => "add_image",
            Action::AddVideoFrame { .. } => "add_video_frame",
            Action::SelectAt { .. } => "select_at",
            Action::SelectAll => "select_all",
            Action::ClearSelection => "clear_selection",
            Action::DeleteSelected => "delete_selected",
            Action::BringForward => "bring_forward",
            Action::SendBackward => "send_backward",
            Action::BringToFront => "bring_to_front",
            Action::SendToBack => "send_to_back",
            Action::Recolor { .. } => "recolor",
            Action::Move { .. } => "move",
            Action::Scale { .. } => "scale",
            Action::Rotate { .. } => "rotate",
            Action::SetOpacity { .. } => "set_opacity",
            Action::EditText { .. } => "edit_text",
            Action::ClearAll => "clear_all",
            Action::Download { .. } => "download",
        }
    }
}

/// Parse a JSON array of actions.
pub fn parse_script(json: &str) -> Result<Vec<Action>, serde_json::Error> {
    serde_json::from_str(json)
}
