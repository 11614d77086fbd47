//! DesignBoard Core Library
//!
//! Platform-agnostic scene editor for the DesignBoard drawing board: the ordered
//! scene of drawables, the selection, and the mutation contract that drives a
//! rendering surface.

pub mod config;
pub mod editor;
pub mod media;
pub mod scene;
pub mod selection;
pub mod shapes;
pub mod surface;

pub use config::{ConfigError, EditorConfig, ShapeDefaults};
pub use editor::{AddOutcome, AddTicket, ReorderDirection, SceneEditor};
pub use media::{
    AnimatedImageSource, BoxFuture, DecodeError, DecodedImage, FileVideoSource, VideoFrame,
    VideoSource, capture_first_frame, decode_image,
};
pub use scene::Scene;
pub use selection::Selection;
pub use shapes::{SerializableColor, Shape, ShapeId, ShapeKind};
pub use surface::{EXPORT_FILE_NAME, ExportError, ExportOptions, RasterFormat, RenderSurface, SurfaceConfig};
