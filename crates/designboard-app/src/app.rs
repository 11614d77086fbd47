//! Headless host: owns the editor and replays actions against it.

use crate::action::Action;
use designboard_core::{
    ConfigError, DecodeError, EXPORT_FILE_NAME, EditorConfig, ExportError, ExportOptions, FileVideoSource,
    ReorderDirection, SceneEditor, ShapeKind,
};
use designboard_render::RasterSurface;
use kurbo::Point;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Host errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid script: {0}")]
    Script(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("Action '{action}' failed: {source}")]
    Action {
        action: &'static str,
        #[source]
        source: Box<AppError>,
    },
}

/// What a script run did.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    /// Actions that completed (including no-ops).
    pub applied: usize,
    /// Actions that failed and were skipped.
    pub failed: usize,
    /// Files written by downloads, in order.
    pub downloads: Vec<PathBuf>,
}

/// Host configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Editor configuration.
    pub editor: EditorConfig,
    /// Directory downloads are written to.
    pub out_dir: PathBuf,
    /// Directory relative media paths are resolved against.
    pub base_dir: PathBuf,
    /// Abort on the first failed action instead of logging and continuing.
    pub strict: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            editor: EditorConfig::default(),
            out_dir: PathBuf::from("."),
            base_dir: PathBuf::from("."),
            strict: false,
        }
    }
}

/// The headless application.
pub struct App {
    editor: SceneEditor<RasterSurface>,
    config: AppConfig,
}

impl App {
    /// Create the editor and its raster surface.
    pub fn new(config: AppConfig) -> Self {
        let surface = RasterSurface::from_config(&config.editor);
        let editor = SceneEditor::new(config.editor.clone(), surface);
        Self { editor, config }
    }

    pub fn editor(&self) -> &SceneEditor<RasterSurface> {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut SceneEditor<RasterSurface> {
        &mut self.editor
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.base_dir.join(path)
        }
    }

    /// Apply one action. Returns the written file for downloads.
    pub async fn apply(&mut self, action: &Action) -> Result<Option<PathBuf>, AppError> {
        log::debug!("Applying {}", action.name());
        let editor = &mut self.editor;
        match action {
            Action::AddRectangle => {
                editor.add_rectangle();
            }
            Action::AddCircle => {
                editor.add_circle();
            }
            Action::AddText { content: None } => {
                editor.add_text();
            }
            Action::AddText { content: Some(content) } => {
                let mut defaults = editor.config().defaults.clone();
                defaults.text.content = content.clone();
                editor.add_shape(ShapeKind::Text, &defaults);
            }
            Action::AddImage { path } => {
                let path = self.resolve(path);
                let bytes = std::fs::read(&path)
                    .map_err(|e| AppError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
                self.editor.add_image(bytes).await?;
            }
            Action::AddVideoFrame { path } => {
                let source = FileVideoSource::new(self.resolve(path));
                self.editor.add_video_frame(&source).await?;
            }
            Action::SelectAt { x, y } => {
                editor.select_at(Point::new(*x, *y));
            }
            Action::SelectAll => {
                editor.select_all();
            }
            Action::ClearSelection => {
                editor.clear_selection();
            }
            Action::DeleteSelected => {
                editor.delete_selected();
            }
            Action::BringForward => {
                editor.reorder(ReorderDirection::Forward);
            }
            Action::SendBackward => {
                editor.reorder(ReorderDirection::Backward);
            }
            Action::BringToFront => {
                editor.bring_to_front();
            }
            Action::SendToBack => {
                editor.send_to_back();
            }
            Action::Recolor { color } => {
                editor.recolor(*color);
            }
            Action::Move { dx, dy } => {
                editor.translate_selected(*dx, *dy);
            }
            Action::Scale { factor } => {
                editor.scale_selected(*factor);
            }
            Action::Rotate { degrees } => {
                editor.rotate_selected(degrees.to_radians());
            }
            Action::SetOpacity { opacity } => {
                editor.set_opacity(*opacity);
            }
            Action::EditText { content } => {
                if let Some(id) = editor.selection().active() {
                    editor.edit_text(id, content.clone());
                }
            }
            Action::ClearAll => editor.clear_all(),
            Action::Download {
                format,
                multiplier,
                quality,
            } => {
                let defaults = ExportOptions::default();
                let options = ExportOptions {
                    format: format.unwrap_or(defaults.format),
                    multiplier: multiplier.unwrap_or(defaults.multiplier),
                    quality: quality.unwrap_or(defaults.quality),
                };
                return self.download(&options).map(Some);
            }
        }
        Ok(None)
    }

    /// Export the canvas and write it to the output directory.
    pub fn download(&mut self, options: &ExportOptions) -> Result<PathBuf, AppError> {
        let bytes = self.editor.export_raster(options)?;
        let path = self
            .config
            .out_dir
            .join(Path::new(EXPORT_FILE_NAME).with_extension(options.format.extension()));
        std::fs::create_dir_all(&self.config.out_dir)
            .map_err(|e| AppError::Io(format!("Failed to create {}: {}", self.config.out_dir.display(), e)))?;
        std::fs::write(&path, &bytes)
            .map_err(|e| AppError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
        log::info!("Downloaded {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Replay a script. Failed actions are logged and skipped unless strict.
    pub async fn run_script(&mut self, actions: &[Action]) -> Result<RunSummary, AppError> {
        let mut summary = RunSummary::default();
        for action in actions {
            match self.apply(action).await {
                Ok(download) => {
                    summary.applied += 1;
                    summary.downloads.extend(download);
                }
                Err(e) if self.config.strict => {
                    return Err(AppError::Action {
                        action: action.name(),
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", action.name(), e);
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use designboard_core::SerializableColor;

    fn app(out_dir: &Path) -> App {
        App::new(AppConfig {
            out_dir: out_dir.to_path_buf(),
            base_dir: out_dir.to_path_buf(),
            ..Default::default()
        })
    }

    #[test]
    fn test_shapes_and_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let actions = [
            Action::AddRectangle,
            Action::AddCircle,
            Action::Recolor { color: SerializableColor::rgb(1, 2, 3) },
            Action::SelectAt { x: 60.0, y: 60.0 },
            Action::DeleteSelected,
        ];
        let summary = pollster::block_on(app.run_script(&actions)).unwrap();
        assert_eq!(summary.applied, 5);
        assert_eq!(summary.failed, 0);

        let scene = app.editor().scene();
        assert_eq!(scene.len(), 1);
        let circle = scene.shapes_ordered().next().unwrap();
        assert_eq!(circle.kind_name(), "circle");
        assert_eq!(circle.style().fill_color, SerializableColor::rgb(1, 2, 3));
    }

    #[test]
    fn test_add_text_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        pollster::block_on(app.apply(&Action::AddText { content: Some("Title".into()) })).unwrap();
        assert_eq!(app.editor().surface().render_count(), 1);
        let text = app.editor().scene().shapes_ordered().next().unwrap().as_text().unwrap();
        assert_eq!(text.content(), "Title");

        pollster::block_on(app.apply(&Action::EditText { content: "Renamed".into() })).unwrap();
        let text = app.editor().scene().shapes_ordered().next().unwrap().as_text().unwrap();
        assert_eq!(text.content(), "Renamed");
    }

    #[test]
    fn test_download_writes_design_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let actions = [
            Action::AddRectangle,
            Action::Download { format: None, multiplier: Some(1.0), quality: None },
        ];
        let summary = pollster::block_on(app.run_script(&actions)).unwrap();
        assert_eq!(summary.downloads, vec![dir.path().join("design.png")]);
        let bytes = std::fs::read(dir.path().join("design.png")).unwrap();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_missing_image_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let actions = [
            Action::AddCircle,
            Action::AddImage { path: PathBuf::from("missing.png") },
            Action::AddRectangle,
        ];
        let summary = pollster::block_on(app.run_script(&actions)).unwrap();
        assert_eq!(summary.applied, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(app.editor().scene().len(), 2);
    }

    #[test]
    fn test_strict_stops_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(AppConfig {
            out_dir: dir.path().to_path_buf(),
            base_dir: dir.path().to_path_buf(),
            strict: true,
            ..Default::default()
        });
        std::fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();
        let actions = [
            Action::AddImage { path: PathBuf::from("notes.txt") },
            Action::AddRectangle,
        ];
        let err = pollster::block_on(app.run_script(&actions)).unwrap_err();
        assert!(matches!(err, AppError::Action { action: "add_image", .. }));
        assert!(app.editor().scene().is_empty());
    }
}
