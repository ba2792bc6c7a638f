//! # Canvas Renderer
//!
//! Turns a field list into a [`Scene`]: one [`Node`] per enabled field, in
//! list order, laid out in canvas px under a single fit-to-viewport scale.
//!
//! ## Pipeline
//!
//! ```text
//! RenderInput ──┬── fit_scale(canvas, viewport) ──→ Scene.scale
//!               │
//!               └── for each enabled field:
//!                     text       → resolve() → Typography → wrapped lines
//!                     barcode/qr → resolve() → CodeRequest → CodeSource
//!                     image      → placeholder box
//!                     line/rect  → decoration only
//!                   + design chrome (grid, guides, selection tag)
//! ```
//!
//! Code images come from a [`CodeSource`]. [`InlineCodes`] encodes on the
//! spot (CLI, print export); [`CodeSlots`] serves results produced in the
//! background by the [regenerator](crate::codes::regenerate) and reports
//! anything not ready yet as pending.

pub mod text;
pub mod transform;

pub use text::{TextLayout, Typography};
pub use transform::{CanvasTransform, MIN_SCALE, Point, Rect, Viewport, fit_scale};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::binding::{self, ShipmentRecord};
use crate::codes::{BarcodeOptions, CodeImage, CodeRequest, QrOptions, tracking_url};
use crate::config::DesignerConfig;
use crate::error::EncodingError;
use crate::template::{Border, CanvasSize, FieldData, FieldType, TemplateField};

/// Editing surface or print-faithful preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasMode {
    #[default]
    Design,
    Preview,
}

// ============================================================================
// CODE SOURCES
// ============================================================================

/// Outcome of asking a [`CodeSource`] for a field's code image.
#[derive(Debug, Clone)]
pub enum CodeLookup {
    Ready(Arc<CodeImage>),
    Failed(EncodingError),
    /// Not generated yet for this exact request.
    Pending,
}

/// Where the renderer gets barcode and QR images from.
pub trait CodeSource {
    fn code(&self, field_id: &str, request: &CodeRequest) -> CodeLookup;
}

/// Generates every code synchronously.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineCodes;

impl CodeSource for InlineCodes {
    fn code(&self, field_id: &str, request: &CodeRequest) -> CodeLookup {
        match request.generate() {
            Ok(image) => CodeLookup::Ready(Arc::new(image)),
            Err(e) => {
                tracing::warn!(field_id, error = %e, "code could not be encoded");
                CodeLookup::Failed(e)
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    request: CodeRequest,
    result: Result<Arc<CodeImage>, EncodingError>,
}

/// Finished generations keyed by field id.
///
/// A slot only answers for the request it was generated from; asking with a
/// different request (the field was edited since) yields `Pending`.
#[derive(Debug, Clone, Default)]
pub struct CodeSlots {
    slots: HashMap<String, Slot>,
}

impl CodeSlots {
    pub fn insert(
        &mut self,
        field_id: String,
        request: CodeRequest,
        result: Result<CodeImage, EncodingError>,
    ) {
        let result = result.map(Arc::new);
        self.slots.insert(field_id, Slot { request, result });
    }

    pub fn remove(&mut self, field_id: &str) {
        self.slots.remove(field_id);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl CodeSource for CodeSlots {
    fn code(&self, field_id: &str, request: &CodeRequest) -> CodeLookup {
        match self.slots.get(field_id) {
            Some(slot) if slot.request == *request => match &slot.result {
                Ok(image) => CodeLookup::Ready(Arc::clone(image)),
                Err(e) => CodeLookup::Failed(e.clone()),
            },
            _ => CodeLookup::Pending,
        }
    }
}

// ============================================================================
// SCENE
// ============================================================================

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub fields: &'a [TemplateField],
    pub canvas: CanvasSize,
    pub record: Option<&'a ShipmentRecord>,
    pub selected: Option<&'a str>,
    pub mode: CanvasMode,
    pub config: &'a DesignerConfig,
}

impl RenderInput<'_> {
    pub fn transform(&self) -> CanvasTransform {
        CanvasTransform::fit(self.canvas, self.config.viewport)
    }
}

/// Background grid drawn in design mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Grid {
    pub spacing: f32,
}

/// Design-mode decoration of a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chrome {
    /// Selection outline.
    pub selected: bool,
    /// Floating label tag above a selected field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Type-specific content of a node.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum NodeKind {
    Text {
        text: String,
        typography: Typography,
        lines: Vec<String>,
        clipped: bool,
    },
    Code {
        symbology: String,
        /// Exact string encoded into the symbol.
        encoded: String,
        image_width: u32,
        image_height: u32,
        #[serde(skip)]
        image: Arc<CodeImage>,
    },
    /// Box with a caption, used for images and for codes that are not ready.
    Placeholder {
        caption: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    Line {
        color: String,
        thickness: f32,
    },
    Rectangle,
}

/// Visual for one enabled field. `frame` is in canvas px.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub field_id: String,
    pub field_type: FieldType,
    pub frame: Rect,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<Border>,
    /// Design-mode guide and selection state; absent in preview.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome: Option<Chrome>,
}

/// Rendered canvas.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub mode: CanvasMode,
    pub canvas: CanvasSize,
    pub scale: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<Grid>,
    pub nodes: Vec<Node>,
}

impl Scene {
    pub fn node(&self, field_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.field_id == field_id)
    }

    /// The transform this scene was drawn with.
    pub fn transform(&self) -> CanvasTransform {
        CanvasTransform { scale: self.scale }
    }

    /// On-screen size of the scaled canvas.
    pub fn viewport_size(&self) -> (f32, f32) {
        (self.canvas.width * self.scale, self.canvas.height * self.scale)
    }
}

// ============================================================================
// RENDERER
// ============================================================================

/// The code to generate for a field, or `None` for non-code fields and code
/// fields without a payload.
pub fn code_request(
    field: &TemplateField,
    record: Option<&ShipmentRecord>,
    config: &DesignerConfig,
) -> Option<CodeRequest> {
    match field.data() {
        FieldData::Barcode(Some(data)) => Some(CodeRequest::Barcode {
            data: binding::resolve(field, record),
            options: BarcodeOptions::from(data),
        }),
        FieldData::QrCode(Some(data)) => {
            let value = binding::resolve(field, record);
            let data_string = if data.include_tracking_url {
                tracking_url(&value, Some(&config.tracking_base_url))
            } else {
                value
            };
            Some(CodeRequest::Qr {
                data: data_string,
                options: QrOptions::for_field(data, config.qr_module_size),
            })
        }
        _ => None,
    }
}

/// Code generations the scene for `input` needs, keyed by field id.
pub fn code_requests(input: &RenderInput<'_>) -> Vec<(String, CodeRequest)> {
    input
        .fields
        .iter()
        .filter(|f| f.enabled())
        .filter_map(|f| {
            code_request(f, input.record, input.config).map(|r| (f.id().to_string(), r))
        })
        .collect()
}

/// Builds scenes, drawing code images from a [`CodeSource`].
pub struct Renderer<'c> {
    codes: &'c dyn CodeSource,
}

impl<'c> Renderer<'c> {
    pub fn new(codes: &'c dyn CodeSource) -> Self {
        Self { codes }
    }

    pub fn render(&self, input: &RenderInput<'_>) -> Scene {
        let design = input.mode == CanvasMode::Design;
        let nodes = input
            .fields
            .iter()
            .filter(|f| f.enabled())
            .map(|field| {
                let mut node = self.render_field(field, input);
                if design {
                    let selected = input.selected == Some(field.id());
                    node.chrome = Some(Chrome {
                        selected,
                        tag: selected.then(|| field.label().to_string()),
                    });
                }
                node
            })
            .collect();

        Scene {
            mode: input.mode,
            canvas: input.canvas,
            scale: input.transform().scale,
            grid: design.then_some(Grid {
                spacing: input.config.grid_spacing,
            }),
            nodes,
        }
    }

    fn render_field(&self, field: &TemplateField, input: &RenderInput<'_>) -> Node {
        let style = field.style();
        let mut border = style.border.clone();

        let kind = match field.data() {
            FieldData::Text => {
                let text = binding::resolve(field, input.record);
                let typography = Typography::resolve(style);
                let layout = text::layout(&text, &typography, field.size());
                NodeKind::Text {
                    text,
                    typography,
                    lines: layout.lines,
                    clipped: layout.clipped,
                }
            }
            FieldData::Barcode(_) | FieldData::QrCode(_) => self.render_code(field, input),
            FieldData::Image => NodeKind::Placeholder {
                caption: field.label().to_string(),
                reason: None,
            },
            FieldData::Line => NodeKind::Line {
                color: style
                    .color
                    .clone()
                    .unwrap_or_else(|| text::DEFAULT_COLOR.to_string()),
                thickness: 1.0,
            },
            FieldData::Rectangle => {
                border.get_or_insert_with(Border::default);
                NodeKind::Rectangle
            }
        };

        let position = field.position();
        let size = field.size();
        Node {
            field_id: field.id().to_string(),
            field_type: field.field_type(),
            frame: Rect::new(position.x, position.y, size.width, size.height),
            kind,
            background: style.background_color.clone(),
            border,
            chrome: None,
        }
    }

    fn render_code(&self, field: &TemplateField, input: &RenderInput<'_>) -> NodeKind {
        let caption = field.field_type().display_name().to_string();
        let Some(request) = code_request(field, input.record, input.config) else {
            return NodeKind::Placeholder {
                caption,
                reason: Some("missing payload".into()),
            };
        };

        match self.codes.code(field.id(), &request) {
            CodeLookup::Ready(image) => NodeKind::Code {
                symbology: request.symbology().to_string(),
                encoded: request.data().to_string(),
                image_width: image.width(),
                image_height: image.height(),
                image,
            },
            CodeLookup::Failed(e) => {
                tracing::debug!(field_id = field.id(), error = %e, "drawing placeholder");
                NodeKind::Placeholder {
                    caption,
                    reason: Some(e.to_string()),
                }
            }
            CodeLookup::Pending => NodeKind::Placeholder {
                caption,
                reason: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{
        BarcodeFormat, BarcodePatch, BorderStyle, DataPatch, FieldPatch, QrCodePatch, SizePatch,
        StylePatch,
    };
    use pretty_assertions::assert_eq;

    fn input<'a>(
        fields: &'a [TemplateField],
        config: &'a DesignerConfig,
        mode: CanvasMode,
    ) -> RenderInput<'a> {
        RenderInput {
            fields,
            canvas: CanvasSize::new(384.0, 576.0),
            record: None,
            selected: None,
            mode,
            config,
        }
    }

    fn ean13(id: &str) -> TemplateField {
        TemplateField::with_defaults(id, FieldType::Barcode)
            .update(&FieldPatch {
                data: Some(DataPatch::Barcode(BarcodePatch {
                    format: Some(BarcodeFormat::Ean13),
                    ..Default::default()
                })),
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn test_one_node_per_enabled_field_in_order() {
        let config = DesignerConfig::default();
        let fields = vec![
            TemplateField::with_defaults("frame", FieldType::Rectangle),
            TemplateField::with_defaults("receiver", FieldType::Text).with_enabled(false),
            TemplateField::with_defaults("tracking_barcode", FieldType::Barcode),
            TemplateField::with_defaults("rule", FieldType::Line),
        ];
        let scene = Renderer::new(&InlineCodes).render(&input(&fields, &config, CanvasMode::Design));
        let ids: Vec<_> = scene.nodes.iter().map(|n| n.field_id.as_str()).collect();
        assert_eq!(ids, ["frame", "tracking_barcode", "rule"]);
        assert!(scene.node("receiver").is_none());
    }

    #[test]
    fn test_text_node_uses_sample_and_defaults() {
        let config = DesignerConfig::default();
        let fields = vec![TemplateField::with_defaults("tracking_number", FieldType::Text)];
        let scene = Renderer::new(&InlineCodes).render(&input(&fields, &config, CanvasMode::Preview));
        match &scene.nodes[0].kind {
            NodeKind::Text {
                text,
                typography,
                lines,
                clipped,
            } => {
                assert_eq!(text, "TRK-20250128-001");
                assert_eq!(typography.font_family, "Arial");
                assert_eq!(lines, &["TRK-20250128-001"]);
                assert!(!clipped);
            }
            other => panic!("expected text node, got {:?}", other),
        }
    }

    #[test]
    fn test_barcode_node_encodes_resolved_value() {
        let config = DesignerConfig::default();
        let fields = vec![TemplateField::with_defaults("tracking_barcode", FieldType::Barcode)];
        let scene = Renderer::new(&InlineCodes).render(&input(&fields, &config, CanvasMode::Preview));
        match &scene.nodes[0].kind {
            NodeKind::Code {
                symbology, encoded, ..
            } => {
                assert_eq!(symbology, "CODE128");
                assert_eq!(encoded, "TRK-20250128-001");
            }
            other => panic!("expected code node, got {:?}", other),
        }
    }

    #[test]
    fn test_unencodable_barcode_becomes_placeholder() {
        let config = DesignerConfig::default();
        let fields = vec![ean13("tracking_barcode")];
        let scene = Renderer::new(&InlineCodes).render(&input(&fields, &config, CanvasMode::Preview));
        match &scene.nodes[0].kind {
            NodeKind::Placeholder { caption, reason } => {
                assert_eq!(caption, "Barcode");
                assert!(reason.as_deref().unwrap_or("").contains("EAN13"));
            }
            other => panic!("expected placeholder, got {:?}", other),
        }
    }

    #[test]
    fn test_qr_with_tracking_url() {
        let mut config = DesignerConfig::default();
        config.tracking_base_url = "https://parcel.example/track/".into();
        let field = TemplateField::with_defaults("tracking_qr", FieldType::QrCode)
            .update(&FieldPatch {
                data: Some(DataPatch::QrCode(QrCodePatch {
                    include_tracking_url: Some(true),
                    ..Default::default()
                })),
                ..Default::default()
            })
            .unwrap();
        let request = code_request(&field, None, &config).unwrap();
        assert_eq!(request.data(), "https://parcel.example/track/TRK-20250128-001");
    }

    #[test]
    fn test_design_chrome_and_preview_without() {
        let config = DesignerConfig::default();
        let fields = vec![
            TemplateField::with_defaults("sender", FieldType::Text).with_label("From"),
            TemplateField::with_defaults("logo", FieldType::Image),
        ];
        let mut design = input(&fields, &config, CanvasMode::Design);
        design.selected = Some("sender");
        let scene = Renderer::new(&InlineCodes).render(&design);
        assert_eq!(scene.grid, Some(Grid { spacing: 10.0 }));
        assert_eq!(
            scene.nodes[0].chrome,
            Some(Chrome {
                selected: true,
                tag: Some("From".into()),
            })
        );
        assert_eq!(
            scene.nodes[1].chrome,
            Some(Chrome {
                selected: false,
                tag: None,
            })
        );

        let mut preview = design;
        preview.mode = CanvasMode::Preview;
        let scene = Renderer::new(&InlineCodes).render(&preview);
        assert_eq!(scene.grid, None);
        assert!(scene.nodes.iter().all(|n| n.chrome.is_none()));
    }

    #[test]
    fn test_rectangle_gets_default_border() {
        let config = DesignerConfig::default();
        let fields = vec![TemplateField::with_defaults("frame", FieldType::Rectangle)
            .update(&FieldPatch {
                style: Some(StylePatch {
                    background_color: Some("#eeeeee".into()),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .unwrap()];
        let scene = Renderer::new(&InlineCodes).render(&input(&fields, &config, CanvasMode::Preview));
        let node = &scene.nodes[0];
        assert_eq!(node.border.as_ref().map(|b| (b.width, b.style)), Some((1.0, BorderStyle::Solid)));
        assert_eq!(node.background.as_deref(), Some("#eeeeee"));
    }

    #[test]
    fn test_scale_applies_to_whole_canvas() {
        let config = DesignerConfig::default();
        let fields = vec![TemplateField::with_defaults("sender", FieldType::Text)];
        let mut a4 = input(&fields, &config, CanvasMode::Design);
        a4.canvas = CanvasSize::new(794.0, 1123.0);
        let scene = Renderer::new(&InlineCodes).render(&a4);
        assert!((scene.scale - 600.0 / 1123.0).abs() < 1e-6);
        // Frames stay in canvas px.
        assert_eq!(scene.nodes[0].frame, Rect::new(20.0, 20.0, 200.0, 30.0));
    }

    #[test]
    fn test_slots_answer_only_matching_request() {
        let request = CodeRequest::Barcode {
            data: "TRK-1".into(),
            options: BarcodeOptions::default(),
        };
        let mut slots = CodeSlots::default();
        assert!(matches!(slots.code("b", &request), CodeLookup::Pending));
        slots.insert("b".into(), request.clone(), request.generate());
        assert!(matches!(slots.code("b", &request), CodeLookup::Ready(_)));

        let edited = CodeRequest::Barcode {
            data: "TRK-2".into(),
            options: BarcodeOptions::default(),
        };
        assert!(matches!(slots.code("b", &edited), CodeLookup::Pending));
    }

    #[test]
    fn test_missing_payload_renders_placeholder() {
        let field: TemplateField = serde_json::from_value(serde_json::json!({
            "id": "tracking_qr", "type": "qr_code", "label": "QR",
            "position": {"x": 0, "y": 0}, "size": {"width": 100, "height": 100}
        }))
        .unwrap();
        let config = DesignerConfig::default();
        let fields = vec![field];
        let scene = Renderer::new(&InlineCodes).render(&input(&fields, &config, CanvasMode::Preview));
        assert!(matches!(
            &scene.nodes[0].kind,
            NodeKind::Placeholder { caption, .. } if caption == "QR Code"
        ));
        assert!(code_requests(&input(&fields, &config, CanvasMode::Preview)).is_empty());
    }

    #[test]
    fn test_scene_serializes_without_pixels() {
        let config = DesignerConfig::default();
        let fields = vec![TemplateField::with_defaults("tracking_qr", FieldType::QrCode)];
        let scene = Renderer::new(&InlineCodes).render(&input(&fields, &config, CanvasMode::Preview));
        let json = serde_json::to_value(&scene).unwrap();
        assert_eq!(json["nodes"][0]["kind"], "code");
        assert_eq!(json["nodes"][0]["symbology"], "QR");
        assert!(json["nodes"][0].get("image").is_none());
    }

    #[test]
    fn test_resized_field_changes_text_layout() {
        let config = DesignerConfig::default();
        let narrow = TemplateField::with_defaults("receiver", FieldType::Text)
            .update(&FieldPatch {
                size: Some(SizePatch {
                    width: Some(60.0),
                    height: Some(200.0),
                }),
                ..Default::default()
            })
            .unwrap();
        let fields = vec![narrow];
        let scene = Renderer::new(&InlineCodes).render(&input(&fields, &config, CanvasMode::Preview));
        let NodeKind::Text { lines, .. } = &scene.nodes[0].kind else {
            panic!("expected text node");
        };
        assert!(lines.len() > 3);
    }
}
