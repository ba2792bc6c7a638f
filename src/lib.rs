//! # Etiqueta - Shipping Label Layout Engine
//!
//! Etiqueta is the engine behind a visual label designer. It provides:
//!
//! - **Field model**: templates of absolutely positioned fields with typed payloads
//! - **Data binding**: resolving field ids against a shipment record or sample data
//! - **Code generation**: 1D barcodes and QR codes as grayscale rasters
//! - **Rendering**: a serializable scene for design and preview modes
//! - **Interaction**: hit-testing, selection and clamped dragging
//!
//! ## Quick Start
//!
//! ```
//! use etiqueta::{
//!     render::Point,
//!     session::DesignerSession,
//!     template::{FieldType, LabelSize, Orientation},
//! };
//!
//! let mut session = DesignerSession::default();
//! session.set_template_meta("Parcel", LabelSize::Label4x6, Orientation::Portrait);
//!
//! // Add a barcode and drag it off the left edge: it stays on the label.
//! let id = session.add_field(FieldType::Barcode)?;
//! session.pointer_down(Point::new(25.0, 25.0));
//! session.pointer_move(Point::new(-500.0, 100.0));
//! session.pointer_up();
//! assert_eq!(session.field(&id).unwrap().position().x, 0.0);
//!
//! // Serialize the scene for the host UI.
//! let scene = session.render();
//! println!("{}", serde_json::to_string_pretty(&scene)?);
//!
//! # Ok::<(), etiqueta::error::EtiquetaError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`template`] | Templates, fields, patches and the wire format |
//! | [`binding`] | Shipment records, binding keys, sample data |
//! | [`codes`] | Barcode and QR generation, background regeneration |
//! | [`render`] | Scene building and the canvas transform |
//! | [`interaction`] | Drag and selection controller |
//! | [`session`] | Editing session and the save gate |
//! | [`store`] | Template persistence seam |
//! | [`config`] | Designer configuration |
//! | [`error`] | Error types |

pub mod binding;
pub mod codes;
pub mod config;
pub mod error;
pub mod interaction;
pub mod render;
pub mod session;
pub mod store;
pub mod template;

// Re-exports for convenience
pub use config::DesignerConfig;
pub use error::EtiquetaError;
pub use session::DesignerSession;
pub use template::{Template, TemplateField};
