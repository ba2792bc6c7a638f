//! # Etiqueta CLI
//!
//! Command-line front end to the label engine.
//!
//! ## Usage
//!
//! ```bash
//! # Start a template with one sample field of each type
//! etiqueta new "Parcel" --size 4x6 > parcel.json
//!
//! # Check it can be saved
//! etiqueta validate parcel.json
//!
//! # Print the preview scene for a shipment
//! etiqueta render parcel.json --record shipment.json --preview
//!
//! # Write code images
//! etiqueta barcode TRK-20250128-001 --format code128 --png barcode.png
//! etiqueta qr TRK-20250128-001 --tracking --png qr.png
//! ```
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `etiqueta=info`).

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use etiqueta::{
    DesignerConfig, DesignerSession, EtiquetaError, Template, TemplateField,
    binding::ShipmentRecord,
    codes::{
        BarcodeOptions, CodeImage, DEFAULT_BAR_HEIGHT, QrOptions, generate_barcode,
        generate_qr_code, generate_tracking_qr_code,
    },
    render::CanvasMode,
    template::{BarcodeFormat, ErrorCorrection, FieldType, LabelSize, Orientation},
};

/// Etiqueta - shipping label layout engine
#[derive(Parser, Debug)]
#[command(name = "etiqueta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check whether a template may be saved
    Validate {
        /// Template JSON file
        template: PathBuf,
    },

    /// Print the rendered scene of a template as JSON
    Render {
        /// Template JSON file
        template: PathBuf,

        /// Shipment record JSON (sample data when omitted)
        #[arg(long, value_name = "FILE")]
        record: Option<PathBuf>,

        /// Render in preview mode instead of design mode
        #[arg(long)]
        preview: bool,

        /// Field id to show as selected (design mode)
        #[arg(long, value_name = "ID")]
        select: Option<String>,

        /// Designer configuration JSON
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Encode a barcode to PNG
    Barcode {
        data: String,

        /// Symbology: code128, code39, ean13, ean8, upc
        #[arg(long, default_value = "code128")]
        format: BarcodeFormat,

        /// Narrowest bar width in px (1-5)
        #[arg(long, default_value = "2")]
        width: u8,

        /// Bar height in px
        #[arg(long, default_value_t = DEFAULT_BAR_HEIGHT)]
        height: u32,

        /// Omit the human-readable caption
        #[arg(long)]
        no_text: bool,

        /// Output file
        #[arg(long, value_name = "FILE")]
        png: PathBuf,
    },

    /// Encode a QR code to PNG
    Qr {
        data: String,

        /// Error correction: L, M, Q, H
        #[arg(long, default_value = "M")]
        level: ErrorCorrection,

        /// Treat data as a tracking number and encode its tracking URL
        #[arg(long)]
        tracking: bool,

        /// Tracking URL prefix (implies --tracking)
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// Output file
        #[arg(long, value_name = "FILE")]
        png: PathBuf,
    },

    /// Print a new template with one sample field of each type
    New {
        name: String,

        /// Label size: A4, A5, A6, 4x6, 4x4, 2x1
        #[arg(long, default_value = "4x6")]
        size: LabelSize,

        /// Turn the label sideways
        #[arg(long)]
        landscape: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("etiqueta=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), EtiquetaError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { template } => {
            let template = read_template(&template)?;
            let session = DesignerSession::with_template(template, DesignerConfig::from_env());
            match session.validate() {
                Ok(()) => {
                    println!(
                        "{}: ok ({} fields)",
                        session.template().name,
                        session.fields().len()
                    );
                    Ok(())
                }
                Err(e) => {
                    for reason in &e.reasons {
                        println!("  - {}", reason);
                    }
                    Err(e.into())
                }
            }
        }

        Commands::Render {
            template,
            record,
            preview,
            select,
            config,
        } => {
            let config = match config {
                Some(path) => DesignerConfig::from_path(path)?,
                None => DesignerConfig::from_env(),
            };
            let mut session = DesignerSession::with_template(read_template(&template)?, config);
            if let Some(path) = record {
                let record: ShipmentRecord = serde_json::from_str(&std::fs::read_to_string(path)?)?;
                session.bind_record(Some(record));
            }
            session.select(select.as_deref())?;
            if preview {
                session.set_mode(CanvasMode::Preview);
            }
            let scene = session.render();
            println!("{}", serde_json::to_string_pretty(&scene)?);
            Ok(())
        }

        Commands::Barcode {
            data,
            format,
            width,
            height,
            no_text,
            png,
        } => {
            let options = BarcodeOptions {
                format,
                module_width: width,
                height,
                display_value: !no_text,
            };
            let image = generate_barcode(&data, &options)?;
            write_png(&image, &png)
        }

        Commands::Qr {
            data,
            level,
            tracking,
            base_url,
            png,
        } => {
            let options = QrOptions {
                level,
                ..Default::default()
            };
            let image = if tracking || base_url.is_some() {
                let base = base_url.unwrap_or_else(|| DesignerConfig::from_env().tracking_base_url);
                generate_tracking_qr_code(&data, Some(&base), &options)?
            } else {
                generate_qr_code(&data, &options)?
            };
            write_png(&image, &png)
        }

        Commands::New {
            name,
            size,
            landscape,
        } => {
            let orientation = if landscape {
                Orientation::Landscape
            } else {
                Orientation::Portrait
            };
            let template = sample_template(name, size, orientation)?;
            println!("{}", serde_json::to_string_pretty(&template)?);
            Ok(())
        }
    }
}

fn read_template(path: &Path) -> Result<Template, EtiquetaError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_png(image: &CodeImage, path: &Path) -> Result<(), EtiquetaError> {
    std::fs::write(path, image.to_png()?)?;
    println!(
        "Wrote {}x{} image to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

/// Fields stacked down the left edge, each bound to a sample value.
fn sample_template(
    name: String,
    size: LabelSize,
    orientation: Orientation,
) -> Result<Template, EtiquetaError> {
    let mut template = Template::new(name, size, orientation);
    let mut y = 20.0;
    for field_type in FieldType::ALL {
        let id = match field_type {
            FieldType::Text => "receiver",
            FieldType::Barcode => "tracking_barcode",
            FieldType::QrCode => "tracking_qr",
            FieldType::Image => "logo",
            FieldType::Line => "divider",
            FieldType::Rectangle => "frame",
        };
        let field = TemplateField::with_defaults(id, field_type).with_position(20.0, y);
        y += field.size().height + 10.0;
        template.push_field(field)?;
    }
    Ok(template)
}
