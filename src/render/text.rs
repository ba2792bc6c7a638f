//! Text field typography and line layout.
//!
//! Layout works on approximate metrics rather than real font outlines: every
//! glyph advances `0.6 × fontSize` and lines are `1.2 × fontSize` apart. That
//! is enough to decide wrapping and clipping; the final glyph drawing belongs
//! to whoever rasterizes the scene.

use serde::Serialize;

use crate::template::{FieldStyle, FontWeight, Size, TextAlign};

pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const DEFAULT_FONT_SIZE: f32 = 12.0;
pub const DEFAULT_COLOR: &str = "#000000";

const ADVANCE_RATIO: f32 = 0.6;
const LINE_HEIGHT_RATIO: f32 = 1.2;

/// Fully resolved text style.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub color: String,
    pub text_align: TextAlign,
}

impl Typography {
    /// Fill unset style members with defaults.
    pub fn resolve(style: &FieldStyle) -> Self {
        Self {
            font_family: style
                .font_family
                .clone()
                .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
            font_size: style.font_size.unwrap_or(DEFAULT_FONT_SIZE),
            font_weight: style.font_weight.unwrap_or_default(),
            color: style.color.clone().unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            text_align: style.text_align.unwrap_or_default(),
        }
    }

    pub fn advance(&self) -> f32 {
        self.font_size * ADVANCE_RATIO
    }

    pub fn line_height(&self) -> f32 {
        self.font_size * LINE_HEIGHT_RATIO
    }
}

/// Wrapped lines of a text field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLayout {
    pub lines: Vec<String>,
    /// Lines were dropped to fit the field height.
    pub clipped: bool,
}

/// Wrap `text` into the field box and drop lines that do not fit.
///
/// Explicit `\n` always breaks. Words longer than a line are split. At least
/// one line is kept, even if the box is shorter than a line.
pub fn layout(text: &str, typography: &Typography, size: Size) -> TextLayout {
    let max_chars = ((size.width / typography.advance()).floor() as usize).max(1);
    let max_lines = ((size.height / typography.line_height()).floor() as usize).max(1);

    let mut lines: Vec<String> = text
        .split('\n')
        .flat_map(|paragraph| wrap_paragraph(paragraph, max_chars))
        .collect();

    let clipped = lines.len() > max_lines;
    lines.truncate(max_lines);
    TextLayout { lines, clipped }
}

fn wrap_paragraph(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in paragraph.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();

        // Hard-split words that can never fit on one line.
        while chars.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = chars.split_off(max_chars);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }

        let needed = if current_len == 0 {
            chars.len()
        } else {
            current_len + 1 + chars.len()
        };
        if needed > max_chars && current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current_len += chars.len();
        current.extend(chars);
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}
