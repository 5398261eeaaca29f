use crate::theme::{parse_color, style_color, style_number, Theme};
use eframe::egui::{self, Color32, CornerRadius, Frame, Margin, Pos2, Rect, RichText, Stroke};
use widget_studio::render::{Element, Layout, RegionRole, VisualNode};
use widget_studio::style::{parse_background, Background, StyleBag};

const DEFAULT_TEXT: Color32 = Color32::from_rgb(0x11, 0x18, 0x27);

/// What the pointer did over the painted nodes this frame. Keys are the
/// deepest node under the pointer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PaintOutcome {
    pub hovered: Option<String>,
    pub clicked: Option<String>,
}

pub struct NodePainter<'a> {
    theme: &'a Theme,
    selected: Option<&'a str>,
    pointer: Option<Pos2>,
    click: Option<Pos2>,
    outcome: PaintOutcome,
}

impl<'a> NodePainter<'a> {
    pub fn new(ui: &egui::Ui, theme: &'a Theme, selected: Option<&'a str>) -> Self {
        let pointer = ui.ctx().pointer_hover_pos();
        let click = ui.input(|input| {
            if input.pointer.primary_clicked() {
                input.pointer.interact_pos()
            } else {
                None
            }
        });
        Self {
            theme,
            selected,
            pointer,
            click,
            outcome: PaintOutcome::default(),
        }
    }

    pub fn paint(mut self, ui: &mut egui::Ui, nodes: &[VisualNode]) -> PaintOutcome {
        ui.vertical(|ui| self.paint_children(ui, nodes, DEFAULT_TEXT));
        self.outcome
    }

    fn paint_children(&mut self, ui: &mut egui::Ui, nodes: &[VisualNode], inherited: Color32) {
        for node in nodes {
            self.paint_node(ui, node, inherited);
        }
    }

    fn paint_node(&mut self, ui: &mut egui::Ui, node: &VisualNode, inherited: Color32) {
        let style = &node.style;
        let text_color = style_color(style, "color").unwrap_or(inherited);
        let default_padding = match node.element {
            Element::Region { .. } => 6.0,
            _ => 0.0,
        };
        let padding = style_number(style, "padding").unwrap_or(default_padding);
        let radius = style_number(style, "borderRadius").unwrap_or(0.0);
        let stroke = if self.selected == Some(node.key.as_str()) {
            Stroke::new(1.5, self.theme.selection_outline)
        } else {
            border_stroke(style)
        };

        let frame = Frame::new()
            .fill(background_fill(style).unwrap_or(Color32::TRANSPARENT))
            .inner_margin(Margin::same(padding.clamp(0.0, 127.0) as i8))
            .corner_radius(CornerRadius::same(radius.clamp(0.0, 255.0) as u8))
            .stroke(stroke);

        let response = frame
            .show(ui, |ui| {
                if let Some(width) = style_number(style, "width") {
                    ui.set_min_width(width);
                }
                if let Some(height) = style_number(style, "height") {
                    ui.set_min_height(height);
                }
                if let Some(gap) = style_number(style, "gap") {
                    ui.spacing_mut().item_spacing = egui::vec2(gap, gap);
                }
                self.paint_content(ui, node, text_color);
            })
            .response;
        self.record(&node.key, response.rect);
    }

    fn paint_content(&mut self, ui: &mut egui::Ui, node: &VisualNode, text_color: Color32) {
        let font_size = style_number(&node.style, "fontSize").unwrap_or(14.0);
        match &node.element {
            Element::Region {
                role: RegionRole::Split,
                ..
            } => self.paint_split(ui, node, text_color),
            Element::Region {
                layout: Layout::Row,
                ..
            } => {
                ui.horizontal(|ui| self.paint_children(ui, &node.children, text_color));
            }
            Element::Region { .. } | Element::Pane { .. } => {
                ui.vertical(|ui| self.paint_children(ui, &node.children, text_color));
            }
            Element::Icon { name } => {
                ui.label(RichText::new(icon_glyph(name)).color(text_color).size(font_size + 4.0));
            }
            Element::Text { text } => {
                let mut rich = RichText::new(text).color(text_color).size(font_size);
                if style_number(&node.style, "fontWeight").is_some_and(|weight| weight >= 600.0) {
                    rich = rich.strong();
                }
                ui.label(rich);
            }
            Element::Image { src } => {
                ui.label(RichText::new(format!("[image] {src}")).color(text_color).size(12.0));
            }
            Element::Status { color, label, status } => {
                ui.horizontal(|ui| {
                    let dot = parse_color(color).unwrap_or(self.theme.success);
                    ui.label(RichText::new("\u{25CF}").color(dot));
                    let label = label.as_deref().unwrap_or(status.as_str());
                    ui.label(RichText::new(label).color(text_color).size(font_size - 2.0));
                });
            }
            Element::Button { label } => {
                // The surrounding frame already carries the fill.
                ui.add(
                    egui::Button::new(RichText::new(label).color(text_color).size(font_size))
                        .fill(Color32::TRANSPARENT)
                        .stroke(Stroke::NONE),
                );
            }
            Element::Divider => {
                ui.separator();
            }
            Element::Branding { text } => {
                ui.label(RichText::new(text).color(self.theme.text_muted).size(11.0));
            }
        }
    }

    fn paint_split(&mut self, ui: &mut egui::Ui, node: &VisualNode, text_color: Color32) {
        let total = ui.available_width();
        ui.horizontal(|ui| {
            for pane in &node.children {
                let Element::Pane { percent } = &pane.element else {
                    continue;
                };
                let width = total * f32::from(*percent) / 100.0;
                let response = ui
                    .allocate_ui(egui::vec2(width, 0.0), |ui| {
                        ui.set_width(width);
                        ui.vertical(|ui| self.paint_children(ui, &pane.children, text_color));
                    })
                    .response;
                self.record(&pane.key, response.rect);
            }
        });
    }

    // Children are recorded before their parents, so the first hit is the
    // deepest one.
    fn record(&mut self, key: &str, rect: Rect) {
        if self.outcome.hovered.is_none() && self.pointer.is_some_and(|pos| rect.contains(pos)) {
            self.outcome.hovered = Some(key.to_string());
        }
        if self.outcome.clicked.is_none() && self.click.is_some_and(|pos| rect.contains(pos)) {
            self.outcome.clicked = Some(key.to_string());
        }
    }
}

/// A flat color for the frame. Gradients paint their first stop.
fn background_fill(style: &StyleBag) -> Option<Color32> {
    match parse_background(style) {
        Background::None | Background::Image { .. } => None,
        Background::Solid { color } => parse_color(&color),
        Background::Linear { from, .. }
        | Background::Radial { from, .. }
        | Background::Conic { from, .. } => parse_color(&from),
        Background::Glass { tint, .. } => parse_color(&tint).map(|tint| tint.gamma_multiply(0.6)),
    }
}

fn border_stroke(style: &StyleBag) -> Stroke {
    match (
        style_number(style, "borderWidth"),
        style_color(style, "borderColor"),
    ) {
        (Some(width), Some(color)) if width > 0.0 => Stroke::new(width, color),
        _ => Stroke::NONE,
    }
}

fn icon_glyph(name: &str) -> &str {
    match name {
        "chat" | "message" => "\u{1F4AC}",
        "close" => "\u{2715}",
        "phone" => "\u{260E}",
        "mail" | "email" => "\u{2709}",
        "bolt" => "\u{26A1}",
        "help" => "?",
        other => other,
    }
}
