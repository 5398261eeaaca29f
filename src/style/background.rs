//! The background mini-language.
//!
//! Backgrounds are stored flat in a style bag (`background`,
//! `backgroundColor`, `backgroundImage`, `backdropFilter`, ...). The editor works
//! on the tagged [`Background`] view, which is parsed back out of the bag and
//! written with [`apply_background`]. Each variant owns a fixed set of keys and
//! applying a variant clears every key owned by the others.

use crate::style::{normalize_hex_color, set_property, StyleBag, StyleValue};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const BACKGROUND: &str = "background";
pub const BACKGROUND_COLOR: &str = "backgroundColor";
pub const BACKGROUND_IMAGE: &str = "backgroundImage";
pub const BACKGROUND_SIZE: &str = "backgroundSize";
pub const BACKGROUND_POSITION: &str = "backgroundPosition";
pub const BACKGROUND_REPEAT: &str = "backgroundRepeat";
pub const BACKDROP_FILTER: &str = "backdropFilter";

const BACKGROUND_KEYS: [&str; 7] = [
    BACKGROUND,
    BACKGROUND_COLOR,
    BACKGROUND_IMAGE,
    BACKGROUND_SIZE,
    BACKGROUND_POSITION,
    BACKGROUND_REPEAT,
    BACKDROP_FILTER,
];

pub const DEFAULT_GRADIENT_FROM: &str = "#6366f1";
pub const DEFAULT_GRADIENT_TO: &str = "#a855f7";
pub const DEFAULT_GLASS_TINT: &str = "rgba(255, 255, 255, 0.15)";
pub const DEFAULT_GLASS_BLUR: f64 = 12.0;

static BLUR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)blur\(\s*(-?[0-9]*\.?[0-9]+)\s*(px)?\s*\)").expect("blur pattern is valid")
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)^\s*url\(\s*["']?(.*?)["']?\s*\)\s*$"#).expect("url pattern is valid")
});

static ANGLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:from\s+)?(-?[0-9]*\.?[0-9]+)\s*(deg|turn|rad)?$")
        .expect("angle pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundMode {
    None,
    Solid,
    Linear,
    Radial,
    Conic,
    Image,
    Glass,
}

impl BackgroundMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Solid => "solid",
            Self::Linear => "linear",
            Self::Radial => "radial",
            Self::Conic => "conic",
            Self::Image => "image",
            Self::Glass => "glass",
        }
    }
}

/// Editable view of a bag's background. Angles are degrees, `0` pointing up
/// and increasing clockwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Background {
    None,
    Solid {
        color: String,
    },
    Linear {
        angle: f64,
        from: String,
        to: String,
    },
    Radial {
        shape: String,
        position: String,
        from: String,
        to: String,
    },
    Conic {
        angle: f64,
        from: String,
        to: String,
    },
    Image {
        url: String,
        size: String,
        position: String,
        repeat: String,
    },
    Glass {
        blur: f64,
        tint: String,
    },
}

impl Background {
    pub fn mode(&self) -> BackgroundMode {
        match self {
            Self::None => BackgroundMode::None,
            Self::Solid { .. } => BackgroundMode::Solid,
            Self::Linear { .. } => BackgroundMode::Linear,
            Self::Radial { .. } => BackgroundMode::Radial,
            Self::Conic { .. } => BackgroundMode::Conic,
            Self::Image { .. } => BackgroundMode::Image,
            Self::Glass { .. } => BackgroundMode::Glass,
        }
    }

    /// The starting parameters the editor offers when switching to `mode`.
    pub fn default_for(mode: BackgroundMode) -> Self {
        match mode {
            BackgroundMode::None => Self::None,
            BackgroundMode::Solid => Self::Solid {
                color: "#ffffff".to_string(),
            },
            BackgroundMode::Linear => Self::Linear {
                angle: 135.0,
                from: DEFAULT_GRADIENT_FROM.to_string(),
                to: DEFAULT_GRADIENT_TO.to_string(),
            },
            BackgroundMode::Radial => Self::Radial {
                shape: "circle".to_string(),
                position: "center".to_string(),
                from: DEFAULT_GRADIENT_FROM.to_string(),
                to: DEFAULT_GRADIENT_TO.to_string(),
            },
            BackgroundMode::Conic => Self::Conic {
                angle: 0.0,
                from: DEFAULT_GRADIENT_FROM.to_string(),
                to: DEFAULT_GRADIENT_TO.to_string(),
            },
            BackgroundMode::Image => Self::Image {
                url: String::new(),
                size: "cover".to_string(),
                position: "center".to_string(),
                repeat: "no-repeat".to_string(),
            },
            BackgroundMode::Glass => Self::Glass {
                blur: DEFAULT_GLASS_BLUR,
                tint: DEFAULT_GLASS_TINT.to_string(),
            },
        }
    }
}

fn background_strings(bag: &StyleBag) -> impl Iterator<Item = &str> {
    [BACKGROUND, BACKGROUND_IMAGE]
        .into_iter()
        .filter_map(|key| bag.get_str(key))
        .map(str::trim)
}

fn has_prefix(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

pub fn detect_background_mode(bag: &StyleBag) -> BackgroundMode {
    if bag
        .get_str(BACKDROP_FILTER)
        .is_some_and(|filter| BLUR_RE.is_match(filter))
    {
        return BackgroundMode::Glass;
    }

    let precedence = [
        ("linear-gradient", BackgroundMode::Linear),
        ("radial-gradient", BackgroundMode::Radial),
        ("conic-gradient", BackgroundMode::Conic),
    ];
    for (prefix, mode) in precedence {
        if background_strings(bag).any(|value| has_prefix(value, prefix)) {
            return mode;
        }
    }
    if background_strings(bag).any(|value| URL_RE.is_match(value)) {
        return BackgroundMode::Image;
    }

    if [BACKGROUND_COLOR, BACKGROUND, BACKGROUND_IMAGE]
        .into_iter()
        .any(|key| bag.contains(key))
    {
        return BackgroundMode::Solid;
    }

    BackgroundMode::None
}

/// Reconstructs the editable view from the raw bag. Unparseable parameters
/// fall back to the defaults for the detected mode.
pub fn parse_background(bag: &StyleBag) -> Background {
    let mode = detect_background_mode(bag);
    match mode {
        BackgroundMode::None => Background::None,
        BackgroundMode::Solid => Background::Solid {
            color: solid_color(bag),
        },
        BackgroundMode::Glass => {
            let blur = bag
                .get_str(BACKDROP_FILTER)
                .and_then(|filter| BLUR_RE.captures(filter))
                .and_then(|captures| captures[1].parse::<f64>().ok())
                .unwrap_or(DEFAULT_GLASS_BLUR);
            let tint = bag
                .get_str(BACKGROUND_COLOR)
                .map(str::to_string)
                .unwrap_or_else(|| DEFAULT_GLASS_TINT.to_string());
            Background::Glass { blur, tint }
        }
        BackgroundMode::Image => {
            let url = background_strings(bag)
                .find_map(|value| URL_RE.captures(value))
                .map(|captures| captures[1].to_string())
                .unwrap_or_default();
            let read = |key: &str, default: &str| {
                bag.get_str(key)
                    .map(str::to_string)
                    .unwrap_or_else(|| default.to_string())
            };
            Background::Image {
                url,
                size: read(BACKGROUND_SIZE, "cover"),
                position: read(BACKGROUND_POSITION, "center"),
                repeat: read(BACKGROUND_REPEAT, "no-repeat"),
            }
        }
        BackgroundMode::Linear | BackgroundMode::Radial | BackgroundMode::Conic => {
            parse_gradient(bag, mode).unwrap_or_else(|| Background::default_for(mode))
        }
    }
}

fn solid_color(bag: &StyleBag) -> String {
    bag.get_str(BACKGROUND_COLOR)
        .or_else(|| bag.get_str(BACKGROUND))
        .or_else(|| bag.get_str(BACKGROUND_IMAGE))
        .map(str::to_string)
        .unwrap_or_else(|| "transparent".to_string())
}

fn parse_gradient(bag: &StyleBag, mode: BackgroundMode) -> Option<Background> {
    let function = match mode {
        BackgroundMode::Linear => "linear-gradient",
        BackgroundMode::Radial => "radial-gradient",
        BackgroundMode::Conic => "conic-gradient",
        _ => return None,
    };
    let raw = background_strings(bag).find(|value| has_prefix(value, function))?;
    let inner = raw[function.len()..]
        .trim()
        .strip_prefix('(')?
        .strip_suffix(')')?;
    let args = split_top_level(inner);
    let (lead, stops): (Option<&str>, &[&str]) = match args.first() {
        Some(first) if !looks_like_color_stop(first) => (Some(*first), &args[1..]),
        _ => (None, &args[..]),
    };
    let mut stops = stops.iter().map(|stop| stop_color(stop));
    let from = stops.next()?;
    let to = stops.next().unwrap_or_else(|| from.clone());

    Some(match mode {
        BackgroundMode::Linear => Background::Linear {
            angle: lead.and_then(parse_linear_direction).unwrap_or(180.0),
            from,
            to,
        },
        BackgroundMode::Conic => Background::Conic {
            angle: lead.and_then(parse_angle).unwrap_or(0.0),
            from,
            to,
        },
        _ => {
            let (shape, position) = lead
                .map(parse_radial_lead)
                .unwrap_or_else(|| ("ellipse".to_string(), "center".to_string()));
            Background::Radial {
                shape,
                position,
                from,
                to,
            }
        }
    })
}

/// Splits on commas that are not nested inside parentheses.
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(input[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    let tail = input[start..].trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts
}

fn looks_like_color_stop(arg: &str) -> bool {
    let lowered = arg.trim().to_ascii_lowercase();
    if lowered.starts_with('#')
        || lowered.starts_with("rgb")
        || lowered.starts_with("hsl")
        || lowered.starts_with("var(")
        || lowered.starts_with("transparent")
        || lowered.starts_with("currentcolor")
    {
        return true;
    }
    // Named colors: a single word, optionally followed by a stop position.
    let mut words = lowered.split_whitespace();
    let first = words.next().unwrap_or_default();
    let is_keyword = matches!(
        first,
        "to" | "from" | "at" | "circle" | "ellipse" | "closest-side" | "closest-corner"
            | "farthest-side" | "farthest-corner"
    );
    !is_keyword && first.chars().all(|c| c.is_ascii_alphabetic()) && !first.is_empty()
}

fn stop_color(stop: &str) -> String {
    let stop = stop.trim();
    let color = match stop.rfind(')') {
        Some(close) => &stop[..=close],
        None => stop.split_whitespace().next().unwrap_or(stop),
    };
    normalize_hex_color(color).into_owned()
}

fn parse_angle(value: &str) -> Option<f64> {
    let captures = ANGLE_RE.captures(value.trim())?;
    let number: f64 = captures[1].parse().ok()?;
    let degrees = match captures.get(2).map(|unit| unit.as_str().to_ascii_lowercase()) {
        Some(unit) if unit == "turn" => number * 360.0,
        Some(unit) if unit == "rad" => number.to_degrees(),
        _ => number,
    };
    Some(degrees)
}

fn parse_linear_direction(value: &str) -> Option<f64> {
    let lowered = value.trim().to_ascii_lowercase();
    let Some(sides) = lowered.strip_prefix("to ") else {
        return parse_angle(&lowered);
    };
    let mut sides: Vec<&str> = sides.split_whitespace().collect();
    sides.sort_unstable();
    let angle = match sides.as_slice() {
        ["top"] => 0.0,
        ["right"] => 90.0,
        ["bottom"] => 180.0,
        ["left"] => 270.0,
        ["right", "top"] => 45.0,
        ["bottom", "right"] => 135.0,
        ["bottom", "left"] => 225.0,
        ["left", "top"] => 315.0,
        _ => return None,
    };
    Some(angle)
}

fn parse_radial_lead(value: &str) -> (String, String) {
    let lowered = value.trim();
    let (shape, position) = match lowered.split_once(" at ") {
        Some((shape, position)) => (shape.trim(), position.trim()),
        None => match lowered.strip_prefix("at ") {
            Some(position) => ("", position.trim()),
            None => (lowered, ""),
        },
    };
    let shape = if shape.is_empty() { "ellipse" } else { shape };
    let position = if position.is_empty() { "center" } else { position };
    (shape.to_string(), position.to_string())
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Writes `background` into `bag`, clearing every key owned by other variants.
pub fn apply_background(bag: &StyleBag, background: &Background) -> StyleBag {
    let cleared = super::remove_properties(bag, &BACKGROUND_KEYS);
    let text = |value: String| Some(StyleValue::Text(value));

    match background {
        Background::None => cleared,
        Background::Solid { color } => {
            set_property(&cleared, BACKGROUND_COLOR, text(color.clone()))
        }
        Background::Linear { angle, from, to } => set_property(
            &cleared,
            BACKGROUND,
            text(format!(
                "linear-gradient({}deg, {}, {})",
                format_number(*angle),
                normalize_hex_color(from),
                normalize_hex_color(to)
            )),
        ),
        Background::Radial {
            shape,
            position,
            from,
            to,
        } => set_property(
            &cleared,
            BACKGROUND,
            text(format!(
                "radial-gradient({} at {}, {}, {})",
                shape,
                position,
                normalize_hex_color(from),
                normalize_hex_color(to)
            )),
        ),
        Background::Conic { angle, from, to } => set_property(
            &cleared,
            BACKGROUND,
            text(format!(
                "conic-gradient(from {}deg, {}, {})",
                format_number(*angle),
                normalize_hex_color(from),
                normalize_hex_color(to)
            )),
        ),
        Background::Image {
            url,
            size,
            position,
            repeat,
        } => {
            let next = set_property(
                &cleared,
                BACKGROUND_IMAGE,
                text(format!("url(\"{}\")", url.replace('"', "%22"))),
            );
            let next = set_property(&next, BACKGROUND_SIZE, text(size.clone()));
            let next = set_property(&next, BACKGROUND_POSITION, text(position.clone()));
            set_property(&next, BACKGROUND_REPEAT, text(repeat.clone()))
        }
        Background::Glass { blur, tint } => {
            let next = set_property(
                &cleared,
                BACKDROP_FILTER,
                text(format!("blur({}px)", format_number(blur.max(0.0)))),
            );
            set_property(&next, BACKGROUND_COLOR, text(tint.clone()))
        }
    }
}

pub fn apply_solid(bag: &StyleBag, color: &str) -> StyleBag {
    apply_background(
        bag,
        &Background::Solid {
            color: color.to_string(),
        },
    )
}

pub fn apply_linear(bag: &StyleBag, angle: f64, from: &str, to: &str) -> StyleBag {
    apply_background(
        bag,
        &Background::Linear {
            angle,
            from: from.to_string(),
            to: to.to_string(),
        },
    )
}

pub fn apply_radial(bag: &StyleBag, shape: &str, position: &str, from: &str, to: &str) -> StyleBag {
    apply_background(
        bag,
        &Background::Radial {
            shape: shape.to_string(),
            position: position.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        },
    )
}

pub fn apply_conic(bag: &StyleBag, angle: f64, from: &str, to: &str) -> StyleBag {
    apply_background(
        bag,
        &Background::Conic {
            angle,
            from: from.to_string(),
            to: to.to_string(),
        },
    )
}

pub fn apply_image(bag: &StyleBag, url: &str) -> StyleBag {
    let Background::Image {
        size,
        position,
        repeat,
        ..
    } = Background::default_for(BackgroundMode::Image)
    else {
        return bag.clone();
    };
    apply_background(
        bag,
        &Background::Image {
            url: url.to_string(),
            size,
            position,
            repeat,
        },
    )
}

pub fn apply_glass(bag: &StyleBag, blur: f64, tint: &str) -> StyleBag {
    apply_background(
        bag,
        &Background::Glass {
            blur,
            tint: tint.to_string(),
        },
    )
}

pub fn clear_background(bag: &StyleBag) -> StyleBag {
    apply_background(bag, &Background::None)
}
