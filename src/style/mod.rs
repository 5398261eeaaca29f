//! Sparse style property bags.
//!
//! A bag maps camelCase property names (`backgroundColor`, `borderRadius`) to
//! values. It never stores empty values: setting a property to an empty string
//! or `None` removes it. The bag is the only persisted form of a block's
//! appearance; structured views such as [`background::Background`] are derived
//! from it on demand.

use crate::block::Block;
use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeMap;

pub mod background;
pub mod css;

pub use background::{
    apply_background, detect_background_mode, parse_background, Background, BackgroundMode,
};
pub use css::to_css_declarations;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    #[serde(serialize_with = "serialize_number")]
    Number(f64),
    Text(String),
    Shadows(Vec<ShadowLayer>),
    /// Any other structured value; kept as written so save and load do not
    /// lose it.
    Other(serde_json::Value),
}

impl StyleValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Number(value) => !value.is_finite(),
            Self::Text(value) => value.trim().is_empty(),
            Self::Shadows(layers) => layers.is_empty(),
            Self::Other(value) => value.is_null(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(value) => value.trim().trim_end_matches("px").trim().parse().ok(),
            Self::Shadows(_) | Self::Other(_) => None,
        }
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for StyleValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for StyleValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<Vec<ShadowLayer>> for StyleValue {
    fn from(layers: Vec<ShadowLayer>) -> Self {
        Self::Shadows(layers)
    }
}

/// One layer of a `boxShadow` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowLayer {
    #[serde(default, serialize_with = "serialize_number")]
    pub x: f64,
    #[serde(default, serialize_with = "serialize_number")]
    pub y: f64,
    #[serde(default, serialize_with = "serialize_number")]
    pub blur: f64,
    #[serde(default, serialize_with = "serialize_number")]
    pub spread: f64,
    pub color: String,
    #[serde(default)]
    pub inset: bool,
}

// Whole numbers go back out as integers, so `12` is not rewritten as `12.0`.
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleBag(BTreeMap<String, StyleValue>);

impl StyleBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<&StyleValue> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(StyleValue::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Builder form of [`set_property`].
    pub fn with(self, name: &str, value: impl Into<StyleValue>) -> Self {
        set_property(&self, name, Some(value.into()))
    }

    fn put(&mut self, name: &str, value: Option<StyleValue>) {
        match value {
            Some(value) if !value.is_empty() => {
                let value = normalize_value(name, value);
                self.0.insert(name.to_string(), value);
            }
            _ => {
                self.0.remove(name);
            }
        }
    }

    fn remove(&mut self, name: &str) {
        self.0.remove(name);
    }
}

impl<K: Into<String>, V: Into<StyleValue>> FromIterator<(K, V)> for StyleBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = StyleBag::new();
        for (name, value) in iter {
            let name = name.into();
            bag.put(&name, Some(value.into()));
        }
        bag
    }
}

/// Returns a copy of `bag` with `name` set to `value`, or with `name`
/// removed when the value is absent or empty.
pub fn set_property(bag: &StyleBag, name: &str, value: Option<StyleValue>) -> StyleBag {
    let mut next = bag.clone();
    next.put(name, value);
    next
}

pub fn remove_properties(bag: &StyleBag, names: &[&str]) -> StyleBag {
    let mut next = bag.clone();
    for name in names {
        next.remove(name);
    }
    next
}

/// Per-key overlay: keys present in `overlay` win, every other key of `base`
/// stays visible.
pub fn merge(base: &StyleBag, overlay: &StyleBag) -> StyleBag {
    let mut merged = base.clone();
    for (name, value) in overlay.iter() {
        merged.0.insert(name.to_string(), value.clone());
    }
    merged
}

pub fn effective_style(block: &Block, hover_active: bool) -> Cow<'_, StyleBag> {
    match (&block.hover_style, hover_active) {
        (Some(hover), true) => Cow::Owned(merge(&block.style, hover)),
        _ => Cow::Borrowed(&block.style),
    }
}

pub fn is_color_property(name: &str) -> bool {
    name == "color"
        || name.ends_with("Color")
        || matches!(name, "background" | "fill" | "stroke")
}

/// Expands `#abc` to `#aabbcc`; any other value is returned unchanged.
pub fn normalize_hex_color(value: &str) -> Cow<'_, str> {
    let trimmed = value.trim();
    let Some(digits) = trimmed.strip_prefix('#') else {
        return Cow::Borrowed(value);
    };
    if digits.len() != 3 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Cow::Borrowed(value);
    }
    let mut expanded = String::with_capacity(7);
    expanded.push('#');
    for c in digits.chars() {
        let c = c.to_ascii_lowercase();
        expanded.push(c);
        expanded.push(c);
    }
    Cow::Owned(expanded)
}

fn normalize_value(name: &str, value: StyleValue) -> StyleValue {
    match value {
        StyleValue::Text(text) if is_color_property(name) => {
            StyleValue::Text(normalize_hex_color(&text).into_owned())
        }
        StyleValue::Shadows(layers) => StyleValue::Shadows(
            layers
                .into_iter()
                .map(|layer| ShadowLayer {
                    color: normalize_hex_color(&layer.color).into_owned(),
                    ..layer
                })
                .collect(),
        ),
        other => other,
    }
}
