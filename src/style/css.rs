use crate::style::background::format_number;
use crate::style::{ShadowLayer, StyleBag, StyleValue};

// Properties whose bare numbers are pixel lengths.
const LENGTH_PROPERTIES: &[&str] = &[
    "width",
    "height",
    "minWidth",
    "minHeight",
    "maxWidth",
    "maxHeight",
    "padding",
    "paddingTop",
    "paddingRight",
    "paddingBottom",
    "paddingLeft",
    "margin",
    "marginTop",
    "marginRight",
    "marginBottom",
    "marginLeft",
    "gap",
    "fontSize",
    "letterSpacing",
    "borderRadius",
    "borderWidth",
    "top",
    "right",
    "bottom",
    "left",
];

pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (index, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if index > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    // Vendor prefixes keep their leading dash: WebkitBackdropFilter.
    if name.starts_with("Webkit") || name.starts_with("Moz") {
        out.insert(0, '-');
    }
    out
}

pub fn shadow_to_css(layers: &[ShadowLayer]) -> String {
    layers
        .iter()
        .map(|layer| {
            let mut parts = Vec::with_capacity(6);
            if layer.inset {
                parts.push("inset".to_string());
            }
            for length in [layer.x, layer.y, layer.blur, layer.spread] {
                parts.push(format!("{}px", format_number(length)));
            }
            parts.push(layer.color.clone());
            parts.join(" ")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// The CSS text for one value. Structured values with no CSS form yield `None`.
pub fn value_to_css(name: &str, value: &StyleValue) -> Option<String> {
    let css = match value {
        StyleValue::Number(number) if LENGTH_PROPERTIES.contains(&name) => {
            format!("{}px", format_number(*number))
        }
        StyleValue::Number(number) => format_number(*number),
        StyleValue::Text(text) => text.trim().to_string(),
        StyleValue::Shadows(layers) => shadow_to_css(layers),
        StyleValue::Other(serde_json::Value::Bool(flag)) => flag.to_string(),
        StyleValue::Other(_) => return None,
    };
    Some(css)
}

/// Renders the bag as `property: value;` declarations in key order.
pub fn to_css_declarations(bag: &StyleBag) -> String {
    bag.iter()
        .filter_map(|(name, value)| {
            value_to_css(name, value).map(|css| format!("{}: {};", kebab_case(name), css))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_use_kebab_case_and_pixel_lengths() {
        let bag = StyleBag::new()
            .with("borderRadius", 12)
            .with("opacity", 0.5)
            .with("backgroundColor", "#fff");
        assert_eq!(
            to_css_declarations(&bag),
            "background-color: #ffffff; border-radius: 12px; opacity: 0.5;"
        );
    }

    #[test]
    fn shadow_layers_join_into_a_list() {
        let layers = vec![
            ShadowLayer {
                x: 0.0,
                y: 4.0,
                blur: 12.0,
                spread: 0.0,
                color: "rgba(0,0,0,0.2)".to_string(),
                inset: false,
            },
            ShadowLayer {
                x: 1.0,
                y: 1.0,
                blur: 0.0,
                spread: 1.5,
                color: "#fff".to_string(),
                inset: true,
            },
        ];
        let bag = StyleBag::new().with("boxShadow", layers);
        assert_eq!(
            to_css_declarations(&bag),
            "box-shadow: 0px 4px 12px 0px rgba(0,0,0,0.2), inset 1px 1px 0px 1.5px #ffffff;"
        );
    }

    #[test]
    fn structured_values_without_css_are_skipped() {
        let bag: StyleBag = serde_json::from_value(serde_json::json!({
            "transform": {"rotate": 45},
            "padding": 8
        }))
        .expect("bag should parse");
        assert_eq!(to_css_declarations(&bag), "padding: 8px;");
    }

    #[test]
    fn vendor_prefix_keeps_leading_dash() {
        assert_eq!(kebab_case("WebkitBackdropFilter"), "-webkit-backdrop-filter");
        assert_eq!(kebab_case("fontSize"), "font-size");
    }
}
