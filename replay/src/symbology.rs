use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use model::TimeUnit;

/// RGBA, each channel in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const CYAN: Color = Color::rgb(0.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Color {
        Color { r, g, b, a: 1.0 }
    }

    pub fn rgb_u8(r: u8, g: u8, b: u8) -> Color {
        Color::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    pub fn alpha(self, a: f32) -> Color {
        Color { a, ..self }
    }

    /// `#rgb`, `#rrggbb`, `#rrggbbaa`, or a handful of CSS names
    pub fn parse(x: &str) -> Result<Color> {
        let x = x.trim();
        let named = match x.to_ascii_lowercase().as_str() {
            "white" => Some(Color::WHITE),
            "black" => Some(Color::rgb(0.0, 0.0, 0.0)),
            "cyan" | "aqua" => Some(Color::CYAN),
            "red" => Some(Color::rgb(1.0, 0.0, 0.0)),
            "lime" => Some(Color::rgb(0.0, 1.0, 0.0)),
            "blue" => Some(Color::rgb(0.0, 0.0, 1.0)),
            "yellow" => Some(Color::rgb(1.0, 1.0, 0.0)),
            "magenta" | "fuchsia" => Some(Color::rgb(1.0, 0.0, 1.0)),
            "orange" => Some(Color::rgb_u8(255, 165, 0)),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }

        let hex = match x.strip_prefix('#') {
            Some(hex) => hex,
            None => bail!("Unknown color {x}"),
        };
        let channel = |idx: usize| -> Result<u8> {
            let digits = hex
                .get(idx..idx + 2)
                .ok_or_else(|| anyhow!("Bad color {x}"))?;
            u8::from_str_radix(digits, 16).map_err(|err| anyhow!("Bad color {x}: {err}"))
        };
        match hex.len() {
            3 => {
                let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
                Color::parse(&format!("#{expanded}"))
            }
            6 => Ok(Color::rgb_u8(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Color::rgb_u8(channel(0)?, channel(2)?, channel(4)?)
                .alpha(channel(6)? as f32 / 255.0)),
            _ => bail!("Bad color {x}"),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = anyhow::Error;

    fn try_from(x: String) -> Result<Color> {
        Color::parse(&x)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetSpec {
    pub kind: String,
    pub url: String,
    /// Animate the image, like wings flapping
    #[serde(default)]
    pub flap: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageAsset {
    pub kind: String,
    pub url: String,
    pub image_index: usize,
    pub flap: bool,
}

/// A named bundle of visual parameters for a track's marker and line.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Symbol {
    pub image_kind: String,
    pub size: f64,
    pub fill: Color,
    pub line_color: Color,
    pub line_width: f64,
    #[serde(default)]
    pub line_style: LineStyle,
    /// How long the line fades after the track stops, in progress units
    pub cutoff_time: f64,
    pub opacity_at_cutoff: f64,
}

/// What the renderer needs to draw a marker
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerStyle {
    pub image_index: usize,
    pub flap: bool,
    pub size: f64,
    pub color: Color,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolylineStyle {
    pub color: Color,
    pub width: f64,
    pub line_style: LineStyle,
    pub cutoff_time: f64,
    pub opacity_at_cutoff: f64,
}

pub struct SymbolSet {
    assets: Vec<ImageAsset>,
    symbols: BTreeMap<String, Symbol>,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self {
            assets: Vec::new(),
            symbols: BTreeMap::new(),
        }
    }

    /// Orange circles that turn into birds while moving and cyan when selected. Cutoff times are
    /// 3 minutes, expressed in `unit`.
    pub fn defaults(unit: TimeUnit) -> Self {
        let mut set = Self::new();
        set.register_assets(&default_assets());

        let cutoff_time = TimeUnit::Minutes.convert(3.0, unit);
        let orange = Color::rgb_u8(0xd9, 0x83, 0x2e);
        set.set_symbol(
            "default",
            Symbol {
                image_kind: "circle".to_string(),
                size: 14.0,
                fill: orange,
                line_color: Color::WHITE,
                line_width: 8.0,
                line_style: LineStyle::Solid,
                cutoff_time,
                opacity_at_cutoff: 0.1,
            },
        );
        set.set_symbol(
            "moving",
            Symbol {
                image_kind: "bird".to_string(),
                size: 14.0,
                fill: orange,
                line_color: Color::WHITE,
                line_width: 8.0,
                line_style: LineStyle::Solid,
                cutoff_time,
                opacity_at_cutoff: 0.1,
            },
        );
        set.set_symbol(
            "selected",
            Symbol {
                image_kind: "bird".to_string(),
                size: 28.0,
                fill: Color::CYAN,
                line_color: Color::CYAN,
                line_width: 8.0,
                line_style: LineStyle::Solid,
                cutoff_time,
                opacity_at_cutoff: 0.1,
            },
        );
        set
    }

    /// Image indices follow registration order. Registering a kind again replaces its URL but
    /// keeps the index.
    pub fn register_assets(&mut self, specs: &[AssetSpec]) {
        for spec in specs {
            if let Some(existing) = self.assets.iter_mut().find(|a| a.kind == spec.kind) {
                existing.url = spec.url.clone();
                existing.flap = spec.flap;
                continue;
            }
            self.assets.push(ImageAsset {
                kind: spec.kind.clone(),
                url: spec.url.clone(),
                image_index: self.assets.len(),
                flap: spec.flap,
            });
        }
    }

    pub fn assets(&self) -> &[ImageAsset] {
        &self.assets
    }

    pub fn set_symbol(&mut self, name: &str, mut symbol: Symbol) {
        if !self.assets.iter().any(|a| a.kind == symbol.image_kind) {
            warn!(
                "Symbol {name} uses image {}, which isn't registered; it won't be applied",
                symbol.image_kind
            );
        }
        symbol.cutoff_time = symbol.cutoff_time.max(0.0);
        symbol.opacity_at_cutoff = symbol.opacity_at_cutoff.clamp(0.0, 1.0);
        self.symbols.insert(name.to_string(), symbol);
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// None if the symbol or its image is unknown.
    pub fn style(&self, name: &str) -> Option<(MarkerStyle, PolylineStyle)> {
        let symbol = self.symbols.get(name)?;
        let asset = self.assets.iter().find(|a| a.kind == symbol.image_kind)?;
        Some((
            MarkerStyle {
                image_index: asset.image_index,
                flap: asset.flap,
                size: symbol.size,
                color: symbol.fill,
            },
            PolylineStyle {
                color: symbol.line_color,
                width: symbol.line_width,
                line_style: symbol.line_style,
                cutoff_time: symbol.cutoff_time,
                opacity_at_cutoff: symbol.opacity_at_cutoff,
            },
        ))
    }
}

pub fn default_assets() -> Vec<AssetSpec> {
    vec![
        AssetSpec {
            kind: "bird".to_string(),
            url: "textures/osprey.png".to_string(),
            flap: true,
        },
        AssetSpec {
            kind: "circle".to_string(),
            url: "textures/full-circle.png".to_string(),
            flap: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_colors() {
        assert_eq!(Color::parse("cyan").unwrap(), Color::CYAN);
        assert_eq!(Color::parse("#ffffff").unwrap(), Color::WHITE);
        assert_eq!(Color::parse("#fff").unwrap(), Color::WHITE);
        assert_eq!(Color::parse("#00ff0080").unwrap().a, 128.0 / 255.0);
        assert!(Color::parse("#12345").is_err());
        assert!(Color::parse("#gggggg").is_err());
        assert!(Color::parse("mauve-ish").is_err());
    }

    #[test]
    fn asset_indices() {
        let mut set = SymbolSet::defaults(TimeUnit::Seconds);
        assert_eq!(set.assets()[0].kind, "bird");
        assert_eq!(set.assets()[1].image_index, 1);
        set.register_assets(&[
            AssetSpec {
                kind: "circle".to_string(),
                url: "other.png".to_string(),
                flap: false,
            },
            AssetSpec {
                kind: "square".to_string(),
                url: "square.png".to_string(),
                flap: false,
            },
        ]);
        assert_eq!(set.assets().len(), 3);
        assert_eq!(set.assets()[1].url, "other.png");
        assert_eq!(set.assets()[2].image_index, 2);
    }

    #[test]
    fn default_symbols() {
        let set = SymbolSet::defaults(TimeUnit::Seconds);
        let default = set.get("default").unwrap();
        assert_eq!(default.cutoff_time, 180.0);
        assert_eq!(default.opacity_at_cutoff, 0.1);
        let (marker, line) = set.style("selected").unwrap();
        assert_eq!(marker.color, Color::CYAN);
        assert_eq!(marker.image_index, 0);
        assert!(marker.flap);
        assert_eq!(line.color, Color::CYAN);
        assert!(set.style("sparkly").is_none());
    }

    #[test]
    fn symbols_with_unknown_images_have_no_style() {
        let mut set = SymbolSet::defaults(TimeUnit::Minutes);
        let mut symbol = set.get("default").unwrap().clone();
        symbol.image_kind = "plane".to_string();
        symbol.opacity_at_cutoff = 3.0;
        set.set_symbol("plane", symbol);
        assert!(set.style("plane").is_none());
        assert_eq!(set.get("plane").unwrap().opacity_at_cutoff, 1.0);
    }
}
