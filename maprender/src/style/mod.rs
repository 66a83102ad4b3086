//! Styles: named lists of rules, each holding symbolizers.
//!
//! Styling is intentionally small: a rule applies to every feature of the
//! layer that references its style, and each symbolizer draws one aspect of
//! the feature (area fill, outline, or a marker disc).

mod color;

pub use color::Color;

use crate::geometry::GeometryType;

/// Fills polygon areas.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonSymbolizer {
    pub fill: Color,
    pub fill_opacity: f32,
}

impl Default for PolygonSymbolizer {
    fn default() -> Self {
        Self {
            fill: Color::rgb(128, 128, 128),
            fill_opacity: 1.0,
        }
    }
}

/// Strokes lines and polygon outlines.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSymbolizer {
    pub stroke: Color,
    pub stroke_width: f32,
    pub stroke_opacity: f32,
}

impl Default for LineSymbolizer {
    fn default() -> Self {
        Self {
            stroke: Color::rgb(0, 0, 0),
            stroke_width: 1.0,
            stroke_opacity: 1.0,
        }
    }
}

/// Draws a disc at each point position.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSymbolizer {
    pub fill: Color,
    /// Radius in pixels.
    pub radius: f32,
    pub opacity: f32,
}

impl Default for MarkerSymbolizer {
    fn default() -> Self {
        Self {
            fill: Color::rgb(0, 0, 255),
            radius: 5.0,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Symbolizer {
    Polygon(PolygonSymbolizer),
    Line(LineSymbolizer),
    Marker(MarkerSymbolizer),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rule {
    pub symbolizers: Vec<Symbolizer>,
}

impl Rule {
    pub fn new(symbolizers: Vec<Symbolizer>) -> Self {
        Self { symbolizers }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub rules: Vec<Rule>,
}

impl Style {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// A single-rule style.
    pub fn single(symbolizer: Symbolizer) -> Self {
        Self::new(vec![Rule::new(vec![symbolizer])])
    }

    /// Used for layers that reference no style at all.
    pub fn default_for(geometry: GeometryType) -> Self {
        match geometry {
            GeometryType::Point => Self::single(Symbolizer::Marker(MarkerSymbolizer::default())),
            GeometryType::Linestring => Self::single(Symbolizer::Line(LineSymbolizer::default())),
            GeometryType::Polygon | GeometryType::Collection => Self::new(vec![Rule::new(vec![
                Symbolizer::Polygon(PolygonSymbolizer::default()),
                Symbolizer::Line(LineSymbolizer::default()),
            ])]),
        }
    }

    pub fn symbolizers(&self) -> impl Iterator<Item = &Symbolizer> {
        self.rules.iter().flat_map(|r| r.symbolizers.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_point_style_is_marker() {
        let style = Style::default_for(GeometryType::Point);
        assert!(matches!(
            style.symbolizers().next(),
            Some(Symbolizer::Marker(_))
        ));
    }

    #[test]
    fn test_default_polygon_style_fills_and_outlines() {
        let style = Style::default_for(GeometryType::Polygon);
        assert_eq!(style.symbolizers().count(), 2);
    }
}
