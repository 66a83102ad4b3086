//! XML stylesheet loading and saving.
//!
//! ```xml
//! <Map srs="+proj=longlat +datum=WGS84" background-color="#ffffff" buffer-size="16">
//!   <Style name="pois">
//!     <Rule>
//!       <MarkersSymbolizer fill="#ff0000" width="8"/>
//!     </Rule>
//!   </Style>
//!   <Layer name="pois" srs="epsg:4326">
//!     <StyleName>pois</StyleName>
//!     <Datasource>
//!       <Parameter name="type">geojson</Parameter>
//!       <Parameter name="file">pois.geojson</Parameter>
//!     </Datasource>
//!   </Layer>
//! </Map>
//! ```
//!
//! Unknown elements are ignored. A stylesheet is parsed completely before the
//! map is touched, so a failed load leaves the map unchanged.

use std::fmt::{self, Write as _};
use std::path::Path;
use std::str::FromStr;

use roxmltree::{Document, Node};
use tracing::{debug, info};

use super::{Layer, Map};
use crate::datasource::{self, Parameters};
use crate::error::{MapError, MapResult};
use crate::style::{
    Color, LineSymbolizer, MarkerSymbolizer, PolygonSymbolizer, Rule, Style, Symbolizer,
};

struct Stylesheet {
    srs: Option<String>,
    background: Option<Color>,
    buffer_size: Option<i32>,
    styles: Vec<(String, Style)>,
    layers: Vec<Layer>,
}

impl Map {
    /// Loads a stylesheet file, resolving relative datasource files against
    /// the stylesheet's directory.
    pub fn load(&mut self, path: &Path) -> MapResult<()> {
        let xml = std::fs::read_to_string(path).map_err(|e| {
            MapError::Config(format!(
                "failed to read stylesheet '{}': {}",
                path.display(),
                e
            ))
        })?;
        self.load_from_string(&xml, path.parent())?;
        info!(path = %path.display(), layers = self.layers.len(), "Loaded stylesheet");
        Ok(())
    }

    /// Loads a stylesheet from memory; styles and layers are appended.
    pub fn load_from_string(&mut self, xml: &str, base_path: Option<&Path>) -> MapResult<()> {
        let sheet = parse(xml, base_path)?;
        if let Some(srs) = sheet.srs {
            self.srs = srs;
        }
        if sheet.background.is_some() {
            self.background = sheet.background;
        }
        if let Some(buffer_size) = sheet.buffer_size {
            self.buffer_size = buffer_size;
        }
        for (name, style) in sheet.styles {
            self.styles.insert(name, style);
        }
        self.layers.extend(sheet.layers);
        Ok(())
    }

    pub fn save(&self, path: &Path) -> MapResult<()> {
        std::fs::write(path, self.to_xml()?).map_err(|e| {
            MapError::Config(format!(
                "failed to write stylesheet '{}': {}",
                path.display(),
                e
            ))
        })?;
        debug!(path = %path.display(), "Saved stylesheet");
        Ok(())
    }

    /// Serializes the map as a stylesheet.
    pub fn to_xml(&self) -> MapResult<String> {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        write_map(&mut out, self)
            .map_err(|e| MapError::Config(format!("failed to serialize stylesheet: {}", e)))?;
        Ok(out)
    }
}

fn write_map(out: &mut String, map: &Map) -> fmt::Result {
    write!(out, "<Map srs=\"{}\"", escape(&map.srs))?;
    if let Some(bg) = map.background {
        write!(out, " background-color=\"{}\"", bg)?;
    }
    if map.buffer_size != 0 {
        write!(out, " buffer-size=\"{}\"", map.buffer_size)?;
    }
    out.push_str(">\n");

    for (name, style) in &map.styles {
        writeln!(out, "  <Style name=\"{}\">", escape(name))?;
        for rule in &style.rules {
            out.push_str("    <Rule>\n");
            for symbolizer in &rule.symbolizers {
                out.push_str("      ");
                write_symbolizer(out, symbolizer)?;
                out.push('\n');
            }
            out.push_str("    </Rule>\n");
        }
        out.push_str("  </Style>\n");
    }

    for layer in &map.layers {
        writeln!(
            out,
            "  <Layer name=\"{}\" srs=\"{}\">",
            escape(&layer.name),
            escape(&layer.srs)
        )?;
        for style in &layer.styles {
            writeln!(out, "    <StyleName>{}</StyleName>", escape(style))?;
        }
        if let Some(ds) = &layer.datasource {
            out.push_str("    <Datasource>\n");
            for (key, value) in ds.params() {
                writeln!(
                    out,
                    "      <Parameter name=\"{}\">{}</Parameter>",
                    escape(key),
                    escape(value)
                )?;
            }
            out.push_str("    </Datasource>\n");
        }
        out.push_str("  </Layer>\n");
    }
    out.push_str("</Map>\n");
    Ok(())
}

fn write_symbolizer(out: &mut String, symbolizer: &Symbolizer) -> fmt::Result {
    match symbolizer {
        Symbolizer::Polygon(s) => write!(
            out,
            "<PolygonSymbolizer fill=\"{}\" fill-opacity=\"{}\"/>",
            s.fill, s.fill_opacity
        ),
        Symbolizer::Line(s) => write!(
            out,
            "<LineSymbolizer stroke=\"{}\" stroke-width=\"{}\" stroke-opacity=\"{}\"/>",
            s.stroke, s.stroke_width, s.stroke_opacity
        ),
        Symbolizer::Marker(s) => write!(
            out,
            "<MarkersSymbolizer fill=\"{}\" width=\"{}\" opacity=\"{}\"/>",
            s.fill,
            s.radius * 2.0,
            s.opacity
        ),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn parse(xml: &str, base_path: Option<&Path>) -> MapResult<Stylesheet> {
    let doc = Document::parse(xml)
        .map_err(|e| MapError::Config(format!("failed to parse stylesheet: {}", e)))?;
    let root = doc.root_element();
    if root.tag_name().name() != "Map" {
        return Err(MapError::Config(format!(
            "expected <Map> root element, found <{}>",
            root.tag_name().name()
        )));
    }

    let mut sheet = Stylesheet {
        srs: root.attribute("srs").map(str::to_string),
        background: optional_attr(root, "background-color")?,
        buffer_size: optional_attr(root, "buffer-size")?,
        styles: Vec::new(),
        layers: Vec::new(),
    };

    for child in root.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "Style" => sheet.styles.push(parse_style(child)?),
            "Layer" => sheet.layers.push(parse_layer(child, base_path)?),
            other => debug!(element = other, "Ignoring unknown stylesheet element"),
        }
    }
    Ok(sheet)
}

fn parse_style(node: Node) -> MapResult<(String, Style)> {
    let name = required_attr(node, "name")?;
    let mut style = Style::default();
    for rule_node in node.children().filter(|n| n.has_tag_name("Rule")) {
        let mut rule = Rule::default();
        for sym in rule_node.children().filter(Node::is_element) {
            if let Some(symbolizer) = parse_symbolizer(sym)? {
                rule.symbolizers.push(symbolizer);
            }
        }
        style.rules.push(rule);
    }
    Ok((name.to_string(), style))
}

fn parse_symbolizer(node: Node) -> MapResult<Option<Symbolizer>> {
    Ok(Some(match node.tag_name().name() {
        "PolygonSymbolizer" => {
            let d = PolygonSymbolizer::default();
            Symbolizer::Polygon(PolygonSymbolizer {
                fill: optional_attr(node, "fill")?.unwrap_or(d.fill),
                fill_opacity: optional_attr(node, "fill-opacity")?.unwrap_or(d.fill_opacity),
            })
        }
        "LineSymbolizer" => {
            let d = LineSymbolizer::default();
            Symbolizer::Line(LineSymbolizer {
                stroke: optional_attr(node, "stroke")?.unwrap_or(d.stroke),
                stroke_width: optional_attr(node, "stroke-width")?.unwrap_or(d.stroke_width),
                stroke_opacity: optional_attr(node, "stroke-opacity")?
                    .unwrap_or(d.stroke_opacity),
            })
        }
        "MarkersSymbolizer" | "PointSymbolizer" => {
            let d = MarkerSymbolizer::default();
            let width: Option<f32> = optional_attr(node, "width")?;
            Symbolizer::Marker(MarkerSymbolizer {
                fill: optional_attr(node, "fill")?.unwrap_or(d.fill),
                radius: width.map(|w| w / 2.0).unwrap_or(d.radius),
                opacity: optional_attr(node, "opacity")?.unwrap_or(d.opacity),
            })
        }
        other => {
            debug!(symbolizer = other, "Ignoring unsupported symbolizer");
            return Ok(None);
        }
    }))
}

fn parse_layer(node: Node, base_path: Option<&Path>) -> MapResult<Layer> {
    let mut layer = Layer::new(required_attr(node, "name")?);
    if let Some(srs) = node.attribute("srs") {
        layer.srs = srs.to_string();
    }
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "StyleName" => {
                if let Some(name) = child.text().map(str::trim).filter(|t| !t.is_empty()) {
                    layer.styles.push(name.to_string());
                }
            }
            "Datasource" => {
                let mut params = Parameters::new();
                for param in child.children().filter(|n| n.has_tag_name("Parameter")) {
                    let key = required_attr(param, "name")?;
                    params.insert(key.to_string(), param.text().unwrap_or("").trim().to_string());
                }
                layer.set_datasource(datasource::create(&params, base_path)?);
            }
            _ => {}
        }
    }
    Ok(layer)
}

fn required_attr<'a>(node: Node<'a, '_>, name: &str) -> MapResult<&'a str> {
    node.attribute(name).ok_or_else(|| {
        MapError::Config(format!(
            "missing required attribute '{}' on <{}>",
            name,
            node.tag_name().name()
        ))
    })
}

fn optional_attr<T: FromStr>(node: Node, name: &str) -> MapResult<Option<T>> {
    match node.attribute(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            MapError::Config(format!(
                "failed to parse attribute '{}' of <{}>: '{}'",
                name,
                node.tag_name().name(),
                raw
            ))
        }),
    }
}
