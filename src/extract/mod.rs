mod default_style;

pub mod clip;
pub mod input;
pub mod process;
pub mod render;
pub mod rules;
pub mod style;
pub mod tilefile;

pub use crate::extract::process::{run_extract, ExtractOptions, ExtractResult};
pub use crate::extract::rules::ExtractConfig;
pub use crate::extract::style::StyleConfig;

use geo::{BoundingRect, LineString, Polygon, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeomKind {
    Line,
    Polygon,
}

/// One simple geometry part: multi part inputs are decomposed before this
/// point, so a feature carries exactly one line or one polygon.
#[derive(Debug, Clone, PartialEq)]
pub enum Geom {
    Line(LineString<f64>),
    Polygon(Polygon<f64>),
}

impl Geom {
    pub fn kind(&self) -> GeomKind {
        match self {
            Geom::Line(_) => GeomKind::Line,
            Geom::Polygon(_) => GeomKind::Polygon,
        }
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        match self {
            Geom::Line(l) => l.bounding_rect(),
            Geom::Polygon(p) => p.bounding_rect(),
        }
    }
}

/// A raw feature matched against the type rules, geometry decomposed to a
/// single part and known non degenerate.
#[derive(Debug, Clone)]
pub struct ClassifiedFeature {
    pub id: String,
    pub feature_type: String,
    pub z_order: Option<i64>,
    pub tags: Vec<String>,
    pub geometry: Geom,
    pub bounds: Rect<f64>,
}

/// A classified feature with its rendering attributes resolved. Styling
/// happens once, before the blocks are fanned out, so the styled set is
/// shared read only by every block worker.
#[derive(Debug, Clone)]
pub struct StyledFeature {
    pub feature: ClassifiedFeature,
    pub color: String,
    pub width: Option<f64>,
    pub maxzoom: String,
}

/// One piece of a styled feature inside a single block: the geometry
/// restricted to the block square, with the bounding box already shifted
/// to block local coordinates. Lives only while its block is written.
#[derive(Debug, Clone)]
pub struct ClippedFeature {
    pub color: String,
    pub width: Option<f64>,
    pub maxzoom: String,
    pub geometry: Geom,
    pub bbox: [i64; 4],
}

pub enum OtherData {
    Messages(Vec<String>),
}

pub type Timings = crate::utils::Timings<OtherData>;
