use crate::extract::{ClippedFeature, Geom, StyledFeature};

use geo::{Area, BooleanOps, BoundingRect, Coord, Intersects, MultiLineString, Rect};

fn local_bbox(bounds: &Rect<f64>, min_x: i64, min_y: i64) -> [i64; 4] {
    [
        (bounds.min().x.round() as i64) - min_x,
        (bounds.min().y.round() as i64) - min_y,
        (bounds.max().x.round() as i64) - min_x,
        (bounds.max().y.round() as i64) - min_y,
    ]
}

/// True when at least `want` distinct coordinates are present: clipping
/// can hand back slivers collapsed to a point or a repeated vertex.
fn has_distinct(coords: &[Coord<f64>], want: usize) -> bool {
    let mut seen: Vec<Coord<f64>> = Vec::with_capacity(want);
    for c in coords {
        if !seen.contains(c) {
            seen.push(*c);
            if seen.len() >= want {
                return true;
            }
        }
    }
    false
}

/// Clips line features to the block square. A line leaving and re-entering
/// the square splits into several pieces, each its own output feature.
pub fn clip_lines(
    features: &[StyledFeature],
    square: &Rect<f64>,
    min_x: i64,
    min_y: i64,
) -> Vec<ClippedFeature> {
    let square_poly = square.to_polygon();
    let mut res = Vec::new();
    for feat in features {
        let line = match &feat.feature.geometry {
            Geom::Line(l) => l,
            Geom::Polygon(_) => {
                continue;
            }
        };
        if !square.intersects(&feat.feature.bounds) {
            continue;
        }
        let parts = square_poly.clip(&MultiLineString::new(vec![line.clone()]), false);
        for part in parts {
            if !has_distinct(&part.0, 2) {
                continue;
            }
            let bounds = match part.bounding_rect() {
                Some(b) => b,
                None => {
                    continue;
                }
            };
            res.push(ClippedFeature {
                color: feat.color.clone(),
                width: feat.width,
                maxzoom: feat.maxzoom.clone(),
                bbox: local_bbox(&bounds, min_x, min_y),
                geometry: Geom::Line(part),
            });
        }
    }
    res
}

/// Clips polygon features to the block square. Pieces that only touch the
/// square's edge have zero area and are discarded.
pub fn clip_polygons(
    features: &[StyledFeature],
    square: &Rect<f64>,
    min_x: i64,
    min_y: i64,
) -> Vec<ClippedFeature> {
    let square_poly = square.to_polygon();
    let mut res = Vec::new();
    for feat in features {
        let polygon = match &feat.feature.geometry {
            Geom::Polygon(p) => p,
            Geom::Line(_) => {
                continue;
            }
        };
        if !square.intersects(&feat.feature.bounds) {
            continue;
        }
        let parts = square_poly.intersection(polygon);
        for part in parts {
            if part.unsigned_area() <= 0.0 {
                continue;
            }
            if !has_distinct(&part.exterior().0, 3) {
                continue;
            }
            let bounds = match part.bounding_rect() {
                Some(b) => b,
                None => {
                    continue;
                }
            };
            res.push(ClippedFeature {
                color: feat.color.clone(),
                width: feat.width,
                maxzoom: feat.maxzoom.clone(),
                bbox: local_bbox(&bounds, min_x, min_y),
                geometry: Geom::Polygon(part),
            });
        }
    }
    res
}
