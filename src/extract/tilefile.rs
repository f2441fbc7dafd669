use crate::extract::{ClippedFeature, Geom};
use crate::mapblocks::BlockId;

use geo::Coord;

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Result, Write};
use std::path::PathBuf;

fn ring_coords(geometry: &Geom) -> &[Coord<f64>] {
    match geometry {
        Geom::Line(l) => &l.0,
        Geom::Polygon(p) => &p.exterior().0,
    }
}

fn write_bbox<W: Write>(out: &mut W, bbox: &[i64; 4]) -> Result<()> {
    write!(out, "bbox:{},{},{},{}\n", bbox[0], bbox[1], bbox[2], bbox[3])
}

fn write_coords<W: Write>(
    out: &mut W,
    coords: &[Coord<f64>],
    min_x: i64,
    min_y: i64,
) -> Result<()> {
    write!(out, "coords:")?;
    for c in coords {
        write!(
            out,
            "{},{};",
            (c.x.round() as i64) - min_x,
            (c.y.round() as i64) - min_y
        )?;
    }
    write!(out, "\n")
}

/// Serializes one block's clipped features. Plain ascii, line oriented,
/// coordinates shifted to block local integers. Polygons write their
/// outer ring only. Output bytes are a pure function of the input order.
pub fn encode_block<W: Write>(
    out: &mut W,
    min_x: i64,
    min_y: i64,
    polygons: &[ClippedFeature],
    lines: &[ClippedFeature],
) -> Result<()> {
    write!(out, "Polygons:{}\n", polygons.len())?;
    for p in polygons {
        write!(out, "{}\n", p.color)?;
        write!(out, "{}\n", p.maxzoom)?;
        write_bbox(out, &p.bbox)?;
        write_coords(out, ring_coords(&p.geometry), min_x, min_y)?;
    }
    write!(out, "Polylines:{}\n", lines.len())?;
    for l in lines {
        write!(out, "{}\n", l.color)?;
        match l.width {
            Some(w) => {
                write!(out, "{}\n", w)?;
            }
            None => {
                write!(out, "\n")?;
            }
        }
        write!(out, "{}\n", l.maxzoom)?;
        write_bbox(out, &l.bbox)?;
        write_coords(out, ring_coords(&l.geometry), min_x, min_y)?;
    }
    Ok(())
}

/// Writes block files under the map root, one folder per 16 x 16 group.
pub struct TileWriter {
    root: PathBuf,
}

impl TileWriter {
    pub fn new(root: &str) -> TileWriter {
        TileWriter {
            root: PathBuf::from(root),
        }
    }

    pub fn block_path(&self, block: &BlockId) -> PathBuf {
        self.root.join(block.folder_name()).join(block.file_name())
    }

    pub fn write_block(
        &self,
        block: &BlockId,
        polygons: &[ClippedFeature],
        lines: &[ClippedFeature],
    ) -> Result<()> {
        let folder = self.root.join(block.folder_name());
        create_dir_all(&folder)?;
        let (min_x, min_y) = block.min();
        let outf = File::create(folder.join(block.file_name()))?;
        let mut out = BufWriter::new(outf);
        encode_block(&mut out, min_x, min_y, polygons, lines)?;
        out.flush()
    }
}

#[cfg(test)]
pub(crate) struct ParsedFeature {
    pub color: String,
    pub width: Option<f64>,
    pub maxzoom: String,
    pub bbox: [i64; 4],
    pub coords: Vec<(i64, i64)>,
}

#[cfg(test)]
pub(crate) fn parse_block(text: &str) -> (Vec<ParsedFeature>, Vec<ParsedFeature>) {
    fn parse_bbox(line: &str) -> [i64; 4] {
        let vv: Vec<i64> = line
            .strip_prefix("bbox:")
            .unwrap()
            .split(',')
            .map(|v| v.parse().unwrap())
            .collect();
        [vv[0], vv[1], vv[2], vv[3]]
    }
    fn parse_coords(line: &str) -> Vec<(i64, i64)> {
        line.strip_prefix("coords:")
            .unwrap()
            .split(';')
            .filter(|p| !p.is_empty())
            .map(|p| {
                let mut it = p.split(',');
                (
                    it.next().unwrap().parse().unwrap(),
                    it.next().unwrap().parse().unwrap(),
                )
            })
            .collect()
    }

    let mut lines_it = text.lines();
    let np: usize = lines_it
        .next()
        .unwrap()
        .strip_prefix("Polygons:")
        .unwrap()
        .parse()
        .unwrap();
    let mut polygons = Vec::new();
    for _ in 0..np {
        polygons.push(ParsedFeature {
            color: String::from(lines_it.next().unwrap()),
            width: None,
            maxzoom: String::from(lines_it.next().unwrap()),
            bbox: parse_bbox(lines_it.next().unwrap()),
            coords: parse_coords(lines_it.next().unwrap()),
        });
    }
    let nl: usize = lines_it
        .next()
        .unwrap()
        .strip_prefix("Polylines:")
        .unwrap()
        .parse()
        .unwrap();
    let mut polylines = Vec::new();
    for _ in 0..nl {
        let color = String::from(lines_it.next().unwrap());
        let width_str = lines_it.next().unwrap();
        let width = if width_str.is_empty() {
            None
        } else {
            Some(width_str.parse().unwrap())
        };
        polylines.push(ParsedFeature {
            color: color,
            width: width,
            maxzoom: String::from(lines_it.next().unwrap()),
            bbox: parse_bbox(lines_it.next().unwrap()),
            coords: parse_coords(lines_it.next().unwrap()),
        });
    }
    (polygons, polylines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    fn clipped_polygon() -> ClippedFeature {
        ClippedFeature {
            color: String::from("0x3C67"),
            width: None,
            maxzoom: String::from("12"),
            bbox: [100, 200, 300, 400],
            geometry: Geom::Polygon(Polygon::new(
                LineString::from(vec![
                    (100.0, 200.0),
                    (300.0, 200.0),
                    (300.0, 400.0),
                    (100.0, 400.0),
                    (100.0, 200.0),
                ]),
                Vec::new(),
            )),
        }
    }

    fn clipped_line(width: Option<f64>) -> ClippedFeature {
        ClippedFeature {
            color: String::from("0xFD20"),
            width: width,
            maxzoom: String::from("11"),
            bbox: [0, 0, 50, 25],
            geometry: Geom::Line(LineString::from(vec![(0.0, 0.0), (50.0, 25.0)])),
        }
    }

    #[test]
    fn test_encode_deterministic() {
        let polygons = vec![clipped_polygon()];
        let lines = vec![clipped_line(Some(14.0)), clipped_line(None)];
        let mut first: Vec<u8> = Vec::new();
        encode_block(&mut first, 0, 0, &polygons, &lines).unwrap();
        let mut second: Vec<u8> = Vec::new();
        encode_block(&mut second, 0, 0, &polygons, &lines).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_encode_round_trip() {
        let polygons = vec![clipped_polygon()];
        let lines = vec![clipped_line(Some(14.0)), clipped_line(None)];
        let mut buf: Vec<u8> = Vec::new();
        encode_block(&mut buf, 0, 0, &polygons, &lines).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let (pp, ll) = parse_block(&text);
        assert_eq!(pp.len(), 1);
        assert_eq!(ll.len(), 2);
        assert_eq!(pp[0].color, "0x3C67");
        assert_eq!(pp[0].maxzoom, "12");
        assert_eq!(pp[0].bbox, [100, 200, 300, 400]);
        assert_eq!(pp[0].coords.len(), 5);
        assert_eq!(pp[0].coords[0], (100, 200));
        assert_eq!(ll[0].width, Some(14.0));
        assert_eq!(ll[1].width, None);
        assert_eq!(ll[0].maxzoom, "11");
        assert_eq!(ll[0].coords, vec![(0, 0), (50, 25)]);
    }

    #[test]
    fn test_encode_shifts_to_block_local() {
        let lines = vec![ClippedFeature {
            color: String::from("0xFFFF"),
            width: Some(6.0),
            maxzoom: String::new(),
            bbox: [104, 10, 204, 20],
            geometry: Geom::Line(LineString::from(vec![(4200.0, 10.0), (4300.0, 20.0)])),
        }];
        let mut buf: Vec<u8> = Vec::new();
        encode_block(&mut buf, 4096, 0, &[], &lines).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let (_, ll) = parse_block(&text);
        assert_eq!(ll[0].coords, vec![(104, 10), (204, 20)]);
        // empty maxzoom survives as an empty line
        assert_eq!(ll[0].maxzoom, "");
    }
}
