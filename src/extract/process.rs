use crate::callback::{CallFinish, Callback, CallbackMerge};
use crate::extract::clip::{clip_lines, clip_polygons};
use crate::extract::input::read_features;
use crate::extract::render::render_block;
use crate::extract::rules::{classify_features, ExtractConfig};
use crate::extract::style::{style_features, StyleConfig};
use crate::extract::tilefile::TileWriter;
use crate::extract::{GeomKind, OtherData, StyledFeature, Timings};
use crate::logging::messenger;
use crate::mapblocks::{block_square, BlockId, PlanarRegion};
use crate::mercator::Bbox;
use crate::message;
use crate::utils::{LogTimes, MergeTimings, ThreadTimer};

use std::fs::create_dir_all;
use std::io::{Error, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub struct ExtractOptions {
    pub outdir: String,
    pub render: bool,
    pub numchan: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractResult {
    pub total: usize,
    pub processed: usize,
    pub empty: usize,
}

/// The only mutable state shared between block workers: blocks with
/// output and blocks without. Every enumerated block lands in exactly one
/// of the two, whatever order the workers finish in, so the pair always
/// sums to the enumerated total. Workers get an explicit handle, nothing
/// goes through globals.
pub struct ProgressCounters {
    total: usize,
    counts: Mutex<(usize, usize)>,
}

impl ProgressCounters {
    pub fn new(total: usize) -> ProgressCounters {
        ProgressCounters {
            total: total,
            counts: Mutex::new((0, 0)),
        }
    }

    pub fn add_processed(&self) {
        self.add(true);
    }

    pub fn add_empty(&self) {
        self.add(false);
    }

    fn add(&self, processed: bool) {
        let mut counts = self.counts.lock().unwrap();
        if processed {
            counts.0 += 1;
        } else {
            counts.1 += 1;
        }
        if self.total > 0 {
            let done = counts.0 + counts.1;
            messenger().progress_percent(100.0 * (done as f64) / (self.total as f64));
        }
    }

    pub fn totals(&self) -> (usize, usize) {
        let counts = self.counts.lock().unwrap();
        (counts.0, counts.1)
    }
}

/// Block worker: clips the shared styled set against each block it is
/// handed and writes the block file (and debug image when asked). The
/// first io error is latched, later blocks are skipped, and the error
/// fails the run from `finish`.
struct WriteBlocks {
    lines: Arc<Vec<StyledFeature>>,
    polygons: Arc<Vec<StyledFeature>>,
    writer: TileWriter,
    image_folder: Option<PathBuf>,
    counters: Arc<ProgressCounters>,
    tm: f64,
    blocks_written: usize,
    features_written: usize,
    err: Option<Error>,
}

impl WriteBlocks {
    fn new(
        lines: Arc<Vec<StyledFeature>>,
        polygons: Arc<Vec<StyledFeature>>,
        outdir: &str,
        image_folder: Option<PathBuf>,
        counters: Arc<ProgressCounters>,
    ) -> WriteBlocks {
        WriteBlocks {
            lines: lines,
            polygons: polygons,
            writer: TileWriter::new(outdir),
            image_folder: image_folder,
            counters: counters,
            tm: 0.0,
            blocks_written: 0,
            features_written: 0,
            err: None,
        }
    }

    fn process_block(&mut self, min_x: i64, min_y: i64) -> Result<()> {
        let square = block_square(min_x, min_y);
        let polygons = clip_polygons(&self.polygons, &square, min_x, min_y);
        let lines = clip_lines(&self.lines, &square, min_x, min_y);

        if polygons.is_empty() && lines.is_empty() {
            self.counters.add_empty();
            return Ok(());
        }

        let block = BlockId::from_min(min_x, min_y);
        if let Some(imgf) = &self.image_folder {
            let img_name = imgf.join(format!(
                "block_{}_{}-{}_{}.png",
                block.folder_x, block.folder_y, block.block_x, block.block_y
            ));
            render_block(&img_name, &polygons, &lines, min_x, min_y)?;
        }
        self.writer.write_block(&block, &polygons, &lines)?;

        self.features_written += polygons.len() + lines.len();
        self.blocks_written += 1;
        self.counters.add_processed();
        Ok(())
    }
}

impl CallFinish for WriteBlocks {
    type CallType = (i64, i64);
    type ReturnType = Timings;

    fn call(&mut self, (min_x, min_y): (i64, i64)) {
        if self.err.is_some() {
            return;
        }
        let tx = ThreadTimer::new();
        if let Err(e) = self.process_block(min_x, min_y) {
            self.err = Some(e);
        }
        self.tm += tx.since();
    }

    fn finish(&mut self) -> Result<Timings> {
        if let Some(e) = self.err.take() {
            return Err(e);
        }
        let mut tms = Timings::new();
        tms.add("write_blocks", self.tm);
        tms.add_other(
            "write_blocks",
            OtherData::Messages(vec![format!(
                "{} features in {} blocks",
                self.features_written, self.blocks_written
            )]),
        );
        Ok(tms)
    }
}

/// Clips and writes every block of the region from the already styled
/// feature set. Blocks fan out round robin over `numchan` workers; with
/// numchan 0 everything runs on the calling thread.
pub fn write_region(
    styled_lines: Arc<Vec<StyledFeature>>,
    styled_polygons: Arc<Vec<StyledFeature>>,
    region: &PlanarRegion,
    opts: &ExtractOptions,
) -> Result<ExtractResult> {
    let blocks = region.blocks();
    let total = blocks.len();
    let counters = Arc::new(ProgressCounters::new(total));

    let image_folder = if opts.render {
        let p = PathBuf::from(&opts.outdir).join("test_imgs");
        create_dir_all(&p)?;
        Some(p)
    } else {
        None
    };

    messenger().start_progress_percent(&format!("{} blocks for {}", total, region));

    let tms = if opts.numchan == 0 {
        let mut ww = Box::new(WriteBlocks::new(
            styled_lines,
            styled_polygons,
            &opts.outdir,
            image_folder,
            counters.clone(),
        ));
        for b in blocks {
            ww.call(b);
        }
        ww.finish()?
    } else {
        let mut workers: Vec<Box<dyn CallFinish<CallType = (i64, i64), ReturnType = Timings>>> =
            Vec::new();
        for _ in 0..opts.numchan {
            workers.push(Box::new(Callback::new(Box::new(WriteBlocks::new(
                styled_lines.clone(),
                styled_polygons.clone(),
                &opts.outdir,
                image_folder.clone(),
                counters.clone(),
            )))));
        }
        let mut merged = CallbackMerge::new(workers, Box::new(MergeTimings::new()));
        for b in blocks {
            merged.call(b);
        }
        merged.finish()?
    };

    messenger().finish_progress_percent();

    for (w, x) in &tms.others {
        match x {
            OtherData::Messages(mm) => {
                for m in mm {
                    message!("{}: {}", w, m);
                }
            }
        }
    }

    let (processed, empty) = counters.totals();
    Ok(ExtractResult {
        total: total,
        processed: processed,
        empty: empty,
    })
}

/// Whole pipeline for one requested region: read both collections,
/// classify and style once, then clip and encode per block in parallel.
pub fn run_extract(
    indir: &str,
    prefix: &str,
    bbox: &Bbox,
    rules: &ExtractConfig,
    styles: &StyleConfig,
    opts: &ExtractOptions,
) -> Result<ExtractResult> {
    let mut lt = LogTimes::new();

    let raw_lines = read_features(&format!("{}/{}_lines.geojson", indir, prefix))?;
    lt.add("read lines");
    let raw_polygons = read_features(&format!("{}/{}_polygons.geojson", indir, prefix))?;
    lt.add("read polygons");

    let mut styled = style_features(classify_features(raw_lines, &rules.lines, "lines"), styles);
    styled.extend(style_features(
        classify_features(raw_polygons, &rules.polygons, "polygons"),
        styles,
    ));
    let (styled_lines, styled_polygons): (Vec<StyledFeature>, Vec<StyledFeature>) = styled
        .into_iter()
        .partition(|f| f.feature.geometry.kind() == GeomKind::Line);
    lt.add("classify and style");

    message!(
        "{} styled lines, {} styled polygons",
        styled_lines.len(),
        styled_polygons.len()
    );

    let region = PlanarRegion::from_bbox(bbox);
    let res = write_region(
        Arc::new(styled_lines),
        Arc::new(styled_polygons),
        &region,
        opts,
    )?;
    lt.add("write blocks");

    message!("{}", lt);
    message!(
        "Final count: total {}, processed {}, empty {}",
        res.total,
        res.processed,
        res.empty
    );
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tilefile::parse_block;
    use crate::extract::{ClassifiedFeature, Geom};
    use geo::{LineString, Polygon};
    use std::fs;
    use std::path::Path;

    fn temp_outdir(name: &str) -> String {
        let p = std::env::temp_dir().join(format!("fmpextract_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&p);
        fs::create_dir_all(&p).unwrap();
        String::from(p.to_str().unwrap())
    }

    fn forest(coords: Vec<(f64, f64)>) -> ClassifiedFeature {
        let geometry = Geom::Polygon(Polygon::new(LineString::from(coords), Vec::new()));
        let bounds = geometry.bounds().unwrap();
        ClassifiedFeature {
            id: String::from("1"),
            feature_type: String::from("landuse.forest"),
            z_order: None,
            tags: Vec::new(),
            geometry: geometry,
            bounds: bounds,
        }
    }

    fn river(coords: Vec<(f64, f64)>) -> ClassifiedFeature {
        let geometry = Geom::Line(LineString::from(coords));
        let bounds = geometry.bounds().unwrap();
        ClassifiedFeature {
            id: String::from("2"),
            feature_type: String::from("waterway.river"),
            z_order: None,
            tags: Vec::new(),
            geometry: geometry,
            bounds: bounds,
        }
    }

    fn styled_set() -> (Arc<Vec<StyledFeature>>, Arc<Vec<StyledFeature>>) {
        let styles = StyleConfig::default();
        let styled = style_features(
            vec![
                forest(vec![
                    (100.0, 100.0),
                    (300.0, 100.0),
                    (300.0, 300.0),
                    (100.0, 300.0),
                    (100.0, 100.0),
                ]),
                river(vec![(50.0, 50.0), (250.0, 80.0)]),
            ]
            .into_iter(),
            &styles,
        );
        let (ll, pp): (Vec<StyledFeature>, Vec<StyledFeature>) = styled
            .into_iter()
            .partition(|f| f.feature.geometry.kind() == GeomKind::Line);
        (Arc::new(ll), Arc::new(pp))
    }

    #[test]
    fn test_counter_conservation() {
        let (lines, polygons) = styled_set();
        let region = PlanarRegion {
            min_x: 0,
            min_y: 0,
            max_x: 8300,
            max_y: 4200,
        };
        // 3 x 2 blocks, features only in the first
        for numchan in &[0usize, 1, 3, 4] {
            let outdir = temp_outdir(&format!("counters_{}", numchan));
            let opts = ExtractOptions {
                outdir: outdir.clone(),
                render: false,
                numchan: *numchan,
            };
            let res = write_region(lines.clone(), polygons.clone(), &region, &opts).unwrap();
            assert_eq!(res.total, 6);
            assert_eq!(res.processed + res.empty, res.total);
            assert_eq!(res.processed, 1);
            assert_eq!(res.empty, 5);
            assert!(Path::new(&outdir).join("+000+000").join("0_0.fmp").exists());
            let _ = fs::remove_dir_all(&outdir);
        }
    }

    #[test]
    fn test_forest_spanning_block_boundary() {
        let styles = StyleConfig::default();
        let styled = style_features(
            vec![forest(vec![
                (4000.0, 100.0),
                (4200.0, 100.0),
                (4200.0, 200.0),
                (4000.0, 200.0),
                (4000.0, 100.0),
            ])]
            .into_iter(),
            &styles,
        );
        let polygons = Arc::new(styled);
        let lines: Arc<Vec<StyledFeature>> = Arc::new(Vec::new());

        let region = PlanarRegion {
            min_x: 0,
            min_y: 0,
            max_x: 4200,
            max_y: 200,
        };
        let outdir = temp_outdir("spanning");
        let opts = ExtractOptions {
            outdir: outdir.clone(),
            render: false,
            numchan: 1,
        };
        let res = write_region(lines, polygons, &region, &opts).unwrap();
        assert_eq!(res.total, 2);
        assert_eq!(res.processed, 2);
        assert_eq!(res.empty, 0);

        let text0 =
            fs::read_to_string(Path::new(&outdir).join("+000+000").join("0_0.fmp")).unwrap();
        let (pp0, ll0) = parse_block(&text0);
        assert_eq!(pp0.len(), 1);
        assert!(ll0.is_empty());
        // clipped at the block's right edge
        assert_eq!(pp0[0].bbox[2], 4095);

        let text1 =
            fs::read_to_string(Path::new(&outdir).join("+000+000").join("1_0.fmp")).unwrap();
        let (pp1, _) = parse_block(&text1);
        assert_eq!(pp1.len(), 1);
        // continues from the next block's left edge
        assert_eq!(pp1[0].bbox[0], 0);

        assert_eq!(pp0[0].color, pp1[0].color);
        assert_eq!(pp0[0].maxzoom, pp1[0].maxzoom);

        let _ = fs::remove_dir_all(&outdir);
    }

    #[test]
    fn test_render_writes_debug_image() {
        let (lines, polygons) = styled_set();
        let region = PlanarRegion {
            min_x: 0,
            min_y: 0,
            max_x: 300,
            max_y: 300,
        };
        let outdir = temp_outdir("render");
        let opts = ExtractOptions {
            outdir: outdir.clone(),
            render: true,
            numchan: 0,
        };
        let res = write_region(lines, polygons, &region, &opts).unwrap();
        assert_eq!(res.processed, 1);
        assert!(Path::new(&outdir)
            .join("test_imgs")
            .join("block_0_0-0_0.png")
            .exists());
        let _ = fs::remove_dir_all(&outdir);
    }
}
