use crate::message;

use std::fs::File;
use std::io::{BufReader, Error, ErrorKind, Result};

/// Reads one input FeatureCollection. Geometry is expected to be in
/// planar integer meter coordinates already, produced by the upstream
/// converter.
pub fn read_features(fname: &str) -> Result<Vec<geojson::Feature>> {
    let ff = File::open(fname)?;
    let fbuf = BufReader::new(ff);
    let gj: geojson::GeoJson = match serde_json::from_reader(fbuf) {
        Ok(g) => g,
        Err(e) => {
            return Err(Error::new(
                ErrorKind::Other,
                format!("{}: {}", fname, e),
            ));
        }
    };
    match gj {
        geojson::GeoJson::FeatureCollection(fc) => {
            message!("{}: {} features", fname, fc.features.len());
            Ok(fc.features)
        }
        _ => Err(Error::new(
            ErrorKind::Other,
            format!("{}: not a FeatureCollection", fname),
        )),
    }
}
