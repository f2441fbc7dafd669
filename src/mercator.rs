use std::f64::consts::PI;
use std::fmt;
use std::io::{Error, ErrorKind, Result};

pub const EARTH_RADIUS: f64 = 6378137.0;

fn deg2rad(d: f64) -> f64 {
    d * PI / 180.0
}

/// Forward spherical mercator, rounded to whole meters. Latitudes at the
/// poles are out of domain; callers keep their boxes inside (-90, 90).
pub fn lon2x(lon: f64) -> i64 {
    (deg2rad(lon) * EARTH_RADIUS).round() as i64
}

pub fn lat2y(lat: f64) -> i64 {
    ((deg2rad(lat) / 2.0 + PI / 4.0).tan().ln() * EARTH_RADIUS).round() as i64
}

/// Geographic bounding box in degrees.
#[derive(Clone, Debug, PartialEq)]
pub struct Bbox {
    pub minlon: f64,
    pub minlat: f64,
    pub maxlon: f64,
    pub maxlat: f64,
}

impl Bbox {
    pub fn new(minlon: f64, minlat: f64, maxlon: f64, maxlat: f64) -> Bbox {
        Bbox {
            minlon,
            minlat,
            maxlon,
            maxlat,
        }
    }

    pub fn from_str(fstr: &str) -> Result<Bbox> {
        let vv: Vec<&str> = fstr.split(",").collect();
        if vv.len() != 4 {
            return Err(Error::new(
                ErrorKind::Other,
                "expected MINLON,MINLAT,MAXLON,MAXLAT",
            ));
        }
        let mut vvf = Vec::new();
        for v in vv {
            match v.trim().parse::<f64>() {
                Ok(f) => {
                    vvf.push(f);
                }
                Err(_) => {
                    return Err(Error::new(
                        ErrorKind::Other,
                        format!("not a number: {}", v),
                    ));
                }
            }
        }
        let bx = Bbox::new(vvf[0], vvf[1], vvf[2], vvf[3]);
        if !bx.is_valid() {
            return Err(Error::new(ErrorKind::Other, format!("empty box {}", bx)));
        }
        Ok(bx)
    }

    pub fn is_valid(&self) -> bool {
        self.minlon < self.maxlon
            && self.minlat < self.maxlat
            && self.minlat > -90.0
            && self.maxlat < 90.0
    }
}

impl fmt::Display for Bbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.4}, {:.4}, {:.4}, {:.4}]",
            self.minlon, self.minlat, self.maxlon, self.maxlat
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lon2x() {
        assert_eq!(lon2x(0.0), 0);
        // half the earth width, pi * R
        assert_eq!(lon2x(180.0), 20037508);
        assert_eq!(lon2x(-180.0), -20037508);
    }

    #[test]
    fn test_lat2y() {
        assert_eq!(lat2y(0.0), 0);
        let mut prev = lat2y(-85.0);
        let mut lat = -84.0;
        while lat <= 85.0 {
            let y = lat2y(lat);
            assert!(y > prev, "lat2y not increasing at {}", lat);
            prev = y;
            lat += 1.0;
        }
    }

    #[test]
    fn test_bbox_from_str() {
        let bx = Bbox::from_str("-48.88,-26.35,-48.65,-26.20").unwrap();
        assert_eq!(bx, Bbox::new(-48.88, -26.35, -48.65, -26.20));
        assert!(Bbox::from_str("1,2,3").is_err());
        assert!(Bbox::from_str("3,2,1,0").is_err());
        assert!(Bbox::from_str("a,b,c,d").is_err());
    }
}
