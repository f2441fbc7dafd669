use crate::extract::default_style::DEFAULT_STYLE_CONFIG;
use crate::extract::{ClassifiedFeature, GeomKind, StyledFeature};
use crate::message;

use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Error, ErrorKind, Result};

/// Features with no matching style rule still render, in this color, so
/// they stand out on the map instead of disappearing.
pub const DEFAULT_COLOR: &str = "0xF972";

/// One style rule: applies to every feature whose full type string or
/// category prefix is in `features`. Missing attributes fall back to the
/// defaults (sentinel color, no width, empty maxzoom).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StyleRule {
    pub features: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<String>,
}

/// Style tables partitioned by geometry kind, plus the named color
/// palette the rules refer into. Rule order is significant: first match
/// wins within each table.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StyleConfig {
    pub colors: BTreeMap<String, String>,
    pub lines: Vec<StyleRule>,
    pub polygons: Vec<StyleRule>,
}

impl StyleConfig {
    pub fn default() -> StyleConfig {
        let res: StyleConfig = serde_json::from_str(&DEFAULT_STYLE_CONFIG).expect("!!");
        res.check().expect("!!");
        res
    }

    pub fn from_file(infn: &str) -> Result<StyleConfig> {
        let ff = File::open(infn)?;
        let mut fbuf = BufReader::new(ff);
        let res: StyleConfig = match serde_json::from_reader(&mut fbuf) {
            Ok(p) => p,
            Err(e) => {
                return Err(Error::new(ErrorKind::Other, e.to_string()));
            }
        };
        res.check()?;
        Ok(res)
    }

    /// Config sanity: every rule color must name a palette entry and every
    /// palette code must be a 16 bit hex value. Checked up front so a bad
    /// table fails the run before any block work starts.
    pub fn check(&self) -> Result<()> {
        for (name, code) in &self.colors {
            let code = code.trim_start_matches("0x");
            if u16::from_str_radix(code, 16).is_err() {
                return Err(Error::new(
                    ErrorKind::Other,
                    format!("color {} is not a 16 bit hex code: {}", name, code),
                ));
            }
        }
        for rule in self.lines.iter().chain(self.polygons.iter()) {
            if let Some(c) = &rule.color {
                if !self.colors.contains_key(c) {
                    return Err(Error::new(
                        ErrorKind::Other,
                        format!("style color {} not in palette", c),
                    ));
                }
            }
        }
        Ok(())
    }

    fn rules_for(&self, kind: GeomKind) -> &[StyleRule] {
        match kind {
            GeomKind::Line => &self.lines,
            GeomKind::Polygon => &self.polygons,
        }
    }

    /// First matching rule for the type string, trying the full type then
    /// its category prefix. None when the type is unmapped.
    pub fn find_rule(&self, feature_type: &str, kind: GeomKind) -> Option<&StyleRule> {
        let group = match feature_type.find('.') {
            Some(p) => &feature_type[..p],
            None => feature_type,
        };
        self.rules_for(kind)
            .iter()
            .find(|r| r.features.contains(feature_type) || r.features.contains(group))
    }

    fn palette(&self, name: &str) -> String {
        match self.colors.get(name) {
            Some(c) => c.clone(),
            None => String::from(DEFAULT_COLOR),
        }
    }
}

/// Resolves rendering attributes for every classified feature. Unmapped
/// types keep the sentinel color and are reported once per type at the
/// end of the pass.
pub fn style_features<I>(features: I, styles: &StyleConfig) -> Vec<StyledFeature>
where
    I: Iterator<Item = ClassifiedFeature>,
{
    let mut res = Vec::new();
    let mut unmapped: BTreeSet<String> = BTreeSet::new();

    for feat in features {
        let mut color = String::from(DEFAULT_COLOR);
        let mut width = None;
        let mut maxzoom = String::new();

        match styles.find_rule(&feat.feature_type, feat.geometry.kind()) {
            Some(rule) => {
                if let Some(c) = &rule.color {
                    color = styles.palette(c);
                }
                width = rule.width;
                if let Some(mz) = &rule.maxzoom {
                    maxzoom = mz.clone();
                }
            }
            None => {
                unmapped.insert(feat.feature_type.clone());
            }
        }

        res.push(StyledFeature {
            feature: feat,
            color: color,
            width: width,
            maxzoom: maxzoom,
        });
    }

    if !unmapped.is_empty() {
        let tt: Vec<&str> = unmapped.iter().map(|t| t.as_str()).collect();
        message!("not mapped: [{}]", tt.join(", "));
    }
    res
}
