use crate::extract::default_style::DEFAULT_EXTRACT_CONFIG;
use crate::extract::{ClassifiedFeature, Geom};
use crate::message;
use crate::utils::Checktime;

use geo::{Area, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufReader, Error, ErrorKind, Result};

/// Allowed subtype values for one property key. An array is a plain allow
/// list (empty means any value matches); a mapping restricts to its keys
/// and names, per value, the auxiliary tags to record on a match.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum SubtypeSpec {
    Allowed(Vec<String>),
    WithTags(BTreeMap<String, Vec<String>>),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TypeRule {
    pub key: String,
    pub subtypes: SubtypeSpec,
}

/// Classification table for one input collection. `feature_types` is
/// scanned in order and the first matching rule decides the feature type,
/// so the configured order is significant.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExtractRules {
    pub tags: Vec<String>,
    pub feature_types: Vec<TypeRule>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExtractConfig {
    pub lines: ExtractRules,
    pub polygons: ExtractRules,
}

impl ExtractConfig {
    pub fn default() -> ExtractConfig {
        serde_json::from_str(&DEFAULT_EXTRACT_CONFIG).expect("!!")
    }

    pub fn from_file(infn: &str) -> Result<ExtractConfig> {
        let ff = File::open(infn)?;
        let mut fbuf = BufReader::new(ff);
        match serde_json::from_reader(&mut fbuf) {
            Ok(p) => Ok(p),
            Err(e) => Err(Error::new(ErrorKind::Other, e.to_string())),
        }
    }
}

/// Splits the packed `other_tags` property, `"key"=>"value"` pairs joined
/// with commas, into a plain mapping. Malformed pairs are ignored.
pub fn parse_tags(tags_str: &str) -> BTreeMap<String, String> {
    let mut res = BTreeMap::new();
    for tag in tags_str.split("\",\"") {
        let tag = tag.replace('"', "");
        if let Some(pos) = tag.find("=>") {
            res.insert(
                String::from(&tag[..pos]),
                String::from(&tag[pos + 2..]),
            );
        }
    }
    res
}

impl ExtractRules {
    /// Property lookup with the hoisted auxiliary tags taking precedence:
    /// a key listed in `tags` and present in the parsed `other_tags`
    /// shadows the property of the same name.
    fn lookup<'a>(
        &self,
        props: &'a Map<String, Value>,
        aux: &'a BTreeMap<String, String>,
        key: &str,
    ) -> Option<&'a str> {
        if self.tags.iter().any(|t| t == key) {
            if let Some(v) = aux.get(key) {
                return Some(v.as_str());
            }
        }
        props.get(key).and_then(|v| v.as_str())
    }

    /// First matching rule wins. Returns the feature type
    /// `"<key>.<value>"` plus any recorded secondary `"<tag>.<value>"`
    /// strings, or None when no rule applies.
    pub fn match_feature(
        &self,
        props: &Map<String, Value>,
        aux: &BTreeMap<String, String>,
    ) -> Option<(String, Vec<String>)> {
        for rule in &self.feature_types {
            let val = match self.lookup(props, aux, &rule.key) {
                Some(v) => v,
                None => {
                    continue;
                }
            };
            match &rule.subtypes {
                SubtypeSpec::Allowed(allowed) => {
                    if !allowed.is_empty() && !allowed.iter().any(|a| a == val) {
                        continue;
                    }
                    return Some((format!("{}.{}", rule.key, val), Vec::new()));
                }
                SubtypeSpec::WithTags(subtypes) => {
                    if !subtypes.is_empty() && !subtypes.contains_key(val) {
                        continue;
                    }
                    let mut extra = Vec::new();
                    if let Some(tag_keys) = subtypes.get(val) {
                        for tk in tag_keys {
                            if let Some(tv) = aux.get(tk) {
                                extra.push(format!("{}.{}", tk, tv));
                            }
                        }
                    }
                    return Some((format!("{}.{}", rule.key, val), extra));
                }
            }
        }
        None
    }
}

fn feature_id(props: &Map<String, Value>) -> String {
    for key in &["osm_way_id", "osm_id"] {
        match props.get(*key) {
            Some(Value::String(s)) => {
                return s.clone();
            }
            Some(Value::Number(n)) => {
                return n.to_string();
            }
            _ => {}
        }
    }
    String::new()
}

fn part_ok(part: &Geom) -> bool {
    match part {
        Geom::Line(l) => {
            l.0.len() >= 2 && l.0.iter().any(|c| *c != l.0[0])
        }
        Geom::Polygon(p) => {
            p.exterior().0.len() >= 4 && p.unsigned_area() > 0.0
        }
    }
}

/// Lazy classification of one input collection: consumed once by the
/// styling stage, which caches the result before the block fan out.
pub struct Classify<'a> {
    features: std::vec::IntoIter<geojson::Feature>,
    rules: &'a ExtractRules,
    label: String,
    pending: VecDeque<ClassifiedFeature>,
    read: usize,
    matched: usize,
    no_type: usize,
    bad_geom: usize,
    types_seen: BTreeSet<String>,
    check: Checktime,
    reported: bool,
}

pub fn classify_features<'a>(
    features: Vec<geojson::Feature>,
    rules: &'a ExtractRules,
    label: &str,
) -> Classify<'a> {
    Classify {
        features: features.into_iter(),
        rules: rules,
        label: String::from(label),
        pending: VecDeque::new(),
        read: 0,
        matched: 0,
        no_type: 0,
        bad_geom: 0,
        types_seen: BTreeSet::new(),
        check: Checktime::new(),
        reported: false,
    }
}

impl<'a> Classify<'a> {
    fn step(&mut self, feat: geojson::Feature) {
        self.read += 1;
        if !self.check.checktime().is_none() {
            message!("... {}: {} features read", self.label, self.read);
        }

        let props = feat.properties.unwrap_or_default();
        let aux = match props.get("other_tags").and_then(|v| v.as_str()) {
            Some(s) => parse_tags(s),
            None => BTreeMap::new(),
        };

        let (feature_type, extra_tags) = match self.rules.match_feature(&props, &aux) {
            Some(m) => m,
            None => {
                self.no_type += 1;
                return;
            }
        };

        let geom = match feat.geometry {
            Some(g) => g,
            None => {
                self.bad_geom += 1;
                return;
            }
        };
        let geom = match geo::Geometry::<f64>::try_from(geom) {
            Ok(g) => g,
            Err(_) => {
                self.bad_geom += 1;
                return;
            }
        };

        let id = feature_id(&props);
        let z_order = props.get("z_order").and_then(|v| v.as_i64());

        let mut parts: Vec<Geom> = Vec::new();
        match geom {
            geo::Geometry::LineString(l) => {
                parts.push(Geom::Line(l));
            }
            geo::Geometry::MultiLineString(ml) => {
                for l in ml {
                    parts.push(Geom::Line(l));
                }
            }
            geo::Geometry::Polygon(p) => {
                parts.push(Geom::Polygon(p));
            }
            geo::Geometry::MultiPolygon(mp) => {
                // only the first member's outer ring is kept; holes and the
                // remaining members are dropped (known data fidelity gap,
                // the tile format has no ring nesting)
                if let Some(first) = mp.into_iter().next() {
                    parts.push(Geom::Polygon(Polygon::new(
                        first.exterior().clone(),
                        Vec::new(),
                    )));
                }
            }
            _ => {
                self.bad_geom += 1;
                return;
            }
        }

        let mut any = false;
        for part in parts {
            if !part_ok(&part) {
                self.bad_geom += 1;
                continue;
            }
            let bounds = match part.bounds() {
                Some(b) => b,
                None => {
                    self.bad_geom += 1;
                    continue;
                }
            };
            self.pending.push_back(ClassifiedFeature {
                id: id.clone(),
                feature_type: feature_type.clone(),
                z_order: z_order,
                tags: extra_tags.clone(),
                geometry: part,
                bounds: bounds,
            });
            any = true;
        }
        if any {
            self.matched += 1;
            self.types_seen.insert(feature_type);
        }
    }

    fn report(&mut self) {
        if self.reported {
            return;
        }
        self.reported = true;
        message!(
            "{}: {} features read, {} classified ({} without type, {} bad geometries) in {:.1}s",
            self.label,
            self.read,
            self.matched,
            self.no_type,
            self.bad_geom,
            self.check.gettime()
        );
        let types: Vec<&str> = self.types_seen.iter().map(|t| t.as_str()).collect();
        message!("{}: feature types: [{}]", self.label, types.join(", "));
    }
}

impl<'a> Iterator for Classify<'a> {
    type Item = ClassifiedFeature;

    fn next(&mut self) -> Option<ClassifiedFeature> {
        loop {
            if let Some(f) = self.pending.pop_front() {
                return Some(f);
            }
            match self.features.next() {
                Some(feat) => {
                    self.step(feat);
                }
                None => {
                    self.report();
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::GeomKind;
    use serde_json::json;

    fn test_rules() -> ExtractRules {
        serde_json::from_str(
            r#"{
            "tags": ["bridge"],
            "feature_types": [
                {"key": "highway", "subtypes": {"motorway": ["bridge"], "trunk": []}},
                {"key": "waterway", "subtypes": ["river", "canal"]},
                {"key": "railway", "subtypes": []}
            ]
        }"#,
        )
        .unwrap()
    }

    fn mk_feature(props: serde_json::Value, geom: geojson::Value) -> geojson::Feature {
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geom)),
            id: None,
            properties: props.as_object().cloned(),
            foreign_members: None,
        }
    }

    fn line_coords() -> geojson::Value {
        geojson::Value::LineString(vec![vec![0.0, 0.0], vec![100.0, 50.0]])
    }

    #[test]
    fn test_parse_tags() {
        let t = parse_tags("\"bridge\"=>\"yes\",\"layer\"=>\"1\"");
        assert_eq!(t.get("bridge").map(|s| s.as_str()), Some("yes"));
        assert_eq!(t.get("layer").map(|s| s.as_str()), Some("1"));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_first_match_wins() {
        let rules = test_rules();
        // matches both the highway and the railway rule; the earlier
        // table entry decides
        let f = mk_feature(
            json!({"highway": "trunk", "railway": "rail", "osm_id": "12"}),
            line_coords(),
        );
        let got: Vec<_> = classify_features(vec![f], &rules, "lines").collect();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].feature_type, "highway.trunk");
        assert_eq!(got[0].id, "12");
        assert_eq!(got[0].geometry.kind(), GeomKind::Line);
    }

    #[test]
    fn test_allow_list_filters() {
        let rules = test_rules();
        // ditch is not in the waterway allow list but the unrestricted
        // railway rule still catches the feature
        let f = mk_feature(
            json!({"waterway": "ditch", "railway": "tram"}),
            line_coords(),
        );
        let got: Vec<_> = classify_features(vec![f], &rules, "lines").collect();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].feature_type, "railway.tram");

        let f2 = mk_feature(json!({"waterway": "ditch"}), line_coords());
        let got2: Vec<_> = classify_features(vec![f2], &rules, "lines").collect();
        assert!(got2.is_empty());
    }

    #[test]
    fn test_hoisted_and_secondary_tags() {
        let rules = test_rules();
        let f = mk_feature(
            json!({
                "highway": "motorway",
                "z_order": 380,
                "other_tags": "\"bridge\"=>\"viaduct\",\"lanes\"=>\"4\""
            }),
            line_coords(),
        );
        let got: Vec<_> = classify_features(vec![f], &rules, "lines").collect();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].feature_type, "highway.motorway");
        assert_eq!(got[0].tags, vec![String::from("bridge.viaduct")]);
        assert_eq!(got[0].z_order, Some(380));
    }

    #[test]
    fn test_multi_line_decomposition() {
        let rules = test_rules();
        let f = mk_feature(
            json!({"railway": "rail"}),
            geojson::Value::MultiLineString(vec![
                vec![vec![0.0, 0.0], vec![10.0, 0.0]],
                vec![vec![20.0, 0.0], vec![30.0, 0.0]],
            ]),
        );
        let got: Vec<_> = classify_features(vec![f], &rules, "lines").collect();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].feature_type, got[1].feature_type);
    }

    #[test]
    fn test_multi_polygon_first_exterior_only() {
        let rules: ExtractRules = serde_json::from_str(
            r#"{"tags": [], "feature_types": [{"key": "landuse", "subtypes": []}]}"#,
        )
        .unwrap();
        let f = mk_feature(
            json!({"landuse": "forest"}),
            geojson::Value::MultiPolygon(vec![
                vec![
                    vec![
                        vec![0.0, 0.0],
                        vec![100.0, 0.0],
                        vec![100.0, 100.0],
                        vec![0.0, 100.0],
                        vec![0.0, 0.0],
                    ],
                    // hole, dropped
                    vec![
                        vec![40.0, 40.0],
                        vec![60.0, 40.0],
                        vec![60.0, 60.0],
                        vec![40.0, 60.0],
                        vec![40.0, 40.0],
                    ],
                ],
                // second member, dropped
                vec![vec![
                    vec![200.0, 200.0],
                    vec![300.0, 200.0],
                    vec![300.0, 300.0],
                    vec![200.0, 300.0],
                    vec![200.0, 200.0],
                ]],
            ]),
        );
        let got: Vec<_> = classify_features(vec![f], &rules, "polygons").collect();
        assert_eq!(got.len(), 1);
        match &got[0].geometry {
            Geom::Polygon(p) => {
                assert!(p.interiors().is_empty());
                assert_eq!(p.exterior().0.len(), 5);
                assert_eq!(p.exterior().0[1].x, 100.0);
            }
            _ => panic!("expected polygon"),
        }
    }

    #[test]
    fn test_degenerate_geometry_dropped() {
        let rules = test_rules();
        let f = mk_feature(
            json!({"railway": "rail"}),
            geojson::Value::LineString(vec![vec![5.0, 5.0], vec![5.0, 5.0]]),
        );
        let got: Vec<_> = classify_features(vec![f], &rules, "lines").collect();
        assert!(got.is_empty());
    }
}
