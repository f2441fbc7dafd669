/// Built in classification tables, matching the layers the map client
/// ships styles for. Override with `--rules`.
pub const DEFAULT_EXTRACT_CONFIG: &str = r#"
{
    "lines": {
        "tags": ["bridge", "tunnel", "oneway"],
        "feature_types": [
            {"key": "highway", "subtypes": {
                "motorway": ["bridge", "tunnel"],
                "motorway_link": [],
                "trunk": ["bridge", "tunnel"],
                "trunk_link": [],
                "primary": ["bridge", "tunnel"],
                "primary_link": [],
                "secondary": ["bridge"],
                "secondary_link": [],
                "tertiary": [],
                "residential": [],
                "unclassified": [],
                "living_street": [],
                "pedestrian": [],
                "service": [],
                "track": [],
                "cycleway": [],
                "footway": [],
                "path": []
            }},
            {"key": "railway", "subtypes": ["rail", "light_rail", "subway", "tram", "narrow_gauge"]},
            {"key": "waterway", "subtypes": ["river", "canal", "stream"]},
            {"key": "aeroway", "subtypes": ["runway", "taxiway"]}
        ]
    },
    "polygons": {
        "tags": [],
        "feature_types": [
            {"key": "building", "subtypes": []},
            {"key": "landuse", "subtypes": ["forest", "residential", "industrial", "commercial",
                "retail", "grass", "meadow", "farmland", "orchard", "vineyard", "cemetery"]},
            {"key": "natural", "subtypes": ["water", "wood", "scrub", "heath", "sand", "beach", "wetland"]},
            {"key": "leisure", "subtypes": ["park", "garden", "pitch", "playground", "golf_course", "nature_reserve"]},
            {"key": "amenity", "subtypes": ["parking", "school", "university", "hospital"]},
            {"key": "aeroway", "subtypes": ["apron", "terminal"]}
        ]
    }
}
"#;

/// Built in style tables and palette, colors packed as RGB565 hex codes.
/// Override with `--styles`.
pub const DEFAULT_STYLE_CONFIG: &str = r#"
{
    "colors": {
        "orange": "0xFD20",
        "yellow": "0xFF47",
        "white": "0xFFFF",
        "grey": "0x9CF3",
        "light_grey": "0xE71C",
        "dark_grey": "0x632C",
        "brown": "0x7AA9",
        "water": "0x65BE",
        "light_green": "0xAEB0",
        "dark_green": "0x3C67",
        "sand": "0xF6F0",
        "red": "0xE1C6"
    },
    "lines": [
        {"features": ["highway.motorway", "highway.motorway_link", "highway.trunk", "highway.trunk_link"],
         "color": "orange", "width": 14, "maxzoom": "11"},
        {"features": ["highway.primary", "highway.primary_link", "highway.secondary", "highway.secondary_link"],
         "color": "yellow", "width": 10, "maxzoom": "12"},
        {"features": ["highway.tertiary", "highway.residential", "highway.unclassified", "highway.living_street"],
         "color": "white", "width": 6, "maxzoom": "14"},
        {"features": ["highway"], "color": "white", "width": 3, "maxzoom": "15"},
        {"features": ["railway"], "color": "dark_grey", "width": 3, "maxzoom": "13"},
        {"features": ["waterway"], "color": "water", "width": 8, "maxzoom": "13"},
        {"features": ["aeroway"], "color": "light_grey", "width": 20, "maxzoom": "12"}
    ],
    "polygons": [
        {"features": ["building"], "color": "light_grey", "maxzoom": "15"},
        {"features": ["landuse.forest", "natural.wood"], "color": "dark_green", "maxzoom": "12"},
        {"features": ["natural.water", "natural.wetland"], "color": "water", "maxzoom": "11"},
        {"features": ["natural.sand", "natural.beach"], "color": "sand", "maxzoom": "13"},
        {"features": ["landuse.grass", "landuse.meadow", "landuse.farmland"], "color": "light_green", "maxzoom": "13"},
        {"features": ["leisure.park", "leisure.garden", "leisure.golf_course", "leisure.nature_reserve"],
         "color": "light_green", "maxzoom": "13"},
        {"features": ["landuse.cemetery"], "color": "dark_green", "maxzoom": "14"},
        {"features": ["amenity.parking"], "color": "grey", "maxzoom": "15"},
        {"features": ["landuse"], "color": "grey", "maxzoom": "13"},
        {"features": ["natural"], "color": "light_green", "maxzoom": "13"},
        {"features": ["leisure"], "color": "light_green", "maxzoom": "14"},
        {"features": ["amenity"], "color": "light_grey", "maxzoom": "15"},
        {"features": ["aeroway"], "color": "light_grey", "maxzoom": "12"}
    ]
}
"#;
