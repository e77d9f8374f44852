use serde::Serialize;

/// Named colour set: fill colours and matching border colours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorPalette {
    pub name: String,
    pub primary: Vec<String>,
    pub border: Vec<String>,
}

struct PaletteDef {
    name: &'static str,
    rgb: &'static [(u8, u8, u8)],
    alpha: f64,
}

const DEFAULT_NAME: &str = "default";

static REGISTRY: &[PaletteDef] = &[
    PaletteDef {
        name: DEFAULT_NAME,
        rgb: &[
            (54, 162, 235),
            (255, 99, 132),
            (255, 205, 86),
            (75, 192, 192),
            (153, 102, 255),
            (255, 159, 64),
            (199, 199, 199),
            (83, 102, 255),
        ],
        alpha: 0.8,
    },
    PaletteDef {
        name: "category10",
        rgb: &[
            (31, 119, 180),
            (255, 127, 14),
            (44, 160, 44),
            (214, 39, 40),
            (148, 103, 189),
            (140, 86, 75),
            (227, 119, 194),
            (127, 127, 127),
            (188, 189, 34),
            (23, 190, 207),
        ],
        alpha: 0.8,
    },
    PaletteDef {
        name: "pastel",
        rgb: &[
            (174, 198, 232),
            (255, 187, 120),
            (152, 223, 138),
            (255, 152, 150),
            (197, 176, 213),
            (196, 156, 148),
            (247, 182, 210),
            (219, 219, 141),
        ],
        alpha: 0.7,
    },
    PaletteDef {
        name: "business",
        rgb: &[
            (31, 78, 121),
            (46, 117, 182),
            (112, 173, 71),
            (255, 192, 0),
            (165, 165, 165),
            (237, 125, 49),
        ],
        alpha: 0.85,
    },
    PaletteDef {
        name: "monochrome",
        rgb: &[
            (33, 37, 41),
            (73, 80, 87),
            (108, 117, 125),
            (173, 181, 189),
            (206, 212, 218),
        ],
        alpha: 0.8,
    },
];

impl ColorPalette {
    /// Look up a palette by name; unknown or absent names give `default`.
    pub fn resolve(name: Option<&str>) -> Self {
        let def = name
            .and_then(|n| REGISTRY.iter().find(|d| d.name.eq_ignore_ascii_case(n.trim())))
            .unwrap_or(&REGISTRY[0]);
        Self::from_def(def)
    }

    fn from_def(def: &PaletteDef) -> Self {
        let rgba = |(r, g, b): &(u8, u8, u8), a: f64| format!("rgba({}, {}, {}, {})", r, g, b, a);
        ColorPalette {
            name: def.name.to_string(),
            primary: def.rgb.iter().map(|c| rgba(c, def.alpha)).collect(),
            border: def.rgb.iter().map(|c| rgba(c, 1.0)).collect(),
        }
    }

    pub fn names() -> Vec<&'static str> {
        REGISTRY.iter().map(|d| d.name).collect()
    }

    /// Fill colour for index `i`, cycling.
    pub fn primary_at(&self, i: usize) -> String {
        cycle(&self.primary, i)
    }

    /// Border colour for index `i`, cycling.
    pub fn border_at(&self, i: usize) -> String {
        cycle(&self.border, i)
    }
}

fn cycle(colors: &[String], i: usize) -> String {
    if colors.is_empty() {
        return String::new();
    }
    colors[i % colors.len()].clone()
}
