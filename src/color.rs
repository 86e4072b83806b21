use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Color table: traffic type → RGB
// ---------------------------------------------------------------------------

pub type Rgb = [u8; 3];

/// Fixed mapping from traffic-type category to marker color.
///
/// Lookup is lower-cased; categories outside the table (and null cells) get
/// the light-gray default.
#[derive(Debug, Clone)]
pub struct ColorTable {
    mapping: BTreeMap<String, Rgb>,
    default_color: Rgb,
}

impl Default for ColorTable {
    fn default() -> Self {
        let mapping: BTreeMap<String, Rgb> = [
            ("bus", [255, 76, 64]),
            ("train", [66, 135, 245]),
            ("tram", [255, 180, 0]),
            ("trolleybus", [132, 92, 255]),
            ("metroa", [0, 200, 120]),
            ("metrob", [0, 160, 130]),
            ("metroc", [0, 120, 140]),
            ("ferry", [0, 180, 220]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        ColorTable {
            mapping,
            default_color: [200, 200, 200],
        }
    }
}

impl ColorTable {
    /// Look up the color for a traffic-type value; `None` falls back to the
    /// default the same way an unknown category does.
    pub fn color_for(&self, traffic_type: Option<&str>) -> Rgb {
        traffic_type
            .and_then(|t| self.mapping.get(&t.to_lowercase()))
            .copied()
            .unwrap_or(self.default_color)
    }

    pub fn default_color(&self) -> Rgb {
        self.default_color
    }
}
