//! Generate a deterministic sample stop dataset at `data/stops_clean.xlsx`.
//!
//! The file deliberately uses the legacy `avgLat`/`avgLon` headers, leaves
//! some `fullName` cells empty, and plants one unparseable latitude, so a
//! demo run exercises the loader's whole cleaning pass.

use anyhow::Result;
use rust_xlsxwriter::Workbook;

const OUTPUT: &str = "data/stops_clean.xlsx";
const N_STOPS: usize = 250;

// Prague city center.
const CENTER_LAT: f64 = 50.083;
const CENTER_LON: f64 = 14.418;

const TRAFFIC_TYPES: [&str; 8] = [
    "bus",
    "tram",
    "train",
    "trolleybus",
    "metroA",
    "metroB",
    "metroC",
    "ferry",
];

const DISTRICTS: [&str; 6] = ["AB", "AC", "AD", "AE", "PZ", "PV"];

const MUNICIPALITIES: [&str; 5] = ["Praha", "Kladno", "Beroun", "Brandýs", "Říčany"];

const NAME_PARTS: [&str; 12] = [
    "Nádraží", "Náměstí", "Sídliště", "Škola", "Hřbitov", "Kostel", "Rozcestí", "Most",
    "Dvůr", "Lípa", "Vrch", "Brána",
];

const PLACE_PARTS: [&str; 12] = [
    "Holešovice", "Smíchov", "Karlín", "Vinohrady", "Žižkov", "Libeň", "Braník", "Krč",
    "Dejvice", "Střešovice", "Hloubětín", "Radotín",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform float in [0, 1).
    fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        options[(self.next_u64() as usize) % options.len()]
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet().set_name("stops")?;

    let headers = [
        "stop_name",
        "fullName",
        "municipality",
        "district_code",
        "mainTrafficType",
        "avgLat",
        "avgLon",
    ];
    for (col, name) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }

    for i in 0..N_STOPS {
        let row = (i + 1) as u32;
        let place = rng.pick(&PLACE_PARTS);
        let part = rng.pick(&NAME_PARTS);
        let name = format!("{place} {part}");
        let municipality = rng.pick(&MUNICIPALITIES);

        sheet.write_string(row, 0, &name)?;
        // Roughly every sixth stop has no long-form name.
        if rng.uniform() > 1.0 / 6.0 {
            sheet.write_string(row, 1, format!("{municipality}, {name}"))?;
        }
        sheet.write_string(row, 2, municipality)?;
        sheet.write_string(row, 3, rng.pick(&DISTRICTS))?;
        sheet.write_string(row, 4, rng.pick(&TRAFFIC_TYPES))?;

        let lat = CENTER_LAT + (rng.uniform() - 0.5) * 0.8;
        let lon = CENTER_LON + (rng.uniform() - 0.5) * 1.4;
        if i == 17 {
            // One broken coordinate; the loader must drop exactly this row.
            sheet.write_string(row, 5, "not a number")?;
        } else {
            sheet.write_number(row, 5, lat)?;
        }
        sheet.write_number(row, 6, lon)?;
    }

    std::fs::create_dir_all("data")?;
    workbook.save(OUTPUT)?;
    println!("wrote {N_STOPS} stops to {OUTPUT}");
    Ok(())
}
