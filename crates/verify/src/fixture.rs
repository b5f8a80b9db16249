//! Deterministic CSV fixtures for the dealer bulk-upload flow

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::VerifyResult;

/// Column order the bulk-upload importer expects.
pub const CSV_HEADER: &str = "name,address,city,lat,lng,brands,languages,typeOfCars,modelsAvailable";

/// One dealer record, cell for cell.
///
/// Cells stay strings: the importer does its own typing, and keeping raw
/// cells makes the output byte-stable and lets tests express rows the
/// importer must reject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealerRow {
    pub name: String,
    pub address: String,
    pub city: String,
    pub lat: String,
    pub lng: String,
    pub brands: String,
    pub languages: String,
    pub type_of_cars: String,
    pub models_available: String,
}

impl DealerRow {
    /// The known-good row every verification run uploads.
    pub fn valid() -> Self {
        Self {
            name: "Test Dealer".to_string(),
            address: "123 Main St".to_string(),
            city: "Testville".to_string(),
            lat: "40.7128".to_string(),
            lng: "-74.0060".to_string(),
            brands: "TestBrand".to_string(),
            languages: "English".to_string(),
            type_of_cars: "New".to_string(),
            models_available: "TestModel".to_string(),
        }
    }

    /// A row the importer must reject: latitude is not a number.
    pub fn invalid_latitude() -> Self {
        Self {
            lat: "not-a-number".to_string(),
            ..Self::valid()
        }
    }

    fn cells(&self) -> [&str; 9] {
        [
            &self.name,
            &self.address,
            &self.city,
            &self.lat,
            &self.lng,
            &self.brands,
            &self.languages,
            &self.type_of_cars,
            &self.models_available,
        ]
    }
}

/// A complete fixture file: the fixed header plus data rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealerFixture {
    pub rows: Vec<DealerRow>,
}

impl DealerFixture {
    /// Fixture with exactly one valid dealer row, the standard upload input.
    pub fn single_valid_row() -> Self {
        Self {
            rows: vec![DealerRow::valid()],
        }
    }

    /// Render the fixture. Identical rows always render to identical bytes.
    pub fn to_csv(&self) -> String {
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for row in &self.rows {
            let cells: Vec<String> = row.cells().iter().map(|c| escape_cell(c)).collect();
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        out
    }

    /// Write the rendered fixture to disk.
    pub fn write(&self, path: &Path) -> VerifyResult<()> {
        std::fs::write(path, self.to_csv())?;
        Ok(())
    }
}

/// Quote a cell when it would otherwise break the row apart.
fn escape_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
