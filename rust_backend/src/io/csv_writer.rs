use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::services::ResultTable;

/// Write the header and every row of `table` as CSV.
pub fn write_table<W: Write>(table: &ResultTable, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.header())
        .context("Failed to write CSV header")?;

    for record in table.records() {
        wtr.write_record(&record).context("Failed to write CSV row")?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write `table` to `path`, creating parent directories as needed.
pub fn write_csv(table: &ResultTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_table(table, file).with_context(|| format!("Failed to write {}", path.display()))?;

    log::info!("Saved data to {} ({} rows)", path.display(), table.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        DayEvents, EvaluationInstant, EventKind, InstantKind, ModelVerdict, ObservableVector,
        ResultRow,
    };
    use crate::models::{ModelSelection, VisibilityModel};
    use chrono::{NaiveDate, TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_table() -> ResultTable {
        let selection = ModelSelection::parse(["ilyas", "yallop"]).unwrap();
        let mut table = ResultTable::new(&selection);
        let sunset = Utc.with_ymd_and_hms(2025, 3, 30, 8, 18, 42).unwrap();
        table.push(ResultRow {
            instant: EvaluationInstant::new(sunset, InstantKind::Event(EventKind::Sunset)),
            events: DayEvents::empty(NaiveDate::from_ymd_opt(2025, 3, 30).unwrap())
                .with(EventKind::Sunset, sunset),
            observables: ObservableVector {
                sun_altitude_deg: -0.6,
                moon_altitude_deg: 4.25,
                moon_sun_separation_deg: 9.9,
                moon_distance_km: 401_000.0,
                sun_distance_km: 149_200_000.0,
                moon_phase_angle_deg: 10.0,
                moon_illumination_fraction: 0.0076,
                moon_crescent_width_deg: 1.368,
                moon_age_days: 9214.6,
                moon_apparent_magnitude: -12.7,
                sun_apparent_magnitude: -26.74,
            },
            lag_minutes: 0.0,
            composite_score: 77.66,
            verdicts: [
                (VisibilityModel::Ilyas, ModelVerdict::new(0, "Not Visible")),
                (VisibilityModel::Yallop, ModelVerdict::new(3, "D: Will need optical aid")),
            ]
            .into_iter()
            .collect(),
        });
        table
    }

    #[test]
    fn test_write_csv_creates_file_with_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let table = sample_table();

        write_csv(&table, &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 22);
        assert_eq!(&headers[0], "datetime");
        assert_eq!(&headers[21], "yallop_label");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "2025-03-30T08:18:42");
        assert_eq!(&rows[0][1], "sunset");
        assert_eq!(&rows[0][2], "");
        assert_eq!(&rows[0][3], "2025-03-30T08:18:42Z");
        assert_eq!(&rows[0][21], "D: Will need optical aid");
    }

    #[test]
    fn test_empty_table_writes_header_only() {
        let selection = ModelSelection::parse(["saao"]).unwrap();
        let table = ResultTable::new(&selection);
        let mut buffer = Vec::new();
        write_table(&table, &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.trim_end().ends_with("saao_score,saao_label"));
    }
}
