use std::borrow::Cow;
use log::debug;
use ndarray::{Array2, Axis};
use crate::analysis::error::AnalysisError;
/// Probe columns every recording must carry.
pub const PULSE_COLUMNS: [&str; CHANNEL_COUNT] =
    ["Pulse 1", "Pulse 2", "Pulse 3", "Pulse 4", "Pulse 5"];
pub const CHANNEL_COUNT: usize = 5;
// Spellings treated as a missing reading, the usual spreadsheet/dataframe NA set.
const MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];
/// Raw recording as read from the instrument export, before any typing.
#[derive(Clone, Debug, Default)]
pub struct SampleTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}
impl SampleTable {
    /// Parses comma separated text with a header line. Blank lines are skipped;
    /// short rows are padded with missing cells.
    pub fn parse_csv(text: &str) -> Result<Self, AnalysisError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let Some(header_line) = lines.next() else {
            return Ok(Self::default());
        };
        let headers: Vec<String> = split_cells(header_line).map(str::to_owned).collect();
        let mut rows = Vec::new();
        for (idx, line) in lines.enumerate() {
            let mut cells: Vec<Option<String>> = split_cells(line)
                .map(|cell| (!is_missing(cell)).then(|| cell.to_owned()))
                .collect();
            if cells.len() > headers.len() {
                return Err(AnalysisError::RaggedRow {
                    row: idx + 1,
                    expected: headers.len(),
                    actual: cells.len(),
                });
            }
            cells.resize(headers.len(), None);
            rows.push(cells);
        }
        Ok(Self { headers, rows })
    }
    pub fn column_index(&self, name: &str) -> Result<usize, AnalysisError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| AnalysisError::MissingColumn(name.to_owned()))
    }
}
fn split_cells(line: &str) -> impl Iterator<Item = &str> {
    line.split(',').map(|cell| cell.trim().trim_matches('"').trim())
}
fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}
/// One time step of the five probe readings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelSample(pub [i64; CHANNEL_COUNT]);
impl ChannelSample {
    /// Returns `Ok(None)` when any reading is missing; such rows are dropped, not failed.
    pub fn from_cells(
        row: usize,
        cells: &[Option<&str>; CHANNEL_COUNT],
    ) -> Result<Option<Self>, AnalysisError> {
        if cells.iter().any(|c| c.map_or(true, is_missing)) {
            return Ok(None);
        }
        let mut values = [0i64; CHANNEL_COUNT];
        for (channel, (slot, cell)) in values.iter_mut().zip(cells).enumerate() {
            let raw = cell.unwrap_or_default();
            *slot = normalize_sample_text(raw)
                .parse::<i64>()
                .map_err(|_| AnalysisError::MalformedSample {
                    row,
                    column: PULSE_COLUMNS[channel].to_owned(),
                    value: raw.to_owned(),
                })?;
        }
        Ok(Some(Self(values)))
    }
}
/// Collapses the stray space the recorder writes after a minus sign ("- 12" -> "-12").
pub fn normalize_sample_text(raw: &str) -> Cow<'_, str> {
    let trimmed = raw.trim();
    match trimmed.strip_prefix('-') {
        Some(rest) if rest.starts_with(char::is_whitespace) => {
            let digits = rest.trim_start();
            if digits.starts_with(|c: char| c.is_ascii_digit()) {
                Cow::Owned(format!("-{digits}"))
            } else {
                Cow::Borrowed(trimmed)
            }
        }
        _ => Cow::Borrowed(trimmed),
    }
}
/// Averaged amplitude trace of one test line. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Waveform {
    samples: Vec<f64>,
}
impl Waveform {
    pub fn from_samples(samples: Vec<f64>) -> Self {
        Self { samples }
    }
    /// Row-wise mean across the probe channels, in row order.
    pub fn from_channel_samples(rows: &[ChannelSample]) -> Result<Self, AnalysisError> {
        let flat: Vec<f64> = rows
            .iter()
            .flat_map(|row| row.0.iter().map(|&v| v as f64))
            .collect();
        let matrix = Array2::from_shape_vec((rows.len(), CHANNEL_COUNT), flat)?;
        let samples = matrix
            .mean_axis(Axis(1))
            .map(|mean| mean.to_vec())
            .unwrap_or_default();
        Ok(Self { samples })
    }
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn get(&self, index: usize) -> Option<f64> {
        self.samples.get(index).copied()
    }
}
/// Drops incomplete rows, normalizes and parses the probe readings, then averages them.
pub fn load_waveform(table: &SampleTable) -> Result<Waveform, AnalysisError> {
    let mut columns = [0usize; CHANNEL_COUNT];
    for (slot, name) in columns.iter_mut().zip(PULSE_COLUMNS) {
        *slot = table.column_index(name)?;
    }
    let mut kept = Vec::with_capacity(table.rows.len());
    for (idx, row) in table.rows.iter().enumerate() {
        let cells = columns.map(|col| row.get(col).and_then(|c| c.as_deref()));
        if let Some(sample) = ChannelSample::from_cells(idx + 1, &cells)? {
            kept.push(sample);
        }
    }
    let dropped = table.rows.len() - kept.len();
    if dropped > 0 {
        debug!("dropped {dropped} incomplete sample rows");
    }
    Waveform::from_channel_samples(&kept)
}
/// Convenience for collaborators holding the raw export text.
pub fn load_waveform_csv(text: &str) -> Result<Waveform, AnalysisError> {
    load_waveform(&SampleTable::parse_csv(text)?)
}
#[cfg(test)]
mod tests {
    use super::*;
    const HEADER: &str = "Time,Pulse 1,Pulse 2,Pulse 3,Pulse 4,Pulse 5";
    #[test]
    fn stray_minus_space_is_collapsed() {
        assert_eq!(normalize_sample_text("- 12"), "-12");
        assert_eq!(normalize_sample_text("-   7"), "-7");
        assert_eq!(normalize_sample_text(" 42 "), "42");
        assert_eq!(normalize_sample_text("-3"), "-3");
        assert_eq!(normalize_sample_text("- x"), "- x");
    }
    #[test]
    fn averages_rows_in_order() {
        let text = format!("{HEADER}\n0,1,2,3,4,5\n1,- 5,-5,- 5,-5,- 5\n2,1,1,1,1,2\n");
        let waveform = load_waveform_csv(&text).unwrap();
        assert_eq!(waveform.samples(), &[3.0, -5.0, 1.2]);
    }
    #[test]
    fn rows_with_missing_cells_are_dropped() {
        let rows = [
            "0,10,10,10,10,10",
            "1,10,,10,10,10",
            "2,NaN,1,1,1,1",
            "3,20,20,20,20",
            "4,0,0,0,0,0",
        ];
        let text = format!("{HEADER}\n{}\n", rows.join("\n"));
        let waveform = load_waveform_csv(&text).unwrap();
        assert_eq!(waveform.samples(), &[10.0, 0.0]);
    }
    #[test]
    fn missing_row_is_dropped_before_parsing() {
        let text = format!("{HEADER}\n0,abc,,1,1,1\n1,2,2,2,2,2\n");
        let waveform = load_waveform_csv(&text).unwrap();
        assert_eq!(waveform.samples(), &[2.0]);
    }
    #[test]
    fn null_spellings_drop_the_row() {
        for marker in ["NULL", "#N/A", "<NA>", "-NaN", "#NA", "#N/A N/A", "-1.#IND", "1.#QNAN"] {
            let text = format!("{HEADER}\n0,{marker},1,1,1,1\n1,2,2,2,2,2\n");
            let waveform = load_waveform_csv(&text).unwrap();
            assert_eq!(waveform.samples(), &[2.0], "marker {marker}");
        }
    }
    #[test]
    fn decimal_cells_are_not_integers() {
        let text = format!("{HEADER}\n0,1.0,1,1,1,1\n");
        assert!(matches!(
            load_waveform_csv(&text),
            Err(AnalysisError::MalformedSample { value, .. }) if value == "1.0"
        ));
    }
    #[test]
    fn unparseable_cell_is_reported() {
        let text = format!("{HEADER}\n0,1,1,1,1,1\n1,1,1,x7,1,1\n");
        match load_waveform_csv(&text) {
            Err(AnalysisError::MalformedSample { row, column, value }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "Pulse 3");
                assert_eq!(value, "x7");
            }
            other => panic!("expected malformed sample, got {other:?}"),
        }
    }
    #[test]
    fn missing_pulse_column_is_reported() {
        let text = "Pulse 1,Pulse 2,Pulse 3,Pulse 4\n1,2,3,4\n";
        assert!(matches!(
            load_waveform_csv(text),
            Err(AnalysisError::MissingColumn(name)) if name == "Pulse 5"
        ));
    }
    #[test]
    fn empty_input_yields_empty_waveform_or_missing_column() {
        assert!(matches!(load_waveform_csv(""), Err(AnalysisError::MissingColumn(_))));
        let waveform = load_waveform_csv(&format!("{HEADER}\n")).unwrap();
        assert!(waveform.is_empty());
    }
}
