use serde::Serialize;
use crate::analysis::judgment::{JudgmentField, Measurements, Verdict};
/// Column order of the result table shown to operators.
pub const RESULT_COLUMNS: [&str; 14] = [
    "シリアル",
    "素線番号",
    "判定結果",
    "ピーク1",
    "ピーク2",
    "ピーク3",
    "ピーク4",
    "ゼロクロス点1",
    "ゼロクロス点2",
    "ゼロクロス点3",
    "ゼロクロス点4",
    "ゼロクロス点5",
    "ゼロクロス点6",
    "読込エラー",
];
/// Record for one processed line. Absent features stay `None`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineResult {
    pub serial: String,
    pub line_number: usize,
    pub verdict: Verdict,
    #[serde(flatten)]
    pub measurements: Measurements,
    /// Set when the line could not be loaded; such a line is always NG.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}
impl LineResult {
    pub fn judged(
        serial: &str,
        line_number: usize,
        measurements: Measurements,
        verdict: Verdict,
    ) -> Self {
        Self {
            serial: serial.to_owned(),
            line_number,
            verdict,
            measurements,
            failure: None,
        }
    }
    pub fn failed(serial: &str, line_number: usize, reason: impl Into<String>) -> Self {
        Self {
            serial: serial.to_owned(),
            line_number,
            verdict: Verdict::Ng,
            measurements: Measurements::default(),
            failure: Some(reason.into()),
        }
    }
    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
    pub fn value(&self, field: JudgmentField) -> Option<f64> {
        self.measurements.get(field)
    }
    fn csv_row(&self) -> String {
        let mut cells = vec![
            csv_cell(&self.serial),
            self.line_number.to_string(),
            self.verdict.to_string(),
        ];
        cells.extend(
            self.measurements
                .iter()
                .map(|(_, v)| v.map(|v| v.to_string()).unwrap_or_default()),
        );
        cells.push(self.failure.as_deref().map(csv_cell).unwrap_or_default());
        cells.join(",")
    }
}
/// Ordered line records and the overall verdict of the run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BatchResult {
    lines: Vec<LineResult>,
    verdict: Option<Verdict>,
}
impl BatchResult {
    pub fn from_lines(lines: Vec<LineResult>) -> Self {
        let verdict = Verdict::aggregate(lines.iter().map(|l| l.verdict));
        Self { lines, verdict }
    }
    pub fn lines(&self) -> &[LineResult] {
        &self.lines
    }
    /// OK iff every line is OK; `None` for an empty batch.
    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }
    pub fn to_csv(&self) -> String {
        let mut out = RESULT_COLUMNS.join(",");
        out.push('\n');
        for line in &self.lines {
            out.push_str(&line.csv_row());
            out.push('\n');
        }
        out
    }
}
/// Builds line records numbered from 1 in input order.
pub struct ResultAssembler {
    serial: String,
    lines: Vec<LineResult>,
}
impl ResultAssembler {
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            lines: Vec::new(),
        }
    }
    fn next_line_number(&self) -> usize {
        self.lines.len() + 1
    }
    pub fn push_judged(&mut self, measurements: Measurements, verdict: Verdict) -> &LineResult {
        let line = LineResult::judged(&self.serial, self.next_line_number(), measurements, verdict);
        self.push(line)
    }
    pub fn push_failed(&mut self, reason: impl Into<String>) -> &LineResult {
        let line = LineResult::failed(&self.serial, self.next_line_number(), reason);
        self.push(line)
    }
    fn push(&mut self, line: LineResult) -> &LineResult {
        self.lines.push(line);
        &self.lines[self.lines.len() - 1]
    }
    pub fn finish(self) -> BatchResult {
        BatchResult::from_lines(self.lines)
    }
}
fn csv_cell(text: &str) -> String {
    if text.contains([',', '"', '\n']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_owned()
    }
}
