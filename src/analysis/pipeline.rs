use log::{debug, info, warn};
use rayon::prelude::*;
use crate::analysis::config_store::ConfigStore;
use crate::analysis::error::AnalysisError;
use crate::analysis::features::{FeatureExtractor, FeatureParams, FeatureSet};
use crate::analysis::judgment::{judge, Judgment, JudgmentConfig, Measurements};
use crate::analysis::loader::{load_waveform, SampleTable, Waveform};
use crate::analysis::result::{BatchResult, ResultAssembler};
/// Everything a viewer needs for one successfully loaded line.
#[derive(Clone, Debug)]
pub struct LineAnalysis {
    pub waveform: Waveform,
    pub features: FeatureSet,
    pub measurements: Measurements,
    pub judgment: Judgment,
}
impl LineAnalysis {
    pub fn peak_markers(&self) -> Vec<(usize, f64)> {
        self.features.peak_markers()
    }
    pub fn crossing_markers(&self) -> Vec<(usize, f64)> {
        self.features.crossing_markers()
    }
}
#[derive(Debug)]
pub struct LineReport {
    pub line_number: usize,
    pub outcome: Result<LineAnalysis, AnalysisError>,
}
/// Per-line detail plus the tabular result of a whole test run.
#[derive(Debug)]
pub struct BatchReport {
    pub lines: Vec<LineReport>,
    pub result: BatchResult,
}
/// Load, extract and judge each line independently, then assemble the run.
pub struct ImpulseAnalyzer {
    extractor: FeatureExtractor,
}
impl Default for ImpulseAnalyzer {
    fn default() -> Self {
        Self::new(FeatureParams::default())
    }
}
impl ImpulseAnalyzer {
    pub fn new(params: FeatureParams) -> Self {
        Self {
            extractor: FeatureExtractor::new(params),
        }
    }
    pub fn analyze_waveform(&self, waveform: Waveform, config: &JudgmentConfig) -> LineAnalysis {
        let features = self.extractor.extract(&waveform);
        let measurements = Measurements::from_features(&features);
        let judgment = judge(&measurements, config);
        debug!(
            "{} samples, {} peaks, {} zero crossings -> {}",
            waveform.len(),
            features.peaks.len(),
            features.zero_crossings.len(),
            judgment.verdict
        );
        LineAnalysis {
            waveform,
            features,
            measurements,
            judgment,
        }
    }
    pub fn analyze_table(
        &self,
        table: &SampleTable,
        config: &JudgmentConfig,
    ) -> Result<LineAnalysis, AnalysisError> {
        let waveform = load_waveform(table)?;
        Ok(self.analyze_waveform(waveform, config))
    }
    pub fn run_tables(
        &self,
        serial: &str,
        tables: &[SampleTable],
        config: &JudgmentConfig,
    ) -> BatchReport {
        self.run_lines(serial, tables, config, load_waveform)
    }
    /// Lines given as raw export text; a line whose text does not parse is
    /// reported as a failed line like any other load error.
    pub fn run_csv<S: AsRef<str> + Sync>(
        &self,
        serial: &str,
        texts: &[S],
        config: &JudgmentConfig,
    ) -> BatchReport {
        self.run_lines(serial, texts, config, |text| {
            load_waveform(&SampleTable::parse_csv(text.as_ref())?)
        })
    }
    /// Reads one config snapshot from `store` and runs the batch against it.
    pub fn run_csv_with_store<C: ConfigStore, S: AsRef<str> + Sync>(
        &self,
        store: &C,
        serial: &str,
        texts: &[S],
    ) -> Result<BatchReport, AnalysisError> {
        let config = store.load()?;
        config.validate()?;
        Ok(self.run_csv(serial, texts, &config))
    }
    fn run_lines<T, F>(
        &self,
        serial: &str,
        inputs: &[T],
        config: &JudgmentConfig,
        load: F,
    ) -> BatchReport
    where
        T: Sync,
        F: Fn(&T) -> Result<Waveform, AnalysisError> + Sync,
    {
        let lines: Vec<LineReport> = inputs
            .par_iter()
            .enumerate()
            .map(|(idx, input)| LineReport {
                line_number: idx + 1,
                outcome: load(input).map(|waveform| self.analyze_waveform(waveform, config)),
            })
            .collect();
        let mut assembler = ResultAssembler::new(serial);
        for line in &lines {
            match &line.outcome {
                Ok(analysis) => {
                    assembler.push_judged(analysis.measurements, analysis.judgment.verdict);
                }
                Err(err) => {
                    warn!("line {}: {err}", line.line_number);
                    assembler.push_failed(err.to_string());
                }
            }
        }
        let result = assembler.finish();
        match result.verdict() {
            Some(verdict) => info!("serial {serial}: {} lines, overall {verdict}", lines.len()),
            None => info!("serial {serial}: no lines processed"),
        }
        BatchReport { lines, result }
    }
}
