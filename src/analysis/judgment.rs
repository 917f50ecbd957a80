use std::collections::BTreeMap;
use std::fmt;
use log::debug;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use crate::analysis::error::AnalysisError;
use crate::analysis::features::FeatureSet;
pub const PEAK_FIELDS: usize = 4;
pub const CROSSING_FIELDS: usize = 6;
/// The ten measurements a line can be judged on. Keys match the labels the
/// settings page persists; ASCII aliases are accepted on input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JudgmentField {
    #[serde(rename = "ピーク1", alias = "peak1")]
    Peak1,
    #[serde(rename = "ピーク2", alias = "peak2")]
    Peak2,
    #[serde(rename = "ピーク3", alias = "peak3")]
    Peak3,
    #[serde(rename = "ピーク4", alias = "peak4")]
    Peak4,
    #[serde(rename = "ゼロクロス点1", alias = "zerocross1")]
    ZeroCross1,
    #[serde(rename = "ゼロクロス点2", alias = "zerocross2")]
    ZeroCross2,
    #[serde(rename = "ゼロクロス点3", alias = "zerocross3")]
    ZeroCross3,
    #[serde(rename = "ゼロクロス点4", alias = "zerocross4")]
    ZeroCross4,
    #[serde(rename = "ゼロクロス点5", alias = "zerocross5")]
    ZeroCross5,
    #[serde(rename = "ゼロクロス点6", alias = "zerocross6")]
    ZeroCross6,
}
impl JudgmentField {
    pub const ALL: [JudgmentField; PEAK_FIELDS + CROSSING_FIELDS] = [
        JudgmentField::Peak1,
        JudgmentField::Peak2,
        JudgmentField::Peak3,
        JudgmentField::Peak4,
        JudgmentField::ZeroCross1,
        JudgmentField::ZeroCross2,
        JudgmentField::ZeroCross3,
        JudgmentField::ZeroCross4,
        JudgmentField::ZeroCross5,
        JudgmentField::ZeroCross6,
    ];
    pub fn label(self) -> &'static str {
        match self {
            JudgmentField::Peak1 => "ピーク1",
            JudgmentField::Peak2 => "ピーク2",
            JudgmentField::Peak3 => "ピーク3",
            JudgmentField::Peak4 => "ピーク4",
            JudgmentField::ZeroCross1 => "ゼロクロス点1",
            JudgmentField::ZeroCross2 => "ゼロクロス点2",
            JudgmentField::ZeroCross3 => "ゼロクロス点3",
            JudgmentField::ZeroCross4 => "ゼロクロス点4",
            JudgmentField::ZeroCross5 => "ゼロクロス点5",
            JudgmentField::ZeroCross6 => "ゼロクロス点6",
        }
    }
    /// Position in [`JudgmentField::ALL`].
    pub fn ordinal(self) -> usize {
        self as usize
    }
}
impl fmt::Display for JudgmentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NG")]
    Ng,
}
impl Verdict {
    pub fn is_ok(self) -> bool {
        self == Verdict::Ok
    }
    /// OK iff every verdict is OK; `None` when there is nothing to combine.
    pub fn aggregate(verdicts: impl IntoIterator<Item = Verdict>) -> Option<Verdict> {
        let mut seen = false;
        let mut all_ok = true;
        for v in verdicts {
            seen = true;
            all_ok &= v.is_ok();
        }
        seen.then_some(if all_ok { Verdict::Ok } else { Verdict::Ng })
    }
}
impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Ok => "OK",
            Verdict::Ng => "NG",
        })
    }
}
/// Threshold rule for one field. Omitted keys fall back to the settings page defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRule {
    #[serde(rename = "use")]
    pub enabled: bool,
    pub min: f64,
    pub max: f64,
}
impl Default for FieldRule {
    fn default() -> Self {
        Self {
            enabled: false,
            min: 0.0,
            max: 1000.0,
        }
    }
}
impl FieldRule {
    pub fn range(min: f64, max: f64) -> Self {
        Self {
            enabled: true,
            min,
            max,
        }
    }
}
/// Snapshot of the pass/fail policy read before a batch is judged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JudgmentConfig {
    rules: BTreeMap<JudgmentField, FieldRule>,
}
impl JudgmentConfig {
    pub fn rule(&self, field: JudgmentField) -> FieldRule {
        self.rules.get(&field).copied().unwrap_or_default()
    }
    pub fn set(&mut self, field: JudgmentField, rule: FieldRule) {
        self.rules.insert(field, rule);
    }
    pub fn with_range(mut self, field: JudgmentField, min: f64, max: f64) -> Self {
        self.set(field, FieldRule::range(min, max));
        self
    }
    pub fn enabled_fields(&self) -> impl Iterator<Item = (JudgmentField, FieldRule)> + '_ {
        JudgmentField::ALL
            .into_iter()
            .map(|field| (field, self.rule(field)))
            .filter(|(_, rule)| rule.enabled)
    }
    /// Rejects enabled rules whose minimum exceeds their maximum.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        match self.enabled_fields().find(|(_, rule)| rule.min > rule.max) {
            Some((field, rule)) => Err(AnalysisError::InvalidConfig {
                field,
                min: rule.min,
                max: rule.max,
            }),
            None => Ok(()),
        }
    }
}
/// Measured value per field; `None` marks a feature that was not detected.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Measurements {
    values: [Option<f64>; PEAK_FIELDS + CROSSING_FIELDS],
}
impl Measurements {
    /// Peak fields take the amplitude at each peak, crossing fields the
    /// crossing position in display units.
    pub fn from_features(features: &FeatureSet) -> Self {
        let mut values = [None; PEAK_FIELDS + CROSSING_FIELDS];
        for (slot, peak) in values[..PEAK_FIELDS].iter_mut().zip(&features.peaks) {
            *slot = Some(peak.amplitude);
        }
        for (slot, crossing) in values[PEAK_FIELDS..].iter_mut().zip(&features.zero_crossings) {
            *slot = Some(crossing.position as f64);
        }
        Self { values }
    }
    pub fn get(&self, field: JudgmentField) -> Option<f64> {
        self.values[field.ordinal()]
    }
    pub fn set(&mut self, field: JudgmentField, value: Option<f64>) {
        self.values[field.ordinal()] = value;
    }
    pub fn require(&self, field: JudgmentField) -> Result<f64, AnalysisError> {
        self.get(field)
            .filter(|v| v.is_finite())
            .ok_or(AnalysisError::MissingMeasurement(field))
    }
    pub fn iter(&self) -> impl Iterator<Item = (JudgmentField, Option<f64>)> + '_ {
        JudgmentField::ALL.into_iter().zip(self.values)
    }
}
impl Serialize for Measurements {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.label(), &value)?;
        }
        map.end()
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CheckStatus {
    Pass,
    BelowMin,
    AboveMax,
    Missing,
}
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FieldCheck {
    pub field: JudgmentField,
    pub value: Option<f64>,
    pub status: CheckStatus,
}
impl FieldCheck {
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}
/// Outcome for one line: the verdict plus one check per enabled field.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Judgment {
    pub verdict: Verdict,
    pub checks: Vec<FieldCheck>,
}
impl Judgment {
    pub fn failures(&self) -> impl Iterator<Item = &FieldCheck> {
        self.checks.iter().filter(|c| !c.passed())
    }
}
/// Applies `config` to `measurements`. Disabled fields are skipped even when
/// absent; an enabled field with no measurement fails.
pub fn judge(measurements: &Measurements, config: &JudgmentConfig) -> Judgment {
    let checks: Vec<FieldCheck> = config
        .enabled_fields()
        .map(|(field, rule)| {
            let status = match measurements.require(field) {
                Ok(v) if v < rule.min => CheckStatus::BelowMin,
                Ok(v) if v > rule.max => CheckStatus::AboveMax,
                Ok(_) => CheckStatus::Pass,
                Err(err) => {
                    debug!("{err}");
                    CheckStatus::Missing
                }
            };
            FieldCheck {
                field,
                value: measurements.get(field),
                status,
            }
        })
        .collect();
    let verdict = if checks.iter().all(FieldCheck::passed) {
        Verdict::Ok
    } else {
        Verdict::Ng
    };
    Judgment { verdict, checks }
}
