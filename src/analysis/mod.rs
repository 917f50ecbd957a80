// src/analysis/mod.rs
// 冲击试验波形分析: 读取 -> 特征提取 -> 判定 -> 结果汇总
pub mod config_store;
pub mod error;
pub mod features;
pub mod judgment;
pub mod loader;
pub mod pipeline;
pub mod result;
// 公开导出常用类型，方便外部调用
pub use config_store::{ConfigStore, JsonFileConfigStore, MemoryConfigStore};
pub use error::AnalysisError;
pub use features::{FeatureExtractor, FeatureParams, FeatureSet, Peak, ZeroCrossing};
pub use judgment::{
    judge, CheckStatus, FieldCheck, FieldRule, Judgment, JudgmentConfig, JudgmentField,
    Measurements, Verdict,
};
pub use loader::{load_waveform, load_waveform_csv, ChannelSample, SampleTable, Waveform};
pub use pipeline::{BatchReport, ImpulseAnalyzer, LineAnalysis, LineReport};
pub use result::{BatchResult, LineResult, ResultAssembler, RESULT_COLUMNS};
