// src/main.rs
use std::fs;
use std::path::PathBuf;
use anyhow::{bail, Context, Result};
use impulse_judge::{ImpulseAnalyzer, JsonFileConfigStore};
use log::{info, warn};
// 一次试验的素线数量
const LINES_PER_RUN: usize = 6;
const USAGE: &str = "usage: impulse-judge <serial> <config.json> <line1.csv> ... <line6.csv>";
// 读取导出文件；非 UTF-8 的表头（Shift-JIS）只影响无关列
fn read_export(path: &PathBuf) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
// 入口函数
fn main() -> Result<()> {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let serial = args.next().context(USAGE)?;
    let config_path = args.next().context(USAGE)?;
    let files: Vec<PathBuf> = args.map(PathBuf::from).collect();
    if files.is_empty() {
        bail!(USAGE);
    }
    if files.len() != LINES_PER_RUN {
        warn!("expected {LINES_PER_RUN} line files, got {}", files.len());
    }
    let texts = files.iter().map(read_export).collect::<Result<Vec<_>>>()?;
    let store = JsonFileConfigStore::new(config_path);
    let report = ImpulseAnalyzer::default()
        .run_csv_with_store(&store, &serial, &texts)
        .with_context(|| format!("judgment config {} is unusable", store.path().display()))?;
    for line in &report.lines {
        if let Ok(analysis) = &line.outcome {
            for check in analysis.judgment.failures() {
                info!(
                    "line {}: {} {:?} (value {:?})",
                    line.line_number, check.field, check.status, check.value
                );
            }
        }
    }
    print!("{}", report.result.to_csv());
    match report.result.verdict() {
        Some(verdict) => println!("総合判定: {verdict}"),
        None => println!("総合判定: -"),
    }
    Ok(())
}
