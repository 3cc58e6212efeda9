//! 场景描述（JSON）
//!
//! 描述一组周期发包应用与全局停止时刻，加载后安装到仿真器中。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::demo::{AppId, DemoWorld, SenderOpts};
use crate::sim::{SimDuration, SimError, SimTime, Simulator};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    /// 全局停止时刻（秒）；缺省时运行到队列为空
    #[serde(default)]
    pub stop_s: Option<f64>,
    #[serde(default)]
    pub senders: Vec<SenderSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SenderSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_s: Option<f64>,
    #[serde(default)]
    pub stop_s: Option<f64>,
    #[serde(default)]
    pub interval_ms: Option<f64>,
    #[serde(default)]
    pub max_packets: Option<u64>,
    #[serde(default)]
    pub pkt_bytes: Option<u32>,
    #[serde(default)]
    pub latency_us: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse scenario: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid scenario: {0}")]
    Invalid(String),
    #[error(transparent)]
    Sim(#[from] SimError),
}

fn non_negative(what: &str, v: Option<f64>) -> Result<(), ScenarioError> {
    match v {
        Some(x) if !x.is_finite() || x < 0.0 => Err(ScenarioError::Invalid(format!(
            "{what} must be a non-negative number, got {x}"
        ))),
        _ => Ok(()),
    }
}

impl ScenarioSpec {
    pub fn from_json_str(raw: &str) -> Result<Self, ScenarioError> {
        let spec: ScenarioSpec = serde_json::from_str(raw)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_path(path: &Path) -> Result<Self, ScenarioError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ScenarioError::Invalid(format!(
                "unsupported schema_version {} (expected {SCHEMA_VERSION})",
                self.schema_version
            )));
        }
        non_negative("stop_s", self.stop_s)?;
        for (i, s) in self.senders.iter().enumerate() {
            non_negative(&format!("senders[{i}].start_s"), s.start_s)?;
            non_negative(&format!("senders[{i}].stop_s"), s.stop_s)?;
            non_negative(&format!("senders[{i}].interval_ms"), s.interval_ms)?;
            if s.interval_ms == Some(0.0) {
                return Err(ScenarioError::Invalid(format!(
                    "senders[{i}].interval_ms must be positive"
                )));
            }
        }
        Ok(())
    }

    pub fn stop_time(&self) -> Option<SimTime> {
        self.stop_s.map(SimTime::from_secs_f64)
    }

    /// 填充缺省值后的 sender 配置
    pub fn sender_opts(&self) -> Vec<SenderOpts> {
        let defaults = SenderOpts::default();
        self.senders
            .iter()
            .enumerate()
            .map(|(i, s)| SenderOpts {
                name: s.name.clone().unwrap_or_else(|| format!("sender{i}")),
                start: s.start_s.map(SimTime::from_secs_f64).unwrap_or(defaults.start),
                stop: s.stop_s.map(SimTime::from_secs_f64).unwrap_or(defaults.stop),
                interval: s
                    .interval_ms
                    .map(|ms| SimDuration::from_secs_f64(ms / 1_000.0))
                    .unwrap_or(defaults.interval),
                max_packets: s.max_packets.unwrap_or(defaults.max_packets),
                pkt_bytes: s.pkt_bytes.unwrap_or(defaults.pkt_bytes),
                latency: s
                    .latency_us
                    .map(|us| SimDuration::from_micros(i64::try_from(us).unwrap_or(i64::MAX)))
                    .unwrap_or(defaults.latency),
            })
            .collect()
    }

    /// 把所有 sender 安装到 `world`，并设置全局停止时刻。
    pub fn install(
        &self,
        sim: &mut Simulator,
        world: &mut DemoWorld,
    ) -> Result<Vec<AppId>, ScenarioError> {
        let apps = self
            .sender_opts()
            .into_iter()
            .map(|opts| world.install_sender(sim, opts))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(at) = self.stop_time() {
            sim.stop_at(at)?;
        }
        Ok(apps)
    }
}
