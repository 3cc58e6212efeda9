use serde::{Deserialize, Serialize};

/// 一条执行记录：某个事件在某个仿真时刻被执行。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecRecord {
    /// 仿真时间（纳秒，和 `SimTime.0` 同口径）
    pub t_ns: u64,
    /// 事件调度序号（`EventId::uid`）
    pub uid: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<u32>,
}

/// 执行轨迹收集器（存内存，仿真结束可写 JSON 文件）。
///
/// 同一组 schedule/cancel 调用重放两次，轨迹必须完全一致。
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecTrace {
    pub records: Vec<ExecRecord>,
}

impl ExecTrace {
    pub fn push(&mut self, rec: ExecRecord) {
        self.records.push(rec);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records)
    }
}
