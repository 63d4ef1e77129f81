use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::net::ChannelConfig;

pub const SCENARIO_SCHEMA_VERSION: u32 = 1;

/// 场景文件（JSON）：待发数据 + 两个方向的通道故障模型。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub data: Option<String>,
    /// 相对路径相对于场景文件所在目录
    #[serde(default)]
    pub data_file: Option<PathBuf>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub max_iterations: Option<u64>,
    #[serde(default)]
    pub forward: ChannelConfig,
    #[serde(default)]
    pub reverse: ChannelConfig,
}

impl ScenarioSpec {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let spec: ScenarioSpec = serde_json::from_str(raw)?;
        if spec.schema_version != SCENARIO_SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedSchema(spec.schema_version));
        }
        spec.forward.validate()?;
        spec.reverse.validate()?;
        Ok(spec)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// 取出待发数据：`data` 优先，其次读取 `data_file`。
    pub fn load_data(&self, base_dir: Option<&Path>) -> Result<String, ConfigError> {
        if let Some(data) = self.data.as_ref().filter(|d| !d.is_empty()) {
            return Ok(data.clone());
        }
        let Some(file) = self.data_file.as_ref() else {
            return Err(ConfigError::EmptyData);
        };
        let path = match base_dir {
            Some(dir) if file.is_relative() => dir.join(file),
            _ => file.clone(),
        };
        let data = fs::read_to_string(&path).map_err(|source| ConfigError::Io { path, source })?;
        if data.is_empty() {
            return Err(ConfigError::EmptyData);
        }
        Ok(data)
    }
}
