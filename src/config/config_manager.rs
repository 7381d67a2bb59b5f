// ==========================================
// PSI 供需平衡引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: 内存键值表 (可由 JSON 对象文件加载)
// 覆写: 环境变量 PSI_PLANNER_<KEY 大写>
// ==========================================

use crate::config::planning_config_trait::PlanningConfigReader;
use crate::domain::types::{AggregationPolicy, LotFormatMode, ShiftDirection};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;

/// 默认环境变量前缀
pub const DEFAULT_ENV_PREFIX: &str = "PSI_PLANNER_";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone)]
pub struct ConfigManager {
    values: BTreeMap<String, String>,
    env_prefix: Option<String>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// 创建空配置 (全部取默认值,允许环境变量覆写)
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            env_prefix: Some(DEFAULT_ENV_PREFIX.to_string()),
        }
    }

    /// 指定环境变量前缀 (None 表示禁用环境变量覆写)
    pub fn with_env_prefix(mut self, prefix: Option<&str>) -> Self {
        self.env_prefix = prefix.map(|p| p.to_string());
        self
    }

    /// 从 JSON 对象文件加载
    ///
    /// # 参数
    /// - path: 配置文件路径,内容形如 {"aggregation_policy": "REPLACE", ...}
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("读取配置文件失败 {}: {}", path.as_ref().display(), e))?;
        Self::from_json_str(&raw)
    }

    /// 从 JSON 对象字符串加载
    ///
    /// 非字符串值按 JSON 文本保存 (例如数组、数字)
    pub fn from_json_str(raw: &str) -> Result<Self, Box<dyn Error>> {
        let parsed: BTreeMap<String, Value> = serde_json::from_str(raw)?;
        let mut manager = Self::new();
        for (key, value) in parsed {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            manager.values.insert(key, text);
        }
        Ok(manager)
    }

    /// 写入配置值
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// 读取配置值 (环境变量优先)
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> Option<String> {
        if let Some(prefix) = &self.env_prefix {
            let env_key = format!("{}{}", prefix, key.to_uppercase());
            if let Ok(v) = std::env::var(&env_key) {
                return Some(v);
            }
        }
        self.values.get(key).cloned()
    }

    /// 读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> String {
        self.get_config_value(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// 获取所有配置的快照（JSON格式，键有序）
    ///
    /// # 用途
    /// - 写入每次运行的 RunReport,保证结果可复现
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let mut merged: BTreeMap<String, String> = self.values.clone();
        for key in config_keys::ALL {
            if let Some(v) = self.get_config_value(key) {
                merged.insert(key.to_string(), v);
            }
        }
        let json_value = json!(merged);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_config_from_snapshot(&mut self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;
        let count = config_map.len();
        for (key, value) in config_map {
            self.values.insert(key, value);
        }
        Ok(count)
    }

    fn parse_enum<T>(&self, key: &str, default: T, parse: fn(&str) -> Option<T>) -> T
    where
        T: Copy + std::fmt::Display,
    {
        match self.get_config_value(key) {
            None => default,
            Some(raw) => parse(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置值无法识别，使用默认值"
                );
                default
            }),
        }
    }
}

// ==========================================
// PlanningConfigReader Trait 实现
// ==========================================
impl PlanningConfigReader for ConfigManager {
    fn get_aggregation_policy(&self) -> Result<AggregationPolicy, Box<dyn Error>> {
        Ok(self.parse_enum(
            config_keys::AGGREGATION_POLICY,
            AggregationPolicy::Replace,
            AggregationPolicy::from_str,
        ))
    }

    fn get_demand_shift_direction(&self) -> Result<ShiftDirection, Box<dyn Error>> {
        Ok(self.parse_enum(
            config_keys::DEMAND_SHIFT_DIRECTION,
            ShiftDirection::Forward,
            ShiftDirection::from_str,
        ))
    }

    fn get_aggregation_shift_direction(&self) -> Result<ShiftDirection, Box<dyn Error>> {
        Ok(self.parse_enum(
            config_keys::AGGREGATION_SHIFT_DIRECTION,
            ShiftDirection::Forward,
            ShiftDirection::from_str,
        ))
    }

    fn get_default_decouple_nodes(&self) -> Result<Vec<String>, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_DECOUPLE_NODES, "[]");
        let nodes: Vec<String> = serde_json::from_str(&value).unwrap_or_else(|_| {
            // 兼容逗号分隔写法 (常见于环境变量)
            value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });
        Ok(nodes)
    }

    fn get_lot_format_mode(&self) -> Result<LotFormatMode, Box<dyn Error>> {
        Ok(self.parse_enum(
            config_keys::LOT_FORMAT_MODE,
            LotFormatMode::Lenient,
            LotFormatMode::from_str,
        ))
    }

    fn get_conservation_tolerance(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::CONSERVATION_TOLERANCE, "0");
        Ok(value.trim().parse::<usize>().unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::CONSERVATION_TOLERANCE,
                raw_value = %value,
                default = 0,
                "配置值无法识别，使用默认值"
            );
            0
        }))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 传播
    pub const AGGREGATION_POLICY: &str = "aggregation_policy";
    pub const DEMAND_SHIFT_DIRECTION: &str = "demand_shift_direction";
    pub const AGGREGATION_SHIFT_DIRECTION: &str = "aggregation_shift_direction";

    // 解耦
    pub const DEFAULT_DECOUPLE_NODES: &str = "default_decouple_nodes"; // JSON 数组

    // 校验
    pub const LOT_FORMAT_MODE: &str = "lot_format_mode";
    pub const CONSERVATION_TOLERANCE: &str = "conservation_tolerance";

    pub const ALL: [&str; 6] = [
        AGGREGATION_POLICY,
        DEMAND_SHIFT_DIRECTION,
        AGGREGATION_SHIFT_DIRECTION,
        DEFAULT_DECOUPLE_NODES,
        LOT_FORMAT_MODE,
        CONSERVATION_TOLERANCE,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isolated() -> ConfigManager {
        ConfigManager::new().with_env_prefix(None)
    }

    /// 收集日志输出
    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = isolated().load_planning_config().unwrap();
        assert_eq!(config.aggregation_policy, AggregationPolicy::Replace);
        assert_eq!(config.demand_shift_direction, ShiftDirection::Forward);
        assert_eq!(config.aggregation_shift_direction, ShiftDirection::Forward);
        assert_eq!(config.validation.lot_format_mode, LotFormatMode::Lenient);
        assert_eq!(config.validation.conservation_tolerance, 0);
        assert!(config.default_decouple_nodes.is_empty());
    }

    #[test]
    fn test_json_values_are_parsed() {
        let raw = r#"{
            "aggregation_policy": "accumulate",
            "default_decouple_nodes": ["DC_EAST", "DC_WEST"],
            "conservation_tolerance": 2,
            "lot_format_mode": "STRICT"
        }"#;
        let manager = ConfigManager::from_json_str(raw).unwrap().with_env_prefix(None);
        let config = manager.load_planning_config().unwrap();
        assert_eq!(config.aggregation_policy, AggregationPolicy::Accumulate);
        assert_eq!(config.default_decouple_nodes, vec!["DC_EAST", "DC_WEST"]);
        assert_eq!(config.validation.conservation_tolerance, 2);
        assert_eq!(config.validation.lot_format_mode, LotFormatMode::Strict);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let mut manager = isolated();
        manager.set(config_keys::DEMAND_SHIFT_DIRECTION, "SIDEWAYS");
        manager.set(config_keys::CONSERVATION_TOLERANCE, "-1");
        manager.set(config_keys::DEFAULT_DECOUPLE_NODES, "A, B");
        assert_eq!(manager.get_demand_shift_direction().unwrap(), ShiftDirection::Forward);
        assert_eq!(manager.get_conservation_tolerance().unwrap(), 0);
        assert_eq!(manager.get_default_decouple_nodes().unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn test_malformed_tolerance_logs_warning() {
        let mut manager = isolated();
        manager.set(config_keys::CONSERVATION_TOLERANCE, "-1");

        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let tolerance = tracing::subscriber::with_default(subscriber, || {
            manager.get_conservation_tolerance().unwrap()
        });

        assert_eq!(tolerance, 0);
        let text = logs.text();
        assert!(text.contains("WARN"), "{}", text);
        assert!(text.contains("conservation_tolerance"), "{}", text);
    }

    #[test]
    fn test_env_override_wins() {
        let prefix = "PSI_PLANNER_UNIT_OVERRIDE_";
        std::env::set_var(format!("{}AGGREGATION_SHIFT_DIRECTION", prefix), "BACKWARD");
        let mut manager = ConfigManager::new().with_env_prefix(Some(prefix));
        manager.set(config_keys::AGGREGATION_SHIFT_DIRECTION, "FORWARD");
        assert_eq!(
            manager.get_aggregation_shift_direction().unwrap(),
            ShiftDirection::Backward
        );
        std::env::remove_var(format!("{}AGGREGATION_SHIFT_DIRECTION", prefix));
    }

    #[test]
    fn test_snapshot_is_sorted_and_restorable() {
        let mut manager = isolated();
        manager.set(config_keys::LOT_FORMAT_MODE, "STRICT");
        manager.set(config_keys::AGGREGATION_POLICY, "REPLACE");
        let snapshot = manager.get_config_snapshot().unwrap();
        assert!(snapshot.find("aggregation_policy").unwrap() < snapshot.find("lot_format_mode").unwrap());

        let mut restored = isolated();
        assert_eq!(restored.restore_config_from_snapshot(&snapshot).unwrap(), 2);
        assert_eq!(restored.get_lot_format_mode().unwrap(), LotFormatMode::Strict);
    }
}
