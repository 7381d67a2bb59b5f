// ==========================================
// PSI 供需平衡引擎 - 领域类型定义
// ==========================================
// 职责: 桶/层/方向/策略等枚举,供引擎与快照共用
// 序列化格式: SCREAMING_SNAKE_CASE (与配置键值一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// PSI 桶 (Bucket)
// ==========================================
// 红线: 每个 (节点, 周) 恰好四个桶,顺序固定 S/CO/I/P
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Bucket {
    #[serde(rename = "S")]
    Ship, // 出荷
    #[serde(rename = "CO")]
    CarryOver, // 结转
    #[serde(rename = "I")]
    Inventory, // 库存
    #[serde(rename = "P")]
    Arrival, // 到货/生产
}

impl Bucket {
    /// 固定遍历顺序
    pub const ALL: [Bucket; 4] = [
        Bucket::Ship,
        Bucket::CarryOver,
        Bucket::Inventory,
        Bucket::Arrival,
    ];

    /// 在周槽位中的下标
    pub fn index(&self) -> usize {
        match self {
            Bucket::Ship => 0,
            Bucket::CarryOver => 1,
            Bucket::Inventory => 2,
            Bucket::Arrival => 3,
        }
    }

    /// 从字符串解析桶
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "S" => Some(Bucket::Ship),
            "CO" => Some(Bucket::CarryOver),
            "I" => Some(Bucket::Inventory),
            "P" => Some(Bucket::Arrival),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Ship => "S",
            Bucket::CarryOver => "CO",
            Bucket::Inventory => "I",
            Bucket::Arrival => "P",
        }
    }

    /// 派生桶: 每次推演都会被清空重算
    pub fn is_derived(&self) -> bool {
        !matches!(self, Bucket::Ship)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// PSI 层 (Layer)
// ==========================================
// demand: 预测账本; supply: 执行账本
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Demand, // 需求层
    Supply, // 供给层
}

impl Layer {
    pub const ALL: [Layer; 2] = [Layer::Demand, Layer::Supply];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Demand => "demand",
            Layer::Supply => "supply",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 平移方向 (Shift Direction)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftDirection {
    Forward,  // 向后推(到货排程)
    Backward, // 向前倒推(出荷推导)
}

impl ShiftDirection {
    /// 单步位移
    pub fn step(&self) -> isize {
        match self {
            ShiftDirection::Forward => 1,
            ShiftDirection::Backward => -1,
        }
    }

    /// 从字符串解析方向
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "FORWARD" => Some(ShiftDirection::Forward),
            "BACKWARD" => Some(ShiftDirection::Backward),
            _ => None,
        }
    }
}

impl fmt::Display for ShiftDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftDirection::Forward => write!(f, "FORWARD"),
            ShiftDirection::Backward => write!(f, "BACKWARD"),
        }
    }
}

// ==========================================
// 汇总策略 (Aggregation Policy)
// ==========================================
// REPLACE: 先清空父节点 S 再重建(幂等,默认)
// ACCUMULATE: 追加不清空(仅用于同一轮次多段拼接)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationPolicy {
    Replace,
    Accumulate,
}

impl AggregationPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "REPLACE" => Some(AggregationPolicy::Replace),
            "ACCUMULATE" => Some(AggregationPolicy::Accumulate),
            _ => None,
        }
    }
}

impl fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationPolicy::Replace => write!(f, "REPLACE"),
            AggregationPolicy::Accumulate => write!(f, "ACCUMULATE"),
        }
    }
}

// ==========================================
// 批次号格式校验模式 (Lot Format Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotFormatMode {
    Strict,  // 节点-产品-年W周-序号
    Lenient, // 非空且不含空白
}

impl LotFormatMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "STRICT" => Some(LotFormatMode::Strict),
            "LENIENT" => Some(LotFormatMode::Lenient),
            _ => None,
        }
    }
}

impl fmt::Display for LotFormatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LotFormatMode::Strict => write!(f, "STRICT"),
            LotFormatMode::Lenient => write!(f, "LENIENT"),
        }
    }
}

// ==========================================
// 节点分区 (Node Side)
// ==========================================
// 解耦点及其祖先为推式段,其余为拉式段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeSide {
    Push,     // 解耦点的严格祖先
    Decouple, // 解耦点本身
    Pull,     // 解耦点之下(或不在任何解耦路径上)
}

impl NodeSide {
    /// "above" 分区: 解耦点及其祖先
    pub fn is_above(&self) -> bool {
        matches!(self, NodeSide::Push | NodeSide::Decouple)
    }
}

impl fmt::Display for NodeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeSide::Push => write!(f, "PUSH"),
            NodeSide::Decouple => write!(f, "DECOUPLE"),
            NodeSide::Pull => write!(f, "PULL"),
        }
    }
}
