use serde::{Deserialize, Serialize};
use std::fmt;

/// 分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassificationOutcome {
    /// 已故
    Deceased,
    /// 在世（或未能识别为已故）
    Living,
    /// 无法判断（请求失败、非 200、输入缺失），不进入缓存
    Unknown,
}

impl ClassificationOutcome {
    /// 是否为可缓存的终态结果
    pub fn is_terminal(self) -> bool {
        !matches!(self, ClassificationOutcome::Unknown)
    }

    pub fn is_deceased(self) -> bool {
        matches!(self, ClassificationOutcome::Deceased)
    }

    /// 持久化格式：`true` 表示已故；Unknown 没有持久化形式
    pub fn as_stored(self) -> Option<bool> {
        match self {
            ClassificationOutcome::Deceased => Some(true),
            ClassificationOutcome::Living => Some(false),
            ClassificationOutcome::Unknown => None,
        }
    }

    pub fn from_stored(deceased: bool) -> Self {
        if deceased {
            ClassificationOutcome::Deceased
        } else {
            ClassificationOutcome::Living
        }
    }
}

impl fmt::Display for ClassificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClassificationOutcome::Deceased => "DECEASED",
            ClassificationOutcome::Living => "LIVING",
            ClassificationOutcome::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}
