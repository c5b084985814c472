//! 进度值与进度聚合

use crate::error::{Result, TaskboardError, ValidationError};
use crate::tasks::subtask::Subtask;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 子任务进度，始终是 [0, 100] 内的整数
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct Progress(u8);

impl Progress {
    pub const ZERO: Progress = Progress(0);
    pub const COMPLETE: Progress = Progress(100);
    /// 编辑界面滑块的步长
    pub const STEP: u8 = 10;

    pub fn new(value: i64) -> Result<Self> {
        if (0..=100).contains(&value) {
            Ok(Progress(value as u8))
        } else {
            Err(ValidationError::OutOfRange {
                field: "progress".to_string(),
                message: format!("{} 不在 0..=100 之间", value),
            }
            .into())
        }
    }

    pub fn saturating(value: i64) -> Self {
        Progress(value.clamp(0, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// 四舍五入到最近的 [`STEP`](Self::STEP) 倍数
    pub fn snapped(self) -> Self {
        Progress((self.0 + Self::STEP / 2) / Self::STEP * Self::STEP)
    }

    pub fn is_complete(self) -> bool {
        self.0 == 100
    }
}

impl TryFrom<i64> for Progress {
    type Error = TaskboardError;

    fn try_from(value: i64) -> Result<Self> {
        Progress::new(value)
    }
}

impl From<Progress> for u8 {
    fn from(progress: Progress) -> Self {
        progress.0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// 整数均值，.5 向上取整；空序列为 0
pub fn mean_rounded<I>(values: I) -> u8
where
    I: IntoIterator<Item = u8>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), v| (sum + v as u64, count + 1));
    if count == 0 {
        return 0;
    }
    ((2 * sum + count) / (2 * count)) as u8
}

/// 父任务进度 = round(mean(子任务进度))，没有子任务时为 0
pub fn aggregate_progress(subtasks: &[Subtask]) -> u8 {
    mean_rounded(subtasks.iter().map(|s| s.progress.value()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_rounded() {
        assert_eq!(mean_rounded(Vec::<u8>::new()), 0);
        assert_eq!(mean_rounded([60, 100, 30]), 63);
        assert_eq!(mean_rounded([100, 100, 100]), 100);
        // 0.5 向上取整
        assert_eq!(mean_rounded([0, 1]), 1);
        assert_eq!(mean_rounded([10, 15]), 13);
        assert_eq!(mean_rounded([0, 0, 1]), 0);
    }

    #[test]
    fn test_progress_bounds() {
        assert!(Progress::new(-1).is_err());
        assert!(Progress::new(101).is_err());
        assert_eq!(Progress::new(100).unwrap(), Progress::COMPLETE);
        assert_eq!(Progress::saturating(250).value(), 100);
        assert_eq!(Progress::saturating(-3).value(), 0);
    }

    #[test]
    fn test_snapped() {
        assert_eq!(Progress::saturating(44).snapped().value(), 40);
        assert_eq!(Progress::saturating(45).snapped().value(), 50);
        assert_eq!(Progress::saturating(96).snapped().value(), 100);
        assert_eq!(Progress::ZERO.snapped().value(), 0);
    }

    #[test]
    fn test_progress_serde_rejects_out_of_range() {
        let ok: Progress = serde_json::from_str("70").unwrap();
        assert_eq!(ok.value(), 70);
        assert!(serde_json::from_str::<Progress>("120").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "70");
    }
}
