use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::define_string_enum;

define_string_enum! {
    // 选课状态
    #[derive(TS)]
    #[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
    pub enum EnrollmentStatus {
        Enrolled => "enrolled",
        InProgress => "in_progress",
        Completed => "completed",
        Dropped => "dropped",
    }
}

// 选课记录
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct Enrollment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub progress_percentage: f64,
    pub status: EnrollmentStatus,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
    pub assigned_by: Option<i64>,
}

impl Enrollment {
    /// 截止日期已过且未完成
    pub fn is_overdue_at(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        match self.due_date {
            Some(due) => due < now && self.status != EnrollmentStatus::Completed,
            None => false,
        }
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(chrono::Utc::now())
    }
}

// 模块完成记录
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct ModuleProgress {
    pub id: i64,
    pub user_id: i64,
    pub module_id: i64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// 根据完成模块数计算进度与状态
///
/// 课程没有模块时视为 100%。
pub fn compute_progress(completed_modules: u64, total_modules: u64) -> (f64, EnrollmentStatus) {
    let percentage = if total_modules == 0 {
        100.0
    } else {
        let done = completed_modules.min(total_modules);
        (done as f64 / total_modules as f64 * 100.0 * 100.0).round() / 100.0
    };

    let status = if percentage >= 100.0 {
        EnrollmentStatus::Completed
    } else if percentage > 0.0 {
        EnrollmentStatus::InProgress
    } else {
        EnrollmentStatus::Enrolled
    };
    (percentage, status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn enrollment(status: EnrollmentStatus, due: Option<chrono::DateTime<Utc>>) -> Enrollment {
        Enrollment {
            id: 1,
            user_id: 1,
            course_id: 1,
            enrolled_at: Utc::now(),
            started_at: None,
            completed_at: None,
            progress_percentage: 0.0,
            status,
            due_date: due,
            assigned_by: None,
        }
    }

    #[test]
    fn test_progress_percentage() {
        assert_eq!(compute_progress(0, 4), (0.0, EnrollmentStatus::Enrolled));
        assert_eq!(compute_progress(1, 4), (25.0, EnrollmentStatus::InProgress));
        assert_eq!(compute_progress(4, 4), (100.0, EnrollmentStatus::Completed));
        assert_eq!(compute_progress(1, 3).0, 33.33);
    }

    #[test]
    fn test_progress_without_modules_is_complete() {
        assert_eq!(compute_progress(0, 0), (100.0, EnrollmentStatus::Completed));
    }

    #[test]
    fn test_progress_never_exceeds_hundred() {
        assert_eq!(compute_progress(7, 4).0, 100.0);
    }

    #[test]
    fn test_overdue() {
        let now = Utc::now();
        let past = Some(now - Duration::days(1));
        let future = Some(now + Duration::days(1));
        assert!(enrollment(EnrollmentStatus::InProgress, past).is_overdue_at(now));
        assert!(!enrollment(EnrollmentStatus::Completed, past).is_overdue_at(now));
        assert!(!enrollment(EnrollmentStatus::Enrolled, future).is_overdue_at(now));
        assert!(!enrollment(EnrollmentStatus::Enrolled, None).is_overdue_at(now));
    }
}
