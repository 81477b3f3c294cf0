use serde::Serialize;
use ts_rs::TS;

use super::entities::Department;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/department.ts")]
pub struct DepartmentListResponse {
    pub items: Vec<Department>,
}
