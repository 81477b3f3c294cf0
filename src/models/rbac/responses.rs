use serde::Serialize;
use ts_rs::TS;

use super::entities::Role;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/rbac.ts")]
pub struct RoleListResponse {
    pub items: Vec<Role>,
}
