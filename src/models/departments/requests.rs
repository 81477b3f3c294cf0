use serde::Deserialize;
use ts_rs::TS;

use crate::utils::validate::validate_title;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/department.ts")]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub description: Option<String>,
}

impl CreateDepartmentRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title("name", &self.name, 100)
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/department.ts")]
pub struct UpdateDepartmentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl UpdateDepartmentRequest {
    pub fn validate(&self) -> Result<(), String> {
        match self.name {
            Some(ref name) => validate_title("name", name, 100),
            None => Ok(()),
        }
    }
}
