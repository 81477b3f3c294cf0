use serde::Deserialize;
use ts_rs::TS;

use crate::utils::validate::{validate_color_code, validate_title};

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/category.ts")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub color_code: Option<String>,
}

impl CreateCategoryRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title("name", &self.name, 100)?;
        if let Some(ref color) = self.color_code {
            validate_color_code(color).map_err(str::to_string)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/category.ts")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub color_code: Option<String>,
}

impl UpdateCategoryRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref name) = self.name {
            validate_title("name", name, 100)?;
        }
        if let Some(ref color) = self.color_code {
            validate_color_code(color).map_err(str::to_string)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_code_checked() {
        let req = CreateCategoryRequest {
            name: "Safety".into(),
            description: None,
            parent_id: None,
            color_code: Some("#12ab9F".into()),
        };
        assert!(req.validate().is_ok());

        let req = CreateCategoryRequest {
            color_code: Some("red".into()),
            ..req
        };
        assert!(req.validate().is_err());
    }
}
