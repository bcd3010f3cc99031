use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Module, ModuleProgress};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ModuleCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "position must be non-negative"))]
    pub(crate) position: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ModuleResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) position: i32,
    pub(crate) created_at: String,
}

impl ModuleResponse {
    pub(crate) fn from_db(module: Module) -> Self {
        Self {
            id: module.id,
            course_id: module.course_id,
            title: module.title,
            description: module.description,
            position: module.position,
            created_at: format_primitive(module.created_at),
        }
    }
}

/// Module as a student sees it in a course listing.
#[derive(Debug, Serialize)]
pub(crate) struct ModuleProgressResponse {
    #[serde(flatten)]
    pub(crate) module: ModuleResponse,
    pub(crate) completed: bool,
    pub(crate) tests_total: i64,
    pub(crate) tests_passed: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestSummaryResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) passing_score: f64,
    pub(crate) best_score: Option<f64>,
    pub(crate) passed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ModuleDetailResponse {
    #[serde(flatten)]
    pub(crate) module: ModuleResponse,
    pub(crate) completed: bool,
    pub(crate) eligible_for_completion: bool,
    pub(crate) tests: Vec<TestSummaryResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ModuleCompletionResponse {
    pub(crate) module_id: String,
    pub(crate) completed: bool,
    pub(crate) completed_at: Option<String>,
}

impl ModuleCompletionResponse {
    pub(crate) fn from_db(progress: ModuleProgress) -> Self {
        Self {
            module_id: progress.module_id,
            completed: progress.completed,
            completed_at: progress.completed_at.map(format_primitive),
        }
    }
}
