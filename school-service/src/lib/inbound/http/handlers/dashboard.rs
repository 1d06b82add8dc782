use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserProfileData;
use crate::domain::user::access::Identity;
use crate::domain::user::models::Dashboard;
use crate::domain::user::models::DashboardStats;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn dashboard<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Extension(identity): Extension<Identity>,
) -> Result<ApiSuccess<DashboardData>, ApiError> {
    state
        .auth_service
        .dashboard(&identity.user_id)
        .await
        .map_err(ApiError::from)
        .map(|ref dashboard| ApiSuccess::new(StatusCode::OK, dashboard.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardData {
    pub message: String,
    pub user: UserProfileData,
    pub stats: DashboardStatsData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DashboardStatsData {
    #[serde(rename_all = "camelCase")]
    Admin {
        total_students: u64,
        total_teachers: u64,
        total_admins: u64,
    },
    #[serde(rename_all = "camelCase")]
    Teacher {
        students_count: u64,
        subject: String,
    },
    Student {},
}

impl From<&Dashboard> for DashboardData {
    fn from(dashboard: &Dashboard) -> Self {
        let stats = match &dashboard.stats {
            DashboardStats::Admin {
                total_students,
                total_teachers,
                total_admins,
            } => DashboardStatsData::Admin {
                total_students: *total_students,
                total_teachers: *total_teachers,
                total_admins: *total_admins,
            },
            DashboardStats::Teacher {
                students_count,
                subject,
            } => DashboardStatsData::Teacher {
                students_count: *students_count,
                subject: subject.clone(),
            },
            DashboardStats::Student => DashboardStatsData::Student {},
        };

        Self {
            message: dashboard.message.clone(),
            user: (&dashboard.profile).into(),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_serialize_camel_case() {
        let admin = serde_json::to_value(DashboardStatsData::Admin {
            total_students: 3,
            total_teachers: 1,
            total_admins: 1,
        })
        .unwrap();
        assert_eq!(admin["totalStudents"], 3);

        let student = serde_json::to_value(DashboardStatsData::Student {}).unwrap();
        assert_eq!(student, serde_json::json!({}));
    }
}
