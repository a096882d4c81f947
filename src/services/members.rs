//! Membership service

use crate::{
    error::{AppError, AppResult},
    models::{
        fine::Fine,
        member::{
            check_membership_window, CreateMember, Member, MemberDetail, MemberQuery,
            MemberSummary, UpdateMember,
        },
        pagination::Page,
    },
    repository::Repository,
};

use super::loans::LoanLifecycle;

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
    lifecycle: LoanLifecycle,
}

impl MembersService {
    pub fn new(repository: Repository, lifecycle: LoanLifecycle) -> Self {
        Self {
            repository,
            lifecycle,
        }
    }

    /// Search members with filters
    pub async fn search(&self, query: &MemberQuery) -> AppResult<Page<MemberSummary>> {
        self.repository.members.search(query).await
    }

    /// Get member by ID with loan counters and recent loans
    pub async fn get(&self, id: i32) -> AppResult<MemberDetail> {
        self.repository.members.get_detail(id).await
    }

    /// Fines of an existing member
    pub async fn fines(&self, id: i32) -> AppResult<Vec<Fine>> {
        self.repository.members.get_by_id(id).await?;
        self.repository.members.fines(id).await
    }

    /// Create a new member
    pub async fn create(&self, member: &CreateMember) -> AppResult<i32> {
        let member_id = self.repository.members.create(member).await?;
        tracing::info!(
            member_id,
            membership_number = %member.membership_number,
            "Member created"
        );
        Ok(member_id)
    }

    /// Update an existing member
    pub async fn update(&self, id: i32, patch: &UpdateMember) -> AppResult<()> {
        if patch.membership_start_date.is_some() || patch.membership_expiry_date.is_some() {
            let current = self.repository.members.get_by_id(id).await?;
            check_merged_window(patch, &current)?;
        }

        self.repository.members.update(id, patch).await?;
        tracing::info!(member_id = id, "Member updated");
        Ok(())
    }

    /// Soft-delete a member with no active loan
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.lifecycle.deactivate_member(id).await
    }
}

/// The membership window left by applying `patch` over `current` must stay valid
fn check_merged_window(patch: &UpdateMember, current: &Member) -> AppResult<()> {
    let (start, expiry) = patch.merged_dates(current);
    check_membership_window(start, expiry)
        .map_err(|_| AppError::Validation("Expiry date must be after start date".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::MembershipType;
    use axum::http::StatusCode;
    use chrono::{NaiveDate, Utc};

    fn member(start: NaiveDate, expiry: NaiveDate) -> Member {
        let now = Utc::now();
        Member {
            member_id: 3,
            membership_number: "LIB2024003".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            date_of_birth: None,
            gender: None,
            email: None,
            phone_number: None,
            address: None,
            city: None,
            postal_code: None,
            membership_type: MembershipType::Senior,
            membership_start_date: start,
            membership_expiry_date: expiry,
            is_active: true,
            max_books_allowed: 5,
            created_at: now,
            updated_at: now,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_expiry_before_stored_start_is_a_validation_error() {
        let current = member(date(2024, 1, 1), date(2025, 1, 1));
        let patch = UpdateMember {
            membership_expiry_date: Some(date(2023, 12, 31)),
            ..Default::default()
        };

        let err = check_merged_window(&patch, &current).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_extending_expiry_passes() {
        let current = member(date(2024, 1, 1), date(2025, 1, 1));
        let patch = UpdateMember {
            membership_expiry_date: Some(date(2026, 1, 1)),
            ..Default::default()
        };
        assert!(check_merged_window(&patch, &current).is_ok());
    }
}
