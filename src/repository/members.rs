//! Members repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres, QueryBuilder};

use super::contains_pattern;
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::MembershipType,
        fine::Fine,
        loan::{LoanHistoryEntry, LoanHistoryRow},
        member::{
            CreateMember, Member, MemberDetail, MemberQuery, MemberSummary, UpdateMember,
            DEFAULT_MAX_BOOKS,
        },
        pagination::{Page, PageRequest},
    },
};

const DUPLICATE_MEMBER: &str = "Member with this membership number or email already exists";

/// Recent loans shown on the member detail
const HISTORY_LENGTH: i64 = 10;

const SUMMARY_COLUMNS: &str = r#"
    SELECT m.*,
           (SELECT COUNT(*) FROM loan_transactions lt
            WHERE lt.member_id = m.member_id AND lt.loan_status = 'Active') AS active_loans,
           (SELECT COALESCE(SUM(f.amount - f.paid_amount), 0) FROM fines f
            WHERE f.member_id = m.member_id AND f.payment_status = 'Unpaid') AS outstanding_fines
    FROM members m
    WHERE TRUE"#;

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &MemberQuery) {
    if let Some(pattern) = contains_pattern(query.search.as_deref()) {
        qb.push(" AND (m.first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR m.last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR m.membership_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR m.email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(membership_type) = query.membership_type {
        qb.push(" AND m.membership_type = ")
            .push_bind(membership_type);
    }
    if let Some(is_active) = query.is_active {
        qb.push(" AND m.is_active = ").push_bind(is_active);
    }
}

fn list_query(query: &MemberQuery, page: PageRequest) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(SUMMARY_COLUMNS);
    push_filters(&mut qb, query);
    qb.push(" ORDER BY m.last_name, m.first_name, m.member_id LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    qb
}

fn count_query(query: &MemberQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM members m WHERE TRUE");
    push_filters(&mut qb, query);
    qb
}

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Postgres>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Filtered, paginated member listing ordered by name
    pub async fn search(&self, query: &MemberQuery) -> AppResult<Page<MemberSummary>> {
        let page = query.page_request();

        let mut count = count_query(query);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut list = list_query(query, page);
        let rows = list
            .build_query_as::<MemberSummary>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(rows, page, total))
    }

    /// Get member by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Member> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE member_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::MemberNotFound)
    }

    /// Member with loan counters, outstanding fines and recent loans
    pub async fn get_detail(&self, id: i32) -> AppResult<MemberDetail> {
        let mut detail = sqlx::query_as::<_, MemberDetail>(
            r#"
            SELECT m.*,
                   (SELECT COUNT(*) FROM loan_transactions lt
                    WHERE lt.member_id = m.member_id AND lt.loan_status = 'Active') AS active_loans,
                   (SELECT COUNT(*) FROM loan_transactions lt
                    WHERE lt.member_id = m.member_id AND lt.loan_status = 'Returned') AS completed_loans,
                   (SELECT COALESCE(SUM(f.amount - f.paid_amount), 0) FROM fines f
                    WHERE f.member_id = m.member_id AND f.payment_status = 'Unpaid') AS outstanding_fines
            FROM members m
            WHERE m.member_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::MemberNotFound)?;

        detail.loan_history = self.recent_loans(id, HISTORY_LENGTH).await?;
        Ok(detail)
    }

    /// Most recent loans of a member, newest first
    pub async fn recent_loans(&self, member_id: i32, limit: i64) -> AppResult<Vec<LoanHistoryEntry>> {
        let today = Utc::now().date_naive();
        let rows = sqlx::query_as::<_, LoanHistoryRow>(
            r#"
            SELECT lt.transaction_id, lt.book_id, b.title, b.isbn,
                   ARRAY(
                       SELECT a.first_name || ' ' || a.last_name
                       FROM book_authors ba
                       JOIN authors a ON a.author_id = ba.author_id
                       WHERE ba.book_id = b.book_id
                       ORDER BY a.last_name, a.first_name
                   ) AS authors,
                   lt.loan_date, lt.due_date, lt.return_date, lt.loan_status
            FROM loan_transactions lt
            JOIN books b ON b.book_id = lt.book_id
            WHERE lt.member_id = $1
            ORDER BY lt.loan_date DESC, lt.transaction_id DESC
            LIMIT $2
            "#,
        )
        .bind(member_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.into_entry(today)).collect())
    }

    /// Fines issued to a member, newest first
    pub async fn fines(&self, member_id: i32) -> AppResult<Vec<Fine>> {
        let fines = sqlx::query_as::<_, Fine>(
            "SELECT * FROM fines WHERE member_id = $1 ORDER BY issued_date DESC, fine_id DESC",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(fines)
    }

    /// Create a new member
    pub async fn create(&self, member: &CreateMember) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO members (
                membership_number, first_name, last_name, date_of_birth, gender, email,
                phone_number, address, city, postal_code, membership_type,
                membership_start_date, membership_expiry_date, max_books_allowed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING member_id
            "#,
        )
        .bind(&member.membership_number)
        .bind(&member.first_name)
        .bind(&member.last_name)
        .bind(member.date_of_birth)
        .bind(member.gender)
        .bind(&member.email)
        .bind(&member.phone_number)
        .bind(&member.address)
        .bind(&member.city)
        .bind(&member.postal_code)
        .bind(member.membership_type.unwrap_or(MembershipType::Regular))
        .bind(member.membership_start_date)
        .bind(member.membership_expiry_date)
        .bind(member.max_books_allowed.unwrap_or(DEFAULT_MAX_BOOKS))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_MEMBER))
    }

    /// Apply a partial update
    pub async fn update(&self, id: i32, patch: &UpdateMember) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE members SET
                membership_number = COALESCE($2, membership_number),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                date_of_birth = COALESCE($5, date_of_birth),
                gender = COALESCE($6, gender),
                email = COALESCE($7, email),
                phone_number = COALESCE($8, phone_number),
                address = COALESCE($9, address),
                city = COALESCE($10, city),
                postal_code = COALESCE($11, postal_code),
                membership_type = COALESCE($12, membership_type),
                membership_start_date = COALESCE($13, membership_start_date),
                membership_expiry_date = COALESCE($14, membership_expiry_date),
                is_active = COALESCE($15, is_active),
                max_books_allowed = COALESCE($16, max_books_allowed),
                updated_at = NOW()
            WHERE member_id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.membership_number)
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(patch.date_of_birth)
        .bind(patch.gender)
        .bind(&patch.email)
        .bind(&patch.phone_number)
        .bind(&patch.address)
        .bind(&patch.city)
        .bind(&patch.postal_code)
        .bind(patch.membership_type)
        .bind(patch.membership_start_date)
        .bind(patch.membership_expiry_date)
        .bind(patch.is_active)
        .bind(patch.max_books_allowed)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_MEMBER))?;

        if result.rows_affected() == 0 {
            return Err(AppError::MemberNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_covers_names_number_and_email() {
        let query = MemberQuery {
            search: Some("smith".into()),
            ..Default::default()
        };
        let count = count_query(&query);
        assert_eq!(
            count.sql(),
            "SELECT COUNT(*) FROM members m WHERE TRUE AND (m.first_name ILIKE $1 OR m.last_name ILIKE $2 \
             OR m.membership_number ILIKE $3 OR m.email ILIKE $4)"
        );
    }

    #[test]
    fn test_listing_orders_by_last_then_first_name() {
        let query = MemberQuery {
            membership_type: Some(MembershipType::Student),
            is_active: Some(true),
            page: Some(3),
            limit: Some(20),
            ..Default::default()
        };
        let list = list_query(&query, query.page_request());
        assert!(list.sql().ends_with(
            "AND m.membership_type = $1 AND m.is_active = $2 \
             ORDER BY m.last_name, m.first_name, m.member_id LIMIT $3 OFFSET $4"
        ));
    }
}
