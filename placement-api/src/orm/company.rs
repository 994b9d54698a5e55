use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::models::{Company, CompanyChanges, CompanyInput, CompanyUpdate, NewCompany};
use crate::orm::last_insert_id;

/// Outcome of a delete request for a partner company.
#[derive(Debug, PartialEq, Eq)]
pub enum CompanyDeletion {
    Deleted,
    NotFound,
    /// Placements still reference the company.
    HasPlacements(i64),
}

/// Try to find a company by name (case-insensitive).
/// Returns Ok(Some(Company)) if found, Ok(None) if not, Err on DB error.
pub fn get_company_by_name_case_insensitive(
    conn: &mut SqliteConnection,
    company_name: &str,
) -> Result<Option<Company>, diesel::result::Error> {
    // Use raw SQL for case-insensitive comparison
    diesel::sql_query("SELECT * FROM companies WHERE LOWER(name) = LOWER(?)")
        .bind::<diesel::sql_types::Text, _>(company_name)
        .get_result::<Company>(conn)
        .optional()
}

/// Insert a new partner company.
pub fn insert_company(
    conn: &mut SqliteConnection,
    input: CompanyInput,
) -> Result<Company, diesel::result::Error> {
    use crate::schema::companies::dsl::*;

    let now = Utc::now().naive_utc();
    let new_comp = NewCompany {
        name: input.name,
        country: input.country,
        industry: input.industry,
        contact_person: input.contact_person,
        email: input.email,
        phone: input.phone,
        address: input.address,
        created_at: now,
        updated_at: now,
    };

    conn.transaction(|conn| {
        diesel::insert_into(companies)
            .values(&new_comp)
            .execute(conn)?;
        let company_id = last_insert_id(conn)?;

        companies
            .filter(id.eq(company_id))
            .select(Company::as_select())
            .first(conn)
    })
}

/// Try to find a company by id.
/// Returns Ok(Some(Company)) if found, Ok(None) if not, Err on DB error.
pub fn get_company_by_id(
    conn: &mut SqliteConnection,
    company_id: i32,
) -> Result<Option<Company>, diesel::result::Error> {
    use crate::schema::companies::dsl::*;
    companies
        .filter(id.eq(company_id))
        .select(Company::as_select())
        .first(conn)
        .optional()
}

/// Returns all companies in ascending order by id.
pub fn get_all_companies(
    conn: &mut SqliteConnection,
) -> Result<Vec<Company>, diesel::result::Error> {
    use crate::schema::companies::dsl::*;
    companies
        .order(id.asc())
        .select(Company::as_select())
        .load(conn)
}

/// Applies a partial update. Returns Ok(None) if the company does not exist.
pub fn update_company(
    conn: &mut SqliteConnection,
    company_id: i32,
    update: CompanyUpdate,
    now: NaiveDateTime,
) -> Result<Option<Company>, diesel::result::Error> {
    use crate::schema::companies::dsl::*;

    let changes = CompanyChanges {
        name: update.name,
        country: update.country,
        industry: update.industry,
        contact_person: update.contact_person,
        email: update.email,
        phone: update.phone,
        address: update.address,
        updated_at: now,
    };

    let rows_affected = diesel::update(companies.filter(id.eq(company_id)))
        .set(&changes)
        .execute(conn)?;
    if rows_affected == 0 {
        return Ok(None);
    }
    get_company_by_id(conn, company_id)
}

/// Deletes a company unless placements still point at it.
pub fn delete_company(
    conn: &mut SqliteConnection,
    company_id: i32,
) -> Result<CompanyDeletion, diesel::result::Error> {
    use crate::schema::companies::dsl::*;
    use crate::schema::placements;

    conn.transaction(|conn| {
        if get_company_by_id(conn, company_id)?.is_none() {
            return Ok(CompanyDeletion::NotFound);
        }

        let placement_count: i64 = placements::table
            .filter(placements::company_id.eq(company_id))
            .count()
            .get_result(conn)?;
        if placement_count > 0 {
            return Ok(CompanyDeletion::HasPlacements(placement_count));
        }

        diesel::delete(companies.filter(id.eq(company_id))).execute(conn)?;
        Ok(CompanyDeletion::Deleted)
    })
}

/// Total number of partner companies.
pub fn count_companies(conn: &mut SqliteConnection) -> Result<i64, diesel::result::Error> {
    use crate::schema::companies::dsl::*;
    companies.count().get_result(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::testing::{sample_company, setup_test_db};

    #[test]
    fn test_insert_company() {
        let mut conn = setup_test_db();
        let comp = insert_company(&mut conn, sample_company("Sakura Care", "Japan")).unwrap();
        assert_eq!(comp.name, "Sakura Care");
        assert_eq!(comp.country, "Japan");
        assert!(comp.id > 0);
    }

    #[test]
    fn test_get_company_by_name_case_insensitive() {
        let mut conn = setup_test_db();
        let created = insert_company(&mut conn, sample_company("Test Company Name", "Japan"))
            .expect("Failed to insert company");

        for test_name in ["test company name", "TEST COMPANY NAME", "tEsT cOmPaNy NaMe"] {
            let retrieved = get_company_by_name_case_insensitive(&mut conn, test_name)
                .expect("Query should succeed")
                .expect("Company should be found");
            assert_eq!(retrieved.id, created.id);
            assert_eq!(retrieved.name, "Test Company Name"); // Original case preserved
        }

        let result = get_company_by_name_case_insensitive(&mut conn, "Non-existent Company")
            .expect("Query should succeed");
        assert!(result.is_none());
    }

    #[test]
    fn test_update_company() {
        let mut conn = setup_test_db();
        let comp = insert_company(&mut conn, sample_company("Old Name", "Korea")).unwrap();

        let update = CompanyUpdate {
            name: Some("New Name".to_string()),
            industry: Some("Manufacturing".to_string()),
            ..Default::default()
        };
        let updated = update_company(&mut conn, comp.id, update, Utc::now().naive_utc())
            .unwrap()
            .expect("company exists");
        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.country, "Korea");
        assert_eq!(updated.industry.as_deref(), Some("Manufacturing"));

        let missing = update_company(&mut conn, 4242, CompanyUpdate::default(), Utc::now().naive_utc())
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_delete_company_without_placements() {
        let mut conn = setup_test_db();
        let comp = insert_company(&mut conn, sample_company("Removable LLC", "Japan")).unwrap();

        assert_eq!(delete_company(&mut conn, comp.id).unwrap(), CompanyDeletion::Deleted);
        assert_eq!(delete_company(&mut conn, comp.id).unwrap(), CompanyDeletion::NotFound);
        assert_eq!(count_companies(&mut conn).unwrap(), 0);
    }
}
