use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::models::{NewPlacement, Placement, PlacementInput, PlacementWithDetails, StudentStatus};
use crate::orm::company::get_company_by_id;
use crate::orm::last_insert_id;
use crate::orm::student::{get_student, set_student_status};
use crate::schema::{companies, placements, students};

/// Outcome of a placement creation request.
#[derive(Debug)]
pub enum PlacementCreation {
    Created(Placement),
    StudentNotFound,
    CompanyNotFound,
}

/// Creates a placement and flips the student to `employed` in one
/// transaction. Either both writes land or neither does.
pub fn create_placement(
    conn: &mut SqliteConnection,
    input: PlacementInput,
    now: NaiveDateTime,
) -> Result<PlacementCreation, diesel::result::Error> {
    conn.transaction(|conn| {
        if get_student(conn, input.student_id)?.is_none() {
            return Ok(PlacementCreation::StudentNotFound);
        }
        if get_company_by_id(conn, input.company_id)?.is_none() {
            return Ok(PlacementCreation::CompanyNotFound);
        }

        let new_placement = NewPlacement {
            student_id: input.student_id,
            company_id: input.company_id,
            position: input.position,
            salary: input.salary,
            start_date: input.start_date,
            end_date: input.end_date,
            contract_duration_months: input.contract_duration_months,
            visa_type: input.visa_type,
            created_at: now,
        };

        diesel::insert_into(placements::table)
            .values(&new_placement)
            .execute(conn)?;

        let placement_id = last_insert_id(conn)?;
        let placement = placements::table
            .filter(placements::id.eq(placement_id))
            .select(Placement::as_select())
            .first(conn)?;

        set_student_status(conn, placement.student_id, StudentStatus::Employed, now)?;

        Ok(PlacementCreation::Created(placement))
    })
}

/// Gets a placement by ID.
pub fn get_placement(
    conn: &mut SqliteConnection,
    placement_id: i32,
) -> Result<Option<Placement>, diesel::result::Error> {
    placements::table
        .filter(placements::id.eq(placement_id))
        .select(Placement::as_select())
        .first(conn)
        .optional()
}

fn with_details(rows: Vec<(Placement, String, String, String)>) -> Vec<PlacementWithDetails> {
    rows.into_iter()
        .map(|(placement, student_name, company_name, country)| PlacementWithDetails {
            placement,
            student_name,
            company_name,
            country,
        })
        .collect()
}

/// Lists placements joined with student and company names, newest start
/// date first. `limit` caps the number of rows when given.
pub fn list_placements_with_details(
    conn: &mut SqliteConnection,
    limit: Option<i64>,
) -> Result<Vec<PlacementWithDetails>, diesel::result::Error> {
    let mut query = placements::table
        .inner_join(students::table)
        .inner_join(companies::table)
        .select((
            Placement::as_select(),
            students::full_name,
            companies::name,
            companies::country,
        ))
        .order((placements::start_date.desc(), placements::id.desc()))
        .into_boxed();
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    query.load(conn).map(with_details)
}

/// Deletes a placement. The student's status is left as it is; the status
/// and placement-table employment signals are allowed to diverge.
pub fn delete_placement(
    conn: &mut SqliteConnection,
    placement_id: i32,
) -> Result<bool, diesel::result::Error> {
    let rows_affected =
        diesel::delete(placements::table.filter(placements::id.eq(placement_id))).execute(conn)?;
    Ok(rows_affected > 0)
}

/// Total number of placements.
pub fn count_placements(conn: &mut SqliteConnection) -> Result<i64, diesel::result::Error> {
    placements::table.count().get_result(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::company::insert_company;
    use crate::orm::student::insert_student;
    use crate::orm::testing::{sample_company, sample_placement, sample_student, setup_test_db};
    use chrono::Utc;

    #[test]
    fn test_create_placement_marks_student_employed() {
        let mut conn = setup_test_db();
        let now = Utc::now().naive_utc();
        let student = insert_student(&mut conn, sample_student("Ruwan", "Kandy"), now).unwrap();
        let company = insert_company(&mut conn, sample_company("Tokyo Build", "Japan")).unwrap();

        let created = create_placement(&mut conn, sample_placement(student.id, company.id), now)
            .unwrap();
        let placement = match created {
            PlacementCreation::Created(p) => p,
            other => panic!("expected a placement, got {:?}", other),
        };
        assert_eq!(placement.student_id, student.id);

        let student = get_student(&mut conn, student.id).unwrap().unwrap();
        assert_eq!(student.status, "employed");
    }

    #[test]
    fn test_create_placement_missing_references() {
        let mut conn = setup_test_db();
        let now = Utc::now().naive_utc();
        let student = insert_student(&mut conn, sample_student("Ruwan", "Kandy"), now).unwrap();
        let company = insert_company(&mut conn, sample_company("Tokyo Build", "Japan")).unwrap();

        assert!(matches!(
            create_placement(&mut conn, sample_placement(999, company.id), now).unwrap(),
            PlacementCreation::StudentNotFound
        ));
        assert!(matches!(
            create_placement(&mut conn, sample_placement(student.id, 999), now).unwrap(),
            PlacementCreation::CompanyNotFound
        ));
        assert_eq!(count_placements(&mut conn).unwrap(), 0);
        let student = get_student(&mut conn, student.id).unwrap().unwrap();
        assert_eq!(student.status, "pending");
    }

    #[test]
    fn test_list_with_details_and_delete() {
        let mut conn = setup_test_db();
        let now = Utc::now().naive_utc();
        let student = insert_student(&mut conn, sample_student("Ruwan", "Kandy"), now).unwrap();
        let company = insert_company(&mut conn, sample_company("Seoul Works", "Korea")).unwrap();
        create_placement(&mut conn, sample_placement(student.id, company.id), now).unwrap();

        let listed = list_placements_with_details(&mut conn, None).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].student_name, "Ruwan");
        assert_eq!(listed[0].company_name, "Seoul Works");
        assert_eq!(listed[0].country, "Korea");

        let id = listed[0].placement.id;
        assert!(delete_placement(&mut conn, id).unwrap());
        assert!(get_placement(&mut conn, id).unwrap().is_none());
        // Status is not rolled back
        let student = get_student(&mut conn, student.id).unwrap().unwrap();
        assert_eq!(student.status, "employed");
    }

    #[test]
    fn test_company_with_placements_cannot_be_deleted() {
        use crate::orm::company::{CompanyDeletion, delete_company};

        let mut conn = setup_test_db();
        let now = Utc::now().naive_utc();
        let student = insert_student(&mut conn, sample_student("Ruwan", "Kandy"), now).unwrap();
        let company = insert_company(&mut conn, sample_company("Seoul Works", "Korea")).unwrap();
        create_placement(&mut conn, sample_placement(student.id, company.id), now).unwrap();

        assert_eq!(
            delete_company(&mut conn, company.id).unwrap(),
            CompanyDeletion::HasPlacements(1)
        );
    }
}
