use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::models::{NewStudent, Student, StudentChanges, StudentInput, StudentStatus};
use crate::orm::last_insert_id;

/// Optional filters for the student listing.
#[derive(Debug, Default, Clone)]
pub struct StudentFilter {
    pub status: Option<StudentStatus>,
    pub district: Option<String>,
}

/// Registers a new student. Every student starts out `pending`.
///
/// `registered_at` becomes both `created_at` and `updated_at`; analytics
/// bucket registrations by this timestamp.
pub fn insert_student(
    conn: &mut SqliteConnection,
    input: StudentInput,
    registered_at: NaiveDateTime,
) -> Result<Student, diesel::result::Error> {
    use crate::schema::students::dsl::*;

    let new_student = NewStudent {
        full_name: input.full_name,
        nic: input.nic,
        district: input.district,
        province: input.province,
        date_of_birth: input.date_of_birth,
        sex: input.sex,
        marital_status: input.marital_status,
        phone: input.phone,
        email: input.email,
        address: input.address,
        has_ol: input.has_ol,
        has_al: input.has_al,
        status: StudentStatus::Pending.as_str().to_string(),
        created_at: registered_at,
        updated_at: registered_at,
    };

    conn.transaction(|conn| {
        diesel::insert_into(students)
            .values(&new_student)
            .execute(conn)?;
        let student_id = last_insert_id(conn)?;

        students
            .filter(id.eq(student_id))
            .select(Student::as_select())
            .first(conn)
    })
}

/// Gets a student by ID.
pub fn get_student(
    conn: &mut SqliteConnection,
    student_id: i32,
) -> Result<Option<Student>, diesel::result::Error> {
    use crate::schema::students::dsl::*;
    students
        .filter(id.eq(student_id))
        .select(Student::as_select())
        .first(conn)
        .optional()
}

/// Lists students, newest registrations first.
pub fn list_students(
    conn: &mut SqliteConnection,
    filter: &StudentFilter,
) -> Result<Vec<Student>, diesel::result::Error> {
    use crate::schema::students::dsl::*;

    let mut query = students.select(Student::as_select()).into_boxed();
    if let Some(wanted) = filter.status {
        query = query.filter(status.eq(wanted.as_str()));
    }
    if let Some(wanted) = &filter.district {
        query = query.filter(district.eq(wanted.clone()));
    }
    query.order((created_at.desc(), id.desc())).load(conn)
}

/// Applies a partial update. Returns Ok(None) if the student does not exist.
pub fn update_student(
    conn: &mut SqliteConnection,
    student_id: i32,
    changes: StudentChanges,
) -> Result<Option<Student>, diesel::result::Error> {
    use crate::schema::students::dsl::*;

    let rows_affected = diesel::update(students.filter(id.eq(student_id)))
        .set(&changes)
        .execute(conn)?;
    if rows_affected == 0 {
        return Ok(None);
    }
    get_student(conn, student_id)
}

/// Sets a student's status, touching `updated_at`.
pub fn set_student_status(
    conn: &mut SqliteConnection,
    student_id: i32,
    new_status: StudentStatus,
    now: NaiveDateTime,
) -> Result<bool, diesel::result::Error> {
    use crate::schema::students::dsl::*;

    let rows_affected = diesel::update(students.filter(id.eq(student_id)))
        .set((status.eq(new_status.as_str()), updated_at.eq(now)))
        .execute(conn)?;
    Ok(rows_affected > 0)
}

/// Soft delete: the row stays, its status becomes `inactive`.
/// Returns Ok(false) if the student does not exist.
pub fn deactivate_student(
    conn: &mut SqliteConnection,
    student_id: i32,
    now: NaiveDateTime,
) -> Result<bool, diesel::result::Error> {
    set_student_status(conn, student_id, StudentStatus::Inactive, now)
}

/// Counts students per status. Statuses with no students are omitted.
pub fn count_students_by_status(
    conn: &mut SqliteConnection,
) -> Result<Vec<(String, i64)>, diesel::result::Error> {
    use crate::schema::students::dsl::*;
    students
        .group_by(status)
        .select((status, diesel::dsl::count_star()))
        .order(status.asc())
        .load(conn)
}

/// The most recently registered students.
pub fn recent_students(
    conn: &mut SqliteConnection,
    limit: i64,
) -> Result<Vec<Student>, diesel::result::Error> {
    use crate::schema::students::dsl::*;
    students
        .order((created_at.desc(), id.desc()))
        .limit(limit)
        .select(Student::as_select())
        .load(conn)
}
