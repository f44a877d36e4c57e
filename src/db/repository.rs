//! Repository pattern implementation for data access layer
//!
//! Each repository wraps the shared connection pool and exposes the queries
//! one entity family needs. Row mapping stays in this module so handlers and
//! services never see rusqlite types.

use crate::core::error::{LmsError, Result};
use crate::db::manager::DatabaseManager;
use crate::db::models::{
    Course, Enrollment, Lesson, LessonProgress, LessonStatus, Module, User, UserRole,
};
use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row};
use std::sync::Arc;

/// Generic read operations shared by entity repositories
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Find an entity by its ID
    async fn find_by_id(&self, id: i64) -> Result<Option<T>>;

    /// Find all entities
    async fn find_all(&self) -> Result<Vec<T>>;
}

fn parse_column<T: std::str::FromStr>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T::Err: std::fmt::Display,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e.to_string(),
            )),
        )
    })
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: parse_column::<UserRole>(row, 4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn map_course(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        icon: row.get(4)?,
        color: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn map_module(row: &Row<'_>) -> rusqlite::Result<Module> {
    Ok(Module {
        id: row.get(0)?,
        course_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        sort_order: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn map_lesson(row: &Row<'_>) -> rusqlite::Result<Lesson> {
    Ok(Lesson {
        id: row.get(0)?,
        module_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        content: row.get(4)?,
        sort_order: row.get(5)?,
        duration_minutes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn map_enrollment(row: &Row<'_>) -> rusqlite::Result<Enrollment> {
    Ok(Enrollment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        course_id: row.get(2)?,
        enrolled_at: row.get(3)?,
        completed_at: row.get(4)?,
        progress_percentage: row.get(5)?,
    })
}

fn map_lesson_progress(row: &Row<'_>) -> rusqlite::Result<LessonProgress> {
    Ok(LessonProgress {
        id: row.get(0)?,
        user_id: row.get(1)?,
        lesson_id: row.get(2)?,
        status: parse_column::<LessonStatus>(row, 3)?,
        progress_percentage: row.get(4)?,
        started_at: row.get(5)?,
        completed_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

const USER_COLUMNS: &str = "id, full_name, email, password_hash, role, created_at, updated_at";
const COURSE_COLUMNS: &str = "id, title, description, category, icon, color, created_at, updated_at";
const MODULE_COLUMNS: &str = "id, course_id, title, description, sort_order, created_at, updated_at";
const LESSON_COLUMNS: &str =
    "id, module_id, title, description, content, sort_order, duration_minutes, created_at, updated_at";
const ENROLLMENT_COLUMNS: &str =
    "id, user_id, course_id, enrolled_at, completed_at, progress_percentage";
const LESSON_PROGRESS_COLUMNS: &str =
    "id, user_id, lesson_id, status, progress_percentage, started_at, completed_at, updated_at";

/// Fields needed to create a new user account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Repository for User entities (the Identity Store)
pub struct UserRepository {
    db: Arc<DatabaseManager>,
}

impl UserRepository {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Persist a new account. Email uniqueness is enforced by the store:
    /// a UNIQUE violation maps to DuplicateEmail.
    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        self.db
            .execute(move |conn| {
                let now = chrono::Utc::now().to_rfc3339();
                let inserted = conn.execute(
                    "INSERT INTO users (full_name, email, password_hash, role, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    rusqlite::params![
                        new_user.full_name,
                        new_user.email,
                        new_user.password_hash,
                        new_user.role.as_str(),
                        now,
                    ],
                );

                match inserted {
                    Ok(_) => {
                        let id = conn.last_insert_rowid();
                        conn.query_row(
                            &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                            [id],
                            map_user,
                        )
                        .map_err(LmsError::DatabaseError)
                    }
                    Err(rusqlite::Error::SqliteFailure(e, _))
                        if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                    {
                        Err(LmsError::DuplicateEmail(new_user.email.clone()))
                    }
                    Err(e) => Err(LmsError::DatabaseError(e)),
                }
            })
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
                    [&email],
                    map_user,
                )
                .optional()
                .map_err(LmsError::DatabaseError)
            })
            .await
    }

    pub async fn count(&self) -> Result<i64> {
        self.db
            .execute(|conn| {
                conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                    .map_err(LmsError::DatabaseError)
            })
            .await
    }
}

#[async_trait]
impl Repository<User> for UserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                    [id],
                    map_user,
                )
                .optional()
                .map_err(LmsError::DatabaseError)
            })
            .await
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn
                    .prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
                    .map_err(LmsError::DatabaseError)?;
                let users = stmt
                    .query_map([], map_user)
                    .map_err(LmsError::DatabaseError)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(LmsError::DatabaseError)?;
                Ok(users)
            })
            .await
    }
}

/// A course with its modules and their lessons, orders ascending
#[derive(Debug, Clone)]
pub struct CourseDetail {
    pub course: Course,
    pub modules: Vec<(Module, Vec<Lesson>)>,
}

/// Repository for the course catalog (courses, modules, lessons)
pub struct CourseRepository {
    db: Arc<DatabaseManager>,
}

impl CourseRepository {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Load a course with nested modules and lessons, siblings sorted by
    /// sort_order ascending.
    pub async fn find_detail(&self, id: i64) -> Result<Option<CourseDetail>> {
        self.db
            .execute(move |conn| {
                let course = conn
                    .query_row(
                        &format!("SELECT {} FROM courses WHERE id = ?", COURSE_COLUMNS),
                        [id],
                        map_course,
                    )
                    .optional()
                    .map_err(LmsError::DatabaseError)?;

                let Some(course) = course else {
                    return Ok(None);
                };

                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM modules WHERE course_id = ? ORDER BY sort_order ASC",
                        MODULE_COLUMNS
                    ))
                    .map_err(LmsError::DatabaseError)?;
                let modules = stmt
                    .query_map([id], map_module)
                    .map_err(LmsError::DatabaseError)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(LmsError::DatabaseError)?;

                let mut lesson_stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM lessons WHERE module_id = ? ORDER BY sort_order ASC",
                        LESSON_COLUMNS
                    ))
                    .map_err(LmsError::DatabaseError)?;

                let mut nested = Vec::with_capacity(modules.len());
                for module in modules {
                    let lessons = lesson_stmt
                        .query_map([module.id], map_lesson)
                        .map_err(LmsError::DatabaseError)?
                        .collect::<std::result::Result<Vec<_>, _>>()
                        .map_err(LmsError::DatabaseError)?;
                    nested.push((module, lessons));
                }

                Ok(Some(CourseDetail {
                    course,
                    modules: nested,
                }))
            })
            .await
    }

    pub async fn find_module(&self, id: i64) -> Result<Option<Module>> {
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM modules WHERE id = ?", MODULE_COLUMNS),
                    [id],
                    map_module,
                )
                .optional()
                .map_err(LmsError::DatabaseError)
            })
            .await
    }

    pub async fn find_lesson(&self, id: i64) -> Result<Option<Lesson>> {
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM lessons WHERE id = ?", LESSON_COLUMNS),
                    [id],
                    map_lesson,
                )
                .optional()
                .map_err(LmsError::DatabaseError)
            })
            .await
    }

    /// Resolve the course a lesson belongs to (via its module)
    pub async fn course_of_lesson(&self, lesson_id: i64) -> Result<Option<i64>> {
        self.db
            .execute(move |conn| {
                conn.query_row(
                    "SELECT m.course_id FROM lessons l \
                     JOIN modules m ON m.id = l.module_id WHERE l.id = ?",
                    [lesson_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(LmsError::DatabaseError)
            })
            .await
    }
}

#[async_trait]
impl Repository<Course> for CourseRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Course>> {
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM courses WHERE id = ?", COURSE_COLUMNS),
                    [id],
                    map_course,
                )
                .optional()
                .map_err(LmsError::DatabaseError)
            })
            .await
    }

    async fn find_all(&self) -> Result<Vec<Course>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn
                    .prepare(&format!("SELECT {} FROM courses ORDER BY id", COURSE_COLUMNS))
                    .map_err(LmsError::DatabaseError)?;
                let courses = stmt
                    .query_map([], map_course)
                    .map_err(LmsError::DatabaseError)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(LmsError::DatabaseError)?;
                Ok(courses)
            })
            .await
    }
}

/// Repository for Enrollment records
pub struct EnrollmentRepository {
    db: Arc<DatabaseManager>,
}

impl EnrollmentRepository {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Enroll a user in a course. Idempotent: re-enrolling returns the
    /// existing record unchanged.
    pub async fn enroll(&self, user_id: i64, course_id: i64) -> Result<Enrollment> {
        self.db
            .execute(move |conn| {
                let now = chrono::Utc::now().to_rfc3339();
                conn.execute(
                    "INSERT OR IGNORE INTO enrollments (user_id, course_id, enrolled_at) \
                     VALUES (?1, ?2, ?3)",
                    rusqlite::params![user_id, course_id, now],
                )
                .map_err(LmsError::DatabaseError)?;

                conn.query_row(
                    &format!(
                        "SELECT {} FROM enrollments WHERE user_id = ? AND course_id = ?",
                        ENROLLMENT_COLUMNS
                    ),
                    [user_id, course_id],
                    map_enrollment,
                )
                .map_err(LmsError::DatabaseError)
            })
            .await
    }

    pub async fn find_by_user(&self, user_id: i64) -> Result<Vec<Enrollment>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM enrollments WHERE user_id = ? ORDER BY enrolled_at",
                        ENROLLMENT_COLUMNS
                    ))
                    .map_err(LmsError::DatabaseError)?;
                let enrollments = stmt
                    .query_map([user_id], map_enrollment)
                    .map_err(LmsError::DatabaseError)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(LmsError::DatabaseError)?;
                Ok(enrollments)
            })
            .await
    }

    pub async fn find_by_user_and_course(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>> {
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!(
                        "SELECT {} FROM enrollments WHERE user_id = ? AND course_id = ?",
                        ENROLLMENT_COLUMNS
                    ),
                    [user_id, course_id],
                    map_enrollment,
                )
                .optional()
                .map_err(LmsError::DatabaseError)
            })
            .await
    }

    /// Write the recomputed aggregate progress back onto an enrollment
    pub async fn set_progress(
        &self,
        user_id: i64,
        course_id: i64,
        percentage: i64,
        completed_at: Option<String>,
    ) -> Result<()> {
        self.db
            .execute(move |conn| {
                conn.execute(
                    "UPDATE enrollments SET progress_percentage = ?1, completed_at = ?2 \
                     WHERE user_id = ?3 AND course_id = ?4",
                    rusqlite::params![percentage, completed_at, user_id, course_id],
                )
                .map_err(LmsError::DatabaseError)?;
                Ok(())
            })
            .await
    }
}

/// Repository for LessonProgress records
pub struct LessonProgressRepository {
    db: Arc<DatabaseManager>,
}

impl LessonProgressRepository {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    pub async fn find(&self, user_id: i64, lesson_id: i64) -> Result<Option<LessonProgress>> {
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!(
                        "SELECT {} FROM lesson_progress WHERE user_id = ? AND lesson_id = ?",
                        LESSON_PROGRESS_COLUMNS
                    ),
                    [user_id, lesson_id],
                    map_lesson_progress,
                )
                .optional()
                .map_err(LmsError::DatabaseError)
            })
            .await
    }

    /// Insert or update the progress row for (user, lesson). started_at and
    /// completed_at are passed through untouched; transition logic lives in
    /// ProgressService.
    pub async fn upsert(
        &self,
        user_id: i64,
        lesson_id: i64,
        status: LessonStatus,
        percentage: i64,
        started_at: Option<String>,
        completed_at: Option<String>,
    ) -> Result<LessonProgress> {
        self.db
            .execute(move |conn| {
                let now = chrono::Utc::now().to_rfc3339();
                conn.execute(
                    "INSERT INTO lesson_progress \
                     (user_id, lesson_id, status, progress_percentage, started_at, completed_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
                     ON CONFLICT(user_id, lesson_id) DO UPDATE SET \
                     status = excluded.status, \
                     progress_percentage = excluded.progress_percentage, \
                     started_at = excluded.started_at, \
                     completed_at = excluded.completed_at, \
                     updated_at = excluded.updated_at",
                    rusqlite::params![
                        user_id,
                        lesson_id,
                        status.as_str(),
                        percentage,
                        started_at,
                        completed_at,
                        now,
                    ],
                )
                .map_err(LmsError::DatabaseError)?;

                conn.query_row(
                    &format!(
                        "SELECT {} FROM lesson_progress WHERE user_id = ? AND lesson_id = ?",
                        LESSON_PROGRESS_COLUMNS
                    ),
                    [user_id, lesson_id],
                    map_lesson_progress,
                )
                .map_err(LmsError::DatabaseError)
            })
            .await
    }

    /// Count (total, completed) lessons in one module for one user
    pub async fn module_counts(&self, user_id: i64, module_id: i64) -> Result<(i64, i64)> {
        self.db
            .execute(move |conn| {
                let total: i64 = conn
                    .query_row(
                        "SELECT COUNT(*) FROM lessons WHERE module_id = ?",
                        [module_id],
                        |row| row.get(0),
                    )
                    .map_err(LmsError::DatabaseError)?;

                let completed: i64 = conn
                    .query_row(
                        "SELECT COUNT(*) FROM lesson_progress lp \
                         JOIN lessons l ON l.id = lp.lesson_id \
                         WHERE l.module_id = ?1 AND lp.user_id = ?2 AND lp.status = 'completed'",
                        [module_id, user_id],
                        |row| row.get(0),
                    )
                    .map_err(LmsError::DatabaseError)?;

                Ok((total, completed))
            })
            .await
    }

    /// Count (total, completed) lessons across a whole course for one user
    pub async fn course_counts(&self, user_id: i64, course_id: i64) -> Result<(i64, i64)> {
        self.db
            .execute(move |conn| {
                let total: i64 = conn
                    .query_row(
                        "SELECT COUNT(*) FROM lessons l \
                         JOIN modules m ON m.id = l.module_id \
                         WHERE m.course_id = ?",
                        [course_id],
                        |row| row.get(0),
                    )
                    .map_err(LmsError::DatabaseError)?;

                let completed: i64 = conn
                    .query_row(
                        "SELECT COUNT(*) FROM lesson_progress lp \
                         JOIN lessons l ON l.id = lp.lesson_id \
                         JOIN modules m ON m.id = l.module_id \
                         WHERE m.course_id = ?1 AND lp.user_id = ?2 AND lp.status = 'completed'",
                        [course_id, user_id],
                        |row| row.get(0),
                    )
                    .map_err(LmsError::DatabaseError)?;

                Ok((total, completed))
            })
            .await
    }

    pub async fn count(&self) -> Result<i64> {
        self.db
            .execute(|conn| {
                conn.query_row("SELECT COUNT(*) FROM lesson_progress", [], |row| row.get(0))
                    .map_err(LmsError::DatabaseError)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_repos() -> (
        Arc<DatabaseManager>,
        UserRepository,
        CourseRepository,
        EnrollmentRepository,
    ) {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        (
            db.clone(),
            UserRepository::new(db.clone()),
            CourseRepository::new(db.clone()),
            EnrollmentRepository::new(db),
        )
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            full_name: "Alex Johnson".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::Student,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let (_db, users, _courses, _enrollments) = test_repos().await;

        let created = users.create(new_user("alex@example.com")).await.unwrap();
        assert_eq!(created.email, "alex@example.com");
        assert_eq!(created.role, UserRole::Student);

        let found = users.find_by_email("alex@example.com").await.unwrap();
        assert_eq!(found.unwrap().id, created.id);

        let missing = users.find_by_email("nobody@example.com").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (_db, users, _courses, _enrollments) = test_repos().await;

        users.create(new_user("alex@example.com")).await.unwrap();
        let err = users
            .create(new_user("alex@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, LmsError::DuplicateEmail(_)));
        assert_eq!(users.count().await.unwrap(), 1);
    }

    async fn seed_catalog(db: &DatabaseManager) -> i64 {
        // One course, two modules inserted out of order, lessons likewise
        db.execute(|conn| {
            conn.execute_batch(
                "INSERT INTO courses (title, category) VALUES ('Introduction to HIV', 'HIV Basics');
                 INSERT INTO modules (course_id, title, sort_order) VALUES (1, 'Module 2', 2);
                 INSERT INTO modules (course_id, title, sort_order) VALUES (1, 'Module 1', 1);
                 INSERT INTO lessons (module_id, title, sort_order, duration_minutes) VALUES (2, 'Lesson B', 2, 12);
                 INSERT INTO lessons (module_id, title, sort_order, duration_minutes) VALUES (2, 'Lesson A', 1, 10);
                 INSERT INTO lessons (module_id, title, sort_order, duration_minutes) VALUES (1, 'Lesson C', 1, 15);",
            )
            .map_err(LmsError::DatabaseError)
        })
        .await
        .unwrap();
        1
    }

    #[tokio::test]
    async fn test_course_detail_sorted_by_order() {
        let (db, _users, courses, _enrollments) = test_repos().await;
        let course_id = seed_catalog(&db).await;

        let detail = courses.find_detail(course_id).await.unwrap().unwrap();
        assert_eq!(detail.course.title, "Introduction to HIV");
        assert_eq!(detail.modules.len(), 2);

        let orders: Vec<i64> = detail.modules.iter().map(|(m, _)| m.sort_order).collect();
        assert_eq!(orders, vec![1, 2]);

        // Module 1 (sort_order 1) has lessons A then B
        let (first_module, first_lessons) = &detail.modules[0];
        assert_eq!(first_module.title, "Module 1");
        let lesson_orders: Vec<i64> = first_lessons.iter().map(|l| l.sort_order).collect();
        assert_eq!(lesson_orders, vec![1, 2]);
        assert_eq!(first_lessons[0].title, "Lesson A");
    }

    #[tokio::test]
    async fn test_course_detail_missing_returns_none() {
        let (_db, _users, courses, _enrollments) = test_repos().await;
        assert!(courses.find_detail(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_course_of_lesson() {
        let (db, _users, courses, _enrollments) = test_repos().await;
        seed_catalog(&db).await;

        assert_eq!(courses.course_of_lesson(1).await.unwrap(), Some(1));
        assert_eq!(courses.course_of_lesson(999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_enroll_is_idempotent() {
        let (db, users, _courses, enrollments) = test_repos().await;
        seed_catalog(&db).await;
        let user = users.create(new_user("alex@example.com")).await.unwrap();

        let first = enrollments.enroll(user.id, 1).await.unwrap();
        let second = enrollments.enroll(user.id, 1).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(enrollments.find_by_user(user.id).await.unwrap().len(), 1);
    }
}
