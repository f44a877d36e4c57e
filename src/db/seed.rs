//! Demo-data seeding
//!
//! Populates an empty database with the demo accounts, course catalog,
//! enrollments, and lesson progress used by development and test
//! environments. Skips entirely when any user already exists.

use crate::auth::password::hash_password;
use crate::core::error::{LmsError, Result};
use crate::db::manager::DatabaseManager;
use tracing::info;

/// Seed the database with demo data. Idempotent.
pub async fn seed_demo_data(db: &DatabaseManager) -> Result<()> {
    let existing: i64 = db
        .execute(|conn| {
            conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                .map_err(LmsError::DatabaseError)
        })
        .await?;

    if existing > 0 {
        info!("Database already seeded, skipping");
        return Ok(());
    }

    // Hash outside the transaction closure: bcrypt is deliberately slow
    let admin_hash = hash_password("admin123")?;
    let student_hash = hash_password("student123")?;

    db.transaction(move |tx| {
        let now = chrono::Utc::now().to_rfc3339();

        tx.execute(
            "INSERT INTO users (full_name, email, password_hash, role, created_at, updated_at) \
             VALUES ('Admin User', 'admin@jijue.com', ?1, 'admin', ?2, ?2)",
            rusqlite::params![admin_hash, now],
        )
        .map_err(LmsError::DatabaseError)?;

        tx.execute(
            "INSERT INTO users (full_name, email, password_hash, role, created_at, updated_at) \
             VALUES ('Alex Johnson', 'alex@example.com', ?1, 'student', ?2, ?2)",
            rusqlite::params![student_hash, now],
        )
        .map_err(LmsError::DatabaseError)?;
        let student_id = tx.last_insert_rowid();

        let courses = [
            (
                "Introduction to HIV",
                "Understand the fundamentals of HIV, how it is transmitted, and its impact on the immune system.",
                "HIV Basics",
                "HeartPulse",
                "primary",
            ),
            (
                "Prevention Strategies",
                "Learn about various methods of HIV prevention, including safe practices, PrEP, and PEP.",
                "Prevention",
                "Shield",
                "secondary",
            ),
            (
                "Treatment and Care",
                "An overview of antiretroviral therapy (ART), adherence, and managing life with HIV.",
                "Treatment & Care",
                "HeartPulse",
                "primary",
            ),
            (
                "HIV & Mental Health",
                "Explore the connection between HIV and mental well-being, and learn coping strategies.",
                "Living with HIV",
                "Brain",
                "secondary",
            ),
            (
                "Combating Stigma",
                "Learn to identify and challenge HIV-related stigma and discrimination in communities.",
                "Living with HIV",
                "Heart",
                "primary",
            ),
            (
                "Legal Rights & HIV",
                "Understand the legal and human rights of people living with HIV in Kenya.",
                "HIV Basics",
                "Scale",
                "secondary",
            ),
        ];

        let mut first_course_id = 0;
        for (i, (title, description, category, icon, color)) in courses.iter().enumerate() {
            tx.execute(
                "INSERT INTO courses (title, description, category, icon, color) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![title, description, category, icon, color],
            )
            .map_err(LmsError::DatabaseError)?;
            if i == 0 {
                first_course_id = tx.last_insert_rowid();
            }
        }
        let second_course_id = first_course_id + 1;

        tx.execute(
            "INSERT INTO modules (course_id, title, description, sort_order) \
             VALUES (?1, 'Module 1: HIV Basics', 'Introduction to what HIV is and how it affects the body.', 1)",
            [first_course_id],
        )
        .map_err(LmsError::DatabaseError)?;
        let module1_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO modules (course_id, title, description, sort_order) \
             VALUES (?1, 'Module 2: Understanding Transmission', 'Learn the ways HIV is transmitted and how it is not.', 2)",
            [first_course_id],
        )
        .map_err(LmsError::DatabaseError)?;
        let module2_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO lessons (module_id, title, description, content, sort_order, duration_minutes) \
             VALUES (?1, 'What is HIV?', 'Basic overview of HIV virus', 'https://example.com/video1', 1, 10)",
            [module1_id],
        )
        .map_err(LmsError::DatabaseError)?;
        let lesson1_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO lessons (module_id, title, description, content, sort_order, duration_minutes) \
             VALUES (?1, 'HIV and the Immune System', 'How HIV affects CD4 cells', 'https://example.com/video2', 2, 12)",
            [module1_id],
        )
        .map_err(LmsError::DatabaseError)?;
        let lesson2_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO lessons (module_id, title, description, content, sort_order, duration_minutes) \
             VALUES (?1, 'Routes of Transmission', 'How HIV is transmitted', 'https://example.com/video3', 1, 15)",
            [module2_id],
        )
        .map_err(LmsError::DatabaseError)?;

        tx.execute(
            "INSERT INTO enrollments (user_id, course_id, enrolled_at, progress_percentage) \
             VALUES (?1, ?2, ?3, 75)",
            rusqlite::params![student_id, first_course_id, now],
        )
        .map_err(LmsError::DatabaseError)?;
        tx.execute(
            "INSERT INTO enrollments (user_id, course_id, enrolled_at, progress_percentage) \
             VALUES (?1, ?2, ?3, 0)",
            rusqlite::params![student_id, second_course_id, now],
        )
        .map_err(LmsError::DatabaseError)?;

        tx.execute(
            "INSERT INTO lesson_progress (user_id, lesson_id, status, progress_percentage, started_at, completed_at) \
             VALUES (?1, ?2, 'completed', 100, ?3, ?3)",
            rusqlite::params![student_id, lesson1_id, now],
        )
        .map_err(LmsError::DatabaseError)?;
        tx.execute(
            "INSERT INTO lesson_progress (user_id, lesson_id, status, progress_percentage, started_at) \
             VALUES (?1, ?2, 'in_progress', 50, ?3)",
            rusqlite::params![student_id, lesson2_id, now],
        )
        .map_err(LmsError::DatabaseError)?;

        Ok(())
    })
    .await?;

    info!("Database seeded: admin@jijue.com / admin123, alex@example.com / student123");
    Ok(())
}
