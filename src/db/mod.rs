//! Database module
//!
//! This module provides database management functionality including:
//! - Database connection pool management
//! - Repository pattern implementations
//! - Database migrations
//! - Data models and demo seeding

pub mod manager;
pub mod migrations;
pub mod models;
pub mod repository;
pub mod seed;

pub use manager::DatabaseManager;
pub use models::{Course, Enrollment, Lesson, LessonProgress, LessonStatus, Module, User, UserRole};
pub use repository::{
    CourseRepository, EnrollmentRepository, LessonProgressRepository, Repository, UserRepository,
};
