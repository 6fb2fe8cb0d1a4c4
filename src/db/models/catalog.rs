//! Reference entities a session points at.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Classroom {
    pub id: i64,
    pub room_number: String,
    pub building: Option<String>,
    pub capacity: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub course: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub id: i64,
    pub name: String,
}

/// Everything a booking form needs to populate its selection widgets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub subjects: Vec<Subject>,
    pub teachers: Vec<Teacher>,
    pub classrooms: Vec<Classroom>,
    pub groups: Vec<Group>,
    pub departments: Vec<Department>,
}

impl Subject {
    pub async fn list(db: &SqlitePool) -> Result<Vec<Subject>, sqlx::Error> {
        sqlx::query_as("SELECT id, name, description FROM subjects ORDER BY name ASC, id ASC")
            .fetch_all(db)
            .await
    }
}

impl Teacher {
    pub async fn list(db: &SqlitePool) -> Result<Vec<Teacher>, sqlx::Error> {
        sqlx::query_as("SELECT id, name, department_id FROM teachers ORDER BY name ASC, id ASC")
            .fetch_all(db)
            .await
    }
}

impl Classroom {
    pub async fn list(db: &SqlitePool) -> Result<Vec<Classroom>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, room_number, building, capacity FROM classrooms ORDER BY room_number ASC, id ASC",
        )
        .fetch_all(db)
        .await
    }
}

impl Group {
    pub async fn list(db: &SqlitePool) -> Result<Vec<Group>, sqlx::Error> {
        sqlx::query_as(r#"SELECT id, name, course FROM "groups" ORDER BY name ASC, id ASC"#)
            .fetch_all(db)
            .await
    }
}

impl Department {
    pub async fn list(db: &SqlitePool) -> Result<Vec<Department>, sqlx::Error> {
        sqlx::query_as("SELECT id, name FROM departments ORDER BY name ASC, id ASC")
            .fetch_all(db)
            .await
    }
}

impl Catalog {
    pub async fn load(db: &SqlitePool) -> Result<Catalog, sqlx::Error> {
        Ok(Catalog {
            subjects: Subject::list(db).await?,
            teachers: Teacher::list(db).await?,
            classrooms: Classroom::list(db).await?,
            groups: Group::list(db).await?,
            departments: Department::list(db).await?,
        })
    }
}
