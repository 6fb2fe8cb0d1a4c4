//! Database seeders for demo data
//!
//! Fills an empty catalog with a handful of departments, groups, teachers,
//! subjects and classrooms so a fresh install has something to book against.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Seed the reference catalog if no subjects exist yet
pub async fn seed_demo_catalog(pool: &SqlitePool) -> Result<()> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subjects")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        info!("Catalog already populated, skipping demo seed");
        return Ok(());
    }

    info!("Seeding demo catalog...");

    let mut tx = pool.begin().await?;

    let departments = ["Computer Science", "Mathematics"];
    for name in departments {
        sqlx::query("INSERT OR IGNORE INTO departments (name) VALUES (?)")
            .bind(name)
            .execute(&mut *tx)
            .await?;
    }

    // (name, course)
    let groups = [("CS-101", "1"), ("CS-102", "1"), ("MA-201", "2")];
    for (name, course) in groups {
        sqlx::query(r#"INSERT INTO "groups" (name, course) VALUES (?, ?)"#)
            .bind(name)
            .bind(course)
            .execute(&mut *tx)
            .await?;
    }

    // (name, department)
    let teachers = [
        ("Ada Lovelace", "Computer Science"),
        ("Alan Turing", "Computer Science"),
        ("Emmy Noether", "Mathematics"),
    ];
    for (name, department) in teachers {
        sqlx::query(
            r#"
            INSERT INTO teachers (name, department_id)
            VALUES (?, (SELECT id FROM departments WHERE name = ?))
            "#,
        )
        .bind(name)
        .bind(department)
        .execute(&mut *tx)
        .await?;
    }

    let subjects = [
        ("Algorithms", "Design and analysis of algorithms"),
        ("Databases", "Relational modelling and SQL"),
        ("Linear Algebra", "Vector spaces and linear maps"),
    ];
    for (name, description) in subjects {
        sqlx::query("INSERT INTO subjects (name, description) VALUES (?, ?)")
            .bind(name)
            .bind(description)
            .execute(&mut *tx)
            .await?;
    }

    // (room, building, capacity)
    let classrooms = [("101", "Main", 30), ("202", "Main", 60), ("L1", "Lab", 20)];
    for (room, building, capacity) in classrooms {
        sqlx::query("INSERT INTO classrooms (room_number, building, capacity) VALUES (?, ?, ?)")
            .bind(room)
            .bind(building)
            .bind(capacity)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    info!("Demo catalog seeded");
    Ok(())
}
