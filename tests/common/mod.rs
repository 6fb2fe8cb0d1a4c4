#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use timetable::config::BookingPolicy;
use timetable::db::{self, DbPool, Role};
use timetable::schedule::{Actor, BookingForm, BookingService};

/// Ids of the reference rows every test books against
pub struct Fixture {
    pub db: DbPool,
    pub admin: Actor,
    pub teacher_user: Actor,
    pub other_teacher_user: Actor,
    pub student_user: Actor,
    pub other_student_user: Actor,
    pub algorithms: i64,
    pub databases: i64,
    /// Taught by `teacher_user`
    pub t1: i64,
    /// Taught by `other_teacher_user`
    pub t2: i64,
    pub r1: i64,
    pub r2: i64,
    /// Group of `student_user`
    pub g1: i64,
    /// Group of `other_student_user`
    pub g2: i64,
    pub g3: i64,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::populate(db::init_in_memory().await.unwrap()).await
    }

    /// Insert the reference rows into an already migrated pool
    pub async fn populate(db: DbPool) -> Self {
        let admin = insert_user(&db, "registrar", Role::Admin).await;
        let teacher_user = insert_user(&db, "ada", Role::Teacher).await;
        let other_teacher_user = insert_user(&db, "alan", Role::Teacher).await;
        let student_user = insert_user(&db, "sam", Role::Student).await;
        let other_student_user = insert_user(&db, "kim", Role::Student).await;

        let algorithms = insert(&db, "INSERT INTO subjects (name) VALUES ('Algorithms')").await;
        let databases = insert(&db, "INSERT INTO subjects (name) VALUES ('Databases')").await;

        let t1 = insert_bound(
            &db,
            "INSERT INTO teachers (user_id, name) VALUES (?, 'Ada Lovelace')",
            teacher_user.user_id,
        )
        .await;
        let t2 = insert_bound(
            &db,
            "INSERT INTO teachers (user_id, name) VALUES (?, 'Alan Turing')",
            other_teacher_user.user_id,
        )
        .await;

        let r1 = insert(&db, "INSERT INTO classrooms (room_number) VALUES ('101')").await;
        let r2 = insert(&db, "INSERT INTO classrooms (room_number) VALUES ('202')").await;

        let g1 = insert(&db, r#"INSERT INTO "groups" (name) VALUES ('CS-101')"#).await;
        let g2 = insert(&db, r#"INSERT INTO "groups" (name) VALUES ('CS-102')"#).await;
        let g3 = insert(&db, r#"INSERT INTO "groups" (name) VALUES ('MA-201')"#).await;

        sqlx::query("INSERT INTO students (user_id, name, group_id) VALUES (?, 'Sam', ?)")
            .bind(student_user.user_id)
            .bind(g1)
            .execute(&db)
            .await
            .unwrap();
        sqlx::query("INSERT INTO students (user_id, name, group_id) VALUES (?, 'Kim', ?)")
            .bind(other_student_user.user_id)
            .bind(g2)
            .execute(&db)
            .await
            .unwrap();

        Self {
            db,
            admin,
            teacher_user,
            other_teacher_user,
            student_user,
            other_student_user,
            algorithms,
            databases,
            t1,
            t2,
            r1,
            r2,
            g1,
            g2,
            g3,
        }
    }

    pub fn booking(&self) -> BookingService {
        BookingService::new(self.db.clone(), BookingPolicy::default())
    }

    pub fn booking_with(&self, policy: BookingPolicy) -> BookingService {
        BookingService::new(self.db.clone(), policy)
    }

    pub async fn session_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM schedule")
            .fetch_one(&self.db)
            .await
            .unwrap()
    }
}

/// A complete booking form for the given resources
pub fn form(subject: i64, teacher: i64, classroom: i64, group: i64, start: &str) -> BookingForm {
    BookingForm {
        subject_id: Some(subject.into()),
        teacher_id: Some(teacher.into()),
        classroom_id: Some(classroom.into()),
        group_id: Some(group.into()),
        group_ids: Vec::new(),
        start_time: Some(start.to_string()),
    }
}

pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
}

async fn insert_user(db: &DbPool, username: &str, role: Role) -> Actor {
    let id = sqlx::query("INSERT INTO users (username, password_hash, role) VALUES (?, 'x', ?)")
        .bind(username)
        .bind(role.as_str())
        .execute(db)
        .await
        .unwrap()
        .last_insert_rowid();
    Actor::new(id, role)
}

async fn insert(db: &DbPool, sql: &str) -> i64 {
    sqlx::query(sql)
        .execute(db)
        .await
        .unwrap()
        .last_insert_rowid()
}

async fn insert_bound(db: &DbPool, sql: &str, value: i64) -> i64 {
    sqlx::query(sql)
        .bind(value)
        .execute(db)
        .await
        .unwrap()
        .last_insert_rowid()
}
