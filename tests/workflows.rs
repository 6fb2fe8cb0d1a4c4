mod common;

use common::{form, utc, Fixture};
use timetable::db::{RequestDecision, RequestStatus};
use timetable::schedule::{change_requests, comments, ScheduleError};

async fn book(fx: &Fixture, start: &str) -> i64 {
    fx.booking()
        .create(&form(fx.algorithms, fx.t1, fx.r1, fx.g1, start))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_request_lifecycle() {
    let fx = Fixture::new().await;
    let session = book(&fx, "2025-09-01T08:00").await;

    let request = change_requests::create_request(
        &fx.db,
        &fx.student_user,
        session,
        "  Could we move this to the afternoon?  ",
    )
    .await
    .unwrap();
    assert_eq!(request.status().unwrap(), RequestStatus::Pending);
    assert_eq!(request.desired_change, "Could we move this to the afternoon?");
    assert_eq!(request.schedule_id, Some(session));
    assert_eq!(request.user_id, fx.student_user.user_id);

    let approved =
        change_requests::decide_request(&fx.db, &fx.admin, request.id, RequestDecision::Approve)
            .await
            .unwrap();
    assert_eq!(approved.status().unwrap(), RequestStatus::Approved);

    let err =
        change_requests::decide_request(&fx.db, &fx.admin, request.id, RequestDecision::Reject)
            .await
            .unwrap_err();
    assert!(matches!(
        err,
        ScheduleError::InvalidTransition {
            status: RequestStatus::Approved,
            ..
        }
    ));
}

#[tokio::test]
async fn test_request_permissions_and_validation() {
    let fx = Fixture::new().await;
    let session = book(&fx, "2025-09-01T08:00").await;

    let err = change_requests::create_request(&fx.db, &fx.admin, session, "Move it")
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Forbidden(_)));

    let err = change_requests::create_request(&fx.db, &fx.teacher_user, session, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Validation(_)));

    let too_long = "x".repeat(change_requests::MAX_DESIRED_CHANGE_LEN + 1);
    let err = change_requests::create_request(&fx.db, &fx.teacher_user, session, &too_long)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Validation(_)));

    let err = change_requests::create_request(&fx.db, &fx.teacher_user, 999, "Move it")
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::NotFound { .. }));

    let request = change_requests::create_request(&fx.db, &fx.teacher_user, session, "Move it")
        .await
        .unwrap();
    let err = change_requests::decide_request(
        &fx.db,
        &fx.teacher_user,
        request.id,
        RequestDecision::Approve,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ScheduleError::Forbidden(_)));

    let err = change_requests::decide_request(&fx.db, &fx.admin, 999, RequestDecision::Reject)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::NotFound { .. }));
}

#[tokio::test]
async fn test_unreadable_status_cannot_be_decided() {
    let fx = Fixture::new().await;
    let session = book(&fx, "2025-09-01T08:00").await;

    // Single-connection pool, so the pragma covers the insert below
    sqlx::query("PRAGMA ignore_check_constraints = ON")
        .execute(&fx.db)
        .await
        .unwrap();
    let id = sqlx::query(
        "INSERT INTO requests (user_id, schedule_id, desired_change, status, created_at) \
         VALUES (?, ?, 'Move it', 'archived', '2025-09-01T00:00:00Z')",
    )
    .bind(fx.student_user.user_id)
    .bind(session)
    .execute(&fx.db)
    .await
    .unwrap()
    .last_insert_rowid();

    let err = change_requests::decide_request(&fx.db, &fx.admin, id, RequestDecision::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Store(sqlx::Error::Decode(_))));

    let stored = change_requests::get_request(&fx.db, id).await.unwrap();
    assert_eq!(stored.status, "archived");
    assert!(stored.status().is_err());
}

#[tokio::test]
async fn test_request_listing_scopes() {
    let fx = Fixture::new().await;
    let session = book(&fx, "2025-09-01T08:00").await;

    let first = change_requests::create_request(&fx.db, &fx.student_user, session, "First")
        .await
        .unwrap();
    let second = change_requests::create_request(&fx.db, &fx.teacher_user, session, "Second")
        .await
        .unwrap();
    let third = change_requests::create_request(&fx.db, &fx.student_user, session, "Third")
        .await
        .unwrap();
    change_requests::decide_request(&fx.db, &fx.admin, first.id, RequestDecision::Reject)
        .await
        .unwrap();

    let own = change_requests::list_requests(&fx.db, &fx.student_user, false)
        .await
        .unwrap();
    let own_ids: Vec<i64> = own.iter().map(|r| r.id).collect();
    assert_eq!(own_ids, vec![third.id, first.id]);

    let open = change_requests::list_requests(&fx.db, &fx.admin, false)
        .await
        .unwrap();
    let open_ids: Vec<i64> = open.iter().map(|r| r.id).collect();
    assert_eq!(open_ids, vec![third.id, second.id]);

    let everything = change_requests::list_requests(&fx.db, &fx.admin, true)
        .await
        .unwrap();
    assert_eq!(everything.len(), 3);
}

#[tokio::test]
async fn test_requests_go_with_deleted_session() {
    let fx = Fixture::new().await;
    let session = book(&fx, "2025-09-01T08:00").await;

    change_requests::create_request(&fx.db, &fx.student_user, session, "Cancel please")
        .await
        .unwrap();
    fx.booking().delete(session).await.unwrap();

    let remaining = change_requests::list_requests(&fx.db, &fx.admin, true)
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_teacher_comments_on_finished_session() {
    let fx = Fixture::new().await;
    let session = book(&fx, "2025-09-01T08:00").await;
    let after = utc(2025, 9, 1, 10, 0);

    let comment = comments::add_comment(
        &fx.db,
        &fx.teacher_user,
        session,
        "Covered chapters 1-3",
        Some("uploads/notes.pdf"),
        after,
    )
    .await
    .unwrap();
    assert_eq!(comment.schedule_id, session);
    assert_eq!(comment.teacher_id, fx.t1);
    assert_eq!(comment.file_path.as_deref(), Some("uploads/notes.pdf"));

    comments::add_comment(&fx.db, &fx.teacher_user, session, "Homework set", None, after)
        .await
        .unwrap();

    let listed = comments::list_commented_sessions(&fx.db, &fx.student_user, after)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].session.id, session);
    let texts: Vec<&str> = listed[0]
        .comments
        .iter()
        .map(|c| c.comment_text.as_str())
        .collect();
    assert_eq!(texts, vec!["Covered chapters 1-3", "Homework set"]);

    // Kim's group does not attend this session
    let other = comments::list_commented_sessions(&fx.db, &fx.other_student_user, after)
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn test_comment_rules() {
    let fx = Fixture::new().await;
    let session = book(&fx, "2025-09-01T08:00").await;

    // Still running
    let during = utc(2025, 9, 1, 9, 0);
    let err = comments::add_comment(&fx.db, &fx.teacher_user, session, "Early", None, during)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Forbidden(_)));

    let after = utc(2025, 9, 2, 0, 0);
    let err =
        comments::add_comment(&fx.db, &fx.other_teacher_user, session, "Not mine", None, after)
            .await
            .unwrap_err();
    assert!(matches!(err, ScheduleError::Forbidden(_)));

    let err = comments::add_comment(&fx.db, &fx.student_user, session, "Hi", None, after)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Forbidden(_)));

    let err = comments::add_comment(&fx.db, &fx.teacher_user, session, "  ", None, after)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Validation(_)));

    let err = comments::add_comment(&fx.db, &fx.teacher_user, 999, "Lost", None, after)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::NotFound { .. }));
}

#[tokio::test]
async fn test_commented_sessions_include_uncommented_past_sessions() {
    let fx = Fixture::new().await;
    let earlier = book(&fx, "2025-09-01T08:00").await;
    let later = book(&fx, "2025-09-03T08:00").await;
    let _upcoming = book(&fx, "2025-09-10T08:00").await;
    let now = utc(2025, 9, 5, 0, 0);

    comments::add_comment(&fx.db, &fx.teacher_user, later, "Quiz graded", None, now)
        .await
        .unwrap();

    let listed = comments::list_commented_sessions(&fx.db, &fx.teacher_user, now)
        .await
        .unwrap();
    let ids: Vec<i64> = listed.iter().map(|s| s.session.id).collect();
    assert_eq!(ids, vec![earlier, later]);
    assert!(listed[0].comments.is_empty());
    assert_eq!(listed[1].comments.len(), 1);
}
