//! Service and router tests against a real Postgres. Run with
//! `cargo test -- --ignored` on a machine with docker.

mod common;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use coachdesk::auth::UserRole;
use coachdesk::models::*;
use coachdesk::services::*;
use coachdesk::AppError;
use common::{date, session_for, test_app, token_for, Fixtures, TestDatabase};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires docker"]
async fn test_trainer_cannot_see_unlinked_client() {
    let db = TestDatabase::new().await;
    let fx = Fixtures::new(&db.pool);

    let coach = fx.user("Coach", UserRole::Trainer).await;
    let other = fx.user("Other", UserRole::Trainer).await;
    let (_, client) = fx.client("Casey", Some(&other), SubscriptionStatus::Active).await;

    let session = session_for(&coach);
    let err = fx.clients.get_profile(&session, client.id).await.unwrap_err();
    assert_matches!(err, AppError::NotFound(_));

    let assignments = AssignmentService::new(db.pool.clone());
    let query = AssignmentQuery {
        client_id: Some(client.id),
        ..Default::default()
    };
    let err = assignments.list_workout_assignments(&session, &query).await.unwrap_err();
    assert_matches!(err, AppError::NotFound(_));

    // same answer as a client that does not exist at all
    let err = fx.clients.get_profile(&session, Uuid::new_v4()).await.unwrap_err();
    assert_matches!(err, AppError::NotFound(_));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_listings_follow_role_scope() {
    let db = TestDatabase::new().await;
    let fx = Fixtures::new(&db.pool);

    let admin = fx.user("Admin", UserRole::Admin).await;
    let coach = fx.user("Coach", UserRole::Trainer).await;
    let other = fx.user("Other", UserRole::Trainer).await;
    let (alex_user, alex) = fx.client("Alex", Some(&coach), SubscriptionStatus::Active).await;
    let (_, blair) = fx.client("Blair", Some(&other), SubscriptionStatus::Active).await;

    let squat = fx.exercise("Squat").await;
    let coach_workout = fx.workout(&coach, &squat).await;
    let other_workout = fx.workout(&other, &squat).await;

    let assignments = AssignmentService::new(db.pool.clone());
    for (trainer, client, workout) in [(&coach, &alex, &coach_workout), (&other, &blair, &other_workout)] {
        let response = assignments
            .assign_workout(
                &session_for(trainer),
                AssignWorkoutRequest {
                    client_id: client.id,
                    workout_id: workout.workout.id,
                    scheduled_date: None,
                    scheduled_dates: vec![date(2024, 6, 3).into(), date(2024, 6, 5).into()],
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(response.assigned, 2);
        assert_eq!(response.failed, 0);
    }

    let all = AssignmentQuery::default();

    let admin_view = assignments.list_workout_assignments(&session_for(&admin), &all).await.unwrap();
    let ids: HashSet<Uuid> = admin_view.iter().map(|view| view.assignment.id).collect();
    assert_eq!(admin_view.len(), 4);
    assert_eq!(ids.len(), 4);

    let coach_view = assignments.list_workout_assignments(&session_for(&coach), &all).await.unwrap();
    assert_eq!(coach_view.len(), 2);
    assert!(coach_view.iter().all(|view| view.assignment.client_id == alex.id));

    let client_view = assignments.list_workout_assignments(&session_for(&alex_user), &all).await.unwrap();
    assert_eq!(client_view.len(), 2);
    assert!(client_view.iter().all(|view| view.assignment.client_id == alex.id));

    let profiles = fx.clients.list_clients(&session_for(&coach), &ClientQuery::default()).await.unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].client.id, alex.id);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_inactive_subscription_blocks_program_assignment() {
    let db = TestDatabase::new().await;
    let fx = Fixtures::new(&db.pool);

    let coach = fx.user("Coach", UserRole::Trainer).await;
    let (_, client) = fx.client("Drew", Some(&coach), SubscriptionStatus::Inactive).await;
    let squat = fx.exercise("Squat").await;
    let program = fx.program(&coach, &squat, 28).await;

    let before = fx.count("client_workout_programs").await;
    let err = AssignmentService::new(db.pool.clone())
        .assign_program(
            &session_for(&coach),
            AssignProgramRequest {
                client_id: client.id,
                program_id: program.program.id,
                start_date: date(2024, 1, 30).into(),
                notes: None,
            },
        )
        .await
        .unwrap_err();

    assert_matches!(err, AppError::Validation(_));
    assert_eq!(fx.count("client_workout_programs").await, before);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_deleting_assignment_leaves_catalog_alone() {
    let db = TestDatabase::new().await;
    let fx = Fixtures::new(&db.pool);

    let coach = fx.user("Coach", UserRole::Trainer).await;
    let (_, client) = fx.client("Emery", Some(&coach), SubscriptionStatus::Active).await;
    let squat = fx.exercise("Squat").await;
    let workout = fx.workout(&coach, &squat).await;
    let program = fx.program(&coach, &squat, 7).await;
    let session = session_for(&coach);

    let assignments = AssignmentService::new(db.pool.clone());
    let bulk = assignments
        .assign_workout(
            &session,
            AssignWorkoutRequest {
                client_id: client.id,
                workout_id: workout.workout.id,
                scheduled_date: Some(date(2024, 2, 1).into()),
                scheduled_dates: vec![date(2024, 2, 8).into()],
                notes: None,
            },
        )
        .await
        .unwrap();
    let started = assignments
        .assign_program(
            &session,
            AssignProgramRequest {
                client_id: client.id,
                program_id: program.program.id,
                start_date: date(2024, 2, 1).into(),
                notes: None,
            },
        )
        .await
        .unwrap();

    let catalog = [
        "exercises",
        "workouts",
        "workout_exercises",
        "workout_programs",
        "workout_days",
        "workout_day_exercises",
    ];
    let mut before = Vec::new();
    for table in catalog {
        before.push(fx.count(table).await);
    }

    assignments
        .delete_workout_assignment(&session, bulk.assignments[0].id)
        .await
        .unwrap();
    assert_eq!(fx.count("client_workouts").await, 1);

    assignments.delete_program_assignment(&session, started.id).await.unwrap();
    assert_eq!(fx.count("client_workout_programs").await, 0);

    for (table, count) in catalog.iter().zip(before) {
        assert_eq!(fx.count(table).await, count, "{}", table);
    }
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_calendar_expands_program_days() {
    let db = TestDatabase::new().await;
    let fx = Fixtures::new(&db.pool);

    let coach = fx.user("Coach", UserRole::Trainer).await;
    let (client_user, client) = fx.client("Finley", Some(&coach), SubscriptionStatus::Active).await;
    let squat = fx.exercise("Squat").await;
    let program = fx.program(&coach, &squat, 4).await;

    let assignment = AssignmentService::new(db.pool.clone())
        .assign_program(
            &session_for(&coach),
            AssignProgramRequest {
                client_id: client.id,
                program_id: program.program.id,
                start_date: "2024-01-30T00:30:00-05:00".parse().unwrap(),
                notes: None,
            },
        )
        .await
        .unwrap();

    let calendar = CalendarService::new(db.pool.clone())
        .calendar(
            &session_for(&client_user),
            CalendarQuery {
                client_id: None,
                from: date(2024, 1, 1).into(),
                to: date(2024, 2, 29).into(),
            },
        )
        .await
        .unwrap();

    let dates: Vec<_> = calendar.days.iter().map(|cell| cell.date).collect();
    assert_eq!(
        dates,
        vec![date(2024, 1, 30), date(2024, 1, 31), date(2024, 2, 1), date(2024, 2, 2)]
    );
    assert_eq!(calendar.days[0].id, format!("{}-day-1", assignment.id));
    assert!(!calendar.days[0].is_rest_day);
    assert_eq!(calendar.days[0].exercises.len(), 1);
    // only day 1 was filled in
    assert!(calendar.days[1..].iter().all(|cell| cell.is_rest_day));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_referenced_exercise_cannot_be_deleted() {
    let db = TestDatabase::new().await;
    let fx = Fixtures::new(&db.pool);

    let admin = fx.user("Admin", UserRole::Admin).await;
    let squat = fx.exercise("Squat").await;
    let lunge = fx.exercise("Lunge").await;
    fx.workout(&admin, &squat).await;

    let exercises = ExerciseService::new(db.pool.clone());
    let err = exercises.delete_exercise(&session_for(&admin), squat.id).await.unwrap_err();
    assert_matches!(err, AppError::Conflict(_));

    exercises.delete_exercise(&session_for(&admin), lunge.id).await.unwrap();
    assert_eq!(fx.count("exercises").await, 1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_claiming_linked_client_conflicts() {
    let db = TestDatabase::new().await;
    let fx = Fixtures::new(&db.pool);

    let coach = fx.user("Coach", UserRole::Trainer).await;
    let other = fx.user("Other", UserRole::Trainer).await;
    let (_, client) = fx.client("Gray", None, SubscriptionStatus::Active).await;

    let profile = fx.clients.claim_client(&session_for(&coach), client.id).await.unwrap();
    assert_eq!(profile.client.trainer_id, Some(coach.id));

    // claiming again is a no-op for the same trainer
    fx.clients.claim_client(&session_for(&coach), client.id).await.unwrap();

    let err = fx.clients.claim_client(&session_for(&other), client.id).await.unwrap_err();
    assert_matches!(err, AppError::Conflict(_));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_client_token_cannot_reach_staff_routes() {
    let db = TestDatabase::new().await;
    let fx = Fixtures::new(&db.pool);
    let (client_user, _) = fx.client("Harper", None, SubscriptionStatus::Active).await;
    let token = token_for(client_user.id, UserRole::Client);

    for uri in ["/api/v1/workouts", "/api/v1/programs", "/api/v1/admin/users"] {
        let response = test_app(db.pool.clone())
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
    }

    let response = test_app(db.pool.clone())
        .oneshot(
            Request::builder()
                .uri("/api/v1/clients/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_login_budget_counts_failures_per_address() {
    use coachdesk::auth::{AuthError, AuthService, LoginRequest};
    use std::net::IpAddr;

    let db = TestDatabase::new().await;
    let fx = Fixtures::new(&db.pool);
    let user = fx.user("Jamie", UserRole::Trainer).await;
    let auth = AuthService::new(db.pool.clone(), common::TEST_JWT_SECRET, chrono::Duration::hours(1));

    let login = |password: &str| LoginRequest {
        email: user.email.clone(),
        password: password.to_string(),
    };
    let attacker: IpAddr = "203.0.113.9".parse().unwrap();
    let owner: IpAddr = "198.51.100.4".parse().unwrap();

    // successful logins never use up the budget
    for _ in 0..15 {
        auth.login(login(common::TEST_PASSWORD), Some(owner)).await.unwrap();
    }

    for _ in 0..10 {
        let err = auth.login(login("Wrong#Pass1"), Some(attacker)).await.unwrap_err();
        assert_matches!(err, AuthError::InvalidCredentials);
    }
    let err = auth.login(login(common::TEST_PASSWORD), Some(attacker)).await.unwrap_err();
    assert_matches!(err, AuthError::RateLimitExceeded);

    // the account owner elsewhere is not locked out
    auth.login(login(common::TEST_PASSWORD), Some(owner)).await.unwrap();
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_subscription_update_keeps_unsent_dates() {
    let db = TestDatabase::new().await;
    let fx = Fixtures::new(&db.pool);
    let (_, client) = fx.client("Kai", None, SubscriptionStatus::Active).await;

    let profile = fx
        .clients
        .update_subscription(
            client.id,
            UpdateSubscriptionRequest {
                status: SubscriptionStatus::Active,
                plan: Some("monthly".to_string()),
                start_date: Some(date(2024, 1, 1)),
                end_date: Some(date(2024, 12, 31)),
            },
        )
        .await
        .unwrap();
    assert_eq!(profile.client.subscription_end, Some(date(2024, 12, 31)));

    // status only
    let profile = fx
        .clients
        .update_subscription(
            client.id,
            UpdateSubscriptionRequest {
                status: SubscriptionStatus::Inactive,
                plan: None,
                start_date: None,
                end_date: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(profile.client.subscription_status, SubscriptionStatus::Inactive);
    assert_eq!(profile.client.subscription_plan.as_deref(), Some("monthly"));
    assert_eq!(profile.client.subscription_start, Some(date(2024, 1, 1)));
    assert_eq!(profile.client.subscription_end, Some(date(2024, 12, 31)));

    // end only, before the stored start
    let err = fx
        .clients
        .update_subscription(
            client.id,
            UpdateSubscriptionRequest {
                status: SubscriptionStatus::Active,
                plan: None,
                start_date: None,
                end_date: Some(date(2023, 6, 30)),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Validation(_));

    let stored = fx.clients.get_client(client.id).await.unwrap().unwrap();
    assert_eq!(stored.subscription_status, SubscriptionStatus::Inactive);
    assert_eq!(stored.subscription_end, Some(date(2024, 12, 31)));

    // end only, after the stored start
    let profile = fx
        .clients
        .update_subscription(
            client.id,
            UpdateSubscriptionRequest {
                status: SubscriptionStatus::Active,
                plan: None,
                start_date: None,
                end_date: Some(date(2025, 6, 30)),
            },
        )
        .await
        .unwrap();
    assert_eq!(profile.client.subscription_start, Some(date(2024, 1, 1)));
    assert_eq!(profile.client.subscription_end, Some(date(2025, 6, 30)));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_assign_trainer_requires_trainer_role() {
    let db = TestDatabase::new().await;
    let fx = Fixtures::new(&db.pool);
    let coach = fx.user("Coach", UserRole::Trainer).await;
    let admin = fx.user("Admin", UserRole::Admin).await;
    let (_, client) = fx.client("Lee", None, SubscriptionStatus::Active).await;

    let err = fx
        .clients
        .assign_trainer(client.id, AssignTrainerRequest { trainer_id: admin.id })
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Validation(_));

    let profile = fx
        .clients
        .assign_trainer(client.id, AssignTrainerRequest { trainer_id: coach.id })
        .await
        .unwrap();
    assert_eq!(profile.client.trainer_id, Some(coach.id));
    assert_eq!(profile.trainer_name.as_deref(), Some("Coach"));

    let err = fx
        .clients
        .assign_trainer(Uuid::new_v4(), AssignTrainerRequest { trainer_id: coach.id })
        .await
        .unwrap_err();
    assert_matches!(err, AppError::NotFound(_));
}
