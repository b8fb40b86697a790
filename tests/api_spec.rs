use std::collections::HashMap;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use upcount::api::{create_router_with_config, SecurityConfig, StaticTokens};
use upcount::db::Database;
use upcount::models::*;

const ADA: &str = "token-ada";
const BOB: &str = "token-bob";

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let tokens = HashMap::from([
        (ADA.to_string(), "user-ada".to_string()),
        (BOB.to_string(), "user-bob".to_string()),
    ]);
    let config = SecurityConfig::with_verifier(StaticTokens::new(tokens));
    let app = create_router_with_config(db, config);
    TestServer::new(app).expect("Failed to create test server")
}

async fn create_test_goal(server: &TestServer, token: &str, category: Option<&str>) -> Goal {
    server
        .post("/api/v1/goals")
        .authorization_bearer(token)
        .json(&CreateGoalInput {
            title: "Run 100km".to_string(),
            description: None,
            target_value: 100.0,
            unit: "km".to_string(),
            deadline: None,
            category: category.map(str::to_string),
        })
        .await
        .json::<Goal>()
}

fn message(response: &axum_test::TestResponse) -> String {
    response.json::<Value>()["message"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

mod auth {
    use super::*;

    #[tokio::test]
    async fn health_is_public() {
        let server = setup();
        let response = server.get("/api/v1/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "ok");
    }

    #[tokio::test]
    async fn rejects_missing_and_unknown_tokens() {
        let server = setup();

        server
            .get("/api/v1/goals")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/api/v1/goals")
            .authorization_bearer("forged")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

mod users {
    use super::*;

    #[tokio::test]
    async fn current_user_is_not_found_until_created() {
        let server = setup();

        let response = server.get("/api/v1/user").authorization_bearer(ADA).await;
        response.assert_status_not_found();
        assert_eq!(message(&response), "User not found");

        let created = server
            .put("/api/v1/user")
            .authorization_bearer(ADA)
            .json(&json!({ "email": "ada@example.com" }))
            .await
            .json::<User>();
        assert_eq!(created.user_id, "user-ada");
        assert_eq!(created.email, "ada@example.com");

        let fetched = server
            .get("/api/v1/user")
            .authorization_bearer(ADA)
            .await
            .json::<User>();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn updating_a_missing_profile_without_email_is_not_found() {
        let server = setup();

        server
            .put("/api/v1/user")
            .authorization_bearer(ADA)
            .json(&json!({ "displayName": "Ada" }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn rejects_an_invalid_email() {
        let server = setup();

        let response = server
            .put("/api/v1/user")
            .authorization_bearer(ADA)
            .json(&json!({ "email": "ada at example" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(message(&response).starts_with("Invalid user"));
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let server = setup();
        server
            .put("/api/v1/user")
            .authorization_bearer(ADA)
            .json(&json!({ "email": "ada@example.com" }))
            .await;

        let updated = server
            .put("/api/v1/user")
            .authorization_bearer(ADA)
            .json(&json!({ "displayName": "Ada" }))
            .await
            .json::<User>();
        assert_eq!(updated.email, "ada@example.com");
        assert_eq!(updated.display_name.as_deref(), Some("Ada"));
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn looks_up_a_user_by_id() {
        let server = setup();
        server
            .put("/api/v1/user")
            .authorization_bearer(ADA)
            .json(&json!({ "email": "ada@example.com" }))
            .await;

        let user = server
            .get("/api/v1/users/user-ada")
            .authorization_bearer(BOB)
            .await
            .json::<User>();
        assert_eq!(user.email, "ada@example.com");

        server
            .get("/api/v1/users/nobody")
            .authorization_bearer(BOB)
            .await
            .assert_status_not_found();
    }
}

mod goals {
    use super::*;

    #[tokio::test]
    async fn creates_a_goal_with_server_assigned_fields() {
        let server = setup();

        let response = server
            .post("/api/v1/goals")
            .authorization_bearer(ADA)
            .json(&json!({
                "title": "Read 12 books",
                "targetValue": 12,
                "unit": "books",
                "category": "reading",
                "deadline": "2024-12-31"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let goal = response.json::<Goal>();
        assert!(uuid::Uuid::parse_str(&goal.goal_id).is_ok());
        assert_eq!(goal.user_id, "user-ada");
        assert_eq!(goal.current_value, 0.0);
        assert_eq!(goal.target_value, 12.0);
        assert_eq!(goal.category.as_deref(), Some("reading"));
        assert_eq!(goal.status.as_deref(), Some("active"));
        assert_eq!(goal.created_at, goal.updated_at);
    }

    #[tokio::test]
    async fn missing_or_falsy_required_fields_are_rejected() {
        let server = setup();

        for body in [
            json!({ "targetValue": 10, "unit": "km" }),
            json!({ "title": "", "targetValue": 10, "unit": "km" }),
            json!({ "title": "Run", "targetValue": 0, "unit": "km" }),
            json!({ "title": "Run", "targetValue": 10 }),
        ] {
            let response = server
                .post("/api/v1/goals")
                .authorization_bearer(ADA)
                .json(&body)
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(message(&response), "Missing required fields");
        }
    }

    #[tokio::test]
    async fn unparseable_body_is_rejected() {
        let server = setup();

        let response = server
            .post("/api/v1/goals")
            .authorization_bearer(ADA)
            .text("{ not json")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(message(&response), "Invalid request body");
    }

    #[tokio::test]
    async fn numeric_string_target_is_converted() {
        let server = setup();

        let goal = server
            .post("/api/v1/goals")
            .authorization_bearer(ADA)
            .json(&json!({ "title": "Run", "targetValue": "42.5", "unit": "km" }))
            .await
            .json::<Goal>();
        assert_eq!(goal.target_value, 42.5);
    }

    #[tokio::test]
    async fn invalid_deadline_is_rejected() {
        let server = setup();

        server
            .post("/api/v1/goals")
            .authorization_bearer(ADA)
            .json(&json!({ "title": "Run", "targetValue": 5, "unit": "km", "deadline": "someday" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn lists_only_the_callers_goals() {
        let server = setup();
        let mine = create_test_goal(&server, ADA, Some("fitness")).await;
        create_test_goal(&server, ADA, Some("reading")).await;
        create_test_goal(&server, BOB, Some("fitness")).await;

        let all = server
            .get("/api/v1/goals")
            .authorization_bearer(ADA)
            .await
            .json::<Vec<Goal>>();
        assert_eq!(all.len(), 2);

        let fitness = server
            .get("/api/v1/goals")
            .add_query_param("category", "fitness")
            .authorization_bearer(ADA)
            .await
            .json::<Vec<Goal>>();
        assert_eq!(fitness, vec![mine]);
    }

    #[tokio::test]
    async fn other_users_goals_are_not_found() {
        let server = setup();
        let goal = create_test_goal(&server, ADA, None).await;

        server
            .get(&format!("/api/v1/goals/{}", goal.goal_id))
            .authorization_bearer(BOB)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn update_applies_a_partial_change() {
        let server = setup();
        let goal = create_test_goal(&server, ADA, None).await;

        let updated = server
            .put(&format!("/api/v1/goals/{}", goal.goal_id))
            .authorization_bearer(ADA)
            .json(&UpdateGoalInput {
                current_value: Some(30.0),
                ..Default::default()
            })
            .await
            .json::<Goal>();

        assert_eq!(updated.current_value, 30.0);
        assert_eq!(updated.title, goal.title);
        assert_eq!(updated.created_at, goal.created_at);
        assert!(updated.updated_at >= goal.updated_at);
    }

    #[tokio::test]
    async fn update_of_unknown_goal_is_not_found() {
        let server = setup();

        let response = server
            .put("/api/v1/goals/missing")
            .authorization_bearer(ADA)
            .json(&UpdateGoalInput::default())
            .await;
        response.assert_status_not_found();
        assert_eq!(message(&response), "Goal not found");
    }

    #[tokio::test]
    async fn delete_removes_the_goal() {
        let server = setup();
        let goal = create_test_goal(&server, ADA, None).await;
        let path = format!("/api/v1/goals/{}", goal.goal_id);

        server
            .delete(&path)
            .authorization_bearer(ADA)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .delete(&path)
            .authorization_bearer(ADA)
            .await
            .assert_status_not_found();
    }
}

mod logs {
    use super::*;

    #[tokio::test]
    async fn creating_a_log_for_a_missing_goal_is_not_found() {
        let server = setup();

        server
            .post("/api/v1/goals/missing/logs")
            .authorization_bearer(ADA)
            .json(&json!({ "value": 3 }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn timestamp_defaults_to_creation_time() {
        let server = setup();
        let goal = create_test_goal(&server, ADA, None).await;

        let response = server
            .post(&format!("/api/v1/goals/{}/logs", goal.goal_id))
            .authorization_bearer(ADA)
            .json(&CreateLogInput {
                value: 5.0,
                notes: Some("morning run".to_string()),
                timestamp: None,
            })
            .await;

        response.assert_status(StatusCode::CREATED);
        let log = response.json::<Log>();
        assert_eq!(log.goal_id, goal.goal_id);
        assert_eq!(log.user_id, "user-ada");
        assert_eq!(log.timestamp, log.created_at);
    }

    #[tokio::test]
    async fn rejects_an_invalid_timestamp() {
        let server = setup();
        let goal = create_test_goal(&server, ADA, None).await;

        server
            .post(&format!("/api/v1/goals/{}/logs", goal.goal_id))
            .authorization_bearer(ADA)
            .json(&json!({ "value": 1, "timestamp": "not a date" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn lists_updates_and_deletes_logs() {
        let server = setup();
        let goal = create_test_goal(&server, ADA, None).await;
        let base = format!("/api/v1/goals/{}/logs", goal.goal_id);

        for (value, timestamp) in [(2.0, "2024-01-02T08:00:00Z"), (1.0, "2024-01-01T08:00:00Z")] {
            server
                .post(&base)
                .authorization_bearer(ADA)
                .json(&CreateLogInput {
                    value,
                    notes: None,
                    timestamp: Some(timestamp.to_string()),
                })
                .await
                .assert_status(StatusCode::CREATED);
        }

        let logs = server
            .get(&base)
            .authorization_bearer(ADA)
            .await
            .json::<Vec<Log>>();
        let values: Vec<f64> = logs.iter().map(|l| l.value).collect();
        assert_eq!(values, vec![1.0, 2.0]);

        let first = &logs[0];
        let updated = server
            .put(&format!("{}/{}", base, first.log_id))
            .authorization_bearer(ADA)
            .json(&UpdateLogInput {
                value: Some(1.5),
                ..Default::default()
            })
            .await
            .json::<Log>();
        assert_eq!(updated.value, 1.5);
        assert_eq!(updated.timestamp, first.timestamp);

        server
            .delete(&format!("{}/{}", base, first.log_id))
            .authorization_bearer(ADA)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .put(&format!("{}/{}", base, first.log_id))
            .authorization_bearer(ADA)
            .json(&UpdateLogInput::default())
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn other_users_cannot_read_logs() {
        let server = setup();
        let goal = create_test_goal(&server, ADA, None).await;

        server
            .get(&format!("/api/v1/goals/{}/logs", goal.goal_id))
            .authorization_bearer(BOB)
            .await
            .assert_status_not_found();
    }
}
