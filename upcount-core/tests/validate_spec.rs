use serde_json::{json, Value};
use speculate2::speculate;
use upcount_core::validate::*;

fn user() -> Value {
    json!({
        "userId": "user-123",
        "email": "test@example.com",
        "displayName": "Test User",
        "createdAt": "2024-01-01T00:00:00.000Z",
        "updatedAt": "2024-01-02T00:00:00.000Z"
    })
}

fn goal() -> Value {
    json!({
        "goalId": "goal-456",
        "userId": "user-123",
        "title": "Read 10 books",
        "description": "Read 10 books this year",
        "targetValue": 10,
        "currentValue": 2,
        "unit": "books",
        "deadline": "2025-12-31",
        "category": "Personal Development",
        "createdAt": "2024-01-01T00:00:00.000Z",
        "updatedAt": "2024-01-01T00:00:00.000Z"
    })
}

fn log() -> Value {
    json!({
        "logId": "log-789",
        "goalId": "goal-456",
        "userId": "user-123",
        "value": 1,
        "notes": "Finished first book",
        "timestamp": "2024-01-03T18:30:00.000Z",
        "createdAt": "2024-01-03T18:31:00.000Z"
    })
}

fn with(mut value: Value, key: &str, field: Value) -> Value {
    value[key] = field;
    value
}

fn without(mut value: Value, key: &str) -> Value {
    value.as_object_mut().unwrap().remove(key);
    value
}

speculate! {
    describe "validate_user" {
        it "accepts a complete user" {
            assert!(validate_user(&user()));
        }

        it "accepts the minimal user from the reference scenario" {
            let value = json!({
                "userId": "u1",
                "email": "a@b.com",
                "createdAt": "2024-01-01T00:00:00Z"
            });
            let parsed = parse_user(&value).expect("valid user");
            assert_eq!(parsed.user_id, "u1");
            assert!(parsed.display_name.is_none());
            assert!(parsed.updated_at.is_none());
        }

        it "rejects a malformed email" {
            let value = json!({
                "userId": "u1",
                "email": "bad-email",
                "createdAt": "2024-01-01T00:00:00Z"
            });
            assert!(!validate_user(&value));
        }

        it "rejects an email without a dot after the at sign" {
            assert!(!validate_user(&with(user(), "email", json!("a@localhost"))));
        }

        it "rejects an email with whitespace or two at signs" {
            assert!(!validate_user(&with(user(), "email", json!("a b@c.com"))));
            assert!(!validate_user(&with(user(), "email", json!("a@b@c.com"))));
        }

        it "rejects each missing required field" {
            for field in ["userId", "email", "createdAt"] {
                let err = parse_user(&without(user(), field)).unwrap_err();
                assert_eq!(err, ShapeError::MissingField(field));
            }
        }

        it "does not require optional fields" {
            let value = without(without(user(), "displayName"), "updatedAt");
            assert!(validate_user(&value));
        }

        it "rejects a numeric user id" {
            let err = parse_user(&with(user(), "userId", json!(123))).unwrap_err();
            assert_eq!(err, ShapeError::NotAString("userId"));
        }

        it "treats falsy optional fields as absent" {
            for falsy in [json!(null), json!(false), json!(0), json!("")] {
                let parsed = parse_user(&with(user(), "displayName", falsy.clone()))
                    .expect("falsy optional field passes");
                assert!(parsed.display_name.is_none());
                assert!(validate_user(&with(user(), "updatedAt", falsy)));
            }
        }

        it "rejects a truthy wrong-typed optional field" {
            assert!(!validate_user(&with(user(), "displayName", json!(42))));
            assert!(!validate_user(&with(user(), "displayName", json!(true))));
        }

        it "rejects an unparseable createdAt" {
            let err = parse_user(&with(user(), "createdAt", json!("not-a-date"))).unwrap_err();
            assert_eq!(err.field(), Some("createdAt"));
        }

        it "rejects an unparseable updatedAt when present" {
            assert!(!validate_user(&with(user(), "updatedAt", json!("yesterday"))));
        }

        it "rejects values that are not objects" {
            for value in [json!(null), json!("user"), json!(1), json!([user()])] {
                assert_eq!(parse_user(&value).unwrap_err(), ShapeError::NotAnObject);
            }
        }
    }

    describe "validate_goal" {
        it "accepts a complete goal" {
            assert!(validate_goal(&goal()));
        }

        it "accepts the reference scenario and rejects its string target" {
            let value = json!({
                "goalId": "g1",
                "userId": "u1",
                "title": "x",
                "targetValue": 10,
                "currentValue": 0,
                "unit": "km",
                "createdAt": "2024-01-01",
                "updatedAt": "2024-01-01"
            });
            assert!(validate_goal(&value));
            assert!(!validate_goal(&with(value, "targetValue", json!("10"))));
        }

        it "rejects each missing required field" {
            for field in [
                "goalId", "userId", "title", "targetValue",
                "currentValue", "unit", "createdAt", "updatedAt",
            ] {
                assert!(!validate_goal(&without(goal(), field)), "{field} should be required");
            }
        }

        it "rejects numeric fields given as strings" {
            for field in ["targetValue", "currentValue"] {
                let err = parse_goal(&with(goal(), field, json!("10"))).unwrap_err();
                assert_eq!(err, ShapeError::NotANumber(field));
            }
        }

        it "requires numeric fields even when falsy" {
            assert!(!validate_goal(&with(goal(), "currentValue", json!(null))));
            assert!(!validate_goal(&with(goal(), "currentValue", json!(false))));
        }

        it "accepts zero as a number" {
            let parsed = parse_goal(&with(goal(), "currentValue", json!(0))).unwrap();
            assert_eq!(parsed.current_value, 0.0);
        }

        it "accepts a present but empty required string" {
            let parsed = parse_goal(&with(goal(), "title", json!(""))).unwrap();
            assert_eq!(parsed.title, "");
        }

        it "rejects an invalid deadline but ignores a falsy one" {
            assert!(!validate_goal(&with(goal(), "deadline", json!("someday"))));
            assert!(validate_goal(&with(goal(), "deadline", json!(""))));
            assert!(validate_goal(&with(goal(), "deadline", json!(null))));
            assert!(validate_goal(&with(goal(), "deadline", json!("2025-12"))));
        }

        it "rejects invalid required timestamps" {
            assert!(!validate_goal(&with(goal(), "createdAt", json!("not-a-date"))));
            assert!(!validate_goal(&with(goal(), "updatedAt", json!("2024-02-30"))));
            assert!(!validate_goal(&with(goal(), "updatedAt", json!(""))));
        }

        it "carries an optional status string" {
            assert_eq!(parse_goal(&goal()).unwrap().status, None);
            let active = parse_goal(&with(goal(), "status", json!("active"))).unwrap();
            assert_eq!(active.status.as_deref(), Some("active"));
            assert!(!validate_goal(&with(goal(), "status", json!(1))));
        }

        it "narrows to a typed goal" {
            let parsed = parse_goal(&goal()).unwrap();
            assert_eq!(parsed.goal_id, "goal-456");
            assert_eq!(parsed.target_value, 10.0);
            assert_eq!(parsed.deadline.as_deref(), Some("2025-12-31"));
            assert_eq!(parsed.category.as_deref(), Some("Personal Development"));
        }
    }

    describe "validate_log" {
        it "accepts a complete log" {
            assert!(validate_log(&log()));
        }

        it "rejects each missing required field" {
            for field in ["logId", "goalId", "userId", "value", "timestamp", "createdAt"] {
                assert_eq!(parse_log(&without(log(), field)).unwrap_err(), ShapeError::MissingField(field));
            }
        }

        it "rejects a string value" {
            assert!(!validate_log(&with(log(), "value", json!("1"))));
        }

        it "rejects an invalid timestamp" {
            assert!(!validate_log(&with(log(), "timestamp", json!("not-a-date"))));
            assert!(!validate_log(&with(log(), "timestamp", json!("2024-01-01T24:30Z"))));
        }

        it "accepts reduced-precision ISO-8601 timestamps" {
            for stamp in ["2024-01-01T10:30Z", "2024-01-01T10:30+02:00", "2024-01", "2024"] {
                assert!(validate_log(&with(log(), "timestamp", json!(stamp))), "{}", stamp);
            }
        }

        it "allows notes to be omitted" {
            let parsed = parse_log(&without(log(), "notes")).unwrap();
            assert!(parsed.notes.is_none());
        }
    }

    describe "purity" {
        it "returns the same answer twice and leaves the input untouched" {
            for value in [user(), with(user(), "email", json!("nope")), goal(), log()] {
                let before = value.clone();
                let first = (validate_user(&value), validate_goal(&value), validate_log(&value));
                let second = (validate_user(&value), validate_goal(&value), validate_log(&value));
                assert_eq!(first, second);
                assert_eq!(value, before);
            }
        }
    }

    describe "lists" {
        it "parses an array of goals in order" {
            let second = with(goal(), "goalId", json!("goal-2"));
            let goals = parse_goals(&json!([goal(), second])).unwrap();
            assert_eq!(goals.len(), 2);
            assert_eq!(goals[1].goal_id, "goal-2");
        }

        it "rejects a non-array" {
            assert_eq!(parse_goals(&goal()).unwrap_err(), ShapeError::NotAnArray);
        }

        it "reports the first failing element" {
            let err = parse_goals(&json!([goal(), with(goal(), "targetValue", json!("x"))])).unwrap_err();
            assert!(matches!(err, ShapeError::Element { index: 1, .. }));
        }
    }
}
