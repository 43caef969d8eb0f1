use std::time::Duration;

use ::common::{QueryStatus, Role};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use server::entity::query;

use crate::common::{FAILING_MODEL, SLOW_MODEL, SLOW_MODEL_DELAY, TestApp, response_ids, routes};

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn new_conversation_gets_default_title() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.edu", "securepass").await;

        let res = app
            .post_with_token(routes::CONVERSATIONS, &json!({}), &token)
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["title"], "New Conversation");
    }

    #[tokio::test]
    async fn first_question_becomes_the_title() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.edu", "securepass").await;
        let id = app.create_conversation(&token).await;
        let question = "Why does the borrow checker reject two mutable references to one value?";

        app.submit_query(id, question, &token).await;
        let res = app.get_with_token(&routes::conversation(id), &token).await;

        assert_eq!(res.status, 200);
        let expected: String = question.chars().take(50).collect();
        assert_eq!(res.body["title"], expected);

        app.submit_query(id, "And with shared references?", &token).await;
        let res = app.get_with_token(&routes::conversation(id), &token).await;
        assert_eq!(res.body["title"], expected);
    }

    #[tokio::test]
    async fn explicit_title_is_kept_after_first_question() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.edu", "securepass").await;
        let res = app
            .post_with_token(routes::CONVERSATIONS, &json!({"title": "Lifetimes"}), &token)
            .await;
        let id = res.id();

        app.submit_query(id, "What is 'static?", &token).await;
        let res = app.get_with_token(&routes::conversation(id), &token).await;

        assert_eq!(res.body["title"], "Lifetimes");
    }

    #[tokio::test]
    async fn owner_can_rename_and_delete() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.edu", "securepass").await;
        let id = app.create_conversation(&token).await;
        let view = app.submit_query(id, "Hello?", &token).await;
        app.rank_all(&view, &token).await;

        let res = app
            .patch_with_token(&routes::conversation(id), &json!({"title": "Greetings"}), &token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "Greetings");

        let res = app.delete_with_token(&routes::conversation(id), &token).await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::conversation(id), &token).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.edu", "securepass").await;
        let id = app.create_conversation(&token).await;

        let res = app
            .patch_with_token(&routes::conversation(id), &json!({"title": "   "}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn other_students_cannot_see_or_touch_a_conversation() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("ada@example.edu", "securepass").await;
        let other = app.create_authenticated_user("bob@example.edu", "securepass").await;
        let id = app.create_conversation(&owner).await;

        let res = app.get_with_token(&routes::conversation(id), &other).await;
        assert_eq!(res.status, 404);

        let res = app.delete_with_token(&routes::conversation(id), &other).await;
        assert_eq!(res.status, 404);

        let res = app
            .post_with_token(
                &routes::conversation_queries(id),
                &json!({"content": "hijack"}),
                &other,
            )
            .await;
        assert_eq!(res.status, 404);
    }
}

mod anonymization {
    use super::*;

    #[tokio::test]
    async fn students_see_labels_but_not_model_names() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.edu", "securepass").await;
        let id = app.create_conversation(&token).await;

        let view = app.submit_query(id, "What is ownership?", &token).await;

        assert_eq!(view["status"], "completed");
        let responses = view["responses"].as_array().unwrap();
        assert_eq!(responses.len(), 3);
        let labels: Vec<&str> = responses.iter().map(|r| r["label"].as_str().unwrap()).collect();
        assert_eq!(labels, ["Model A", "Model B", "Model C"]);
        assert!(responses.iter().all(|r| r.get("model_name").is_none()));
        assert!(responses.iter().all(|r| r["my_rank"].is_null()));
        assert_eq!(view["fully_ranked"], false);
    }

    #[tokio::test]
    async fn instructors_see_true_model_names() {
        let app = TestApp::spawn().await;
        let student = app.create_authenticated_user("ada@example.edu", "securepass").await;
        let instructor = app
            .create_user_with_role("prof@example.edu", "securepass", Role::Instructor)
            .await;
        let id = app.create_conversation(&student).await;
        let view = app.submit_query(id, "What is ownership?", &student).await;
        let query_id = view["id"].as_i64().unwrap() as i32;

        let res = app
            .get_with_token(&routes::query_responses(query_id), &instructor)
            .await;

        assert_eq!(res.status, 200);
        let mut names: Vec<String> = res.body["responses"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["model_name"].as_str().unwrap().to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            [
                "anthropic/claude-3.5-haiku",
                "google/gemini-flash-1.5",
                "openai/gpt-4o-mini"
            ]
        );
    }

    #[tokio::test]
    async fn instructor_owner_sees_labels_only() {
        let app = TestApp::spawn().await;
        let instructor = app
            .create_user_with_role("prof@example.edu", "securepass", Role::Instructor)
            .await;
        let id = app.create_conversation(&instructor).await;
        let view = app.submit_query(id, "What is borrowing?", &instructor).await;
        let query_id = view["id"].as_i64().unwrap() as i32;

        let res = app.get_with_token(&routes::conversation(id), &instructor).await;
        assert_eq!(res.status, 200);
        let responses = res.body["queries"][0]["responses"].as_array().unwrap();
        assert_eq!(responses.len(), 3);
        assert!(responses.iter().all(|r| r.get("model_name").is_none()));

        let res = app
            .get_with_token(&routes::query_responses(query_id), &instructor)
            .await;
        assert_eq!(res.status, 200);
        let responses = res.body["responses"].as_array().unwrap();
        assert!(responses.iter().all(|r| r.get("model_name").is_none()));
    }

    #[tokio::test]
    async fn response_content_does_not_depend_on_display_position() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.edu", "securepass").await;
        let id = app.create_conversation(&token).await;
        let view = app.submit_query(id, "Shuffle me", &token).await;
        let query_id = view["id"].as_i64().unwrap() as i32;

        let mut first = response_ids(&view);
        let res = app
            .get_with_token(&routes::query_responses(query_id), &token)
            .await;
        let mut second = response_ids(&res.body);

        first.sort();
        second.sort();
        assert_eq!(first, second);
    }
}

mod generation {
    use super::*;

    #[tokio::test]
    async fn failed_model_is_skipped() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_user_with_role("admin@example.edu", "securepass", Role::Admin)
            .await;
        let res = app
            .post_with_token(
                routes::TOGGLE_MODEL,
                &json!({"model_name": FAILING_MODEL, "enabled": true}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let id = app.create_conversation(&admin).await;
        let view = app.submit_query(id, "Who answers?", &admin).await;

        assert_eq!(view["status"], "completed");
        let responses = view["responses"].as_array().unwrap();
        assert_eq!(responses.len(), 3);
    }

    #[tokio::test]
    async fn query_fails_when_every_model_fails() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_user_with_role("admin@example.edu", "securepass", Role::Admin)
            .await;
        for model in [
            "openai/gpt-4o-mini",
            "anthropic/claude-3.5-haiku",
            "google/gemini-flash-1.5",
        ] {
            app.post_with_token(
                routes::TOGGLE_MODEL,
                &json!({"model_name": model, "enabled": false}),
                &admin,
            )
            .await;
        }
        app.post_with_token(
            routes::TOGGLE_MODEL,
            &json!({"model_name": FAILING_MODEL, "enabled": true}),
            &admin,
        )
        .await;

        let id = app.create_conversation(&admin).await;
        let view = app.submit_query(id, "Anyone?", &admin).await;

        assert_eq!(view["status"], "failed");
        assert!(view["responses"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn abandoned_question_leaves_no_pending_query() {
        let app = TestApp::spawn().await;
        let admin = app
            .create_user_with_role("admin@example.edu", "securepass", Role::Admin)
            .await;
        let res = app
            .post_with_token(
                routes::TOGGLE_MODEL,
                &json!({"model_name": SLOW_MODEL, "enabled": true}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let id = app.create_conversation(&admin).await;
        app.post_abandoned(
            &routes::conversation_queries(id),
            &json!({"content": "Still there?"}),
            &admin,
            Duration::from_millis(200),
        )
        .await;
        tokio::time::sleep(SLOW_MODEL_DELAY + Duration::from_millis(500)).await;

        let stored = query::Entity::find()
            .filter(query::Column::ConversationId.eq(id))
            .all(&app.db)
            .await
            .unwrap();
        assert!(
            stored.iter().all(|q| q.status != QueryStatus::Pending),
            "no query may stay pending"
        );
    }

    #[tokio::test]
    async fn follow_up_carries_each_models_own_history() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.edu", "securepass").await;
        let id = app.create_conversation(&token).await;

        app.submit_query(id, "First", &token).await;
        let view = app.submit_query(id, "Second", &token).await;

        for response in view["responses"].as_array().unwrap() {
            assert!(
                response["content"].as_str().unwrap().ends_with("Second (turn 2)"),
                "unexpected content: {}",
                response["content"]
            );
        }
    }

    #[tokio::test]
    async fn empty_question_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.edu", "securepass").await;
        let id = app.create_conversation(&token).await;

        let res = app
            .post_with_token(&routes::conversation_queries(id), &json!({"content": "  "}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod search {
    use super::*;

    #[tokio::test]
    async fn search_matches_titles_and_questions_case_insensitively() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.edu", "securepass").await;

        let titled = app
            .post_with_token(routes::CONVERSATIONS, &json!({"title": "Rust Traits"}), &token)
            .await
            .id();
        let asked = app.create_conversation(&token).await;
        app.submit_query(asked, "How do I implement a TRAIT object?", &token).await;
        let unrelated = app.create_conversation(&token).await;
        app.submit_query(unrelated, "What is a monad?", &token).await;

        let res = app
            .get_with_token(&format!("{}?search=trait", routes::CONVERSATIONS), &token)
            .await;
        assert_eq!(res.status, 200);
        let mut ids: Vec<i64> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_i64().unwrap())
            .collect();
        ids.sort();
        let mut expected = vec![titled as i64, asked as i64];
        expected.sort();
        assert_eq!(ids, expected);

        let res = app.get_with_token(routes::CONVERSATIONS, &token).await;
        assert_eq!(res.body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn list_only_contains_own_conversations() {
        let app = TestApp::spawn().await;
        let ada = app.create_authenticated_user("ada@example.edu", "securepass").await;
        let bob = app.create_authenticated_user("bob@example.edu", "securepass").await;
        app.create_conversation(&ada).await;

        let res = app.get_with_token(routes::CONVERSATIONS, &bob).await;

        assert_eq!(res.status, 200);
        assert!(res.body.as_array().unwrap().is_empty());
    }
}
