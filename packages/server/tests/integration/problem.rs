use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use server::entity::{problem_in_playlist, problem_solved, submission, test_case, test_case_result};

use crate::common::{TestApp, problem_body, routes};

mod problem_creation {
    use super::*;

    #[tokio::test]
    async fn admin_can_create_a_problem_whose_reference_solution_passes() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;

        let res = app
            .post_with_token(routes::PROBLEMS, &problem_body("Echo"), &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["title"], "Echo");
        assert_eq!(res.body["difficulty"], "EASY");
        assert_eq!(res.body["tags"], json!(["strings"]));
        assert_eq!(res.body["test_cases"].as_array().unwrap().len(), 2);
        assert_eq!(res.body["test_cases"][1]["input"], "hello");
        assert_eq!(res.body["reference_solutions"]["PYTHON"], "echo");
        // One reference check: one batch covering both cases.
        assert_eq!(app.judge.submit_calls(), 1);
    }

    #[tokio::test]
    async fn language_keys_are_stored_under_their_canonical_name() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        let mut body = problem_body("Echo");
        body["reference_solutions"] = json!({"python": "echo", "java": "echo"});

        let res = app.post_with_token(routes::PROBLEMS, &body, &token).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["reference_solutions"]["PYTHON"], "echo");
        assert_eq!(res.body["reference_solutions"]["JAVA"], "echo");
        assert_eq!(app.judge.submit_calls(), 2);
    }

    #[tokio::test]
    async fn failing_reference_solution_rejects_the_problem() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        let mut body = problem_body("Echo");
        body["reference_solutions"] = json!({"PYTHON": "print:abc"});

        let res = app.post_with_token(routes::PROBLEMS, &body, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "REFERENCE_SOLUTION_FAILED");

        let list = app.get_with_token(routes::PROBLEMS, &token).await;
        assert_eq!(list.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn unsupported_reference_language_is_rejected_before_judging() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        let mut body = problem_body("Echo");
        body["reference_solutions"] = json!({"RUBY": "puts gets"});

        let res = app.post_with_token(routes::PROBLEMS, &body, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "UNSUPPORTED_LANGUAGE");
        assert_eq!(app.judge.submit_calls(), 0);
    }

    #[tokio::test]
    async fn problem_without_test_cases_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        let mut body = problem_body("Echo");
        body["test_cases"] = json!([]);

        let res = app.post_with_token(routes::PROBLEMS, &body, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_difficulty_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        let mut body = problem_body("Echo");
        body["difficulty"] = json!("IMPOSSIBLE");

        let res = app.post_with_token(routes::PROBLEMS, &body, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn regular_user_cannot_create_a_problem() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;

        let res = app
            .post_with_token(routes::PROBLEMS, &problem_body("Echo"), &token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
        assert_eq!(app.judge.submit_calls(), 0);
    }

    #[tokio::test]
    async fn unreachable_judge_is_reported_as_bad_gateway() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        app.judge.take_down();

        let res = app
            .post_with_token(routes::PROBLEMS, &problem_body("Echo"), &token)
            .await;

        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"], "UPSTREAM_ERROR");
    }
}

mod problem_listing {
    use super::*;

    async fn seed(app: &TestApp, token: &str) {
        for (title, difficulty) in [
            ("Two Sum", "EASY"),
            ("Three Sum", "MEDIUM"),
            ("Median of Two Arrays", "HARD"),
        ] {
            let mut body = problem_body(title);
            body["difficulty"] = json!(difficulty);
            let res = app.post_with_token(routes::PROBLEMS, &body, token).await;
            assert_eq!(res.status, 201, "{}", res.text);
        }
    }

    #[tokio::test]
    async fn lists_every_problem_with_pagination() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        seed(&app, &token).await;

        let res = app
            .get_with_token(&format!("{}?per_page=2", routes::PROBLEMS), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 2);
        assert_eq!(res.body["data"][0]["title"], "Two Sum");
        assert_eq!(res.body["pagination"]["total"], 3);
        assert_eq!(res.body["pagination"]["total_pages"], 2);
    }

    #[tokio::test]
    async fn filters_by_difficulty() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        seed(&app, &token).await;

        let res = app
            .get_with_token(&format!("{}?difficulty=MEDIUM", routes::PROBLEMS), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["title"], "Three Sum");
    }

    #[tokio::test]
    async fn search_is_case_insensitive() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        seed(&app, &token).await;

        let res = app
            .get_with_token(&format!("{}?search=SUM", routes::PROBLEMS), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn listing_requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::PROBLEMS).await;

        assert_eq!(res.status, 401);
    }
}

mod problem_detail {
    use super::*;

    #[tokio::test]
    async fn get_returns_the_problem_with_its_test_cases() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let id = app.create_problem(&admin, "Echo").await;
        let user = app.create_user("alice").await;

        let res = app.get_with_token(&routes::problem(id), &user).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["id"], id);
        assert_eq!(res.body["test_cases"][0]["output"], "abc");
        assert_eq!(res.body["code_snippets"]["PYTHON"], "print(input())");
    }

    #[tokio::test]
    async fn missing_problem_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;

        let res = app.get_with_token(&routes::problem(9999), &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod problem_update {
    use super::*;

    #[tokio::test]
    async fn put_replaces_fields_and_test_cases() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        let id = app.create_problem(&token, "Echo").await;

        let mut body = problem_body("Echo Twice");
        body["difficulty"] = json!("MEDIUM");
        body["test_cases"] = json!([{"input": "x", "output": "x"}]);

        let res = app.put_with_token(&routes::problem(id), &body, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "Echo Twice");
        assert_eq!(res.body["difficulty"], "MEDIUM");
        assert_eq!(res.body["test_cases"], json!([{"input": "x", "output": "x"}]));

        let stored = test_case::Entity::find()
            .filter(test_case::Column::ProblemId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(stored, 1);
    }

    #[tokio::test]
    async fn failing_reference_solution_leaves_the_problem_untouched() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        let id = app.create_problem(&token, "Echo").await;

        let mut body = problem_body("Broken");
        body["reference_solutions"] = json!({"PYTHON": "print:nope"});
        let res = app.put_with_token(&routes::problem(id), &body, &token).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "REFERENCE_SOLUTION_FAILED");

        let current = app.get_with_token(&routes::problem(id), &token).await;
        assert_eq!(current.body["title"], "Echo");
    }

    #[tokio::test]
    async fn regular_user_cannot_update() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let id = app.create_problem(&admin, "Echo").await;
        let user = app.create_user("alice").await;

        let res = app
            .put_with_token(&routes::problem(id), &problem_body("Mine"), &user)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn updating_a_missing_problem_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;

        let res = app
            .put_with_token(&routes::problem(9999), &problem_body("Ghost"), &token)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(app.judge.submit_calls(), 0);
    }
}

mod problem_deletion {
    use super::*;

    #[tokio::test]
    async fn deleting_removes_submissions_markers_and_playlist_entries() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let id = app.create_problem(&admin, "Echo").await;

        let run = app
            .execute(id, &admin, "echo", &[("a", "a"), ("b", "b")])
            .await;
        assert_eq!(run.status, 200, "{}", run.text);
        let playlist = app
            .post_with_token(routes::PLAYLISTS, &json!({"name": "Mine"}), &admin)
            .await;
        let added = app
            .post_with_token(
                &routes::playlist_problems(playlist.id()),
                &json!({"problem_ids": [id]}),
                &admin,
            )
            .await;
        assert_eq!(added.status, 200, "{}", added.text);

        let res = app.delete_with_token(&routes::problem(id), &admin).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let gone = app.get_with_token(&routes::problem(id), &admin).await;
        assert_eq!(gone.status, 404);

        assert_eq!(
            submission::Entity::find()
                .filter(submission::Column::ProblemId.eq(id))
                .count(&app.db)
                .await
                .unwrap(),
            0
        );
        assert_eq!(test_case_result::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(problem_solved::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(
            problem_in_playlist::Entity::find().count(&app.db).await.unwrap(),
            0
        );

        let list = app
            .get_with_token(&routes::playlist(playlist.id()), &admin)
            .await;
        assert_eq!(list.body["problems"], json!([]));
    }

    #[tokio::test]
    async fn regular_user_cannot_delete() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let id = app.create_problem(&admin, "Echo").await;
        let user = app.create_user("alice").await;

        let res = app.delete_with_token(&routes::problem(id), &user).await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn deleting_a_missing_problem_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;

        let res = app.delete_with_token(&routes::problem(9999), &admin).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod solved_problems {
    use super::*;

    #[tokio::test]
    async fn accepted_submission_lists_the_problem_as_solved() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let solved = app.create_problem(&admin, "Echo").await;
        let _unsolved = app.create_problem(&admin, "Other").await;
        let user = app.create_user("alice").await;

        let run = app.execute(solved, &user, "echo", &[("a", "a")]).await;
        assert_eq!(run.status, 200, "{}", run.text);

        let res = app.get_with_token(routes::SOLVED, &user).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let items = res.body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], solved);
        assert_eq!(items[0]["title"], "Echo");
    }

    #[tokio::test]
    async fn solved_list_is_per_user() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let id = app.create_problem(&admin, "Echo").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;

        app.execute(id, &alice, "echo", &[("a", "a")]).await;

        let res = app.get_with_token(routes::SOLVED, &bob).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body, json!([]));
    }
}
