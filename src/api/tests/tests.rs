use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::QuestionType;
use crate::test_support;

struct QuizFixture {
    course_id: String,
    module_id: String,
    test_id: String,
    mc_question: String,
    mc_correct: Vec<String>,
    tf_question: String,
    tf_true: String,
    essay_question: String,
}

/// Quiz worth 4 points: 2-point multiple choice, 1-point true/false,
/// 1-point essay, passing score 70.
async fn build_quiz(pool: &sqlx::PgPool, teacher_id: &str) -> QuizFixture {
    let course = test_support::insert_course(pool, "Rust 101", teacher_id).await;
    let module = test_support::insert_module(pool, &course.id, "Basics").await;
    let test = test_support::insert_test(pool, &module.id, "Quiz 1", 70.0).await;

    let mc = test_support::insert_question(pool, &test.id, QuestionType::MultipleChoice, 2.0, 0)
        .await;
    let a = test_support::insert_option(pool, &mc.id, "ownership", true).await;
    let b = test_support::insert_option(pool, &mc.id, "borrowing", true).await;
    test_support::insert_option(pool, &mc.id, "garbage collection", false).await;

    let tf = test_support::insert_question(pool, &test.id, QuestionType::TrueFalse, 1.0, 1).await;
    let tf_true = test_support::insert_option(pool, &tf.id, "True", true).await;
    test_support::insert_option(pool, &tf.id, "False", false).await;

    let essay = test_support::insert_question(pool, &test.id, QuestionType::Essay, 1.0, 2).await;

    QuizFixture {
        course_id: course.id,
        module_id: module.id,
        test_id: test.id,
        mc_question: mc.id,
        mc_correct: vec![a.id, b.id],
        tf_question: tf.id,
        tf_true: tf_true.id,
        essay_question: essay.id,
    }
}

#[tokio::test]
async fn student_starts_submits_and_cannot_resubmit() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_teacher(ctx.state.db(), "teacher001").await;
    let student = test_support::insert_student(ctx.state.db(), "student001").await;
    let quiz = build_quiz(ctx.state.db(), &teacher.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &quiz.course_id).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/tests/{}/attempts", quiz.test_id),
            Some(&token),
            None,
        ))
        .await
        .expect("start attempt");
    let status = response.status();
    let started = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {started}");
    let attempt_id = started["id"].as_str().expect("attempt id").to_string();

    // Starting again returns the same open attempt instead of a new one.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/tests/{}/attempts", quiz.test_id),
            Some(&token),
            None,
        ))
        .await
        .expect("restart attempt");
    let status = response.status();
    let restarted = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {restarted}");
    assert_eq!(restarted["id"], attempt_id.as_str());

    let answers = json!({
        "answers": {
            (quiz.mc_question.clone()): {"type": "multiple_choice", "selected": quiz.mc_correct.clone()},
            (quiz.tf_question.clone()): {"type": "true_false", "selected": quiz.tf_true.clone()},
            (quiz.essay_question.clone()): {"type": "essay", "text": "memory safety without gc"},
        }
    });

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/attempts/{attempt_id}/submit"),
            Some(&token),
            Some(answers.clone()),
        ))
        .await
        .expect("submit attempt");
    let status = response.status();
    let submitted = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {submitted}");
    assert_eq!(submitted["score"], 75.0);
    assert_eq!(submitted["passed"], true);
    assert_eq!(submitted["module_complete"], true);
    assert_eq!(submitted["overall_grade"], 75.0);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/attempts/{attempt_id}/submit"),
            Some(&token),
            Some(answers),
        ))
        .await
        .expect("resubmit attempt");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/attempts/{attempt_id}"),
            Some(&token),
            None,
        ))
        .await
        .expect("attempt detail");
    let status = response.status();
    let detail = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {detail}");
    assert_eq!(detail["answers"].as_array().expect("answers").len(), 3);
}

#[tokio::test]
async fn foreign_question_id_is_rejected_with_422() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_teacher(ctx.state.db(), "teacher002").await;
    let student = test_support::insert_student(ctx.state.db(), "student002").await;
    let quiz = build_quiz(ctx.state.db(), &teacher.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &quiz.course_id).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/tests/{}/attempts", quiz.test_id),
            Some(&token),
            None,
        ))
        .await
        .expect("start attempt");
    let started = test_support::read_json(response).await;
    let attempt_id = started["id"].as_str().expect("attempt id").to_string();

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/attempts/{attempt_id}/submit"),
            Some(&token),
            Some(json!({
                "answers": {
                    "not-a-question": {"type": "essay", "text": "hello"},
                }
            })),
        ))
        .await
        .expect("submit attempt");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn module_completion_requires_passed_tests() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_teacher(ctx.state.db(), "teacher003").await;
    let student = test_support::insert_student(ctx.state.db(), "student003").await;
    let quiz = build_quiz(ctx.state.db(), &teacher.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &quiz.course_id).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/modules/{}/complete", quiz.module_id),
            Some(&token),
            None,
        ))
        .await
        .expect("premature complete");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/tests/{}/attempts", quiz.test_id),
            Some(&token),
            None,
        ))
        .await
        .expect("start attempt");
    let started = test_support::read_json(response).await;
    let attempt_id = started["id"].as_str().expect("attempt id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/attempts/{attempt_id}/submit"),
            Some(&token),
            Some(json!({
                "answers": {
                    (quiz.mc_question.clone()): {"type": "multiple_choice", "selected": quiz.mc_correct.clone()},
                    (quiz.tf_question.clone()): {"type": "true_false", "selected": quiz.tf_true.clone()},
                }
            })),
        ))
        .await
        .expect("submit attempt");
    let submitted = test_support::read_json(response).await;
    assert_eq!(submitted["passed"], true, "response: {submitted}");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/modules/{}/complete", quiz.module_id),
            Some(&token),
            None,
        ))
        .await
        .expect("complete module");
    let status = response.status();
    let completed = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {completed}");
    assert_eq!(completed["completed"], true);
    let first_completed_at = completed["completed_at"].clone();

    // Confirming twice keeps the original timestamp.
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/modules/{}/complete", quiz.module_id),
            Some(&token),
            None,
        ))
        .await
        .expect("repeat complete");
    let repeated = test_support::read_json(response).await;
    assert_eq!(repeated["completed"], true);
    assert_eq!(repeated["completed_at"], first_completed_at);
}

#[tokio::test]
async fn empty_module_is_trivially_completable() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_teacher(ctx.state.db(), "teacher004").await;
    let student = test_support::insert_student(ctx.state.db(), "student004").await;
    let course = test_support::insert_course(ctx.state.db(), "Empty course", &teacher.id).await;
    let module = test_support::insert_module(ctx.state.db(), &course.id, "No tests").await;
    test_support::enroll_student(ctx.state.db(), &student.id, &course.id).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/modules/{}/complete", module.id),
            Some(&token),
            None,
        ))
        .await
        .expect("complete module");
    let status = response.status();
    let completed = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {completed}");
    assert_eq!(completed["completed"], true);
}

#[tokio::test]
async fn score_equal_to_passing_score_passes() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_teacher(ctx.state.db(), "teacher008").await;
    let student = test_support::insert_student(ctx.state.db(), "student008").await;
    let course = test_support::insert_course(ctx.state.db(), "Boundary", &teacher.id).await;
    let module = test_support::insert_module(ctx.state.db(), &course.id, "M1").await;
    let test = test_support::insert_test(ctx.state.db(), &module.id, "T1", 75.0).await;

    let mc = test_support::insert_question(ctx.state.db(), &test.id, QuestionType::MultipleChoice, 3.0, 0)
        .await;
    let right = test_support::insert_option(ctx.state.db(), &mc.id, "right", true).await;
    test_support::insert_option(ctx.state.db(), &mc.id, "wrong", false).await;
    test_support::insert_question(ctx.state.db(), &test.id, QuestionType::Essay, 1.0, 1).await;

    test_support::enroll_student(ctx.state.db(), &student.id, &course.id).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/tests/{}/attempts", test.id),
            Some(&token),
            None,
        ))
        .await
        .expect("start attempt");
    let started = test_support::read_json(response).await;
    let attempt_id = started["id"].as_str().expect("attempt id").to_string();

    // 3 of 4 points is exactly the 75.0 passing score.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/attempts/{attempt_id}/submit"),
            Some(&token),
            Some(json!({
                "answers": {
                    (mc.id.clone()): {"type": "multiple_choice", "selected": [right.id.clone()]},
                }
            })),
        ))
        .await
        .expect("submit attempt");
    let submitted = test_support::read_json(response).await;
    assert_eq!(submitted["score"], 75.0, "response: {submitted}");
    assert_eq!(submitted["passed"], true);

    // The unanswered essay still gets a recorded answer.
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/attempts/{attempt_id}"),
            Some(&token),
            None,
        ))
        .await
        .expect("attempt detail");
    let detail = test_support::read_json(response).await;
    assert_eq!(detail["answers"].as_array().expect("answers").len(), 2, "response: {detail}");
}

#[tokio::test]
async fn submit_racing_an_earlier_writer_returns_conflict() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_teacher(ctx.state.db(), "teacher009").await;
    let student = test_support::insert_student(ctx.state.db(), "student009").await;
    let quiz = build_quiz(ctx.state.db(), &teacher.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &quiz.course_id).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/tests/{}/attempts", quiz.test_id),
            Some(&token),
            None,
        ))
        .await
        .expect("start attempt");
    let started = test_support::read_json(response).await;
    let attempt_id = started["id"].as_str().expect("attempt id").to_string();

    // Simulate a concurrent submit that already wrote its answer rows but
    // has not stamped completed_at yet.
    sqlx::query(
        "INSERT INTO test_answers (id, attempt_id, question_id, points_earned)
         VALUES ($1, $2, $3, 0)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&attempt_id)
    .bind(&quiz.mc_question)
    .execute(ctx.state.db())
    .await
    .expect("insert racing answer row");

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/attempts/{attempt_id}/submit"),
            Some(&token),
            Some(json!({
                "answers": {
                    (quiz.mc_question.clone()): {"type": "multiple_choice", "selected": quiz.mc_correct.clone()},
                }
            })),
        ))
        .await
        .expect("submit attempt");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn teacher_authors_true_false_question_and_answer_key_stays_hidden() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_teacher(ctx.state.db(), "teacher005").await;
    let course = test_support::insert_course(ctx.state.db(), "Authoring", &teacher.id).await;
    let module = test_support::insert_module(ctx.state.db(), &course.id, "M1").await;
    let test = test_support::insert_test(ctx.state.db(), &module.id, "T1", 70.0).await;
    let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/tests/{}/questions", test.id),
            Some(&token),
            Some(json!({
                "question_text": "Rust has a garbage collector",
                "question_type": "true_false",
                "points": 1.0,
                "correct_answer": false,
            })),
        ))
        .await
        .expect("create question");
    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["options"].as_array().expect("options").len(), 2);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/tests/{}", test.id),
            Some(&token),
            None,
        ))
        .await
        .expect("get test");
    let fetched = test_support::read_json(response).await;
    let options = fetched["questions"][0]["options"].as_array().expect("options");
    assert_eq!(options.len(), 2);
    for option in options {
        assert!(option.get("is_correct").is_none(), "answer key leaked: {option}");
    }
}

#[tokio::test]
async fn grading_a_submission_updates_the_overall_grade() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_teacher(ctx.state.db(), "teacher006").await;
    let student = test_support::insert_student(ctx.state.db(), "student006").await;
    let course = test_support::insert_course(ctx.state.db(), "Graded course", &teacher.id).await;
    test_support::enroll_student(ctx.state.db(), &student.id, &course.id).await;
    let teacher_token = test_support::bearer_token(&teacher.id, ctx.state.settings());
    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/courses/{}/assignments", course.id),
            Some(&teacher_token),
            Some(json!({"title": "Essay on lifetimes", "description": "500 words"})),
        ))
        .await
        .expect("create assignment");
    let created = test_support::read_json(response).await;
    let assignment_id = created["id"].as_str().expect("assignment id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/assignments/{assignment_id}/submissions"),
            Some(&student_token),
            Some(json!({"content": "lifetimes tie borrows to scopes"})),
        ))
        .await
        .expect("create submission");
    let status = response.status();
    let submission = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {submission}");
    let submission_id = submission["id"].as_str().expect("submission id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/submissions/{submission_id}/grade"),
            Some(&teacher_token),
            Some(json!({"grade": 85.0, "feedback": "solid"})),
        ))
        .await
        .expect("grade submission");
    let status = response.status();
    let graded = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {graded}");
    assert_eq!(graded["grade"], 85.0);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/courses/{}/grades", course.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("course grades");
    let grades = test_support::read_json(response).await;
    assert_eq!(grades["overall_grade"], 85.0, "response: {grades}");
    assert_eq!(grades["assignments"].as_array().expect("assignments").len(), 1);
}

#[tokio::test]
async fn unenrolled_student_cannot_start_an_attempt() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_teacher(ctx.state.db(), "teacher007").await;
    let student = test_support::insert_student(ctx.state.db(), "student007").await;
    let quiz = build_quiz(ctx.state.db(), &teacher.id).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/tests/{}/attempts", quiz.test_id),
            Some(&token),
            None,
        ))
        .await
        .expect("start attempt");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
