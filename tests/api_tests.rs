use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};

use parhly_server::{
    app_state::AppState, config::Config, handlers, middleware::RequestIdMiddleware,
    repositories::Repositories,
};

fn state() -> AppState {
    AppState::with_repositories(Config::test_config(), Repositories::in_memory())
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .app_data(web::Data::from($state.jwt_service.clone()))
                .wrap(RequestIdMiddleware)
                .configure(handlers::configure),
        )
        .await
    };
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> test::TestRequest {
    let mut req = match method {
        "GET" => test::TestRequest::get(),
        "POST" => test::TestRequest::post(),
        "PATCH" => test::TestRequest::patch(),
        "DELETE" => test::TestRequest::delete(),
        other => panic!("unsupported method {}", other),
    }
    .uri(uri);

    if let Some(token) = token {
        req = req.insert_header(("Authorization", format!("Bearer {}", token)));
    }
    if let Some(body) = body {
        req = req.set_json(body);
    }
    req
}

fn parse(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap()
    }
}

macro_rules! call {
    ($app:expr, $method:expr, $uri:expr, $token:expr, $body:expr $(,)?) => {{
        let req = request($method, $uri, $token, $body).to_request();
        let resp = test::call_service(&$app, req).await;
        let status: StatusCode = resp.status();
        let bytes = test::read_body(resp).await;
        (status, parse(&bytes))
    }};
}

macro_rules! register {
    ($app:expr, $email:expr, $role:expr $(,)?) => {{
        let (status, body) = call!(
            $app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": $email, "password": "secret1", "role": $role }))
        ,
    );
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }};
}

macro_rules! create_lesson {
    ($app:expr, $token:expr, $course_id:expr, $order:expr, $published:expr $(,)?) => {{
        let (status, body) = call!(
            $app,
            "POST",
            &format!("/api/courses/{}/lessons", $course_id),
            Some($token),
            Some(json!({
                "order": $order,
                "title": format!("Lesson {}", $order),
                "isPublished": $published
            }))
        ,
    );
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["lesson"]["id"].as_str().unwrap().to_string()
    }};
}

#[actix_web::test]
async fn test_register_login_and_conflicts() {
    let state = state();
    let app = app!(state);

    register!(app, "ada@example.com", "student");

    let (status, _) = call!(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "ADA@example.com", "password": "secret1", "role": "student" })),
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call!(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "secret1" })),
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "student");
    assert!(body["token"].is_string());

    let (status, body) = call!(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, body) = call!(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "not-an-email", "password": "123", "role": "student" })),
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn test_invalid_token_is_rejected() {
    let state = state();
    let app = app!(state);

    let (status, body) = call!(app, "GET", "/api/me", Some("garbage"), None);
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[actix_web::test]
async fn test_course_lifecycle_through_completion() {
    let state = state();
    let app = app!(state);

    let teacher = register!(app, "teach@example.com", "teacher");
    let student = register!(app, "learn@example.com", "student");

    let (status, body) = call!(
        app,
        "POST",
        "/api/courses",
        Some(&student),
        Some(json!({ "title": "Not allowed" })),
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = call!(
        app,
        "POST",
        "/api/courses",
        Some(&teacher),
        Some(json!({ "title": "Rust Basics", "level": "beginner", "isPublished": true })),
    );
    assert_eq!(status, StatusCode::CREATED);
    let course_id = body["course"]["id"].as_str().unwrap().to_string();

    let first = create_lesson!(app, &teacher, &course_id, 1, true);
    let second = create_lesson!(app, &teacher, &course_id, 2, true);
    let draft = create_lesson!(app, &teacher, &course_id, 3, false);

    let (status, _) = call!(
        app,
        "POST",
        &format!("/api/courses/{}/lessons", course_id),
        Some(&teacher),
        Some(json!({ "order": 2, "title": "Clash" })),
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call!(app, "GET", "/api/courses", Some(&student), None);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["courses"].as_array().unwrap().len(), 1);
    assert_eq!(body["courses"][0]["stats"]["lessons"], 2);

    let (status, first_enroll) = call!(
        app,
        "POST",
        &format!("/api/courses/{}/enroll", course_id),
        Some(&student),
        None,
    );
    assert_eq!(status, StatusCode::CREATED);
    let (status, second_enroll) = call!(
        app,
        "POST",
        &format!("/api/courses/{}/enroll", course_id),
        Some(&student),
        None,
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first_enroll["enrollment"]["id"], second_enroll["enrollment"]["id"]);

    let toggle = |lesson: &str| format!("/api/courses/{}/progress/lessons/{}", course_id, lesson);

    let (status, _) = call!(
        app,
        "POST",
        &toggle(&draft),
        Some(&student),
        Some(json!({ "completed": true })),
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call!(
        app,
        "POST",
        &toggle(&first),
        Some(&student),
        Some(json!({ "completed": true })),
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enrollment"]["status"], "enrolled");
    assert_eq!(body["enrollment"]["progress"], json!({ "completed": 1, "total": 2 }));

    let (_, body) = call!(
        app,
        "POST",
        &toggle(&second),
        Some(&student),
        Some(json!({ "completed": true })),
    );
    assert_eq!(body["enrollment"]["status"], "completed");
    assert!(body["enrollment"]["completedAt"].is_string());

    let (status, body) = call!(app, "GET", "/api/student/enrollments", Some(&student), None);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enrolled"].as_array().unwrap().len(), 1);
    assert_eq!(body["enrolled"][0]["course"]["title"], "Rust Basics");
    assert_eq!(body["enrolled"][0]["enrollment"]["status"], "completed");

    let (_, body) = call!(
        app,
        "POST",
        &toggle(&second),
        Some(&student),
        Some(json!({ "completed": false })),
    );
    assert_eq!(body["enrollment"]["status"], "enrolled");
    assert!(body["enrollment"]["completedAt"].is_null());

    let (status, body) = call!(
        app,
        "GET",
        &format!("/api/courses/{}/enrollments", course_id),
        Some(&teacher),
        None,
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enrollments"].as_array().unwrap().len(), 1);

    let (status, body) = call!(app, "GET", "/api/teacher/overview", Some(&teacher), None);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "courses": 1, "students": 1, "active": 1 }));
}

#[actix_web::test]
async fn test_foreign_and_hidden_courses_look_missing() {
    let state = state();
    let app = app!(state);

    let owner = register!(app, "owner@example.com", "teacher");
    let rival = register!(app, "rival@example.com", "teacher");
    let student = register!(app, "student@example.com", "student");

    let (_, body) = call!(
        app,
        "POST",
        "/api/courses",
        Some(&owner),
        Some(json!({ "title": "Draft Course" })),
    );
    let course_id = body["course"]["id"].as_str().unwrap().to_string();

    let (status, body) = call!(
        app,
        "PATCH",
        &format!("/api/courses/{}", course_id),
        Some(&rival),
        Some(json!({ "title": "Hijacked" })),
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = call!(
        app,
        "GET",
        &format!("/api/courses/{}", course_id),
        Some(&student),
        None,
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call!(
        app,
        "POST",
        &format!("/api/courses/{}/enroll", course_id),
        Some(&student),
        None,
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call!(app, "GET", "/api/courses/not-an-id", Some(&owner), None);
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call!(
        app,
        "GET",
        &format!("/api/courses/{}", course_id),
        Some(&owner),
        None,
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course"]["title"], "Draft Course");
    assert!(body["enrollment"].is_null());
}

#[actix_web::test]
async fn test_resources_quizzes_and_submission() {
    let state = state();
    let app = app!(state);

    let teacher = register!(app, "t@example.com", "teacher");
    let student = register!(app, "s@example.com", "student");
    let outsider = register!(app, "o@example.com", "student");

    let (_, body) = call!(
        app,
        "POST",
        "/api/courses",
        Some(&teacher),
        Some(json!({ "title": "Systems", "isPublished": true })),
    );
    let course_id = body["course"]["id"].as_str().unwrap().to_string();
    let visible = create_lesson!(app, &teacher, &course_id, 1, true);
    let hidden = create_lesson!(app, &teacher, &course_id, 2, false);

    let (status, body) = call!(
        app,
        "POST",
        &format!("/api/courses/{}/resources", course_id),
        Some(&teacher),
        Some(json!({ "title": "Syllabus", "url": "https://example.com/syllabus" })),
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["resource"]["type"], "link");

    let (status, body) = call!(
        app,
        "POST",
        &format!("/api/courses/{}/lessons/{}/resources", course_id, hidden),
        Some(&teacher),
        Some(json!({ "title": "Draft notes", "type": "file", "url": "https://example.com/notes.pdf" })),
    );
    assert_eq!(status, StatusCode::CREATED);
    let hidden_resource = body["resource"]["id"].as_str().unwrap().to_string();

    let (status, _) = call!(
        app,
        "POST",
        &format!("/api/courses/{}/resources", course_id),
        Some(&teacher),
        Some(json!({ "title": "Bad link", "url": "example.com" })),
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call!(
        app,
        "GET",
        &format!("/api/courses/{}/resources", course_id),
        Some(&teacher),
        None,
    );
    assert_eq!(body["resources"].as_array().unwrap().len(), 2);

    let (_, body) = call!(
        app,
        "GET",
        &format!("/api/courses/{}/resources", course_id),
        Some(&student),
        None,
    );
    assert_eq!(body["resources"].as_array().unwrap().len(), 1);

    let (status, _) = call!(
        app,
        "PATCH",
        &format!(
            "/api/courses/{}/lessons/{}/resources/{}",
            course_id, visible, hidden_resource
        ),
        Some(&teacher),
        Some(json!({ "title": "Moved?" })),
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call!(
        app,
        "DELETE",
        &format!(
            "/api/courses/{}/lessons/{}/resources/{}",
            course_id, hidden, hidden_resource
        ),
        Some(&teacher),
        None,
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Resource deleted");

    let (status, body) = call!(
        app,
        "POST",
        &format!("/api/courses/{}/lessons/{}/quizzes", course_id, visible),
        Some(&teacher),
        Some(json!({
            "title": "Checkpoint",
            "durationMinutes": 15,
            "questions": [
                { "prompt": "2 + 2?", "options": ["3", "4"], "correctOption": 1 }
            ]
        })),
    );
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let quiz_id = body["quiz"]["id"].as_str().unwrap().to_string();

    let (_, body) = call!(
        app,
        "GET",
        &format!("/api/courses/{}/lessons/{}/quizzes", course_id, visible),
        Some(&student),
        None,
    );
    assert_eq!(body["quizzes"].as_array().unwrap().len(), 1);

    let submit = format!("/api/courses/{}/quizzes/{}/submit", course_id, quiz_id);

    let (status, body) = call!(
        app,
        "POST",
        &submit,
        Some(&outsider),
        Some(json!({ "answers": { "0": 1 } })),
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Not enrolled");

    call!(
        app,
        "POST",
        &format!("/api/courses/{}/enroll", course_id),
        Some(&student),
        None,
    );

    let (status, body) = call!(
        app,
        "POST",
        &submit,
        Some(&student),
        Some(json!({ "score": "1/1", "answers": { "0": 1 } })),
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Submission received");

    let (status, body) = call!(
        app,
        "DELETE",
        &format!("/api/courses/{}/quizzes/{}", course_id, quiz_id),
        Some(&teacher),
        None,
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Quiz deleted");
}

#[actix_web::test]
async fn test_responses_carry_request_id() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.headers().contains_key("x-request-id"));
}

#[actix_web::test]
async fn test_unauthorized_response_carries_request_id() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/courses").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key("x-request-id"));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}
