use crate::common::{TestApp, routes};

#[tokio::test]
async fn healthcheck_reports_database_reachability() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::HEALTHCHECK).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "ok");
    assert_eq!(res.body["database"], true);
}

#[tokio::test]
async fn healthcheck_ignores_a_bad_token() {
    let app = TestApp::spawn().await;

    let res = app.get_with_token(routes::HEALTHCHECK, "not.a.jwt").await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "ok");
}
