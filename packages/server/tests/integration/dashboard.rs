use std::time::Duration;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn anonymous_visitor_is_sent_to_login() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::DASHBOARD).await;

    assert_eq!(res.status, 303);
    assert_eq!(res.header("location"), Some(routes::LOGIN));
}

#[tokio::test]
async fn invalid_token_is_also_sent_to_login() {
    let app = TestApp::spawn().await;

    let res = app.get_with_token(routes::DASHBOARD, "not.a.jwt").await;

    assert_eq!(res.status, 303);
    assert_eq!(res.header("location"), Some(routes::LOGIN));
}

#[tokio::test]
async fn empty_inventory_shows_zero_counts() {
    let app = TestApp::spawn_logged_in().await;

    let res = app.get(routes::DASHBOARD).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["username"], "baker");
    assert_eq!(res.body["counts"]["categories"], 0);
    assert_eq!(res.body["counts"]["items"], 0);
    assert_eq!(res.body["recent_items"].as_array().unwrap().len(), 0);
    assert_eq!(res.body["recent_productions"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn recent_lists_are_newest_first_and_capped() {
    let app = TestApp::spawn_logged_in().await;
    app.create_category("Flours", "flours").await;
    app.create_category("Breads", "breads").await;
    for slug in ["spelt", "rye", "wheat", "oat"] {
        app.create_item(slug, slug, "flours").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let loaf = app.create_product("Rye loaf", "rye-loaf", "breads").await;
    app.create_production(&[(&loaf, 10)]).await;

    let res = app.get(routes::DASHBOARD).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["counts"]["categories"], 2);
    assert_eq!(res.body["counts"]["items"], 4);
    assert_eq!(res.body["counts"]["products"], 1);
    assert_eq!(res.body["counts"]["productions"], 1);

    let items = res.body["recent_items"].as_array().unwrap();
    let slugs: Vec<&str> = items.iter().map(|i| i["slug"].as_str().unwrap()).collect();
    assert_eq!(slugs, ["oat", "wheat", "rye"]);
    assert!(items.iter().all(|i| i["was_added_recently"] == true));

    assert_eq!(res.body["recent_products"][0]["uid"], loaf.as_str());
    assert_eq!(
        res.body["recent_productions"][0]["display_products"],
        "Rye loaf"
    );
}
