use inventory_server::entity::{production, production_detail};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use crate::common::{TestApp, routes};

async fn bakery(app: &TestApp) -> (String, String) {
    app.create_category("Breads", "breads").await;
    let rye = app.create_product("Rye loaf", "rye-loaf", "breads").await;
    let baguette = app.create_product("Baguette", "baguette", "breads").await;
    (rye, baguette)
}

mod runs {
    use super::*;

    #[tokio::test]
    async fn create_records_every_line_in_one_go() {
        let app = TestApp::spawn_logged_in().await;
        let (rye, baguette) = bakery(&app).await;

        let body = app.create_production(&[(&rye, 40), (&baguette, 12)]).await;

        let uid = body["uid"].as_str().unwrap();
        assert_eq!(body["label"], format!("production_{uid}"));
        assert_eq!(body["was_added_recently"], true);
        let details = body["details"].as_array().unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0]["product_uid"], rye.as_str());
        assert_eq!(details[0]["produced_units"], 40);
        assert_eq!(
            details[0]["label"],
            format!("production_{uid}__rye-loaf_detail")
        );
        assert_eq!(production_detail::Entity::find().count(&app.db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn display_products_lists_each_product_once() {
        let app = TestApp::spawn_logged_in().await;
        let (rye, baguette) = bakery(&app).await;

        let body = app
            .create_production(&[(&rye, 40), (&baguette, 12), (&rye, 8)])
            .await;

        assert_eq!(body["details"].as_array().unwrap().len(), 3);
        assert_eq!(body["display_products"], "Rye loaf, Baguette");

        let uid = body["uid"].as_str().unwrap();
        let fetched = app.get(&routes::production(uid)).await;
        assert_eq!(fetched.status, 200);
        // Stored lines come back ordered by product name.
        assert_eq!(fetched.body["display_products"], "Baguette, Rye loaf");
    }

    #[tokio::test]
    async fn run_without_lines_is_allowed() {
        let app = TestApp::spawn_logged_in().await;

        let body = app.create_production(&[]).await;

        assert_eq!(body["details"], json!([]));
        assert_eq!(body["display_products"], "");
    }

    #[tokio::test]
    async fn unknown_product_rolls_back_the_whole_run() {
        let app = TestApp::spawn_logged_in().await;
        let (rye, _) = bakery(&app).await;

        let res = app
            .post(
                routes::PRODUCTIONS,
                &json!({"details": [
                    {"product": rye, "produced_units": 4},
                    {"product": uuid::Uuid::new_v4(), "produced_units": 4},
                ]}),
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(production::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(production_detail::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn negative_units_are_rejected() {
        let app = TestApp::spawn_logged_in().await;
        let (rye, _) = bakery(&app).await;

        let res = app
            .post(
                routes::PRODUCTIONS,
                &json!({"details": [{"product": rye, "produced_units": -1}]}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "produced_units");
        assert_eq!(production::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleting_a_run_removes_its_lines_only() {
        let app = TestApp::spawn_logged_in().await;
        let (rye, baguette) = bakery(&app).await;
        let first = app.create_production(&[(&rye, 40), (&baguette, 12)]).await;
        app.create_production(&[(&rye, 20)]).await;
        let first = first["uid"].as_str().unwrap();

        let res = app.delete(&routes::production(first)).await;

        assert_eq!(res.status, 204);
        assert_eq!(app.get(&routes::production(first)).await.status, 404);
        assert_eq!(production::Entity::find().count(&app.db).await.unwrap(), 1);
        assert_eq!(production_detail::Entity::find().count(&app.db).await.unwrap(), 1);
        assert_eq!(app.get(&routes::product(&rye)).await.status, 200);
    }

    #[tokio::test]
    async fn list_is_newest_first_by_default() {
        let app = TestApp::spawn_logged_in().await;
        let (rye, _) = bakery(&app).await;
        let older = app.create_production(&[(&rye, 1)]).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newer = app.create_production(&[(&rye, 2)]).await;

        let res = app.get(routes::PRODUCTIONS).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 2);
        assert_eq!(res.body["data"][0]["uid"], newer["uid"]);
        assert_eq!(res.body["data"][1]["uid"], older["uid"]);

        let res = app
            .get(&format!("{}?sort_order=asc", routes::PRODUCTIONS))
            .await;
        assert_eq!(res.body["data"][0]["uid"], older["uid"]);
    }
}

mod details {
    use super::*;

    #[tokio::test]
    async fn lines_can_be_added_updated_and_removed() {
        let app = TestApp::spawn_logged_in().await;
        let (rye, baguette) = bakery(&app).await;
        let run = app.create_production(&[(&rye, 40)]).await;
        let run = run["uid"].as_str().unwrap();

        let added = app
            .post(
                &routes::production_details(run),
                &json!({"product": baguette, "produced_units": 12}),
            )
            .await;
        assert_eq!(added.status, 201, "{}", added.text);
        assert_eq!(added.body["production_uid"], run);
        assert_eq!(added.body["product_slug"], "baguette");
        let line = added.uid();

        let updated = app
            .patch(&routes::production_detail(&line), &json!({"produced_units": 15}))
            .await;
        assert_eq!(updated.status, 200, "{}", updated.text);
        assert_eq!(updated.body["produced_units"], 15);

        let lines = app.get(&routes::production_details(run)).await;
        assert_eq!(lines.status, 200);
        assert_eq!(lines.body.as_array().unwrap().len(), 2);
        assert_eq!(lines.body[0]["product_name"], "Baguette");
        assert_eq!(lines.body[0]["produced_units"], 15);

        assert_eq!(app.delete(&routes::production_detail(&line)).await.status, 204);
        assert_eq!(app.get(&routes::production_detail(&line)).await.status, 404);
        assert_eq!(app.delete(&routes::production_detail(&line)).await.status, 404);
    }

    #[tokio::test]
    async fn negative_update_is_rejected() {
        let app = TestApp::spawn_logged_in().await;
        let (rye, _) = bakery(&app).await;
        let run = app.create_production(&[(&rye, 40)]).await;
        let line = run["details"][0]["uid"].as_str().unwrap();

        let res = app
            .patch(&routes::production_detail(line), &json!({"produced_units": -5}))
            .await;

        assert_eq!(res.status, 400);
        let stored = app.get(&routes::production_detail(line)).await;
        assert_eq!(stored.body["produced_units"], 40);
    }

    #[tokio::test]
    async fn line_for_missing_run_is_not_found() {
        let app = TestApp::spawn_logged_in().await;
        let (rye, _) = bakery(&app).await;

        let res = app
            .post(
                &routes::production_details(&uuid::Uuid::new_v4().to_string()),
                &json!({"product": rye, "produced_units": 1}),
            )
            .await;

        assert_eq!(res.status, 404);
    }
}
