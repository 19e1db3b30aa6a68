use crate::common::{TestApp, routes};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-an-image";

mod thumbnails {
    use super::*;

    #[tokio::test]
    async fn upload_sets_the_url_and_serves_the_bytes() {
        let app = TestApp::spawn_logged_in().await;
        app.create_category("Flours", "flours").await;

        let res = app
            .put_file(&routes::category_thumbnail("flours"), "logo.png", PNG_BYTES.to_vec())
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["thumbnail_url"], "/media/category/flours/logo.png");

        let file = app
            .client
            .get(app.url("/media/category/flours/logo.png"))
            .send()
            .await
            .unwrap();
        assert_eq!(file.status(), 200);
        assert_eq!(
            file.headers()["content-type"].to_str().unwrap(),
            "image/png"
        );
        assert_eq!(file.bytes().await.unwrap().as_ref(), PNG_BYTES);
    }

    #[tokio::test]
    async fn item_thumbnail_is_stored_under_the_item_slug() {
        let app = TestApp::spawn_logged_in().await;
        app.create_category("Flours", "flours").await;
        let uid = app.create_item("Rye flour", "rye-flour", "flours").await;

        let res = app
            .put_file(&routes::item_thumbnail(&uid), "sack.png", PNG_BYTES.to_vec())
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["thumbnail_url"], "/media/item/rye-flour/sack.png");
        let fetched = app.get(&routes::item(&uid)).await;
        assert_eq!(fetched.body["thumbnail_url"], "/media/item/rye-flour/sack.png");
    }

    #[tokio::test]
    async fn clearing_empties_the_url() {
        let app = TestApp::spawn_logged_in().await;
        app.create_category("Flours", "flours").await;
        app.put_file(&routes::category_thumbnail("flours"), "logo.png", PNG_BYTES.to_vec())
            .await;

        let res = app.delete(&routes::category_thumbnail("flours")).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["thumbnail_url"], "");
        let fetched = app.get(&routes::category("flours")).await;
        assert_eq!(fetched.body["thumbnail_url"], "");
    }

    #[tokio::test]
    async fn hidden_filename_is_rejected() {
        let app = TestApp::spawn_logged_in().await;
        app.create_category("Flours", "flours").await;

        let res = app
            .put_file(&routes::category_thumbnail("flours"), ".hidden", PNG_BYTES.to_vec())
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "file");
        let fetched = app.get(&routes::category("flours")).await;
        assert_eq!(fetched.body["thumbnail_url"], "");
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let app = TestApp::spawn_logged_in().await;
        app.create_category("Flours", "flours").await;

        let res = app
            .put_file(&routes::category_thumbnail("flours"), "logo.png", Vec::new())
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let app = TestApp::spawn_logged_in().await;
        app.create_category("Flours", "flours").await;

        // Over the 256 KiB store limit but inside the multipart allowance.
        let res = app
            .put_file(
                &routes::category_thumbnail("flours"),
                "huge.png",
                vec![0u8; 300 * 1024],
            )
            .await;

        assert_eq!(res.status, 413);
        assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn upload_requires_a_session() {
        let app = TestApp::spawn().await;

        let part = reqwest::multipart::Part::bytes(PNG_BYTES.to_vec()).file_name("logo.png");
        let form = reqwest::multipart::Form::new().part("file", part);
        let res = app
            .anonymous_client()
            .put(app.url(&routes::category_thumbnail("flours")))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 401);
    }
}

mod serving {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get("/media/category/flours/nothing.png").await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn unknown_kind_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get("/media/user/flours/logo.png").await;

        assert_eq!(res.status, 400);
    }
}
