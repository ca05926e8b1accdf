mod common;

use axum::http::StatusCode;
use common::setup;
use film_catalog_backend::entities::users::Role;
use serde_json::json;

const COLLECTIONS: [&str; 6] = [
    "/genres/",
    "/themes/",
    "/countries/",
    "/languages/",
    "/studios/",
    "/films/",
];

#[tokio::test]
async fn test_anonymous_reads_succeed() {
    let t = setup().await;
    let (_, staff, _) = t.account("curator", Role::Staff).await;

    let (status, genre) = t
        .post("/genres/", Some(staff.as_str()), json!({"name": "Noir"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    for uri in COLLECTIONS {
        let (status, body) = t.get(uri, None).await;
        assert_eq!(status, StatusCode::OK, "GET {}", uri);
        assert!(body.is_array(), "GET {} returned {}", uri, body);
    }

    let (status, body) = t.get(&format!("/genres/{}/", genre["id"]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Noir");
    assert_eq!(body["description"], "");
}

#[tokio::test]
async fn test_anonymous_writes_rejected() {
    let t = setup().await;

    for uri in COLLECTIONS {
        let (status, _) = t.post(uri, None, json!({"name": "x"})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "POST {}", uri);
    }

    for uri in COLLECTIONS {
        let detail = format!("{}1/", uri);
        for method in ["PUT", "PATCH", "DELETE"] {
            let (status, body) = t
                .send(method, &detail, None, Some(json!({"name": "x", "title": "x"})))
                .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, detail);
            assert_eq!(body["detail"], "Authentication credentials were not provided.");
        }
    }
}

#[tokio::test]
async fn test_non_integer_id_is_not_found() {
    let t = setup().await;

    for uri in ["/genres/abc/", "/films/1.5/", "/users/me/followers/"] {
        let (status, body) = t.get(uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "GET {}", uri);
        assert_eq!(body["detail"], "Not found.");
    }
}

#[tokio::test]
async fn test_user_cannot_create_film_but_staff_can() {
    let t = setup().await;
    let (_, user, _) = t.account("viewer", Role::User).await;
    let (_, staff, _) = t.account("curator", Role::Staff).await;

    let film = json!({"title": "Stalker", "year": 1979});

    let (status, body) = t.post("/films/", Some(user.as_str()), film.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "You do not have permission to perform this action.");

    let (status, body) = t.post("/films/", Some(staff.as_str()), film).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Stalker");
    assert_eq!(body["year"], 1979);
    assert_eq!(body["genres"], json!([]));
}

#[tokio::test]
async fn test_film_detail_expands_relations() {
    let t = setup().await;
    let (_, admin, _) = t.account("boss", Role::Admin).await;

    let (_, genre) = t.post("/genres/", Some(admin.as_str()), json!({"name": "Drama"})).await;
    let (_, country) = t
        .post("/countries/", Some(admin.as_str()), json!({"name": "Japan", "code": "JP"}))
        .await;
    let (_, studio) = t
        .post(
            "/studios/",
            Some(admin.as_str()),
            json!({"name": "Toho", "founded_year": 1932, "country_id": country["id"]}),
        )
        .await;
    assert_eq!(studio["country"]["code"], "JP");

    let (status, film) = t
        .post(
            "/films/",
            Some(admin.as_str()),
            json!({
                "title": "Ikiru",
                "year": 1952,
                "duration": 143,
                "genres": [genre["id"], genre["id"]],
                "studios": [studio["id"]],
                "countries": [country["id"]],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", film);
    assert_eq!(film["genres"].as_array().map(Vec::len), Some(1));
    assert_eq!(film["studios"][0]["name"], "Toho");
    assert_eq!(film["studios"][0]["country"]["name"], "Japan");
    assert_eq!(film["countries"][0]["code"], "JP");

    let (status, list) = t.get("/films/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["title"], "Ikiru");
    assert!(list[0].get("genres").is_none());
}

#[tokio::test]
async fn test_film_validation_errors() {
    let t = setup().await;
    let (_, staff, _) = t.account("curator", Role::Staff).await;

    let (status, body) = t.post("/films/", Some(staff.as_str()), json!({"duration": -5})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], json!(["This field is required."]));
    assert_eq!(body["year"], json!(["This field is required."]));
    assert_eq!(
        body["duration"],
        json!(["Ensure this value is greater than or equal to 0."])
    );

    let (status, body) = t
        .post(
            "/films/",
            Some(staff.as_str()),
            json!({"title": "Ghost", "year": 2000, "genres": [42], "trailer_url": "nope"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["genres"], json!(["Invalid pk \"42\" - object does not exist."]));
    assert_eq!(body["trailer_url"], json!(["Enter a valid URL."]));

    let (_, films) = t.get("/films/", None).await;
    assert_eq!(films, json!([]));
}

#[tokio::test]
async fn test_film_filters_search_and_ordering() {
    let t = setup().await;
    let (_, staff, _) = t.account("curator", Role::Staff).await;

    let (_, scifi) = t.post("/genres/", Some(staff.as_str()), json!({"name": "Sci-Fi"})).await;
    t.post(
        "/films/",
        Some(staff.as_str()),
        json!({"title": "Solaris", "year": 1972, "genres": [scifi["id"]]}),
    )
    .await;
    t.post(
        "/films/",
        Some(staff.as_str()),
        json!({"title": "Mirror", "year": 1975, "description": "A dying poet remembers"}),
    )
    .await;

    let (_, by_genre) = t.get(&format!("/films/?genres={}", scifi["id"]), None).await;
    assert_eq!(by_genre.as_array().map(Vec::len), Some(1));
    assert_eq!(by_genre[0]["title"], "Solaris");

    let (status, body) = t.get("/films/?genres=999", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["genres"],
        json!(["Select a valid choice. 999 is not one of the available choices."])
    );

    let (status, body) = t.get("/films/?year=seventies", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["year"], json!(["Enter a whole number."]));

    let (_, searched) = t.get("/films/?search=POET", None).await;
    assert_eq!(searched.as_array().map(Vec::len), Some(1));
    assert_eq!(searched[0]["title"], "Mirror");

    let (_, ordered) = t.get("/films/?ordering=-year", None).await;
    assert_eq!(ordered[0]["title"], "Mirror");
    assert_eq!(ordered[1]["title"], "Solaris");
}

#[tokio::test]
async fn test_unique_names_and_partial_updates() {
    let t = setup().await;
    let (_, staff, _) = t.account("curator", Role::Staff).await;

    let (_, language) = t
        .post("/languages/", Some(staff.as_str()), json!({"name": "Russian", "code": "ru"}))
        .await;
    let (status, body) = t
        .post("/languages/", Some(staff.as_str()), json!({"name": "Russian", "code": "rus"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["name"], json!(["language with this name already exists."]));

    let uri = format!("/languages/{}/", language["id"]);

    let (status, body) = t
        .send("PATCH", &uri, Some(staff.as_str()), Some(json!({"code": "RU"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Russian");
    assert_eq!(body["code"], "RU");

    let (status, body) = t
        .send("PUT", &uri, Some(staff.as_str()), Some(json!({"code": "ru"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["name"], json!(["This field is required."]));

    let (status, body) = t.send("DELETE", &uri, Some(staff.as_str()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, serde_json::Value::Null);

    let (status, body) = t.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No language matches the given query.");
}

#[tokio::test]
async fn test_deleting_country_detaches_studios() {
    let t = setup().await;
    let (_, staff, _) = t.account("curator", Role::Staff).await;

    let (_, country) = t
        .post("/countries/", Some(staff.as_str()), json!({"name": "Soviet Union", "code": "SU"}))
        .await;
    let (_, studio) = t
        .post(
            "/studios/",
            Some(staff.as_str()),
            json!({"name": "Mosfilm", "country_id": country["id"]}),
        )
        .await;
    assert_eq!(studio["country"]["id"], country["id"]);

    let (status, _) = t
        .send("DELETE", &format!("/countries/{}/", country["id"]), Some(staff.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, studio) = t.get(&format!("/studios/{}/", studio["id"]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(studio["name"], "Mosfilm");
    assert!(studio["country"].is_null());
}

#[tokio::test]
async fn test_deleting_genre_removes_film_membership() {
    let t = setup().await;
    let (_, staff, _) = t.account("curator", Role::Staff).await;

    let (_, genre) = t.post("/genres/", Some(staff.as_str()), json!({"name": "War"})).await;
    let (_, film) = t
        .post(
            "/films/",
            Some(staff.as_str()),
            json!({"title": "Come and See", "year": 1985, "genres": [genre["id"]]}),
        )
        .await;
    assert_eq!(film["genres"][0]["name"], "War");

    let (status, _) = t
        .send("DELETE", &format!("/genres/{}/", genre["id"]), Some(staff.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, film) = t.get(&format!("/films/{}/", film["id"]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(film["genres"], json!([]));
}

#[tokio::test]
async fn test_repeated_membership_filter_matches_any() {
    let t = setup().await;
    let (_, staff, _) = t.account("curator", Role::Staff).await;

    let (_, horror) = t.post("/genres/", Some(staff.as_str()), json!({"name": "Horror"})).await;
    let (_, comedy) = t.post("/genres/", Some(staff.as_str()), json!({"name": "Comedy"})).await;
    for (title, genres) in [
        ("Kwaidan", json!([horror["id"]])),
        ("Tampopo", json!([comedy["id"]])),
        ("Tokyo Story", json!([])),
    ] {
        let (status, _) = t
            .post(
                "/films/",
                Some(staff.as_str()),
                json!({"title": title, "year": 1960, "genres": genres}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, films) = t
        .get(
            &format!("/films/?genres={}&genres={}", horror["id"], comedy["id"]),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = films
        .as_array()
        .map(|rows| rows.iter().filter_map(|f| f["title"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(titles, vec!["Kwaidan", "Tampopo"]);

    let (status, body) = t.get("/films/?genres=horror", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["genres"], json!(["\u{201c}horror\u{201d} is not a valid value."]));
}

#[tokio::test]
async fn test_studio_country_filter_and_search() {
    let t = setup().await;
    let (_, staff, _) = t.account("curator", Role::Staff).await;

    let (_, japan) = t
        .post("/countries/", Some(staff.as_str()), json!({"name": "Japan", "code": "JP"}))
        .await;
    let (_, italy) = t
        .post("/countries/", Some(staff.as_str()), json!({"name": "Italy", "code": "IT"}))
        .await;
    for (name, country, description) in [
        ("Toho", &japan, "Godzilla and Kurosawa"),
        ("Shochiku", &japan, "Home of Ozu"),
        ("Cinecitta", &italy, "Fellini's backlot"),
    ] {
        t.post(
            "/studios/",
            Some(staff.as_str()),
            json!({"name": name, "country_id": country["id"], "description": description}),
        )
        .await;
    }

    let (status, studios) = t.get(&format!("/studios/?country={}", japan["id"]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(studios.as_array().map(Vec::len), Some(2));
    assert_eq!(studios[0]["country"]["code"], "JP");

    let (_, searched) = t.get("/studios/?search=fellini", None).await;
    assert_eq!(searched.as_array().map(Vec::len), Some(1));
    assert_eq!(searched[0]["name"], "Cinecitta");

    for query in ["country=999", "country=japan"] {
        let (status, body) = t.get(&format!("/studios/?{}", query), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", query);
        assert_eq!(
            body["country"],
            json!(["Select a valid choice. That choice is not one of the available choices."])
        );
    }
}

#[tokio::test]
async fn test_film_put_replaces_memberships() {
    let t = setup().await;
    let (_, staff, _) = t.account("curator", Role::Staff).await;

    let (_, drama) = t.post("/genres/", Some(staff.as_str()), json!({"name": "Drama"})).await;
    let (_, crime) = t.post("/genres/", Some(staff.as_str()), json!({"name": "Crime"})).await;
    let (_, film) = t
        .post(
            "/films/",
            Some(staff.as_str()),
            json!({"title": "High and Low", "year": 1963, "genres": [drama["id"]]}),
        )
        .await;
    let uri = format!("/films/{}/", film["id"]);

    let (status, body) = t
        .send(
            "PUT",
            &uri,
            Some(staff.as_str()),
            Some(json!({"title": "High and Low", "year": 1963, "genres": [crime["id"]]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["genres"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["genres"][0]["name"], "Crime");

    let (status, body) = t
        .send("PATCH", &uri, Some(staff.as_str()), Some(json!({"duration": 143})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["duration"], 143);
    assert_eq!(body["genres"][0]["name"], "Crime");
}

#[tokio::test]
async fn test_null_on_required_field_rejected() {
    let t = setup().await;
    let (_, staff, _) = t.account("curator", Role::Staff).await;

    let (_, genre) = t.post("/genres/", Some(staff.as_str()), json!({"name": "Jidaigeki"})).await;
    let (status, body) = t
        .send(
            "PATCH",
            &format!("/genres/{}/", genre["id"]),
            Some(staff.as_str()),
            Some(json!({"name": null})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["name"], json!(["This field may not be null."]));

    let (_, film) = t
        .post("/films/", Some(staff.as_str()), json!({"title": "Harakiri", "year": 1962}))
        .await;
    let (status, body) = t
        .send(
            "PATCH",
            &format!("/films/{}/", film["id"]),
            Some(staff.as_str()),
            Some(json!({"title": null, "year": null, "duration": null})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], json!(["This field may not be null."]));
    assert_eq!(body["year"], json!(["This field may not be null."]));
    assert!(body.get("duration").is_none());

    let (_, unchanged) = t.get(&format!("/films/{}/", film["id"]), None).await;
    assert_eq!(unchanged["title"], "Harakiri");
}
