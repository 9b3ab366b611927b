mod common;

use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};

use common::{admin_user, approved_artist, bearer, create_user, send, test_state, token_for, Artist};
use folkstage::{models::Role, state::AppState};

async fn add_photo(state: &AppState, artist: &Artist, url: &str) -> String {
    let (status, media) = send(
        state,
        TestRequest::post()
            .uri("/api/media")
            .insert_header(bearer(&artist.token))
            .set_json(json!({ "type": "PHOTO", "url": url, "caption": "On stage" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    media["id"].as_str().unwrap().to_string()
}

async fn gallery(state: &AppState, artist: &Artist) -> Vec<Value> {
    let (status, body) = send(
        state,
        TestRequest::get().uri(&format!("/api/media/artist/{}", artist.profile_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body.as_array().unwrap().clone()
}

#[actix_web::test]
async fn new_media_is_appended_to_the_gallery() {
    let state = test_state().await;
    let artist = approved_artist(&state, "+9171001", "Pata Troupe", "Mandya", "pata-kunitha").await;

    add_photo(&state, &artist, "https://cdn.example.com/a.jpg").await;
    add_photo(&state, &artist, "https://cdn.example.com/b.jpg").await;

    let items = gallery(&state, &artist).await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["sortOrder"], 0);
    assert_eq!(items[1]["sortOrder"], 1);
    assert_eq!(items[1]["type"], "PHOTO");

    let (status, _) = send(
        &state,
        TestRequest::post()
            .uri("/api/media")
            .insert_header(bearer(&artist.token))
            .set_json(json!({ "type": "VIDEO_LINK", "url": "ftp://example.com/show" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &state,
        TestRequest::post()
            .uri("/api/media")
            .insert_header(bearer(&artist.token))
            .set_json(json!({ "type": "VIDEO_LINK", "url": "httpfoo:show" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, video) = send(
        &state,
        TestRequest::post()
            .uri("/api/media")
            .insert_header(bearer(&artist.token))
            .set_json(json!({ "type": "VIDEO_LINK", "url": "https://youtu.be/pata" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(video["type"], "VIDEO_LINK");
    assert_eq!(video["sortOrder"], 2);
}

#[actix_web::test]
async fn reorder_rewrites_only_the_callers_sequence() {
    let state = test_state().await;
    let artist = approved_artist(&state, "+9171011", "Chenda Group", "Udupi", "chenda-melam").await;
    let other = approved_artist(&state, "+9171012", "Rival Group", "Udupi", "chenda-melam").await;

    let a = add_photo(&state, &artist, "https://cdn.example.com/a.jpg").await;
    let b = add_photo(&state, &artist, "https://cdn.example.com/b.jpg").await;
    let c = add_photo(&state, &artist, "https://cdn.example.com/c.jpg").await;
    let foreign = add_photo(&state, &other, "https://cdn.example.com/x.jpg").await;

    let (status, reordered) = send(
        &state,
        TestRequest::patch()
            .uri("/api/media/reorder")
            .insert_header(bearer(&artist.token))
            .set_json(json!({ "orderedIds": [c, a, b, foreign] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = reordered
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![c.as_str(), a.as_str(), b.as_str()]);

    let items = gallery(&state, &artist).await;
    let orders: Vec<i64> = items.iter().map(|item| item["sortOrder"].as_i64().unwrap()).collect();
    assert_eq!(orders, vec![0, 1, 2]);

    let others = gallery(&state, &other).await;
    assert_eq!(others.len(), 1);
    assert_eq!(others[0]["id"], foreign.as_str());
    assert_eq!(others[0]["sortOrder"], 0);
}

#[actix_web::test]
async fn only_the_owner_can_remove_media() {
    let state = test_state().await;
    let artist = approved_artist(&state, "+9171021", "Gombe Makers", "Ramanagara", "garudi-gombe").await;
    let other = approved_artist(&state, "+9171022", "Someone Else", "Ramanagara", "garudi-gombe").await;
    let id = add_photo(&state, &artist, "https://cdn.example.com/g.jpg").await;

    let (status, body) = send(
        &state,
        TestRequest::delete()
            .uri(&format!("/api/media/{id}"))
            .insert_header(bearer(&other.token)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can only remove your own media");

    let (status, removed) = send(
        &state,
        TestRequest::delete()
            .uri(&format!("/api/media/{id}"))
            .insert_header(bearer(&artist.token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(removed["removedAt"].is_string());
    assert!(gallery(&state, &artist).await.is_empty());

    let (status, _) = send(
        &state,
        TestRequest::delete()
            .uri(&format!("/api/media/{id}"))
            .insert_header(bearer(&artist.token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn upload_urls_need_configured_storage() {
    let state = test_state().await;
    let artist = approved_artist(&state, "+9171031", "Kunitha Crew", "Mysuru", "pooja-kunitha").await;

    let (status, body) = send(
        &state,
        TestRequest::post()
            .uri("/api/media/upload-url")
            .insert_header(bearer(&artist.token))
            .set_json(json!({ "filename": "stage.jpg", "contentType": "image/jpeg" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "File upload is not configured");
}

#[actix_web::test]
async fn flagged_media_stays_in_the_gallery_until_removed() {
    let state = test_state().await;
    let admin_token = token_for(&state, &admin_user(&state).await);
    let artist = approved_artist(&state, "+9171041", "Huli Kunitha", "Udupi", "huli-vesha").await;
    let id = add_photo(&state, &artist, "https://cdn.example.com/h.jpg").await;

    let (status, flagged) = send(
        &state,
        TestRequest::patch()
            .uri(&format!("/api/admin/moderation/media/{id}/flag"))
            .insert_header(bearer(&admin_token))
            .set_json(json!({ "reason": "inappropriate" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flagged["flagReason"], "inappropriate");

    let (_, queue) = send(
        &state,
        TestRequest::get()
            .uri("/api/admin/moderation")
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(queue["media"].as_array().unwrap().len(), 1);
    assert_eq!(queue["media"][0]["id"], id.as_str());
    assert!(queue["reviews"].as_array().unwrap().is_empty());

    let (status, unflagged) = send(
        &state,
        TestRequest::patch()
            .uri(&format!("/api/admin/moderation/media/{id}/unflag"))
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(unflagged["flaggedAt"].is_null());
    assert!(unflagged["flagReason"].is_null());

    let (_, queue) = send(
        &state,
        TestRequest::get()
            .uri("/api/admin/moderation")
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert!(queue["media"].as_array().unwrap().is_empty());
    assert_eq!(gallery(&state, &artist).await.len(), 1);

    // A flag without a body still records the flag.
    let (status, reflagged) = send(
        &state,
        TestRequest::patch()
            .uri(&format!("/api/admin/moderation/media/{id}/flag"))
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(reflagged["flaggedAt"].is_string());
    assert!(reflagged["flagReason"].is_null());

    let (status, removed) = send(
        &state,
        TestRequest::patch()
            .uri(&format!("/api/admin/moderation/media/{id}/remove"))
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(removed["removedAt"].is_string());
    assert!(gallery(&state, &artist).await.is_empty());

    let (_, queue) = send(
        &state,
        TestRequest::get()
            .uri("/api/admin/moderation")
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert!(queue["media"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn moderation_rejects_unknown_targets_and_ids() {
    let state = test_state().await;
    let admin_token = token_for(&state, &admin_user(&state).await);

    let (status, _) = send(
        &state,
        TestRequest::patch()
            .uri("/api/admin/moderation/users/abc/flag")
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &state,
        TestRequest::patch()
            .uri("/api/admin/moderation/reviews/missing/remove")
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Books, completes and reviews one event; returns the review id.
async fn completed_review(state: &AppState, artist: &Artist, rating: i64) -> String {
    let client = create_user(state, "+9171061", "Deepa", Role::Client).await;
    let client_token = token_for(state, &client);

    let (status, booking) = send(
        state,
        TestRequest::post()
            .uri("/api/bookings")
            .insert_header(bearer(&client_token))
            .set_json(json!({
                "artistProfileId": artist.profile_id,
                "eventDate": "2026-10-02",
                "eventType": "Dasara procession",
                "eventLocation": "Mysuru"
            })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let booking_id = booking["id"].as_str().unwrap().to_string();

    for action in ["accept", "complete"] {
        let (status, _) = send(
            state,
            TestRequest::patch()
                .uri(&format!("/api/bookings/{booking_id}/{action}"))
                .insert_header(bearer(&artist.token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, review) = send(
        state,
        TestRequest::post()
            .uri("/api/reviews")
            .insert_header(bearer(&client_token))
            .set_json(json!({ "bookingId": booking_id, "rating": rating, "comment": "Loud and lively" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    review["id"].as_str().unwrap().to_string()
}

async fn rating_of(state: &AppState, artist: &Artist) -> (Value, Value) {
    let (status, detail) = send(
        state,
        TestRequest::get().uri(&format!("/api/artists/{}", artist.profile_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (detail["averageRating"].clone(), detail["reviewCount"].clone())
}

#[actix_web::test]
async fn flagged_reviews_count_until_removed() {
    let state = test_state().await;
    let admin_token = token_for(&state, &admin_user(&state).await);
    let artist = approved_artist(&state, "+9171060", "Dasara Dollu", "Mysuru", "dollu-kunitha").await;
    let review_id = completed_review(&state, &artist, 2).await;

    let (status, flagged) = send(
        &state,
        TestRequest::patch()
            .uri(&format!("/api/admin/moderation/reviews/{review_id}/flag"))
            .insert_header(bearer(&admin_token))
            .set_json(json!({ "reason": "abusive" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flagged["flagReason"], "abusive");

    let (_, queue) = send(
        &state,
        TestRequest::get()
            .uri("/api/admin/moderation")
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(queue["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(queue["reviews"][0]["id"], review_id.as_str());
    assert_eq!(rating_of(&state, &artist).await, (json!(2.0), json!(1)));

    let (status, unflagged) = send(
        &state,
        TestRequest::patch()
            .uri(&format!("/api/admin/moderation/reviews/{review_id}/unflag"))
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(unflagged["flaggedAt"].is_null());

    let (status, removed) = send(
        &state,
        TestRequest::patch()
            .uri(&format!("/api/admin/moderation/reviews/{review_id}/remove"))
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(removed["removedAt"].is_string());

    let (status, listed) = send(
        &state,
        TestRequest::get().uri(&format!("/api/reviews/artist/{}", artist.profile_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed.as_array().unwrap().is_empty());

    let (average, count) = rating_of(&state, &artist).await;
    assert!(average.is_null());
    assert_eq!(count, 0);

    let (_, queue) = send(
        &state,
        TestRequest::get()
            .uri("/api/admin/moderation")
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert!(queue["reviews"].as_array().unwrap().is_empty());
}
