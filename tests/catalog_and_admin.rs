mod common;

use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;

use common::{admin_user, approved_artist, bearer, create_user, send, test_state, token_for};
use folkstage::models::Role;

#[actix_web::test]
async fn art_forms_count_only_listed_artists() {
    let state = test_state().await;
    approved_artist(&state, "+9170001", "Mysuru Dollu", "Mysuru", "dollu-kunitha").await;

    let (status, forms) = send(&state, TestRequest::get().uri("/api/art-forms")).await;
    assert_eq!(status, StatusCode::OK);
    let forms = forms.as_array().unwrap();
    assert_eq!(forms.len(), 9);
    let dollu = forms
        .iter()
        .find(|form| form["slug"] == "dollu-kunitha")
        .unwrap();
    assert_eq!(dollu["artistCount"], 1);
    let yakshagana = forms.iter().find(|form| form["slug"] == "yakshagana").unwrap();
    assert_eq!(yakshagana["artistCount"], 0);

    let (status, detail) = send(&state, TestRequest::get().uri("/api/art-forms/dollu-kunitha")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["artists"][0]["groupName"], "Mysuru Dollu");

    let (status, _) = send(&state, TestRequest::get().uri("/api/art-forms/unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn search_filters_by_form_city_and_name() {
    let state = test_state().await;
    approved_artist(&state, "+9170011", "Coastal Yakshagana Mela", "Udupi", "yakshagana").await;
    approved_artist(&state, "+9170012", "City Drummers", "Bengaluru", "dollu-kunitha").await;

    let (_, all) = send(&state, TestRequest::get().uri("/api/artists")).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, by_form) = send(&state, TestRequest::get().uri("/api/artists?artForm=yakshagana")).await;
    assert_eq!(by_form.as_array().unwrap().len(), 1);
    assert_eq!(by_form[0]["groupName"], "Coastal Yakshagana Mela");
    assert!(by_form[0]["averageRating"].is_null());
    assert_eq!(by_form[0]["reviewCount"], 0);

    let (_, by_city) = send(&state, TestRequest::get().uri("/api/artists?city=bengal")).await;
    assert_eq!(by_city.as_array().unwrap().len(), 1);
    assert_eq!(by_city[0]["basedIn"], "Bengaluru");

    let (_, by_name) = send(&state, TestRequest::get().uri("/api/artists?search=DRUM")).await;
    assert_eq!(by_name[0]["groupName"], "City Drummers");

    let (_, path_form) = send(&state, TestRequest::get().uri("/api/artists/art-form/dollu-kunitha")).await;
    assert_eq!(path_form.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn profile_updates_are_owner_only() {
    let state = test_state().await;
    let artist = approved_artist(&state, "+9170021", "Huli Pack", "Mangaluru", "huli-vesha").await;
    let other = approved_artist(&state, "+9170022", "Other Pack", "Mangaluru", "huli-vesha").await;
    let yakshagana = common::art_form_id(&state, "yakshagana").await;

    let (status, updated) = send(
        &state,
        TestRequest::patch()
            .uri(&format!("/api/artists/{}", artist.profile_id))
            .insert_header(bearer(&artist.token))
            .set_json(json!({ "basePrice": 25000, "artFormIds": [yakshagana] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["basePrice"], 25000);
    assert_eq!(updated["groupName"], "Huli Pack");
    assert_eq!(updated["artForms"][0]["slug"], "yakshagana");

    let (status, body) = send(
        &state,
        TestRequest::patch()
            .uri(&format!("/api/artists/{}", artist.profile_id))
            .insert_header(bearer(&other.token))
            .set_json(json!({ "groupName": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can only update your own profile");
}

#[actix_web::test]
async fn admin_routes_require_an_admin_token() {
    let state = test_state().await;
    let client = create_user(&state, "+9170031", "Client", Role::Client).await;

    let (status, _) = send(&state, TestRequest::get().uri("/api/admin/stats")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &state,
        TestRequest::get()
            .uri("/api/admin/stats")
            .insert_header(bearer(&token_for(&state, &client))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn approval_workflow_and_stats() {
    let state = test_state().await;
    let admin = admin_user(&state).await;
    let admin_token = token_for(&state, &admin);
    let artist = approved_artist(&state, "+9170041", "Kamsale Group", "Mandya", "kamsale").await;

    let (_, pending) = send(
        &state,
        TestRequest::get()
            .uri("/api/admin/artists/pending")
            .insert_header(bearer(&admin_token)),
    )
    .await;
    // Approved but KYC still outstanding.
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["ownerPhone"], "+9170041");

    let (status, verified) = send(
        &state,
        TestRequest::patch()
            .uri(&format!("/api/admin/artists/{}/kyc", artist.profile_id))
            .insert_header(bearer(&admin_token))
            .set_json(json!({ "kycStatus": "VERIFIED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["kycStatus"], "VERIFIED");

    let (_, pending) = send(
        &state,
        TestRequest::get()
            .uri("/api/admin/artists/pending")
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert!(pending.as_array().unwrap().is_empty());

    let (status, rejected) = send(
        &state,
        TestRequest::patch()
            .uri(&format!("/api/admin/artists/{}/reject", artist.profile_id))
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["isApproved"], false);
    assert_eq!(rejected["isActive"], false);

    let (_, listed) = send(&state, TestRequest::get().uri("/api/artists")).await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, stats) = send(
        &state,
        TestRequest::get()
            .uri("/api/admin/stats")
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalUsers"], 2);
    assert_eq!(stats["totalArtists"], 1);
    assert_eq!(stats["approvedArtists"], 0);
    assert_eq!(stats["pendingArtists"], 1);
    assert_eq!(stats["totalBookings"], 0);

    let (_, activity) = send(
        &state,
        TestRequest::get()
            .uri("/api/admin/activity")
            .insert_header(bearer(&admin_token)),
    )
    .await;
    let kinds: Vec<&str> = activity
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"artist_approved"));
    assert!(kinds.contains(&"artist_rejected"));
}

#[actix_web::test]
async fn admin_booking_filter_validates_status() {
    let state = test_state().await;
    let admin_token = token_for(&state, &admin_user(&state).await);

    let (status, body) = send(
        &state,
        TestRequest::get()
            .uri("/api/admin/bookings?status=PENDING")
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid booking status: PENDING");

    let (status, body) = send(
        &state,
        TestRequest::get()
            .uri("/api/admin/bookings?status=REQUESTED")
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn art_forms_in_use_cannot_be_deleted() {
    let state = test_state().await;
    let admin_token = token_for(&state, &admin_user(&state).await);
    approved_artist(&state, "+9170051", "Veeragase Kala", "Hubballi", "veeragase").await;
    let veeragase = common::art_form_id(&state, "veeragase").await;

    let (status, body) = send(
        &state,
        TestRequest::delete()
            .uri(&format!("/api/admin/art-forms/{veeragase}"))
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot delete art form with linked artists");

    let (status, created) = send(
        &state,
        TestRequest::post()
            .uri("/api/admin/art-forms")
            .insert_header(bearer(&admin_token))
            .set_json(json!({ "name": "Somana Kunitha", "slug": "Somana-Kunitha", "region": "South Karnataka" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "somana-kunitha");
    let id = created["id"].as_str().unwrap();

    let (status, _) = send(
        &state,
        TestRequest::post()
            .uri("/api/admin/art-forms")
            .insert_header(bearer(&admin_token))
            .set_json(json!({ "name": "Duplicate", "slug": "somana-kunitha" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = send(
        &state,
        TestRequest::patch()
            .uri(&format!("/api/admin/art-forms/{id}"))
            .insert_header(bearer(&admin_token))
            .set_json(json!({ "category": "Dance" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["category"], "Dance");
    assert_eq!(updated["name"], "Somana Kunitha");

    let (status, _) = send(
        &state,
        TestRequest::delete()
            .uri(&format!("/api/admin/art-forms/{id}"))
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &state,
        TestRequest::delete()
            .uri(&format!("/api/admin/art-forms/{id}"))
            .insert_header(bearer(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn health_is_unauthenticated() {
    let state = test_state().await;
    let (status, _) = send(&state, TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
}
