//! The typed client against a live server on an ephemeral port.

mod common;

use actix_web::{App, HttpServer};
use serde_json::json;

use common::{art_form_id, test_state};
use folkstage::{
    client::{ApiClient, ClientError},
    configure_app,
    models::{BookingStatus, Role},
    state::AppState,
};

/// Starts the full app on 127.0.0.1 and returns its `/api` base URL.
fn serve(state: AppState) -> String {
    let server = HttpServer::new(move || App::new().configure(configure_app(state.clone())))
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .expect("bind ephemeral port");
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{addr}/api")
}

async fn login(state: &AppState, base_url: &str, phone: &str) -> ApiClient {
    let mut client = ApiClient::new(base_url);
    let sent = client.send_otp(phone).await.expect("send otp");
    assert_eq!(sent["success"], true);

    let code = state.otp.get(phone).expect("pending code").code;
    let session = client.verify_otp(phone, &code, None).await.expect("verify otp");
    assert_eq!(session.user.role, Role::Client);
    assert_eq!(client.token(), Some(session.token.as_str()));
    client
}

#[actix_web::test]
async fn client_drives_a_booking_and_surfaces_api_errors() {
    let state = test_state().await;
    let base_url = serve(state.clone());

    let mut troupe = login(&state, &base_url, "+9172001").await;
    let created = troupe
        .create_artist(&json!({
            "groupName": "Beesu Kamsale",
            "artFormIds": [art_form_id(&state, "kamsale").await],
            "basePrice": 18000,
            "serviceAreas": ["Mandya"],
            "basedIn": "Mandya"
        }))
        .await
        .expect("create artist");
    let profile_id = created.artist.profile.id.clone();
    assert_eq!(troupe.token(), Some(created.token.as_str()));
    assert_eq!(troupe.me().await.expect("me").user.role, Role::Artist);

    let organizer = login(&state, &base_url, "+9172002").await;
    let booking = organizer
        .create_booking(&json!({
            "artistProfileId": profile_id,
            "eventDate": "2026-12-24",
            "eventType": "Temple festival",
            "eventLocation": "Melukote"
        }))
        .await
        .expect("create booking");
    assert_eq!(booking.status, BookingStatus::Requested);

    let accepted = troupe
        .transition_booking(&booking.id, "accept")
        .await
        .expect("accept");
    assert_eq!(accepted.status, BookingStatus::Accepted);

    let month = organizer
        .availability(&profile_id, 2026, 12)
        .await
        .expect("month view");
    assert!(month.is_blocked("2026-12-24"));

    match troupe.transition_booking(&booking.id, "accept").await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(message, "Booking can only be accepted when in REQUESTED status");
        }
        other => panic!("expected an API error, got {other:?}"),
    }

    let mine = organizer.my_bookings().await.expect("my bookings");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].artist_name, "Beesu Kamsale");
}

#[actix_web::test]
async fn bodiless_errors_fall_back_to_a_generic_message() {
    let state = test_state().await;
    let base_url = serve(state.clone());

    // The admin guard answers a missing bearer with an empty 401.
    match ApiClient::new(&base_url).flagged_content().await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(message, "API request failed");
        }
        other => panic!("expected an API error, got {other:?}"),
    }

    let organizer = login(&state, &base_url, "+9172011").await;
    match organizer.booking("no-such-booking").await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(message, "Booking not found");
        }
        other => panic!("expected an API error, got {other:?}"),
    }
}
