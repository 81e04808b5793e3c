use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use availability_cell::{SlotStore, SlotStoreError, SupabaseSlotStore};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

fn store_for(server: &MockServer) -> SupabaseSlotStore {
    let config = AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        clinic_timezone: "Europe/Brussels".to_string(),
        analytics_queue_depth: 16,
    };
    SupabaseSlotStore::new(Arc::new(SupabaseClient::new(&config)))
}

fn slot_row(dentist_id: Uuid, date: &str, time: &str, available: bool, emergency: bool) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "dentist_id": dentist_id,
        "slot_date": date,
        "slot_time": time,
        "is_available": available,
        "emergency_only": emergency,
    })
}

#[tokio::test]
async fn query_slots_parses_rows_in_range() {
    let server = MockServer::start().await;
    let dentist_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_slots"))
        .and(query_param("dentist_id", format!("eq.{}", dentist_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            slot_row(dentist_id, "2024-07-09", "10:00:00", true, false),
            slot_row(dentist_id, "2024-07-11", "14:00:00", false, false),
        ])))
        .mount(&server)
        .await;

    let slots = store_for(&server)
        .query_slots(
            Some(dentist_id),
            NaiveDate::from_ymd_opt(2024, 7, 7).unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 17).unwrap(),
            "token",
        )
        .await
        .unwrap();

    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].slot_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
    assert!(!slots[1].is_available);
}

#[tokio::test]
async fn reserve_slot_reports_lost_race() {
    let server = MockServer::start().await;
    let dentist_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/reserve_slot"))
        .and(body_partial_json(json!({ "slot_time": "10:00:00" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
        .mount(&server)
        .await;

    let result = store_for(&server)
        .reserve_slot(
            dentist_id,
            NaiveDate::from_ymd_opt(2024, 7, 9).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            Uuid::new_v4(),
            "token",
        )
        .await;

    assert_matches!(result, Err(SlotStoreError::SlotUnavailable));
}

#[tokio::test]
async fn reserve_slot_succeeds_when_claimed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/reserve_slot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .mount(&server)
        .await;

    let result = store_for(&server)
        .reserve_slot(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2024, 7, 9).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            Uuid::new_v4(),
            "token",
        )
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn release_slot_is_quiet_on_success() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/release_slot"))
        .and(body_partial_json(json!({ "appointment_id": appointment_id })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(1)))
        .expect(1)
        .mount(&server)
        .await;

    let result = store_for(&server).release_slot(appointment_id, "token").await;
    assert!(result.is_ok());
}
