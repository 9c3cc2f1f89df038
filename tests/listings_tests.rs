mod common;

use bqlkkt_content::documents::search_documents;
use bqlkkt_content::enterprises::search_enterprises;
use bqlkkt_content::models::{DocumentFilters, EnterpriseFilters, Language, QuestionFilters, QuestionKind, ScheduleFilters};
use bqlkkt_content::questions::fetch_questions;
use bqlkkt_content::schedule::fetch_schedule;
use bqlkkt_content::view_count::fetch_view_count;
use chrono::NaiveDate;
use common::{cms_client, collection, jsonapi, node};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn legal_document(id: &str, title: &str, category_id: u64) -> Value {
    json!({
        "id": id, "type": "node--legal_document",
        "attributes": { "title": title, "field_ngay_ban_hanh": "2024-06-01" },
        "relationships": {
            "field_cac_loai_van_ban": { "data": [{
                "type": "taxonomy_term--loai_van_ban", "id": format!("term-{category_id}"),
                "meta": { "drupal_internal__target_id": category_id }
            }] }
        }
    })
}

fn ids(listing: &bqlkkt_content::filters::Listing) -> Vec<&str> {
    listing.result.resources().iter().map(|r| r.id.as_str()).collect()
}

#[tokio::test]
async fn document_category_is_filtered_client_side() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vi/jsonapi/node/legal_document"))
        .and(query_param("page[limit]", "5"))
        .respond_with(jsonapi(collection(vec![
            legal_document("d-16", "Thủ tục hành chính", 16),
            legal_document("d-17", "Quy hoạch phân khu", 17),
            legal_document("d-18", "Ưu đãi đầu tư", 18),
        ])))
        .mount(&server)
        .await;

    let filters = DocumentFilters {
        category: Some("cai-cach-hanh-chinh".into()),
        ..Default::default()
    };
    let listing = assert_ok!(search_documents(&cms_client(&server), Language::Vi, &filters).await);
    assert_eq!(ids(&listing), vec!["d-16"]);
    assert_eq!(listing.pagination.total_results, 1);
}

#[tokio::test]
async fn unknown_document_category_keeps_every_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vi/jsonapi/node/legal_document"))
        .respond_with(jsonapi(collection(vec![
            legal_document("d-16", "A", 16),
            legal_document("d-17", "B", 17),
        ])))
        .mount(&server)
        .await;

    let filters = DocumentFilters {
        category: Some("khong-co".into()),
        ..Default::default()
    };
    let listing = assert_ok!(search_documents(&cms_client(&server), Language::Vi, &filters).await);
    assert_eq!(ids(&listing), vec!["d-16", "d-17"]);
}

#[tokio::test]
async fn document_search_falls_back_to_client_side_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vi/jsonapi/node/legal_document"))
        .and(query_param("filter[title][value]", "quy hoạch"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vi/jsonapi/node/legal_document"))
        .respond_with(jsonapi(collection(vec![
            legal_document("d-1", "Quy hoạch chung khu kinh tế", 17),
            legal_document("d-2", "Báo cáo lao động", 20),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let filters = DocumentFilters {
        keyword: Some("quy hoạch".into()),
        ..Default::default()
    };
    let listing = assert_ok!(search_documents(&cms_client(&server), Language::Vi, &filters).await);
    assert_eq!(ids(&listing), vec!["d-1"]);
    assert_eq!(listing.pagination.total_results, 1);
}

#[tokio::test]
async fn document_search_propagates_when_every_tier_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/en/jsonapi/node/legal_document"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = assert_err!(search_documents(&cms_client(&server), Language::En, &DocumentFilters::default()).await);
    assert!(err.is_retryable());
    assert!(err.to_string().starts_with("No se pudieron buscar los documentos"));
}

#[tokio::test]
async fn enterprise_industry_falls_back_to_included_term_names() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vi/jsonapi/node/listed_enterprise"))
        .and(query_param("filter[field_nganh_nghe.name]", "Dệt may"))
        .respond_with(ResponseTemplate::new(400))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vi/jsonapi/node/listed_enterprise"))
        .respond_with(jsonapi(json!({
            "data": [
                {
                    "id": "e-1", "type": "node--listed_enterprise", "attributes": { "title": "Công ty A" },
                    "relationships": { "field_nganh_nghe": { "data": { "type": "taxonomy_term--nganh_nghe", "id": "t-1" } } }
                },
                {
                    "id": "e-2", "type": "node--listed_enterprise", "attributes": { "title": "Công ty B" },
                    "relationships": { "field_nganh_nghe": { "data": { "type": "taxonomy_term--nganh_nghe", "id": "t-2" } } }
                }
            ],
            "included": [
                { "id": "t-1", "type": "taxonomy_term--nganh_nghe", "attributes": { "name": "Dệt may" } },
                { "id": "t-2", "type": "taxonomy_term--nganh_nghe", "attributes": { "name": "Điện tử" } }
            ]
        })))
        .mount(&server)
        .await;

    let filters = EnterpriseFilters {
        industry: Some("Dệt may".into()),
        ..Default::default()
    };
    let listing = assert_ok!(search_enterprises(&cms_client(&server), Language::Vi, &filters).await);
    assert_eq!(ids(&listing), vec!["e-1"]);
}

fn question(id: &str, status: &str) -> Value {
    node("node--question", id, json!({ "title": format!("Câu hỏi {id}"), "field_trang_thai": status }))
}

#[tokio::test]
async fn questions_are_partitioned_by_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vi/jsonapi/node/question"))
        .respond_with(jsonapi(collection(vec![
            question("q-1", "da_tra_loi"),
            question("q-2", "cho_duyet"),
            question("q-3", "da_cong_khai"),
        ])))
        .mount(&server)
        .await;
    let client = cms_client(&server);

    let qa = assert_ok!(fetch_questions(&client, Language::Vi, &QuestionFilters::default()).await);
    assert_eq!(ids(&qa), vec!["q-1", "q-2"]);

    let faq_filters = QuestionFilters {
        kind: QuestionKind::Faq,
        ..Default::default()
    };
    let faq = assert_ok!(fetch_questions(&client, Language::Vi, &faq_filters).await);
    assert_eq!(ids(&faq), vec!["q-3"]);
    assert_eq!(faq.pagination.total_results, 1);
}

fn schedule_item(id: &str, date: &str) -> Value {
    node("node--schedule_item", id, json!({ "title": id, "field_ngay": date }))
}

#[tokio::test]
async fn schedule_is_narrowed_to_the_end_date() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vi/jsonapi/node/schedule_item"))
        .and(query_param("filter[field_ngay][operator]", ">="))
        .and(query_param("filter[field_ngay][value]", "2025-03-01"))
        .respond_with(jsonapi(collection(vec![
            schedule_item("s-1", "2025-03-01"),
            schedule_item("s-2", "2025-03-10T08:00:00+07:00"),
            schedule_item("s-3", "2025-04-01"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let filters = ScheduleFilters {
        start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
        end_date: NaiveDate::from_ymd_opt(2025, 3, 15),
    };
    let result = assert_ok!(fetch_schedule(&cms_client(&server), Language::Vi, &filters).await);
    let kept: Vec<&str> = result.resources().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(kept, vec!["s-1", "s-2"]);
}

#[tokio::test]
async fn view_count_reads_the_first_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/view-count/42"))
        .and(query_param("_format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "nid": 42, "totalcount": "1337", "uuid": "c0ffee" }
        ])))
        .mount(&server)
        .await;

    let count = fetch_view_count(&cms_client(&server), "42").await;
    assert_eq!(count.nid, "42");
    assert_eq!(count.totalcount, 1337);
    assert_eq!(count.uuid, "c0ffee");
}

#[tokio::test]
async fn view_count_server_error_is_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/view-count/42"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let count = fetch_view_count(&cms_client(&server), "42").await;
    assert_eq!(count.totalcount, 0);
    assert_eq!(count.nid, "42");
    assert!(count.uuid.is_empty());
}
