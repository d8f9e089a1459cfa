use std::time::Duration;

use gestibank_client::dto::{
    CommentRequest, DemandValidateRequest, FileUpload, LoginRequest, PurchaseOrderUpload,
    QuoteCreateRequest,
};
use gestibank_client::{BackendError, HttpBackend, Page, ProcurementBackend};
use gestibank_core::domain::{
    CommentDraft, CommentType, DemandId, DemandStatus, QuoteId, QuoteStatus,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(server.uri(), Duration::from_secs(5))
        .expect("client builds")
        .with_token(SecretString::from("test-token".to_string()))
}

fn demand_json(id: i64, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Laptops",
        "description": "Replacement laptops for the branch",
        "articles": [{"id": 3, "name": "Laptop", "quantity": 4, "description": "14 inch"}],
        "status": status,
        "createdAt": "2026-03-02T09:30:00Z",
        "createdBy": {"id": 1, "firstName": "Amal", "lastName": "Idrissi", "email": "agent@bank.ma"},
        "comments": []
    })
}

#[tokio::test]
async fn login_posts_credentials_and_returns_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "agent@bank.ma", "password": "secret1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "jwt-value"})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri(), Duration::from_secs(5)).expect("client builds");
    let request =
        LoginRequest { email: "agent@bank.ma".to_string(), password: "secret1".to_string() };
    let token = backend.login(&request).await.expect("login succeeds");

    assert_eq!(token, "jwt-value");
}

#[tokio::test]
async fn list_demands_sends_bearer_token_and_page_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/demands"))
        .and(query_param("page", "1"))
        .and(query_param("size", "20"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([demand_json(7, "CREATED"), demand_json(8, "DONE")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let demands = backend(&server)
        .list_demands(Page { page: 1, size: 20 })
        .await
        .expect("list succeeds");

    assert_eq!(demands.len(), 2);
    assert_eq!(demands[0].id, DemandId(7));
    assert_eq!(demands[0].articles[0].quantity, 4);
    assert_eq!(demands[1].status, DemandStatus::Done);
}

#[tokio::test]
async fn quote_response_maps_embedded_demand_and_creator() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quotes/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "totalAmount": 12500.5,
            "status": "APPROVED",
            "demand": demand_json(7, "TECHNICIAN_APPROVED"),
            "createdBy": {"id": 4, "firstName": "Youssef", "lastName": "Alami", "email": "provider@supply.ma"},
            "comments": []
        })))
        .mount(&server)
        .await;

    let quote = backend(&server).get_quote(QuoteId(12)).await.expect("quote decodes");

    assert_eq!(quote.demand_id, DemandId(7));
    assert_eq!(quote.status, QuoteStatus::Approved);
    assert_eq!(quote.total_amount, Decimal::new(125005, 1));
    assert!(quote.is_owned_by("PROVIDER@supply.ma"));
}

#[tokio::test]
async fn validate_demand_posts_verdict_and_comment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/demands/validate"))
        .and(body_json(json!({
            "demandStatus": "REJECTED",
            "comment": {"content": "Budget insuffisant", "type": "REJECTED", "demandId": 7}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(demand_json(7, "RESPONSIBLE_REJECTED")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = DemandValidateRequest {
        demand_status: CommentType::Rejected,
        comment: CommentRequest::new(
            CommentDraft::rejected("Budget insuffisant"),
            DemandId(7),
            None,
        ),
    };
    let demand = backend(&server).validate_demand(&request).await.expect("validate succeeds");

    assert_eq!(demand.status, DemandStatus::ResponsibleRejected);
}

#[tokio::test]
async fn create_quote_posts_amount_as_number() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/quotes"))
        .and(body_json(json!({"totalAmount": 12500.0, "demandId": 7})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 30,
            "totalAmount": 12500.0,
            "status": "CREATED",
            "demandId": 7
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = QuoteCreateRequest { total_amount: Decimal::new(1250000, 2), demand_id: DemandId(7) };
    let quote = backend(&server).create_quote(&request).await.expect("quote created");

    assert_eq!(quote.id, QuoteId(30));
    assert_eq!(quote.status, QuoteStatus::Created);
}

#[tokio::test]
async fn purchase_order_is_uploaded_as_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/quotes/manage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "totalAmount": 900,
            "status": "APPROVED",
            "demandId": 7,
            "bonCommand": "bon-12.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let upload = PurchaseOrderUpload {
        quote_id: QuoteId(12),
        file: FileUpload::new("bon-12.pdf", b"%PDF-1.4".to_vec()),
    };
    let quote = backend(&server).attach_purchase_order(&upload).await.expect("upload succeeds");
    assert!(quote.has_purchase_order());

    let requests = server.received_requests().await.expect("recording enabled");
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = String::from_utf8_lossy(&requests[0].body).to_string();
    assert!(content_type.starts_with("multipart/form-data"));
    assert!(body.contains("name=\"quoteId\""));
    assert!(body.contains("filename=\"bon-12.pdf\""));
}

#[tokio::test]
async fn error_status_surfaces_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/quotes/validate"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "statusCode": 403,
            "timestamp": "2026-03-02T09:30:00Z",
            "message": "Access denied",
            "description": "uri=/api/v1/quotes/validate",
            "errors": null
        })))
        .mount(&server)
        .await;

    let request = gestibank_client::dto::QuoteValidateRequest {
        quote_status: CommentType::Approved,
        comment: CommentRequest::new(
            CommentDraft::approved("Quote approved"),
            DemandId(7),
            Some(QuoteId(12)),
        ),
    };
    let error = backend(&server).validate_quote(&request).await.expect_err("forbidden");

    assert_eq!(error.status(), Some(403));
    match error {
        BackendError::Status { message, .. } => assert_eq!(message, "Access denied"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statistics/provider"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let error = backend(&server).provider_statistics().await.expect_err("not json");
    assert!(matches!(error, BackendError::Decode(_)));
}
