/// Integration tests with mocked external APIs
/// Tests the complete analysis workflow without hitting the real OCR service
use datalens_demo::analysis::DocumentAnalyzer;
use datalens_demo::config::Config;
use datalens_demo::documents::UploadedDocument;
use datalens_demo::errors::AppError;
use datalens_demo::models::{
    AnalysisOutcome, Commodity, CustomerType, DocumentCategory, Language, Projection, Selection,
};
use datalens_demo::ocr_client::OcrClient;
use datalens_demo::schema::SchemaRegistry;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create test config pointing every URL at the mock server
fn create_test_config(base_url: &str) -> Config {
    Config {
        port: 8501,
        api_key: "test_api_key".to_string(),
        api_url_id: format!("{}/id", base_url),
        api_url_invoices: format!("{}/invoices", base_url),
        auth_url: format!("{}/oauth/token", base_url),
        auth_client_id: "demo-client".to_string(),
        auth_client_secret: "demo-secret".to_string(),
        upstream_timeout_secs: 10,
        default_language: Language::It,
    }
}

async fn mount_token(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "client_credentials"))
        .and(body_string_contains("client_id=demo-client"))
        .and(body_string_contains("client_secret=demo-secret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-123",
                "token_type": "Bearer",
                "expires_in": 3600
            })),
        )
        .mount(mock_server)
        .await;
}

fn analyzer(config: &Config) -> DocumentAnalyzer {
    DocumentAnalyzer::new(
        OcrClient::new(config).unwrap(),
        Arc::new(SchemaRegistry::builtin()),
    )
}

#[tokio::test]
async fn test_fetch_access_token() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;

    let client = OcrClient::new(&create_test_config(&mock_server.uri())).unwrap();
    let token = client.fetch_access_token().await.unwrap();

    assert_eq!(token, "tok-123");
}

#[tokio::test]
async fn test_token_without_access_token_is_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "nope"})))
        .mount(&mock_server)
        .await;

    let client = OcrClient::new(&create_test_config(&mock_server.uri())).unwrap();
    let result = client.fetch_access_token().await;

    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn test_token_rejected_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(&mock_server)
        .await;

    let client = OcrClient::new(&create_test_config(&mock_server.uri())).unwrap();
    match client.fetch_access_token().await {
        Err(AppError::Unauthorized(msg)) => assert!(msg.contains("invalid_client")),
        other => panic!("expected Unauthorized, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invoice_analysis_end_to_end() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/invoices"))
        .and(query_param("commodity", "gas"))
        .and(query_param("customer_type", "residenziale"))
        .and(header("x-api-key", "test_api_key"))
        .and(header("authorization", "Bearer tok-123"))
        .and(header("content-type", "application/pdf"))
        .and(header("language", "it"))
        .and(body_string_contains("%PDF-1.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "extracted_fields": {
                "name": "Mario",
                "pdr": "",
                "gas_total_annual_consumption": "1200",
                "pod": "IT001E12345678"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let documents = vec![UploadedDocument::new("bolletta.pdf", b"%PDF-1.4 test".to_vec())];

    let report = analyzer(&config)
        .analyze(Selection::default(), &documents)
        .await
        .unwrap();

    assert_eq!(report.upstream_status, 200);
    assert_eq!(report.documents[0].content_type, "application/pdf");

    let AnalysisOutcome::Projected { projection, .. } = &report.outcome else {
        panic!("expected projected outcome");
    };
    let pairs: Vec<_> = projection
        .entries()
        .iter()
        .map(|e| (e.label.as_str(), e.value.clone()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Name", serde_json::json!("Mario")),
            ("Total annual gas consumption", serde_json::json!("1200")),
        ]
    );
}

#[tokio::test]
async fn test_invoice_response_is_sanitized() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/invoices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "extracted_fields": {"company_name": "<script>alert(1)</script> & Co"}
        })))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let selection = Selection {
        customer_type: CustomerType::Microbusiness,
        commodity: Commodity::Dual,
        language: Language::Es,
        ..Selection::default()
    };
    let documents = vec![UploadedDocument::new("fattura.png", vec![0x89, 0x50, 0x4e, 0x47])];

    let report = analyzer(&config).analyze(selection, &documents).await.unwrap();

    let AnalysisOutcome::Projected { projection, data } = &report.outcome else {
        panic!("expected projected outcome");
    };
    assert_eq!(
        projection.entries()[0].value,
        serde_json::json!("&lt;script&gt;alert(1)&lt;/script&gt; &amp; Co")
    );
    assert_eq!(
        data["extracted_fields"]["company_name"],
        projection.entries()[0].value
    );
}

#[tokio::test]
async fn test_undecodable_response_falls_back_to_text() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/invoices"))
        .respond_with(ResponseTemplate::new(504).set_body_string("<h1>Gateway Timeout</h1>"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let documents = vec![UploadedDocument::new("bolletta.pdf", b"%PDF".to_vec())];

    let report = analyzer(&config)
        .analyze(Selection::default(), &documents)
        .await
        .unwrap();

    assert_eq!(report.upstream_status, 504);
    assert_eq!(
        report.outcome,
        AnalysisOutcome::Undecodable {
            raw_text: "&lt;h1&gt;Gateway Timeout&lt;/h1&gt;".to_string()
        }
    );
}

#[tokio::test]
async fn test_identity_documents_sent_as_multipart() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/id"))
        .and(header("x-api-key", "test_api_key"))
        .and(body_string_contains("name=\"files\"; filename=\"front.jpg\""))
        .and(body_string_contains("name=\"files\"; filename=\"back.jpg\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tipo_documento": "carta_identita",
            "campi_documento": {"nome": "Anna", "cognome": "Bianchi", "data_scadenza": ""},
            "dati_validi": true
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let selection = Selection {
        category: DocumentCategory::Identity,
        ..Selection::default()
    };
    let documents = vec![
        UploadedDocument::new("front.jpg", b"JFIF front".to_vec()),
        UploadedDocument::new("back.jpg", b"JFIF back".to_vec()),
    ];

    let report = analyzer(&config).analyze(selection, &documents).await.unwrap();

    let AnalysisOutcome::Projected { projection, .. } = &report.outcome else {
        panic!("expected projected outcome");
    };
    let labels: Vec<_> = projection.entries().iter().map(|e| e.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["Name", "Surname", "Type of document", "Document validity"]
    );
}

#[tokio::test]
async fn test_missing_fields_render_empty_state() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/invoices"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(serde_json::json!({"detail": "unreadable"})),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let documents = vec![UploadedDocument::new("bolletta.pdf", b"%PDF".to_vec())];

    let report = analyzer(&config)
        .analyze(Selection::default(), &documents)
        .await
        .unwrap();

    assert!(matches!(
        report.outcome,
        AnalysisOutcome::Projected {
            projection: Projection::NothingToDisplay,
            ..
        }
    ));
}

#[tokio::test]
async fn test_validation_happens_before_any_call() {
    let mock_server = MockServer::start().await;

    // No request may reach the mock server
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let documents = vec![UploadedDocument::new("notes.txt", b"hello".to_vec())];

    let result = analyzer(&config)
        .analyze(Selection::default(), &documents)
        .await;

    assert!(matches!(result, Err(AppError::UnsupportedMediaType(_))));
}
