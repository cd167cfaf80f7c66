use pipette_core::model::CellValue;
use storage::StorageError;
use storage::repository::TabularStore;
use storage::sheets::{SheetsClient, SheetsConfig};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SPREADSHEET: &str = "class-2026";
const SHEET_PATH: &str = "/v4/spreadsheets/class-2026";
const APPEND_PATH: &str = "/v4/spreadsheets/class-2026/values/Progress!A1:append";

fn client(server: &MockServer) -> SheetsClient {
    SheetsClient::new(SheetsConfig::new(server.uri(), SPREADSHEET, "test-token")).unwrap()
}

async fn mount_sheet_listing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sheets": [
                {"properties": {"title": "Progress"}},
                {"properties": {"title": "Roster"}}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn appends_one_row_per_call() {
    let server = MockServer::start().await;
    mount_sheet_listing(&server).await;

    Mock::given(method("POST"))
        .and(path(APPEND_PATH))
        .and(query_param("valueInputOption", "RAW"))
        .and(query_param("insertDataOption", "INSERT_ROWS"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_json(serde_json::json!({"values": [["Ada", 0.25]]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "updates": {"updatedRows": 1}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let sheet = client(&server).open_sheet("Progress").await.unwrap();
    let row = vec![CellValue::Text("Ada".into()), CellValue::Number(0.25)];
    sheet.append_row(&row).await.unwrap();
    sheet.append_row(&row).await.unwrap();
}

#[tokio::test]
async fn missing_sheet_title_is_not_found() {
    let server = MockServer::start().await;
    mount_sheet_listing(&server).await;

    let err = client(&server).open_sheet("Period 4").await.err().unwrap();
    assert!(matches!(err, StorageError::SheetNotFound(name) if name == "Period 4"));
}

#[tokio::test]
async fn rejected_credentials_are_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server).open_sheet("Progress").await.err().unwrap();
    assert!(matches!(err, StorageError::Unauthorized(401)));
    assert!(err.is_unavailable());
}

#[tokio::test]
async fn server_errors_on_append_are_unavailable() {
    let server = MockServer::start().await;
    mount_sheet_listing(&server).await;
    Mock::given(method("POST"))
        .and(path(APPEND_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend down"))
        .mount(&server)
        .await;

    let sheet = client(&server).open_sheet("Progress").await.unwrap();
    let err = sheet
        .append_row(&[CellValue::Text("Ada".into())])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Unavailable(_)));
}

#[tokio::test]
async fn unreachable_host_is_unavailable() {
    let config = SheetsConfig::new("http://127.0.0.1:9", SPREADSHEET, "test-token");
    let err = SheetsClient::new(config)
        .unwrap()
        .open_sheet("Progress")
        .await
        .err()
        .unwrap();
    assert!(matches!(err, StorageError::Unavailable(_)));
}
