use anyhow::Result;
use edlists::{
    fetch::download::{download_spreadsheet, INSTRUCTIONS_FILE, MIN_SPREADSHEET_BYTES},
    pipeline::{run_spreadsheet_download, Outcome},
    SourceDescriptor,
};
use std::fs;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn fake_xlsx(len: usize) -> Vec<u8> {
    let mut body = b"PK\x03\x04".to_vec();
    body.resize(len, 0);
    body
}

fn source(server: &MockServer, name: &str, page: &str) -> SourceDescriptor {
    SourceDescriptor {
        name: name.to_string(),
        url: format!("{}{}", server.uri(), page),
        description: "test".to_string(),
    }
}

async fn mount(server: &MockServer, url_path: &str, resp: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(resp)
        .mount(server)
        .await;
}

#[tokio::test]
async fn skips_bad_candidates_and_saves_first_real_spreadsheet() -> Result<()> {
    let server = MockServer::start().await;
    let page = r#"<html><body>
        <a href="/files/tiny.xlsx">tiny</a>
        <a href="/files/list-i.xlsx">full</a>
    </body></html>"#;
    mount(&server, "/list-i", ResponseTemplate::new(200).set_body_raw(page, "text/html")).await;
    mount(
        &server,
        "/files/tiny.xlsx",
        ResponseTemplate::new(200).set_body_raw(fake_xlsx(MIN_SPREADSHEET_BYTES), XLSX_MIME),
    )
    .await;
    mount(
        &server,
        "/files/list-i.xlsx",
        ResponseTemplate::new(200).set_body_raw(fake_xlsx(4096), XLSX_MIME),
    )
    .await;

    let tmp = tempfile::tempdir()?;
    let client = reqwest::Client::new();
    let list_i = source(&server, "list_i_eu_identified", "/list-i");
    let saved = download_spreadsheet(&client, &list_i, tmp.path())
        .await?
        .expect("a spreadsheet should be saved");

    assert_eq!(saved, tmp.path().join("list_i_eu_identified.xlsx"));
    assert_eq!(fs::read(&saved)?.len(), 4096);
    Ok(())
}

#[tokio::test]
async fn html_error_pages_are_not_accepted() -> Result<()> {
    let server = MockServer::start().await;
    let page = r#"<a href="/export/list-ii">Export</a>"#;
    mount(&server, "/list-ii", ResponseTemplate::new(200).set_body_raw(page, "text/html")).await;
    mount(
        &server,
        "/export/list-ii",
        ResponseTemplate::new(200).set_body_raw("<html>".repeat(500), "text/html"),
    )
    .await;

    let tmp = tempfile::tempdir()?;
    let client = reqwest::Client::new();
    let list_ii = source(&server, "list_ii_under_evaluation", "/list-ii");
    let saved = download_spreadsheet(&client, &list_ii, tmp.path()).await?;
    assert!(saved.is_none());
    assert!(!tmp.path().join("list_ii_under_evaluation.xlsx").exists());
    Ok(())
}

#[tokio::test]
async fn writes_instructions_when_every_source_fails() -> Result<()> {
    let server = MockServer::start().await;
    let no_links = ResponseTemplate::new(200).set_body_raw("<p>no links</p>", "text/html");
    mount(&server, "/list-i", no_links).await;
    mount(&server, "/list-ii", ResponseTemplate::new(403)).await;

    let tmp = tempfile::tempdir()?;
    let out = tmp.path().join("download");
    let client = reqwest::Client::new();
    let sources = vec![
        source(&server, "list_i_eu_identified", "/list-i"),
        source(&server, "list_ii_under_evaluation", "/list-ii"),
    ];

    let summary = run_spreadsheet_download(&client, &sources, &out).await?;
    assert_eq!(summary.successes(), 0);
    assert_eq!(summary.get("list_i_eu_identified"), Some(&Outcome::NoData));
    assert!(matches!(summary.get("list_ii_under_evaluation"), Some(Outcome::Failed(_))));

    let instructions = fs::read_to_string(out.join(INSTRUCTIONS_FILE))?;
    assert!(instructions.contains("`list_i_eu_identified.xlsx`"));
    assert!(instructions.contains("`list_ii_under_evaluation.xlsx`"));
    Ok(())
}

#[tokio::test]
async fn no_instructions_when_a_spreadsheet_was_saved() -> Result<()> {
    let server = MockServer::start().await;
    mount(
        &server,
        "/list-iii",
        ResponseTemplate::new(200).set_body_raw(r#"<a href="/f/list-iii.xlsx">x</a>"#, "text/html"),
    )
    .await;
    mount(
        &server,
        "/f/list-iii.xlsx",
        ResponseTemplate::new(200).set_body_raw(fake_xlsx(2048), "application/octet-stream"),
    )
    .await;

    let tmp = tempfile::tempdir()?;
    let client = reqwest::Client::new();
    let sources = vec![source(&server, "list_iii_national_authority", "/list-iii")];
    let summary = run_spreadsheet_download(&client, &sources, tmp.path()).await?;

    assert_eq!(summary.successes(), 1);
    assert!(tmp.path().join("list_iii_national_authority.xlsx").exists());
    assert!(!tmp.path().join(INSTRUCTIONS_FILE).exists());
    Ok(())
}
