//! End-to-end pipeline runs over synthetic workbooks, with the model client
//! scripted so no network is involved.

use std::fs;
use std::io::Write;

use anyhow::{Result, bail};
use chrono::{TimeZone, Utc};

use miljo_core::grid::{Cell, Sheet};
use miljo_core::locator::LocateError;
use miljo_ingest::read_workbook_path;
use miljo_report::gemini::ModelClient;
use miljo_report::pipeline::{Pipeline, PipelineError, UploadMeta};

/// Scripted stand-in for the Gemini client.
struct ScriptedClient {
    reply: Option<String>,
}

impl ScriptedClient {
    fn replies(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
        }
    }

    fn unreachable_service() -> Self {
        Self { reply: None }
    }
}

impl ModelClient for ScriptedClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => bail!("connection refused"),
        }
    }
}

fn meta() -> UploadMeta {
    UploadMeta {
        filename: "inkop-2026.xlsx".to_string(),
        uploaded_at: Utc.with_ymd_and_hms(2026, 8, 7, 7, 12, 0).unwrap(),
    }
}

fn text(s: &str) -> Cell {
    Cell::Text(s.to_string())
}

fn transaction_row(category: &str, cost: f64, quantity: f64) -> Vec<Cell> {
    let mut row = vec![Cell::Empty, text(category)];
    row.resize(12, Cell::Empty);
    row.push(Cell::Number(cost));
    row.push(Cell::Number(quantity));
    row
}

fn sample_workbook() -> Vec<Sheet> {
    let header: Vec<Cell> = (0..14).map(|i| text(&format!("Kolumn {i}"))).collect();
    let transactions = Sheet::new(
        "Inköp",
        vec![
            header,
            transaction_row("Kylskåp", 4000.0, 2.0),
            transaction_row("Kylskåp", 6000.0, 3.0),
            transaction_row("Okänd pryl", 500.0, 3.0),
        ],
    );
    let climate = Sheet::new(
        "Klimatfaktorer",
        vec![
            vec![text("Kategori"), text("Klimatfaktor (kg CO2/st)")],
            vec![text("Kyl"), text("410")],
            vec![text("Övrigt"), text("7")],
        ],
    );
    vec![transactions, climate]
}

#[tokio::test]
async fn test_fallback_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("rapport.pdf");

    let pipeline = Pipeline::new(ScriptedClient::unreachable_service());
    let result = pipeline
        .process_sheets(&sample_workbook(), &meta(), &out)
        .await
        .unwrap();

    // 5 x 410 for the fridges, 3 x 7 for the unmatched category
    assert_eq!(result.summary.total_emissions.get("co2"), Some(&2071.0));
    assert_eq!(result.summary.total_cost, 10500.0);
    assert!(result.totals_consistent());

    let bytes = fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_model_reply_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("rapport.pdf");

    let reply = "```json\n{\"categories\":[{\"name\":\"Vitvaror\",\"items\":[\"Kylskåp\"],\"totals\":{\"quantity\":5,\"emissions\":{\"co2\":2050},\"cost\":10000,\"energy\":250}}],\"summary\":{\"totalEmissions\":{\"co2\":2050},\"totalCost\":10000,\"totalEnergy\":250,\"totalItems\":5},\"recommendations\":[\"Välj energiklass A\"]}\n```";
    let pipeline = Pipeline::new(ScriptedClient::replies(reply));
    let result = pipeline
        .process_sheets(&sample_workbook(), &meta(), &out)
        .await
        .unwrap();

    assert_eq!(result.categories.len(), 1);
    assert_eq!(result.categories[0].name, "Vitvaror");
    assert_eq!(result.recommendations, vec!["Välj energiklass A"]);
    assert!(out.exists());
}

#[tokio::test]
async fn test_workbook_without_transactions_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("rapport.pdf");

    let narrow = Sheet::new(
        "Anteckningar",
        vec![vec![text("bara"), text("lite"), text("text")]],
    );

    let pipeline = Pipeline::new(ScriptedClient::unreachable_service());
    let err = pipeline
        .process_sheets(&[narrow], &meta(), &out)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::NoTransactionData(LocateError::NoTransactionData)
    ));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_csv_upload_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("rapport.pdf");

    let mut csv = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
    let wide_header: Vec<String> = (0..14).map(|i| format!("Kolumn {i}")).collect();
    writeln!(csv, "{}", wide_header.join(",")).unwrap();
    for _ in 0..5 {
        writeln!(csv, ",Kylskåp,,,,,,,,,,,2000,1").unwrap();
    }

    let sheets = read_workbook_path(csv.path()).unwrap();
    let pipeline = Pipeline::new(ScriptedClient::unreachable_service());
    let result = pipeline
        .process_sheets(&sheets, &meta(), &out)
        .await
        .unwrap();

    assert_eq!(result.categories.len(), 1);
    assert_eq!(result.summary.total_cost, 10000.0);
    assert!(out.exists());
}

#[tokio::test]
async fn test_unwritable_report_path_is_fatal() {
    let pipeline = Pipeline::new(ScriptedClient::unreachable_service());
    let err = pipeline
        .process_sheets(
            &sample_workbook(),
            &meta(),
            std::path::Path::new("/finns/inte/rapport.pdf"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Render(_)));
}
