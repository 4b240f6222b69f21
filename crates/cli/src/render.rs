// Terminal rendering of command results

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use tabled::{Table, Tabled};

use courier_core::{BatchOutcome, RequestResult};

use crate::Output;

const DETAIL_WIDTH: usize = 60;

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Code")]
    code: u16,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Resource")]
    name: String,
    #[tabled(rename = "Bytes")]
    bytes: usize,
}

fn truncate(text: &str, width: usize) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    if flat.chars().count() <= width {
        flat
    } else {
        let cut: String = flat.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn row(index: usize, result: &RequestResult) -> ResultRow {
    let (status, detail) = if result.is_error {
        ("ERROR".to_string(), result.error_msg.clone())
    } else {
        ("OK".to_string(), result.response.to_string())
    };
    ResultRow {
        index,
        url: result.url.clone(),
        code: result.code,
        status,
        detail: truncate(&detail, DETAIL_WIDTH),
    }
}

pub fn print_outcome(outcome: &BatchOutcome) {
    let rows: Vec<ResultRow> = outcome
        .results
        .iter()
        .enumerate()
        .map(|(i, r)| row(i, r))
        .collect();
    println!("{}", Table::new(rows));

    let failed = outcome.results.iter().filter(|r| r.is_error).count();
    if outcome.any_error {
        println!(
            "{}",
            format!(
                "✗ Batch {}: {} of {} requests failed",
                outcome.batch_id,
                failed,
                outcome.len()
            )
            .red()
            .bold()
        );
    } else {
        println!(
            "{}",
            format!("✓ Batch {}: {} requests succeeded", outcome.batch_id, outcome.len())
                .green()
                .bold()
        );
    }
}

pub fn print_flag(output: Output, label: &str, value: bool, subject: &str) {
    match output {
        Output::Json => println!("{}", json!({ label: value, "subject": subject })),
        Output::Table if value => println!("  {} {} {}", "✓".green(), subject, label),
        Output::Table => println!("  {} {} not {}", "✗".red(), subject, label),
    }
}

pub fn print_headers(output: Output, lines: &[String]) -> Result<()> {
    match output {
        Output::Json => println!("{}", serde_json::to_string_pretty(lines)?),
        Output::Table => {
            for line in lines {
                match line.split_once(':') {
                    Some((name, value)) => println!("{}:{}", name.bold(), value),
                    None => println!("{}", line),
                }
            }
        }
    }
    Ok(())
}

pub fn print_resources(output: Output, names: &[String], bodies: &[String]) -> Result<()> {
    match output {
        Output::Json => {
            let map: serde_json::Map<String, serde_json::Value> = names
                .iter()
                .zip(bodies)
                .map(|(n, b)| (n.clone(), json!(b)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        Output::Table => {
            let rows: Vec<ResourceRow> = names
                .iter()
                .zip(bodies)
                .map(|(name, body)| ResourceRow {
                    name: name.clone(),
                    bytes: body.len(),
                })
                .collect();
            println!("{}", Table::new(rows));
            println!(
                "{}",
                format!("✓ {} resources loaded", names.len()).green().bold()
            );
        }
    }
    Ok(())
}
