//! `shelf scan` — run the scan pipeline on a local image file.

use anyhow::{Context, Result};
use std::path::Path;

use crate::books::{join_or_dash, print_book};
use crate::config::Config;
use crate::services::Services;

pub async fn run_scan(config: &Config, image_path: &Path, json: bool) -> Result<()> {
    let image = std::fs::read(image_path)
        .with_context(|| format!("Failed to read image: {}", image_path.display()))?;

    let services = Services::from_config(config).await?;
    let scanner = services.scanner(config)?;
    let response = scanner.scan(&image).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("--- Extracted Titles ({}) ---", response.extracted_titles.len());
    for title in &response.extracted_titles {
        println!("  {}", title);
    }
    println!();

    println!("--- Books Found ({}) ---", response.books_found.len());
    if response.books_found.is_empty() {
        println!("No matching books found.");
        println!();
    }
    for book in &response.books_found {
        print_book(book);
    }

    println!("--- Recommended ({}) ---", response.recommended.len());
    if response.recommended.is_empty() {
        println!("No recommendations yet. Scan more books!");
    }
    for book in &response.recommended {
        println!(
            "  {}  ({})",
            book.title.as_deref().unwrap_or("(untitled)"),
            join_or_dash(book.authors.as_deref())
        );
    }

    Ok(())
}
