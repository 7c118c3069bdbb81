//! Tabular layout of a leaderboard for export.
//!
//! [`ReportTable::build`] turns a [`RankingResult`] into the pages, headers
//! and formatted cells a document renderer draws. Rendering itself lives
//! behind [`ReportRenderer`]; [`TextRenderer`] is a plain-text rendition
//! used for previews and tests.

use serde::{Deserialize, Serialize};

use crate::errors::{RanklistError, Result};
use crate::types::RankingResult;

/// Rows per page when the layout does not say otherwise.
pub const DEFAULT_ROWS_PER_PAGE: usize = 32;

const NOT_AVAILABLE: &str = "N/A";

/// Caller-supplied presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportLayout {
    /// Overrides the indicator name as document title.
    pub title: Option<String>,
    pub company_name: Option<String>,
    /// Report date, already formatted by the caller.
    pub date: String,
    pub source_file: Option<String>,
    pub rows_per_page: usize,
    /// Direct exports always carry the category column.
    pub direct_export: bool,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            title: None,
            company_name: None,
            date: String::new(),
            source_file: None,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            direct_export: false,
        }
    }
}

impl ReportLayout {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Default::default()
        }
    }

    /// Builder method: set the document title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder method: set the company name
    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }

    /// Builder method: set the source file name
    pub fn with_source_file(mut self, file: impl Into<String>) -> Self {
        self.source_file = Some(file.into());
        self
    }

    /// Builder method: set the page size
    pub fn with_rows_per_page(mut self, rows: usize) -> Self {
        self.rows_per_page = rows;
        self
    }

    /// Builder method: mark as a direct export
    pub fn with_direct_export(mut self, direct: bool) -> Self {
        self.direct_export = direct;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows_per_page == 0 {
            return Err(RanklistError::invalid_config("rows_per_page must be > 0"));
        }
        Ok(())
    }
}

/// One printable table line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    pub cells: Vec<String>,
}

/// The laid-out document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTable {
    pub title: String,
    pub company_name: Option<String>,
    pub metadata: Vec<String>,
    pub description: Option<String>,
    pub headers: Vec<String>,
    pub pages: Vec<Vec<ReportLine>>,
}

impl ReportTable {
    pub fn build(result: &RankingResult, layout: &ReportLayout) -> Result<Self> {
        layout.validate()?;

        let with_category = layout.direct_export || result.group_by == "collaborator";
        // Direct exports show a dash for a missing category.
        let missing_category = if layout.direct_export { "-" } else { "" };

        let mut headers = vec!["Rang".to_string(), "Nom".to_string()];
        if with_category {
            headers.push("Catégorie".to_string());
        }
        headers.push("Unités".to_string());

        let lines: Vec<ReportLine> = result
            .data
            .iter()
            .map(|row| {
                let mut cells = vec![row.rank.to_string(), row.name.clone()];
                if with_category {
                    cells.push(
                        row.rank_category
                            .clone()
                            .unwrap_or_else(|| missing_category.to_string()),
                    );
                }
                cells.push(format!("{:.2}", row.value));
                ReportLine { cells }
            })
            .collect();

        let pages = lines
            .chunks(layout.rows_per_page)
            .map(<[ReportLine]>::to_vec)
            .collect();

        let metadata = vec![
            format!("Date : {}", layout.date),
            format!(
                "Fichier source : {}",
                layout.source_file.as_deref().unwrap_or(NOT_AVAILABLE)
            ),
            format!("Nombre d'entrées : {}", result.total_rows),
        ];

        Ok(Self {
            title: layout
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| result.indicator_name.clone()),
            company_name: layout.company_name.clone().filter(|c| !c.is_empty()),
            metadata,
            description: result.description.clone().filter(|d| !d.is_empty()),
            headers,
            pages,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn lines(&self) -> impl Iterator<Item = &ReportLine> {
        self.pages.iter().flatten()
    }
}

/// Draws a [`ReportTable`] into a document.
pub trait ReportRenderer {
    fn render(&self, table: &ReportTable) -> Result<Vec<u8>>;
}

/// Tab-separated text, one form feed between pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl ReportRenderer for TextRenderer {
    fn render(&self, table: &ReportTable) -> Result<Vec<u8>> {
        let mut out = String::new();
        out.push_str(&table.title);
        out.push('\n');
        if let Some(company) = &table.company_name {
            out.push_str(company);
            out.push('\n');
        }
        for line in &table.metadata {
            out.push_str(line);
            out.push('\n');
        }
        if let Some(description) = &table.description {
            out.push_str(description);
            out.push('\n');
        }
        for (index, page) in table.pages.iter().enumerate() {
            if index > 0 {
                out.push('\u{c}');
            }
            out.push_str(&table.headers.join("\t"));
            out.push('\n');
            for line in page {
                out.push_str(&line.cells.join("\t"));
                out.push('\n');
            }
        }
        Ok(out.into_bytes())
    }
}
