use scraper::{ElementRef, Html, Selector};

use crate::DueDateRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSettings {
    /// Class carried by the schedule table.
    pub table_class: String,
    /// Selector for the rows holding assignments, evaluated inside the table.
    pub row_selector: String,
    /// 1-based column whose nested `span` holds the due date.
    pub due_column: usize,
    /// 1-based column holding the assignment title, if titles are wanted.
    pub title_column: Option<usize>,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            table_class: "customTable".to_string(),
            row_selector: "tr.fixedContent.tableContent".to_string(),
            due_column: 5,
            title_column: Some(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("table with class '{class}' not found")]
    ElementNotFound { class: String },
    #[error("invalid selector '{selector}'")]
    InvalidSelector { selector: String },
}

/// Scrapes due dates from the schedule table of a course page.
#[derive(Debug)]
pub struct DueDateExtractor {
    table_class: String,
    table: Selector,
    rows: Selector,
    due_cell: Selector,
    title_cell: Option<Selector>,
}

impl DueDateExtractor {
    pub fn new(settings: &ExtractSettings) -> Result<Self, ExtractError> {
        let title_cell = settings
            .title_column
            .map(|column| parse_selector(&format!("td:nth-child({column})")))
            .transpose()?;
        Ok(Self {
            table_class: settings.table_class.clone(),
            table: parse_selector(&format!(".{}", settings.table_class))?,
            rows: parse_selector(&settings.row_selector)?,
            due_cell: parse_selector(&format!("td:nth-child({}) span", settings.due_column))?,
            title_cell,
        })
    }

    pub fn has_table(&self, html: &str) -> bool {
        let doc = Html::parse_document(html);
        let found = doc.select(&self.table).next().is_some();
        found
    }

    /// Returns one record per row that carries a due-date cell, in page order.
    pub fn extract(&self, html: &str) -> Result<Vec<DueDateRecord>, ExtractError> {
        let doc = Html::parse_document(html);
        let Some(table) = doc.select(&self.table).next() else {
            return Err(ExtractError::ElementNotFound {
                class: self.table_class.clone(),
            });
        };

        let records = table
            .select(&self.rows)
            .filter_map(|row| self.read_row(row))
            .collect();
        Ok(records)
    }

    fn read_row(&self, row: ElementRef<'_>) -> Option<DueDateRecord> {
        let due = row.select(&self.due_cell).next().map(element_text)?;
        let title = self
            .title_cell
            .as_ref()
            .and_then(|sel| row.select(sel).next())
            .map(element_text)
            .filter(|t| !t.is_empty());
        Some(DueDateRecord::new(title, due))
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|_| ExtractError::InvalidSelector {
        selector: selector.to_string(),
    })
}
