//! Renders a user's expense history as an HTML report and lays it out as a PDF.
//!
//! The report is written as markup first so that it shares the page templates'
//! formatting. The markup is then parsed back and its heading, paragraphs and
//! table rows are placed on A4 pages.

use axum::{
    Extension,
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use maud::{DOCTYPE, Markup, html};
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use scraper::{ElementRef, Html, Selector};

use crate::{
    Error,
    auth::UserID,
    expense::{Expense, summarize},
    export::{ExportState, load_expenses},
    html::format_currency,
};

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const LAYER_NAME: &str = "Layer 1";

const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const MARGIN_LEFT: f32 = 15.0;

const HEADING_SIZE: f32 = 18.0;
const TEXT_SIZE: f32 = 11.0;
const TABLE_SIZE: f32 = 10.0;

/// Left edge (mm) and maximum characters of each table column.
const COLUMNS: [(f32, usize); 4] = [(15.0, 12), (45.0, 16), (85.0, 14), (120.0, 44)];

/// The report template.
fn report_markup(expenses: &[Expense]) -> Markup {
    let total = summarize(expenses).total;

    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                title { "Expense Report" }
            }

            body
            {
                h1 { "Expense Report" }

                table
                {
                    thead
                    {
                        tr
                        {
                            th { "Date" }
                            th { "Category" }
                            th { "Amount" }
                            th { "Description" }
                        }
                    }

                    tbody
                    {
                        @for expense in expenses {
                            tr
                            {
                                td { (expense.date) }
                                td { (expense.category) }
                                td { (format_currency(expense.amount)) }
                                td { (expense.description.as_deref().unwrap_or_default()) }
                            }
                        }
                    }
                }

                p { "Total: " (format_currency(total)) }
            }
        }
    }
}

struct PdfWriter {
    document: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Baseline of the next line, measured up from the bottom of the page.
    cursor: f32,
    page_count: usize,
    header_row: Option<Vec<String>>,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self, Error> {
        let (document, page, layer) = PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, LAYER_NAME);
        let regular = document
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|error| Error::PdfError(error.to_string()))?;
        let bold = document
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|error| Error::PdfError(error.to_string()))?;
        let layer = document.get_page(page).get_layer(layer);

        Ok(Self {
            document,
            layer,
            regular,
            bold,
            cursor: PAGE_HEIGHT.0 - MARGIN_TOP,
            page_count: 1,
            header_row: None,
        })
    }

    /// Reserve `height` mm for the next line, starting a new page when the current one is full.
    fn advance(&mut self, height: f32) {
        if self.cursor - height < MARGIN_BOTTOM {
            let (page, layer) = self.document.add_page(PAGE_WIDTH, PAGE_HEIGHT, LAYER_NAME);
            self.layer = self.document.get_page(page).get_layer(layer);
            self.cursor = PAGE_HEIGHT.0 - MARGIN_TOP;
            self.page_count += 1;

            if let Some(header_row) = self.header_row.clone() {
                self.write_cells(&header_row, true);
            }
        }

        self.cursor -= height;
    }

    fn write_heading(&mut self, text: &str) {
        self.advance(12.0);
        self.layer
            .use_text(text, HEADING_SIZE, Mm(MARGIN_LEFT), Mm(self.cursor), &self.bold);
        self.cursor -= 4.0;
    }

    fn write_paragraph(&mut self, text: &str) {
        self.advance(8.0);
        self.layer
            .use_text(text, TEXT_SIZE, Mm(MARGIN_LEFT), Mm(self.cursor), &self.regular);
    }

    fn write_row(&mut self, cells: &[String], is_header: bool) {
        if is_header {
            self.header_row = Some(cells.to_vec());
        }

        self.write_cells(cells, is_header);
    }

    fn write_cells(&mut self, cells: &[String], is_header: bool) {
        self.advance(6.0);

        let font = if is_header { &self.bold } else { &self.regular };

        for (cell, (x, max_chars)) in cells.iter().zip(COLUMNS) {
            self.layer.use_text(
                truncate(cell, max_chars),
                TABLE_SIZE,
                Mm(x),
                Mm(self.cursor),
                font,
            );
        }
    }

    fn finish(self) -> Result<Vec<u8>, Error> {
        self.document
            .save_to_bytes()
            .map_err(|error| Error::PdfError(error.to_string()))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }

    let mut truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lay out the heading, paragraphs and table rows of `markup`, in document order.
fn lay_out(markup: &Markup) -> Result<PdfWriter, Error> {
    let document = Html::parse_document(&markup.0);
    let title = document
        .select(&selector("title")?)
        .next()
        .map(|title| element_text(&title))
        .unwrap_or_default();

    let blocks = selector("h1, p, tr")?;
    let cells = selector("th, td")?;
    let mut writer = PdfWriter::new(&title)?;

    for block in document.select(&blocks) {
        match block.value().name() {
            "h1" => writer.write_heading(&element_text(&block)),
            "p" => writer.write_paragraph(&element_text(&block)),
            _ => {
                let is_header = block
                    .select(&cells)
                    .next()
                    .is_some_and(|cell| cell.value().name() == "th");
                let row: Vec<String> = block
                    .select(&cells)
                    .map(|cell| element_text(&cell))
                    .collect();

                writer.write_row(&row, is_header);
            }
        }
    }

    Ok(writer)
}

fn selector(css: &str) -> Result<Selector, Error> {
    Selector::parse(css).map_err(|error| Error::PdfError(format!("bad selector {css}: {error}")))
}

/// Convert HTML markup into a PDF document.
///
/// # Errors
/// Returns [Error::PdfError] if the document could not be generated.
pub fn markup_to_pdf(markup: &Markup) -> Result<Vec<u8>, Error> {
    lay_out(markup)?.finish()
}

/// Render `expenses` as a PDF report.
pub fn expenses_to_pdf(expenses: &[Expense]) -> Result<Vec<u8>, Error> {
    markup_to_pdf(&report_markup(expenses))
}

/// Download every expense owned by the current user as `expenses.pdf`.
///
/// Filters on the overview page do not apply.
pub async fn download_pdf(
    State(state): State<ExportState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let pdf = load_expenses(&state, user_id).and_then(|expenses| expenses_to_pdf(&expenses));

    match pdf {
        Ok(pdf) => (
            [
                (CONTENT_TYPE, "application/pdf"),
                (CONTENT_DISPOSITION, "attachment; filename=\"expenses.pdf\""),
            ],
            pdf,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not export expenses for user {user_id} as PDF: {error}");
            error.into_response()
        }
    }
}
