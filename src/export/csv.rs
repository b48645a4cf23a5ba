//! Writes a user's expense history as a CSV file.

use axum::{
    Extension,
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    auth::UserID,
    expense::Expense,
    export::{ExportState, load_expenses},
};

const CSV_HEADER: [&str; 4] = ["Date", "Category", "Amount", "Description"];

/// Write `expenses` as CSV with a header row, one row per expense in the given order.
///
/// Amounts are written with two decimal places.
///
/// # Errors
/// Returns [Error::CsvError] if a record could not be written.
pub fn expenses_to_csv(expenses: &[Expense]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|error| Error::CsvError(error.to_string()))?;

    for expense in expenses {
        writer
            .write_record([
                expense.date.to_string(),
                expense.category.clone(),
                format!("{:.2}", expense.amount),
                expense.description.clone().unwrap_or_default(),
            ])
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))
}

/// Download every expense owned by the current user as `expenses.csv`.
///
/// Filters on the overview page do not apply.
pub async fn download_csv(
    State(state): State<ExportState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let csv = load_expenses(&state, user_id).and_then(|expenses| expenses_to_csv(&expenses));

    match csv {
        Ok(csv) => (
            [
                (CONTENT_TYPE, "text/csv"),
                (CONTENT_DISPOSITION, "attachment; filename=\"expenses.csv\""),
            ],
            csv,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not export expenses for user {user_id} as CSV: {error}");
            error.into_response()
        }
    }
}
