//! The expense overview: the add form, the filters, the totals and the expense table.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    alert::{Alert, alerts_view, take_flash},
    auth::{UserID, Username, get_user_by_id},
    endpoints::{self, format_endpoint},
    expense::{
        Category, Expense,
        chart::{category_chart, chart_script, chart_view},
        core::get_expenses_by_user,
        filter::{DATE_FORMAT, DateRangeQuery, ExpenseFilter, MonthForm, summarize},
    },
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    timezone::local_today,
};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The state needed for the expense overview.
#[derive(Debug, Clone)]
pub struct ExpensesPageState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpensesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<ExpensesPageState> for Key {
    fn from_ref(state: &ExpensesPageState) -> Self {
        state.cookie_key.clone()
    }
}

/// Display the user's expenses, optionally narrowed by the date range in the query string.
pub async fn get_index_page(
    State(state): State<ExpensesPageState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Query(query): Query<DateRangeQuery>,
) -> Response {
    render_index_page(&state, user_id, jar, None, &query)
}

/// Display the user's expenses narrowed by the submitted month.
///
/// An empty month falls back to the date range in the query string.
pub async fn post_index_page(
    State(state): State<ExpensesPageState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Query(query): Query<DateRangeQuery>,
    Form(form): Form<MonthForm>,
) -> Response {
    render_index_page(&state, user_id, jar, form.month.as_deref(), &query)
}

fn render_index_page(
    state: &ExpensesPageState,
    user_id: UserID,
    jar: PrivateCookieJar,
    month: Option<&str>,
    query: &DateRangeQuery,
) -> Response {
    let Some(today) = local_today(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone.clone()).into_response();
    };

    let (filter, validation_alerts) = ExpenseFilter::parse(
        month,
        query.start_date.as_deref(),
        query.end_date.as_deref(),
    );

    let result = match state.db_connection.lock() {
        Ok(connection) => get_user_by_id(user_id, &connection).and_then(|user| {
            get_expenses_by_user(user_id, &connection).map(|expenses| (user, expenses))
        }),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    let (user, expenses) = match result {
        Ok((user, expenses)) => (user, filter.apply(expenses)),
        Err(Error::NotFound) => {
            tracing::warn!("Session refers to unknown user {user_id}, logging out");
            return Redirect::to(endpoints::LOG_OUT).into_response();
        }
        Err(error) => {
            tracing::error!("Could not get expenses for user {user_id}: {error}");
            return error.into_response();
        }
    };

    let (jar, mut alerts) = take_flash(jar);
    alerts.extend(validation_alerts);

    let view = IndexView {
        username: &user.username,
        alerts: &alerts,
        expenses: &expenses,
        filter,
        query,
        today,
    };

    (jar, view.render()).into_response()
}

struct IndexView<'a> {
    username: &'a Username,
    alerts: &'a [Alert],
    expenses: &'a [Expense],
    filter: ExpenseFilter,
    query: &'a DateRangeQuery,
    today: Date,
}

impl IndexView<'_> {
    fn render(&self) -> Markup {
        let summary = summarize(self.expenses);
        let chart = category_chart(&summary.chart_data);
        let nav_bar = NavBar::new(endpoints::ROOT).into_html();

        let content = html!(
            (nav_bar)

            div class=(PAGE_CONTAINER_STYLE)
            {
                div class="w-full max-w-5xl space-y-6"
                {
                    p id="signed-in-as" class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Signed in as " (self.username)
                    }

                    (alerts_view(self.alerts))

                    div class="grid grid-cols-1 lg:grid-cols-3 gap-4"
                    {
                        (self.add_expense_form())
                        (self.month_filter_form())
                        (self.date_range_form())
                    }

                    section class=(CARD_STYLE)
                    {
                        h2 class="text-xl font-semibold" { "Total" }
                        p id="total" class="text-3xl font-bold" { (format_currency(summary.total)) }
                    }

                    (chart_view())
                    (self.expense_table())

                    div id="downloads" class="flex gap-4"
                    {
                        a href=(endpoints::DOWNLOAD_CSV) class=(LINK_STYLE) { "Download CSV" }
                        a href=(endpoints::DOWNLOAD_PDF) class=(LINK_STYLE) { "Download PDF" }
                    }
                }
            }
        );

        let scripts = [
            HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
            chart_script(&chart),
        ];

        base("Expenses", &scripts, &content)
    }

    fn add_expense_form(&self) -> Markup {
        let today = self.today.format(DATE_FORMAT).unwrap_or_default();

        html!(
            form
                id="add-expense"
                method="post"
                action=(endpoints::ADD_EXPENSE)
                class={ (CARD_STYLE) " space-y-4" }
            {
                h2 class="text-xl font-semibold" { "Add expense" }

                div
                {
                    label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                    input
                        type="date"
                        name="date"
                        id="date"
                        value=(today)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                    select name="category" id="category" required class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for category in Category::ALL {
                            option value=(category) { (category) }
                        }
                    }
                }

                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                    input
                        type="number"
                        name="amount"
                        id="amount"
                        step="0.01"
                        placeholder="0.00"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                    input
                        type="text"
                        name="description"
                        id="description"
                        placeholder="Optional"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add expense" }
            }
        )
    }

    fn month_filter_form(&self) -> Markup {
        let selected_month = match self.filter {
            ExpenseFilter::Month(month) => Some(month),
            _ => None,
        };

        html!(
            form
                id="month-filter"
                method="post"
                action=(endpoints::ROOT)
                class={ (CARD_STYLE) " space-y-4" }
            {
                h2 class="text-xl font-semibold" { "Filter by month" }

                div
                {
                    label for="month" class=(FORM_LABEL_STYLE) { "Month" }
                    select name="month" id="month" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" selected[selected_month.is_none()] { "All months" }

                        @for (month, name) in (1u8..=12).zip(MONTH_NAMES) {
                            option value=(month) selected[selected_month == Some(month)] { (name) }
                        }
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
            }
        )
    }

    fn date_range_form(&self) -> Markup {
        html!(
            form
                id="date-range-filter"
                method="get"
                action=(endpoints::ROOT)
                class={ (CARD_STYLE) " space-y-4" }
            {
                h2 class="text-xl font-semibold" { "Filter by date range" }

                div
                {
                    label for="start_date" class=(FORM_LABEL_STYLE) { "From" }
                    input
                        type="date"
                        name="start_date"
                        id="start_date"
                        value=[self.query.start_date.as_deref()]
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="end_date" class=(FORM_LABEL_STYLE) { "To" }
                    input
                        type="date"
                        name="end_date"
                        id="end_date"
                        value=[self.query.end_date.as_deref()]
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
            }
        )
    }

    fn expense_table(&self) -> Markup {
        html!(
            section class="relative overflow-x-auto shadow-md sm:rounded-lg"
            {
                table id="expenses" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Delete" } }
                        }
                    }

                    tbody
                    {
                        @for expense in self.expenses {
                            tr class=(TABLE_ROW_STYLE) data-expense-id=(expense.id)
                            {
                                td class=(TABLE_CELL_STYLE) { (expense.date) }
                                td class=(TABLE_CELL_STYLE) { (expense.category) }
                                td class=(TABLE_CELL_STYLE) { (format_currency(expense.amount)) }
                                td class=(TABLE_CELL_STYLE) { (expense.description.as_deref().unwrap_or_default()) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    a
                                        href=(format_endpoint(endpoints::DELETE_EXPENSE, expense.id))
                                        class=(BUTTON_DELETE_STYLE)
                                    {
                                        "Delete"
                                    }
                                }
                            }
                        }

                        @if self.expenses.is_empty() {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td colspan="5" class={ (TABLE_CELL_STYLE) " text-center" } { "No expenses found." }
                            }
                        }
                    }
                }
            }
        )
    }
}
