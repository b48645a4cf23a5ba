//! Recording, listing, filtering and deleting a user's expenses.

mod chart;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod filter;
mod index_page;

pub use core::{
    Category, Expense, ExpenseBuilder, create_expense, create_expense_table, get_expenses_by_user,
};
pub use create_endpoint::create_expense_endpoint;
pub use delete_endpoint::delete_expense_endpoint;
pub use filter::summarize;
pub use index_page::{get_index_page, post_index_page};
