//! Spreadsheet export of an already selected list of posts.

use crate::domain::{DomainError, Post};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

pub const REPORT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const REPORT_FILE_NAME: &str = "posts.xlsx";
pub const SHEET_NAME: &str = "Posts";

pub const COLUMNS: [&str; 8] = [
    "id",
    "title",
    "content",
    "country",
    "category",
    "createdAt",
    "rating",
    "userId",
];

const CONTENT_COLUMN: u16 = 2;
// content can be arbitrarily long, autofit would make it unreadable
const CONTENT_COLUMN_WIDTH: f64 = 60.0;

/// Renders `posts` into an `.xlsx` workbook: one header row followed by one
/// row per post, in input order.
pub fn generate_posts_report(posts: &[Post]) -> Result<Vec<u8>, DomainError> {
    render(posts).map_err(|e| {
        tracing::error!("Error generating XLSX report: {}", e);
        DomainError::InternalError(format!("Error generating XLSX report: {}", e))
    })
}

fn render(posts: &[Post]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    write_header(sheet)?;
    for (index, post) in posts.iter().enumerate() {
        write_post(sheet, index as u32 + 1, post)?;
    }

    sheet.autofit();
    sheet.set_column_width(CONTENT_COLUMN, CONTENT_COLUMN_WIDTH)?;

    workbook.save_to_buffer()
}

fn write_header(sheet: &mut Worksheet) -> Result<(), XlsxError> {
    for (col, name) in COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }
    Ok(())
}

fn write_post(sheet: &mut Worksheet, row: u32, post: &Post) -> Result<(), XlsxError> {
    sheet.write_number(row, 0, post.id as f64)?;
    sheet.write_string(row, 1, post.title.as_str())?;
    sheet.write_string(row, 2, post.content.as_str())?;
    sheet.write_string(row, 3, post.country.as_str())?;
    sheet.write_string(row, 4, category_cell(&post.categories))?;
    sheet.write_string(row, 5, post.created_at.format("%Y-%m-%d").to_string())?;
    sheet.write_number(row, 6, post.rating)?;
    sheet.write_number(row, 7, post.user_id as f64)?;
    Ok(())
}

/// Comma-joined labels. An empty list yields `""`, which the writer leaves
/// as a blank cell rather than an empty string cell.
pub fn category_cell(categories: &[String]) -> String {
    categories.join(", ")
}
