use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::info;

use crate::models::{CATALOG_SHEET_NAME, FoodRecord};
use crate::views::{Cell, SavedView, VIEW_COLUMNS};

const CATALOG_COLUMNS: [&str; 5] = ["Name", "Calories", "Protein", "Carbs", "Fat"];

fn write_header(sheet: &mut Worksheet, columns: &[&str], bold: &Format) -> Result<(), XlsxError> {
    for (col, name) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, bold)?;
    }
    Ok(())
}

fn write_catalog(workbook: &mut Workbook, foods: &[FoodRecord], bold: &Format) -> Result<(), XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(CATALOG_SHEET_NAME)?;
    write_header(sheet, &CATALOG_COLUMNS, bold)?;

    for (i, food) in foods.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &food.name)?;
        sheet.write_number(row, 1, food.calories_per_100g)?;
        sheet.write_number(row, 2, food.protein_per_100g)?;
        sheet.write_number(row, 3, food.carbs_per_100g)?;
        sheet.write_number(row, 4, food.fat_per_100g)?;
    }
    Ok(())
}

fn write_view(workbook: &mut Workbook, view: &SavedView, bold: &Format) -> Result<(), XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(&view.name)?;
    write_header(sheet, &VIEW_COLUMNS, bold)?;

    for (i, view_row) in view.rows.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, cell) in view_row.cells().iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(text) => {
                    sheet.write_string(row, col, text)?;
                }
                Cell::Number(value) => {
                    sheet.write_number(row, col, *value)?;
                }
            }
        }
    }
    Ok(())
}

/// Write the catalog sheet followed by one sheet per saved view, in the given order.
pub fn export_workbook(path: &Path, foods: &[FoodRecord], views: &[SavedView]) -> crate::Result<()> {
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();

    write_catalog(&mut workbook, foods, &bold)?;
    for view in views {
        write_view(&mut workbook, view, &bold)?;
    }

    workbook.save(path)?;
    info!(path = %path.display(), foods = foods.len(), views = views.len(), "exported workbook");
    Ok(())
}
