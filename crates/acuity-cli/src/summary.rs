use acuity_model::AttrValue;
use chrono::{NaiveDateTime, Timelike};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::types::QueryOutcome;

pub fn print_outcome(outcome: &QueryOutcome) {
    println!("{}", counts_line(outcome));
    let mut table = Table::new();
    table.set_header(outcome.columns.iter().map(|column| header_cell(column)));
    apply_table_style(&mut table);
    for row in &outcome.rows {
        table.add_row(row.iter().map(|value| value_cell(value)));
    }
    println!("{table}");
    if outcome.truncated() {
        println!(
            "{} of {} rows shown (use --limit to see more)",
            outcome.rows.len(),
            outcome.filtered
        );
    }
}

pub fn print_available_filters(outcome: &QueryOutcome) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(&outcome.available)?);
    Ok(())
}

/// One-line summary of the counts of a query.
pub fn counts_line(outcome: &QueryOutcome) -> String {
    format!(
        "{domain} [{datasets}]: {filtered} of {total} events match ({population} after population filter, {subjects} subjects)",
        domain = outcome.domain,
        datasets = outcome.datasets,
        filtered = outcome.filtered,
        total = outcome.total,
        population = outcome.population_filtered,
        subjects = outcome.subjects,
    )
}

/// Render one attribute value as table text.
pub fn format_value(value: &AttrValue<'_>) -> String {
    match value {
        AttrValue::Text(value) => value.unwrap_or_default().to_string(),
        AttrValue::Texts(values) => values.join(", "),
        AttrValue::Number(value) => value.map(format_number).unwrap_or_default(),
        AttrValue::Date(value) => value.map(format_date).unwrap_or_default(),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn format_date(value: NaiveDateTime) -> String {
    if value.hour() == 0 && value.minute() == 0 && value.second() == 0 {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M").to_string()
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(160);
    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Left);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn value_cell(value: &str) -> Cell {
    if value.is_empty() {
        Cell::new("-").fg(Color::DarkGrey)
    } else {
        Cell::new(value)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn numbers_drop_trailing_zero_fraction() {
        assert_eq!(format_value(&AttrValue::Number(Some(12.0))), "12");
        assert_eq!(format_value(&AttrValue::Number(Some(-3.25))), "-3.25");
        assert_eq!(format_value(&AttrValue::Number(None)), "");
    }

    #[test]
    fn dates_hide_midnight() {
        let day = NaiveDate::from_ymd_opt(2021, 5, 4).unwrap();
        let midnight = day.and_hms_opt(0, 0, 0).unwrap();
        let morning = day.and_hms_opt(9, 30, 0).unwrap();
        assert_eq!(format_value(&AttrValue::Date(Some(midnight))), "2021-05-04");
        assert_eq!(format_value(&AttrValue::Date(Some(morning))), "2021-05-04 09:30");
    }

    #[test]
    fn texts_are_joined() {
        assert_eq!(format_value(&AttrValue::Texts(vec!["A", "B"])), "A, B");
    }
}
