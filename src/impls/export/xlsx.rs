use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::core::models::report::{ClientComments, GroupStat};
use crate::core::models::ResponseRecord;
use crate::error::Error;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn header(sheet: &mut Worksheet, titles: &[&str]) -> Result<(), Error> {
    let bold = Format::new().set_bold();
    for (col, title) in titles.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
        sheet.set_column_width(col as u16, 18)?;
    }
    Ok(())
}

fn responses_sheet(sheet: &mut Worksheet, records: &[ResponseRecord]) -> Result<(), Error> {
    sheet.set_name("Responses")?;
    header(sheet, &["Date", "User", "Client", "Group", "Group title", "Question", "Response", "Comment"])?;
    for (i, r) in records.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, r.date.format(DATE_FORMAT).to_string())?;
        sheet.write_string(row, 1, &r.username)?;
        sheet.write_string(row, 2, &r.client_name)?;
        sheet.write_string(row, 3, &r.group_key)?;
        sheet.write_string(row, 4, &r.group_title)?;
        sheet.write_string(row, 5, &r.question_text)?;
        sheet.write_string(row, 6, r.response.label())?;
        sheet.write_string(row, 7, r.comment.as_deref().unwrap_or_default())?;
    }
    Ok(())
}

fn group_sheet(sheet: &mut Worksheet, stats: &[GroupStat]) -> Result<(), Error> {
    sheet.set_name("Group stats")?;
    header(sheet, &["Group", "Title", "Total", "Oui", "Non", "% Oui"])?;
    for (i, s) in stats.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &s.group_key)?;
        sheet.write_string(row, 1, &s.group_title)?;
        sheet.write_number(row, 2, s.total as f64)?;
        sheet.write_number(row, 3, s.yes as f64)?;
        sheet.write_number(row, 4, s.no as f64)?;
        sheet.write_number(row, 5, s.yes_percent)?;
    }
    Ok(())
}

fn comments_sheet(sheet: &mut Worksheet, comments: &[ClientComments]) -> Result<(), Error> {
    sheet.set_name("Comments")?;
    header(sheet, &["Client", "Group", "Date", "User", "Question", "Response", "Comment"])?;
    let mut row = 1;
    for client in comments {
        for group in &client.groups {
            for entry in &group.entries {
                sheet.write_string(row, 0, &client.client_name)?;
                sheet.write_string(row, 1, &group.group_title)?;
                sheet.write_string(row, 2, entry.date.format(DATE_FORMAT).to_string())?;
                sheet.write_string(row, 3, &entry.username)?;
                sheet.write_string(row, 4, &entry.question_text)?;
                sheet.write_string(row, 5, entry.response.label())?;
                sheet.write_string(row, 6, &entry.comment)?;
                row += 1;
            }
        }
    }
    Ok(())
}

/// Workbook with the raw records, per-group figures and, when there are
/// any, the comments.
pub fn workbook(records: &[ResponseRecord], stats: &[GroupStat], comments: &[ClientComments]) -> Result<Vec<u8>, Error> {
    let mut workbook = Workbook::new();
    responses_sheet(workbook.add_worksheet(), records)?;
    group_sheet(workbook.add_worksheet(), stats)?;
    if !comments.is_empty() {
        comments_sheet(workbook.add_worksheet(), comments)?;
    }
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::models::Answer;
    use crate::core::services::report;
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn records() -> Vec<ResponseRecord> {
        vec![ResponseRecord {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(9, 0, 0).unwrap(),
            username: "alice".into(),
            client_name: "ACME".into(),
            group_key: "G1".into(),
            group_title: "Communication".into(),
            question_text: "Q1".into(),
            response: Answer::Yes,
            comment: Some("ok".into()),
        }]
    }

    fn sheet_names(content: Vec<u8>) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(content)).unwrap();
        archive.file_names().filter(|n| n.starts_with("xl/worksheets/sheet")).map(String::from).collect()
    }

    #[test]
    fn test_workbook_sheets() {
        let records = records();
        let content = workbook(&records, &report::group_stats(&records), &report::comments(&records)).unwrap();
        assert_eq!(sheet_names(content).len(), 3);

        let mut plain = records.clone();
        plain[0].comment = None;
        let content = workbook(&plain, &report::group_stats(&plain), &report::comments(&plain)).unwrap();
        assert_eq!(sheet_names(content).len(), 2);
    }
}
