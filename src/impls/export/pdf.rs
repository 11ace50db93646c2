use chrono::NaiveDateTime;
use genpdf::elements::{Break, FrameCellDecorator, Image as PdfImage, LinearLayout, PageBreak, Paragraph, TableLayout};
use genpdf::style::Style;
use genpdf::{Alignment, Document, Element, SimplePageDecorator};
use tempfile::NamedTempFile;

use crate::config::FontConfig;
use crate::core::models::report::WeightedResult;
use crate::core::models::{Answer, ResponseRecord};
use crate::core::services::report::{group_weighted_means, round2, summary};
use crate::error::Error;
use crate::impls::export::chart;

const TITLE: &str = "Questionnaire report";
const IMAGE_DPI: f64 = 150.0;
const MARGIN_MM: i32 = 10;

fn load_document(fonts: &FontConfig) -> Result<Document, Error> {
    let family = genpdf::fonts::from_files(&fonts.dir, &fonts.family, None)?;
    let mut doc = Document::new(family);
    doc.set_title(TITLE);
    doc.set_font_size(10);
    Ok(doc)
}

fn page_header(doc: &mut Document, generated: NaiveDateTime) {
    let stamp = generated.format("%Y-%m-%d %H:%M").to_string();
    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(MARGIN_MM);
    decorator.set_header(move |page| {
        let mut layout = LinearLayout::vertical();
        layout.push(Paragraph::new(format!("{} - {} - page {}", TITLE, stamp, page)).aligned(Alignment::Right));
        layout.push(Break::new(1));
        layout.styled(Style::new().with_font_size(8))
    });
    doc.set_page_decorator(decorator);
}

/// Writes the chart to a temporary PNG and loads it back as a PDF element.
/// The file has to outlive the document, so it goes into `keep`.
fn embed(img: &image::RgbImage, keep: &mut Vec<NamedTempFile>) -> Result<PdfImage, Error> {
    let mut tmp = tempfile::Builder::new().prefix("chart_").suffix(".png").tempfile()?;
    chart::write_png(img, tmp.as_file_mut())?;
    let mut element = PdfImage::from_path(tmp.path())?;
    element.set_dpi(IMAGE_DPI);
    element.set_alignment(Alignment::Center);
    keep.push(tmp);
    Ok(element)
}

fn detail_table(results: &[WeightedResult]) -> Result<TableLayout, Error> {
    let mut table = TableLayout::new(vec![2, 5, 1, 1]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
    let bold = Style::new().bold();
    table
        .row()
        .element(Paragraph::new("Group").styled(bold).padded(1))
        .element(Paragraph::new("Question").styled(bold).padded(1))
        .element(Paragraph::new("Answer").styled(bold).padded(1))
        .element(Paragraph::new("Coefficient").styled(bold).padded(1))
        .push()?;
    for r in results {
        table
            .row()
            .element(Paragraph::new(group_label(&r.group_key, &r.group_title)).padded(1))
            .element(Paragraph::new(r.question_text.as_str()).padded(1))
            .element(Paragraph::new(r.response.label()).padded(1))
            .element(Paragraph::new(format!("{:.2}", r.coefficient)).padded(1))
            .push()?;
    }
    Ok(table)
}

fn group_label(key: &str, title: &str) -> String {
    match title.is_empty() {
        true => key.to_owned(),
        false => format!("{} {}", key, title),
    }
}

/// Cover with totals, the Oui/Non pie, the per-group bar chart, then the
/// detail table on the following pages.
pub fn report(fonts: &FontConfig, records: &[ResponseRecord], results: &[WeightedResult], generated: NaiveDateTime) -> Result<Vec<u8>, Error> {
    let mut doc = load_document(fonts)?;
    page_header(&mut doc, generated);
    let mut charts = Vec::new();

    let totals = summary(records);
    let weighted_mean = match results.len() {
        0 => 0.0,
        n => round2(results.iter().map(|r| r.coefficient).sum::<f64>() / n as f64),
    };
    doc.push(Paragraph::new(TITLE).aligned(Alignment::Center).styled(Style::new().bold().with_font_size(20)));
    doc.push(Paragraph::new(format!("Generated on {}", generated.format("%Y-%m-%d %H:%M"))).aligned(Alignment::Center));
    doc.push(Break::new(2));
    doc.push(Paragraph::new(format!("Responses: {}", totals.total_responses)));
    doc.push(Paragraph::new(format!("Clients: {}", totals.unique_clients)));
    doc.push(Paragraph::new(format!("Positive rate: {:.1} %", totals.positive_rate)));
    doc.push(Paragraph::new(format!("Mean weighted coefficient: {:.2}", weighted_mean)));
    doc.push(Break::new(1));

    let yes = records.iter().filter(|r| r.response == Answer::Yes).count();
    let no = records.len() - yes;
    doc.push(Paragraph::new("Answer split").styled(Style::new().bold()));
    doc.push(embed(&chart::pie(300, &[(yes as f64, chart::GREEN), (no as f64, chart::RED)]), &mut charts)?);
    doc.push(Paragraph::new(format!("Oui (green): {}    Non (red): {}", yes, no)).aligned(Alignment::Center));
    doc.push(Break::new(1));

    let means = group_weighted_means(results);
    let values: Vec<f64> = means.iter().map(|(_, _, mean)| *mean).collect();
    let max = values.iter().copied().fold(1.0, f64::max);
    doc.push(Paragraph::new("Mean weighted coefficient per group").styled(Style::new().bold()));
    doc.push(embed(&chart::bars(600, 260, &values, max, chart::BLUE), &mut charts)?);
    for (i, (key, title, mean)) in means.iter().enumerate() {
        doc.push(Paragraph::new(format!("{}. {}: {:.2}", i + 1, group_label(key, title), mean)));
    }

    doc.push(PageBreak::new());
    doc.push(Paragraph::new("Details").styled(Style::new().bold().with_font_size(14)));
    doc.push(Break::new(1));
    doc.push(detail_table(results)?);

    let mut out = Vec::new();
    doc.render(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_fonts() {
        let fonts = FontConfig {
            dir: PathBuf::from("/nonexistent/fonts"),
            family: "LiberationSans".into(),
        };
        let now = chrono::Local::now().naive_local();
        assert!(matches!(report(&fonts, &[], &[], now), Err(Error::PdfError(_))));
    }

    #[test]
    fn test_group_label() {
        assert_eq!(group_label("G1", ""), "G1");
        assert_eq!(group_label("G1", "Sales"), "G1 Sales");
    }
}
