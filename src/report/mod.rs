//! PDF export of a filtered task list plus its chart.

mod chart;
mod layout;

pub use chart::{draw_chart, rasterize_chart, TempImage};
pub use layout::{layout_report, DrawOp, FontWeight, Page, ReportLayout, NO_DATA_MESSAGE};

use chrono::Local;
use image::{io::Reader as ImageReader, DynamicImage, ImageFormat};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Pt,
};
use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::error::ReportError;
use crate::filter::ChartDataset;
use crate::task::Task;

/// Where an export writes its document and its transient chart image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub output: PathBuf,
    pub chart_image: PathBuf,
}

fn pdf_err(err: printpdf::Error) -> ReportError {
    ReportError::Pdf(err.to_string())
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

/// Writes `rows` and the image behind `chart` to `output` as a PDF.
///
/// The chart guard is consumed: its file is gone when this returns, whether
/// or not the document was written. The output is written in place, so a
/// failure part way through can leave a truncated file behind.
pub fn render_report(rows: &[Task], chart: TempImage, output: &Path) -> Result<PathBuf, ReportError> {
    let mut reader = ImageReader::open(chart.path())?;
    // always written as PNG, whatever the configured file name
    reader.set_format(ImageFormat::Png);
    let image = reader.decode()?;
    let subtitle = format!("Generated {}", Local::now().format("%Y-%m-%d %H:%M"));
    let layout = layout_report(rows, Some(&subtitle));
    write_pdf(&layout, &image, output)?;
    drop(chart);
    info!(rows = rows.len(), output = %output.display(), "report written");
    Ok(output.to_path_buf())
}

/// Rasterises `dataset`, then renders the report; the temporary image is
/// removed on every path.
pub fn export_report(
    rows: &[Task],
    dataset: &ChartDataset,
    paths: &ReportPaths,
) -> Result<PathBuf, ReportError> {
    let chart = rasterize_chart(dataset, &paths.chart_image)?;
    render_report(rows, chart, &paths.output)
}

fn write_pdf(layout: &ReportLayout, chart: &DynamicImage, output: &Path) -> Result<(), ReportError> {
    let width = mm(layout::PAGE_WIDTH);
    let height = mm(layout::PAGE_HEIGHT);
    let (doc, first_page, first_layer) = PdfDocument::new(layout.title.as_str(), width, height, "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?;

    for (index, page) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(width, height, format!("Layer {}", index + 1));
            doc.get_page(page).get_layer(layer)
        };
        draw_page(page, &layer, &regular, &bold, chart);
    }

    let mut writer = BufWriter::new(File::create(output)?);
    doc.save(&mut writer).map_err(pdf_err)?;
    Ok(())
}

fn draw_page(
    page: &Page,
    layer: &PdfLayerReference,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
    chart: &DynamicImage,
) {
    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                weight,
                size,
                text,
            } => {
                let font = match weight {
                    FontWeight::Regular => regular,
                    FontWeight::Bold => bold,
                };
                layer.use_text(text.clone(), *size, mm(*x), mm(*y), font);
            }
            DrawOp::Image {
                x,
                y,
                width,
                height,
            } => {
                // at 72 dpi one pixel is one point
                let transform = ImageTransform {
                    translate_x: Some(mm(*x)),
                    translate_y: Some(mm(*y)),
                    scale_x: Some(width / chart.width() as f32),
                    scale_y: Some(height / chart.height() as f32),
                    dpi: Some(72.0),
                    ..Default::default()
                };
                Image::from_dynamic_image(chart).add_to_layer(layer.clone(), transform);
            }
        }
    }
}
