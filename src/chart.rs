//! Stacked bar chart of monthly AQI category counts.
//!
//! Charts are drawn with plotters into an in-memory RGB buffer; persisting the
//! buffer is left to [`crate::output::save_png`].

use anyhow::{Context, Result, anyhow};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontStyle;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use tracing::{debug, warn};

use crate::analyzers::category::Category;
use crate::analyzers::series::{max_stack, year_bounds};
use crate::analyzers::types::YearSeries;

/// Family name fonts are registered under.
pub const FONT_FAMILY: &str = "sans-serif";

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Chart elements that need a registered font.
pub const TEXT_ELEMENTS: &str = "title, month labels, axis labels and legend";

/// Fraction of a month slot covered by the bars of all years together.
const GROUP_WIDTH: f64 = 0.9;
const GROUP_MARGIN: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    /// Captions, axis labels and the legend need a registered font.
    pub draw_text: bool,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            draw_text: false,
        }
    }
}

/// A rendered chart as a row-major RGB8 buffer.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Registers the TrueType font at `path` for chart text.
pub fn register_font(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read font {}", path.display()))?;
    // plotters keeps registered font data for the life of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());

    plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes)
        .map_err(|_| anyhow!("{} is not a usable TrueType font", path.display()))?;

    debug!(font = %path.display(), "Chart font registered");
    Ok(())
}

pub fn chart_title(city: &str, first_year: i32, last_year: i32) -> String {
    format!("Stateair PM2.5 concentration from {first_year} to {last_year} ({city})")
}

pub fn category_color(category: Category) -> RGBColor {
    let (r, g, b) = category.rgb();
    RGBColor(r, g, b)
}

fn month_label(x: f64) -> String {
    MONTHS
        .get(x.floor() as usize)
        .map(|m| m.to_string())
        .unwrap_or_default()
}

/// Draws one group per month with one stacked bar per year.
///
/// Without a registered font ([`ChartStyle::draw_text`] unset) only the bars
/// and a baseline are drawn, and a warning names the missing elements.
///
/// # Errors
///
/// Returns an error if `series` is empty or plotters fails to draw.
#[tracing::instrument(skip(series, style), fields(years = series.len()))]
pub fn render_chart(series: &[YearSeries], city: &str, style: &ChartStyle) -> Result<RenderedChart> {
    let (first, last) = year_bounds(series).context("no yearly series to render")?;
    if !style.draw_text {
        warn!(city, "Chart drawn without text: {TEXT_ELEMENTS} are left out");
    }
    let mut pixels = vec![255u8; style.width as usize * style.height as usize * 3];

    {
        let root = BitMapBackend::with_buffer(&mut pixels, (style.width, style.height))
            .into_drawing_area();
        root.fill(&WHITE)?;
        draw_bars(&root, series, &chart_title(city, first, last), style)?;
        root.present()?;
    }

    Ok(RenderedChart {
        width: style.width,
        height: style.height,
        pixels,
    })
}

fn draw_bars(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    series: &[YearSeries],
    title: &str,
    style: &ChartStyle,
) -> Result<()> {
    let bar_width = GROUP_WIDTH / series.len() as f64;
    let y_max = max_stack(series).max(1) as f64 * 1.05;

    let mut builder = ChartBuilder::on(root);
    builder.margin(15);
    if style.draw_text {
        builder
            .caption(title, (FONT_FAMILY, 24))
            .x_label_area_size(35)
            .y_label_area_size(60);
    }
    let mut chart = builder.build_cartesian_2d(0f64..12f64, 0f64..y_max)?;

    if style.draw_text {
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(0)
            .y_desc("Hourly readings")
            .label_style((FONT_FAMILY, 14))
            .axis_desc_style((FONT_FAMILY, 16))
            .draw()?;

        // Month names sit under the middle of each slot, not on tick marks.
        let month_style =
            TextStyle::from((FONT_FAMILY, 14).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
        for month in 0..12 {
            let x = month as f64 + 0.5;
            let (px, py) = chart.backend_coord(&(x, 0.0));
            root.draw(&Text::new(month_label(x), (px, py + 6), month_style.clone()))?;
        }
    } else {
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(0.0, 0.0), (12.0, 0.0)],
            BLACK.stroke_width(1),
        )))?;
    }

    for (offset, year) in series.iter().enumerate() {
        let mut bottoms = [0u64; 12];

        for category in Category::ALL {
            let color = category_color(category);
            let mut bars = Vec::new();

            for (month, counts) in year.months.iter().enumerate() {
                let count = counts[category];
                if count == 0 {
                    continue;
                }
                let x0 = month as f64 + GROUP_MARGIN + bar_width * offset as f64;
                let bottom = bottoms[month];
                bottoms[month] += count;
                bars.push(Rectangle::new(
                    [(x0, bottom as f64), (x0 + bar_width, (bottom + count) as f64)],
                    color.filled(),
                ));
            }

            let mut anno = chart.draw_series(bars)?;
            if style.draw_text && offset == 0 {
                anno.label(category.label()).legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
            }
        }
    }

    if style.draw_text {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font((FONT_FAMILY, 12))
            .draw()?;
    }

    Ok(())
}
