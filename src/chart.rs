//! Raster tide chart.
//!
//! Draws the line plot with `embedded-graphics` into an in-memory 1-bit
//! framebuffer and writes it out as a binary PBM (`P4`) image, which any image
//! viewer opens without extra tooling.

use crate::config::ChartConfig;
use crate::render::{check_lengths, ChartHandle, PlotLabels, Plotter, RenderError};
use chrono::{DateTime, Utc};
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, PrimitiveStyle, Rectangle},
    text::{Alignment, Text},
};
use std::convert::Infallible;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const MARGIN_LEFT: i32 = 52;
const MARGIN_RIGHT: i32 = 12;
const MARGIN_TOP: i32 = 30;
const MARGIN_BOTTOM: i32 = 36;

/// Size bounds applied to the configured chart dimensions.
pub const MIN_CHART_WIDTH: u32 = 120;
pub const MIN_CHART_HEIGHT: u32 = 100;
pub const MAX_CHART_WIDTH: u32 = 4096;
pub const MAX_CHART_HEIGHT: u32 = 4096;

/// 1-bit framebuffer; `true` is ink.
#[derive(Clone, Debug)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![false; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> bool {
        x < self.width
            && y < self.height
            && self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Number of inked pixels.
    pub fn count_on(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }

    /// Encode as binary PBM. Rows are packed MSB first and padded to a byte.
    pub fn write_pbm<W: Write>(&self, mut out: W) -> io::Result<()> {
        write!(out, "P4\n{} {}\n", self.width, self.height)?;
        let row_bytes = self.width.div_ceil(8) as usize;
        let mut row = vec![0u8; row_bytes];
        for y in 0..self.height {
            row.iter_mut().for_each(|b| *b = 0);
            for x in 0..self.width {
                if self.pixel(x, y) {
                    row[(x / 8) as usize] |= 0x80 >> (x % 8);
                }
            }
            out.write_all(&row)?;
        }
        out.flush()
    }
}

impl OriginDimensions for Bitmap {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Bitmap {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0
                && point.y >= 0
                && (point.x as u32) < self.width
                && (point.y as u32) < self.height
            {
                let index = point.y as usize * self.width as usize + point.x as usize;
                self.pixels[index] = color.is_on();
            }
        }
        Ok(())
    }
}

/// Draw a labelled line plot of `y` against `x` onto `target`.
pub fn draw_line_plot<D>(target: &mut D, x: &[DateTime<Utc>], y: &[f64], labels: &PlotLabels)
where
    D: DrawTarget<Color = BinaryColor, Error = Infallible> + OriginDimensions,
{
    if y.is_empty() || x.len() != y.len() {
        return;
    }

    let size = target.size();
    let (width, height) = (size.width as i32, size.height as i32);
    let text_style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let axis = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
    let curve = PrimitiveStyle::with_stroke(BinaryColor::On, 2);

    let plot_left = MARGIN_LEFT;
    let plot_top = MARGIN_TOP;
    let plot_width = (width - MARGIN_LEFT - MARGIN_RIGHT).max(1);
    let plot_height = (height - MARGIN_TOP - MARGIN_BOTTOM).max(1);

    Text::with_alignment(&labels.title, Point::new(width / 2, 10), text_style, Alignment::Center)
        .draw(target)
        .ok();
    Text::new(&labels.y_label, Point::new(2, plot_top - 8), text_style)
        .draw(target)
        .ok();

    Rectangle::new(
        Point::new(plot_left, plot_top),
        Size::new(plot_width as u32, plot_height as u32),
    )
    .into_styled(axis)
    .draw(target)
    .ok();

    let (min, max) = y
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;
    let to_y = |v: f64| {
        let normalized = if span > 0.0 { (v - min) / span } else { 0.5 };
        plot_top + plot_height - 1 - (normalized * (plot_height - 1) as f64).round() as i32
    };

    let t0 = x[0];
    let seconds = (x[x.len() - 1] - t0).num_seconds();
    let to_x = |i: usize| {
        let fraction = if seconds > 0 {
            (x[i] - t0).num_seconds() as f64 / seconds as f64
        } else if x.len() > 1 {
            i as f64 / (x.len() - 1) as f64
        } else {
            0.5
        };
        plot_left + (fraction.clamp(0.0, 1.0) * (plot_width - 1) as f64).round() as i32
    };

    // Y ticks at min, mid and max
    for value in [min, (min + max) / 2.0, max] {
        let ty = to_y(value);
        Line::new(Point::new(plot_left - 4, ty), Point::new(plot_left, ty))
            .into_styled(axis)
            .draw(target)
            .ok();
        Text::with_alignment(
            &format!("{value:.1}"),
            Point::new(plot_left - 6, ty + 3),
            text_style,
            Alignment::Right,
        )
        .draw(target)
        .ok();
    }

    let mut previous = None;
    for (i, &value) in y.iter().enumerate() {
        let point = Point::new(to_x(i), to_y(value));
        if let Some(prev) = previous {
            Line::new(prev, point).into_styled(curve).draw(target).ok();
        }
        previous = Some(point);
    }
    if y.len() == 1 {
        if let Some(point) = previous {
            Rectangle::with_center(point, Size::new(3, 3))
                .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
                .draw(target)
                .ok();
        }
    }

    let label_y = plot_top + plot_height + 12;
    Text::new(
        &x[0].format("%m-%d %H:%M").to_string(),
        Point::new(plot_left, label_y),
        text_style,
    )
    .draw(target)
    .ok();
    Text::with_alignment(
        &x[x.len() - 1].format("%m-%d %H:%M").to_string(),
        Point::new(plot_left + plot_width, label_y),
        text_style,
        Alignment::Right,
    )
    .draw(target)
    .ok();
    Text::with_alignment(
        &format!("{} (GMT)", labels.x_label),
        Point::new(plot_left + plot_width / 2, label_y + 12),
        text_style,
        Alignment::Center,
    )
    .draw(target)
    .ok();

    // Legend in the top-right corner of the plot
    let legend_x = plot_left + plot_width - 6 * labels.legend.len() as i32 - 30;
    let legend_y = plot_top + 10;
    Line::new(
        Point::new(legend_x, legend_y - 3),
        Point::new(legend_x + 18, legend_y - 3),
    )
    .into_styled(curve)
    .draw(target)
    .ok();
    Text::new(&labels.legend, Point::new(legend_x + 24, legend_y), text_style)
        .draw(target)
        .ok();
}

/// Plotter that writes a PBM image to `path`.
#[derive(Clone, Debug)]
pub struct BitmapChart {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl BitmapChart {
    pub fn new(path: impl AsRef<Path>, config: &ChartConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            width: config.width.clamp(MIN_CHART_WIDTH, MAX_CHART_WIDTH),
            height: config.height.clamp(MIN_CHART_HEIGHT, MAX_CHART_HEIGHT),
        }
    }
}

impl Plotter for BitmapChart {
    fn plot(
        &mut self,
        x: &[DateTime<Utc>],
        y: &[f64],
        labels: &PlotLabels,
    ) -> Result<ChartHandle, RenderError> {
        check_lengths(x, y)?;

        let mut bitmap = Bitmap::new(self.width, self.height);
        draw_line_plot(&mut bitmap, x, y, labels);

        let file = File::create(&self.path)?;
        bitmap.write_pbm(BufWriter::new(file))?;
        tracing::info!(path = %self.path.display(), "chart written");

        Ok(ChartHandle::Image {
            path: self.path.clone(),
            width: self.width,
            height: self.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tide_data::Units;
    use chrono::{Duration, TimeZone};

    fn times(n: usize) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::hours(i as i64 * 6)).collect()
    }

    #[test]
    fn test_bitmap_draw_target() {
        let mut bitmap = Bitmap::new(16, 8);
        Line::new(Point::new(0, 0), Point::new(15, 0))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut bitmap)
            .unwrap();

        assert_eq!(bitmap.count_on(), 16);
        assert!(bitmap.pixel(7, 0));
        assert!(!bitmap.pixel(7, 1));
        assert!(!bitmap.pixel(100, 100));
    }

    #[test]
    fn test_out_of_bounds_pixels_are_clipped() {
        let mut bitmap = Bitmap::new(4, 4);
        bitmap
            .draw_iter([
                Pixel(Point::new(-1, 0), BinaryColor::On),
                Pixel(Point::new(4, 0), BinaryColor::On),
                Pixel(Point::new(1, 1), BinaryColor::On),
            ])
            .unwrap();
        assert_eq!(bitmap.count_on(), 1);
    }

    #[test]
    fn test_pbm_encoding() {
        let mut bitmap = Bitmap::new(10, 2);
        bitmap
            .draw_iter([
                Pixel(Point::new(0, 0), BinaryColor::On),
                Pixel(Point::new(9, 1), BinaryColor::On),
            ])
            .unwrap();

        let mut out = Vec::new();
        bitmap.write_pbm(&mut out).unwrap();

        let header = b"P4\n10 2\n";
        assert_eq!(&out[..header.len()], header);
        assert_eq!(&out[header.len()..], &[0x80, 0x00, 0x00, 0x40]);
    }

    #[test]
    fn test_line_plot_draws_something() {
        let mut bitmap = Bitmap::new(320, 200);
        let labels = PlotLabels::tide(Units::English);
        draw_line_plot(&mut bitmap, &times(6), &[2.1, 2.8, 3.0, 2.5, 1.9, 2.2], &labels);
        assert!(bitmap.count_on() > 200);
    }

    #[test]
    fn test_bitmap_chart_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tides.pbm");
        let config = ChartConfig {
            width: 200,
            height: 120,
        };

        let handle = BitmapChart::new(&path, &config)
            .plot(&times(3), &[1.0, 3.5, 2.2], &PlotLabels::tide(Units::Metric))
            .unwrap();

        assert_eq!(
            handle,
            ChartHandle::Image {
                path: path.clone(),
                width: 200,
                height: 120
            }
        );
        let bytes = std::fs::read(&path).unwrap();
        let header = b"P4\n200 120\n";
        assert_eq!(&bytes[..header.len()], header);
        assert_eq!(bytes.len(), header.len() + 25 * 120);
    }

    #[test]
    fn test_chart_size_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.pbm");
        let config = ChartConfig {
            width: u32::MAX,
            height: u32::MAX,
        };

        let handle = BitmapChart::new(&path, &config)
            .plot(&times(3), &[1.0, 3.5, 2.2], &PlotLabels::tide(Units::English))
            .unwrap();
        assert_eq!(
            handle,
            ChartHandle::Image {
                path: path.clone(),
                width: MAX_CHART_WIDTH,
                height: MAX_CHART_HEIGHT
            }
        );
        let header = format!("P4\n{MAX_CHART_WIDTH} {MAX_CHART_HEIGHT}\n");
        assert!(std::fs::read(&path).unwrap().starts_with(header.as_bytes()));

        let tiny = BitmapChart::new(&path, &ChartConfig { width: 0, height: 0 });
        assert_eq!((tiny.width, tiny.height), (MIN_CHART_WIDTH, MIN_CHART_HEIGHT));
    }

    #[test]
    fn test_single_point_plot() {
        let mut bitmap = Bitmap::new(200, 120);
        draw_line_plot(&mut bitmap, &times(1), &[1.0], &PlotLabels::tide(Units::English));
        assert!(bitmap.count_on() > 0);
    }
}
