//! SVG chart report adapter.
//!
//! Renders the market and strategy cumulative curves as a standalone SVG
//! line chart.

use crate::domain::crossover::Evaluation;
use crate::domain::error::SmacrossError;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::Path;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 360.0;
const PADDING: f64 = 48.0;

const MARKET_COLOR: &str = "#1f77b4";
const STRATEGY_COLOR: &str = "#d62728";

pub struct SvgReportAdapter;

impl SvgReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, evaluation: &Evaluation, title: &str) -> String {
        let rows = &evaluation.rows;

        let mut min_value = f64::INFINITY;
        let mut max_value = f64::NEG_INFINITY;
        for row in rows {
            min_value = min_value.min(row.cum_market).min(row.cum_strategy);
            max_value = max_value.max(row.cum_market).max(row.cum_strategy);
        }

        let plot_width = WIDTH - 2.0 * PADDING;
        let plot_height = HEIGHT - 2.0 * PADDING;

        let range = max_value - min_value;
        let scale_y = if range > 0.0 { plot_height / range } else { 1.0 };
        let scale_x = if rows.len() > 1 {
            plot_width / (rows.len() - 1) as f64
        } else {
            0.0
        };

        let polyline = |value: fn(&crate::domain::crossover::EvaluationRow) -> f64| -> String {
            rows.iter()
                .enumerate()
                .map(|(i, row)| {
                    let x = PADDING + i as f64 * scale_x;
                    let y = HEIGHT - PADDING - (value(row) - min_value) * scale_y;
                    format!("{:.1},{:.1}", x, y)
                })
                .collect::<Vec<String>>()
                .join(" ")
        };

        let market_points = polyline(|r| r.cum_market);
        let strategy_points = polyline(|r| r.cum_strategy);

        let first_date = rows.first().map(|r| r.date.to_string()).unwrap_or_default();
        let last_date = rows.last().map(|r| r.date.to_string()).unwrap_or_default();

        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{height:.0}" viewBox="0 0 {width:.0} {height:.0}">
  <rect width="{width:.0}" height="{height:.0}" fill="white"/>
  <text x="{mid:.0}" y="24" text-anchor="middle" font-family="sans-serif" font-size="14">{title}</text>
  <line x1="{pad:.0}" y1="{pad:.0}" x2="{pad:.0}" y2="{bottom:.0}" stroke="black"/>
  <line x1="{pad:.0}" y1="{bottom:.0}" x2="{right:.0}" y2="{bottom:.0}" stroke="black"/>
  <text x="{pad_less:.0}" y="{pad:.0}" text-anchor="end" font-family="sans-serif" font-size="10">{max_value:.3}</text>
  <text x="{pad_less:.0}" y="{bottom:.0}" text-anchor="end" font-family="sans-serif" font-size="10">{min_value:.3}</text>
  <text x="{pad:.0}" y="{below:.0}" text-anchor="start" font-family="sans-serif" font-size="10">{first_date}</text>
  <text x="{right:.0}" y="{below:.0}" text-anchor="end" font-family="sans-serif" font-size="10">{last_date}</text>
  <polyline fill="none" stroke="{market_color}" stroke-width="1.5" points="{market_points}"/>
  <polyline fill="none" stroke="{strategy_color}" stroke-width="1.5" points="{strategy_points}"/>
  <line x1="{legend_x:.0}" y1="40" x2="{legend_line_end:.0}" y2="40" stroke="{market_color}" stroke-width="1.5"/>
  <text x="{legend_text:.0}" y="44" font-family="sans-serif" font-size="11">market</text>
  <line x1="{legend_x:.0}" y1="58" x2="{legend_line_end:.0}" y2="58" stroke="{strategy_color}" stroke-width="1.5"/>
  <text x="{legend_text:.0}" y="62" font-family="sans-serif" font-size="11">strategy</text>
</svg>
"#,
            width = WIDTH,
            height = HEIGHT,
            mid = WIDTH / 2.0,
            pad = PADDING,
            pad_less = PADDING - 6.0,
            bottom = HEIGHT - PADDING,
            right = WIDTH - PADDING,
            below = HEIGHT - PADDING + 16.0,
            title = title,
            max_value = max_value,
            min_value = min_value,
            first_date = first_date,
            last_date = last_date,
            market_color = MARKET_COLOR,
            strategy_color = STRATEGY_COLOR,
            market_points = market_points,
            strategy_points = strategy_points,
            legend_x = WIDTH - PADDING - 110.0,
            legend_line_end = WIDTH - PADDING - 86.0,
            legend_text = WIDTH - PADDING - 80.0,
        )
    }
}

impl Default for SvgReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for SvgReportAdapter {
    fn write(
        &self,
        evaluation: &Evaluation,
        title: &str,
        output_path: &Path,
    ) -> Result<(), SmacrossError> {
        let svg = self.render(evaluation, title);
        fs::write(output_path, svg).map_err(|e| SmacrossError::Report {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        })
    }
}
