use std::path::PathBuf;

use crate::tools::extract_string_arg_opt;
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::json;

const WIDTH: f64 = 1400.0;
const HEIGHT: f64 = 800.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 80.0;

const SERIES_COLORS: [&str; 6] = [
    "#2E86AB", "#A23B72", "#F18F01", "#C73E1D", "#7209B7", "#2D5016",
];

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

struct Series {
    name: String,
    points: Vec<(NaiveDateTime, f64)>,
}

/// Renders forecast series as an SVG line chart under the artifacts
/// directory and reports where it was saved.
pub struct PlotWeatherTool {
    artifacts_dir: PathBuf,
}

impl PlotWeatherTool {
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
        }
    }
}

#[async_trait]
impl Tool for PlotWeatherTool {
    fn name(&self) -> &str {
        "plot_weather_timeseries"
    }

    fn description(&self) -> &str {
        "Creates a time series plot from weather forecast data, supporting multiple series. Pass the output of get_weather_forecast as the series values."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "weather_data": {
                    "type": "object",
                    "description": "Dictionary with series names (for example city names) as keys and lists of {\"YYYY-MM-DD HH:MM:SS\": temperature} pairs as values",
                    "additionalProperties": {
                        "type": "array",
                        "items": {"type": "object"}
                    }
                },
                "title": {
                    "type": "string",
                    "description": "Title for the plot"
                }
            },
            "required": ["weather_data"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let weather_data = args
            .get("weather_data")
            .and_then(|v| v.as_object())
            .ok_or_else(|| anyhow::anyhow!("Missing 'weather_data' parameter"))?;
        let title = extract_string_arg_opt(&args, "title", "Weather Forecast");

        let series = match parse_series(weather_data) {
            Ok(series) => series,
            Err(reason) => return Ok(ToolResult::error(reason)),
        };

        let svg = render_svg(&series, &title);

        if let Err(e) = std::fs::create_dir_all(&self.artifacts_dir) {
            return Ok(ToolResult::error(format!(
                "Failed to create artifacts directory: {}",
                e
            )));
        }
        let path = self.artifacts_dir.join("plot.svg");
        match std::fs::write(&path, svg) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "plot saved");
                Ok(ToolResult::success(format!(
                    "Plot {} saved to {}",
                    title,
                    path.display()
                )))
            }
            Err(e) => Ok(ToolResult::error(format!("Failed to write plot: {}", e))),
        }
    }
}

fn parse_series(
    data: &serde_json::Map<String, serde_json::Value>,
) -> Result<Vec<Series>, String> {
    if data.is_empty() {
        return Err("Weather data cannot be empty".to_string());
    }

    let mut all = Vec::new();
    for (name, value) in data {
        let items = value.as_array().ok_or_else(|| {
            format!("Series '{}' must be a list of datetime-temperature pairs", name)
        })?;

        let mut points = Vec::new();
        for item in items {
            let pair = item.as_object().filter(|o| o.len() == 1).ok_or_else(|| {
                "Each item in weather_data must be an object with exactly one key-value pair"
                    .to_string()
            })?;
            let Some((dt_str, temp)) = pair.iter().next() else {
                continue;
            };
            let temp = temp
                .as_f64()
                .ok_or_else(|| format!("Temperature for '{}' must be a number", dt_str))?;
            let dt = NaiveDateTime::parse_from_str(dt_str, DATETIME_FORMAT).map_err(|_| {
                format!(
                    "Invalid datetime format in data: {}. Expected 'YYYY-MM-DD HH:MM:SS'",
                    dt_str
                )
            })?;
            points.push((dt, temp));
        }

        if points.is_empty() {
            continue;
        }
        points.sort_by_key(|(dt, _)| *dt);
        all.push(Series {
            name: name.clone(),
            points,
        });
    }

    if all.is_empty() {
        return Err("No valid datetime-temperature pairs found in weather_data".to_string());
    }
    Ok(all)
}

fn render_svg(series: &[Series], title: &str) -> String {
    let all_points = || series.iter().flat_map(|s| s.points.iter());

    let t_min = all_points()
        .map(|(dt, _)| dt.and_utc().timestamp())
        .min()
        .unwrap_or(0);
    let t_max = all_points()
        .map(|(dt, _)| dt.and_utc().timestamp())
        .max()
        .unwrap_or(0);
    let temp_min = all_points().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let temp_max = all_points()
        .map(|(_, v)| *v)
        .fold(f64::NEG_INFINITY, f64::max);

    let y_pad = ((temp_max - temp_min) * 0.1).max(1.0);
    let y_lo = temp_min - y_pad;
    let y_hi = temp_max + y_pad;

    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let span = (t_max - t_min).max(1) as f64;

    let x = |t: i64| MARGIN_LEFT + (t - t_min) as f64 / span * plot_w;
    let y = |v: f64| MARGIN_TOP + (y_hi - v) / (y_hi - y_lo) * plot_h;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
        w = WIDTH,
        h = HEIGHT
    ));
    svg.push_str(&format!(
        "<rect width=\"{}\" height=\"{}\" fill=\"white\"/>\n",
        WIDTH, HEIGHT
    ));
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"36\" font-size=\"22\" font-weight=\"bold\" text-anchor=\"middle\" font-family=\"sans-serif\">{}</text>\n",
        WIDTH / 2.0,
        escape_xml(title)
    ));
    svg.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"#cccccc\"/>\n",
        MARGIN_LEFT, MARGIN_TOP, plot_w, plot_h
    ));

    // horizontal gridlines with temperature labels
    for step in 0..=4 {
        let value = y_lo + (y_hi - y_lo) * f64::from(step) / 4.0;
        let line_y = y(value);
        svg.push_str(&format!(
            "<line x1=\"{}\" y1=\"{ly}\" x2=\"{}\" y2=\"{ly}\" stroke=\"#eeeeee\"/>\n",
            MARGIN_LEFT,
            MARGIN_LEFT + plot_w,
            ly = line_y
        ));
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"12\" text-anchor=\"end\" font-family=\"sans-serif\">{:.1}</text>\n",
            MARGIN_LEFT - 8.0,
            line_y + 4.0,
            value
        ));
    }

    // first and last timestamps on the x axis
    if let (Some(first), Some(last)) = (
        all_points().map(|(dt, _)| *dt).min(),
        all_points().map(|(dt, _)| *dt).max(),
    ) {
        let label_y = MARGIN_TOP + plot_h + 24.0;
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"12\" text-anchor=\"start\" font-family=\"sans-serif\">{}</text>\n",
            MARGIN_LEFT,
            label_y,
            first.format("%m-%d %H:%M")
        ));
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"12\" text-anchor=\"end\" font-family=\"sans-serif\">{}</text>\n",
            MARGIN_LEFT + plot_w,
            label_y,
            last.format("%m-%d %H:%M")
        ));
    }

    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" font-size=\"14\" text-anchor=\"middle\" font-family=\"sans-serif\">Date and Time</text>\n",
        MARGIN_LEFT + plot_w / 2.0,
        HEIGHT - 20.0
    ));
    svg.push_str(&format!(
        "<text x=\"24\" y=\"{}\" font-size=\"14\" text-anchor=\"middle\" font-family=\"sans-serif\" transform=\"rotate(-90 24 {y})\">Temperature (°C)</text>\n",
        y = MARGIN_TOP + plot_h / 2.0
    ));

    for (i, s) in series.iter().enumerate() {
        let color = SERIES_COLORS[i % SERIES_COLORS.len()];
        let points: Vec<String> = s
            .points
            .iter()
            .map(|(dt, v)| format!("{:.1},{:.1}", x(dt.and_utc().timestamp()), y(*v)))
            .collect();
        svg.push_str(&format!(
            "<polyline fill=\"none\" stroke=\"{}\" stroke-width=\"2\" points=\"{}\"/>\n",
            color,
            points.join(" ")
        ));
        for (dt, v) in &s.points {
            svg.push_str(&format!(
                "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"{}\"/>\n",
                x(dt.and_utc().timestamp()),
                y(*v),
                color
            ));
        }
    }

    if series.len() > 1 {
        for (i, s) in series.iter().enumerate() {
            let color = SERIES_COLORS[i % SERIES_COLORS.len()];
            let legend_y = MARGIN_TOP + 16.0 + 20.0 * i as f64;
            svg.push_str(&format!(
                "<rect x=\"{}\" y=\"{}\" width=\"12\" height=\"12\" fill=\"{}\"/>\n",
                MARGIN_LEFT + plot_w - 160.0,
                legend_y - 10.0,
                color
            ));
            svg.push_str(&format!(
                "<text x=\"{}\" y=\"{}\" font-size=\"13\" font-family=\"sans-serif\">{}</text>\n",
                MARGIN_LEFT + plot_w - 142.0,
                legend_y,
                escape_xml(&s.name)
            ));
        }
    }

    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" font-size=\"13\" font-family=\"sans-serif\">Range: {:.1}°C - {:.1}°C</text>\n",
        MARGIN_LEFT + 10.0,
        MARGIN_TOP + 20.0,
        temp_min,
        temp_max
    ));

    svg.push_str("</svg>\n");
    svg
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
