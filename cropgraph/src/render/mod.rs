//! HTML chart pages.
//!
//! Each assembled graph becomes one ECharts chart; a [`Page`] stacks them
//! into a single self-contained HTML file.
//!
//! | Graph type | Content | Chart |
//! |------------|---------|-------|
//! | `line` | lines | multi-line chart with zoom |
//! | `ThemeRiver` | lines | stream graph over a time axis |
//! | `bar3d` | lines | 3D bars, one row per series |
//! | `kline` | band | candlestick: mean ± stddev inside min/max |

use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use crate::error::{GraphError, GraphResult, RenderResult};
use crate::transform::{GraphContent, GraphData, NamedSeries};

const ECHARTS_JS: &str = "https://go-echarts.github.io/go-echarts-assets/assets/echarts.min.js";
const ECHARTS_GL_JS: &str = "https://go-echarts.github.io/go-echarts-assets/assets/echarts-gl.min.js";
const THEMES_BASE: &str = "https://go-echarts.github.io/go-echarts-assets/assets/themes";

/// Themes bundled with ECharts itself; anything else needs a theme script.
const BUILTIN_THEMES: &[&str] = &["", "white", "light", "dark"];

const BAR3D_COLORS: &[&str] = &[
    "#313695", "#4575b4", "#74add1", "#abd9e9", "#e0f3f8",
    "#fee090", "#fdae61", "#f46d43", "#d73027", "#a50026",
];

const PAGE_CSS: &str = r#"
body { margin: 0; font-family: system-ui, -apple-system, sans-serif; }
.container { display: flex; flex-direction: column; align-items: center; padding: 16px; }
.item { margin: 16px auto; width: 900px; height: 500px; }
"#;

/// Title and theme of one chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub title: String,
    pub theme: String,
}

/// A chart ready to be placed on a page.
#[derive(Debug, Clone)]
pub struct Chart {
    pub style: Style,
    /// Needs the echarts-gl extension
    pub three_d: bool,
    /// ECharts option object
    pub option: Value,
}

impl Chart {
    /// Build the chart for an assembled graph.
    pub fn from_graph(data: &GraphData, style: Style) -> GraphResult<Self> {
        let (option, three_d) = match (data.graph_type.as_str(), &data.content) {
            ("line", GraphContent::Lines(series)) => (line_option(data, &style, series)?, false),
            ("ThemeRiver", GraphContent::Lines(series)) => {
                (theme_river_option(data, &style, series)?, false)
            }
            ("bar3d", GraphContent::Lines(series)) => (bar3d_option(data, &style, series)?, true),
            ("kline", GraphContent::Band(_)) => (kline_option(data, &style), false),
            ("line" | "ThemeRiver" | "bar3d" | "kline", _) => {
                return Err(GraphError::InvalidGraph(format!(
                    "'{}' cannot be drawn as {}",
                    data.name, data.graph_type
                )))
            }
            (other, _) => return Err(GraphError::UnsupportedGraphType(other.to_string())),
        };

        Ok(Self { style, three_d, option })
    }
}

fn numbers(series: &NamedSeries) -> GraphResult<Vec<f64>> {
    series.series.to_numbers()
}

fn line_option(data: &GraphData, style: &Style, series: &[NamedSeries]) -> GraphResult<Value> {
    let series = series
        .iter()
        .map(|s| Ok(json!({ "name": s.name, "type": "line", "data": numbers(s)? })))
        .collect::<GraphResult<Vec<_>>>()?;

    Ok(json!({
        "title": { "text": style.title },
        "tooltip": { "trigger": "axis", "show": true },
        "legend": { "show": true, "right": "15%", "top": "5%", "align": "left" },
        "xAxis": { "type": "category", "data": data.labels },
        "yAxis": { "type": "value" },
        "dataZoom": [
            { "type": "inside", "start": 0, "end": 100, "xAxisIndex": [0] },
            { "type": "slider", "start": 0, "end": 100, "xAxisIndex": [0] }
        ],
        "series": series
    }))
}

/// `dd.mm.yyyy` to `yyyy/mm/dd`; other labels are kept as they are.
pub fn river_date(label: &str) -> String {
    chrono::NaiveDate::parse_from_str(label.trim(), "%d.%m.%Y")
        .map(|d| d.format("%Y/%m/%d").to_string())
        .unwrap_or_else(|_| label.to_string())
}

fn theme_river_option(data: &GraphData, style: &Style, series: &[NamedSeries]) -> GraphResult<Value> {
    let dates: Vec<String> = data.labels.iter().map(|l| river_date(l)).collect();

    let mut items = Vec::with_capacity(dates.len() * series.len());
    for s in series {
        for (date, value) in dates.iter().zip(numbers(s)?) {
            items.push(json!([date, value, s.name]));
        }
    }

    Ok(json!({
        "title": { "text": style.title },
        "tooltip": { "trigger": "axis", "show": true },
        "legend": {
            "show": true, "right": "15%", "top": "5%", "align": "left",
            "data": series.iter().map(|s| &s.name).collect::<Vec<_>>()
        },
        "singleAxis": { "type": "time", "bottom": "10%" },
        "dataZoom": [
            { "type": "inside", "start": 0, "end": 100 },
            { "type": "slider", "start": 50, "end": 100 }
        ],
        "series": [{ "type": "themeRiver", "data": items }]
    }))
}

fn bar3d_option(data: &GraphData, style: &Style, series: &[NamedSeries]) -> GraphResult<Value> {
    let mut items = Vec::with_capacity(data.labels.len() * series.len());
    for (i, s) in series.iter().enumerate() {
        for (j, value) in numbers(s)?.into_iter().enumerate() {
            items.push(json!([j, i, value]));
        }
    }

    Ok(json!({
        "title": { "text": style.title },
        "tooltip": {},
        "visualMap": {
            "calculable": true, "max": 30, "range": [0, 30],
            "inRange": { "color": BAR3D_COLORS }
        },
        "xAxis3D": { "type": "category", "data": data.labels },
        "yAxis3D": { "type": "category", "data": series.iter().map(|s| &s.name).collect::<Vec<_>>() },
        "zAxis3D": { "type": "value" },
        "grid3D": { "boxWidth": 200, "boxDepth": 80 },
        "series": [{ "type": "bar3D", "shading": "lambert", "data": items }]
    }))
}

fn kline_option(data: &GraphData, style: &Style) -> Value {
    let bands: Vec<[f64; 4]> = match &data.content {
        GraphContent::Band(bands) => bands.iter().map(|b| b.to_array()).collect(),
        GraphContent::Lines(_) => Vec::new(),
    };

    json!({
        "title": { "text": style.title },
        "tooltip": { "trigger": "axis", "show": true },
        "xAxis": { "type": "category", "data": data.labels, "splitNumber": 20 },
        "yAxis": { "scale": true },
        "dataZoom": [{ "type": "slider", "start": 50, "end": 100, "xAxisIndex": [0] }],
        "series": [{ "name": "kline", "type": "candlestick", "data": bands }]
    })
}

/// Theme names are limited to `[A-Za-z0-9_-]`; anything else falls back
/// to the default theme.
fn theme_name(theme: &str) -> &str {
    if theme
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        theme
    } else {
        ""
    }
}

/// An ordered set of charts rendered into one HTML document.
#[derive(Debug, Clone, Default)]
pub struct Page {
    charts: Vec<Chart>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_chart(&mut self, chart: Chart) {
        self.charts.push(chart);
    }

    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// Render the page as an HTML document.
    pub fn render(&self) -> RenderResult<String> {
        let mut scripts = vec![ECHARTS_JS.to_string()];
        if self.charts.iter().any(|c| c.three_d) {
            scripts.push(ECHARTS_GL_JS.to_string());
        }
        for chart in &self.charts {
            let theme = theme_name(&chart.style.theme);
            let url = format!("{}/{}.js", THEMES_BASE, theme);
            if !BUILTIN_THEMES.contains(&theme) && !scripts.contains(&url) {
                scripts.push(url);
            }
        }

        let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>cropgraph</title>\n");
        for src in &scripts {
            html.push_str(&format!("<script src=\"{}\"></script>\n", src));
        }
        html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n<div class=\"container\">\n", PAGE_CSS));

        for i in 0..self.charts.len() {
            html.push_str(&format!("<div class=\"item\" id=\"chart_{}\"></div>\n", i));
        }
        html.push_str("</div>\n<script type=\"text/javascript\">\n\"use strict\";\n");

        for (i, chart) in self.charts.iter().enumerate() {
            let theme = serde_json::to_string(theme_name(&chart.style.theme))?;
            // "</" would end the script element early
            let option = serde_json::to_string(&chart.option)?.replace("</", "<\\/");
            html.push_str(&format!(
                "let chart_{i} = echarts.init(document.getElementById('chart_{i}'), {theme});\nchart_{i}.setOption({option});\n"
            ));
        }
        html.push_str("</script>\n</body>\n</html>\n");
        Ok(html)
    }

    /// Render and write the page, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render()?)?;
        Ok(())
    }
}
