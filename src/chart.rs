use crate::util::{GitChartError, GitChartErrorKind};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Pixel dimensions of a rendered chart, written as `WIDTHxHEIGHT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

impl FromStr for ChartSize {
    type Err = GitChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            GitChartError::kind(
                GitChartErrorKind::Settings,
                Some(&format!("Invalid chart size '{}', expected WIDTHxHEIGHT", s)),
            )
        };
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(ChartSize { width, height })
    }
}

impl fmt::Display for ChartSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Pie,
    Bar,
    Line,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
}

/// Everything the chart API needs to draw one image.
///
/// Pie charts take one single-value series per slice, the same way bar and
/// line charts take one series per plotted line.
#[derive(Clone, Debug)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub size: ChartSize,
    pub threed: bool,
    pub data: Vec<Series>,
    pub y_range: Option<(f64, f64)>,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: &str, size: ChartSize, threed: bool) -> Self {
        ChartSpec {
            kind,
            title: title.to_string(),
            size,
            threed,
            data: vec![],
            y_range: None,
        }
    }

    pub fn data(mut self, label: &str, values: Vec<f64>) -> Self {
        self.data.push(Series {
            label: label.to_string(),
            values,
        });
        self
    }

    pub fn axis_range(mut self, min: f64, max: f64) -> Self {
        self.y_range = Some((min, max));
        self
    }

    fn max_value(&self) -> f64 {
        self.data
            .iter()
            .flat_map(|s| s.values.iter().cloned())
            .fold(0.0, f64::max)
    }

    fn type_code(&self) -> &'static str {
        match (self.kind, self.threed) {
            (ChartKind::Pie, true) => "p3",
            (ChartKind::Pie, false) => "p",
            (ChartKind::Bar, _) => "bvg",
            (ChartKind::Line, _) => "lc",
        }
    }

    pub fn to_url(&self, api: &str) -> Result<String, GitChartError> {
        if self.data.iter().all(|s| s.values.is_empty()) {
            return Err(GitChartError::kind(
                GitChartErrorKind::Chart,
                Some(&format!("chart '{}' has no data", self.title)),
            ));
        }
        let mut url = parse_api(api)?;
        let (min, max) = match self.y_range {
            Some(range) => range,
            None => (0.0, self.max_value()),
        };
        // A zero maximum would collapse the data scale.
        let max = if max <= min { min + 1.0 } else { max };
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("cht", self.type_code())
                .append_pair("chs", &self.size.to_string())
                .append_pair("chtt", &self.title);
            match self.kind {
                ChartKind::Pie => {
                    let values: Vec<String> = self.data.iter().flat_map(|s| s.values.iter().map(|v| number(*v))).collect();
                    let labels: Vec<String> = self.data.iter().map(|s| label(&s.label)).collect();
                    query
                        .append_pair("chd", &format!("t:{}", values.join(",")))
                        .append_pair("chl", &labels.join("|"));
                }
                _ => {
                    let series: Vec<String> = self
                        .data
                        .iter()
                        .map(|s| s.values.iter().map(|v| number(*v)).collect::<Vec<_>>().join(","))
                        .collect();
                    let labels: Vec<String> = self.data.iter().map(|s| label(&s.label)).collect();
                    query
                        .append_pair("chd", &format!("t:{}", series.join("|")))
                        .append_pair("chdl", &labels.join("|"));
                }
            }
            query.append_pair("chds", &format!("{},{}", number(min), number(max)));
            if self.y_range.is_some() {
                query
                    .append_pair("chxt", "y")
                    .append_pair("chxr", &format!("0,{},{}", number(min), number(max)));
            }
        }
        Ok(url.into())
    }
}

/// Gauge ("meter") chart for a single percentage, labelled with the value
/// itself.  It has no series, so it bypasses `ChartSpec`.
pub fn meter_url(api: &str, title: &str, size: ChartSize, value: f64) -> Result<String, GitChartError> {
    let mut url = parse_api(api)?;
    url.query_pairs_mut()
        .append_pair("cht", "gom")
        .append_pair("chtt", title)
        .append_pair("chs", &size.to_string())
        .append_pair("chl", &format!("{}%", number(value)))
        .append_pair("chd", &format!("t:{}", number(value)));
    Ok(url.into())
}

fn parse_api(api: &str) -> Result<Url, GitChartError> {
    Url::parse(api).map_err(|e| {
        GitChartError::sourced_kind(GitChartErrorKind::Settings, Some(&format!("Invalid chart API URL: {}", api)), e)
    })
}

// '|' separates labels in the query, so it can't appear inside one.
fn label(s: &str) -> String {
    s.replace('|', "/")
}

fn number(v: f64) -> String {
    match v.fract() == 0.0 {
        true => format!("{}", v as i64),
        false => format!("{}", v),
    }
}
