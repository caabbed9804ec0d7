//! Plotly chart types for data visualisation
//!
//! Sankey diagrams for transition matrices and line charts for trend
//! series, serialised in the shape Plotly.js expects.

use serde::Serialize;

/// Plotly font configuration for titles, labels, and annotations
#[derive(Debug, Clone, Serialize, Default)]
pub struct PlotlyFont {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlotlyTitle {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<PlotlyFont>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlotlyAxis {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickangle: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlotlyLayout {
    pub title: PlotlyTitle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<PlotlyAxis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<PlotlyAxis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovermode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<PlotlyFont>,
}

impl PlotlyLayout {
    /// Layout for an x/y chart
    pub fn basic(title: &str, x_title: &str, y_title: &str) -> Self {
        Self {
            title: PlotlyTitle {
                text: title.to_string(),
                font: None,
            },
            xaxis: Some(PlotlyAxis {
                title: x_title.to_string(),
                tickangle: Some(-45),
            }),
            yaxis: Some(PlotlyAxis {
                title: y_title.to_string(),
                tickangle: None,
            }),
            hovermode: Some("x unified".to_string()),
            font: None,
        }
    }

    /// Layout without axes (Sankey)
    pub fn flow(title: &str) -> Self {
        Self {
            title: PlotlyTitle {
                text: title.to_string(),
                font: None,
            },
            xaxis: None,
            yaxis: None,
            hovermode: None,
            font: Some(PlotlyFont {
                family: None,
                size: Some(12),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlotlySankeyNodes {
    pub label: Vec<String>,
    pub pad: u32,
    pub thickness: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlotlySankeyLinks {
    pub source: Vec<usize>,
    pub target: Vec<usize>,
    pub value: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlotlySankeyTrace {
    #[serde(rename = "type")]
    pub trace_type: String,
    pub orientation: String,
    pub node: PlotlySankeyNodes,
    pub link: PlotlySankeyLinks,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlotlySankeyChart {
    pub data: Vec<PlotlySankeyTrace>,
    pub layout: PlotlyLayout,
}

/// Line trace
#[derive(Debug, Clone, Serialize)]
pub struct PlotlyTrace {
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub name: String,
    #[serde(rename = "type")]
    pub trace_type: String,
    pub mode: String,
}

impl PlotlyTrace {
    pub fn line(x: Vec<String>, y: Vec<f64>, name: &str) -> Self {
        Self {
            x,
            y,
            name: name.to_string(),
            trace_type: "scatter".to_string(),
            mode: "lines+markers".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlotlyChart {
    pub data: Vec<PlotlyTrace>,
    pub layout: PlotlyLayout,
}
