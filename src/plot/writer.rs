//! Rendering charts to files.

use super::Chart;
use crate::error::Result;
use log::debug;
use plotters::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    #[default]
    Png,
    Svg,
}

impl ChartFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Png => "png",
            ChartFormat::Svg => "svg",
        }
    }
}

/// Writes charts as `<output_dir>/<chart name>.<ext>`.
#[derive(Debug, Clone)]
pub struct ChartWriter {
    output_dir: PathBuf,
    format: ChartFormat,
    size: (u32, u32),
}

impl ChartWriter {
    pub fn new(output_dir: impl Into<PathBuf>, format: ChartFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
            size: (1200, 600),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Target path of a chart name.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", name, self.format.extension()))
    }

    /// Render `chart` and return the written path.
    pub fn write<C: Chart>(&self, chart: &C) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.path_for(chart.name());

        match self.format {
            ChartFormat::Png => {
                let root = BitMapBackend::new(&path, self.size).into_drawing_area();
                root.fill(&WHITE)?;
                chart.draw(&root)?;
                root.present()?;
            }
            ChartFormat::Svg => {
                let root = SVGBackend::new(&path, self.size).into_drawing_area();
                root.fill(&WHITE)?;
                chart.draw(&root)?;
                root.present()?;
            }
        }

        debug!("wrote {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_uses_format_extension() {
        let writer = ChartWriter::new("out", ChartFormat::Svg);
        assert_eq!(writer.path_for("hist"), PathBuf::from("out/hist.svg"));
        assert_eq!(ChartFormat::default().extension(), "png");
    }

    #[test]
    fn format_parses_from_lowercase() {
        let format: ChartFormat = serde_json::from_str("\"svg\"").unwrap();
        assert_eq!(format, ChartFormat::Svg);
    }
}
