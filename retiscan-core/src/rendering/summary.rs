//! Run summary renderer (`summary.txt` and `summary.json`).

use super::{RenderContext, Renderer};
use crate::error::CoreResult;
use crate::reporting::{RunSummary, write_summary_files};

use std::path::PathBuf;

pub struct SummaryRenderer;

impl Renderer for SummaryRenderer {
    fn name(&self) -> &'static str {
        "summary"
    }

    fn render(&self, ctx: &RenderContext) -> CoreResult<Vec<PathBuf>> {
        let summary = RunSummary::from_rows(&ctx.rows)?;
        let (text, json) = write_summary_files(&ctx.layout, &summary, &ctx.rows)?;
        Ok(vec![text, json])
    }
}
