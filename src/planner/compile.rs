use tracing::debug;
use crate::config::MetricConfiguration;
use crate::flattener::flatten;
use crate::introspector::ResolvedSchema;
use crate::pipeline::Stage;
use super::date::{build_date_filter, DateFieldLocator};
use super::error::PlanError;
use super::layout::plan_layout;
use super::rollup::build_rollups;
use super::stages::{build_section_stages, build_stages};

/// Stages ready to run against one physical collection
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPipeline {
    pub collection: String,
    pub stages: Vec<Stage>,
}

/// Compile a configuration against its template's schema
///
/// `percentage` is not split here; a percentage level is counted like
/// `count`. Splitting into numerator and denominator happens before.
pub fn compile(
    config: &MetricConfiguration,
    schema: &ResolvedSchema,
    locator: DateFieldLocator,
) -> Result<CompiledPipeline, PlanError> {
    let flat = flatten(config);
    let layout = plan_layout(&flat, &schema.field_types, &config.section_path)?;

    let mut stages = Vec::new();
    if let Some(range) = config.effective_date_range() {
        stages.push(build_date_filter(
            range,
            &config.section_path,
            &schema.field_types,
            locator,
        ));
    }
    stages.extend(build_section_stages(&layout));
    stages.extend(build_stages(&flat, &layout));
    stages.extend(build_rollups(&flat, &layout));

    let collection = schema.template.physical_collection().to_string();
    debug!(
        collection = %collection,
        depth = flat.depth(),
        stages = stages.len(),
        "compiled pipeline"
    );

    Ok(CompiledPipeline { collection, stages })
}
