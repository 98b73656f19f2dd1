use anyhow::Result;
use tradelens_lib::DatasetRegistry;

use crate::output::{print_datasets, OutputFormat};

pub fn run(registry: &DatasetRegistry, format: &OutputFormat) -> Result<()> {
    let datasets = registry
        .ids()
        .map(|id| registry.get(id))
        .collect::<Result<Vec<_>, _>>()?;
    let refs: Vec<_> = datasets.iter().map(|d| d.as_ref()).collect();
    print_datasets(&refs, format)
}
