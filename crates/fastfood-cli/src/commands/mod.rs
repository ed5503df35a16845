pub mod backup;
pub mod deploy;
pub mod service;

use std::path::Path;

use anyhow::Context;
use fastfood_core::OpsConfig;
use fastfood_deploy::DockerCompose;

pub fn load_config(project_dir: &Path) -> anyhow::Result<OpsConfig> {
    OpsConfig::load(project_dir)
        .with_context(|| format!("loading configuration from {}", project_dir.display()))
}

pub fn compose(config: &OpsConfig) -> DockerCompose {
    DockerCompose::new(&config.compose_file(), &config.project_dir)
}
