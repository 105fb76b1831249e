use super::file::{FileConfig, FileTermListMode};
use crate::cli::ScoreArgs;
use crate::error::{CliError, Result};
use gridff::engine::config::{ForceFieldConfig, ForceFieldConfigBuilder};
use std::str::FromStr;
use tracing::debug;

const MIB: usize = 1024 * 1024;

/// Resolves the force-field configuration. Precedence: command-line flags, then
/// `--set` values, then the config file, then the engine defaults.
pub fn build_config(args: &ScoreArgs) -> Result<ForceFieldConfig> {
    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let file_config = apply_set_values(file_config, &args.set_values)?;

    let ff = file_config.forcefield.unwrap_or_default();
    let agg = file_config.aggregation.unwrap_or_default();

    let mut builder = ForceFieldConfigBuilder::new();

    if let Some(v) = args.include_hydrogens.then_some(true).or(ff.include_hydrogens) {
        builder = builder.include_hydrogens(v);
    }
    if let Some(v) = args.no_protein_ligand.then_some(false).or(ff.protein_ligand) {
        builder = builder.use_protein_ligand(v);
    }
    if let Some(v) = args.superpose.then_some(true).or(ff.superposition) {
        builder = builder.use_superposition(v);
    }
    if let Some(v) = args.cutoff.or(ff.nonbonded_cutoff) {
        builder = builder.nonbonded_cutoff(v);
    }
    if let Some(mode) = ff.term_list {
        builder = builder.term_list(mode.into());
    }

    if let Some(mb) = args.memory_budget_mb.or(agg.memory_budget_mb) {
        builder = builder.memory_budget_bytes(mb.saturating_mul(MIB));
    }
    if let Some(mb) = agg.safety_margin_mb {
        builder = builder.safety_margin_bytes(mb.saturating_mul(MIB));
    }
    if let Some(v) = agg.padding {
        builder = builder.padding(v);
    }
    if let Some(v) = agg.carbon_cell_size {
        builder = builder.carbon_cell_size(v);
    }
    if let Some(v) = agg.superpose_cell_size {
        builder = builder.superpose_cell_size(v);
    }
    if let Some(v) = agg.default_cell_size {
        builder = builder.default_cell_size(v);
    }

    let config = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;
    debug!("Resolved force-field configuration: {:?}", config);
    Ok(config)
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "forcefield.include-hydrogens" => {
                config.forcefield.get_or_insert_with(Default::default).include_hydrogens =
                    Some(parse_value(key, value, "boolean")?);
            }
            "forcefield.protein-ligand" => {
                config.forcefield.get_or_insert_with(Default::default).protein_ligand =
                    Some(parse_value(key, value, "boolean")?);
            }
            "forcefield.superposition" => {
                config.forcefield.get_or_insert_with(Default::default).superposition =
                    Some(parse_value(key, value, "boolean")?);
            }
            "forcefield.nonbonded-cutoff" => {
                config.forcefield.get_or_insert_with(Default::default).nonbonded_cutoff =
                    Some(parse_value(key, value, "float")?);
            }
            "forcefield.term-list" => {
                let mode = match value {
                    "direct" => FileTermListMode::Direct,
                    "aggregated" => FileTermListMode::Aggregated,
                    _ => {
                        return Err(CliError::Config(format!(
                            "Invalid value for {}: '{}'. Expected 'direct' or 'aggregated'.",
                            key, value
                        )));
                    }
                };
                config.forcefield.get_or_insert_with(Default::default).term_list = Some(mode);
            }
            "aggregation.memory-budget-mb" => {
                config.aggregation.get_or_insert_with(Default::default).memory_budget_mb =
                    Some(parse_value(key, value, "integer")?);
            }
            "aggregation.safety-margin-mb" => {
                config.aggregation.get_or_insert_with(Default::default).safety_margin_mb =
                    Some(parse_value(key, value, "integer")?);
            }
            "aggregation.padding" => {
                config.aggregation.get_or_insert_with(Default::default).padding =
                    Some(parse_value(key, value, "float")?);
            }
            "aggregation.carbon-cell-size" => {
                config.aggregation.get_or_insert_with(Default::default).carbon_cell_size =
                    Some(parse_value(key, value, "float")?);
            }
            "aggregation.superpose-cell-size" => {
                config.aggregation.get_or_insert_with(Default::default).superpose_cell_size =
                    Some(parse_value(key, value, "float")?);
            }
            "aggregation.default-cell-size" => {
                config.aggregation.get_or_insert_with(Default::default).default_cell_size =
                    Some(parse_value(key, value, "float")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridff::engine::config::TermListMode;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn base_args() -> ScoreArgs {
        ScoreArgs {
            input: PathBuf::from("system.toml"),
            params: PathBuf::from("params.toml"),
            config: None,
            output: None,
            include_hydrogens: false,
            no_protein_ligand: false,
            superpose: false,
            cutoff: None,
            aggregate: false,
            memory_budget_mb: None,
            per_atom: false,
            set_values: vec![],
        }
    }

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn no_config_file_yields_engine_defaults() {
        let config = build_config(&base_args()).unwrap();
        assert_eq!(config, ForceFieldConfig::default());
    }

    #[test]
    fn file_values_are_applied() {
        let (_dir, path) = write_config(
            r#"
            [forcefield]
            protein-ligand = false
            term-list = "aggregated"

            [aggregation]
            memory-budget-mb = 16
            padding = 1.5
            "#,
        );
        let mut args = base_args();
        args.config = Some(path);

        let config = build_config(&args).unwrap();
        assert!(!config.use_protein_ligand);
        assert_eq!(config.term_list, TermListMode::Aggregated);
        assert_eq!(config.aggregation.memory_budget_bytes, 16 * MIB);
        assert_eq!(config.aggregation.padding, 1.5);
    }

    #[test]
    fn cli_flags_override_file_values() {
        let (_dir, path) = write_config(
            r#"
            [forcefield]
            nonbonded-cutoff = 12.0
            superposition = false

            [aggregation]
            memory-budget-mb = 16
            "#,
        );
        let mut args = base_args();
        args.config = Some(path);
        args.cutoff = Some(6.0);
        args.superpose = true;
        args.memory_budget_mb = Some(2);

        let config = build_config(&args).unwrap();
        assert_eq!(config.nonbonded_cutoff, 6.0);
        assert!(config.use_superposition);
        assert_eq!(config.aggregation.memory_budget_bytes, 2 * MIB);
    }

    #[test]
    fn set_values_override_file_but_not_flags() {
        let (_dir, path) = write_config("[aggregation]\ncarbon-cell-size = 1.0\n");
        let mut args = base_args();
        args.config = Some(path);
        args.cutoff = Some(5.0);
        args.set_values = vec![
            "aggregation.carbon-cell-size=0.5".to_string(),
            "forcefield.nonbonded-cutoff=9.0".to_string(),
            "forcefield.include-hydrogens=true".to_string(),
        ];

        let config = build_config(&args).unwrap();
        assert_eq!(config.aggregation.carbon_cell_size, 0.5);
        assert_eq!(config.nonbonded_cutoff, 5.0);
        assert!(config.include_hydrogens);
    }

    #[test]
    fn malformed_set_value_is_rejected() {
        let mut args = base_args();
        args.set_values = vec!["aggregation.padding".to_string()];
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));

        args.set_values = vec!["aggregation.padding=wide".to_string()];
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));

        args.set_values = vec!["scoring.weight=1.0".to_string()];
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn invalid_values_fail_engine_validation() {
        let mut args = base_args();
        args.set_values = vec!["aggregation.default-cell-size=0".to_string()];
        let result = build_config(&args);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("default_cell_size")));
    }
}
