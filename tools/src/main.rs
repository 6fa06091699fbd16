//! pipeline-runner: headless batch runner for the screening pipeline.
//!
//! Usage:
//!   pipeline-runner --config run_config.json
//!   pipeline-runner --input transactions.csv --out ./out --backend rule_table

use anyhow::Result;
use screening_core::{
    config::{BackendChoice, RunConfig},
    pipeline::{self, PipelineDeps},
};
use std::env;
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let config = match flag_value(&args, "--config") {
        Some(path) => RunConfig::load(path)?,
        None => {
            let input = flag_value(&args, "--input")
                .ok_or_else(|| anyhow::anyhow!("--input or --config is required"))?;
            let out = flag_value(&args, "--out").unwrap_or("./out");
            let backend = match flag_value(&args, "--backend").unwrap_or("rule_table") {
                "generative" => BackendChoice::Generative,
                "classifier" => BackendChoice::Classifier,
                "rule_table" => BackendChoice::RuleTable,
                other => anyhow::bail!("unknown backend '{other}'"),
            };
            let mut config = RunConfig {
                input_path: PathBuf::from(input),
                output_dir: PathBuf::from(out),
                backend,
                registry: Default::default(),
                generative: Default::default(),
                classifier: Default::default(),
                rule_table: Default::default(),
            };
            if let Some(model) = flag_value(&args, "--classifier-model") {
                config.classifier.model_path = PathBuf::from(model);
            }
            if let Some(endpoint) = flag_value(&args, "--generative-endpoint") {
                config.generative.endpoint = endpoint.to_string();
            }
            if let Some(rules) = flag_value(&args, "--rule-table") {
                config.rule_table.path = Some(PathBuf::from(rules));
            }
            config
        }
    };

    println!("screening pipeline-runner");
    println!("  input:    {}", config.input_path.display());
    println!("  output:   {}", config.output_dir.display());
    println!("  backend:  {:?}", config.backend);
    println!();

    let deps = PipelineDeps::from_config(&config)?;
    let summary = pipeline::run(&config, &deps)?;

    let elapsed = summary.finished_at - summary.started_at;
    println!(
        "run {} finished in {}ms",
        summary.run_id,
        elapsed.num_milliseconds()
    );
    println!(
        "  {} rows scored via {} ({} distinct counterparties)",
        summary.rows, summary.backend, summary.distinct_counterparties
    );
    println!("  verdicts:");
    for (label, count) in &summary.verdicts.entries {
        println!("    {label:<12} {count}");
    }
    if !summary.reasons.entries.is_empty() {
        println!("  top reasons:");
        for (reason, count) in summary.reasons.entries.iter().take(5) {
            println!("    {count:>4}  {reason}");
        }
    }
    println!("  decisions: {}", summary.paths.decisions.display());
    println!("  summaries: {}, {}",
        summary.paths.risk_summary.display(),
        summary.paths.reason_summary.display()
    );

    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
