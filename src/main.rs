use clap::Parser;
use std::path::PathBuf;
use tracing::error;

use review_etl::config::PipelineConfig;
use review_etl::infra::CsvTableStore;
use review_etl::logging;
use review_etl::pipeline::orchestrator::{PipelineOrchestrator, PipelineOutcome};

#[derive(Parser)]
#[command(name = "review_etl")]
#[command(about = "Batch data-quality and KPI pipeline for product catalogs and customer reviews")]
#[command(version = "0.1.0")]
struct Cli {
    /// Root directory holding the bronze/silver/gold tiers
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    logging::init_logging();

    let cli = Cli::parse();
    let config = PipelineConfig::from_data_root(&cli.data_dir);
    config.ensure_output_dirs()?;

    println!("🚀 Starting catalog/review quality pipeline");
    println!("📂 Reading from: {}", config.bronze_dir.display());

    let store = CsvTableStore::new();
    let orchestrator = PipelineOrchestrator::new(&store, &config);

    match orchestrator.run() {
        Ok(PipelineOutcome::Completed(report)) => {
            println!("\n📊 Run summary:");
            println!(
                "   Catalog: {} -> {} rows",
                report.catalog_rows_in, report.catalog_rows_out
            );
            for rule in &report.catalog_rules {
                println!("   📉 {}: {} removed", rule.rule, rule.removed);
            }
            println!(
                "   Reviews: {} -> {} rows",
                report.review_rows_in, report.review_rows_out
            );
            for rule in &report.review_rules {
                println!("   📉 {}: {} removed", rule.rule, rule.removed);
            }
            println!(
                "   🏆 Gold dataset: {} records ({} late-delivery, {} return-risk)",
                report.enrichment.joined_rows,
                report.enrichment.late_delivery_flagged,
                report.enrichment.return_risk_flagged
            );
            println!("\n🎉 Pipeline completed successfully");
        }
        Ok(PipelineOutcome::HaltedMissingInput) => {
            println!(
                "\n⚠️  Pipeline halted: bronze inputs missing under {}",
                config.bronze_dir.display()
            );
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            println!("❌ Pipeline failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
