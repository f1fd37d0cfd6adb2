mod bootstrap;
mod digest;

use anyhow::Result;
use sales_core::settings::Settings;
use sales_data::analysis::{PipelineOutcome, SalesPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Retail sales analysis v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Source: {}, report: {}, encoding: {:?}",
        settings.source.display(),
        settings.report_path.display(),
        settings.encoding
    );

    let config = settings.pipeline_config();

    match settings.mode.as_str() {
        "serve" => {
            sales_runtime::server::serve(config, &settings.bind_address()).await?;
        }

        "report" => {
            // The pipeline does blocking file I/O; keep it off the async workers.
            let output = tokio::task::spawn_blocking(move || -> Result<Option<String>> {
                let pipeline = SalesPipeline::new(&config);
                match pipeline.run()? {
                    PipelineOutcome::NoData { .. } => Ok(None),
                    PipelineOutcome::Completed(result) => {
                        let status = pipeline.materialize_report(&result);
                        Ok(Some(digest::render_digest(&result, &status)))
                    }
                }
            })
            .await??;

            match output {
                Some(text) => print!("{}", text),
                None => println!("No data available"),
            }
        }

        unknown => {
            eprintln!("Unknown mode: {}", unknown);
        }
    }

    Ok(())
}
