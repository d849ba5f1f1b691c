//! Multi-view dataset renderer entry point

use anyhow::Context;
use clap::Parser;
use multiview_render_engine::download::{download_object, is_remote};
use multiview_render_engine::pipeline::{MultiViewPipeline, PipelineSettings};
use multiview_render_engine::raster::RasterHost;
use multiview_render_engine::settings::RenderArgs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

fn render(args: &RenderArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    let (object_path, downloaded) = if is_remote(&args.object_path) {
        let path = download_object(&args.object_path, &args.download_dir)
            .with_context(|| format!("downloading {}", args.object_path))?;
        (path, true)
    } else {
        (PathBuf::from(&args.object_path), false)
    };

    let settings = PipelineSettings::new(&args.output_dir, args.num_images, args.camera_dist);
    let mut pipeline = MultiViewPipeline::new(RasterHost::new(args.engine), settings);
    let summary = pipeline
        .run(&object_path)
        .with_context(|| format!("rendering {}", object_path.display()))?;

    if downloaded {
        std::fs::remove_file(&object_path)
            .with_context(|| format!("removing {}", object_path.display()))?;
    }

    log::info!(
        "Finished {} ({} views) in {:.2}s",
        summary.uid,
        summary.views,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = RenderArgs::parse();
    log::trace!("Starting with args: {:?}", args);

    match render(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("Failed to render {}: {:?}", args.object_path, err);
            ExitCode::FAILURE
        }
    }
}
