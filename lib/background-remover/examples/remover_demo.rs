// cargo run -p background-remover --example remover_demo -- <image> [model-dir]

use anyhow::{Context, Result};
use background_remover::{BackgroundRemover, Model};
use std::{fs, path::PathBuf, time::Instant};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let input_file = args.next().context("usage: remover_demo <image> [model-dir]")?;
    let model_dir = PathBuf::from(args.next().unwrap_or_else(|| "./models".to_string()));

    let output_dir = PathBuf::from("./output");
    fs::create_dir_all(&output_dir)?;

    let data = fs::read(&input_file).with_context(|| input_file.clone())?;

    for model in Model::all_models() {
        let model_path = model_dir.join(model.file_name());
        if !model_path.exists() {
            log::warn!("Model file not found: {}, download: {}", model_path.display(), model.download_url());
            continue;
        }

        let mut remover = BackgroundRemover::new(model, &model_path)?;

        let inference_start = Instant::now();
        let png = remover.remove_encoded(&data)?;
        log::info!("{model} spent: {:?}", inference_start.elapsed());

        let output_path = output_dir.join(format!(
            "{}.png",
            model.file_name().trim_end_matches(".onnx")
        ));
        fs::write(&output_path, png).with_context(|| output_path.display().to_string())?;
        log::info!("Saving result to: {}", output_path.display());
    }

    Ok(())
}
