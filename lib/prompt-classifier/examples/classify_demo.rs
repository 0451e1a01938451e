use prompt_classifier::{Classifier, ClassifierConfig};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let api_key =
        std::env::var("HUGGINGFACE_API_KEY").expect("Missing HUGGINGFACE_API_KEY in environment");

    let classifier = Classifier::new(ClassifierConfig {
        api_key,
        ..Default::default()
    })
    .expect("invalid classifier config");

    match classifier
        .classify_detailed("make the photo brighter and remove the background")
        .await
    {
        Ok(classification) => {
            log::info!("status: {}", classification.status);
            for action in classification.actions {
                log::info!("{action:?}");
            }
        }
        Err(e) => log::warn!("Classify error: {e:?}"),
    }
}
