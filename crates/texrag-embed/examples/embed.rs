use texrag_core::config::EmbeddingSettings;
use texrag_embed::get_default_embedder;

fn main() -> anyhow::Result<()> {
    let embedder = get_default_embedder(&EmbeddingSettings::default(), None)?;
    let texts = vec!["hypothesis testing".to_string(), "confidence interval".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("model={} B={} dim={}", embedder.model_id(), embs.len(), embedder.dim());
    Ok(())
}
