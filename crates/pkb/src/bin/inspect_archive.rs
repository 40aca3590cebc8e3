//! Extract and decode every container of an archive directory.
//!
//! Loads `packmap_save.lta` if present plus the named containers (or every
//! `.pkb` file in the directory), then prints a JSON summary per asset.
//!
//! Run: `cargo run -p pkb --features test-tools --bin inspect_archive -- <archive_dir> [container...]`

use std::env;
use std::path::{Path, PathBuf};

use pkb::{ArchiveContext, ExtractedAsset};

const MANIFEST_NAME: &str = "packmap_save.lta";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let archive_dir = PathBuf::from(args.get(1).map_or("test_archive", String::as_str));
    let requested: Vec<String> = args.iter().skip(2).cloned().collect();

    let mut ctx = ArchiveContext::new();

    let manifest_path = archive_dir.join(MANIFEST_NAME);
    match tokio::fs::read(&manifest_path).await {
        Ok(bytes) => {
            let table = ctx.load_manifest(&bytes);
            println!(
                "Manifest: {} entries across {:?}",
                table.len(),
                table.containers()
            );
        }
        Err(e) => println!("No manifest at {}: {e}", manifest_path.display()),
    }

    let names = if requested.is_empty() {
        find_containers(&archive_dir).await?
    } else {
        requested
    };

    for name in &names {
        let bytes = tokio::fs::read(archive_dir.join(name)).await?;
        ctx.load_container(name.clone(), bytes);
    }

    let mut failed = false;
    for name in &names {
        println!("\n--- {name} ---");
        match ctx.extract(name) {
            Ok(assets) => {
                for asset in &assets {
                    let summary = summarize(&ctx, asset);
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
                println!("{} assets", assets.len());
            }
            Err(e) => {
                println!("FAILED: {e}");
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

async fn find_containers(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.to_ascii_lowercase().ends_with(".pkb") {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

fn summarize(ctx: &ArchiveContext, asset: &ExtractedAsset) -> serde_json::Value {
    let mut summary = serde_json::json!({
        "name": asset.name,
        "container": asset.container_name,
        "method": asset.method.as_str(),
        "offset": asset.offset,
        "size": asset.size,
        "placeholder": asset.is_placeholder(),
    });

    if asset.kind().is_mesh() {
        let model = ctx.decode(asset);
        let meta = &model.metadata;
        let extent = model
            .bounds()
            .map(|(min, max)| (max - min).to_array());
        summary["model"] = serde_json::json!({
            "format": meta.format.as_str(),
            "signature": meta.signature_text(),
            "vertex_count": meta.vertex_count,
            "face_count": meta.face_count,
            "has_uvs": meta.has_uvs,
            "has_normals": meta.has_normals,
            "extent": extent,
            "rejected": meta.rejected.total(),
            "exportable": meta.exportable,
        });
    }

    summary
}
