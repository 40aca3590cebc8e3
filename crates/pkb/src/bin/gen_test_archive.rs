//! Generate a small synthetic archive for exercising the extractor.
//!
//! Writes a packmap manifest, two containers with embedded directories and a
//! few loose `.prop` files into the output directory.
//!
//! Run: `cargo run -p pkb --features test-tools --bin gen_test_archive -- <output_dir>`

use std::env;
use std::f32::consts::TAU;
use std::fs;
use std::path::Path;

use pkb::{ContainerBuilder, IndexEntry, PropMesh, encode_manifest};

const MANIFEST_NAME: &str = "packmap_save.lta";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let output_dir = args.get(1).map_or("test_archive", String::as_str);
    let output_path = Path::new(output_dir);
    fs::create_dir_all(output_path)?;

    println!("Generating test archive in {}\n", output_path.display());

    let world_files = vec![
        ("building1.prop".to_owned(), box_mesh(400.0, 300.0, 600.0).to_bytes()),
        ("crate.prop".to_owned(), box_mesh(100.0, 100.0, 100.0).to_bytes()),
        ("pillar.prop".to_owned(), cylinder_mesh(50.0, 400.0, 12).to_bytes()),
        ("sky.txa".to_owned(), vec![0x7f; 64]),
    ];
    let npc_files = vec![
        ("neo.moa".to_owned(), vec![0x11; 96]),
        ("agent.moa".to_owned(), vec![0x22; 96]),
    ];

    // 1. Containers.
    println!("1. Writing containers...");
    let mut manifest_entries = Vec::new();
    for (container_name, files) in [("worlds_3g.pkb", &world_files), ("char_npc.pkb", &npc_files)] {
        let builder = files
            .iter()
            .fold(ContainerBuilder::new(), |b, (name, payload)| {
                b.file(name.clone(), payload.clone())
            });

        manifest_entries.extend(builder.directory().into_iter().map(|entry| IndexEntry {
            filename: entry.filename,
            container_name: container_name.to_owned(),
            offset: entry.offset,
            size: entry.size,
        }));

        let bytes = builder.build();
        let path = output_path.join(container_name);
        fs::write(&path, &bytes)?;
        println!(
            "   Saved {} files, {} bytes to {}",
            files.len(),
            bytes.len(),
            path.display()
        );
    }

    // 2. Manifest.
    println!("\n2. Writing manifest...");
    let manifest = encode_manifest(&manifest_entries);
    let manifest_path = output_path.join(MANIFEST_NAME);
    fs::write(&manifest_path, &manifest)?;
    println!(
        "   Saved {} entries, {} bytes to {}",
        manifest_entries.len(),
        manifest.len(),
        manifest_path.display()
    );

    // 3. Loose meshes.
    println!("\n3. Writing loose meshes...");
    for (name, payload) in world_files.iter().filter(|(name, _)| name.ends_with(".prop")) {
        let path = output_path.join(name);
        fs::write(&path, payload)?;
        println!("   Saved {} bytes to {}", payload.len(), path.display());
    }

    println!("\nDone.");
    Ok(())
}

/// Axis-aligned box in source units, Z up, with per-vertex UVs and normals.
fn box_mesh(width: f32, depth: f32, height: f32) -> PropMesh {
    let (hx, hy) = (width / 2.0, depth / 2.0);
    let corners = [
        [-hx, -hy, 0.0],
        [hx, -hy, 0.0],
        [hx, hy, 0.0],
        [-hx, hy, 0.0],
        [-hx, -hy, height],
        [hx, -hy, height],
        [hx, hy, height],
        [-hx, hy, height],
    ];
    let faces = vec![
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [1, 2, 6],
        [1, 6, 5],
        [2, 3, 7],
        [2, 7, 6],
        [3, 0, 4],
        [3, 4, 7],
    ];
    let uvs = corners
        .iter()
        .map(|&[x, y, _]| [x / width + 0.5, y / depth + 0.5])
        .collect();
    let normals = corners
        .iter()
        .map(|&[x, y, z]| {
            let n = [x, y, z - height / 2.0];
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            [n[0] / len, n[1] / len, n[2] / len]
        })
        .collect();

    PropMesh {
        vertices: corners.to_vec(),
        faces,
        uvs,
        normals,
    }
}

/// Open cylinder around the Z axis. No UVs or normals.
fn cylinder_mesh(radius: f32, height: f32, segments: u32) -> PropMesh {
    let mut vertices = Vec::new();
    for i in 0..segments {
        #[allow(clippy::cast_precision_loss)]
        let angle = TAU * i as f32 / segments as f32;
        let (x, y) = (radius * angle.cos(), radius * angle.sin());
        vertices.push([x, y, 0.0]);
        vertices.push([x, y, height]);
    }

    let mut faces = Vec::new();
    for i in 0..segments {
        let next = (i + 1) % segments;
        let (a, b, c, d) = (i * 2, i * 2 + 1, next * 2, next * 2 + 1);
        faces.push([a, c, b]);
        faces.push([b, c, d]);
    }

    PropMesh {
        vertices,
        faces,
        ..PropMesh::default()
    }
}
