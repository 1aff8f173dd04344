use std::{
    io::{BufReader, Cursor},
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::resources::mesh::MeshData;

/**
 * Loading of meshes and textures from external files.
 *
 * Files are resolved relative to `./assets` first, then the copy made by the
 * build script, then the crate's own `assets/` directory.
 */
pub mod mesh;
pub mod texture;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset {} could not be read", path.display())]
    Missing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("OBJ file {path} could not be decoded")]
    Obj {
        path: String,
        #[source]
        source: tobj::LoadError,
    },
    #[error("image {path} could not be decoded")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("mesh {0} contains no triangles")]
    EmptyMesh(String),
}

pub fn asset_path(file_name: &str) -> PathBuf {
    let local = Path::new("./").join("assets").join(file_name);
    if local.exists() {
        return local;
    }
    let built = Path::new(env!("OUT_DIR")).join("assets").join(file_name);
    if built.exists() {
        return built;
    }
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join(file_name)
}

pub async fn load_string(file_name: &str) -> Result<String, AssetError> {
    let path = asset_path(file_name);
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| AssetError::Missing { path, source })
}

pub async fn load_binary(file_name: &str) -> Result<Vec<u8>, AssetError> {
    let path = asset_path(file_name);
    tokio::fs::read(&path)
        .await
        .map_err(|source| AssetError::Missing { path, source })
}

/// Decode an OBJ file into a single mesh.
///
/// All objects of the file are merged; material libraries are ignored since
/// colour and texture are assigned per scene object.
pub async fn load_mesh_obj(file_name: &str) -> Result<MeshData, AssetError> {
    let obj_text = load_string(file_name).await?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, _materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| async move { Err(tobj::LoadError::OpenFileFailed) },
    )
    .await
    .map_err(|source| AssetError::Obj {
        path: file_name.to_string(),
        source,
    })?;

    let mesh = MeshData::from_obj_models(&models);
    if mesh.indices.is_empty() {
        return Err(AssetError::EmptyMesh(file_name.to_string()));
    }
    log::info!(
        "loaded {file_name}: {} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.indices.len() / 3
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_asset_is_reported_with_path() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let err = rt.block_on(load_binary("does/not/exist.png")).unwrap_err();
        assert!(matches!(err, AssetError::Missing { .. }));
        assert!(err.to_string().contains("exist.png"));
    }

    #[test]
    fn crystal_model_loads() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mesh = rt.block_on(load_mesh_obj("models/crystal.obj")).unwrap();
        assert_eq!(mesh.indices.len(), 8 * 3);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }
}
