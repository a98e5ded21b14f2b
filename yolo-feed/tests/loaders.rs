use anyhow::Result;
use std::sync::Arc;
use yolo_feed::{
    dataset::{AnnotationIndex, FileDecoder, ImageDecoder},
    loader::{StreamingLoaderInit, WholeSetLoader},
};

mod common;

fn file_decoder() -> Arc<dyn ImageDecoder> {
    Arc::new(FileDecoder)
}

#[test]
fn whole_set_loader_returns_every_record() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let manifest = common::write_dataset(dir.path(), "valid.txt", 12, "10 10 50 50 1")?;

    let dataset = WholeSetLoader::new(file_decoder(), 4, 20)?.load_manifest(&manifest)?;
    assert_eq!(dataset.len(), 12);

    let mut values: Vec<_> = dataset
        .images()
        .iter()
        .map(|image| {
            assert_eq!(image.dim(), (100, 100, 3));
            image[[50, 50, 0]]
        })
        .collect();
    values.sort_unstable();
    assert_eq!(values, (0..12).collect::<Vec<u8>>());
    assert!(dataset.labels().iter().all(|labels| labels.len() == 1));
    Ok(())
}

#[test]
fn whole_set_loader_skips_missing_images() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let manifest = common::write_dataset(dir.path(), "test.txt", 3, "")?;
    std::fs::remove_file(dir.path().join("1.png"))?;

    let dataset = WholeSetLoader::new(file_decoder(), 2, 20)?.load_manifest(&manifest)?;
    assert_eq!(dataset.len(), 2);
    Ok(())
}

#[test]
fn streaming_loader_serves_batches() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let manifest = common::write_dataset(dir.path(), "train.txt", 4, "0 0 20 20 1 40 40 90 90 2")?;
    let index = AnnotationIndex::open(&manifest)?;

    let mut loader = StreamingLoaderInit {
        n_workers: 2,
        queue_capacity: 3,
        max_objects: 1,
    }
    .build(index.records().clone(), file_decoder())?;

    for _ in 0..3 {
        let batch = loader.pull_batch(5)?;
        assert_eq!(batch.len(), 5);
        assert!(batch.iter().all(|sample| sample.labels.len() == 1));
    }

    loader.stop();
    Ok(())
}
