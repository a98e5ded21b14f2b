mod rate_counter;

use anyhow::{Context, Result};
use rate_counter::RateCounter;
use std::{env, path::PathBuf, sync::Arc};
use structopt::StructOpt;
use tracing::{info, info_span};
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};
use yolo_feed::{config::Config, dataset::FileDecoder, processor::Mode, ImageProcessor};

#[derive(Debug, Clone, StructOpt)]
/// Stream augmented and encoded batches from a dataset and report the throughput
struct Args {
    #[structopt(long, default_value = "feed.json5")]
    /// configuration file
    pub config_file: PathBuf,
    #[structopt(long)]
    /// override the number of batches to pull
    pub steps: Option<usize>,
}

pub fn main() -> Result<()> {
    // setup tracing
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).compact();
    let filter_layer = {
        let filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            filter.add_directive(LevelFilter::INFO.into())
        } else {
            filter
        }
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    // parse arguments
    let Args { config_file, steps } = Args::from_args();
    let config = Config::open(&config_file)
        .with_context(|| format!("failed to load config file '{}'", config_file.display()))?;

    let _span = info_span!("feed").entered();
    let mut processor = ImageProcessor::new(&config, Arc::new(FileDecoder))?;
    let batch_size = config.tool.batch_size.get();
    let steps = steps.or(config.tool.steps);

    let mut rate_counter = RateCounter::with_second_interval();
    let mut step = 0;

    while steps.map_or(true, |steps| step < steps) {
        let (images, labels) = processor.next_train_batch(batch_size)?;
        let augmented = processor.augment(images, labels, Mode::Train)?;
        let encoded = processor.process_batch_labels(&augmented.labels)?;
        let n_objects: i32 = encoded.object_counts.sum();

        rate_counter.add(batch_size as f64);
        if let Some(rate) = rate_counter.rate() {
            let (queued, capacity) = processor.train_queue_fill();
            info!(
                "step {}: {:.2} samples/s, {} objects in last batch, queue {}/{}",
                step, rate, n_objects, queued, capacity
            );
        }
        step += 1;
    }

    // evaluate the pipeline on the held-out sets once
    for (name, len) in [("valid", processor.n_valid()), ("test", processor.n_test())] {
        let mut offset = 0;
        let mut n_objects = 0;

        while offset < len {
            let (images, labels) = match name {
                "valid" => processor.get_valid_batch(offset, batch_size)?,
                _ => processor.get_test_batch(offset, batch_size)?,
            };
            let augmented = processor.augment(images.to_vec(), labels.to_vec(), Mode::Eval)?;
            let encoded = processor.process_batch_labels(&augmented.labels)?;
            n_objects += encoded.object_counts.sum();
            offset += images.len();
        }
        info!("{} set: {} samples, {} objects", name, len, n_objects);
    }

    processor.stop();
    Ok(())
}
