//! Data feeder configuration format.

use crate::{
    common::*,
    encoder::GridEncoder,
    processor::{
        AugmentationInit, GaussianNoiseInit, Mode, RandomCropInit, RandomFlipInit,
        RandomResizeInit,
    },
};

pub use augmentation::*;
pub use dataset::*;
pub use loader::*;

/// The main data feeder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub augmentation: AugmentationConfig,
    #[serde(default)]
    pub tool: ToolConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Self = json5::from_str(&text)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the parameters that the types cannot express.
    pub fn validate(&self) -> Result<()> {
        let AugmentationConfig {
            jitter,
            scale_range: (min_scale, max_scale),
            noise_std,
            ..
        } = self.augmentation;

        ensure!(
            (0.0..1.0).contains(&jitter.raw()),
            "augmentation.jitter must be in range [0, 1)"
        );
        ensure!(
            min_scale > 0.0 && min_scale <= max_scale,
            "augmentation.scale_range must be an increasing pair of positive numbers"
        );
        ensure!(
            noise_std >= 0.0,
            "augmentation.noise_std must be non-negative"
        );
        Ok(())
    }
}

mod dataset {
    use super::*;

    /// Dataset options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct DatasetConfig {
        /// The directory containing `train.txt`, `valid.txt` and `test.txt`.
        pub dir: PathBuf,
        /// The side length of augmented square images.
        #[serde(default = "default_image_size")]
        pub image_size: NonZeroUsize,
        #[serde(default = "default_max_objects_per_image")]
        pub max_objects_per_image: NonZeroUsize,
        /// The number of grid cells along each image side.
        #[serde(default = "default_grid_size")]
        pub grid_size: NonZeroUsize,
        #[serde(default = "default_n_classes")]
        pub n_classes: NonZeroUsize,
    }

    impl DatasetConfig {
        pub fn train_manifest(&self) -> PathBuf {
            self.dir.join("train.txt")
        }

        pub fn valid_manifest(&self) -> PathBuf {
            self.dir.join("valid.txt")
        }

        pub fn test_manifest(&self) -> PathBuf {
            self.dir.join("test.txt")
        }

        pub fn grid_encoder(&self) -> Result<GridEncoder> {
            GridEncoder::new(
                self.grid_size.get(),
                self.n_classes.get(),
                self.max_objects_per_image.get(),
            )
        }
    }

    fn default_image_size() -> NonZeroUsize {
        NonZeroUsize::new(288).unwrap()
    }

    fn default_max_objects_per_image() -> NonZeroUsize {
        NonZeroUsize::new(20).unwrap()
    }

    fn default_grid_size() -> NonZeroUsize {
        NonZeroUsize::new(7).unwrap()
    }

    fn default_n_classes() -> NonZeroUsize {
        NonZeroUsize::new(1).unwrap()
    }
}

mod loader {
    use super::*;

    /// Worker pool and queue options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct LoaderConfig {
        /// The number of workers filling the training queue.
        #[serde(default = "default_n_threads")]
        pub n_producer_threads: NonZeroUsize,
        /// The number of workers loading the validation and test sets.
        #[serde(default = "default_n_threads")]
        pub n_whole_set_threads: NonZeroUsize,
        /// The maximum number of decoded training samples held in memory.
        #[serde(default = "default_queue_capacity")]
        pub queue_capacity: NonZeroUsize,
    }

    impl Default for LoaderConfig {
        fn default() -> Self {
            Self {
                n_producer_threads: default_n_threads(),
                n_whole_set_threads: default_n_threads(),
                queue_capacity: default_queue_capacity(),
            }
        }
    }

    fn default_n_threads() -> NonZeroUsize {
        NonZeroUsize::new(5).unwrap()
    }

    fn default_queue_capacity() -> NonZeroUsize {
        NonZeroUsize::new(10000).unwrap()
    }
}

mod augmentation {
    use super::*;

    /// Augmentation options. Every step is disabled by default.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AugmentationConfig {
        #[serde(default)]
        pub resize: bool,
        #[serde(default = "default_jitter")]
        pub jitter: R64,
        #[serde(default = "default_scale_range")]
        pub scale_range: (R64, R64),
        #[serde(default)]
        pub crop: bool,
        #[serde(default = "default_padding")]
        pub padding: usize,
        #[serde(default)]
        pub flip: bool,
        #[serde(default)]
        pub whiten: bool,
        #[serde(default)]
        pub noise: bool,
        #[serde(default = "default_noise_mean")]
        pub noise_mean: R64,
        #[serde(default = "default_noise_std")]
        pub noise_std: R64,
    }

    impl AugmentationConfig {
        /// Build the pipeline initializer of the given mode.
        ///
        /// The random crop, flip and noise steps are training only, so an
        /// evaluation pipeline keeps at most the resize and whitening steps.
        pub fn to_init(&self, mode: Mode, image_size: usize) -> AugmentationInit {
            let Self {
                resize,
                jitter,
                scale_range,
                crop,
                padding,
                flip,
                whiten,
                noise,
                noise_mean,
                noise_std,
            } = *self;
            let train = mode == Mode::Train;

            AugmentationInit {
                resize: resize.then(|| RandomResizeInit {
                    image_size,
                    jitter,
                    scale_range,
                    mode,
                }),
                crop: (train && crop).then(|| RandomCropInit { padding }),
                flip: (train && flip).then(RandomFlipInit::default),
                whiten,
                noise: (train && noise).then(|| GaussianNoiseInit {
                    mean: noise_mean,
                    std: noise_std,
                }),
            }
        }
    }

    impl Default for AugmentationConfig {
        fn default() -> Self {
            Self {
                resize: false,
                jitter: default_jitter(),
                scale_range: default_scale_range(),
                crop: false,
                padding: default_padding(),
                flip: false,
                whiten: false,
                noise: false,
                noise_mean: default_noise_mean(),
                noise_std: default_noise_std(),
            }
        }
    }

    fn default_jitter() -> R64 {
        r64(0.2)
    }

    fn default_scale_range() -> (R64, R64) {
        (r64(0.5), r64(1.5))
    }

    fn default_padding() -> usize {
        20
    }

    fn default_noise_mean() -> R64 {
        r64(0.0)
    }

    fn default_noise_std() -> R64 {
        r64(0.01)
    }
}

/// Options of the feed-tool program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: NonZeroUsize,
    /// The number of batches to pull. Runs until interrupted if unset.
    #[serde(default)]
    pub steps: Option<usize>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            steps: None,
        }
    }
}

fn default_batch_size() -> NonZeroUsize {
    NonZeroUsize::new(32).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() -> Result<()> {
        let config: Config = json5::from_str("{ dataset: { dir: '/data/set' } }")?;
        config.validate()?;

        assert_eq!(config.dataset.image_size.get(), 288);
        assert_eq!(config.dataset.max_objects_per_image.get(), 20);
        assert_eq!(config.dataset.grid_size.get(), 7);
        assert_eq!(config.dataset.n_classes.get(), 1);
        assert_eq!(config.loader.n_producer_threads.get(), 5);
        assert_eq!(config.loader.queue_capacity.get(), 10000);
        assert_eq!(config.augmentation.padding, 20);
        assert_eq!(config.augmentation.noise_std, r64(0.01));
        assert!(!config.augmentation.resize);
        assert_eq!(
            config.dataset.valid_manifest(),
            Path::new("/data/set/valid.txt")
        );
        Ok(())
    }

    #[test]
    fn to_init_enables_selected_steps() -> Result<()> {
        let config: Config = json5::from_str(
            r#"{
                dataset: { dir: 'data', image_size: 64 },
                augmentation: { resize: true, flip: true, noise: true, noise_std: 0.1 },
            }"#,
        )?;
        let init = config
            .augmentation
            .to_init(Mode::Train, config.dataset.image_size.get());

        let resize = init.resize.clone().unwrap();
        assert_eq!(resize.image_size, 64);
        assert_eq!(resize.mode, Mode::Train);
        assert!(init.crop.is_none());
        assert!(init.flip.is_some());
        assert!(!init.whiten);
        assert_eq!(init.noise.clone().unwrap().std, r64(0.1));

        init.build()?;
        Ok(())
    }

    #[test]
    fn eval_init_skips_random_steps() -> Result<()> {
        let config: Config = json5::from_str(
            r#"{
                dataset: { dir: 'data', image_size: 16 },
                augmentation: { resize: true, crop: true, flip: true, whiten: true, noise: true },
            }"#,
        )?;
        let init = config
            .augmentation
            .to_init(Mode::Eval, config.dataset.image_size.get());

        assert_eq!(init.resize.clone().unwrap().mode, Mode::Eval);
        assert!(init.whiten);
        assert!(init.crop.is_none());
        assert!(init.flip.is_none());
        assert!(init.noise.is_none());

        // the evaluation pipeline gives the same output on every call
        let pipeline = init.build()?;
        let image = Array3::from_shape_fn((12, 20, 3), |(row, col, channel)| {
            (row * 10 + col * 3 + channel) as u8
        });
        let labels = vec![Label {
            rect: TLBR::from_tlbr([0.0, 0.0, 0.5, 0.5]),
            class: NonZeroUsize::new(1).unwrap(),
        }];
        let first = pipeline.augment(vec![image.clone()], vec![labels.clone()])?;
        let second = pipeline.augment(vec![image], vec![labels.clone()])?;
        assert_eq!(first.images, second.images);
        assert_eq!(first.labels, vec![labels]);
        Ok(())
    }

    #[test]
    fn reject_zero_counts_and_bad_ranges() {
        let result = json5::from_str::<Config>("{ dataset: { dir: 'data', grid_size: 0 } }");
        assert!(result.is_err());

        let config: Config = json5::from_str(
            "{ dataset: { dir: 'data' }, augmentation: { scale_range: [2.0, 1.0] } }",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn open_config_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("feed.json5");
        fs::write(&path, "{ dataset: { dir: 'data' }, tool: { batch_size: 4, steps: 10 } }")?;

        let config = Config::open(&path)?;
        assert_eq!(config.tool.batch_size.get(), 4);
        assert_eq!(config.tool.steps, Some(10));
        assert!(Config::open(dir.path().join("missing.json5")).is_err());
        Ok(())
    }
}
