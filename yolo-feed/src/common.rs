pub use anyhow::{ensure, Context as _, Result};
pub use bbox::{Rect, RectNum, Transform, TLBR};
pub use itertools::{izip, Itertools as _};
pub use label::Label;
pub use ndarray::{s, Array1, Array2, Array3, Array4, Axis};
pub use noisy_float::prelude::*;
pub use rand::{prelude::*, rngs::StdRng, seq::SliceRandom};
pub use serde::{Deserialize, Serialize};
pub use std::{
    fmt::Debug,
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
pub use tracing::{debug, info, trace, warn};
