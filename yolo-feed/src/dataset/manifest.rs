use super::{AnnotationRecord, RawBox};
use crate::{
    common::*,
    error::{LoaderError, LoaderResult},
};

const FIELDS_PER_BOX: usize = 5;

/// The parsed manifest, shared read-only by loader workers.
#[derive(Debug, Clone)]
pub struct AnnotationIndex {
    records: Arc<[AnnotationRecord]>,
}

impl AnnotationIndex {
    /// Read and parse a manifest file.
    pub fn open(path: impl AsRef<Path>) -> LoaderResult<Self> {
        let records = parse(path)?;
        Ok(Self {
            records: records.into(),
        })
    }

    pub fn records(&self) -> &Arc<[AnnotationRecord]> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse a manifest file into records, keeping the line order.
///
/// Each line has the form `<image_path> (<xmin> <ymin> <xmax> <ymax> <class_id>)*`.
pub fn parse(path: impl AsRef<Path>) -> LoaderResult<Vec<AnnotationRecord>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoaderError::ManifestIo {
        path: path.to_owned(),
        source,
    })?;
    parse_str(path, &text)
}

/// Parse manifest text. `path` is only used in error messages.
pub fn parse_str(path: impl AsRef<Path>, text: &str) -> LoaderResult<Vec<AnnotationRecord>> {
    let path = path.as_ref();

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            parse_line(line).map_err(|reason| LoaderError::Manifest {
                path: path.to_owned(),
                line: index + 1,
                reason,
            })
        })
        .collect()
}

fn parse_line(line: &str) -> Result<AnnotationRecord, String> {
    let mut fields = line.split_whitespace();
    let image_path = fields
        .next()
        .ok_or_else(|| "missing image path".to_string())?;
    let box_fields: Vec<_> = fields.collect();

    if box_fields.len() % FIELDS_PER_BOX != 0 {
        return Err(format!(
            "expect the image path followed by groups of {} box fields, but found {} box fields",
            FIELDS_PER_BOX,
            box_fields.len()
        ));
    }

    let boxes = box_fields
        .chunks(FIELDS_PER_BOX)
        .map(|chunk| -> Result<_, String> {
            let coord = |field: &str| {
                field
                    .parse::<i64>()
                    .map_err(|_| format!("'{}' is not an integer coordinate", field))
            };
            let class_id = chunk[4]
                .parse::<usize>()
                .map_err(|_| format!("'{}' is not a class id", chunk[4]))?;
            let class_id = NonZeroUsize::new(class_id)
                .ok_or_else(|| "class id 0 is reserved and cannot label an object".to_string())?;

            Ok(RawBox {
                xmin: coord(chunk[0])?,
                ymin: coord(chunk[1])?,
                xmax: coord(chunk[2])?,
                ymax: coord(chunk[3])?,
                class_id,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AnnotationRecord {
        image_path: PathBuf::from(image_path),
        boxes,
    })
}
