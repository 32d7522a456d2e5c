//! Plain-text persistence of `Weights`.
//!
//! A checkpoint holds one section per tensor, in canonical order: the tensor's name on its own
//! line, then one line per row of whitespace-separated numbers, then a blank line. Vectors are
//! stored as columns, one entry per line. The through matrix may be missing, in which case its
//! section is omitted. A leading `#` line, if present, is treated as a version tag and ignored.
//!
//! A matrix without columns has no row lines at all, since an empty line ends its section.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    iter::Peekable,
    path::Path,
};

use log::info;
use ndarray::{Array2, ArrayD, Axis, Ix1, Ix2};

use crate::{Dims, DynErr, Real, Result, WeightName, Weights};

/// Encodes `weights` in checkpoint format.
///
/// Numbers are written with their shortest exact representation, so decoding gives back
/// the same values bit for bit.
///
/// # Arguments
/// * `weights` - The weights to encode.
/// * `writer` - Where to write the checkpoint to.
pub fn write_weights<W: Write>(weights: &Weights, mut writer: W) -> Result<()> {
    for (name, tensor) in weights.tensors() {
        writeln!(writer, "{name}")?;

        if let Ok(vector) = tensor.view().into_dimensionality::<Ix1>() {
            for x in vector {
                writeln!(writer, "{x}")?;
            }
        } else if let Ok(matrix) = tensor.into_dimensionality::<Ix2>() {
            if matrix.ncols() > 0 {
                for row in matrix.rows() {
                    let line: Vec<_> = row.iter().map(Real::to_string).collect();
                    writeln!(writer, "{}", line.join(" "))?;
                }
            }
        }

        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Decodes a checkpoint, inferring every shape from the file itself.
///
/// # Arguments
/// * `reader` - Where to read the checkpoint from.
///
/// # Returns
/// The decoded weights or an error if the checkpoint is malformed.
pub fn read_weights<R: BufRead>(reader: R) -> Result<Weights> {
    let tensors = decode_tensors(reader, None)?;

    let len_of = |name: WeightName| {
        tensors
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, t)| t.len_of(Axis(0)))
            .unwrap_or(0)
    };

    // Column counts are only known from matrices with at least one row.
    let input = tensors
        .iter()
        .find(|(name, t)| {
            matches!(name, WeightName::In | WeightName::Through) && t.len_of(Axis(0)) > 0
        })
        .map(|(_, t)| t.len_of(Axis(1)))
        .unwrap_or(0);

    let dims = Dims::new(
        input,
        len_of(WeightName::OutBias),
        len_of(WeightName::InBias),
    );

    let mut weights = Weights::zeros(dims);
    if !tensors.iter().any(|(name, _)| *name == WeightName::Through) {
        weights = weights.without_through();
    }

    fill(&mut weights, tensors)?;
    Ok(weights)
}

/// Decodes a checkpoint into `weights`, whose layout every section must match.
///
/// Nothing is written to `weights` unless the whole checkpoint decodes successfully.
///
/// # Arguments
/// * `weights` - The template to load into.
/// * `reader` - Where to read the checkpoint from.
pub fn read_weights_into<R: BufRead>(weights: &mut Weights, reader: R) -> Result<()> {
    let tensors = decode_tensors(reader, Some(weights.has_through()))?;
    fill(weights, tensors)
}

/// Writes `weights` to a checkpoint file at `path`, replacing it if it exists.
pub fn save<P: AsRef<Path>>(weights: &Weights, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_weights(weights, BufWriter::new(file))?;

    info!(path:? = path; "saved checkpoint");
    Ok(())
}

/// Reads the checkpoint file at `path`, inferring every shape from it.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Weights> {
    let file = File::open(path)?;
    read_weights(BufReader::new(file))
}

/// Reads the checkpoint file at `path` into `weights`, see `read_weights_into`.
pub fn load_into<P: AsRef<Path>>(weights: &mut Weights, path: P) -> Result<()> {
    let file = File::open(path)?;
    read_weights_into(weights, BufReader::new(file))
}

/// A raw section: the header line and the row lines under it.
struct Section {
    header: String,
    rows: Vec<String>,
}

/// Splits the checkpoint in sections separated by blank lines.
struct Sections<I: Iterator<Item = std::io::Result<String>>> {
    lines: Peekable<I>,
}

impl<I: Iterator<Item = std::io::Result<String>>> Sections<I> {
    fn new(lines: I) -> Self {
        let mut lines = lines.peekable();

        // Optional version tag.
        while let Some(Ok(line)) = lines.peek() {
            let line = line.trim();
            if !line.is_empty() && !line.starts_with('#') {
                break;
            }
            lines.next();
        }

        Self { lines }
    }

    fn next_section(&mut self) -> Result<Option<Section>> {
        let header = loop {
            match self.lines.next() {
                None => return Ok(None),
                Some(line) => {
                    let line = line?;
                    let line = line.trim();
                    if !line.is_empty() {
                        break line.to_string();
                    }
                }
            }
        };

        let mut rows = Vec::new();
        for line in self.lines.by_ref() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            rows.push(line.to_string());
        }

        Ok(Some(Section { header, rows }))
    }
}

/// Reads every section in canonical order.
///
/// # Arguments
/// * `reader` - Where to read the checkpoint from.
/// * `through` - Whether the through matrix section must be present, or `None` to accept
///   either.
fn decode_tensors<R: BufRead>(
    reader: R,
    through: Option<bool>,
) -> Result<Vec<(WeightName, ArrayD<Real>)>> {
    let mut sections = Sections::new(reader.lines());
    let mut pending = sections.next_section()?;
    let mut tensors = Vec::with_capacity(WeightName::ALL.len());

    for name in WeightName::ALL {
        if name == WeightName::Through {
            let present = pending.as_ref().is_some_and(|s| s.header == name.as_str());

            match through {
                Some(false) => continue,
                None if !present => continue,
                _ => {}
            }
        }

        let Some(section) = pending.take() else {
            return Err(DynErr::UnexpectedEof {
                expected: name.as_str(),
            });
        };

        if section.header != name.as_str() {
            return Err(DynErr::SectionMismatch {
                expected: name.as_str(),
                got: section.header,
            });
        }

        tensors.push((name, parse_tensor(name, &section.rows)?));
        pending = sections.next_section()?;
    }

    if let Some(extra) = pending {
        return Err(DynErr::SectionMismatch {
            expected: "end of checkpoint",
            got: extra.header,
        });
    }

    Ok(tensors)
}

fn is_vector(name: WeightName) -> bool {
    matches!(name, WeightName::OutBias | WeightName::InBias)
}

fn parse_tensor(name: WeightName, rows: &[String]) -> Result<ArrayD<Real>> {
    let tensor = name.as_str();
    let malformed = |reason: String| DynErr::MalformedSection { tensor, reason };

    let mut values = Vec::new();
    let mut cols = None;

    for (i, row) in rows.iter().enumerate() {
        let before = values.len();
        for token in row.split_whitespace() {
            let x = token.parse::<Real>().map_err(|e| {
                malformed(format!("row {i}: invalid number '{token}': {e}"))
            })?;
            values.push(x);
        }

        let width = values.len() - before;
        match cols {
            None => cols = Some(width),
            Some(expected) if expected != width => {
                return Err(malformed(format!(
                    "row {i} has {width} entries while previous rows have {expected}"
                )));
            }
            _ => {}
        }
    }

    let cols = cols.unwrap_or(0);

    if is_vector(name) {
        if !rows.is_empty() && cols != 1 {
            return Err(malformed(format!("vectors hold one entry per line, got {cols}")));
        }

        return ArrayD::from_shape_vec(vec![values.len()], values)
            .map_err(|e| malformed(e.to_string()));
    }

    let matrix = Array2::from_shape_vec((rows.len(), cols), values)
        .map_err(|e| malformed(e.to_string()))?;
    Ok(matrix.into_dyn())
}

/// Copies decoded tensors into `weights` once every shape has been checked.
fn fill(weights: &mut Weights, tensors: Vec<(WeightName, ArrayD<Real>)>) -> Result<()> {
    {
        let expected = weights.tensors();

        if expected.len() != tensors.len() {
            return Err(DynErr::SizeMismatch {
                what: "checkpoint sections",
                got: tensors.len(),
                expected: expected.len(),
            });
        }

        for ((name, target), (_, decoded)) in expected.iter().zip(&tensors) {
            let both_empty = target.is_empty() && decoded.is_empty();
            if !both_empty && target.shape() != decoded.shape() {
                return Err(DynErr::MalformedSection {
                    tensor: name.as_str(),
                    reason: format!(
                        "expected shape {:?}, got {:?}",
                        target.shape(),
                        decoded.shape()
                    ),
                });
            }
        }
    }

    for ((_, mut target), (_, decoded)) in weights.tensors_mut().into_iter().zip(tensors) {
        if !target.is_empty() {
            target.assign(&decoded);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use ndarray::array;

    use super::*;

    fn small() -> Weights {
        let mut w = Weights::zeros(Dims::new(1, 1, 2));
        w.m_out = array![[0.1, -2.5]];
        w.b_out = array![3.0];
        w.m_through = Some(array![[1e-9]]);
        w.m_in = array![[1.0], [2.0]];
        w.b_in = array![-0.5, 0.25];
        w
    }

    fn encode(w: &Weights) -> String {
        let mut buf = Vec::new();
        write_weights(w, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn encodes_sections_in_canonical_order() {
        let text = encode(&small());
        let expected = "m_out\n0.1 -2.5\n\n\
                        b_out\n3\n\n\
                        m_through\n0.000000001\n\n\
                        m_in\n1\n2\n\n\
                        b_in\n-0.5\n0.25\n\n\
                        m_latent\n0 0\n0 0\n\n\
                        m_latent_1\n0 0\n0 0\n\n\
                        m_latent_2\n0 0\n0 0\n\n";

        assert_eq!(text, expected);
    }

    #[test]
    fn skips_absent_through_matrix() {
        let w = small().without_through();
        let text = encode(&w);
        assert!(!text.contains("m_through"));

        let decoded = read_weights(Cursor::new(text)).unwrap();
        assert!(!decoded.has_through());
        assert_eq!(decoded, w);
    }

    #[test]
    fn accepts_version_tag_and_padding() {
        let padded = encode(&small()).replace("0.1 -2.5", "  0.1   -2.5");
        let text = format!("# v1\n\n{padded}");
        assert_eq!(read_weights(Cursor::new(text)).unwrap(), small());
    }

    #[test]
    fn parse_rejects_ragged_rows() {
        let rows = vec!["1 2".to_string(), "3".to_string()];
        let err = parse_tensor(WeightName::Latent, &rows).unwrap_err();
        assert!(matches!(
            err,
            DynErr::MalformedSection {
                tensor: "m_latent",
                ..
            }
        ));
    }

    #[test]
    fn zero_width_matrices_have_no_row_lines() {
        let text = encode(&Weights::zeros(Dims::new(0, 1, 1)));
        let head = "m_out\n0\n\nb_out\n0\n\nm_through\n\nm_in\n\nb_in\n";
        assert!(text.starts_with(head), "{text}");
    }
}
