//! Reader for the UCR archive "TS" file format.
//!
//! A TS file opens with `@` directives (`@problemName`, `@univariate`,
//! `@classLabel`, …), switches to data mode at `@data`, then carries one
//! series per line: channels separated by `:`, comma-separated values inside
//! a channel, class label after the last `:`. `#` starts a comment line.

use std::path::Path;

use elastica_data::Dataset;
use elastica_dist::TimeSeries;
use tracing::{debug, info, instrument};

use crate::error::IoError;

/// Parsed contents of one TS file.
#[derive(Debug, Clone)]
pub struct TsFile {
    /// Value of `@problemName`, when present.
    pub problem_name: Option<String>,
    /// One series per data line.
    pub series: Vec<TimeSeries>,
    /// Class label per data line, as written.
    pub labels: Vec<String>,
}

/// Read and parse a TS file.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | the file cannot be read |
/// | [`IoError::Parse`] | a malformed directive or data line |
/// | [`IoError::EmptyFile`] | no data lines after `@data` |
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_ts_file(path: &Path) -> Result<TsFile, IoError> {
    let content = std::fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut problem_name = None;
    let mut in_data = false;
    let mut series = Vec::new();
    let mut labels = Vec::new();

    for (idx, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !in_data {
            if let Some(directive) = line.strip_prefix('@') {
                let mut parts = directive.split_whitespace();
                let key = parts.next().unwrap_or("");
                match key.to_ascii_lowercase().as_str() {
                    "data" => in_data = true,
                    "problemname" => problem_name = parts.next().map(ToString::to_string),
                    // Remaining directives describe what the data lines
                    // already tell us; accept and move on.
                    _ => {}
                }
                continue;
            }
            return Err(IoError::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                message: "expected an @ directive before @data".to_string(),
            });
        }
        let (ts, label) = parse_data_line(path, idx + 1, line)?;
        series.push(ts);
        labels.push(label);
    }

    if series.is_empty() {
        return Err(IoError::EmptyFile {
            path: path.to_path_buf(),
        });
    }
    debug!(rows = series.len(), "TS file parsed");
    Ok(TsFile {
        problem_name,
        series,
        labels,
    })
}

/// One data line: `v,v,…[:v,v,…]:label`.
fn parse_data_line(path: &Path, line_no: usize, line: &str) -> Result<(TimeSeries, String), IoError> {
    let parse_err = |message: String| IoError::Parse {
        path: path.to_path_buf(),
        line: line_no,
        message,
    };

    let mut sections: Vec<&str> = line.split(':').collect();
    if sections.len() < 2 {
        return Err(parse_err("missing ':' before the class label".to_string()));
    }
    let label = sections.pop().expect("at least two sections").trim().to_string();
    if label.is_empty() {
        return Err(parse_err("empty class label".to_string()));
    }

    // Each remaining section is one channel.
    let mut channels: Vec<Vec<f64>> = Vec::with_capacity(sections.len());
    for section in &sections {
        let values = section
            .split(',')
            .map(|v| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|_| parse_err(format!("unparseable value \"{}\"", v.trim())))
            })
            .collect::<Result<Vec<f64>, _>>()?;
        channels.push(values);
    }
    let dim = channels.len();
    let len = channels[0].len();
    for channel in &channels[1..] {
        if channel.len() != len {
            return Err(parse_err(format!(
                "channel lengths differ: {} vs {len}",
                channel.len()
            )));
        }
    }

    // Interleave by timestep.
    let mut values = Vec::with_capacity(len * dim);
    for t in 0..len {
        for channel in &channels {
            values.push(channel[t]);
        }
    }
    let ts = TimeSeries::multivariate(values, dim).map_err(|e| parse_err(e.to_string()))?;
    Ok((ts, label))
}

/// A loaded train/test pair sharing the training split's label encoder.
#[derive(Debug)]
pub struct TrainTest {
    /// The training split.
    pub train: Dataset,
    /// The test split, encoded with the training labels.
    pub test: Dataset,
}

/// Load `<ucr_dir>/<name>/<name>_TRAIN.ts` and `<name>_TEST.ts`.
///
/// # Errors
///
/// As [`read_ts_file`], plus [`IoError::Data`] when either split fails
/// dataset validation (e.g. a test label unseen at training time).
#[instrument(skip_all, fields(dataset = name))]
pub fn load_ucr_pair(ucr_dir: &Path, name: &str) -> Result<TrainTest, IoError> {
    let dir = ucr_dir.join(name);
    let train_file = read_ts_file(&dir.join(format!("{name}_TRAIN.ts")))?;
    let test_file = read_ts_file(&dir.join(format!("{name}_TEST.ts")))?;

    let train = Dataset::new(train_file.series, train_file.labels)?;
    let test = Dataset::with_encoder(
        test_file.series,
        test_file.labels,
        train.header().label_names(),
    )?;
    info!(
        train_size = train.len(),
        test_size = test.len(),
        nb_classes = train.header().nb_classes(),
        "dataset loaded"
    );
    Ok(TrainTest { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn parses_univariate_file() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "toy.ts",
            "#comment\n@problemName toy\n@univariate true\n@classLabel true 1 2\n@data\n1.0,2.0,3.0:1\n4.0,5.0,6.0:2\n",
        );
        let ts = read_ts_file(&tmp.path().join("toy.ts")).unwrap();
        assert_eq!(ts.problem_name.as_deref(), Some("toy"));
        assert_eq!(ts.series.len(), 2);
        assert_eq!(ts.series[0].as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(ts.labels, vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn parses_multivariate_line() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "m.ts", "@data\n1.0,2.0:10.0,20.0:a\n");
        let ts = read_ts_file(&tmp.path().join("m.ts")).unwrap();
        assert_eq!(ts.series[0].dim(), 2);
        // Interleaved by timestep.
        assert_eq!(ts.series[0].as_slice(), &[1.0, 10.0, 2.0, 20.0]);
    }

    #[test]
    fn variable_lengths_are_allowed() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "v.ts", "@data\n1.0,2.0:x\n1.0,2.0,3.0,4.0:x\n");
        let ts = read_ts_file(&tmp.path().join("v.ts")).unwrap();
        assert_eq!(ts.series[0].len(), 2);
        assert_eq!(ts.series[1].len(), 4);
    }

    #[test]
    fn rejects_bad_value() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "bad.ts", "@data\n1.0,abc:1\n");
        assert!(matches!(
            read_ts_file(&tmp.path().join("bad.ts")),
            Err(IoError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn rejects_missing_label() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "bad.ts", "@data\n1.0,2.0\n");
        assert!(matches!(
            read_ts_file(&tmp.path().join("bad.ts")),
            Err(IoError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_empty_data() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "empty.ts", "@problemName nope\n@data\n");
        assert!(matches!(
            read_ts_file(&tmp.path().join("empty.ts")),
            Err(IoError::EmptyFile { .. })
        ));
    }

    #[test]
    fn missing_file_errors() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_ts_file(&tmp.path().join("nope.ts")),
            Err(IoError::FileNotFound { .. })
        ));
    }
}
