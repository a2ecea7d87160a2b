use crate::db::core::Design;
use crate::geom::coord::Coordinate;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Malformed-input errors, each carrying the 1-based input line number so
/// the caller can report file/line context without re-scanning the file.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("line {line}: malformed header '{raw}' (expected W,H,bend_penalty,via_penalty)")]
    MalformedHeader { line: usize, raw: String },
    #[error("line {line}: malformed coordinate tuple '{raw}'")]
    MalformedCoordinate { line: usize, raw: String },
    #[error("line {line}: {field} value {value} out of range")]
    OutOfRange {
        line: usize,
        field: &'static str,
        value: i64,
    },
    #[error("line {line}: net '{name}' has no pins")]
    EmptyNet { line: usize, name: String },
    #[error("io error reading input: {0}")]
    Io(#[from] std::io::Error),
}

/// Parses the plain-text routing input format described in the router's
/// external interfaces: a header line, `OBS(layer,x,y)` obstacle lines,
/// and `netN (layer,x,y) ...` pin-list lines. Blank lines and lines whose
/// leading token isn't recognized are silently ignored.
pub fn parse(path: impl AsRef<Path>) -> Result<Design, ParseError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let header = lines
        .next()
        .ok_or_else(|| ParseError::MalformedHeader {
            line: 1,
            raw: String::new(),
        })??;
    let mut design = parse_header(&header, 1)?;

    for (idx, line) in lines.enumerate() {
        let line_no = idx + 2;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("OBS") {
            let (layer, x, y) = parse_tuple(rest.trim(), line_no)?;
            validate_obstacle(&design, layer, x, y, line_no)?;
            design.add_obstacle(Coordinate::new(layer, x, y));
        } else if let Some(paren) = trimmed.find('(')
            && trimmed.len() >= 3
            && trimmed[..3].eq_ignore_ascii_case("net")
        {
            let name = trimmed[..paren].trim();
            if name.is_empty() {
                continue;
            }
            let mut any_pin = false;
            for group in trimmed[paren..].split('(').skip(0) {
                let group = group.trim();
                if group.is_empty() {
                    continue;
                }
                let (layer, x, y) = parse_tuple(group, line_no)?;
                validate_in_bounds(&design, layer, x, y, line_no)?;
                design.add_pin(name, Coordinate::new(layer, x, y));
                any_pin = true;
            }
            if !any_pin {
                return Err(ParseError::EmptyNet {
                    line: line_no,
                    name: name.to_string(),
                });
            }
        }
        // Any other leading token is ignored, per the format spec.
    }

    Ok(design)
}

fn parse_header(line: &str, line_no: usize) -> Result<Design, ParseError> {
    let parts: Vec<&str> = line.trim().split(',').collect();
    if parts.len() != 4 {
        return Err(ParseError::MalformedHeader {
            line: line_no,
            raw: line.to_string(),
        });
    }
    let mut values = [0i64; 4];
    for (i, part) in parts.iter().enumerate() {
        values[i] = part
            .trim()
            .parse::<i64>()
            .map_err(|_| ParseError::MalformedHeader {
                line: line_no,
                raw: line.to_string(),
            })?;
        if values[i] < 0 {
            return Err(ParseError::OutOfRange {
                line: line_no,
                field: HEADER_FIELDS[i],
                value: values[i],
            });
        }
    }
    Ok(Design::new(
        values[0] as u32,
        values[1] as u32,
        values[2] as u32,
        values[3] as u32,
    ))
}

const HEADER_FIELDS: [&str; 4] = ["width", "height", "bend_penalty", "via_penalty"];

/// Parses `"layer,x,y"` (parens already stripped by the caller), e.g. the
/// body of `OBS(0,5,7)` or a single pin group inside a net line.
fn parse_tuple(raw: &str, line_no: usize) -> Result<(u8, u32, u32), ParseError> {
    let inner = raw
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim_end_matches(',');
    let parts: Vec<&str> = inner.split(',').collect();
    if parts.len() != 3 {
        return Err(ParseError::MalformedCoordinate {
            line: line_no,
            raw: raw.to_string(),
        });
    }
    let parse_i64 = |s: &str| {
        s.trim()
            .parse::<i64>()
            .map_err(|_| ParseError::MalformedCoordinate {
                line: line_no,
                raw: raw.to_string(),
            })
    };
    let layer = parse_i64(parts[0])?;
    let x = parse_i64(parts[1])?;
    let y = parse_i64(parts[2])?;

    if !(0..=1).contains(&layer) {
        return Err(ParseError::OutOfRange {
            line: line_no,
            field: "layer",
            value: layer,
        });
    }
    if x < 0 {
        return Err(ParseError::OutOfRange {
            line: line_no,
            field: "x",
            value: x,
        });
    }
    if y < 0 {
        return Err(ParseError::OutOfRange {
            line: line_no,
            field: "y",
            value: y,
        });
    }
    Ok((layer as u8, x as u32, y as u32))
}

fn validate_in_bounds(
    design: &Design,
    layer: u8,
    x: u32,
    y: u32,
    line_no: usize,
) -> Result<(), ParseError> {
    if x >= design.width {
        return Err(ParseError::OutOfRange {
            line: line_no,
            field: "x",
            value: x as i64,
        });
    }
    if y >= design.height {
        return Err(ParseError::OutOfRange {
            line: line_no,
            field: "y",
            value: y as i64,
        });
    }
    let _ = layer;
    Ok(())
}

fn validate_obstacle(
    design: &Design,
    layer: u8,
    x: u32,
    y: u32,
    line_no: usize,
) -> Result<(), ParseError> {
    validate_in_bounds(design, layer, x, y, line_no)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(contents: &str) -> tempfile_path::TempFile {
        tempfile_path::TempFile::new(contents)
    }

    // Minimal scratch-file helper so parser tests don't need a `tempfile`
    // dependency for a handful of small fixtures.
    mod tempfile_path {
        use std::fs;
        use std::path::PathBuf;
        use std::sync::atomic::{AtomicU64, Ordering};

        static COUNTER: AtomicU64 = AtomicU64::new(0);

        pub struct TempFile {
            pub path: PathBuf,
        }

        impl TempFile {
            pub fn new(contents: &str) -> Self {
                let id = COUNTER.fetch_add(1, Ordering::Relaxed);
                let mut path = std::env::temp_dir();
                path.push(format!("gridroute_parser_test_{}_{}.txt", std::process::id(), id));
                fs::write(&path, contents).unwrap();
                Self { path }
            }
        }

        impl Drop for TempFile {
            fn drop(&mut self) {
                let _ = fs::remove_file(&self.path);
            }
        }
    }

    #[test]
    fn parses_header_and_obstacle_and_net() {
        let f = write_temp("5,5,0,0\nOBS(0,2,0)\nnet0 (0,0,0) (0,4,0)\n");
        let design = parse(&f.path).unwrap();
        assert_eq!(design.width, 5);
        assert_eq!(design.height, 5);
        assert_eq!(design.obstacles, vec![Coordinate::new(0, 2, 0)]);
        assert_eq!(design.nets.len(), 1);
        assert_eq!(design.nets[0].name, "net0");
        assert_eq!(design.nets[0].pins.len(), 2);
    }

    #[test]
    fn ignores_blank_lines_and_unknown_tokens() {
        let f = write_temp("3,3,1,1\n\n# a comment\nfoo bar baz\n");
        let design = parse(&f.path).unwrap();
        assert!(design.obstacles.is_empty());
        assert!(design.nets.is_empty());
    }

    #[test]
    fn rejects_malformed_header() {
        let f = write_temp("not,a,header\n");
        let err = parse(&f.path).unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeader { .. }));
    }

    #[test]
    fn rejects_out_of_range_coordinate() {
        let f = write_temp("5,5,0,0\nOBS(0,99,0)\n");
        let err = parse(&f.path).unwrap_err();
        assert!(matches!(err, ParseError::OutOfRange { .. }));
    }

    #[test]
    fn net_token_first_three_chars_rule() {
        let f = write_temp("5,5,0,0\nnetwork_a (0,0,0) (0,1,0)\n");
        let design = parse(&f.path).unwrap();
        assert_eq!(design.nets[0].name, "network_a");
    }

    #[test]
    fn multi_pin_net_accumulates_all_pins() {
        let f = write_temp("10,10,0,0\nnet0 (0,0,0) (0,9,0) (0,5,5)\n");
        let design = parse(&f.path).unwrap();
        assert_eq!(design.nets[0].pins.len(), 3);
    }
}
