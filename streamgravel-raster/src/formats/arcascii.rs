use crate::{Raster, RasterConfigs};
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter, Error, ErrorKind};

fn parse_header_value(key: &str, value: &str) -> Result<f64, Error> {
    value.parse::<f64>().map_err(|_| {
        Error::new(
            ErrorKind::InvalidData,
            format!("Invalid value '{}' for ASCII grid header key '{}'.", value, key),
        )
    })
}

/// Reads an ESRI ASCII grid. Both the `xllcorner`/`yllcorner` and the
/// `xllcenter`/`yllcenter` header conventions are accepted, as are separate
/// `dx`/`dy` resolutions.
pub fn read_arcascii(
    file_name: &str,
    configs: &mut RasterConfigs,
    data: &mut Vec<f64>,
) -> Result<(), Error> {
    let f = File::open(file_name).map_err(|e| {
        Error::new(e.kind(), format!("Unable to open raster {}: {}", file_name, e))
    })?;
    let reader = BufReader::new(f);

    let mut xllcenter = f64::NEG_INFINITY;
    let mut yllcenter = f64::NEG_INFINITY;
    let mut xllcorner = f64::NEG_INFINITY;
    let mut yllcorner = f64::NEG_INFINITY;
    let mut header_complete = false;
    configs.nodata = -9999.0;

    for line in reader.lines() {
        let line_unwrapped = line?;
        let trimmed = line_unwrapped.trim();
        if trimmed.is_empty() {
            continue;
        }
        let vec: Vec<&str> = trimmed.split_whitespace().collect();
        let first = vec[0];
        if !header_complete && first.chars().next().map_or(false, |c| c.is_alphabetic()) {
            if vec.len() < 2 {
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    format!("Malformed ASCII grid header line: '{}'", trimmed),
                ));
            }
            let key = first.to_lowercase();
            let value = parse_header_value(&key, vec[1])?;
            match key.as_str() {
                "ncols" => configs.columns = value as usize,
                "nrows" => configs.rows = value as usize,
                "xllcorner" => xllcorner = value,
                "yllcorner" => yllcorner = value,
                "xllcenter" => xllcenter = value,
                "yllcenter" => yllcenter = value,
                "cellsize" => {
                    configs.resolution_x = value;
                    configs.resolution_y = value;
                }
                "dx" => configs.resolution_x = value,
                "dy" => configs.resolution_y = value,
                "nodata_value" => configs.nodata = value,
                _ => {
                    return Err(Error::new(
                        ErrorKind::InvalidData,
                        format!("Unrecognized ASCII grid header key '{}'.", key),
                    ))
                }
            }
        } else {
            if !header_complete {
                header_complete = true;
                if configs.rows == 0 || configs.columns == 0 || configs.resolution_x <= 0f64 {
                    return Err(Error::new(
                        ErrorKind::InvalidData,
                        format!("Incomplete ASCII grid header in {}", file_name),
                    ));
                }
                data.reserve(configs.rows * configs.columns);
            }
            for v in vec {
                data.push(parse_header_value("cell value", v)?);
            }
        }
    }

    if data.len() != configs.rows * configs.columns {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!(
                "ASCII grid {} holds {} values but the header declares {} rows x {} columns.",
                file_name,
                data.len(),
                configs.rows,
                configs.columns
            ),
        ));
    }

    if xllcorner.is_finite() && yllcorner.is_finite() {
        configs.west = xllcorner;
        configs.south = yllcorner;
    } else if xllcenter.is_finite() && yllcenter.is_finite() {
        configs.west = xllcenter - 0.5 * configs.resolution_x;
        configs.south = yllcenter - 0.5 * configs.resolution_y;
    } else {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("ASCII grid {} lacks a lower-left coordinate.", file_name),
        ));
    }
    configs.east = configs.west + configs.columns as f64 * configs.resolution_x;
    configs.north = configs.south + configs.rows as f64 * configs.resolution_y;
    Ok(())
}

pub fn write_arcascii(r: &Raster) -> Result<(), Error> {
    let f = File::create(&r.file_name)?;
    let mut writer = BufWriter::new(f);

    writeln!(writer, "NCOLS {}", r.configs.columns)?;
    writeln!(writer, "NROWS {}", r.configs.rows)?;
    writeln!(writer, "XLLCORNER {}", r.configs.west)?;
    writeln!(writer, "YLLCORNER {}", r.configs.south)?;
    if (r.configs.resolution_x - r.configs.resolution_y).abs() < f64::EPSILON {
        writeln!(writer, "CELLSIZE {}", r.configs.resolution_x)?;
    } else {
        writeln!(writer, "DX {}", r.configs.resolution_x)?;
        writeln!(writer, "DY {}", r.configs.resolution_y)?;
    }
    writeln!(writer, "NODATA_VALUE {}", r.configs.nodata)?;

    for row in r.data().chunks(r.configs.columns.max(1)) {
        let line = row
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<String>>()
            .join(" ");
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::Raster;
    use std::fs;

    #[test]
    fn test_read_write_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dem.asc");
        fs::write(
            &path,
            "ncols 3\nnrows 2\nxllcenter 5.0\nyllcenter 5.0\ncellsize 10\nNODATA_value -1\n1 2 3\n4 -1 6\n",
        )
        .unwrap();
        let mut r = Raster::new(path.to_str().unwrap(), "r").unwrap();
        assert_eq!(r.configs.columns, 3);
        assert_eq!(r.configs.rows, 2);
        assert_eq!(r.configs.west, 0.0);
        assert_eq!(r.configs.north, 20.0);
        assert_eq!(r[(0, 2)], 3.0);
        assert_eq!(r[(1, 1)], -1.0);
        assert_eq!(r.configs.maximum, 6.0);
        assert_eq!(r.configs.minimum, 1.0);

        let out = dir.path().join("copy.asc");
        r.file_name = out.to_str().unwrap().to_string();
        r.write().unwrap();
        let copy = Raster::new(out.to_str().unwrap(), "r").unwrap();
        assert!(copy.is_same_geometry(&r));
        assert_eq!(copy[(1, 0)], 4.0);
    }

    #[test]
    fn test_value_count_mismatch_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.asc");
        fs::write(
            &path,
            "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2\n3\n",
        )
        .unwrap();
        assert!(Raster::new(path.to_str().unwrap(), "r").is_err());
    }
}
