//! `.prj` sidecar handling. Only the EPSG code is interpreted; the WKT is
//! carried through unchanged so derived rasters keep their coordinate system.

use crate::RasterConfigs;
use std::fs;
use std::io::Error;
use std::path::Path;

fn sidecar_path(file_name: &str) -> std::path::PathBuf {
    Path::new(file_name).with_extension("prj")
}

/// Extracts the EPSG code of the outermost coordinate system in a WKT
/// string, i.e. the last `AUTHORITY["EPSG","...."]` entry.
pub fn epsg_from_wkt(wkt: &str) -> Option<u16> {
    let upper = wkt.to_uppercase();
    let pos = upper.rfind("AUTHORITY[\"EPSG\"")?;
    let rest = &upper[pos + "AUTHORITY[\"EPSG\"".len()..];
    let digits: String = rest
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u16>().ok()
}

pub fn read_prj_sidecar(file_name: &str, configs: &mut RasterConfigs) -> Result<(), Error> {
    let path = sidecar_path(file_name);
    if !path.exists() {
        return Ok(());
    }
    let wkt = fs::read_to_string(path)?;
    configs.epsg_code = epsg_from_wkt(&wkt).unwrap_or(0);
    configs.projection = wkt;
    Ok(())
}

pub fn write_prj_sidecar(file_name: &str, configs: &RasterConfigs) -> Result<(), Error> {
    if configs.projection.is_empty() {
        return Ok(());
    }
    fs::write(sidecar_path(file_name), &configs.projection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsg_from_wkt() {
        let wkt = r#"PROJCS["NAD83 / UTM zone 12N",GEOGCS["NAD83",DATUM["North_American_Datum_1983",SPHEROID["GRS 1980",6378137,298.257222101,AUTHORITY["EPSG","7019"]],AUTHORITY["EPSG","6269"]],AUTHORITY["EPSG","4269"]],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AUTHORITY["EPSG","26912"]]"#;
        assert_eq!(epsg_from_wkt(wkt), Some(26912));
        assert_eq!(epsg_from_wkt("LOCAL_CS[\"arbitrary\"]"), None);
    }
}
