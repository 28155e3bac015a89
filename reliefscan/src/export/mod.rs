//! Export of detected structures.
//!
//! Writes the centerline (and optionally the bounds) of a detected structure
//! as an ESRI shapefile pair (`.shp` + `.shx`) in georeferenced meters, and
//! carries the scalar measurements in a JSON-serializable summary.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use serde::Serialize;
use thiserror::Error;

use crate::detect::DetectionStatus;
use crate::geom::Pt2i;

/// Errors of the shapefile writer.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Underlying I/O failure.
    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Nothing to export.
    #[error("empty geometry, nothing to export")]
    EmptyGeometry,
}

/// Shapefile geometry kinds used by the exports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    /// Open polyline (shape type 3).
    Polyline,
    /// Closed polygon (shape type 5).
    Polygon,
}

impl ShapeKind {
    fn code(self) -> i32 {
        match self {
            ShapeKind::Polyline => 3,
            ShapeKind::Polygon => 5,
        }
    }
}

/// Converts a DTM pixel coordinate to a georeferenced meter coordinate.
///
/// `origin_mm` is the map corner in millimeters; each pixel is 0.5 m wide
/// and the returned point sits 0.025 m into the pixel.
pub fn pixel_to_meters(origin_mm: i64, pixel: i32) -> f64 {
    origin_mm as f64 / 1000.0 + pixel as f64 * 0.5 + 0.025
}

/// Scalar measurements of one detection, for reporting.
#[derive(Clone, Debug, Serialize)]
pub struct DetectionSummary {
    /// Terminal detection status.
    pub status: DetectionStatus,
    /// Detected structure kind ("ctrack", "ridge" or "hollow").
    pub kind: String,
    /// Count of scans holding an accepted fit.
    pub accepted_scans: usize,
    /// Count of reached scans.
    pub total_scans: usize,
    /// Structure length in meters.
    pub length_m: f64,
    /// Mean cross-section width in meters.
    pub width_m: f64,
    /// Mean relief height in meters (ridges and hollows only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_m: Option<f64>,
    /// Earthwork volume in cubic meters (ridges and hollows only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_m3: Option<f64>,
}

/// Writes one polyline or polygon shapefile (`.shp` and companion `.shx`).
///
/// `points` are DTM pixel coordinates; `origin` is the map corner in
/// millimeters. Polygons are closed automatically.
pub fn write_shapefile(
    path: &Path,
    kind: ShapeKind,
    points: &[Pt2i],
    origin: (i64, i64),
) -> Result<(), ExportError> {
    if points.len() < 2 {
        return Err(ExportError::EmptyGeometry);
    }
    let mut coords: Vec<(f64, f64)> = points
        .iter()
        .map(|p| {
            (
                pixel_to_meters(origin.0, p.x()),
                pixel_to_meters(origin.1, p.y()),
            )
        })
        .collect();
    if kind == ShapeKind::Polygon && coords.first() != coords.last() {
        let first = coords[0];
        coords.push(first);
    }

    let (mut xmin, mut ymin) = coords[0];
    let (mut xmax, mut ymax) = coords[0];
    for (x, y) in &coords {
        xmin = xmin.min(*x);
        xmax = xmax.max(*x);
        ymin = ymin.min(*y);
        ymax = ymax.max(*y);
    }
    let bbox = (xmin, ymin, xmax, ymax);

    // record content: shape type + bbox + counts + one part + points
    let content_words = (4 + 32 + 4 + 4 + 4 + 16 * coords.len()) as i32 / 2;
    let file_words = 50 + 4 + content_words;

    let shp = File::create(path)?;
    let mut w = BufWriter::new(shp);
    write_main_header(&mut w, kind, file_words, bbox)?;
    w.write_i32::<BigEndian>(1)?; // record number
    w.write_i32::<BigEndian>(content_words)?;
    write_record(&mut w, kind, &coords, bbox)?;
    w.flush()?;

    let shx = File::create(companion_shx(path))?;
    let mut w = BufWriter::new(shx);
    write_main_header(&mut w, kind, 50 + 4, bbox)?;
    w.write_i32::<BigEndian>(50)?; // offset of the single record
    w.write_i32::<BigEndian>(content_words)?;
    w.flush()?;
    Ok(())
}

fn companion_shx(path: &Path) -> PathBuf {
    path.with_extension("shx")
}

fn write_main_header<W: Write>(
    w: &mut W,
    kind: ShapeKind,
    file_words: i32,
    bbox: (f64, f64, f64, f64),
) -> Result<(), ExportError> {
    w.write_i32::<BigEndian>(9994)?;
    for _ in 0..5 {
        w.write_i32::<BigEndian>(0)?;
    }
    w.write_i32::<BigEndian>(file_words)?;
    w.write_i32::<LittleEndian>(1000)?;
    w.write_i32::<LittleEndian>(kind.code())?;
    w.write_f64::<LittleEndian>(bbox.0)?;
    w.write_f64::<LittleEndian>(bbox.1)?;
    w.write_f64::<LittleEndian>(bbox.2)?;
    w.write_f64::<LittleEndian>(bbox.3)?;
    // z and m ranges are unused
    for _ in 0..4 {
        w.write_f64::<LittleEndian>(0.0)?;
    }
    Ok(())
}

fn write_record<W: Write>(
    w: &mut W,
    kind: ShapeKind,
    coords: &[(f64, f64)],
    bbox: (f64, f64, f64, f64),
) -> Result<(), ExportError> {
    w.write_i32::<LittleEndian>(kind.code())?;
    w.write_f64::<LittleEndian>(bbox.0)?;
    w.write_f64::<LittleEndian>(bbox.1)?;
    w.write_f64::<LittleEndian>(bbox.2)?;
    w.write_f64::<LittleEndian>(bbox.3)?;
    w.write_i32::<LittleEndian>(1)?; // one part
    w.write_i32::<LittleEndian>(coords.len() as i32)?;
    w.write_i32::<LittleEndian>(0)?; // part start index
    for (x, y) in coords {
        w.write_f64::<LittleEndian>(*x)?;
        w.write_f64::<LittleEndian>(*y)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ReadBytesExt;
    use std::io::{Cursor, Read, Seek, SeekFrom};
    use tempfile::tempdir;

    #[test]
    fn test_pixel_to_meters_formula() {
        // point_x = xmin + pixel_x * 0.5 + 0.025
        assert!((pixel_to_meters(1_000_000, 0) - 1000.025).abs() < 1e-9);
        assert!((pixel_to_meters(1_000_000, 10) - 1005.025).abs() < 1e-9);
    }

    #[test]
    fn test_polyline_shapefile_structure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("line.shp");
        let pts = [Pt2i::new(0, 0), Pt2i::new(4, 2), Pt2i::new(8, 3)];
        write_shapefile(&path, ShapeKind::Polyline, &pts, (0, 0)).unwrap();

        let mut f = File::open(&path).unwrap();
        assert_eq!(f.read_i32::<BigEndian>().unwrap(), 9994);
        f.seek(SeekFrom::Start(24)).unwrap();
        let file_words = f.read_i32::<BigEndian>().unwrap();
        let file_len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(file_words as u64 * 2, file_len);
        f.seek(SeekFrom::Start(28)).unwrap();
        assert_eq!(f.read_i32::<LittleEndian>().unwrap(), 1000);
        assert_eq!(f.read_i32::<LittleEndian>().unwrap(), 3);

        // first record
        f.seek(SeekFrom::Start(100)).unwrap();
        assert_eq!(f.read_i32::<BigEndian>().unwrap(), 1);
        let words = f.read_i32::<BigEndian>().unwrap();
        let mut content = vec![0u8; words as usize * 2];
        f.read_exact(&mut content).unwrap();
        let mut c = Cursor::new(content);
        assert_eq!(c.read_i32::<LittleEndian>().unwrap(), 3);
        c.seek(SeekFrom::Current(32)).unwrap();
        assert_eq!(c.read_i32::<LittleEndian>().unwrap(), 1);
        assert_eq!(c.read_i32::<LittleEndian>().unwrap(), 3);
        assert_eq!(c.read_i32::<LittleEndian>().unwrap(), 0);
        let x0 = c.read_f64::<LittleEndian>().unwrap();
        let y0 = c.read_f64::<LittleEndian>().unwrap();
        assert!((x0 - 0.025).abs() < 1e-9);
        assert!((y0 - 0.025).abs() < 1e-9);

        // companion index exists
        assert!(dir.path().join("line.shx").exists());
    }

    #[test]
    fn test_polygon_is_closed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("poly.shp");
        let pts = [Pt2i::new(0, 0), Pt2i::new(4, 0), Pt2i::new(4, 4), Pt2i::new(0, 4)];
        write_shapefile(&path, ShapeKind::Polygon, &pts, (0, 0)).unwrap();
        let mut f = File::open(&path).unwrap();
        f.seek(SeekFrom::Start(100 + 8 + 4 + 32 + 4)).unwrap();
        let n = f.read_i32::<LittleEndian>().unwrap();
        assert_eq!(n, 5, "polygon must repeat its first point");
    }

    #[test]
    fn test_summary_serialization() {
        let summary = DetectionSummary {
            status: DetectionStatus::Ok,
            kind: "ridge".to_string(),
            accepted_scans: 12,
            total_scans: 15,
            length_m: 6.0,
            width_m: 2.5,
            height_m: Some(0.8),
            volume_m3: Some(9.6),
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"status\":\"Ok\""));
        assert!(json.contains("\"kind\":\"ridge\""));
        // optional fields drop out when absent
        let summary = DetectionSummary { height_m: None, volume_m3: None, ..summary };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("height_m"));
    }

    #[test]
    fn test_too_short_geometry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("line.shp");
        assert!(matches!(
            write_shapefile(&path, ShapeKind::Polyline, &[Pt2i::new(0, 0)], (0, 0)),
            Err(ExportError::EmptyGeometry)
        ));
    }
}
