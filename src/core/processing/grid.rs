//! Rectangular grid extraction for multi-character sheets.
//!
//! Geometry is planned first (`plan_cells`) and pixels are cut afterwards
//! (`slice`), so layouts can be checked without touching image data. Slicing is
//! purely geometric: no alpha handling or background cleanup happens here.
use image::{RgbaImage, imageops};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{BoundingBox, GridSpec};

/// Planned bounds of one cell, after inset, adjustment and clamping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellPlan {
    pub row: u32,
    pub col: u32,
    pub identity: String,
    pub bounds: BoundingBox,
}

/// A cut cell with its pixels.
#[derive(Clone, Debug)]
pub struct GridCell {
    pub plan: CellPlan,
    pub image: RgbaImage,
}

fn validate(spec: &GridSpec, width: u32, height: u32) -> Result<(u32, u32)> {
    if spec.rows == 0 {
        return Err(Error::invalid("rows", spec.rows));
    }
    if spec.cols == 0 {
        return Err(Error::invalid("cols", spec.cols));
    }
    let cell_width = width / spec.cols;
    let cell_height = height / spec.rows;
    if cell_width == 0 || cell_height == 0 {
        return Err(Error::Processing(format!(
            "sheet {}x{} is too small for a {}x{} grid",
            width, height, spec.rows, spec.cols
        )));
    }
    Ok((cell_width, cell_height))
}

/// Row-major cell bounds for a `width x height` sheet.
///
/// The outer `Result` fails when the grid itself is unusable (zero rows/cols or
/// a sheet smaller than the grid). Each inner `Result` reports a cell whose
/// adjustments collapse it to an empty region.
pub fn plan_cells(spec: &GridSpec, width: u32, height: u32) -> Result<Vec<Result<CellPlan>>> {
    let (cell_width, cell_height) = validate(spec, width, height)?;
    let inset = spec.inset_px as i64;
    let (cw, ch) = (cell_width as i64, cell_height as i64);

    debug!(
        "Sheet {}x{}, grid {}x{}, cell {}x{}, inset {}px",
        width, height, spec.rows, spec.cols, cell_width, cell_height, spec.inset_px
    );

    let mut plans = Vec::with_capacity((spec.rows * spec.cols) as usize);
    for row in 0..spec.rows {
        let identity = spec.row_identity(row);
        for col in 0..spec.cols {
            let (r, c) = (row as i64, col as i64);
            let mut left = c * cw + inset;
            let mut top = r * ch + inset;
            let mut right = (c + 1) * cw - inset;
            let mut bottom = (r + 1) * ch - inset;

            if let Some(adj) = spec.adjustments.get(&identity, col) {
                left += adj.left as i64;
                top += adj.top as i64;
                right -= adj.right as i64;
                bottom -= adj.bottom as i64;
            }

            let left = left.clamp(0, width as i64);
            let top = top.clamp(0, height as i64);
            let right = right.clamp(0, width as i64);
            let bottom = bottom.clamp(0, height as i64);

            let plan = BoundingBox::new(left as u32, top as u32, right as u32, bottom as u32)
                .map(|bounds| CellPlan {
                    row,
                    col,
                    identity: identity.clone(),
                    bounds,
                })
                .ok_or(Error::InvalidGridGeometry {
                    row,
                    col,
                    left,
                    top,
                    right,
                    bottom,
                });
            if let Err(e) = &plan {
                warn!("{}", e);
            }
            plans.push(plan);
        }
    }
    Ok(plans)
}

/// Cut `sheet` into row-major cells following `spec`.
pub fn slice(sheet: &RgbaImage, spec: &GridSpec) -> Result<Vec<Result<GridCell>>> {
    let plans = plan_cells(spec, sheet.width(), sheet.height())?;
    Ok(plans
        .into_iter()
        .map(|plan| {
            plan.map(|plan| {
                let b = plan.bounds;
                let image =
                    imageops::crop_imm(sheet, b.left, b.top, b.width(), b.height()).to_image();
                GridCell { plan, image }
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdjustmentTable, CellAdjustment};
    use image::Rgba;

    fn bounds(plans: &[Result<CellPlan>], index: usize) -> BoundingBox {
        plans[index].as_ref().unwrap().bounds
    }

    #[test]
    fn four_by_four_with_inset() {
        let spec = GridSpec::new(4, 4, 1);
        let plans = plan_cells(&spec, 2048, 2048).unwrap();
        assert_eq!(plans.len(), 16);
        assert_eq!(bounds(&plans, 0), BoundingBox::new(1, 1, 511, 511).unwrap());
        assert_eq!(
            bounds(&plans, 15),
            BoundingBox::new(1537, 1537, 2047, 2047).unwrap()
        );
        let last = plans[15].as_ref().unwrap();
        assert_eq!((last.row, last.col), (3, 3));
    }

    #[test]
    fn slicing_a_real_sheet_matches_plan() {
        let sheet = RgbaImage::new(2048, 2048);
        let cells = slice(&sheet, &GridSpec::new(4, 4, 1)).unwrap();
        assert_eq!(cells.len(), 16);
        for cell in cells {
            assert_eq!(cell.unwrap().image.dimensions(), (510, 510));
        }
    }

    #[test]
    fn zero_inset_tiles_exactly() {
        // 11x8 sheet in a 3x2 grid: cells are 5x2, remainder is discarded.
        let (width, height) = (11u32, 8u32);
        let mut sheet = RgbaImage::new(width, height);
        for (x, y, px) in sheet.enumerate_pixels_mut() {
            *px = Rgba([x as u8, y as u8, 0, 255]);
        }
        let spec = GridSpec::new(3, 2, 0);
        let cells = slice(&sheet, &spec).unwrap();
        assert_eq!(cells.len(), 6);

        let mut hits = vec![0u32; (width * height) as usize];
        for cell in cells.iter().map(|c| c.as_ref().unwrap()) {
            let b = cell.plan.bounds;
            for y in b.top..b.bottom {
                for x in b.left..b.right {
                    hits[(y * width + x) as usize] += 1;
                    assert_eq!(
                        cell.image.get_pixel(x - b.left, y - b.top),
                        sheet.get_pixel(x, y)
                    );
                }
            }
        }
        for y in 0..height {
            for x in 0..width {
                let expected = u32::from(x < 10 && y < 6);
                assert_eq!(hits[(y * width + x) as usize], expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn adjustments_shrink_and_expand() {
        let mut spec = GridSpec::new(2, 2, 1);
        spec.row_identities = vec!["shiba".into(), "chihuahua".into()];
        spec.adjustments = AdjustmentTable::new()
            .with("shiba", 1, CellAdjustment::uniform(10))
            .with(
                "chihuahua",
                0,
                CellAdjustment {
                    left: 2,
                    top: -1,
                    right: 2,
                    bottom: 32,
                },
            );
        let plans = plan_cells(&spec, 200, 200).unwrap();
        assert_eq!(bounds(&plans, 0), BoundingBox::new(1, 1, 99, 99).unwrap());
        assert_eq!(bounds(&plans, 1), BoundingBox::new(111, 11, 189, 89).unwrap());
        assert_eq!(bounds(&plans, 2), BoundingBox::new(3, 100, 97, 167).unwrap());
    }

    #[test]
    fn negative_adjustment_is_clamped_to_sheet() {
        let mut spec = GridSpec::new(1, 1, 0);
        spec.row_identities = vec!["ears".into()];
        spec.adjustments = AdjustmentTable::new().with("ears", 0, CellAdjustment::uniform(-5));
        let plans = plan_cells(&spec, 40, 30).unwrap();
        assert_eq!(bounds(&plans, 0), BoundingBox::new(0, 0, 40, 30).unwrap());
    }

    #[test]
    fn collapsed_cell_is_reported_individually() {
        let mut spec = GridSpec::new(1, 2, 0);
        spec.adjustments = AdjustmentTable::new().with(
            "0",
            1,
            CellAdjustment {
                left: 30,
                right: 30,
                ..CellAdjustment::default()
            },
        );
        let plans = plan_cells(&spec, 100, 50).unwrap();
        assert!(plans[0].is_ok());
        assert!(matches!(
            plans[1],
            Err(Error::InvalidGridGeometry { row: 0, col: 1, .. })
        ));
    }

    #[test]
    fn oversized_inset_collapses_every_cell() {
        let plans = plan_cells(&GridSpec::new(2, 2, 5), 10, 10).unwrap();
        assert!(plans.iter().all(|p| p.is_err()));
    }

    #[test]
    fn unusable_grid_fails_outright() {
        assert!(plan_cells(&GridSpec::new(0, 4, 0), 100, 100).is_err());
        assert!(plan_cells(&GridSpec::new(4, 4, 0), 3, 100).is_err());
    }
}
