use std::{error::Error, fmt, str::FromStr};

use waypoint_defence_core::GridCell;

/// Separates the tower name from the cell coordinates.
const NAME_DELIMITER: char = '@';
/// Separates the column from the row.
const CELL_DELIMITER: char = ',';

/// Tower placement requested on the command line as `NAME@COLUMN,ROW`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PlacementArg {
    /// Catalog name of the tower to build.
    pub(crate) tower: String,
    /// Cell the tower should occupy.
    pub(crate) cell: GridCell,
}

impl FromStr for PlacementArg {
    type Err = PlacementArgError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PlacementArgError::Empty);
        }

        let (tower, cell) = trimmed
            .rsplit_once(NAME_DELIMITER)
            .ok_or_else(|| PlacementArgError::MissingCell(trimmed.to_owned()))?;
        let tower = tower.trim();
        if tower.is_empty() {
            return Err(PlacementArgError::MissingName(trimmed.to_owned()));
        }

        Ok(Self {
            tower: tower.to_owned(),
            cell: parse_cell(cell)?,
        })
    }
}

/// Errors that can occur while parsing a placement argument.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PlacementArgError {
    /// The argument was empty or contained only whitespace.
    Empty,
    /// No `@` separated the tower name from its cell.
    MissingCell(String),
    /// Nothing preceded the `@`.
    MissingName(String),
    /// The cell coordinates could not be parsed.
    InvalidCell(String),
}

impl fmt::Display for PlacementArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "placement was empty"),
            Self::MissingCell(value) => {
                write!(f, "placement '{value}' is missing '@COLUMN,ROW'")
            }
            Self::MissingName(value) => write!(f, "placement '{value}' is missing a tower name"),
            Self::InvalidCell(cell) => write!(f, "could not parse cell '{cell}'"),
        }
    }
}

impl Error for PlacementArgError {}

fn parse_cell(cell: &str) -> Result<GridCell, PlacementArgError> {
    let (column, row) = cell
        .split_once(CELL_DELIMITER)
        .ok_or_else(|| PlacementArgError::InvalidCell(cell.to_owned()))?;

    let column = column
        .trim()
        .parse::<i32>()
        .map_err(|_| PlacementArgError::InvalidCell(cell.to_owned()))?;
    let row = row
        .trim()
        .parse::<i32>()
        .map_err(|_| PlacementArgError::InvalidCell(cell.to_owned()))?;

    Ok(GridCell::new(column, row))
}
