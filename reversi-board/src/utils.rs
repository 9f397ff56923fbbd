//! Miscellaneous project utilities.

use crate::location::Location;
use crate::EDGE_LENGTH;
use std::fmt::{self, Formatter};

/// Format the board as a labelled grid, asking `square` for the glyph at each location.
pub fn format_grid<F: Fn(Location) -> char>(f: &mut Formatter, square: F) -> fmt::Result {
    write!(f, "   A B C D E F G H")?;

    for row in 0..EDGE_LENGTH {
        write!(f, "\n {} ", row + 1)?;
        for col in 0..EDGE_LENGTH {
            let loc = Location::from_coords(row, col).ok_or(fmt::Error)?;
            write!(f, "{} ", square(loc))?;
        }
    }

    Ok(())
}
