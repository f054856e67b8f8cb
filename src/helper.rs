use log::trace;

use crate::{Coords, PinError, Result};

/// Parses `lat,lng` (whitespace around either part is ignored).
pub fn parse_coords(input: &str) -> Result<Coords> {
    let invalid = || PinError::InvalidCoords {
        input: input.to_string(),
    };

    let (lat, lng) = input.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;

    if !(-90.0..=90.0).contains(&lat) || !lng.is_finite() {
        return Err(invalid());
    }

    trace!("Parsed coordinates {} from {:?}", Coords::new(lat, lng), input);
    Ok(Coords::new(lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_with_spaces_and_signs() {
        assert_eq!(parse_coords("51.5,-0.12").unwrap(), Coords::new(51.5, -0.12));
        assert_eq!(parse_coords(" -33.86 , 151.2 ").unwrap(), Coords::new(-33.86, 151.2));
    }

    #[test]
    fn rejects_garbage_and_out_of_range_latitude() {
        for input in ["", "51.5", "a,b", "91,0", "10,inf", "1,2,3"] {
            assert!(
                matches!(parse_coords(input), Err(PinError::InvalidCoords { .. })),
                "{} should be rejected",
                input
            );
        }
    }
}
