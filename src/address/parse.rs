use super::{ContentAddress, ContentKind};
use crate::AddressError;

/// Parses a reader address into its unit identity
///
/// # Parsing Rules
///
/// 1. Split the address on `/`; the last segment identifies the unit
/// 2. The segment must contain `chapter` (checked first) or `volume`
/// 3. The text after the final `-` of the segment must be a non-negative integer
/// 4. Everything before the last segment is kept as the base
///
/// # Arguments
///
/// * `address` - The address to parse, e.g. `https://site/read/title/en/chapter-5`
///
/// # Returns
///
/// * `Ok(ContentAddress)` - The unit identity
/// * `Err(AddressError)` - The trailing segment is malformed
///
/// # Examples
///
/// ```
/// use manga_capture::address::{parse_address, ContentKind};
///
/// let address = parse_address("https://site/x/chapter-5").unwrap();
/// assert_eq!(address.kind(), ContentKind::Chapter);
/// assert_eq!(address.sequence_number(), 5);
/// assert_eq!(address.base(), "https://site/x");
/// ```
pub fn parse_address(address: &str) -> Result<ContentAddress, AddressError> {
    if address.trim().is_empty() {
        return Err(AddressError::Empty);
    }

    let (base, segment) = match address.rsplit_once('/') {
        Some((base, segment)) => (base, segment),
        None => ("", address),
    };

    let kind = if segment.contains("chapter") {
        ContentKind::Chapter
    } else if segment.contains("volume") {
        ContentKind::Volume
    } else {
        return Err(AddressError::MissingKind(segment.to_string()));
    };

    let suffix = segment.rsplit('-').next().unwrap_or(segment);
    if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
        return Err(AddressError::InvalidNumber(segment.to_string()));
    }
    let sequence_number = suffix
        .parse::<u64>()
        .map_err(|_| AddressError::InvalidNumber(segment.to_string()))?;

    Ok(ContentAddress {
        base: base.to_string(),
        kind,
        sequence_number,
    })
}

/// Synthesizes the address that follows `sequence_number` in the series
///
/// # Returns
///
/// * `Ok(String)` - `<base>/<kind>-<sequence_number + 1>`
/// * `Err(AddressError::SequenceOverflow)` - `sequence_number` is `u64::MAX`
///
/// # Examples
///
/// ```
/// use manga_capture::address::{next_address, ContentKind};
///
/// let next = next_address("https://site/x", ContentKind::Volume, 9).unwrap();
/// assert_eq!(next, "https://site/x/volume-10");
/// ```
pub fn next_address(
    base: &str,
    kind: ContentKind,
    sequence_number: u64,
) -> Result<String, AddressError> {
    let next = sequence_number
        .checked_add(1)
        .ok_or(AddressError::SequenceOverflow(sequence_number))?;
    Ok(format!("{}/{}-{}", base, kind, next))
}
