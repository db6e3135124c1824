//! Rating scale adapter
//!
//! Converts a source's native rating into the canonical 0-10 scale.
//! Absent ratings stay absent so the normalizer can tell "no score" apart
//! from a real zero.

/// Upper bound of the canonical rating scale
pub const CANONICAL_SCALE_MAX: f64 = 10.0;

/// Rescale `raw` from a `[0, source_scale_max]` scale onto `[0, 10]`
///
/// No rounding happens here. A non-positive or non-finite scale is treated
/// as already canonical. Results are clamped into the canonical range.
///
/// # Examples
/// ```
/// use revdash_common::scale::to_canonical_scale;
///
/// assert_eq!(to_canonical_scale(Some(4.0), 5.0), Some(8.0));
/// assert_eq!(to_canonical_scale(Some(0.0), 5.0), Some(0.0));
/// assert_eq!(to_canonical_scale(None, 5.0), None);
/// ```
pub fn to_canonical_scale(raw: Option<f64>, source_scale_max: f64) -> Option<f64> {
    let raw = raw.filter(|r| r.is_finite())?;

    let factor = if source_scale_max.is_finite() && source_scale_max > 0.0 {
        CANONICAL_SCALE_MAX / source_scale_max
    } else {
        1.0
    };

    Some((raw * factor).clamp(0.0, CANONICAL_SCALE_MAX))
}
