use crate::library::Item;

use super::SizedItem;

pub const MIN_RADIUS: f32 = 6.0;
pub const MAX_RADIUS_FRACTION: f32 = 0.15;

/// Square-root scale from `[0, domain_max]` onto `[MIN_RADIUS, min_dim * 0.15]`,
/// so circle area tracks weight.
pub fn radius(weight: f64, domain_max: f64, canvas_min_dim: f32) -> f32 {
    let max_radius = (canvas_min_dim * MAX_RADIUS_FRACTION).max(MIN_RADIUS);
    let domain_max = if domain_max.is_finite() && domain_max > 0.0 {
        domain_max
    } else {
        1.0
    };
    let weight = if weight.is_finite() { weight } else { 0.0 };

    let t = (weight / domain_max).clamp(0.0, 1.0).sqrt() as f32;
    MIN_RADIUS + (max_radius - MIN_RADIUS) * t
}

/// Largest weight in `items`, or 1 for an empty or all-zero set.
pub fn weight_domain_max(items: &[Item]) -> f64 {
    let max = items
        .iter()
        .map(|item| item.weight)
        .filter(|weight| weight.is_finite())
        .fold(0.0_f64, f64::max);
    if max > 0.0 { max } else { 1.0 }
}

pub fn size_items(items: &[Item], canvas_min_dim: f32) -> Vec<SizedItem> {
    let domain_max = weight_domain_max(items);
    items
        .iter()
        .map(|item| SizedItem {
            radius: radius(item.weight, domain_max, canvas_min_dim),
            item: item.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_stays_within_bounds() {
        let max = 800.0 * MAX_RADIUS_FRACTION;
        for weight in [0.0, 0.001, 1.0, 50.0, 100.0, 1_000.0, -3.0, f64::NAN, f64::INFINITY] {
            let r = radius(weight, 100.0, 800.0);
            assert!((MIN_RADIUS..=max).contains(&r), "{weight} -> {r}");
        }
    }

    #[test]
    fn radius_is_monotonic() {
        let mut previous = 0.0;
        for step in 0..=200 {
            let r = radius(step as f64 * 0.5, 100.0, 600.0);
            assert!(r >= previous);
            previous = r;
        }
    }

    #[test]
    fn radius_hits_scale_ends() {
        assert_eq!(radius(0.0, 40.0, 1000.0), MIN_RADIUS);
        assert!((radius(40.0, 40.0, 1000.0) - 150.0).abs() < 1e-4);
        // Area, not radius, is linear in weight.
        let quarter = radius(10.0, 40.0, 1000.0) - MIN_RADIUS;
        assert!((quarter - 72.0).abs() < 1e-3);
    }

    #[test]
    fn empty_domain_uses_unit_max() {
        assert_eq!(weight_domain_max(&[]), 1.0);
        assert_eq!(radius(0.5, 0.0, 400.0), radius(0.5, 1.0, 400.0));
    }

    #[test]
    fn tiny_canvas_keeps_min_radius() {
        assert_eq!(radius(10.0, 10.0, 10.0), MIN_RADIUS);
    }
}
