//! Dimension tracking for challenge activities: pure arithmetic over the
//! run's numeric inventory, plus the single failure predicate.

use std::collections::HashMap;

/// Dimension name -> running value. Present only for challenge activities.
pub type DimensionInventory = HashMap<String, f64>;

/// Add each named delta to the existing value. Missing dimensions are not
/// auto-created: effects may only touch dimensions the activity declared.
pub fn apply_effects(inventory: &mut DimensionInventory, effects: &HashMap<String, f64>) {
  for (name, delta) in effects {
    if let Some(value) = inventory.get_mut(name) {
      *value += delta;
    }
  }
}

/// The sole failure predicate: true iff any dimension value is negative.
/// Never true on an empty inventory.
pub fn has_negative_dimension(inventory: &DimensionInventory) -> bool {
  inventory.values().any(|v| *v < 0.0)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn inv(pairs: &[(&str, f64)]) -> DimensionInventory {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
  }

  #[test]
  fn empty_inventory_is_never_negative() {
    assert!(!has_negative_dimension(&DimensionInventory::new()));
  }

  #[test]
  fn predicate_is_true_iff_any_value_below_zero() {
    assert!(!has_negative_dimension(&inv(&[("health", 0.0), ("budget", 3.0)])));
    assert!(has_negative_dimension(&inv(&[("health", 10.0), ("budget", -0.5)])));
  }

  #[test]
  fn effects_only_touch_declared_dimensions() {
    let mut d = inv(&[("health", 10.0)]);
    apply_effects(&mut d, &inv(&[("health", -15.0), ("mana", 5.0)]));
    assert_eq!(d.len(), 1);
    assert_eq!(d["health"], -5.0);
    assert!(has_negative_dimension(&d));
  }
}
