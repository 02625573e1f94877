//! Order-index planning for component lists.
//!
//! The store enforces a unique constraint on `(parent_exercise_id,
//! order_index)`, so reordering cannot simply overwrite two rows in place.
//! The plans produced here sequence the writes so that every individual
//! write is collision-free.

use uuid::Uuid;

use crate::error::{CompositionError, Result};

/// Parking slot used while swapping. Never a legitimate order index; real
/// indices start at 1 and grow by one per component.
pub const SENTINEL_ORDER_INDEX: i32 = 1_000_000;

/// A single order-index write against one component row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderMove {
    pub component_id: Uuid,
    pub order_index: i32,
}

/// Plan a swap of two components' positions as three sequential writes:
/// A parks at the sentinel, B takes A's slot, A takes B's slot.
pub fn swap_steps(
    component_a: Uuid,
    new_index_a: i32,
    component_b: Uuid,
    new_index_b: i32,
) -> Result<[OrderMove; 3]> {
    if new_index_a < 1 {
        return Err(CompositionError::InvalidOrderIndex(new_index_a));
    }
    if new_index_b < 1 {
        return Err(CompositionError::InvalidOrderIndex(new_index_b));
    }
    Ok([
        OrderMove {
            component_id: component_a,
            order_index: SENTINEL_ORDER_INDEX,
        },
        OrderMove {
            component_id: component_b,
            order_index: new_index_b,
        },
        OrderMove {
            component_id: component_a,
            order_index: new_index_a,
        },
    ])
}

/// Next free order index for a parent given its existing sibling indices.
/// Gaps are not reused; the sequence only grows from the current maximum.
pub fn next_order_index(existing: &[i32]) -> i32 {
    existing.iter().copied().max().unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn swap_parks_first_component_before_any_real_write() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let steps = swap_steps(a, 5, b, 2).unwrap();

        assert_eq!(steps[0].component_id, a);
        assert_eq!(steps[0].order_index, SENTINEL_ORDER_INDEX);
        assert_eq!(steps[1], OrderMove { component_id: b, order_index: 2 });
        assert_eq!(steps[2], OrderMove { component_id: a, order_index: 5 });
    }

    #[test]
    fn swap_never_writes_a_duplicate_index() {
        // Simulate rows A@2, B@5 and replay the plan, asserting uniqueness
        // after every individual write.
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut rows = vec![(a, 2), (b, 5)];

        for step in swap_steps(a, 5, b, 2).unwrap() {
            let row = rows
                .iter_mut()
                .find(|(id, _)| *id == step.component_id)
                .unwrap();
            row.1 = step.order_index;

            let mut indices: Vec<i32> = rows.iter().map(|(_, i)| *i).collect();
            indices.sort_unstable();
            indices.dedup();
            assert_eq!(indices.len(), rows.len(), "duplicate index mid-swap");
        }

        assert_eq!(rows, vec![(a, 5), (b, 2)]);
    }

    #[test]
    fn swap_rejects_out_of_range_targets() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(
            swap_steps(a, 0, b, 2),
            Err(CompositionError::InvalidOrderIndex(0))
        );
        assert_eq!(
            swap_steps(a, 1, b, -3),
            Err(CompositionError::InvalidOrderIndex(-3))
        );
    }

    #[test]
    fn next_index_starts_at_one() {
        assert_eq!(next_order_index(&[]), 1);
    }

    #[test]
    fn next_index_grows_past_gaps() {
        // Removal leaves gaps; they are not reused.
        assert_eq!(next_order_index(&[1, 2, 7]), 8);
        assert_eq!(next_order_index(&[3]), 4);
    }
}
